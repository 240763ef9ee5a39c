//! Calendar events with attendee tracking, reminder scheduling and
//! day/week/month windows.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::audit::{self, AuditAction};
use crate::auth::CurrentUser;
use crate::shared::error::ApiError;
use crate::shared::schema::{calendar_events, event_attendees, event_reminders};
use crate::shared::state::AppState;

const DEFAULT_REMINDER_MINUTES: i32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Meeting,
    Event,
    Reminder,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Meeting => "meeting",
            Self::Event => "event",
            Self::Reminder => "reminder",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ApiError> {
        match s {
            "meeting" => Ok(Self::Meeting),
            "event" => Ok(Self::Event),
            "reminder" => Ok(Self::Reminder),
            other => Err(ApiError::validation(
                "event_type",
                format!("\"{other}\" is not a valid event type."),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = calendar_events)]
pub struct CalendarEvent {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub event_type: String,
    pub event_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub location: Option<String>,
    pub attendees: Option<String>,
    pub reminder_set: bool,
    pub reminder_minutes_before: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = event_attendees)]
pub struct EventAttendee {
    pub id: Uuid,
    pub event_id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub status: String,
    pub responded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = event_reminders)]
pub struct EventReminder {
    pub id: Uuid,
    pub event_id: Uuid,
    pub reminder_time: DateTime<Utc>,
    pub is_sent: bool,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: Option<String>,
    pub event_type: Option<String>,
    pub event_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub location: Option<String>,
    pub attendees: Option<String>,
    pub reminder_set: Option<bool>,
    pub reminder_minutes_before: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct EventListQuery {
    pub event_type: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    pub date: Option<String>,
}

/// Lenient date-param parsing: anything that is not YYYY-MM-DD is
/// treated as absent rather than rejected.
pub fn parse_date_param(raw: Option<&str>) -> Option<NaiveDate> {
    raw.and_then(|s| s.trim().parse().ok())
}

#[derive(Debug, Deserialize)]
pub struct AddAttendeeRequest {
    pub email: String,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub status: String,
}

/// Monday-based week window containing `anchor`.
pub fn week_window(anchor: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = anchor - Duration::days(anchor.weekday().num_days_from_monday() as i64);
    (start, start + Duration::days(6))
}

/// Inclusive first/last day of the given month, rolling December into
/// January of the next year.
pub fn month_window(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_month_start = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((start, next_month_start - Duration::days(1)))
}

/// When the reminder for an event fires: event start minus the lead time.
pub fn reminder_time(
    event_date: NaiveDate,
    start_time: NaiveTime,
    minutes_before: i32,
) -> DateTime<Utc> {
    let start = event_date.and_time(start_time) - Duration::minutes(minutes_before as i64);
    DateTime::from_naive_utc_and_offset(start, Utc)
}

/// Splits free-text attendees ("Ada Lovelace <ada@example.com>, bob@example.com")
/// into (email, name) pairs, skipping entries without a usable address.
pub fn parse_attendees(raw: &str) -> Vec<(String, Option<String>)> {
    let mut seen = Vec::new();
    let mut out = Vec::new();
    for entry in raw.split([',', ';']) {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let (email, name) = match (entry.find('<'), entry.rfind('>')) {
            (Some(open), Some(close)) if open < close => {
                let email = entry[open + 1..close].trim().to_string();
                let name = entry[..open].trim();
                (email, (!name.is_empty()).then(|| name.to_string()))
            }
            _ => (entry.to_string(), None),
        };
        if !email.contains('@') || seen.contains(&email) {
            continue;
        }
        seen.push(email.clone());
        out.push((email, name));
    }
    out
}

type PooledPg =
    diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<diesel::PgConnection>>;

fn load_owned_event(
    conn: &mut PooledPg,
    user: &CurrentUser,
    id: Uuid,
) -> Result<CalendarEvent, ApiError> {
    calendar_events::table
        .filter(calendar_events::id.eq(id))
        .filter(calendar_events::owner_id.eq(user.id))
        .first(conn)
        .map_err(|_| ApiError::not_found("Event"))
}

/// Drops and recreates the reminder row for an event. Updates may change
/// the start or the lead time, so the stored fire time is never patched
/// in place.
fn sync_reminder(conn: &mut PooledPg, event: &CalendarEvent) -> Result<(), ApiError> {
    diesel::delete(event_reminders::table.filter(event_reminders::event_id.eq(event.id)))
        .execute(conn)?;

    if event.reminder_set {
        let reminder = EventReminder {
            id: Uuid::new_v4(),
            event_id: event.id,
            reminder_time: reminder_time(
                event.event_date,
                event.start_time,
                event.reminder_minutes_before,
            ),
            is_sent: false,
            sent_at: None,
            created_at: Utc::now(),
        };
        diesel::insert_into(event_reminders::table)
            .values(&reminder)
            .execute(conn)?;
    }
    Ok(())
}

/// Rebuilds attendee rows from the event's free-text field, preserving
/// responses from attendees who are still listed.
fn sync_attendees(conn: &mut PooledPg, event: &CalendarEvent) -> Result<(), ApiError> {
    let existing: Vec<EventAttendee> = event_attendees::table
        .filter(event_attendees::event_id.eq(event.id))
        .load(conn)?;

    diesel::delete(event_attendees::table.filter(event_attendees::event_id.eq(event.id)))
        .execute(conn)?;

    let Some(raw) = event.attendees.as_deref() else {
        return Ok(());
    };

    for (email, name) in parse_attendees(raw) {
        let prior = existing.iter().find(|a| a.email == email);
        let attendee = EventAttendee {
            id: Uuid::new_v4(),
            event_id: event.id,
            email,
            name,
            status: prior.map_or_else(|| "pending".to_string(), |a| a.status.clone()),
            responded_at: prior.and_then(|a| a.responded_at),
        };
        diesel::insert_into(event_attendees::table)
            .values(&attendee)
            .execute(conn)?;
    }
    Ok(())
}

fn validate_times(start: NaiveTime, end: NaiveTime) -> Result<(), ApiError> {
    if end <= start {
        return Err(ApiError::validation(
            "end_time",
            "End time must be after start time.",
        ));
    }
    Ok(())
}

pub async fn create_event(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(req): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<CalendarEvent>), ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::validation("title", "This field may not be blank."));
    }
    validate_times(req.start_time, req.end_time)?;

    let event_type = match req.event_type.as_deref() {
        Some(t) => EventType::parse(t)?,
        None => EventType::Meeting,
    };

    let now = Utc::now();
    let event = CalendarEvent {
        id: Uuid::new_v4(),
        owner_id: user.id,
        title: req.title,
        description: req.description,
        event_type: event_type.as_str().to_string(),
        event_date: req.event_date,
        start_time: req.start_time,
        end_time: req.end_time,
        location: req.location,
        attendees: req.attendees,
        reminder_set: req.reminder_set.unwrap_or(true),
        reminder_minutes_before: req
            .reminder_minutes_before
            .unwrap_or(DEFAULT_REMINDER_MINUTES),
        created_at: now,
        updated_at: now,
    };

    let mut conn = state.conn.get()?;
    diesel::insert_into(calendar_events::table)
        .values(&event)
        .execute(&mut conn)?;

    sync_reminder(&mut conn, &event)?;
    sync_attendees(&mut conn, &event)?;

    audit::record(&mut conn, user.id, "event", event.id, AuditAction::Create, None);

    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn list_events(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<EventListQuery>,
) -> Result<Json<Vec<CalendarEvent>>, ApiError> {
    let mut conn = state.conn.get()?;
    let limit = query.limit.unwrap_or(100);
    let offset = query.offset.unwrap_or(0);

    let mut q = calendar_events::table
        .filter(calendar_events::owner_id.eq(user.id))
        .into_boxed();

    if let Some(event_type) = query.event_type {
        EventType::parse(&event_type)?;
        q = q.filter(calendar_events::event_type.eq(event_type));
    }
    if let Some(start) = parse_date_param(query.start_date.as_deref()) {
        q = q.filter(calendar_events::event_date.ge(start));
    }
    if let Some(end) = parse_date_param(query.end_date.as_deref()) {
        q = q.filter(calendar_events::event_date.le(end));
    }

    let rows: Vec<CalendarEvent> = q
        .order((
            calendar_events::event_date.asc(),
            calendar_events::start_time.asc(),
        ))
        .limit(limit)
        .offset(offset)
        .load(&mut conn)?;

    Ok(Json(rows))
}

pub async fn get_event(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CalendarEvent>, ApiError> {
    let mut conn = state.conn.get()?;
    Ok(Json(load_owned_event(&mut conn, &user, id)?))
}

pub async fn update_event(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateEventRequest>,
) -> Result<Json<CalendarEvent>, ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::validation("title", "This field may not be blank."));
    }
    validate_times(req.start_time, req.end_time)?;

    let mut conn = state.conn.get()?;
    let existing = load_owned_event(&mut conn, &user, id)?;

    let event_type = match req.event_type.as_deref() {
        Some(t) => EventType::parse(t)?,
        None => EventType::parse(&existing.event_type)?,
    };

    let event = CalendarEvent {
        id,
        owner_id: user.id,
        title: req.title,
        description: req.description,
        event_type: event_type.as_str().to_string(),
        event_date: req.event_date,
        start_time: req.start_time,
        end_time: req.end_time,
        location: req.location,
        attendees: req.attendees,
        reminder_set: req.reminder_set.unwrap_or(existing.reminder_set),
        reminder_minutes_before: req
            .reminder_minutes_before
            .unwrap_or(existing.reminder_minutes_before),
        created_at: existing.created_at,
        updated_at: Utc::now(),
    };

    diesel::update(calendar_events::table.filter(calendar_events::id.eq(id)))
        .set((
            calendar_events::title.eq(&event.title),
            calendar_events::description.eq(&event.description),
            calendar_events::event_type.eq(&event.event_type),
            calendar_events::event_date.eq(event.event_date),
            calendar_events::start_time.eq(event.start_time),
            calendar_events::end_time.eq(event.end_time),
            calendar_events::location.eq(&event.location),
            calendar_events::attendees.eq(&event.attendees),
            calendar_events::reminder_set.eq(event.reminder_set),
            calendar_events::reminder_minutes_before.eq(event.reminder_minutes_before),
            calendar_events::updated_at.eq(event.updated_at),
        ))
        .execute(&mut conn)?;

    sync_reminder(&mut conn, &event)?;
    sync_attendees(&mut conn, &event)?;

    audit::record(&mut conn, user.id, "event", id, AuditAction::Update, None);

    Ok(Json(event))
}

pub async fn delete_event(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut conn = state.conn.get()?;
    load_owned_event(&mut conn, &user, id)?;

    diesel::delete(event_reminders::table.filter(event_reminders::event_id.eq(id)))
        .execute(&mut conn)?;
    diesel::delete(event_attendees::table.filter(event_attendees::event_id.eq(id)))
        .execute(&mut conn)?;
    diesel::delete(calendar_events::table.filter(calendar_events::id.eq(id)))
        .execute(&mut conn)?;

    audit::record(&mut conn, user.id, "event", id, AuditAction::Delete, None);

    Ok(StatusCode::NO_CONTENT)
}

fn events_between(
    conn: &mut PooledPg,
    user: &CurrentUser,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<CalendarEvent>, ApiError> {
    let rows = calendar_events::table
        .filter(calendar_events::owner_id.eq(user.id))
        .filter(calendar_events::event_date.ge(from))
        .filter(calendar_events::event_date.le(to))
        .order((
            calendar_events::event_date.asc(),
            calendar_events::start_time.asc(),
        ))
        .load(conn)?;
    Ok(rows)
}

pub async fn day_view(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<WindowQuery>,
) -> Result<Json<Vec<CalendarEvent>>, ApiError> {
    let date =
        parse_date_param(query.date.as_deref()).unwrap_or_else(|| Utc::now().date_naive());
    let mut conn = state.conn.get()?;
    Ok(Json(events_between(&mut conn, &user, date, date)?))
}

pub async fn week_view(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<WindowQuery>,
) -> Result<Json<Vec<CalendarEvent>>, ApiError> {
    let anchor =
        parse_date_param(query.date.as_deref()).unwrap_or_else(|| Utc::now().date_naive());
    let (start, end) = week_window(anchor);
    let mut conn = state.conn.get()?;
    Ok(Json(events_between(&mut conn, &user, start, end)?))
}

pub async fn month_view(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<WindowQuery>,
) -> Result<Json<Vec<CalendarEvent>>, ApiError> {
    let anchor =
        parse_date_param(query.date.as_deref()).unwrap_or_else(|| Utc::now().date_naive());

    let (start, end) = month_window(anchor.year(), anchor.month())
        .ok_or_else(|| ApiError::validation("month", "Not a valid month."))?;

    let mut conn = state.conn.get()?;
    Ok(Json(events_between(&mut conn, &user, start, end)?))
}

pub async fn today_view(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<Vec<CalendarEvent>>, ApiError> {
    let today = Utc::now().date_naive();
    let mut conn = state.conn.get()?;
    Ok(Json(events_between(&mut conn, &user, today, today)?))
}

pub async fn upcoming_events(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<Vec<CalendarEvent>>, ApiError> {
    let today = Utc::now().date_naive();
    let mut conn = state.conn.get()?;

    let rows: Vec<CalendarEvent> = calendar_events::table
        .filter(calendar_events::owner_id.eq(user.id))
        .filter(calendar_events::event_date.ge(today))
        .order((
            calendar_events::event_date.asc(),
            calendar_events::start_time.asc(),
        ))
        .limit(10)
        .load(&mut conn)?;

    Ok(Json(rows))
}

pub async fn list_attendees(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<EventAttendee>>, ApiError> {
    let mut conn = state.conn.get()?;
    load_owned_event(&mut conn, &user, id)?;

    let attendees: Vec<EventAttendee> = event_attendees::table
        .filter(event_attendees::event_id.eq(id))
        .order(event_attendees::email.asc())
        .load(&mut conn)?;

    Ok(Json(attendees))
}

pub async fn add_attendee(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<AddAttendeeRequest>,
) -> Result<(StatusCode, Json<EventAttendee>), ApiError> {
    if !req.email.contains('@') {
        return Err(ApiError::validation("email", "Enter a valid email address."));
    }

    let mut conn = state.conn.get()?;
    load_owned_event(&mut conn, &user, id)?;

    let duplicates: i64 = event_attendees::table
        .filter(event_attendees::event_id.eq(id))
        .filter(event_attendees::email.eq(&req.email))
        .count()
        .get_result(&mut conn)?;
    if duplicates > 0 {
        return Err(ApiError::validation(
            "email",
            "Attendee already added to this event.",
        ));
    }

    let attendee = EventAttendee {
        id: Uuid::new_v4(),
        event_id: id,
        email: req.email,
        name: req.name,
        status: "pending".to_string(),
        responded_at: None,
    };

    diesel::insert_into(event_attendees::table)
        .values(&attendee)
        .execute(&mut conn)?;

    Ok((StatusCode::CREATED, Json(attendee)))
}

pub async fn respond_attendee(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path((id, attendee_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<RespondRequest>,
) -> Result<Json<EventAttendee>, ApiError> {
    if !matches!(req.status.as_str(), "accepted" | "declined" | "tentative") {
        return Err(ApiError::validation(
            "status",
            "Status must be \"accepted\", \"declined\" or \"tentative\".",
        ));
    }

    let mut conn = state.conn.get()?;
    load_owned_event(&mut conn, &user, id)?;

    let updated = diesel::update(
        event_attendees::table
            .filter(event_attendees::id.eq(attendee_id))
            .filter(event_attendees::event_id.eq(id)),
    )
    .set((
        event_attendees::status.eq(&req.status),
        event_attendees::responded_at.eq(Some(Utc::now())),
    ))
    .execute(&mut conn)?;

    if updated == 0 {
        return Err(ApiError::not_found("Attendee"));
    }

    let attendee: EventAttendee = event_attendees::table
        .filter(event_attendees::id.eq(attendee_id))
        .first(&mut conn)?;

    Ok(Json(attendee))
}

pub async fn remove_attendee(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path((id, attendee_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let mut conn = state.conn.get()?;
    load_owned_event(&mut conn, &user, id)?;

    let deleted = diesel::delete(
        event_attendees::table
            .filter(event_attendees::id.eq(attendee_id))
            .filter(event_attendees::event_id.eq(id)),
    )
    .execute(&mut conn)?;

    if deleted == 0 {
        return Err(ApiError::not_found("Attendee"));
    }

    Ok(StatusCode::NO_CONTENT)
}

pub fn configure_calendar_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/calendar/events", get(list_events).post(create_event))
        .route(
            "/api/calendar/events/{id}",
            get(get_event).put(update_event).delete(delete_event),
        )
        .route("/api/calendar/day", get(day_view))
        .route("/api/calendar/week", get(week_view))
        .route("/api/calendar/month", get(month_view))
        .route("/api/calendar/today", get(today_view))
        .route("/api/calendar/upcoming", get(upcoming_events))
        .route(
            "/api/calendar/events/{id}/attendees",
            get(list_attendees).post(add_attendee),
        )
        .route(
            "/api/calendar/events/{id}/attendees/{attendee_id}/respond",
            post(respond_attendee),
        )
        .route(
            "/api/calendar/events/{id}/attendees/{attendee_id}",
            delete(remove_attendee),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn week_window_is_monday_based() {
        // 2024-06-12 is a Wednesday.
        let anchor = NaiveDate::from_ymd_opt(2024, 6, 12).unwrap();
        let (start, end) = week_window(anchor);
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 6, 16).unwrap());

        // A Monday anchors its own week.
        let monday = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        assert_eq!(week_window(monday).0, monday);
    }

    #[test]
    fn month_window_rolls_december_into_january() {
        let (start, end) = month_window(2024, 12).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 12, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());

        let (start, end) = month_window(2024, 2).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        assert!(month_window(2024, 13).is_none());
    }

    #[test]
    fn reminder_fires_before_event_start() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 12).unwrap();
        let start = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        let at = reminder_time(date, start, 15);
        assert_eq!(
            at.naive_utc(),
            date.and_time(NaiveTime::from_hms_opt(9, 45, 0).unwrap())
        );
    }

    #[test]
    fn attendee_parsing_handles_names_and_duplicates() {
        let parsed =
            parse_attendees("Ada Lovelace <ada@example.com>, bob@example.com; ada@example.com");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].0, "ada@example.com");
        assert_eq!(parsed[0].1.as_deref(), Some("Ada Lovelace"));
        assert_eq!(parsed[1].0, "bob@example.com");
        assert_eq!(parsed[1].1, None);
    }

    #[test]
    fn attendee_parsing_skips_non_addresses() {
        assert!(parse_attendees("just a name, , ;").is_empty());
    }

    #[test]
    fn event_type_accepts_meeting_event_and_reminder() {
        assert_eq!(EventType::parse("meeting").unwrap(), EventType::Meeting);
        assert_eq!(EventType::parse("event").unwrap(), EventType::Event);
        assert_eq!(EventType::parse("reminder").unwrap(), EventType::Reminder);
        assert!(EventType::parse("call").is_err());
    }

    #[test]
    fn date_params_are_parsed_leniently() {
        assert_eq!(
            parse_date_param(Some("2024-06-12")),
            NaiveDate::from_ymd_opt(2024, 6, 12)
        );
        assert_eq!(parse_date_param(Some(" 2024-06-12 ")), NaiveDate::from_ymd_opt(2024, 6, 12));
        assert_eq!(parse_date_param(Some("not-a-date")), None);
        assert_eq!(parse_date_param(Some("")), None);
        assert_eq!(parse_date_param(None), None);
    }

    #[test]
    fn reminder_lead_defaults_to_fifteen_minutes() {
        assert_eq!(DEFAULT_REMINDER_MINUTES, 15);
    }
}
