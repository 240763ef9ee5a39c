//! Lead store: CRUD over lead records plus notes/activities sub-resources.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::audit::{self, AuditAction};
use crate::auth::CurrentUser;
use crate::dashboard;
use crate::shared::error::ApiError;
use crate::shared::schema::{lead_activities, lead_notes, leads};
use crate::shared::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadStage {
    New,
    Opened,
    Interested,
    Rejected,
    Closed,
}

impl LeadStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Opened => "Opened",
            Self::Interested => "Interested",
            Self::Rejected => "Rejected",
            Self::Closed => "Closed",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ApiError> {
        match s {
            "New" => Ok(Self::New),
            "Opened" => Ok(Self::Opened),
            "Interested" => Ok(Self::Interested),
            "Rejected" => Ok(Self::Rejected),
            "Closed" => Ok(Self::Closed),
            other => Err(ApiError::validation(
                "stage",
                format!("\"{other}\" is not a valid lead stage."),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadStatus {
    Active,
    Inactive,
    Converted,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
            Self::Converted => "Converted",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ApiError> {
        match s {
            "Active" => Ok(Self::Active),
            "Inactive" => Ok(Self::Inactive),
            "Converted" => Ok(Self::Converted),
            other => Err(ApiError::validation(
                "status",
                format!("\"{other}\" is not a valid lead status."),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = leads)]
pub struct Lead {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: Option<String>,
    pub stage: String,
    pub status: String,
    pub source: Option<String>,
    pub value: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = lead_notes)]
pub struct LeadNote {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub body: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = lead_activities)]
pub struct LeadActivity {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub activity_type: String,
    pub subject: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateLeadRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: Option<String>,
    pub stage: Option<String>,
    pub status: Option<String>,
    pub source: Option<String>,
    pub value: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLeadRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub stage: Option<String>,
    pub status: Option<String>,
    pub source: Option<String>,
    pub value: Option<f64>,
}

#[derive(AsChangeset)]
#[diesel(table_name = leads)]
struct LeadChanges {
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    company: Option<String>,
    stage: Option<String>,
    status: Option<String>,
    source: Option<String>,
    value: Option<BigDecimal>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct LeadListQuery {
    pub stage: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateNoteRequest {
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateActivityRequest {
    pub activity_type: String,
    pub subject: Option<String>,
}

fn validate_phone(phone: &str) -> Result<(), ApiError> {
    if phone.len() != 10 || !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err(ApiError::validation(
            "phone",
            "Phone number must be exactly 10 digits.",
        ));
    }
    Ok(())
}

fn to_decimal(field: &str, v: f64) -> Result<BigDecimal, ApiError> {
    BigDecimal::try_from(v)
        .map_err(|_| ApiError::validation(field, "Not a valid number."))
}

pub async fn create_lead(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(req): Json<CreateLeadRequest>,
) -> Result<(StatusCode, Json<Lead>), ApiError> {
    if !req.email.contains('@') {
        return Err(ApiError::validation("email", "Enter a valid email address."));
    }
    validate_phone(&req.phone)?;

    let stage = match req.stage.as_deref() {
        Some(s) => LeadStage::parse(s)?,
        None => LeadStage::New,
    };
    let status = match req.status.as_deref() {
        Some(s) => LeadStatus::parse(s)?,
        None => LeadStatus::Active,
    };

    let mut conn = state.conn.get()?;

    let duplicates: i64 = leads::table
        .filter(leads::owner_id.eq(user.id))
        .filter(leads::email.eq(&req.email))
        .count()
        .get_result(&mut conn)?;
    if duplicates > 0 {
        return Err(ApiError::validation(
            "email",
            "Lead with this email already exists.",
        ));
    }

    let now = Utc::now();
    let lead = Lead {
        id: Uuid::new_v4(),
        owner_id: user.id,
        name: req.name,
        email: req.email,
        phone: req.phone,
        company: req.company,
        stage: stage.as_str().to_string(),
        status: status.as_str().to_string(),
        source: req.source,
        value: req.value.map(|v| to_decimal("value", v)).transpose()?
            .unwrap_or_else(|| BigDecimal::from(0)),
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(leads::table)
        .values(&lead)
        .execute(&mut conn)?;

    audit::record(&mut conn, user.id, "lead", lead.id, AuditAction::Create, None);
    dashboard::record_activity(
        &mut conn,
        user.id,
        "lead_created",
        &format!("{} Lead Created", lead.name),
        Some(lead.id),
        None,
        None,
    );

    Ok((StatusCode::CREATED, Json(lead)))
}

pub async fn list_leads(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<LeadListQuery>,
) -> Result<Json<Vec<Lead>>, ApiError> {
    let mut conn = state.conn.get()?;
    let limit = query.limit.unwrap_or(50);
    let offset = query.offset.unwrap_or(0);

    let mut q = leads::table
        .filter(leads::owner_id.eq(user.id))
        .into_boxed();

    if let Some(stage) = query.stage {
        LeadStage::parse(&stage)?;
        q = q.filter(leads::stage.eq(stage));
    }

    if let Some(status) = query.status {
        LeadStatus::parse(&status)?;
        q = q.filter(leads::status.eq(status));
    }

    if let Some(search) = query.search {
        let pattern = format!("%{search}%");
        q = q.filter(
            leads::name
                .ilike(pattern.clone())
                .or(leads::email.ilike(pattern.clone()))
                .or(leads::company.ilike(pattern)),
        );
    }

    let rows: Vec<Lead> = q
        .order(leads::created_at.desc())
        .limit(limit)
        .offset(offset)
        .load(&mut conn)?;

    Ok(Json(rows))
}

fn load_owned_lead(
    conn: &mut diesel::r2d2::PooledConnection<
        diesel::r2d2::ConnectionManager<diesel::PgConnection>,
    >,
    user: &CurrentUser,
    id: Uuid,
) -> Result<Lead, ApiError> {
    leads::table
        .filter(leads::id.eq(id))
        .filter(leads::owner_id.eq(user.id))
        .first(conn)
        .map_err(|_| ApiError::not_found("Lead"))
}

pub async fn get_lead(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Lead>, ApiError> {
    let mut conn = state.conn.get()?;
    Ok(Json(load_owned_lead(&mut conn, &user, id)?))
}

pub async fn update_lead(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateLeadRequest>,
) -> Result<Json<Lead>, ApiError> {
    let mut conn = state.conn.get()?;
    load_owned_lead(&mut conn, &user, id)?;

    if let Some(email) = &req.email {
        if !email.contains('@') {
            return Err(ApiError::validation("email", "Enter a valid email address."));
        }
    }
    if let Some(phone) = &req.phone {
        validate_phone(phone)?;
    }
    if let Some(stage) = req.stage.as_deref() {
        LeadStage::parse(stage)?;
    }
    if let Some(status) = req.status.as_deref() {
        LeadStatus::parse(status)?;
    }

    let changes = LeadChanges {
        name: req.name,
        email: req.email,
        phone: req.phone,
        company: req.company,
        stage: req.stage,
        status: req.status,
        source: req.source,
        value: req.value.map(|v| to_decimal("value", v)).transpose()?,
        updated_at: Utc::now(),
    };

    diesel::update(leads::table.filter(leads::id.eq(id)))
        .set(&changes)
        .execute(&mut conn)?;

    audit::record(&mut conn, user.id, "lead", id, AuditAction::Update, None);

    Ok(Json(load_owned_lead(&mut conn, &user, id)?))
}

pub async fn delete_lead(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut conn = state.conn.get()?;
    load_owned_lead(&mut conn, &user, id)?;

    diesel::delete(leads::table.filter(leads::id.eq(id))).execute(&mut conn)?;
    audit::record(&mut conn, user.id, "lead", id, AuditAction::Delete, None);

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_notes(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<LeadNote>>, ApiError> {
    let mut conn = state.conn.get()?;
    load_owned_lead(&mut conn, &user, id)?;

    let notes: Vec<LeadNote> = lead_notes::table
        .filter(lead_notes::lead_id.eq(id))
        .order(lead_notes::created_at.asc())
        .load(&mut conn)?;

    Ok(Json(notes))
}

pub async fn add_note(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateNoteRequest>,
) -> Result<(StatusCode, Json<LeadNote>), ApiError> {
    if req.body.trim().is_empty() {
        return Err(ApiError::validation("body", "This field may not be blank."));
    }

    let mut conn = state.conn.get()?;
    load_owned_lead(&mut conn, &user, id)?;

    let note = LeadNote {
        id: Uuid::new_v4(),
        lead_id: id,
        body: req.body,
        created_by: user.id,
        created_at: Utc::now(),
    };

    diesel::insert_into(lead_notes::table)
        .values(&note)
        .execute(&mut conn)?;

    audit::record(&mut conn, user.id, "lead_note", note.id, AuditAction::Create, None);

    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn list_activities(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<LeadActivity>>, ApiError> {
    let mut conn = state.conn.get()?;
    load_owned_lead(&mut conn, &user, id)?;

    let activities: Vec<LeadActivity> = lead_activities::table
        .filter(lead_activities::lead_id.eq(id))
        .order(lead_activities::created_at.desc())
        .load(&mut conn)?;

    Ok(Json(activities))
}

pub async fn add_activity(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateActivityRequest>,
) -> Result<(StatusCode, Json<LeadActivity>), ApiError> {
    let mut conn = state.conn.get()?;
    load_owned_lead(&mut conn, &user, id)?;

    let activity = LeadActivity {
        id: Uuid::new_v4(),
        lead_id: id,
        activity_type: req.activity_type,
        subject: req.subject,
        created_by: user.id,
        created_at: Utc::now(),
    };

    diesel::insert_into(lead_activities::table)
        .values(&activity)
        .execute(&mut conn)?;

    Ok((StatusCode::CREATED, Json(activity)))
}

pub fn configure_lead_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/leads", get(list_leads).post(create_lead))
        .route(
            "/api/leads/{id}",
            get(get_lead).put(update_lead).delete(delete_lead),
        )
        .route("/api/leads/{id}/notes", get(list_notes).post(add_note))
        .route(
            "/api/leads/{id}/activities",
            get(list_activities).post(add_activity),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_must_be_ten_digits() {
        assert!(validate_phone("0123456789").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("12345678901").is_err());
        assert!(validate_phone("123456789a").is_err());
    }

    #[test]
    fn stage_parse_rejects_unknown_values() {
        assert_eq!(LeadStage::parse("Interested").unwrap(), LeadStage::Interested);
        assert!(LeadStage::parse("Qualified").is_err());
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [LeadStatus::Active, LeadStatus::Inactive, LeadStatus::Converted] {
            assert_eq!(LeadStatus::parse(status.as_str()).unwrap(), status);
        }
    }
}
