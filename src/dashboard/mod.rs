//! Dashboard: per-user metric aggregation, the activity feed and AI
//! suggestions.
//!
//! Metrics are recomputed from the source tables on every read and
//! upserted onto the per-user metric row. There is no invalidation
//! trigger; staleness is bounded by call frequency.

pub mod metrics;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Datelike, Duration, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::deals::pipeline::{DealStage, DealStatus};
use crate::shared::error::ApiError;
use crate::shared::schema::{ai_suggestions, dashboard_activities, dashboard_metrics, deals, leads};
use crate::shared::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = dashboard_metrics)]
pub struct DashboardMetric {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub total_leads: i32,
    pub new_leads_this_month: i32,
    pub active_deals: i32,
    pub deals_in_progress: i32,
    pub won_deals_total: i32,
    pub lost_deals_total: i32,
    pub total_deal_value: BigDecimal,
    pub customer_satisfaction_rate: f64,
    pub last_calculated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = dashboard_activities)]
pub struct DashboardActivity {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub activity_type: String,
    pub title: String,
    pub description: Option<String>,
    pub action: Option<String>,
    pub lead_id: Option<Uuid>,
    pub deal_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = ai_suggestions)]
pub struct AiSuggestion {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub suggestion_type: String,
    pub priority: String,
    pub title: String,
    pub description: String,
    pub confidence_score: f64,
    pub metric_value: Option<String>,
    pub metric_change: Option<String>,
    pub is_actioned: bool,
    pub actioned_at: Option<DateTime<Utc>>,
    pub action_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub metrics: DashboardMetric,
    pub recent_activities: Vec<DashboardActivity>,
    pub suggestions: Vec<AiSuggestion>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ActivityListQuery {
    pub activity_type: Option<String>,
    pub days: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct LogActivityRequest {
    pub activity_type: String,
    pub title: String,
    pub description: Option<String>,
    pub action: Option<String>,
    pub lead_id: Option<Uuid>,
    pub deal_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct SuggestionListQuery {
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSuggestionRequest {
    pub suggestion_type: String,
    pub priority: String,
    pub title: String,
    pub description: String,
    pub confidence_score: f64,
    pub metric_value: Option<String>,
    pub metric_change: Option<String>,
    pub expires_in_days: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ActionSuggestionRequest {
    pub notes: Option<String>,
}

type PooledPg =
    diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<diesel::PgConnection>>;

/// Appends to the owner's activity feed. Feed writes ride along with
/// business mutations and never fail them.
pub fn record_activity(
    conn: &mut PooledPg,
    owner_id: Uuid,
    activity_type: &str,
    title: &str,
    lead_id: Option<Uuid>,
    deal_id: Option<Uuid>,
    task_id: Option<Uuid>,
) {
    let activity = DashboardActivity {
        id: Uuid::new_v4(),
        owner_id,
        activity_type: activity_type.to_string(),
        title: title.to_string(),
        description: None,
        action: None,
        lead_id,
        deal_id,
        task_id,
        old_value: None,
        new_value: None,
        created_at: Utc::now(),
    };

    if let Err(e) = diesel::insert_into(dashboard_activities::table)
        .values(&activity)
        .execute(conn)
    {
        warn!("Failed to record dashboard activity: {}", e);
    }
}

/// Like [`record_activity`], carrying the before/after values of a change.
pub fn record_activity_with_change(
    conn: &mut PooledPg,
    owner_id: Uuid,
    activity_type: &str,
    title: &str,
    deal_id: Option<Uuid>,
    old_value: &str,
    new_value: &str,
) {
    let activity = DashboardActivity {
        id: Uuid::new_v4(),
        owner_id,
        activity_type: activity_type.to_string(),
        title: title.to_string(),
        description: None,
        action: None,
        lead_id: None,
        deal_id,
        task_id: None,
        old_value: Some(old_value.to_string()),
        new_value: Some(new_value.to_string()),
        created_at: Utc::now(),
    };

    if let Err(e) = diesel::insert_into(dashboard_activities::table)
        .values(&activity)
        .execute(conn)
    {
        warn!("Failed to record dashboard activity: {}", e);
    }
}

/// Recomputes the owner's metric row from the lead and deal tables and
/// upserts it.
pub fn calculate_metrics(conn: &mut PooledPg, owner_id: Uuid) -> Result<DashboardMetric, ApiError> {
    let now = Utc::now();
    let month_start: DateTime<Utc> = DateTime::from_naive_utc_and_offset(
        now.date_naive()
            .with_day(1)
            .unwrap_or_else(|| now.date_naive())
            .and_hms_opt(0, 0, 0)
            .unwrap_or_default(),
        Utc,
    );

    let total_leads: i64 = leads::table
        .filter(leads::owner_id.eq(owner_id))
        .count()
        .get_result(conn)?;

    let new_leads_this_month: i64 = leads::table
        .filter(leads::owner_id.eq(owner_id))
        .filter(leads::created_at.ge(month_start))
        .count()
        .get_result(conn)?;

    let terminal = vec![DealStatus::Won.as_str(), DealStatus::Lost.as_str()];
    let active_deals: i64 = deals::table
        .filter(deals::owner_id.eq(owner_id))
        .filter(deals::status.ne_all(terminal))
        .count()
        .get_result(conn)?;

    let in_progress_stages = vec![
        DealStage::Orders.as_str(),
        DealStage::Tasks.as_str(),
        DealStage::DueDate.as_str(),
    ];
    let deals_in_progress: i64 = deals::table
        .filter(deals::owner_id.eq(owner_id))
        .filter(deals::stage.eq_any(in_progress_stages))
        .count()
        .get_result(conn)?;

    let won_deals_total: i64 = deals::table
        .filter(deals::owner_id.eq(owner_id))
        .filter(deals::status.eq(DealStatus::Won.as_str()))
        .count()
        .get_result(conn)?;

    let lost_deals_total: i64 = deals::table
        .filter(deals::owner_id.eq(owner_id))
        .filter(deals::status.eq(DealStatus::Lost.as_str()))
        .count()
        .get_result(conn)?;

    let total_deal_value: Option<BigDecimal> = deals::table
        .filter(deals::owner_id.eq(owner_id))
        .select(diesel::dsl::sum(deals::amount))
        .first(conn)?;

    let metric = DashboardMetric {
        id: Uuid::new_v4(),
        owner_id,
        total_leads: total_leads as i32,
        new_leads_this_month: new_leads_this_month as i32,
        active_deals: active_deals as i32,
        deals_in_progress: deals_in_progress as i32,
        won_deals_total: won_deals_total as i32,
        lost_deals_total: lost_deals_total as i32,
        total_deal_value: total_deal_value.unwrap_or_else(|| BigDecimal::from(0)),
        customer_satisfaction_rate: metrics::satisfaction_rate(won_deals_total, lost_deals_total),
        last_calculated: now,
    };

    diesel::insert_into(dashboard_metrics::table)
        .values(&metric)
        .on_conflict(dashboard_metrics::owner_id)
        .do_update()
        .set((
            dashboard_metrics::total_leads.eq(metric.total_leads),
            dashboard_metrics::new_leads_this_month.eq(metric.new_leads_this_month),
            dashboard_metrics::active_deals.eq(metric.active_deals),
            dashboard_metrics::deals_in_progress.eq(metric.deals_in_progress),
            dashboard_metrics::won_deals_total.eq(metric.won_deals_total),
            dashboard_metrics::lost_deals_total.eq(metric.lost_deals_total),
            dashboard_metrics::total_deal_value.eq(metric.total_deal_value.clone()),
            dashboard_metrics::customer_satisfaction_rate.eq(metric.customer_satisfaction_rate),
            dashboard_metrics::last_calculated.eq(metric.last_calculated),
        ))
        .execute(conn)?;

    let stored: DashboardMetric = dashboard_metrics::table
        .filter(dashboard_metrics::owner_id.eq(owner_id))
        .first(conn)?;

    Ok(stored)
}

fn active_suggestions(
    conn: &mut PooledPg,
    owner_id: Uuid,
    limit: i64,
) -> Result<Vec<AiSuggestion>, ApiError> {
    let rows = ai_suggestions::table
        .filter(ai_suggestions::owner_id.eq(owner_id))
        .filter(ai_suggestions::is_actioned.eq(false))
        .filter(ai_suggestions::expires_at.gt(Utc::now()))
        .order(ai_suggestions::created_at.desc())
        .limit(limit)
        .load(conn)?;
    Ok(rows)
}

pub async fn dashboard_summary(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<DashboardSummary>, ApiError> {
    let mut conn = state.conn.get()?;

    let metrics = calculate_metrics(&mut conn, user.id)?;

    let recent_activities: Vec<DashboardActivity> = dashboard_activities::table
        .filter(dashboard_activities::owner_id.eq(user.id))
        .order(dashboard_activities::created_at.desc())
        .limit(10)
        .load(&mut conn)?;

    let suggestions = active_suggestions(&mut conn, user.id, 5)?;

    Ok(Json(DashboardSummary {
        metrics,
        recent_activities,
        suggestions,
        generated_at: Utc::now(),
    }))
}

pub async fn get_metrics(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<DashboardMetric>, ApiError> {
    let mut conn = state.conn.get()?;
    Ok(Json(calculate_metrics(&mut conn, user.id)?))
}

pub async fn refresh_metrics(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<DashboardMetric>, ApiError> {
    let mut conn = state.conn.get()?;
    Ok(Json(calculate_metrics(&mut conn, user.id)?))
}

pub async fn list_activities(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<ActivityListQuery>,
) -> Result<Json<Vec<DashboardActivity>>, ApiError> {
    let mut conn = state.conn.get()?;
    let limit = query.limit.unwrap_or(50);

    let mut q = dashboard_activities::table
        .filter(dashboard_activities::owner_id.eq(user.id))
        .into_boxed();

    if let Some(activity_type) = query.activity_type {
        q = q.filter(dashboard_activities::activity_type.eq(activity_type));
    }

    if let Some(days) = query.days {
        if days <= 0 {
            return Err(ApiError::validation("days", "Must be a positive number of days."));
        }
        q = q.filter(dashboard_activities::created_at.ge(Utc::now() - Duration::days(days)));
    }

    let rows: Vec<DashboardActivity> = q
        .order(dashboard_activities::created_at.desc())
        .limit(limit)
        .load(&mut conn)?;

    Ok(Json(rows))
}

pub async fn log_activity(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(req): Json<LogActivityRequest>,
) -> Result<(StatusCode, Json<DashboardActivity>), ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::validation("title", "This field may not be blank."));
    }

    let activity = DashboardActivity {
        id: Uuid::new_v4(),
        owner_id: user.id,
        activity_type: req.activity_type,
        title: req.title,
        description: req.description,
        action: req.action,
        lead_id: req.lead_id,
        deal_id: req.deal_id,
        task_id: req.task_id,
        old_value: None,
        new_value: None,
        created_at: Utc::now(),
    };

    let mut conn = state.conn.get()?;
    diesel::insert_into(dashboard_activities::table)
        .values(&activity)
        .execute(&mut conn)?;

    Ok((StatusCode::CREATED, Json(activity)))
}

pub async fn list_suggestions(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<SuggestionListQuery>,
) -> Result<Json<Vec<AiSuggestion>>, ApiError> {
    let mut conn = state.conn.get()?;

    if query.active.unwrap_or(false) {
        return Ok(Json(active_suggestions(&mut conn, user.id, 50)?));
    }

    let rows: Vec<AiSuggestion> = ai_suggestions::table
        .filter(ai_suggestions::owner_id.eq(user.id))
        .order(ai_suggestions::created_at.desc())
        .limit(50)
        .load(&mut conn)?;

    Ok(Json(rows))
}

pub async fn create_suggestion(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(req): Json<CreateSuggestionRequest>,
) -> Result<(StatusCode, Json<AiSuggestion>), ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::validation("title", "This field may not be blank."));
    }
    if !(0.0..=1.0).contains(&req.confidence_score) {
        return Err(ApiError::validation(
            "confidence_score",
            "Confidence score must be between 0 and 1.",
        ));
    }

    let now = Utc::now();
    let suggestion = AiSuggestion {
        id: Uuid::new_v4(),
        owner_id: user.id,
        suggestion_type: req.suggestion_type,
        priority: req.priority,
        title: req.title,
        description: req.description,
        confidence_score: req.confidence_score,
        metric_value: req.metric_value,
        metric_change: req.metric_change,
        is_actioned: false,
        actioned_at: None,
        action_notes: None,
        created_at: now,
        expires_at: now + Duration::days(req.expires_in_days.unwrap_or(7)),
    };

    let mut conn = state.conn.get()?;
    diesel::insert_into(ai_suggestions::table)
        .values(&suggestion)
        .execute(&mut conn)?;

    Ok((StatusCode::CREATED, Json(suggestion)))
}

pub async fn action_suggestion(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ActionSuggestionRequest>,
) -> Result<Json<AiSuggestion>, ApiError> {
    let mut conn = state.conn.get()?;

    let updated = diesel::update(
        ai_suggestions::table
            .filter(ai_suggestions::id.eq(id))
            .filter(ai_suggestions::owner_id.eq(user.id)),
    )
    .set((
        ai_suggestions::is_actioned.eq(true),
        ai_suggestions::actioned_at.eq(Some(Utc::now())),
        ai_suggestions::action_notes.eq(req.notes),
    ))
    .execute(&mut conn)?;

    if updated == 0 {
        return Err(ApiError::not_found("Suggestion"));
    }

    let suggestion: AiSuggestion = ai_suggestions::table
        .filter(ai_suggestions::id.eq(id))
        .first(&mut conn)?;

    Ok(Json(suggestion))
}

pub fn configure_dashboard_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/dashboard/summary", get(dashboard_summary))
        .route("/api/dashboard/metrics", get(get_metrics))
        .route("/api/dashboard/metrics/refresh", post(refresh_metrics))
        .route(
            "/api/dashboard/activities",
            get(list_activities).post(log_activity),
        )
        .route(
            "/api/dashboard/suggestions",
            get(list_suggestions).post(create_suggestion),
        )
        .route("/api/dashboard/suggestions/{id}/action", post(action_suggestion))
}
