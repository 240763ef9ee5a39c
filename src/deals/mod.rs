//! Deal pipeline: CRUD, stage moves, closing, comments and attachments.

pub mod pipeline;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, patch};
use axum::{Json, Router};
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::audit::{self, AuditAction};
use crate::auth::CurrentUser;
use crate::dashboard;
use crate::shared::error::ApiError;
use crate::shared::schema::{deal_attachments, deal_comments, deals};
use crate::shared::state::AppState;

use pipeline::{DealStage, DealStatus};

const MAX_ATTACHMENT_BYTES: i64 = 5 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = deals)]
pub struct Deal {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub client: Option<String>,
    pub stage: String,
    pub status: String,
    pub amount: BigDecimal,
    pub due_date: Option<NaiveDate>,
    pub assignee_initials: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = deal_comments)]
pub struct DealComment {
    pub id: Uuid,
    pub deal_id: Uuid,
    pub text: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = deal_attachments)]
pub struct DealAttachment {
    pub id: Uuid,
    pub deal_id: Uuid,
    pub file_name: String,
    pub file_size: i64,
    pub uploaded_by: Uuid,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateDealRequest {
    pub title: String,
    pub description: Option<String>,
    pub client: Option<String>,
    pub stage: Option<String>,
    pub amount: Option<f64>,
    pub due_date: Option<NaiveDate>,
    pub assignee_initials: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDealRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub client: Option<String>,
    pub amount: Option<f64>,
    pub due_date: Option<NaiveDate>,
    pub assignee_initials: Option<String>,
}

#[derive(AsChangeset)]
#[diesel(table_name = deals)]
struct DealChanges {
    title: Option<String>,
    description: Option<String>,
    client: Option<String>,
    amount: Option<BigDecimal>,
    due_date: Option<NaiveDate>,
    assignee_initials: Option<String>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct DealListQuery {
    pub stage: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct StageChangeRequest {
    pub stage: String,
}

#[derive(Debug, Deserialize)]
pub struct CloseDealRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateAttachmentRequest {
    pub file_name: String,
    pub file_size: i64,
}

type PooledPg =
    diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<diesel::PgConnection>>;

fn load_owned_deal(conn: &mut PooledPg, user: &CurrentUser, id: Uuid) -> Result<Deal, ApiError> {
    deals::table
        .filter(deals::id.eq(id))
        .filter(deals::owner_id.eq(user.id))
        .first(conn)
        .map_err(|_| ApiError::not_found("Deal"))
}

pub async fn create_deal(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(req): Json<CreateDealRequest>,
) -> Result<(StatusCode, Json<Deal>), ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::validation("title", "This field may not be blank."));
    }

    let stage = match req.stage.as_deref() {
        Some(s) => {
            let stage = DealStage::parse(s)?;
            if stage.is_closed() {
                return Err(ApiError::validation(
                    "stage",
                    "Deals can only be closed from the 'Revenue' stage.",
                ));
            }
            stage
        }
        None => DealStage::Clients,
    };

    let amount = match req.amount {
        Some(v) => BigDecimal::try_from(v)
            .map_err(|_| ApiError::validation("amount", "Not a valid number."))?,
        None => BigDecimal::from(0),
    };

    let now = Utc::now();
    let deal = Deal {
        id: Uuid::new_v4(),
        owner_id: user.id,
        title: req.title,
        description: req.description,
        client: req.client,
        stage: stage.as_str().to_string(),
        status: DealStatus::Open.as_str().to_string(),
        amount,
        due_date: req.due_date,
        assignee_initials: req.assignee_initials,
        created_at: now,
        updated_at: now,
    };

    let mut conn = state.conn.get()?;
    diesel::insert_into(deals::table)
        .values(&deal)
        .execute(&mut conn)?;

    audit::record(&mut conn, user.id, "deal", deal.id, AuditAction::Create, None);
    dashboard::record_activity(
        &mut conn,
        user.id,
        "deal_created",
        &format!("{} Deal Created", deal.title),
        None,
        Some(deal.id),
        None,
    );

    Ok((StatusCode::CREATED, Json(deal)))
}

pub async fn list_deals(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<DealListQuery>,
) -> Result<Json<Vec<Deal>>, ApiError> {
    let mut conn = state.conn.get()?;
    let limit = query.limit.unwrap_or(50);
    let offset = query.offset.unwrap_or(0);

    let mut q = deals::table
        .filter(deals::owner_id.eq(user.id))
        .into_boxed();

    if let Some(stage) = query.stage {
        DealStage::parse(&stage)?;
        q = q.filter(deals::stage.eq(stage));
    }

    // "Active" is a virtual filter value: every deal not yet Won or Lost.
    if let Some(status) = query.status {
        if status == "Active" {
            q = q.filter(deals::status.ne_all(vec![
                DealStatus::Won.as_str(),
                DealStatus::Lost.as_str(),
            ]));
        } else {
            DealStatus::parse(&status)?;
            q = q.filter(deals::status.eq(status));
        }
    }

    if let Some(search) = query.search {
        let pattern = format!("%{search}%");
        q = q.filter(
            deals::title
                .ilike(pattern.clone())
                .or(deals::client.ilike(pattern)),
        );
    }

    let rows: Vec<Deal> = q
        .order(deals::created_at.desc())
        .limit(limit)
        .offset(offset)
        .load(&mut conn)?;

    Ok(Json(rows))
}

pub async fn get_deal(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Deal>, ApiError> {
    let mut conn = state.conn.get()?;
    Ok(Json(load_owned_deal(&mut conn, &user, id)?))
}

pub async fn update_deal(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateDealRequest>,
) -> Result<Json<Deal>, ApiError> {
    let mut conn = state.conn.get()?;
    load_owned_deal(&mut conn, &user, id)?;

    // Closing freezes the pipeline position, not the record: field edits
    // stay legal on a closed deal, and this handler never touches stage.
    let amount = req
        .amount
        .map(|v| {
            BigDecimal::try_from(v)
                .map_err(|_| ApiError::validation("amount", "Not a valid number."))
        })
        .transpose()?;

    let changes = DealChanges {
        title: req.title,
        description: req.description,
        client: req.client,
        amount,
        due_date: req.due_date,
        assignee_initials: req.assignee_initials,
        updated_at: Utc::now(),
    };

    diesel::update(deals::table.filter(deals::id.eq(id)))
        .set(&changes)
        .execute(&mut conn)?;

    audit::record(&mut conn, user.id, "deal", id, AuditAction::Update, None);

    Ok(Json(load_owned_deal(&mut conn, &user, id)?))
}

pub async fn delete_deal(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut conn = state.conn.get()?;
    load_owned_deal(&mut conn, &user, id)?;

    diesel::delete(deals::table.filter(deals::id.eq(id))).execute(&mut conn)?;
    audit::record(&mut conn, user.id, "deal", id, AuditAction::Delete, None);

    Ok(StatusCode::NO_CONTENT)
}

pub async fn change_stage(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<StageChangeRequest>,
) -> Result<Json<Deal>, ApiError> {
    let mut conn = state.conn.get()?;
    let deal = load_owned_deal(&mut conn, &user, id)?;

    let current = DealStage::parse(&deal.stage)?;
    let target = DealStage::parse(&req.stage)?;
    pipeline::validate_transition(current, target)?;

    if target.is_closed() {
        // Reaching Status through this endpoint still demands an outcome.
        return Err(ApiError::validation(
            "status",
            "Status must be \"Won\" or \"Lost\" when in Status stage.",
        ));
    }

    diesel::update(deals::table.filter(deals::id.eq(id)))
        .set((
            deals::stage.eq(target.as_str()),
            deals::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

    audit::record(
        &mut conn,
        user.id,
        "deal",
        id,
        AuditAction::Update,
        Some(format!("stage {} -> {}", current.as_str(), target.as_str())),
    );
    dashboard::record_activity_with_change(
        &mut conn,
        user.id,
        "deal_stage_changed",
        &format!("{} moved to {}", deal.title, target.as_str()),
        Some(deal.id),
        current.as_str(),
        target.as_str(),
    );

    Ok(Json(load_owned_deal(&mut conn, &user, id)?))
}

pub async fn close_deal(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<CloseDealRequest>,
) -> Result<Json<Deal>, ApiError> {
    let mut conn = state.conn.get()?;
    let deal = load_owned_deal(&mut conn, &user, id)?;

    let current = DealStage::parse(&deal.stage)?;
    let outcome = pipeline::validate_close(current, &req.status)?;

    diesel::update(deals::table.filter(deals::id.eq(id)))
        .set((
            deals::stage.eq(DealStage::Status.as_str()),
            deals::status.eq(outcome.as_str()),
            deals::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

    audit::record(
        &mut conn,
        user.id,
        "deal",
        id,
        AuditAction::Update,
        Some(format!("closed as {}", outcome.as_str())),
    );

    let activity_type = match outcome {
        DealStatus::Won => "deal_won",
        _ => "deal_lost",
    };
    dashboard::record_activity(
        &mut conn,
        user.id,
        activity_type,
        &format!("{} Deal {}", deal.title, outcome.as_str()),
        None,
        Some(deal.id),
        None,
    );

    Ok(Json(load_owned_deal(&mut conn, &user, id)?))
}

pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<DealComment>>, ApiError> {
    let mut conn = state.conn.get()?;
    load_owned_deal(&mut conn, &user, id)?;

    let comments: Vec<DealComment> = deal_comments::table
        .filter(deal_comments::deal_id.eq(id))
        .order(deal_comments::created_at.asc())
        .load(&mut conn)?;

    Ok(Json(comments))
}

pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<DealComment>), ApiError> {
    if req.text.trim().is_empty() {
        return Err(ApiError::validation("text", "This field may not be blank."));
    }

    let mut conn = state.conn.get()?;
    load_owned_deal(&mut conn, &user, id)?;

    let comment = DealComment {
        id: Uuid::new_v4(),
        deal_id: id,
        text: req.text,
        created_by: user.id,
        created_at: Utc::now(),
    };

    diesel::insert_into(deal_comments::table)
        .values(&comment)
        .execute(&mut conn)?;

    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn list_attachments(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<DealAttachment>>, ApiError> {
    let mut conn = state.conn.get()?;
    load_owned_deal(&mut conn, &user, id)?;

    let attachments: Vec<DealAttachment> = deal_attachments::table
        .filter(deal_attachments::deal_id.eq(id))
        .order(deal_attachments::uploaded_at.desc())
        .load(&mut conn)?;

    Ok(Json(attachments))
}

pub async fn add_attachment(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateAttachmentRequest>,
) -> Result<(StatusCode, Json<DealAttachment>), ApiError> {
    if req.file_size <= 0 {
        return Err(ApiError::validation("file_size", "Not a valid file size."));
    }
    if req.file_size > MAX_ATTACHMENT_BYTES {
        return Err(ApiError::validation(
            "file_size",
            "File size cannot exceed 5MB.",
        ));
    }

    let mut conn = state.conn.get()?;
    load_owned_deal(&mut conn, &user, id)?;

    let attachment = DealAttachment {
        id: Uuid::new_v4(),
        deal_id: id,
        file_name: req.file_name,
        file_size: req.file_size,
        uploaded_by: user.id,
        uploaded_at: Utc::now(),
    };

    diesel::insert_into(deal_attachments::table)
        .values(&attachment)
        .execute(&mut conn)?;

    Ok((StatusCode::CREATED, Json(attachment)))
}

pub async fn remove_attachment(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path((id, attachment_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let mut conn = state.conn.get()?;
    load_owned_deal(&mut conn, &user, id)?;

    let deleted = diesel::delete(
        deal_attachments::table
            .filter(deal_attachments::id.eq(attachment_id))
            .filter(deal_attachments::deal_id.eq(id)),
    )
    .execute(&mut conn)?;

    if deleted == 0 {
        return Err(ApiError::not_found("Attachment"));
    }

    Ok(StatusCode::NO_CONTENT)
}

pub fn configure_deal_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/deals", get(list_deals).post(create_deal))
        .route(
            "/api/deals/{id}",
            get(get_deal).patch(update_deal).delete(delete_deal),
        )
        .route("/api/deals/{id}/stage", patch(change_stage))
        .route("/api/deals/{id}/close", patch(close_deal))
        .route(
            "/api/deals/{id}/comments",
            get(list_comments).post(add_comment),
        )
        .route(
            "/api/deals/{id}/attachments",
            get(list_attachments).post(add_attachment),
        )
        .route(
            "/api/deals/{id}/attachments/{attachment_id}",
            delete(remove_attachment),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_cap_is_five_megabytes() {
        assert_eq!(MAX_ATTACHMENT_BYTES, 5 * 1024 * 1024);
    }
}
