//! Task tracking: CRUD with typed links to leads or deals, plus
//! comments and attachment metadata.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::audit::{self, AuditAction};
use crate::auth::CurrentUser;
use crate::dashboard;
use crate::shared::error::ApiError;
use crate::shared::schema::{deals, leads, task_attachments, task_comments, tasks};
use crate::shared::state::AppState;

const MAX_ATTACHMENT_BYTES: i64 = 5 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ApiError> {
        match s {
            "Low" => Ok(Self::Low),
            "Medium" => Ok(Self::Medium),
            "High" => Ok(Self::High),
            "Critical" => Ok(Self::Critical),
            other => Err(ApiError::validation(
                "priority",
                format!("\"{other}\" is not a valid task priority."),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStage {
    ToDo,
    InProgress,
    Review,
    Done,
}

impl TaskStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ToDo => "To Do",
            Self::InProgress => "In Progress",
            Self::Review => "Review",
            Self::Done => "Done",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ApiError> {
        match s {
            "To Do" => Ok(Self::ToDo),
            "In Progress" => Ok(Self::InProgress),
            "Review" => Ok(Self::Review),
            "Done" => Ok(Self::Done),
            other => Err(ApiError::validation(
                "stage",
                format!("\"{other}\" is not a valid task stage."),
            )),
        }
    }
}

/// Typed link from a task to the record it was raised against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelatedKind {
    Lead,
    Deal,
}

impl RelatedKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lead => "lead",
            Self::Deal => "deal",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ApiError> {
        match s {
            "lead" => Ok(Self::Lead),
            "deal" => Ok(Self::Deal),
            other => Err(ApiError::validation(
                "related_kind",
                format!("\"{other}\" is not a valid related kind."),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = tasks)]
pub struct Task {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub client: String,
    pub priority: String,
    pub stage: String,
    pub due_date: Option<NaiveDate>,
    pub is_overdue: bool,
    pub assignee_id: Option<Uuid>,
    pub created_by: Uuid,
    pub related_kind: Option<String>,
    pub related_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = task_comments)]
pub struct TaskComment {
    pub id: Uuid,
    pub task_id: Uuid,
    pub text: String,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = task_attachments)]
pub struct TaskAttachment {
    pub id: Uuid,
    pub task_id: Uuid,
    pub file_name: String,
    pub file_size: i64,
    pub uploaded_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub client: String,
    pub priority: Option<String>,
    pub stage: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub assignee_id: Option<Uuid>,
    pub related_kind: Option<String>,
    pub related_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub client: Option<String>,
    pub priority: Option<String>,
    pub stage: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub assignee_id: Option<Uuid>,
    pub related_kind: Option<String>,
    pub related_id: Option<Uuid>,
}

#[derive(AsChangeset)]
#[diesel(table_name = tasks)]
struct TaskChanges {
    title: Option<String>,
    description: Option<String>,
    client: Option<String>,
    priority: Option<String>,
    stage: Option<String>,
    due_date: Option<NaiveDate>,
    assignee_id: Option<Uuid>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    pub stage: Option<String>,
    pub priority: Option<String>,
    pub search: Option<String>,
    pub overdue: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
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

fn load_owned_task(conn: &mut PooledPg, user: &CurrentUser, id: Uuid) -> Result<Task, ApiError> {
    tasks::table
        .filter(tasks::id.eq(id))
        .filter(tasks::owner_id.eq(user.id))
        .first(conn)
        .map_err(|_| ApiError::not_found("Task"))
}

/// Resolves a typed related link, checking the target exists and belongs
/// to the caller.
fn resolve_related(
    conn: &mut PooledPg,
    user: &CurrentUser,
    kind: Option<&str>,
    id: Option<Uuid>,
) -> Result<Option<(RelatedKind, Uuid)>, ApiError> {
    let (kind, id) = match (kind, id) {
        (None, None) => return Ok(None),
        (Some(kind), Some(id)) => (RelatedKind::parse(kind)?, id),
        _ => {
            return Err(ApiError::validation(
                "related_id",
                "related_kind and related_id must be provided together.",
            ))
        }
    };

    let found: i64 = match kind {
        RelatedKind::Lead => leads::table
            .filter(leads::id.eq(id))
            .filter(leads::owner_id.eq(user.id))
            .count()
            .get_result(conn)?,
        RelatedKind::Deal => deals::table
            .filter(deals::id.eq(id))
            .filter(deals::owner_id.eq(user.id))
            .count()
            .get_result(conn)?,
    };

    if found == 0 {
        return Err(ApiError::not_found(match kind {
            RelatedKind::Lead => "Lead",
            RelatedKind::Deal => "Deal",
        }));
    }

    Ok(Some((kind, id)))
}

pub async fn create_task(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(req): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::validation("title", "This field may not be blank."));
    }

    let priority = match req.priority.as_deref() {
        Some(p) => TaskPriority::parse(p)?,
        None => TaskPriority::Medium,
    };
    let stage = match req.stage.as_deref() {
        Some(s) => TaskStage::parse(s)?,
        None => TaskStage::ToDo,
    };

    let mut conn = state.conn.get()?;
    let related = resolve_related(&mut conn, &user, req.related_kind.as_deref(), req.related_id)?;

    let now = Utc::now();
    let task = Task {
        id: Uuid::new_v4(),
        owner_id: user.id,
        title: req.title,
        description: req.description,
        client: req.client,
        priority: priority.as_str().to_string(),
        stage: stage.as_str().to_string(),
        due_date: req.due_date,
        is_overdue: false,
        assignee_id: req.assignee_id,
        created_by: user.id,
        related_kind: related.map(|(k, _)| k.as_str().to_string()),
        related_id: related.map(|(_, id)| id),
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(tasks::table)
        .values(&task)
        .execute(&mut conn)?;

    audit::record(&mut conn, user.id, "task", task.id, AuditAction::Create, None);
    dashboard::record_activity(
        &mut conn,
        user.id,
        "task_created",
        &format!("{} Task Created", task.title),
        None,
        None,
        Some(task.id),
    );

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<TaskListQuery>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let mut conn = state.conn.get()?;
    let limit = query.limit.unwrap_or(50);
    let offset = query.offset.unwrap_or(0);

    let mut q = tasks::table
        .filter(tasks::owner_id.eq(user.id))
        .into_boxed();

    if let Some(stage) = query.stage {
        TaskStage::parse(&stage)?;
        q = q.filter(tasks::stage.eq(stage));
    }

    if let Some(priority) = query.priority {
        TaskPriority::parse(&priority)?;
        q = q.filter(tasks::priority.eq(priority));
    }

    if let Some(overdue) = query.overdue {
        q = q.filter(tasks::is_overdue.eq(overdue));
    }

    if let Some(search) = query.search {
        let pattern = format!("%{search}%");
        q = q.filter(
            tasks::title
                .ilike(pattern.clone())
                .or(tasks::client.ilike(pattern)),
        );
    }

    let rows: Vec<Task> = q
        .order(tasks::created_at.desc())
        .limit(limit)
        .offset(offset)
        .load(&mut conn)?;

    Ok(Json(rows))
}

pub async fn get_task(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Task>, ApiError> {
    let mut conn = state.conn.get()?;
    Ok(Json(load_owned_task(&mut conn, &user, id)?))
}

pub async fn update_task(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<Json<Task>, ApiError> {
    let mut conn = state.conn.get()?;
    load_owned_task(&mut conn, &user, id)?;

    if let Some(priority) = req.priority.as_deref() {
        TaskPriority::parse(priority)?;
    }
    let new_stage = req.stage.as_deref().map(TaskStage::parse).transpose()?;

    let related_requested = req.related_kind.is_some() || req.related_id.is_some();
    let related = if related_requested {
        resolve_related(&mut conn, &user, req.related_kind.as_deref(), req.related_id)?
    } else {
        None
    };

    let changes = TaskChanges {
        title: req.title,
        description: req.description,
        client: req.client,
        priority: req.priority,
        stage: req.stage,
        due_date: req.due_date,
        assignee_id: req.assignee_id,
        updated_at: Utc::now(),
    };

    diesel::update(tasks::table.filter(tasks::id.eq(id)))
        .set(&changes)
        .execute(&mut conn)?;

    if let Some((kind, related_id)) = related {
        diesel::update(tasks::table.filter(tasks::id.eq(id)))
            .set((
                tasks::related_kind.eq(kind.as_str()),
                tasks::related_id.eq(related_id),
            ))
            .execute(&mut conn)?;
    }

    // Moving a task to Done clears its overdue flag.
    if new_stage == Some(TaskStage::Done) {
        diesel::update(tasks::table.filter(tasks::id.eq(id)))
            .set(tasks::is_overdue.eq(false))
            .execute(&mut conn)?;
    }

    audit::record(&mut conn, user.id, "task", id, AuditAction::Update, None);

    Ok(Json(load_owned_task(&mut conn, &user, id)?))
}

pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut conn = state.conn.get()?;
    load_owned_task(&mut conn, &user, id)?;

    diesel::delete(tasks::table.filter(tasks::id.eq(id))).execute(&mut conn)?;
    audit::record(&mut conn, user.id, "task", id, AuditAction::Delete, None);

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<TaskComment>>, ApiError> {
    let mut conn = state.conn.get()?;
    load_owned_task(&mut conn, &user, id)?;

    let comments: Vec<TaskComment> = task_comments::table
        .filter(task_comments::task_id.eq(id))
        .order(task_comments::created_at.asc())
        .load(&mut conn)?;

    Ok(Json(comments))
}

pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<TaskComment>), ApiError> {
    if req.text.trim().is_empty() {
        return Err(ApiError::validation("text", "This field may not be blank."));
    }

    let mut conn = state.conn.get()?;
    load_owned_task(&mut conn, &user, id)?;

    let comment = TaskComment {
        id: Uuid::new_v4(),
        task_id: id,
        text: req.text,
        author_id: user.id,
        created_at: Utc::now(),
    };

    diesel::insert_into(task_comments::table)
        .values(&comment)
        .execute(&mut conn)?;

    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn list_attachments(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<TaskAttachment>>, ApiError> {
    let mut conn = state.conn.get()?;
    load_owned_task(&mut conn, &user, id)?;

    let attachments: Vec<TaskAttachment> = task_attachments::table
        .filter(task_attachments::task_id.eq(id))
        .order(task_attachments::created_at.desc())
        .load(&mut conn)?;

    Ok(Json(attachments))
}

pub async fn add_attachment(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateAttachmentRequest>,
) -> Result<(StatusCode, Json<TaskAttachment>), ApiError> {
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
    load_owned_task(&mut conn, &user, id)?;

    let attachment = TaskAttachment {
        id: Uuid::new_v4(),
        task_id: id,
        file_name: req.file_name,
        file_size: req.file_size,
        uploaded_by: user.id,
        created_at: Utc::now(),
    };

    diesel::insert_into(task_attachments::table)
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
    load_owned_task(&mut conn, &user, id)?;

    let deleted = diesel::delete(
        task_attachments::table
            .filter(task_attachments::id.eq(attachment_id))
            .filter(task_attachments::task_id.eq(id)),
    )
    .execute(&mut conn)?;

    if deleted == 0 {
        return Err(ApiError::not_found("Attachment"));
    }

    Ok(StatusCode::NO_CONTENT)
}

pub fn configure_task_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route(
            "/api/tasks/{id}/comments",
            get(list_comments).post(add_comment),
        )
        .route(
            "/api/tasks/{id}/attachments",
            get(list_attachments).post(add_attachment),
        )
        .route(
            "/api/tasks/{id}/attachments/{attachment_id}",
            delete(remove_attachment),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_parse_covers_all_levels() {
        for p in [
            TaskPriority::Low,
            TaskPriority::Medium,
            TaskPriority::High,
            TaskPriority::Critical,
        ] {
            assert_eq!(TaskPriority::parse(p.as_str()).unwrap(), p);
        }
        assert!(TaskPriority::parse("Urgent").is_err());
    }

    #[test]
    fn related_kind_is_lead_or_deal() {
        assert_eq!(RelatedKind::parse("lead").unwrap(), RelatedKind::Lead);
        assert_eq!(RelatedKind::parse("deal").unwrap(), RelatedKind::Deal);
        assert!(RelatedKind::parse("contact").is_err());
    }

    #[test]
    fn stage_uses_spaced_wire_names() {
        assert_eq!(TaskStage::ToDo.as_str(), "To Do");
        assert_eq!(TaskStage::parse("In Progress").unwrap(), TaskStage::InProgress);
        assert!(TaskStage::parse("ToDo").is_err());
    }
}
