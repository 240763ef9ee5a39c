//! Explicit audit trail written from every mutating handler.
//!
//! Failures here are logged and swallowed; an audit miss never fails the
//! request that triggered it.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::shared::schema::audit_log;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = audit_log)]
pub struct AuditEntry {
    pub id: Uuid,
    pub actor_id: Option<Uuid>,
    pub entity_kind: String,
    pub entity_id: Uuid,
    pub action: String,
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub fn record(
    conn: &mut PooledConnection<ConnectionManager<PgConnection>>,
    actor_id: Uuid,
    entity_kind: &str,
    entity_id: Uuid,
    action: AuditAction,
    detail: Option<String>,
) {
    let entry = AuditEntry {
        id: Uuid::new_v4(),
        actor_id: Some(actor_id),
        entity_kind: entity_kind.to_string(),
        entity_id,
        action: action.as_str().to_string(),
        detail,
        created_at: Utc::now(),
    };

    if let Err(e) = diesel::insert_into(audit_log::table)
        .values(&entry)
        .execute(conn)
    {
        warn!(
            "audit write failed for {} {} on {entity_id}: {e}",
            action.as_str(),
            entity_kind
        );
    }
}
