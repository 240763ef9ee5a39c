pub mod audit;
pub mod auth;
pub mod calendar;
pub mod config;
pub mod dashboard;
pub mod deals;
pub mod leads;
pub mod maintenance;
pub mod shared;
pub mod tasks;

use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::shared::state::AppState;

/// Assembles the full API router with shared middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(auth::configure_auth_routes())
        .merge(leads::configure_lead_routes())
        .merge(deals::configure_deal_routes())
        .merge(tasks::configure_task_routes())
        .merge(calendar::configure_calendar_routes())
        .merge(dashboard::configure_dashboard_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
