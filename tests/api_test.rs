//! End-to-end API tests against a real Postgres database.
//!
//! These run only when TEST_DATABASE_URL is set; each test signs up a
//! fresh user so data never crosses between runs.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use crmserver::build_router;
use crmserver::config::AppConfig;
use crmserver::shared::state::AppState;
use crmserver::shared::utils::create_conn;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

fn test_app() -> Option<Router> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    std::env::set_var("DATABASE_URL", &url);
    std::env::set_var("JWT_SECRET", "integration-test-secret");

    let config = AppConfig::from_env().expect("test config");
    let pool = create_conn(&url).expect("test pool");
    {
        let mut conn = pool.get().expect("migration connection");
        conn.run_pending_migrations(MIGRATIONS).expect("migrations");
    }
    Some(build_router(AppState::new(pool, config)))
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.expect("request");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}

fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn patch_json(uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("PATCH")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_authed(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

async fn signup(app: &Router) -> String {
    let email = format!("user-{}@example.com", Uuid::new_v4());
    let (status, body) = send(
        app,
        post_json(
            "/api/auth/signup",
            None,
            json!({"email": email, "password": "str0ng-password"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "signup failed: {body}");
    body["token"].as_str().expect("token").to_string()
}

#[tokio::test]
async fn requests_without_token_are_rejected() {
    let Some(app) = test_app() else { return };

    let req = Request::builder()
        .method("GET")
        .uri("/api/leads")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, req).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn leads_are_scoped_to_their_owner() {
    let Some(app) = test_app() else { return };

    let alice = signup(&app).await;
    let bob = signup(&app).await;

    let (status, lead) = send(
        &app,
        post_json(
            "/api/leads",
            Some(&alice),
            json!({
                "name": "Grace Hopper",
                "email": format!("grace-{}@example.com", Uuid::new_v4()),
                "phone": "5551234567"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create lead failed: {lead}");
    let lead_id = lead["id"].as_str().unwrap().to_string();

    // The owner can read it back.
    let (status, _) = send(&app, get_authed(&format!("/api/leads/{lead_id}"), &alice)).await;
    assert_eq!(status, StatusCode::OK);

    // Another user sees 404, not 403, so existence is not leaked.
    let (status, body) = send(&app, get_authed(&format!("/api/leads/{lead_id}"), &bob)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn deal_close_flow_enforces_the_pipeline() {
    let Some(app) = test_app() else { return };
    let token = signup(&app).await;

    let (status, deal) = send(
        &app,
        post_json(
            "/api/deals",
            Some(&token),
            json!({"title": "Enterprise renewal", "amount": 2500.0}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create deal failed: {deal}");
    assert_eq!(deal["stage"], "Clients");
    assert_eq!(deal["status"], "Open");
    let deal_id = deal["id"].as_str().unwrap().to_string();

    // The default status is a filterable value.
    let (status, open_deals) = send(&app, get_authed("/api/deals?status=Open", &token)).await;
    assert_eq!(status, StatusCode::OK, "status=Open filter failed: {open_deals}");
    assert!(!open_deals.as_array().unwrap().is_empty());

    // Closing from Clients is refused with a field-keyed error.
    let (status, body) = send(
        &app,
        patch_json(
            &format!("/api/deals/{deal_id}/close"),
            &token,
            json!({"status": "Won"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["stage"].is_string());

    // Move to Revenue, then close as Won.
    let (status, _) = send(
        &app,
        patch_json(
            &format!("/api/deals/{deal_id}/stage"),
            &token,
            json!({"stage": "Revenue"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, closed) = send(
        &app,
        patch_json(
            &format!("/api/deals/{deal_id}/close"),
            &token,
            json!({"status": "Won"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "close failed: {closed}");
    assert_eq!(closed["stage"], "Status");
    assert_eq!(closed["status"], "Won");

    // Closed deals cannot re-enter the pipeline.
    let (status, _) = send(
        &app,
        patch_json(
            &format!("/api/deals/{deal_id}/stage"),
            &token,
            json!({"stage": "Clients"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // But plain field edits on a closed deal still go through.
    let (status, edited) = send(
        &app,
        patch_json(
            &format!("/api/deals/{deal_id}"),
            &token,
            json!({"title": "Enterprise renewal (signed)"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "edit of closed deal failed: {edited}");
    assert_eq!(edited["title"], "Enterprise renewal (signed)");
    assert_eq!(edited["stage"], "Status");

    // The win shows up in the dashboard metrics.
    let (status, metrics) = send(&app, get_authed("/api/dashboard/metrics", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(metrics["won_deals_total"].as_i64().unwrap() >= 1);
    assert_eq!(metrics["customer_satisfaction_rate"].as_f64().unwrap(), 100.0);
}
