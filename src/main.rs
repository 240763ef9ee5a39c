use anyhow::{Context, Result};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crmserver::config::AppConfig;
use crmserver::shared::state::AppState;
use crmserver::shared::utils::create_conn;
use crmserver::{build_router, maintenance};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    let pool = create_conn(&config.database_url())?;

    // One-shot maintenance subcommands for external cron.
    let args: Vec<String> = std::env::args().collect();
    if let Some(command) = args.get(1) {
        match command.as_str() {
            "mark-overdue" => {
                let count = maintenance::mark_overdue_tasks(&pool)?;
                info!("mark-overdue finished, {} task(s) updated", count);
                return Ok(());
            }
            "send-reminders" => {
                let count = maintenance::send_due_reminders(&pool)?;
                info!("send-reminders finished, {} reminder(s) sent", count);
                return Ok(());
            }
            other => anyhow::bail!("Unknown command: {other}"),
        }
    }

    {
        let mut conn = pool.get().context("Failed to get connection for migrations")?;
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|e| anyhow::anyhow!("Failed to run migrations: {e}"))?;
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(pool, config);
    let app = build_router(state);

    info!("CRM server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind server address")?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
