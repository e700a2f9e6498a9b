// Main entry point for API server

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use prereview_core::kernel::PgDirectory;
use prereview_core::server::{build_app, build_evaluator, AppState};
use prereview_core::{domains::auth::JwtService, Config};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,prereview_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting PREreview access control server");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        admin_overrides = config.admin_users.len(),
        "Configuration loaded"
    );

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    let directory = Arc::new(PgDirectory::new(pool.clone()));
    let state = AppState {
        evaluator: Arc::new(build_evaluator(directory, config.admin_users.clone())),
        jwt_service: Arc::new(JwtService::new(&config.jwt_secret, config.jwt_issuer.clone())),
        db_pool: Some(pool),
    };

    // Review platform routes attach here with their own RequirePolicy layers
    let app = build_app(state, Router::new(), &config.allowed_origins);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
