/// Estate Auth Service - Main entry point
use axum::{
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use estate_auth_service::{
    config::Config,
    db::PgAccountStore,
    handlers::{
        forgot_password, login, register, resend_verification, reset_password, verify_code,
        verify_email,
    },
    security::SessionIssuer,
    services::{AuthService, SmtpMailer},
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "estate_auth_service=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env().expect("Failed to load configuration from environment");

    tracing::info!(
        "Starting Estate Auth Service on {}:{}",
        config.server_host,
        config.server_port
    );

    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&db_pool).await?;

    tracing::info!("Database connection pool initialized");

    let store = Arc::new(PgAccountStore::new(db_pool));
    let mailer = Arc::new(SmtpMailer::from_config(&config)?);
    let sessions = SessionIssuer::new(&config.jwt_secret);

    let app_state = AppState {
        auth: AuthService::new(store, mailer, sessions),
    };

    let router = Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/verify-email/:token", get(verify_email))
        .route("/api/auth/verify-code", post(verify_code))
        .route("/api/auth/login", post(login))
        .route("/api/auth/forgot-password", post(forgot_password))
        .route("/api/auth/reset-password", post(reset_password))
        .route("/api/auth/resend-verification", post(resend_verification))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port).parse()?;
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, router).await?;

    Ok(())
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
