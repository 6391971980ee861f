// ABOUTME: Main entry point for the drivebox file-storage webapp backend
// ABOUTME: Sets up routes, shared state, and the HTTP server

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

mod appwrite;
mod auth;
mod config;
mod error;
mod files;
mod middleware;
mod session;
mod types;


use config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
}

pub fn app(config: Config) -> Router {
    let state = AppState {
        config: Arc::new(config),
    };

    Router::new()
        .route("/auth/otp", post(auth::send_otp))
        .route("/auth/sign-up", post(auth::create_account))
        .route("/auth/sign-in", post(auth::sign_in))
        .route("/auth/verify", post(auth::verify_secret))
        .route("/auth/sign-out", post(auth::sign_out))
        .route("/auth/me", get(auth::current_user))
        .route("/files", get(files::list_files))
        .route("/files/upload", post(files::upload_file))
        .route("/files/space", get(files::total_space_used))
        .route("/files/:file_id/actions", post(files::file_action))
        .route(
            "/storage/:bucket_file_id/download-url",
            get(files::download_url),
        )
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let addr = config.bind_addr.clone();

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("listening on {}", addr);
    axum::serve(listener, app(config)).await?;
    Ok(())
}
