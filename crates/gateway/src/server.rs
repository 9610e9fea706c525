use std::{path::PathBuf, sync::Arc};

use {
    axum::{
        Router,
        routing::{delete, get, post},
    },
    tower_http::{
        cors::{Any, CorsLayer},
        services::ServeDir,
    },
    tracing::info,
};

use vignette_media::ImageService;

use crate::routes;

// ── Shared app state ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ImageService>,
    /// Directory served under `/images` so public URLs resolve.
    pub images_dir: PathBuf,
}

// ── Server startup ───────────────────────────────────────────────────────────

/// Build the router (shared between production startup and tests).
pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health))
        .route("/api/images/upload-by-url", post(routes::upload_by_url))
        .route("/api/images/{id}/url", get(routes::image_url))
        .route("/api/images/{id}/url/{size}", get(routes::thumbnail_url))
        .route("/api/images/{id}", delete(routes::remove))
        .nest_service("/images", ServeDir::new(state.images_dir.clone()))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server.
pub async fn start_server(bind: &str, port: u16, state: AppState) -> anyhow::Result<()> {
    let addr = format!("{bind}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "vignette listening");

    axum::serve(listener, build_app(state)).await?;
    Ok(())
}
