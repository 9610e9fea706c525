//! Route handlers and error→status mapping.

use {
    axum::{
        Json,
        extract::{Path, State},
        http::{HeaderMap, StatusCode, header::HOST},
        response::{IntoResponse, Response},
    },
    serde::Deserialize,
    tracing::warn,
};

use vignette_media::Error as MediaError;

use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub url: String,
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Response {
    match state.service.count().await {
        Ok(images) => Json(serde_json::json!({ "ok": true, "images": images })).into_response(),
        Err(error) => error_response(error),
    }
}

/// `POST /api/images/upload-by-url`
pub async fn upload_by_url(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<UploadRequest>,
) -> Response {
    match state.service.create_from_url(&req.url).await {
        Ok(record) => Json(serde_json::json!({
            "id": record.id,
            "url": public_url(&headers, &record.storage_path),
        }))
        .into_response(),
        Err(error) => error_response(error),
    }
}

/// `GET /api/images/{id}/url`
pub async fn image_url(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    match state.service.original(id).await {
        Ok(record) => Json(serde_json::json!({
            "url": public_url(&headers, &record.storage_path),
        }))
        .into_response(),
        Err(error) => error_response(error),
    }
}

/// `GET /api/images/{id}/url/{size}`
pub async fn thumbnail_url(
    State(state): State<AppState>,
    Path((id, size)): Path<(i64, u32)>,
    headers: HeaderMap,
) -> Response {
    match state.service.thumbnail(id, size).await {
        Ok(path) => Json(serde_json::json!({
            "path": path,
            "url": public_url(&headers, &path),
        }))
        .into_response(),
        Err(error) => error_response(error),
    }
}

/// `DELETE /api/images/{id}`
pub async fn remove(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.service.delete(id).await {
        Ok(()) => Json(serde_json::json!({ "ok": true })).into_response(),
        Err(error) => error_response(error),
    }
}

/// Public URL for a storage-root-relative path, built from the request
/// `Host` header.
fn public_url(headers: &HeaderMap, relative: &str) -> String {
    let host = headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("http://{host}/{relative}")
}

/// Map a pipeline error to a wire status. Validation failures surface as
/// client errors; storage and store failures stay generic.
fn status_for(error: &MediaError) -> StatusCode {
    match error {
        MediaError::InvalidUrl { .. } | MediaError::UnsupportedSize { .. } => {
            StatusCode::BAD_REQUEST
        },
        MediaError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        MediaError::NotFound => StatusCode::NOT_FOUND,
        MediaError::Decode { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        MediaError::Storage(_) | MediaError::Transport(_) | MediaError::Store(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        },
    }
}

fn error_response(error: MediaError) -> Response {
    let status = status_for(&error);
    if status.is_server_error() {
        warn!(%error, "request failed");
        // Short generic message only; internal detail stays in the logs.
        (
            status,
            Json(serde_json::json!({ "ok": false, "error": "internal error" })),
        )
            .into_response()
    } else {
        (
            status,
            Json(serde_json::json!({ "ok": false, "error": error.to_string() })),
        )
            .into_response()
    }
}
