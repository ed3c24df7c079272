//! Single-serve image delivery.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use tracing::info;

use chromashot_models::{ArtifactKind, JobId};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Stream `/image/<id>.png` and delete it afterwards.
///
/// The file is deleted when the response body is dropped, whether it was
/// sent completely or the connection failed, so each image can be fetched
/// at most once.
pub async fn serve_image(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> ApiResult<Response> {
    let job_id = file_name
        .strip_suffix(".png")
        .and_then(|id| JobId::parse(id).ok())
        .ok_or(ApiError::NotFound)?;

    let paths = state.store.reserve_paths(&job_id);
    let artifact = state.store.open_for_read(&paths.output).await.map_err(|e| {
        if e.is_not_found() {
            ApiError::NotFound
        } else {
            ApiError::Storage(e)
        }
    })?;

    let content_length = artifact.content_length();
    info!(job_id = %job_id, bytes = content_length, "Serving image");
    metrics::record_image_served();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, ArtifactKind::Output.content_type())
        .header(header::CONTENT_LENGTH, content_length)
        .header(header::CACHE_CONTROL, "no-store")
        .body(Body::from_stream(artifact.into_stream()))
        .map_err(|e| ApiError::internal(e.to_string()))
}
