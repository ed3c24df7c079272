//! Upload and convert.

use std::time::Instant;

use axum::extract::multipart::{Field, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::response::Html;
use tracing::{info, warn};

use chromashot_media::MediaError;
use chromashot_models::{JobId, Stage};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;
use crate::templates::{current_year, image_url, render_page};

/// Multipart field carrying the video.
pub const VIDEO_FIELD: &str = "video";

/// Accept a video, convert it, and render a page linking the result.
pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Html<String>> {
    let mut multipart = multipart.map_err(|rejection| {
        warn!("Rejected upload body: {}", rejection);
        ApiError::NoVideo
    })?;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!("Malformed multipart upload: {}", e);
        ApiError::NoVideo
    })? {
        // Browsers submit an empty, unnamed file part when nothing was picked.
        let has_file = field.file_name().is_some_and(|name| !name.is_empty());
        if field.name() == Some(VIDEO_FIELD) && has_file {
            return convert_upload(&state, field).await;
        }
    }

    Err(ApiError::NoVideo)
}

async fn convert_upload(state: &AppState, field: Field<'_>) -> ApiResult<Html<String>> {
    let job_id = JobId::new();
    let paths = state.store.reserve_paths(&job_id);

    // Every artifact is deleted on any early return from here on, including
    // cancellation when the client disconnects mid-conversion.
    let input = state.store.guard(&paths.input);
    let intermediate = state.store.guard(&paths.intermediate);
    let output = state.store.guard(&paths.output);

    let bytes = state.store.write_input(&paths.input, field).await?;
    info!(job_id = %job_id, bytes, "Stored upload, starting conversion");

    let start = Instant::now();
    let result = state.pipeline.convert(&paths).await;
    let result = match result {
        Ok(()) if !state.store.exists(&paths.output).await => Err(MediaError::conversion(
            Stage::Encode,
            MediaError::MissingOutput(paths.output.clone()),
        )),
        other => other,
    };
    metrics::record_conversion(&result, start.elapsed());
    result?;

    drop(input);
    drop(intermediate);
    output.disarm();

    info!(
        job_id = %job_id,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Conversion complete"
    );

    let url = image_url(&job_id);
    Ok(Html(render_page(current_year(), Some(&url))))
}
