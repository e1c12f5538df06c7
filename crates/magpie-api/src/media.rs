use axum::{
    Extension, Json,
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// POST /medias — multipart upload, `file` field. Validation happens in
/// the service before any row is created or any job is queued; the
/// response returns the media id while the disk write runs out-of-band.
pub async fn add_media(
    State(state): State<AppState>,
    Extension(_user): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("multipart read failed: {}", e)))?
    {
        if field.name() == Some("file") {
            let filename = field
                .file_name()
                .ok_or(ApiError::WrongFileKind)?
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|_| ApiError::FileTooLarge)?
                .to_vec();
            file = Some((filename, bytes));
        }
    }
    let (filename, bytes) = file.ok_or(ApiError::WrongFileKind)?;

    let svc = state.tweets.clone();
    let media_id =
        tokio::task::spawn_blocking(move || svc.add_media(&filename, bytes)).await??;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "result": true, "media_id": media_id })),
    ))
}
