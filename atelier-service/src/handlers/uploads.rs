//! Image uploads: design sketches and payment screenshots are pushed to
//! the external image host; only the returned URL is stored.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use atelier_core::error::AppError;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

#[tracing::instrument(skip(state, multipart))]
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("image") {
            continue;
        }
        let file_name = field
            .file_name()
            .unwrap_or("upload.jpg")
            .to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(anyhow::anyhow!("failed to read upload: {e}")))?;

        let url = state
            .storage
            .upload(&file_name, &content_type, bytes.to_vec())
            .await
            .map_err(AppError::InternalError)?;

        tracing::info!(file = %file_name, "Image uploaded");
        return Ok((StatusCode::CREATED, Json(UploadResponse { url })));
    }

    Err(AppError::BadRequest(anyhow::anyhow!(
        "multipart body is missing an 'image' field"
    )))
}
