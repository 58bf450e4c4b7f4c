use std::sync::Arc;

use axum::{Extension, Json};
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::instrument;

use crate::{
    photos::{Photo, PhotoService, UploadMetadata, UploadTicket},
    types::{AppError, JsonBody},
};

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlRequest {
    /// Original filename, used verbatim in the object key
    pub filename: String,
    /// MIME type the photo will be uploaded with
    pub file_type: String,
    /// Optional descriptive metadata; missing fields take defaults
    #[serde(default)]
    pub metadata: UploadMetadata,
}

/// Issues a presigned URL for uploading a photo directly to the bucket
///
/// The response carries the object key and the headers the client must send
/// with its PUT. Those headers are part of the signature; leaving any of them
/// out makes the upload fail with a signature mismatch.
///
/// # Errors
///
/// - 400 if the body is not JSON or lacks `filename` / `fileType`
/// - 500 if the URL cannot be signed
#[instrument(skip_all)]
pub async fn get_upload_url(
    Extension(photo_service): Extension<Arc<PhotoService>>,
    JsonBody(payload): JsonBody<UploadUrlRequest>,
) -> Result<Json<UploadTicket>, AppError> {
    let ticket = photo_service
        .request_upload_url(&payload.filename, &payload.file_type, &payload.metadata)
        .await
        .map_err(|e| AppError::storage(&e, "Failed to generate upload URL"))?;

    tracing::info!(key = %ticket.key, content_type = %payload.file_type, "Issued upload URL");

    Ok(Json(ticket))
}

/// Lists uploaded photos with their metadata and a presigned download URL
///
/// Photos whose metadata or URL cannot be fetched are left out of the
/// response; the omission is logged.
///
/// # Errors
///
/// - 500 if the bucket listing itself fails
#[instrument(skip_all)]
pub async fn list_photos(
    Extension(photo_service): Extension<Arc<PhotoService>>,
) -> Result<Json<Vec<Photo>>, AppError> {
    let listing = photo_service
        .list_photos()
        .await
        .map_err(|e| AppError::storage(&e, "Failed to list photos"))?;

    Ok(Json(listing.photos))
}
