#![allow(clippy::unused_async)]
use crate::domain::Storage;
use crate::error::{internal, ApiError};
use crate::file_reply::FileReply;
use crate::pipeline::{self, Upload};
use crate::sqlite::Mode;
use crate::state::AppState;
use axum::extract::multipart::{Field, MultipartError, MultipartRejection};
use axum::extract::State;
use axum::Json;
use kernel::rules::{MAX_UPLOAD_BYTES, UPLOAD_FIELD};
use kernel::{Analytics, ImageRecord, MessageReply, UploadReply};
use std::io;
use utoipa::ToSchema;

use axum::{
    extract::{Multipart, Path},
    http::StatusCode,
};

const UPLOADED: &str = "Image uploaded and compressed successfully";

/// Multipart form accepted by upload.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    /// JPEG, PNG or GIF file, at most 5 MiB
    #[schema(value_type = String, format = Binary)]
    image: Vec<u8>,
}

/// Uploads an image, compresses it and stores its metadata.
#[utoipa::path(
    post,
    path = "/api/images",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Image compressed", body = UploadReply),
        (status = 400, description = "Missing file, wrong type, too large or undecodable", body = MessageReply),
        (status = 413, description = "Request body above the server limit", body = MessageReply),
        (status = 500, description = "Server error", body = MessageReply)
    ),
    tag = "images",
)]
pub async fn upload_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<UploadReply>), ApiError> {
    let mut multipart = multipart.map_err(|e| {
        tracing::info!("upload is not a multipart form: {}", e.body_text());
        ApiError::MissingFile
    })?;
    let upload = read_upload(&mut multipart).await?;
    let record = pipeline::compress(&state, upload).await?;
    Ok((
        StatusCode::CREATED,
        Json(UploadReply {
            message: UPLOADED.to_owned(),
            image: record.summary(),
        }),
    ))
}

/// Lists all images, newest first
#[utoipa::path(
    get,
    path = "/api/images",
    responses(
        (status = 200, description = "All stored images", body = [ImageRecord]),
        (status = 500, description = "Server error", body = MessageReply)
    ),
    tag = "images",
)]
pub async fn get_images(State(state): State<AppState>) -> Result<Json<Vec<ImageRecord>>, ApiError> {
    let images = state
        .execute(Mode::ReadOnly, |repository| repository.get_images())
        .map_err(internal("Error fetching images"))?;
    Ok(Json(images))
}

/// Downloads the compressed copy of an image
#[utoipa::path(
    get,
    path = "/api/images/{id}/download",
    responses(
        (status = 200, description = "Compressed image binary content (image/jpeg)"),
        (status = 404, description = "Image or its compressed file not found", body = MessageReply),
        (status = 500, description = "Server error", body = MessageReply)
    ),
    tag = "images",
    params(
        ("id" = String, Path, description = "Image id")
    ),
)]
pub async fn download_image(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<FileReply, ApiError> {
    let context = "Error downloading image";
    let image = state
        .execute(Mode::ReadOnly, |repository| repository.get_image(&id))
        .map_err(internal(context))?
        .ok_or_else(|| ApiError::NotFound(id.clone()))?;

    let file = match tokio::fs::File::open(&image.compressed_path).await {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ApiError::ArtifactMissing {
                id,
                path: image.compressed_path,
            });
        }
        Err(e) => return Err(internal(context)(e)),
    };
    let len = file.metadata().await.map_err(internal(context))?.len();

    tracing::info!("Image downloaded: {} ({len} bytes)", image.original_name);
    Ok(FileReply::new(file, len, &image.original_name))
}

/// Aggregate statistics over all images
#[utoipa::path(
    get,
    path = "/api/images/analytics",
    responses(
        (status = 200, description = "Totals and mean compression ratio", body = Analytics),
        (status = 500, description = "Server error", body = MessageReply)
    ),
    tag = "images",
)]
pub async fn get_analytics(State(state): State<AppState>) -> Result<Json<Analytics>, ApiError> {
    let analytics = state
        .execute(Mode::ReadOnly, |repository| repository.get_analytics())
        .map_err(internal("Error fetching analytics"))?;
    Ok(Json(analytics))
}

pub async fn not_found() -> (StatusCode, Json<MessageReply>) {
    (StatusCode::NOT_FOUND, Json(MessageReply::new("Not found")))
}

/// Reads the `image` field. Other fields are ignored.
///
/// Rejected uploads drain the rest of the body so the client always gets to
/// read the response.
async fn read_upload(multipart: &mut Multipart) -> Result<Upload, ApiError> {
    while let Some(mut field) = next_field(multipart).await? {
        if field.name() != Some(UPLOAD_FIELD) {
            drain(&mut field).await?;
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_owned();
        let content_type = field.content_type().unwrap_or_default().to_owned();

        if let Err(e) = pipeline::check_type(&file_name, &content_type) {
            drain(&mut field).await?;
            drop(field);
            drain_all(multipart).await;
            return Err(e);
        }

        let mut data = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            if (data.len() + chunk.len()) as u64 > MAX_UPLOAD_BYTES {
                tracing::info!("upload {file_name} exceeds {MAX_UPLOAD_BYTES} bytes");
                drain(&mut field).await?;
                drop(field);
                drain_all(multipart).await;
                return Err(pipeline::too_large());
            }
            data.extend_from_slice(&chunk);
        }
        drop(field);
        drain_all(multipart).await;

        tracing::info!("file: {file_name} read: {} content type: {content_type}", data.len());
        return Ok(Upload {
            file_name,
            content_type,
            data,
        });
    }
    Err(ApiError::MissingFile)
}

async fn next_field<'a>(multipart: &'a mut Multipart) -> Result<Option<Field<'a>>, ApiError> {
    multipart.next_field().await.map_err(multipart_error)
}

async fn drain(field: &mut Field<'_>) -> Result<(), ApiError> {
    while field.chunk().await.map_err(multipart_error)?.is_some() {}
    Ok(())
}

async fn drain_all(multipart: &mut Multipart) {
    while let Ok(Some(mut field)) = multipart.next_field().await {
        if drain(&mut field).await.is_err() {
            break;
        }
    }
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::BodyTooLarge
    } else {
        ApiError::Multipart(e.body_text())
    }
}
