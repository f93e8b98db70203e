//! Upload → compress → persist.

use kernel::rules::{self, Rejection};
use kernel::ImageRecord;

use crate::artifacts::ArtifactPaths;
use crate::domain::{NewImage, Storage};
use crate::error::ApiError;
use crate::sqlite::Mode;
use crate::state::AppState;

/// One uploaded file, fully read into memory.
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Validates, compresses and records one upload.
///
/// On any failure after the original was written, both artifact paths are
/// removed on a best effort basis and no record exists.
pub async fn compress(state: &AppState, upload: Upload) -> Result<ImageRecord, ApiError> {
    let size = u64::try_from(upload.data.len()).unwrap_or(u64::MAX);
    rules::check(&upload.file_name, &upload.content_type, size).map_err(ApiError::Rejected)?;

    let paths = state.artifacts().reserve(&upload.file_name);
    match store_and_record(state, upload, &paths).await {
        Ok(record) => {
            tracing::info!(
                "Image compressed: {} {} -> {} bytes ({:.2}%)",
                record.original_name,
                record.original_size,
                record.compressed_size,
                record.compression_ratio
            );
            Ok(record)
        }
        Err(e) => {
            paths.remove().await;
            Err(e)
        }
    }
}

async fn store_and_record(
    state: &AppState,
    upload: Upload,
    paths: &ArtifactPaths,
) -> Result<ImageRecord, ApiError> {
    tokio::fs::write(&paths.original, &upload.data).await?;

    let codec = state.codec();
    let source = paths.original.clone();
    let target = paths.compressed.clone();
    tokio::task::spawn_blocking(move || codec.recompress(&source, &target))
        .await
        .map_err(|e| ApiError::Artifact(std::io::Error::other(e)))??;

    let original_size = tokio::fs::metadata(&paths.original).await?.len();
    let compressed_size = tokio::fs::metadata(&paths.compressed).await?.len();

    let image = NewImage {
        original_name: upload.file_name,
        original_size,
        compressed_size,
        original_path: paths.original.to_string_lossy().into_owned(),
        compressed_path: paths.compressed.to_string_lossy().into_owned(),
    };

    state
        .execute(Mode::ReadWrite, move |storage| storage.insert_image(image))
        .map_err(|e| ApiError::Storage(e.to_string()))
}

/// Early type check used before a body is buffered.
pub fn check_type(file_name: &str, content_type: &str) -> Result<(), ApiError> {
    rules::check(file_name, content_type, 0).map_err(ApiError::Rejected)
}

/// Error for a body that grew past the upload limit while reading.
#[must_use]
pub fn too_large() -> ApiError {
    ApiError::Rejected(Rejection::Size)
}
