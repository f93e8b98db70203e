use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use kernel::rules::Rejection;
use kernel::MessageReply;

use crate::codec::CodecError;

pub const GENERIC_MESSAGE: &str = "Something went wrong!";

/// Failures of the image endpoints.
///
/// Variants carrying a `String` keep the underlying cause for the log only;
/// it never reaches the response body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("no file uploaded")]
    MissingFile,
    #[error("upload rejected: {0}")]
    Rejected(Rejection),
    #[error("request body exceeds the server limit")]
    BodyTooLarge,
    #[error("malformed multipart body: {0}")]
    Multipart(String),
    #[error("processing error: {0}")]
    Processing(#[from] CodecError),
    #[error("artifact io error: {0}")]
    Artifact(#[from] std::io::Error),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("image {0} not found")]
    NotFound(String),
    #[error("compressed file of image {id} is missing at {path}")]
    ArtifactMissing { id: String, path: String },
    #[error("{context}: {cause}")]
    Internal {
        context: &'static str,
        cause: String,
    },
}

/// Transport independent outcome of an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub status: StatusCode,
    pub message: String,
}

impl Classified {
    fn new<S: Into<String>>(status: StatusCode, message: S) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// Maps an error to the status code and client facing message.
#[must_use]
pub fn classify(error: &ApiError) -> Classified {
    match error {
        ApiError::MissingFile => Classified::new(StatusCode::BAD_REQUEST, "No file uploaded"),
        ApiError::Rejected(r) => Classified::new(StatusCode::BAD_REQUEST, r.to_string()),
        ApiError::BodyTooLarge => {
            Classified::new(StatusCode::PAYLOAD_TOO_LARGE, Rejection::Size.to_string())
        }
        ApiError::Multipart(m) => Classified::new(StatusCode::BAD_REQUEST, m.as_str()),
        ApiError::Processing(_) => Classified::new(
            StatusCode::BAD_REQUEST,
            "Error processing image. Please try a different image.",
        ),
        ApiError::Artifact(_) => Classified::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error processing image. Please try again.",
        ),
        ApiError::Storage(_) => Classified::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Database error. Please try again.",
        ),
        ApiError::NotFound(_) => Classified::new(StatusCode::NOT_FOUND, "Image not found"),
        ApiError::ArtifactMissing { .. } => {
            Classified::new(StatusCode::NOT_FOUND, "Compressed image file not found")
        }
        ApiError::Internal { context, .. } => {
            Classified::new(StatusCode::INTERNAL_SERVER_ERROR, *context)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let classified = classify(&self);
        match &self {
            ApiError::ArtifactMissing { .. } => tracing::warn!("data integrity: {self}"),
            _ if classified.status.is_server_error() => tracing::error!("{self}"),
            _ => tracing::info!("{self}"),
        }
        (classified.status, Json(MessageReply::new(classified.message))).into_response()
    }
}

/// Wraps any failure into the generic 500 of a given operation.
pub fn internal<E: std::fmt::Display>(context: &'static str) -> impl FnOnce(E) -> ApiError {
    move |e| ApiError::Internal {
        context,
        cause: e.to_string(),
    }
}

/// Response for anything that escaped the handlers, e.g. a panic.
#[must_use]
pub fn generic_failure() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(MessageReply::new(GENERIC_MESSAGE)),
    )
        .into_response()
}
