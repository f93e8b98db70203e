use std::io;
use std::path::{Path, PathBuf};

use endpoint::Endpoint;
use kernel::rules::{self, Rejection, UPLOAD_FIELD};
use kernel::{Analytics, ImageRecord, MessageReply, UploadReply};
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

pub mod endpoint;
pub mod render;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid server uri: {0}")]
    Uri(String),
    #[error("{0}")]
    Rejected(Rejection),
    #[error("{path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server responded {status}: {message}")]
    Server { status: StatusCode, message: String },
}

/// HTTP client for an imgpress server.
pub struct Client {
    endpoint: Endpoint,
    http: reqwest::Client,
}

impl Client {
    pub fn new(uri: &str) -> Result<Self, ClientError> {
        let endpoint = Endpoint::new(uri).ok_or_else(|| ClientError::Uri(uri.to_owned()))?;
        Ok(Self {
            endpoint,
            http: reqwest::Client::new(),
        })
    }

    /// Uploads an image after checking it against the same rules the server
    /// enforces.
    pub async fn upload(&self, path: &Path) -> Result<UploadReply, ClientError> {
        let io_error = |source| ClientError::Io {
            path: path.to_owned(),
            source,
        };
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_owned();
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_owned();

        let f = File::open(path).await.map_err(io_error)?;
        let len = f.metadata().await.map_err(io_error)?.len();
        rules::check(&file_name, &content_type, len).map_err(ClientError::Rejected)?;

        let stream = reqwest::Body::wrap_stream(ReaderStream::new(f));
        let part = Part::stream_with_length(stream, len)
            .file_name(file_name)
            .mime_str(&content_type)?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        let response = self
            .http
            .post(self.endpoint.images())
            .multipart(form)
            .send()
            .await?;
        Ok(success(response).await?.json().await?)
    }

    pub async fn list(&self) -> Result<Vec<ImageRecord>, ClientError> {
        let response = self.http.get(self.endpoint.images()).send().await?;
        Ok(success(response).await?.json().await?)
    }

    pub async fn analytics(&self) -> Result<Analytics, ClientError> {
        let response = self.http.get(self.endpoint.analytics()).send().await?;
        Ok(success(response).await?.json().await?)
    }

    /// Saves the compressed copy of an image. Without `out` the name the
    /// server suggests is used in the current directory.
    ///
    /// Returns the written path and the number of bytes.
    pub async fn download(&self, id: &str, out: Option<&Path>) -> Result<(PathBuf, u64), ClientError> {
        let response = self.http.get(self.endpoint.download(id)).send().await?;
        let mut response = success(response).await?;

        let target = match out {
            Some(p) => p.to_owned(),
            None => response
                .headers()
                .get(reqwest::header::CONTENT_DISPOSITION)
                .and_then(|v| v.to_str().ok())
                .and_then(filename_from_disposition)
                .map_or_else(|| PathBuf::from(format!("compressed-{id}.jpg")), PathBuf::from),
        };

        let io_error = |source| ClientError::Io {
            path: target.clone(),
            source,
        };
        let mut file = File::create(&target).await.map_err(io_error)?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await.map_err(io_error)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(io_error)?;
        Ok((target, written))
    }
}

async fn success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let message = error_message(&text).unwrap_or(text);
    Err(ClientError::Server { status, message })
}

/// `message` of a JSON error body.
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<MessageReply>(body)
        .ok()
        .map(|r| r.message)
}

/// Extracts a safe local file name from a `Content-Disposition` value.
///
/// Prefers the plain `filename` parameter; directory components are dropped.
#[must_use]
pub fn filename_from_disposition(value: &str) -> Option<String> {
    let raw = value
        .split(';')
        .map(str::trim)
        .find_map(|p| p.strip_prefix("filename="))?;
    let name = raw.trim_matches('"');
    let name = match name.rfind(&['\\', '/']) {
        Some(ix) => &name[ix + 1..],
        None => name,
    };
    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name.to_owned())
    }
}
