use axum::{
    body::Body,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use tokio::fs::File;
use tokio_util::io::ReaderStream;

const DOWNLOAD_PREFIX: &str = "compressed-";

/// Streams a compressed image back as an attachment.
pub struct FileReply {
    file: File,
    len: u64,
    original_name: String,
}

impl FileReply {
    #[must_use]
    pub fn new(file: File, len: u64, original_name: &str) -> Self {
        Self {
            file,
            len,
            original_name: original_name.to_owned(),
        }
    }

    fn download_name(&self) -> String {
        let name = match self.original_name.rfind(&['\\', '/']) {
            Some(ix) => &self.original_name[ix + 1..],
            None => &self.original_name,
        };
        format!("{DOWNLOAD_PREFIX}{name}")
    }
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 encoded name.
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if fallback == file_name {
        format!(r#"attachment; filename="{fallback}""#)
    } else {
        let encoded = urlencoding::encode(file_name);
        format!(r#"attachment; filename="{fallback}"; filename*=UTF-8''{encoded}"#)
    }
}

impl IntoResponse for FileReply {
    fn into_response(self) -> Response {
        let attachment = content_disposition(&self.download_name());
        let stream = ReaderStream::new(self.file);
        let mut res = Body::from_stream(stream).into_response();
        res.headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("image/jpeg"));
        if let Ok(val) = HeaderValue::from_str(attachment.as_str()) {
            res.headers_mut().insert(header::CONTENT_DISPOSITION, val);
        }
        res.headers_mut()
            .insert(header::CONTENT_LENGTH, HeaderValue::from(self.len));

        res
    }
}
