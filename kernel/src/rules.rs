//! Upload acceptance rules shared by the server (authoritative) and the client
//! (pre-validation before sending).

use std::fmt;
use std::path::Path;

/// Largest accepted upload: 5 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Multipart field that carries the image.
pub const UPLOAD_FIELD: &str = "image";

pub const ALLOWED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];

pub const ALLOWED_CONTENT_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/gif"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Extension or declared content type is not an accepted image type
    Type,
    /// Upload is larger than [`MAX_UPLOAD_BYTES`]
    Size,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Type => write!(f, "Only JPEG, PNG and GIF images are allowed"),
            Rejection::Size => write!(f, "File size too large. Maximum size is 5MB."),
        }
    }
}

#[must_use]
pub fn is_allowed_extension(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .is_some_and(|e| ALLOWED_EXTENSIONS.contains(&e.as_str()))
}

#[must_use]
pub fn is_allowed_content_type(content_type: &str) -> bool {
    // parameters such as `; charset=...` are not part of the type
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    ALLOWED_CONTENT_TYPES.contains(&essence.as_str())
}

/// Checks name, declared type and size. Type is checked before size.
pub fn check(file_name: &str, content_type: &str, size: u64) -> Result<(), Rejection> {
    if !is_allowed_extension(file_name) || !is_allowed_content_type(content_type) {
        return Err(Rejection::Type);
    }
    if size > MAX_UPLOAD_BYTES {
        return Err(Rejection::Size);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("a.jpg", true)]
    #[case("a.JPEG", true)]
    #[case("dir/a.png", true)]
    #[case("a.gif", true)]
    #[case("a.webp", false)]
    #[case("a.png.exe", false)]
    #[case("jpg", false)]
    #[case("", false)]
    #[trace]
    fn extension(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_allowed_extension(name), expected);
    }

    #[rstest]
    #[case("image/jpeg", true)]
    #[case("IMAGE/PNG", true)]
    #[case("image/gif; foo=bar", true)]
    #[case("image/jpg", true)]
    #[case("image/webp", false)]
    #[case("application/octet-stream", false)]
    #[case("text/plain", false)]
    #[case("", false)]
    #[trace]
    fn content_type(#[case] ct: &str, #[case] expected: bool) {
        assert_eq!(is_allowed_content_type(ct), expected);
    }

    #[rstest]
    #[case("a.png", "image/png", MAX_UPLOAD_BYTES, Ok(()))]
    #[case("a.png", "image/png", MAX_UPLOAD_BYTES + 1, Err(Rejection::Size))]
    #[case("a.png", "text/plain", 10, Err(Rejection::Type))]
    #[case("a.txt", "image/png", 10, Err(Rejection::Type))]
    #[case("a.txt", "image/png", MAX_UPLOAD_BYTES + 1, Err(Rejection::Type))]
    #[trace]
    fn check_all(
        #[case] name: &str,
        #[case] ct: &str,
        #[case] size: u64,
        #[case] expected: Result<(), Rejection>,
    ) {
        assert_eq!(check(name, ct, size), expected);
    }

    #[test]
    fn size_message_mentions_limit() {
        assert!(Rejection::Size.to_string().contains("5MB"));
    }
}
