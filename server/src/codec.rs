use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{ImageError, ImageReader};

/// Quality every upload is re-encoded with.
pub const JPEG_QUALITY: u8 = 60;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("image codec error: {0}")]
    Image(#[from] ImageError),
    #[error("image io error: {0}")]
    Io(#[from] io::Error),
}

/// Re-encodes an image file into a new file.
///
/// Implementations are blocking and run on the blocking thread pool.
pub trait Codec: Send + Sync {
    fn recompress(&self, source: &Path, target: &Path) -> Result<(), CodecError>;
}

/// Decodes any supported input and writes it back as a baseline JPEG.
pub struct JpegCodec {
    quality: u8,
}

impl JpegCodec {
    #[must_use]
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }
}

impl Default for JpegCodec {
    fn default() -> Self {
        Self::new(JPEG_QUALITY)
    }
}

impl Codec for JpegCodec {
    fn recompress(&self, source: &Path, target: &Path) -> Result<(), CodecError> {
        // sniff the real format, the extension is client supplied
        let decoded = ImageReader::open(source)?.with_guessed_format()?.decode()?;
        // JPEG has no alpha channel
        let rgb = decoded.to_rgb8();

        let mut writer = BufWriter::new(File::create(target)?);
        let mut encoder = JpegEncoder::new_with_quality(&mut writer, self.quality);
        encoder.encode_image(&rgb)?;
        writer.flush()?;
        Ok(())
    }
}
