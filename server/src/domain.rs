use std::fmt::{Debug, Display};

use chrono::{DateTime, Utc};
use kernel::{Analytics, ImageRecord};

/// Everything known about an image once both artifacts are on disk.
pub struct NewImage {
    pub original_name: String,
    pub original_size: u64,
    pub compressed_size: u64,
    pub original_path: String,
    pub compressed_path: String,
}

impl NewImage {
    /// Assigns identity and creation time. This is the only place `created_at` is set.
    #[must_use]
    pub fn into_record(self, id: String, created_at: DateTime<Utc>) -> ImageRecord {
        ImageRecord {
            id,
            compression_ratio: kernel::compression_ratio(self.original_size, self.compressed_size),
            original_name: self.original_name,
            original_size: self.original_size,
            compressed_size: self.compressed_size,
            original_path: self.original_path,
            compressed_path: self.compressed_path,
            created_at,
        }
    }
}

/// Append-only store of image metadata.
pub trait Storage {
    type Err: Debug + Display;

    /// Creates the schema if it is missing. Safe to call repeatedly.
    fn new_database(&self) -> Result<(), Self::Err>;

    fn insert_image(&mut self, image: NewImage) -> Result<ImageRecord, Self::Err>;

    /// All records, newest first.
    fn get_images(&mut self) -> Result<Vec<ImageRecord>, Self::Err>;

    /// `None` when no record has the id.
    fn get_image(&mut self, id: &str) -> Result<Option<ImageRecord>, Self::Err>;

    fn get_analytics(&mut self) -> Result<Analytics, Self::Err>;
}
