#![warn(clippy::unwrap_in_result)]
#![warn(clippy::unwrap_used)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod rules;

/// Metadata describing one uploaded image and its compressed copy.
///
/// Records are append-only: created once after both artifacts exist on disk
/// and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    /// Unique identifier assigned when the record is created
    pub id: String,
    /// File name as supplied by the client
    pub original_name: String,
    /// Size of the uploaded file in bytes
    pub original_size: u64,
    /// Size of the compressed copy in bytes
    pub compressed_size: u64,
    /// Location of the uploaded file on the storage backend
    pub original_path: String,
    /// Location of the compressed copy on the storage backend
    pub compressed_path: String,
    /// Size reduction in percent. Negative when compression inflated the file
    pub compression_ratio: f64,
    /// Creation time, used for newest-first listing
    pub created_at: DateTime<Utc>,
}

impl ImageRecord {
    #[must_use]
    pub fn summary(&self) -> UploadSummary {
        UploadSummary {
            id: self.id.clone(),
            original_name: self.original_name.clone(),
            original_size: self.original_size,
            compressed_size: self.compressed_size,
            compression_ratio: self.compression_ratio,
        }
    }
}

/// Short description of a freshly compressed image returned by upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadSummary {
    pub id: String,
    pub original_name: String,
    pub original_size: u64,
    pub compressed_size: u64,
    pub compression_ratio: f64,
}

/// Body of a successful upload response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadReply {
    pub message: String,
    pub image: UploadSummary,
}

/// Body of every failed response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageReply {
    pub message: String,
}

impl MessageReply {
    #[must_use]
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Aggregate statistics over all stored images.
///
/// `average_compression_ratio` is the arithmetic mean of the per-image ratios,
/// not the ratio of the summed sizes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    /// Number of stored images
    pub total_images: u64,
    /// Sum of all original sizes in bytes
    pub total_original_size: u64,
    /// Sum of all compressed sizes in bytes
    pub total_compressed_size: u64,
    /// Original minus compressed total. Negative when compression inflated files overall
    pub total_space_saved: i64,
    /// Mean of per-image compression ratios in percent
    pub average_compression_ratio: f64,
}

impl Analytics {
    /// Builds analytics from the raw aggregates a store returns.
    #[must_use]
    pub fn new(
        total_images: u64,
        total_original_size: u64,
        total_compressed_size: u64,
        average_compression_ratio: f64,
    ) -> Self {
        let saved = i128::from(total_original_size) - i128::from(total_compressed_size);
        Self {
            total_images,
            total_original_size,
            total_compressed_size,
            total_space_saved: i64::try_from(saved).unwrap_or(i64::MAX),
            average_compression_ratio: if total_images == 0 {
                0.0
            } else {
                average_compression_ratio
            },
        }
    }

    /// Computes analytics over an in-memory set of records.
    #[must_use]
    pub fn from_records(records: &[ImageRecord]) -> Self {
        if records.is_empty() {
            return Self::default();
        }
        let original = records.iter().map(|r| r.original_size).sum();
        let compressed = records.iter().map(|r| r.compressed_size).sum();
        let ratios: f64 = records.iter().map(|r| r.compression_ratio).sum();
        #[allow(clippy::cast_precision_loss)]
        let mean = ratios / records.len() as f64;
        Self::new(records.len() as u64, original, compressed, mean)
    }
}

/// Size reduction in percent: `(original - compressed) / original * 100`.
///
/// Zero-byte originals yield `0.0`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn compression_ratio(original_size: u64, compressed_size: u64) -> f64 {
    if original_size == 0 {
        return 0.0;
    }
    let original = original_size as f64;
    (original - compressed_size as f64) / original * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn record(original_size: u64, compressed_size: u64) -> ImageRecord {
        ImageRecord {
            id: format!("{original_size}-{compressed_size}"),
            original_name: "a.png".to_owned(),
            original_size,
            compressed_size,
            original_path: String::new(),
            compressed_path: String::new(),
            compression_ratio: compression_ratio(original_size, compressed_size),
            created_at: Utc::now(),
        }
    }

    #[rstest]
    #[case(100, 40, 60.0)]
    #[case(100, 100, 0.0)]
    #[case(100, 150, -50.0)]
    #[case(3, 1, 200.0 / 3.0)]
    #[case(0, 0, 0.0)]
    #[case(0, 10, 0.0)]
    #[trace]
    fn compression_ratio_formula(
        #[case] original: u64,
        #[case] compressed: u64,
        #[case] expected: f64,
    ) {
        // Act
        let actual = compression_ratio(original, compressed);

        // Assert
        assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
    }

    #[test]
    fn analytics_of_nothing_is_zero() {
        // Act
        let analytics = Analytics::from_records(&[]);

        // Assert
        assert_eq!(analytics, Analytics::default());
        assert_eq!(analytics.average_compression_ratio, 0.0);
    }

    #[test]
    fn analytics_average_is_mean_of_ratios_not_ratio_of_sums() {
        // Arrange
        let records = vec![record(100, 50), record(1000, 900)];

        // Act
        let analytics = Analytics::from_records(&records);

        // Assert
        assert_eq!(analytics.total_images, 2);
        assert_eq!(analytics.total_original_size, 1100);
        assert_eq!(analytics.total_compressed_size, 950);
        assert_eq!(analytics.total_space_saved, 150);
        // (50% + 10%) / 2, whereas sums would give 150 / 1100 = 13.6%
        assert!((analytics.average_compression_ratio - 30.0).abs() < 1e-9);
    }

    #[test]
    fn analytics_space_saved_may_be_negative() {
        // Arrange
        let records = vec![record(100, 180)];

        // Act
        let analytics = Analytics::from_records(&records);

        // Assert
        assert_eq!(analytics.total_space_saved, -80);
        assert!((analytics.average_compression_ratio + 80.0).abs() < 1e-9);
    }

    #[test]
    fn analytics_new_ignores_average_when_empty() {
        // Act
        let analytics = Analytics::new(0, 0, 0, f64::NAN);

        // Assert
        assert_eq!(analytics.average_compression_ratio, 0.0);
    }

    #[test]
    fn record_serializes_in_camel_case() {
        // Arrange
        let r = record(10, 5);

        // Act
        let json = serde_json::to_value(&r).unwrap();

        // Assert
        assert_eq!(json["originalName"], "a.png");
        assert_eq!(json["originalSize"], 10);
        assert_eq!(json["compressedSize"], 5);
        assert_eq!(json["compressionRatio"], 50.0);
        assert!(json.get("createdAt").is_some());
        assert!(json.get("original_name").is_none());
    }

    #[test]
    fn summary_copies_record_fields() {
        // Arrange
        let r = record(10, 5);

        // Act
        let s = r.summary();

        // Assert
        assert_eq!(s.id, r.id);
        assert_eq!(s.original_name, r.original_name);
        assert_eq!(s.original_size, 10);
        assert_eq!(s.compressed_size, 5);
        assert_eq!(s.compression_ratio, 50.0);
    }
}
