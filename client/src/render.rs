//! Terminal rendering of server replies.

use comfy_table::{presets::UTF8_HORIZONTAL_ONLY, Attribute, Cell, CellAlignment, ContentArrangement, Table};
use kernel::{Analytics, ImageRecord, UploadSummary};

#[must_use]
pub fn kilobytes(bytes: u64) -> String {
    #[allow(clippy::cast_precision_loss)]
    let kb = bytes as f64 / 1024.0;
    format!("{kb:.2} KB")
}

#[must_use]
pub fn signed_kilobytes(bytes: i64) -> String {
    #[allow(clippy::cast_precision_loss)]
    let kb = bytes as f64 / 1024.0;
    format!("{kb:.2} KB")
}

#[must_use]
pub fn percent(ratio: f64) -> String {
    format!("{ratio:.2}%")
}

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_HORIZONTAL_ONLY)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120)
        .set_header(
            header
                .into_iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold)),
        );
    table
}

#[must_use]
pub fn images_table(images: &[ImageRecord]) -> Table {
    let mut table = table(vec!["Id", "Name", "Original", "Compressed", "Ratio", "Created"]);
    for i in images {
        table.add_row(vec![
            Cell::new(&i.id),
            Cell::new(&i.original_name),
            Cell::new(kilobytes(i.original_size)).set_alignment(CellAlignment::Right),
            Cell::new(kilobytes(i.compressed_size)).set_alignment(CellAlignment::Right),
            Cell::new(percent(i.compression_ratio)).set_alignment(CellAlignment::Right),
            Cell::new(i.created_at.format("%Y-%m-%d %H:%M:%S")),
        ]);
    }
    table
}

#[must_use]
pub fn summary_table(image: &UploadSummary) -> Table {
    let mut table = table(vec!["Property", "Value"]);
    table
        .add_row(vec![Cell::new("Id"), Cell::new(&image.id)])
        .add_row(vec![Cell::new("Name"), Cell::new(&image.original_name)])
        .add_row(vec![Cell::new("Original size"), Cell::new(kilobytes(image.original_size))])
        .add_row(vec![
            Cell::new("Compressed size"),
            Cell::new(kilobytes(image.compressed_size)),
        ])
        .add_row(vec![
            Cell::new("Compression ratio"),
            Cell::new(percent(image.compression_ratio)),
        ]);
    table
}

#[must_use]
pub fn analytics_table(analytics: &Analytics) -> Table {
    let mut table = table(vec!["Metric", "Value"]);
    table
        .add_row(vec![Cell::new("Total images"), Cell::new(analytics.total_images)])
        .add_row(vec![
            Cell::new("Total original size"),
            Cell::new(kilobytes(analytics.total_original_size)),
        ])
        .add_row(vec![
            Cell::new("Total compressed size"),
            Cell::new(kilobytes(analytics.total_compressed_size)),
        ])
        .add_row(vec![
            Cell::new("Total space saved"),
            Cell::new(signed_kilobytes(analytics.total_space_saved)),
        ])
        .add_row(vec![
            Cell::new("Average compression ratio"),
            Cell::new(percent(analytics.average_compression_ratio)),
        ]);
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, "0.00 KB")]
    #[case(1024, "1.00 KB")]
    #[case(1536, "1.50 KB")]
    #[case(100, "0.10 KB")]
    #[trace]
    fn kilobytes_format(#[case] bytes: u64, #[case] expected: &str) {
        assert_eq!(kilobytes(bytes), expected);
    }

    #[rstest]
    #[case(-2048, "-2.00 KB")]
    #[case(512, "0.50 KB")]
    #[trace]
    fn signed_kilobytes_format(#[case] bytes: i64, #[case] expected: &str) {
        assert_eq!(signed_kilobytes(bytes), expected);
    }

    #[rstest]
    #[case(0.0, "0.00%")]
    #[case(33.333, "33.33%")]
    #[case(-12.5, "-12.50%")]
    #[trace]
    fn percent_format(#[case] ratio: f64, #[case] expected: &str) {
        assert_eq!(percent(ratio), expected);
    }

    #[test]
    fn images_table_has_row_per_image() {
        // Arrange
        let image = ImageRecord {
            id: "id-1".to_owned(),
            original_name: "cat.png".to_owned(),
            original_size: 2048,
            compressed_size: 1024,
            original_path: String::new(),
            compressed_path: String::new(),
            compression_ratio: 50.0,
            created_at: chrono::Utc::now(),
        };

        // Act
        let table = images_table(&[image.clone(), image]);

        // Assert
        assert_eq!(table.row_iter().count(), 2);
        let rendered = table.to_string();
        assert!(rendered.contains("cat.png"));
        assert!(rendered.contains("50.00%"));
    }

    #[test]
    fn analytics_table_renders_all_metrics() {
        // Arrange
        let analytics = Analytics::new(2, 4096, 1024, 62.5);

        // Act
        let rendered = analytics_table(&analytics).to_string();

        // Assert
        assert!(rendered.contains("4.00 KB"));
        assert!(rendered.contains("3.00 KB"));
        assert!(rendered.contains("62.50%"));
    }
}
