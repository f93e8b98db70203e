use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use kernel::{Analytics, ImageRecord};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Error, OpenFlags, OptionalExtension, Row};

use crate::domain::{NewImage, Storage};

const CACHE_SIZE: &str = "4096";
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SELECT_IMAGE: &str = "SELECT id, original_name, original_size, compressed_size,
        original_path, compressed_path, compression_ratio, created_at
        FROM image";

pub enum Mode {
    ReadWrite,
    ReadOnly,
}

pub struct Sqlite {
    conn: Connection,
}

impl Storage for Sqlite {
    type Err = Error;

    fn new_database(&self) -> Result<(), Self::Err> {
        self.pragma_update("encoding", "UTF-8")?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS image (
                  seq               INTEGER PRIMARY KEY AUTOINCREMENT,
                  id                TEXT NOT NULL UNIQUE,
                  original_name     TEXT NOT NULL,
                  original_size     INTEGER NOT NULL,
                  compressed_size   INTEGER NOT NULL,
                  original_path     TEXT NOT NULL,
                  compressed_path   TEXT NOT NULL,
                  compression_ratio REAL NOT NULL,
                  created_at        TEXT NOT NULL
                  )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS image_created_at_ix ON image(created_at DESC)",
            [],
        )?;

        Ok(())
    }

    fn insert_image(&mut self, image: NewImage) -> Result<ImageRecord, Self::Err> {
        self.assign_cache_size()?;
        self.pragma_update("synchronous", "FULL")?;

        let record = image.into_record(uuid::Uuid::new_v4().to_string(), Utc::now());

        self.conn
            .prepare_cached(
                "INSERT INTO image (id, original_name, original_size, compressed_size,
                     original_path, compressed_path, compression_ratio, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?
            .execute(params![
                &record.id,
                &record.original_name,
                to_sql_size(record.original_size)?,
                to_sql_size(record.compressed_size)?,
                &record.original_path,
                &record.compressed_path,
                record.compression_ratio,
                record.created_at,
            ])?;

        Ok(record)
    }

    fn get_images(&mut self) -> Result<Vec<ImageRecord>, Self::Err> {
        self.assign_cache_size()?;
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{SELECT_IMAGE} ORDER BY created_at DESC, seq DESC"))?;
        let rows = stmt.query_map([], read_image)?;
        rows.collect()
    }

    fn get_image(&mut self, id: &str) -> Result<Option<ImageRecord>, Self::Err> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{SELECT_IMAGE} WHERE id = ?1"))?;
        stmt.query_row(params![id], read_image).optional()
    }

    fn get_analytics(&mut self) -> Result<Analytics, Self::Err> {
        // mean of stored per-image ratios, not ratio of the sums
        self.conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(original_size), 0),
                    COALESCE(SUM(compressed_size), 0),
                    COALESCE(AVG(compression_ratio), 0.0)
             FROM image",
            [],
            |row| {
                Ok(Analytics::new(
                    from_sql_size(row, 0)?,
                    from_sql_size(row, 1)?,
                    from_sql_size(row, 2)?,
                    row.get(3)?,
                ))
            },
        )
    }
}

impl Sqlite {
    pub fn open<P: AsRef<Path>>(path: P, mode: Mode) -> Result<Self, Error> {
        let c = match mode {
            Mode::ReadWrite => Connection::open(path),
            Mode::ReadOnly => Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY),
        }?;
        c.busy_timeout(BUSY_TIMEOUT)?;
        Ok(Self { conn: c })
    }

    fn assign_cache_size(&self) -> Result<(), Error> {
        self.pragma_update("cache_size", CACHE_SIZE)
    }

    fn pragma_update(&self, name: &str, value: &str) -> Result<(), Error> {
        self.conn.pragma_update(None, name, value)
    }
}

fn read_image(row: &Row<'_>) -> Result<ImageRecord, Error> {
    let created_at: DateTime<Utc> = row.get(7)?;
    Ok(ImageRecord {
        id: row.get(0)?,
        original_name: row.get(1)?,
        original_size: from_sql_size(row, 2)?,
        compressed_size: from_sql_size(row, 3)?,
        original_path: row.get(4)?,
        compressed_path: row.get(5)?,
        compression_ratio: row.get(6)?,
        created_at,
    })
}

fn to_sql_size(size: u64) -> Result<i64, Error> {
    i64::try_from(size).map_err(|e| Error::ToSqlConversionFailure(Box::new(e)))
}

fn from_sql_size(row: &Row<'_>, ix: usize) -> Result<u64, Error> {
    let value: i64 = row.get(ix)?;
    u64::try_from(value).map_err(|e| Error::FromSqlConversionFailure(ix, Type::Integer, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn storage() -> Sqlite {
        let s = Sqlite {
            conn: Connection::open_in_memory().unwrap(),
        };
        s.new_database().unwrap();
        s
    }

    fn new_image(name: &str, original_size: u64, compressed_size: u64) -> NewImage {
        NewImage {
            original_name: name.to_owned(),
            original_size,
            compressed_size,
            original_path: format!("uploads/1-{name}"),
            compressed_path: format!("uploads/compressed/1-compressed-{name}"),
        }
    }

    #[rstest]
    fn new_database_is_idempotent(storage: Sqlite) {
        // Act
        let result = storage.new_database();

        // Assert
        assert!(result.is_ok());
    }

    #[rstest]
    fn insert_then_get(mut storage: Sqlite) {
        // Arrange
        let inserted = storage.insert_image(new_image("a.png", 200, 50)).unwrap();

        // Act
        let found = storage.get_image(&inserted.id).unwrap();

        // Assert
        let found = found.unwrap();
        assert_eq!(found.id, inserted.id);
        assert_eq!(found.original_name, "a.png");
        assert_eq!(found.original_size, 200);
        assert_eq!(found.compressed_size, 50);
        assert_eq!(found.compressed_path, "uploads/compressed/1-compressed-a.png");
        assert!((found.compression_ratio - 75.0).abs() < 1e-9);
        assert_eq!(found.created_at, inserted.created_at);
    }

    #[rstest]
    fn get_unknown_is_none(mut storage: Sqlite) {
        // Act
        let found = storage.get_image("missing").unwrap();

        // Assert
        assert!(found.is_none());
    }

    #[rstest]
    fn images_are_listed_newest_first(mut storage: Sqlite) {
        // Arrange
        let first = storage.insert_image(new_image("1.png", 10, 5)).unwrap();
        let second = storage.insert_image(new_image("2.png", 10, 5)).unwrap();
        let third = storage.insert_image(new_image("3.png", 10, 5)).unwrap();

        // Act
        let images = storage.get_images().unwrap();

        // Assert
        let ids: Vec<&str> = images.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec![third.id.as_str(), second.id.as_str(), first.id.as_str()]);
        assert!(images.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }

    #[rstest]
    fn listing_is_idempotent(mut storage: Sqlite) {
        // Arrange
        storage.insert_image(new_image("1.png", 10, 5)).unwrap();
        storage.insert_image(new_image("2.png", 10, 5)).unwrap();

        // Act
        let a = storage.get_images().unwrap();
        let b = storage.get_images().unwrap();

        // Assert
        assert_eq!(a, b);
    }

    #[rstest]
    fn analytics_on_empty_store(mut storage: Sqlite) {
        // Act
        let analytics = storage.get_analytics().unwrap();

        // Assert
        assert_eq!(analytics, Analytics::default());
    }

    #[rstest]
    fn analytics_uses_mean_of_ratios(mut storage: Sqlite) {
        // Arrange
        storage.insert_image(new_image("a.png", 100, 50)).unwrap();
        storage.insert_image(new_image("b.png", 1000, 900)).unwrap();

        // Act
        let analytics = storage.get_analytics().unwrap();

        // Assert
        assert_eq!(analytics.total_images, 2);
        assert_eq!(analytics.total_original_size, 1100);
        assert_eq!(analytics.total_compressed_size, 950);
        assert_eq!(analytics.total_space_saved, 150);
        assert!((analytics.average_compression_ratio - 30.0).abs() < 1e-9);
        assert_eq!(analytics, Analytics::from_records(&storage.get_images().unwrap()));
    }
}
