use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

const DB_FILE: &str = "imgpress.db";
const CURRENT_DIR: &str = "./";
const UPLOADS_DIR: &str = "uploads";
const DEFAULT_PORT: &str = "5000";

/// Process configuration, read once during bootstrap.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// SQLite file holding image metadata
    pub database: PathBuf,
    /// Root for uploaded and compressed files
    pub uploads: PathBuf,
}

impl Config {
    /// Reads `IMGPRESS_*` variables, loading `.env` first when present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let dir = env::var("IMGPRESS_DATA_DIR").unwrap_or_else(|_| String::from(CURRENT_DIR));
        let db_file = env::var("IMGPRESS_DATA_FILE").unwrap_or_else(|_| String::from(DB_FILE));
        let uploads =
            env::var("IMGPRESS_UPLOADS_DIR").unwrap_or_else(|_| String::from(UPLOADS_DIR));
        let port = env::var("IMGPRESS_PORT").unwrap_or_else(|_| String::from(DEFAULT_PORT));

        Self::build(&port, &dir, &db_file, &uploads)
    }

    fn build(port: &str, dir: &str, db_file: &str, uploads: &str) -> Result<Self> {
        let port = port
            .parse()
            .with_context(|| format!("invalid port '{port}'"))?;
        Ok(Self {
            port,
            database: PathBuf::from(dir).join(db_file),
            uploads: PathBuf::from(uploads),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn build_defaults() {
        // Act
        let config = Config::build(DEFAULT_PORT, CURRENT_DIR, DB_FILE, UPLOADS_DIR).unwrap();

        // Assert
        assert_eq!(config.port, 5000);
        assert_eq!(config.database, PathBuf::from("./imgpress.db"));
        assert_eq!(config.uploads, PathBuf::from("uploads"));
    }

    #[rstest]
    #[case("")]
    #[case("port")]
    #[case("70000")]
    #[case("-1")]
    #[trace]
    fn build_invalid_port(#[case] port: &str) {
        // Act
        let result = Config::build(port, CURRENT_DIR, DB_FILE, UPLOADS_DIR);

        // Assert
        assert!(result.is_err());
    }
}
