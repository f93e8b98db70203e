use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::artifacts::ArtifactStore;
use crate::codec::{Codec, JpegCodec};
use crate::sqlite::{Mode, Sqlite};

/// Shared, immutable handler state.
#[derive(Clone)]
pub struct AppState {
    db: Arc<PathBuf>,
    artifacts: ArtifactStore,
    codec: Arc<dyn Codec>,
}

impl AppState {
    #[must_use]
    pub fn new(db: PathBuf, artifacts: ArtifactStore) -> Self {
        Self {
            db: Arc::new(db),
            artifacts,
            codec: Arc::new(JpegCodec::default()),
        }
    }

    /// Replaces the codec, e.g. to exercise codec failures.
    #[must_use]
    pub fn with_codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codec = codec;
        self
    }

    #[must_use]
    pub fn db(&self) -> &Path {
        self.db.as_path()
    }

    #[must_use]
    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    #[must_use]
    pub fn codec(&self) -> Arc<dyn Codec> {
        Arc::clone(&self.codec)
    }

    /// Opens a fresh connection and runs `action` on it.
    pub fn execute<F, R>(&self, mode: Mode, action: F) -> Result<R, rusqlite::Error>
    where
        F: FnOnce(&mut Sqlite) -> Result<R, rusqlite::Error>,
    {
        let start = Instant::now();
        let mut storage = Sqlite::open(self.db(), mode)?;
        let res = action(&mut storage);
        tracing::debug!("DB query time: {:?}", start.elapsed());
        res
    }
}
