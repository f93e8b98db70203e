use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

const COMPRESSED_DIR: &str = "compressed";

static LAST_STAMP: AtomicI64 = AtomicI64::new(0);

/// Filesystem root holding uploaded originals and their compressed copies.
///
/// ```text
/// <root>/<nanos>-<name>
/// <root>/compressed/<nanos>-compressed-<name>
/// ```
#[derive(Clone, Debug)]
pub struct ArtifactStore {
    root: PathBuf,
}

/// Pair of paths reserved for one upload.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub original: PathBuf,
    pub compressed: PathBuf,
}

impl ArtifactStore {
    #[must_use]
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the root and the compressed subdirectory. Idempotent.
    pub fn init(&self) -> io::Result<()> {
        std::fs::create_dir_all(self.root.join(COMPRESSED_DIR))
    }

    /// Builds unique locations for an upload named `original_name`.
    ///
    /// Only the final path component of the client supplied name is used.
    #[must_use]
    pub fn reserve(&self, original_name: &str) -> ArtifactPaths {
        let name = sanitize_name(original_name);
        let stamp = next_stamp();
        ArtifactPaths {
            original: self.root.join(format!("{stamp}-{name}")),
            compressed: self
                .root
                .join(COMPRESSED_DIR)
                .join(format!("{stamp}-compressed-{name}")),
        }
    }
}

impl ArtifactPaths {
    /// Best effort removal of whatever exists. Failures are logged only.
    pub async fn remove(&self) {
        for path in [&self.original, &self.compressed] {
            remove_artifact(path).await;
        }
    }
}

/// Removes a single artifact, ignoring the case when it was never written.
pub async fn remove_artifact(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::debug!("artifact {} removed", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::error!("Error cleaning up file {}: {e}", path.display()),
    }
}

/// Nanoseconds since the epoch, strictly increasing within the process.
fn next_stamp() -> i64 {
    let now = Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_else(|| Utc::now().timestamp_micros());
    let previous = LAST_STAMP
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or(now);
    now.max(previous + 1)
}

fn sanitize_name(name: &str) -> String {
    let last = match name.rfind(&['\\', '/']) {
        Some(ix) => &name[ix + 1..],
        None => name,
    };
    if last.is_empty() || last == "." || last == ".." {
        String::from("image")
    } else {
        last.to_owned()
    }
}
