//! Per-job thumbnail snapshots.
//!
//! The encoder's snapshot tap overwrites one PNG per job; this module maps
//! job ids to those files and reads them back for the API.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Read access to the thumbnail directory.
#[derive(Debug, Clone)]
pub struct ThumbnailStore {
    dir: PathBuf,
}

impl ThumbnailStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Where the snapshot for `job_id` lives.
    pub fn path_for(&self, job_id: &str) -> PathBuf {
        self.dir.join(format!("{job_id}.png"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Latest snapshot bytes for a job; not found until the encoder has
    /// written the first frame.
    pub async fn read(&self, job_id: &str) -> Result<Vec<u8>> {
        let path = self.path_for(job_id);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::not_found("Thumbnail", job_id))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_back_a_written_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = ThumbnailStore::new(dir.path());

        tokio::fs::write(store.path_for("job-1"), b"png-bytes")
            .await
            .unwrap();

        let bytes = store.read("job-1").await.unwrap();
        assert_eq!(bytes, b"png-bytes");
    }

    #[tokio::test]
    async fn missing_snapshot_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = ThumbnailStore::new(dir.path());
        assert!(matches!(
            store.read("absent").await,
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn path_is_keyed_by_job_id() {
        let store = ThumbnailStore::new("/data/thumbnail");
        assert_eq!(
            store.path_for("abc"),
            PathBuf::from("/data/thumbnail/abc.png")
        );
    }
}
