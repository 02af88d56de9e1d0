//! Delivery of a finished archive

use super::unpack;
use crate::error::{ScaffoldError, ScaffoldResult};
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Hands the produced archive bytes to their destination
pub trait Delivery: Send + Sync {
    /// Deliver `bytes` as `file_name` (`<project>.zip`), returning where it went
    fn deliver(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> impl Future<Output = ScaffoldResult<PathBuf>> + Send;
}

/// Writes the zip into a directory
#[derive(Debug, Clone)]
pub struct DirectoryDelivery {
    dir: PathBuf,
}

impl DirectoryDelivery {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Delivery for DirectoryDelivery {
    async fn deliver(&self, file_name: &str, bytes: Vec<u8>) -> ScaffoldResult<PathBuf> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| ScaffoldError::Io {
                path: self.dir.clone(),
                source,
            })?;

        let path = self.dir.join(file_name);
        let dir = self.dir.clone();
        let target = path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&dir, &target, &bytes)).await??;
        Ok(path)
    }
}

/// Write through a temp file in `dir` and rename it over `target`.
/// On failure the temp file is removed and `target` keeps its old content.
fn write_atomic(dir: &Path, target: &Path, bytes: &[u8]) -> ScaffoldResult<()> {
    let io_err = |source| ScaffoldError::Io {
        path: target.to_path_buf(),
        source,
    };

    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(|source| ScaffoldError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    file.write_all(bytes).map_err(io_err)?;
    file.as_file().sync_all().map_err(io_err)?;
    file.persist(target).map_err(|e| io_err(e.error))?;
    Ok(())
}

/// Extracts the archive into a directory instead of saving the zip
#[derive(Debug, Clone)]
pub struct UnpackDelivery {
    dir: PathBuf,
}

impl UnpackDelivery {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Delivery for UnpackDelivery {
    async fn deliver(&self, file_name: &str, bytes: Vec<u8>) -> ScaffoldResult<PathBuf> {
        unpack(&bytes, &self.dir).await?;
        let root = Path::new(file_name).file_stem().unwrap_or_default();
        Ok(self.dir.join(root))
    }
}

/// Keeps delivered archives in memory
#[derive(Debug, Default)]
pub struct MemoryDelivery {
    delivered: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemoryDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything delivered so far, oldest first
    pub fn delivered(&self) -> Vec<(String, Vec<u8>)> {
        self.delivered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Delivery for MemoryDelivery {
    async fn deliver(&self, file_name: &str, bytes: Vec<u8>) -> ScaffoldResult<PathBuf> {
        self.delivered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((file_name.to_string(), bytes));
        Ok(PathBuf::from(file_name))
    }
}
