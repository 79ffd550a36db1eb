use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::Result;

/// Temporary, locally addressable copy of downloaded bytes.
///
/// The backing file is removed by `release` or, on any other exit path,
/// when the value is dropped.
#[derive(Debug)]
pub struct StagedImage {
    file: NamedTempFile,
    len: usize,
}

impl StagedImage {
    pub fn stage(bytes: &[u8]) -> Result<Self> {
        Self::stage_in(&std::env::temp_dir(), bytes)
    }

    pub fn stage_in(dir: &Path, bytes: &[u8]) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("scanify-")
            .suffix(".blob")
            .tempfile_in(dir)?;
        file.write_all(bytes)?;
        file.flush()?;

        log::debug!("Staged {} bytes at {}", bytes.len(), file.path().display());
        Ok(Self {
            file,
            len: bytes.len(),
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Removes the backing file now. Returns the path it had.
    pub fn release(self) -> PathBuf {
        let path = self.file.path().to_path_buf();
        if let Err(e) = self.file.close() {
            log::warn!("Failed to remove staged file {}: {}", path.display(), e);
        }
        path
    }
}
