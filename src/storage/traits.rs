use crate::{error::Result, storage::staged::StagedImage};
use async_trait::async_trait;
use std::path::PathBuf;

/// Destination for a staged image: the "save as" step of a download.
#[async_trait]
pub trait ImageSink: Send + Sync {
    /// Saves the staged bytes under `suggested_name` and returns where they
    /// landed. The staged resource stays owned by the caller.
    async fn save(&self, staged: &StagedImage, suggested_name: &str) -> Result<PathBuf>;
}
