use std::path::PathBuf;

use async_trait::async_trait;

use crate::{
    error::Result,
    storage::{staged::StagedImage, traits::ImageSink},
};

/// Saves into a fixed directory, overwriting a file of the same name.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ImageSink for DirectorySink {
    async fn save(&self, staged: &StagedImage, suggested_name: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let target = self.dir.join(suggested_name);
        tokio::fs::copy(staged.path(), &target).await?;

        log::info!("💾 Saved {} bytes to {}", staged.len(), target.display());
        Ok(target)
    }
}
