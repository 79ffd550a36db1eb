use crate::{error::Result, models::QrImage};
use async_trait::async_trait;

#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<QrImage>;
}
