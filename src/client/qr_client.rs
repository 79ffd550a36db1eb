use crate::{
    client::traits::ImageFetcher,
    config::ScanifyConfig,
    error::{Result, ScanifyError},
    models::QrImage,
};
use async_trait::async_trait;
use reqwest::Client;

/// HTTP client for the QR image service.
#[derive(Clone)]
pub struct QrClient {
    client: Client,
}

impl QrClient {
    pub fn new(config: &ScanifyConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .user_agent(concat!("scanify/", env!("CARGO_PKG_VERSION")))
            .build()?;

        log::debug!("QR client ready for {}", config.endpoint);
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for QrClient {
    async fn fetch(&self, url: &str) -> Result<QrImage> {
        log::debug!("Fetching QR image: {}", url);

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScanifyError::ResponseError {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(String::from);

        let bytes = response.bytes().await?.to_vec();
        log::debug!("Received {} bytes ({:?})", bytes.len(), content_type);

        Ok(QrImage {
            url: url.to_string(),
            bytes,
            content_type,
        })
    }
}
