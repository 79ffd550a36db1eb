use std::env;
use std::path::PathBuf;

use crate::error::{Result, ScanifyError};
use crate::logger::LogLevel;

pub const DEFAULT_ENDPOINT: &str = "https://api.apgy.in/qr/";
pub const DEFAULT_TEXT: &str = "HelloWorld";
pub const DEFAULT_SIZE: i64 = 200;
pub const MIN_SIZE_HINT: i64 = 100;
pub const MAX_SIZE_HINT: i64 = 1000;

#[derive(Debug, Clone)]
pub struct ScanifyConfig {
    pub endpoint: String,
    pub default_text: String,
    pub default_size: i64,
    pub output_dir: PathBuf,
    pub file_prefix: String,
    pub file_extension: String,
    /// Characters of the current text kept in the suggested filename.
    pub filename_chars: usize,
    pub log_level: Option<LogLevel>,
}

impl Default for ScanifyConfig {
    fn default() -> Self {
        ScanifyConfig {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            default_text: DEFAULT_TEXT.to_string(),
            default_size: DEFAULT_SIZE,
            output_dir: PathBuf::from("."),
            file_prefix: "qrcode-".to_string(),
            file_extension: "png".to_string(),
            filename_chars: 20,
            log_level: None,
        }
    }
}

impl ScanifyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `SCANIFY_*` variables that are present.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(endpoint) = env::var("SCANIFY_ENDPOINT") {
            config.endpoint = endpoint;
        }
        if let Ok(dir) = env::var("SCANIFY_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        if let Ok(text) = env::var("SCANIFY_DEFAULT_TEXT") {
            config.default_text = text;
        }
        config.log_level = env::var("SCANIFY_LOG_LEVEL")
            .ok()
            .and_then(|level| LogLevel::parse(&level));

        config
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_default_text(mut self, text: impl Into<String>) -> Self {
        self.default_text = text.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(ScanifyError::ConfigError("endpoint must not be empty".into()));
        }
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(ScanifyError::ConfigError(format!(
                "endpoint must be an http(s) URL, got {}",
                self.endpoint
            )));
        }
        if self.file_extension.is_empty() {
            return Err(ScanifyError::ConfigError(
                "file extension must not be empty".into(),
            ));
        }
        Ok(())
    }
}
