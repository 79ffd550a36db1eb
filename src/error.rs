use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanifyError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Response error: {status} from {url}")]
    ResponseError { status: u16, url: String },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Logger error: {0}")]
    LoggerError(String),
}

pub type Result<T> = std::result::Result<T, ScanifyError>;
