//! Scanify: a client for a remote QR-code image service.
//!
//! Text and a pixel size go into a request URL, the service renders the
//! image, and the download flow saves it to disk through a temporary
//! staged copy.
//!
//! ```no_run
//! use scanify::{Action, AppState, DirectorySink, QrClient, ScanifyConfig};
//!
//! #[tokio::main]
//! async fn main() -> scanify::Result<()> {
//!     let config = ScanifyConfig::from_env();
//!     let client = QrClient::new(&config)?;
//!     let sink = DirectorySink::new(config.output_dir.clone());
//!
//!     let mut app = AppState::new(config);
//!     app.update(Action::SetText("https://example.com".into()));
//!     app.update(Action::Generate);
//!     app.download(&client, &sink).await;
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod client;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod shell;
pub mod storage;

pub use app::{Action, AppState, DownloadJob, DownloadOutcome, Key, PreviewState, Snapshot};
pub use client::{ImageFetcher, QrClient};
pub use config::ScanifyConfig;
pub use error::{Result, ScanifyError};
pub use models::{is_advertised_size, normalize_size, DocumentRoot, QrImage, QrRequest, Theme};
pub use shell::{parse_line, DownloadHook, Shell, ShellCommand};
pub use storage::{suggested_filename, DirectorySink, ImageSink, StagedImage};
