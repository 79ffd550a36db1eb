//! Application state: the form fields, the displayed request URL and the
//! theme, plus the download flow that reads them.
//!
//! Every user action goes through [`AppState::update`]. Generating copies
//! the current text and size into a request URL; editing the fields later
//! does not touch that URL until the next generate.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;

use crate::{
    client::ImageFetcher,
    config::{ScanifyConfig, MAX_SIZE_HINT, MIN_SIZE_HINT},
    error::ScanifyError,
    logger::{self, LogEntry, LogLevel},
    models::{is_advertised_size, normalize_size, DocumentRoot, QrImage, QrRequest, Theme},
    storage::{self, ImageSink},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Replaces the text field.
    SetText(String),
    /// Raw contents of the size field.
    SetSize(String),
    /// Key pressed while the text field has focus.
    KeyDown(Key),
    Generate,
    ToggleTheme,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewState {
    Empty,
    Ready,
}

impl PreviewState {
    pub fn description(&self) -> &'static str {
        match self {
            PreviewState::Empty => "Generate a QR code to see it here",
            PreviewState::Ready => "Click download to save the QR code",
        }
    }

    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            PreviewState::Empty => Some("No QR code generated yet"),
            PreviewState::Ready => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DownloadOutcome {
    /// Nothing displayed, no request made.
    Skipped,
    Saved { path: PathBuf },
    /// Already logged; kept for callers that report machine-readable output.
    Failed { reason: String },
}

/// Snapshot taken when a download is triggered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    pub url: String,
    pub filename: String,
}

impl DownloadJob {
    /// Fetch, stage, save, release. Errors end up in the log only.
    pub async fn run(self, fetcher: &dyn ImageFetcher, sink: &dyn ImageSink) -> DownloadOutcome {
        let _timer = logger::timer(&format!("download {}", self.filename));

        let image = match fetcher.fetch(&self.url).await {
            Ok(image) => image,
            Err(e) => return self.failed(&e),
        };

        match storage::save_image(&image, sink, &self.filename).await {
            Ok(path) => DownloadOutcome::Saved { path },
            Err(e) => self.failed(&e),
        }
    }

    fn failed(&self, error: &ScanifyError) -> DownloadOutcome {
        logger::log_entry(self.failure_entry(error));
        DownloadOutcome::Failed {
            reason: error.to_string(),
        }
    }

    fn failure_entry(&self, error: &ScanifyError) -> LogEntry {
        LogEntry::new(
            LogLevel::Error,
            format!("Failed to download QR code: {}", error),
            module_path!().to_string(),
            file!().to_string(),
            line!(),
        )
        .with_context("url", serde_json::json!(self.url))
        .with_context("filename", serde_json::json!(self.filename))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub text: String,
    pub size: i64,
    pub url: Option<String>,
    pub theme: Theme,
    pub preview: PreviewState,
}

#[derive(Debug, Clone)]
pub struct AppState {
    config: ScanifyConfig,
    text: String,
    size: i64,
    url: Option<String>,
    theme: Theme,
    root: DocumentRoot,
}

impl AppState {
    pub fn new(config: ScanifyConfig) -> Self {
        let mut root = DocumentRoot::new();
        root.apply_theme(Theme::default());

        Self {
            text: config.default_text.clone(),
            size: config.default_size,
            url: None,
            theme: Theme::default(),
            root,
            config,
        }
    }

    pub fn update(&mut self, action: Action) {
        match action {
            Action::SetText(text) => self.text = text,
            Action::SetSize(raw) => {
                self.size = normalize_size(&raw);
                if !is_advertised_size(self.size) {
                    log::warn!(
                        "Size {}px is outside the {}-{}px range; sending it anyway",
                        self.size,
                        MIN_SIZE_HINT,
                        MAX_SIZE_HINT
                    );
                }
            }
            Action::KeyDown(Key::Enter) | Action::Generate => {
                self.generate();
            }
            Action::KeyDown(Key::Other) => {}
            Action::ToggleTheme => self.toggle_theme(),
        }
    }

    /// Rebuilds the displayed URL from the current fields. Returns false and
    /// leaves the URL alone when the text is blank.
    pub fn generate(&mut self) -> bool {
        let request = QrRequest::new(self.text.clone(), self.size);
        if request.is_blank() {
            log::debug!("Skipping generate: text is empty");
            return false;
        }

        let url = request.to_url(&self.config.endpoint);
        log::info!("🔄 Generated QR request URL: {}", url);
        self.url = Some(url);
        true
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        self.root.apply_theme(self.theme);
        log::debug!("Theme switched to {}", self.theme);
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn size(&self) -> i64 {
        self.size
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn document_root(&self) -> &DocumentRoot {
        &self.root
    }

    pub fn config(&self) -> &ScanifyConfig {
        &self.config
    }

    pub fn preview_state(&self) -> PreviewState {
        match self.url() {
            Some(url) if !url.is_empty() => PreviewState::Ready,
            _ => PreviewState::Empty,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            text: self.text.clone(),
            size: self.size,
            url: self.url.clone(),
            theme: self.theme,
            preview: self.preview_state(),
        }
    }

    /// The displayed URL plus a file name built from the text as it is now,
    /// which may differ from the text the URL was generated from.
    pub fn download_job(&self) -> Option<DownloadJob> {
        let url = self.url.as_ref().filter(|url| !url.is_empty())?;
        Some(DownloadJob {
            url: url.clone(),
            filename: storage::suggested_filename(
                &self.config.file_prefix,
                &self.text,
                self.config.filename_chars,
                &self.config.file_extension,
            ),
        })
    }

    pub async fn download(
        &self,
        fetcher: &dyn ImageFetcher,
        sink: &dyn ImageSink,
    ) -> DownloadOutcome {
        match self.download_job() {
            Some(job) => job.run(fetcher, sink).await,
            None => DownloadOutcome::Skipped,
        }
    }

    /// Runs the download on its own task. Overlapping calls are not guarded
    /// against; each gets its own job and staged file.
    pub fn spawn_download(
        &self,
        fetcher: Arc<dyn ImageFetcher>,
        sink: Arc<dyn ImageSink>,
    ) -> Option<JoinHandle<DownloadOutcome>> {
        let job = self.download_job()?;
        Some(tokio::spawn(async move {
            job.run(fetcher.as_ref(), sink.as_ref()).await
        }))
    }

    /// Fetches the displayed image once for inline rendering. Failures are
    /// logged and yield `None`.
    pub async fn fetch_preview(&self, fetcher: &dyn ImageFetcher) -> Option<QrImage> {
        let url = self.url.as_deref().filter(|url| !url.is_empty())?;
        match fetcher.fetch(url).await {
            Ok(image) => Some(image),
            Err(e) => {
                log::error!("Failed to load QR preview: {}", e);
                None
            }
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ScanifyConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::models::DARK_MARKER;
    use crate::storage::StagedImage;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeFetcher {
        calls: AtomicUsize,
        fail_with: Option<u16>,
    }

    #[async_trait]
    impl ImageFetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<QrImage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(status) = self.fail_with {
                return Err(ScanifyError::ResponseError {
                    status,
                    url: url.to_string(),
                });
            }
            Ok(QrImage {
                url: url.to_string(),
                bytes: b"\x89PNG".to_vec(),
                content_type: Some("image/png".into()),
            })
        }
    }

    #[derive(Default)]
    struct MemorySink {
        saved: Mutex<Vec<(String, Vec<u8>)>>,
    }

    #[async_trait]
    impl ImageSink for MemorySink {
        async fn save(&self, staged: &StagedImage, suggested_name: &str) -> Result<PathBuf> {
            let bytes = std::fs::read(staged.path())?;
            self.saved
                .lock()
                .unwrap()
                .push((suggested_name.to_string(), bytes));
            Ok(PathBuf::from(suggested_name))
        }
    }

    #[test]
    fn test_defaults_generate_expected_url() {
        let mut app = AppState::default();
        assert_eq!(app.preview_state(), PreviewState::Empty);

        app.update(Action::Generate);
        assert_eq!(
            app.url(),
            Some("https://api.apgy.in/qr/?data=HelloWorld&size=200")
        );
        assert_eq!(app.preview_state(), PreviewState::Ready);
    }

    #[test]
    fn test_enter_key_generates() {
        let mut app = AppState::default();
        app.update(Action::KeyDown(Key::Other));
        assert_eq!(app.url(), None);

        app.update(Action::KeyDown(Key::Enter));
        assert!(app.url().is_some());
    }

    #[test]
    fn test_blank_text_keeps_previous_url() {
        let mut app = AppState::default();
        app.update(Action::Generate);
        let before = app.url().map(String::from);

        app.update(Action::SetText("   ".into()));
        app.update(Action::Generate);
        assert_eq!(app.url().map(String::from), before);

        app.update(Action::SetText(String::new()));
        assert!(!app.generate());
        assert_eq!(app.url().map(String::from), before);
    }

    #[test]
    fn test_blank_text_from_scratch_displays_nothing() {
        let mut app = AppState::default();
        app.update(Action::SetText("\t".into()));
        app.update(Action::Generate);
        assert_eq!(app.url(), None);
    }

    #[test]
    fn test_non_numeric_size_generates_default() {
        let mut app = AppState::default();
        app.update(Action::SetSize("500".into()));
        app.update(Action::SetSize("big".into()));
        app.update(Action::Generate);
        assert!(app.url().unwrap().ends_with("&size=200"));
    }

    #[test]
    fn test_text_and_size_land_in_url() {
        let mut app = AppState::default();
        app.update(Action::SetText("a b".into()));
        app.update(Action::SetSize("500".into()));
        app.update(Action::Generate);
        assert_eq!(
            app.url(),
            Some("https://api.apgy.in/qr/?data=a%20b&size=500")
        );
    }

    #[test]
    fn test_url_is_stale_until_regenerated() {
        let mut app = AppState::default();
        app.update(Action::Generate);
        app.update(Action::SetText("changed".into()));
        app.update(Action::SetSize("900".into()));
        assert_eq!(
            app.url(),
            Some("https://api.apgy.in/qr/?data=HelloWorld&size=200")
        );

        app.update(Action::Generate);
        assert_eq!(
            app.url(),
            Some("https://api.apgy.in/qr/?data=changed&size=900")
        );
    }

    #[test]
    fn test_theme_toggle_twice_restores_marker() {
        let mut app = AppState::default();
        let initial = app.document_root().has_marker(DARK_MARKER);
        assert!(!initial);

        app.update(Action::ToggleTheme);
        assert_eq!(app.theme(), Theme::Dark);
        assert!(app.document_root().has_marker(DARK_MARKER));

        app.update(Action::ToggleTheme);
        assert_eq!(app.theme(), Theme::Light);
        assert_eq!(app.document_root().has_marker(DARK_MARKER), initial);
    }

    #[test]
    fn test_preview_texts() {
        assert_eq!(
            PreviewState::Empty.description(),
            "Generate a QR code to see it here"
        );
        assert_eq!(
            PreviewState::Ready.description(),
            "Click download to save the QR code"
        );
        assert_eq!(PreviewState::Ready.placeholder(), None);
    }

    #[tokio::test]
    async fn test_download_without_url_makes_no_request() {
        let app = AppState::default();
        let fetcher = FakeFetcher::default();
        let sink = MemorySink::default();

        let outcome = app.download(&fetcher, &sink).await;
        assert_eq!(outcome, DownloadOutcome::Skipped);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
        assert!(sink.saved.lock().unwrap().is_empty());
        assert!(app.spawn_download(Arc::new(fetcher), Arc::new(sink)).is_none());
    }

    #[tokio::test]
    async fn test_download_uses_first_twenty_chars() {
        let mut app = AppState::default();
        app.update(Action::SetText("ThisIsAVeryLongStringOverTwentyChars".into()));
        app.update(Action::Generate);

        let fetcher = FakeFetcher::default();
        let sink = MemorySink::default();
        let outcome = app.download(&fetcher, &sink).await;

        assert_eq!(
            outcome,
            DownloadOutcome::Saved {
                path: PathBuf::from("qrcode-ThisIsAVeryLongStrin.png")
            }
        );
        let saved = sink.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].1, b"\x89PNG");
    }

    #[tokio::test]
    async fn test_download_names_file_after_current_text() {
        let mut app = AppState::default();
        app.update(Action::Generate);
        app.update(Action::SetText("edited".into()));

        let job = app.download_job().unwrap();
        assert_eq!(job.url, "https://api.apgy.in/qr/?data=HelloWorld&size=200");
        assert_eq!(job.filename, "qrcode-edited.png");
    }

    #[tokio::test]
    async fn test_failed_fetch_is_swallowed() {
        let mut app = AppState::default();
        app.update(Action::Generate);
        let before = app.snapshot();

        let fetcher = FakeFetcher {
            fail_with: Some(502),
            ..Default::default()
        };
        let sink = MemorySink::default();
        let outcome = app.download(&fetcher, &sink).await;

        assert!(matches!(outcome, DownloadOutcome::Failed { .. }));
        assert!(sink.saved.lock().unwrap().is_empty());
        assert_eq!(app.url(), before.url.as_deref());
        assert!(app.fetch_preview(&fetcher).await.is_none());
    }

    #[test]
    fn test_failure_entry_names_url_and_file() {
        let job = DownloadJob {
            url: "https://api.apgy.in/qr/?data=x&size=200".into(),
            filename: "qrcode-x.png".into(),
        };
        let error = ScanifyError::ResponseError {
            status: 404,
            url: job.url.clone(),
        };

        let entry = job.failure_entry(&error);
        assert_eq!(entry.level, LogLevel::Error);
        assert_eq!(entry.module, "scanify::app");
        assert!(entry.message.starts_with("Failed to download QR code"));
        assert_eq!(entry.context["url"], serde_json::json!(job.url));
        assert_eq!(entry.context["filename"], serde_json::json!("qrcode-x.png"));
    }

    #[tokio::test]
    async fn test_overlapping_downloads_both_complete() {
        let mut app = AppState::default();
        app.update(Action::Generate);

        let fetcher: Arc<FakeFetcher> = Arc::new(FakeFetcher::default());
        let sink: Arc<MemorySink> = Arc::new(MemorySink::default());

        let first = app.spawn_download(fetcher.clone(), sink.clone()).unwrap();
        let second = app.spawn_download(fetcher.clone(), sink.clone()).unwrap();
        let outcomes = futures::future::join_all(vec![first, second]).await;

        for outcome in outcomes {
            assert!(matches!(outcome.unwrap(), DownloadOutcome::Saved { .. }));
        }
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        assert_eq!(sink.saved.lock().unwrap().len(), 2);
    }
}
