//! Line-driven front end over [`AppState`].
//!
//! A plain line is typed into the text field followed by Enter; lines
//! starting with `:` are commands. Downloads run on their own tasks and are
//! collected by [`Shell::finish`].

use std::sync::Arc;

use futures::future::join_all;
use tokio::task::JoinHandle;

use crate::{
    app::{Action, AppState, DownloadOutcome, Key},
    client::ImageFetcher,
    storage::ImageSink,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// A line without a leading `:`. `None` for an empty line.
    Submit(Option<String>),
    Text(String),
    Size(String),
    Generate,
    Download,
    Preview,
    Theme,
    Status,
    Help,
    Quit,
    Unknown(String),
}

pub fn parse_line(line: &str) -> ShellCommand {
    let Some(rest) = line.strip_prefix(':') else {
        return if line.is_empty() {
            ShellCommand::Submit(None)
        } else {
            ShellCommand::Submit(Some(line.to_string()))
        };
    };

    let (name, argument) = rest.split_once(' ').unwrap_or((rest, ""));
    match name {
        "text" => ShellCommand::Text(argument.to_string()),
        "size" => ShellCommand::Size(argument.to_string()),
        "generate" => ShellCommand::Generate,
        "download" => ShellCommand::Download,
        "preview" => ShellCommand::Preview,
        "theme" => ShellCommand::Theme,
        "status" => ShellCommand::Status,
        "help" => ShellCommand::Help,
        "quit" | "q" | "exit" => ShellCommand::Quit,
        other => ShellCommand::Unknown(other.to_string()),
    }
}

impl ShellCommand {
    /// State changes the command makes, in order.
    pub fn actions(&self) -> Vec<Action> {
        match self {
            ShellCommand::Submit(Some(text)) => {
                vec![Action::SetText(text.clone()), Action::KeyDown(Key::Enter)]
            }
            ShellCommand::Submit(None) => vec![Action::KeyDown(Key::Enter)],
            ShellCommand::Text(text) => vec![Action::SetText(text.clone())],
            ShellCommand::Size(raw) => vec![Action::SetSize(raw.clone())],
            ShellCommand::Generate => vec![Action::Generate],
            ShellCommand::Theme => vec![Action::ToggleTheme],
            _ => Vec::new(),
        }
    }
}

/// Called with each download's outcome as soon as it finishes.
pub type DownloadHook = Arc<dyn Fn(&DownloadOutcome) + Send + Sync>;

pub struct Shell {
    app: AppState,
    fetcher: Arc<dyn ImageFetcher>,
    sink: Arc<dyn ImageSink>,
    on_download: Option<DownloadHook>,
    downloads: Vec<JoinHandle<DownloadOutcome>>,
}

impl Shell {
    pub fn new(app: AppState, fetcher: Arc<dyn ImageFetcher>, sink: Arc<dyn ImageSink>) -> Self {
        Self {
            app,
            fetcher,
            sink,
            on_download: None,
            downloads: Vec::new(),
        }
    }

    pub fn with_download_hook(mut self, hook: DownloadHook) -> Self {
        self.on_download = Some(hook);
        self
    }

    pub fn app(&self) -> &AppState {
        &self.app
    }

    pub fn pending_downloads(&self) -> usize {
        self.downloads.iter().filter(|d| !d.is_finished()).count()
    }

    /// Applies the command's actions; `:download` starts a download without
    /// waiting for it. Output is left to the caller.
    pub fn apply(&mut self, command: &ShellCommand) {
        for action in command.actions() {
            self.app.update(action);
        }
        if *command == ShellCommand::Download {
            self.start_download();
        }
    }

    fn start_download(&mut self) -> bool {
        let Some(handle) = self
            .app
            .spawn_download(self.fetcher.clone(), self.sink.clone())
        else {
            log::debug!("Nothing to download yet");
            return false;
        };

        let hook = self.on_download.clone();
        self.downloads.push(tokio::spawn(async move {
            let outcome = handle.await.unwrap_or_else(|e| DownloadOutcome::Failed {
                reason: format!("download task failed: {}", e),
            });
            if let Some(hook) = hook {
                hook(&outcome);
            }
            outcome
        }));
        true
    }

    /// Waits for every download started so far, including ones still
    /// running when the user quits.
    pub async fn finish(self) -> Vec<DownloadOutcome> {
        join_all(self.downloads)
            .await
            .into_iter()
            .filter_map(|joined| match joined {
                Ok(outcome) => Some(outcome),
                Err(e) => {
                    log::error!("Download task failed: {}", e);
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::models::{QrImage, Theme};
    use crate::storage::StagedImage;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    struct SlowFetcher {
        delay: Duration,
    }

    #[async_trait]
    impl ImageFetcher for SlowFetcher {
        async fn fetch(&self, url: &str) -> Result<QrImage> {
            tokio::time::sleep(self.delay).await;
            Ok(QrImage {
                url: url.to_string(),
                bytes: b"png".to_vec(),
                content_type: None,
            })
        }
    }

    #[derive(Default)]
    struct MemorySink {
        saved: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ImageSink for MemorySink {
        async fn save(&self, _staged: &StagedImage, suggested_name: &str) -> Result<PathBuf> {
            self.saved.lock().unwrap().push(suggested_name.to_string());
            Ok(PathBuf::from(suggested_name))
        }
    }

    fn shell(delay: Duration) -> (Shell, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::default());
        let shell = Shell::new(
            AppState::default(),
            Arc::new(SlowFetcher { delay }),
            sink.clone(),
        );
        (shell, sink)
    }

    #[test]
    fn test_parse_plain_lines() {
        assert_eq!(
            parse_line("hello world"),
            ShellCommand::Submit(Some("hello world".into()))
        );
        assert_eq!(parse_line(""), ShellCommand::Submit(None));
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_line(":text a b"), ShellCommand::Text("a b".into()));
        assert_eq!(parse_line(":text"), ShellCommand::Text(String::new()));
        assert_eq!(parse_line(":size 300"), ShellCommand::Size("300".into()));
        assert_eq!(parse_line(":generate"), ShellCommand::Generate);
        assert_eq!(parse_line(":download"), ShellCommand::Download);
        assert_eq!(parse_line(":preview"), ShellCommand::Preview);
        assert_eq!(parse_line(":theme"), ShellCommand::Theme);
        assert_eq!(parse_line(":status"), ShellCommand::Status);
        assert_eq!(parse_line(":help"), ShellCommand::Help);
        assert_eq!(parse_line(":quit"), ShellCommand::Quit);
        assert_eq!(parse_line(":q"), ShellCommand::Quit);
    }

    #[test]
    fn test_unknown_command_is_reported() {
        assert_eq!(parse_line(":frobnicate x"), ShellCommand::Unknown("frobnicate".into()));
        assert_eq!(parse_line(":"), ShellCommand::Unknown(String::new()));
        assert!(ShellCommand::Unknown("x".into()).actions().is_empty());
    }

    #[test]
    fn test_command_actions() {
        assert_eq!(
            parse_line("hi").actions(),
            vec![Action::SetText("hi".into()), Action::KeyDown(Key::Enter)]
        );
        assert_eq!(parse_line("").actions(), vec![Action::KeyDown(Key::Enter)]);
        assert_eq!(parse_line(":text hi").actions(), vec![Action::SetText("hi".into())]);
        assert_eq!(parse_line(":theme").actions(), vec![Action::ToggleTheme]);
        assert!(parse_line(":download").actions().is_empty());
    }

    #[tokio::test]
    async fn test_plain_line_sets_text_and_generates() {
        let (mut shell, _) = shell(Duration::ZERO);
        shell.apply(&parse_line("a b"));
        assert_eq!(shell.app().text(), "a b");
        assert_eq!(
            shell.app().url(),
            Some("https://api.apgy.in/qr/?data=a%20b&size=200")
        );
    }

    #[tokio::test]
    async fn test_empty_line_generates_current_text() {
        let (mut shell, _) = shell(Duration::ZERO);
        assert_eq!(shell.app().url(), None);

        shell.apply(&parse_line(""));
        assert_eq!(
            shell.app().url(),
            Some("https://api.apgy.in/qr/?data=HelloWorld&size=200")
        );
    }

    #[tokio::test]
    async fn test_text_command_edits_without_generating() {
        let (mut shell, _) = shell(Duration::ZERO);
        shell.apply(&parse_line(":text draft"));
        assert_eq!(shell.app().text(), "draft");
        assert_eq!(shell.app().url(), None);

        shell.apply(&parse_line(""));
        shell.apply(&parse_line(":text later"));
        assert_eq!(
            shell.app().url(),
            Some("https://api.apgy.in/qr/?data=draft&size=200")
        );
    }

    #[tokio::test]
    async fn test_size_and_theme_commands() {
        let (mut shell, _) = shell(Duration::ZERO);
        shell.apply(&parse_line(":size nope"));
        assert_eq!(shell.app().size(), 200);
        shell.apply(&parse_line(":size 640"));
        shell.apply(&parse_line(":theme"));
        assert_eq!(shell.app().size(), 640);
        assert_eq!(shell.app().theme(), Theme::Dark);
    }

    #[tokio::test]
    async fn test_download_before_generate_starts_nothing() {
        let (mut shell, sink) = shell(Duration::ZERO);
        shell.apply(&ShellCommand::Download);
        assert_eq!(shell.pending_downloads(), 0);
        assert!(shell.finish().await.is_empty());
        assert!(sink.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_quit_waits_for_running_downloads() {
        let (mut shell, sink) = shell(Duration::from_millis(50));
        let reported = Arc::new(AtomicUsize::new(0));
        let counter = reported.clone();
        shell = shell.with_download_hook(Arc::new(move |_: &DownloadOutcome| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        shell.apply(&parse_line("first"));
        shell.apply(&ShellCommand::Download);
        shell.apply(&parse_line("second"));
        shell.apply(&ShellCommand::Download);
        assert_eq!(shell.pending_downloads(), 2);
        assert!(sink.saved.lock().unwrap().is_empty());

        assert_eq!(parse_line(":quit"), ShellCommand::Quit);
        let outcomes = shell.finish().await;

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes
            .iter()
            .all(|outcome| matches!(outcome, DownloadOutcome::Saved { .. })));
        assert_eq!(reported.load(Ordering::SeqCst), 2);

        let mut saved = sink.saved.lock().unwrap().clone();
        saved.sort();
        assert_eq!(saved, vec!["qrcode-first.png", "qrcode-second.png"]);
    }
}
