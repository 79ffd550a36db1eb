use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use scanify::{
    logger::{self, LogLevel, LoggerConfig},
    parse_line, Action, AppState, DirectorySink, DownloadHook, DownloadOutcome, ImageFetcher,
    QrClient, ScanifyConfig, Shell, ShellCommand,
};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "scanify")]
#[command(about = "Generate, preview and download QR code images from a remote QR API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// QR service base URL (overrides SCANIFY_ENDPOINT)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Also append log lines to this file
    #[arg(long, global = true)]
    log_file: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the request URL for the given text and size
    Generate(FormArgs),

    /// Generate, then download the image into a directory
    Download {
        #[command(flatten)]
        form: FormArgs,

        /// Directory to save into (overrides SCANIFY_OUTPUT_DIR)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Generate, then print the image as a data: URI
    Preview(FormArgs),

    /// Interactive session: type text and press Enter to generate
    Shell {
        /// Directory downloads are saved into
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}

#[derive(Args)]
struct FormArgs {
    /// Data to encode (defaults to SCANIFY_DEFAULT_TEXT or "HelloWorld")
    text: Option<String>,

    /// Size in pixels, 100-1000; non-numeric input falls back to 200
    #[arg(short, long, allow_hyphen_values = true)]
    size: Option<String>,
}

const SHELL_HELP: &str = "\
  <text>        set the text and generate
  <empty line>  generate from the current text
  :text <t>     set the text without generating
  :size <n>     set the size
  :generate     generate
  :download     download the displayed QR code
  :preview      print the displayed QR code as a data: URI
  :theme        toggle light/dark theme
  :status       show the current form and preview
  :help         show this help
  :quit         leave";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    let cli = Cli::parse();

    let mut config = ScanifyConfig::from_env();
    if let Some(endpoint) = &cli.endpoint {
        config = config.with_endpoint(endpoint.clone());
    }

    logger::init_with_config(
        logger_config(&cli, config.log_level).with_colors(std::io::stderr().is_terminal()),
    )?;

    if dotenv_loaded {
        log::debug!("✅ .env file loaded");
    } else {
        log::debug!("No .env file found, using process environment");
    }

    config.validate()?;
    log::debug!("Using QR endpoint {}", config.endpoint);

    match cli.command {
        Commands::Generate(form) => {
            let mut app = AppState::new(config);
            apply_form(&mut app, &form);
            print_generated(&app, cli.json)?;
        }
        Commands::Download { form, output_dir } => {
            let client = QrClient::new(&config)?;
            let sink = DirectorySink::new(output_dir.unwrap_or_else(|| config.output_dir.clone()));
            let mut app = AppState::new(config);
            apply_form(&mut app, &form);

            let outcome = app.download(&client, &sink).await;
            print_outcome(&outcome, cli.json)?;
        }
        Commands::Preview(form) => {
            let client = QrClient::new(&config)?;
            let mut app = AppState::new(config);
            apply_form(&mut app, &form);
            print_preview(&app, &client, cli.json).await?;
        }
        Commands::Shell { output_dir } => {
            let client = Arc::new(QrClient::new(&config)?);
            let sink = Arc::new(DirectorySink::new(
                output_dir.unwrap_or_else(|| config.output_dir.clone()),
            ));
            run_shell(AppState::new(config), client, sink, cli.json).await?;
        }
    }

    Ok(())
}

/// `--verbose` selects the development preset and `--json` the production
/// one. Otherwise only warnings and errors are shown unless
/// `SCANIFY_LOG_LEVEL` says otherwise.
fn logger_config(cli: &Cli, configured: Option<LogLevel>) -> LoggerConfig {
    let mut config = if cli.verbose {
        LoggerConfig::development()
    } else if cli.json {
        LoggerConfig::production()
    } else {
        LoggerConfig::new().with_level(LogLevel::Warn)
    };
    if !cli.verbose {
        if let Some(level) = configured {
            config = config.with_level(level);
        }
    }
    config = config.with_json_output(cli.json);
    if let Some(path) = &cli.log_file {
        config = config.with_file_output(path);
    }
    config
}

fn apply_form(app: &mut AppState, form: &FormArgs) {
    if let Some(text) = &form.text {
        app.update(Action::SetText(text.clone()));
    }
    if let Some(size) = &form.size {
        app.update(Action::SetSize(size.clone()));
    }
    app.update(Action::Generate);
}

fn print_json(value: &impl Serialize) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_generated(app: &AppState, json: bool) -> Result<(), serde_json::Error> {
    if json {
        return print_json(&app.snapshot());
    }
    match app.url() {
        Some(url) => println!("{}", url),
        None => println!("Nothing to generate: the text is empty"),
    }
    Ok(())
}

fn print_outcome(outcome: &DownloadOutcome, json: bool) -> Result<(), serde_json::Error> {
    if json {
        return print_json(outcome);
    }
    // Failures were already logged; they are not reported on stdout.
    if let DownloadOutcome::Saved { path } = outcome {
        println!("Saved QR code to {}", path.display());
    }
    Ok(())
}

async fn print_preview(
    app: &AppState,
    fetcher: &dyn ImageFetcher,
    json: bool,
) -> Result<(), serde_json::Error> {
    let Some(image) = app.fetch_preview(fetcher).await else {
        if app.url().is_none() {
            println!("{}", app.preview_state().description());
        }
        return Ok(());
    };

    if json {
        return print_json(&serde_json::json!({
            "url": image.url,
            "size_bytes": image.size(),
            "content_type": image.content_type,
            "data_uri": image.to_data_uri(),
        }));
    }
    println!("{}", image.to_data_uri());
    Ok(())
}

fn print_status(app: &AppState, json: bool) -> Result<(), serde_json::Error> {
    let snapshot = app.snapshot();
    if json {
        return print_json(&snapshot);
    }

    println!("theme: {}", snapshot.theme);
    println!("text:  {}", snapshot.text);
    println!("size:  {}px", snapshot.size);
    match &snapshot.url {
        Some(url) => println!("qr:    {}", url),
        None => println!("qr:    {}", snapshot.preview.placeholder().unwrap_or_default()),
    }
    println!("       {}", snapshot.preview.description());
    Ok(())
}

async fn run_shell(
    app: AppState,
    fetcher: Arc<QrClient>,
    sink: Arc<DirectorySink>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Scanify - type text and press Enter to generate, :help for commands");
    print_status(&app, json)?;

    let report: DownloadHook = Arc::new(move |outcome: &DownloadOutcome| {
        if let Err(e) = print_outcome(outcome, json) {
            log::error!("Failed to print download result: {}", e);
        }
    });
    let mut shell = Shell::new(app, fetcher.clone(), sink).with_download_hook(report);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let command = parse_line(&line);
        shell.apply(&command);

        match &command {
            ShellCommand::Submit(_) | ShellCommand::Generate => print_generated(shell.app(), json)?,
            ShellCommand::Size(_) => println!("size: {}px", shell.app().size()),
            ShellCommand::Theme => println!("theme: {}", shell.app().theme()),
            ShellCommand::Preview => print_preview(shell.app(), fetcher.as_ref(), json).await?,
            ShellCommand::Status => print_status(shell.app(), json)?,
            ShellCommand::Help => println!("{}", SHELL_HELP),
            ShellCommand::Unknown(name) => println!("Unknown command :{} (try :help)", name),
            ShellCommand::Quit => break,
            ShellCommand::Text(_) | ShellCommand::Download => {}
        }
    }

    let pending = shell.pending_downloads();
    if pending > 0 {
        log::info!("Waiting for {} download(s) to finish", pending);
    }
    shell.finish().await;

    Ok(())
}
