//! CLI binary for video2mp3.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use video2mp3::config::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECS};
use video2mp3::{
    is_url, ConversionConfig, ConversionController, ConversionOutput, ConversionProgressCallback,
    ConvertError, FailureHint, InputMode, ProgressCallback, RequestStatus, Source,
};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a single spinner that follows the request
/// status, plus one-line notes printed above it.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    /// Remove the spinner from the terminal; safe to call more than once.
    fn clear(&self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_attempt_start(&self, mode: InputMode) {
        if mode == InputMode::Url {
            self.bar.println(format!(
                "{} {}",
                cyan("ℹ"),
                dim("Tip: uploading the video file directly (--file) is more reliable than links.")
            ));
        }
    }

    fn on_status_change(&self, status: RequestStatus) {
        match status {
            RequestStatus::Validating => {
                self.bar.set_prefix("Checking");
                self.bar.set_message("validating input…");
            }
            RequestStatus::InFlight => {
                self.bar.set_prefix("Converting");
                self.bar
                    .set_message("waiting for the server (this can take a few minutes)…");
            }
            RequestStatus::Succeeded | RequestStatus::Failed => self.clear(),
            RequestStatus::Idle => {}
        }
    }

    fn on_saved(&self, path: &Path, size_bytes: u64) {
        self.bar.println(format!(
            "  {} saved {}  {}",
            green("✓"),
            bold(&path.display().to_string()),
            dim(&format!("{:.1} KiB", size_bytes as f64 / 1024.0)),
        ));
    }

    // The failure itself is reported once, by `fail`.
    fn on_failure(&self, _message: &str, _hint: Option<FailureHint>) {
        self.clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert a video by link
  video2mp3 https://example.com/talk.mp4

  # Upload a local file, save into ./music
  video2mp3 lecture.mov -o music

  # Force file mode for a path that looks odd
  video2mp3 --file ./https-notes.mp4

  # Validate only (no network)
  video2mp3 --check-only clip.webm

  # JSON result for scripting
  video2mp3 --json clip.mp4 > result.json

SUPPORTED UPLOADS:
  MP4, MOV, AVI, MPEG, WEBM up to 500 MB (see --max-size-mb).
  Links are fetched by the server; some sites block it. When that happens,
  download the video and upload the file instead.

ENVIRONMENT VARIABLES:
  VIDEO2MP3_ENDPOINT      Conversion service URL
  VIDEO2MP3_TIMEOUT       Request timeout in seconds
  VIDEO2MP3_OUTPUT_DIR    Directory MP3 files are saved to
  VIDEO2MP3_MAX_SIZE_MB   Upload size limit in MB
  RUST_LOG                Log filter (overrides -v / -q)
"#;

/// Convert videos (links or local files) to MP3.
#[derive(Parser, Debug)]
#[command(
    name = "video2mp3",
    version,
    about = "Convert videos (links or local files) to MP3",
    long_about = "Convert a video to an MP3 file using a remote conversion service. The input \
is either a link the service fetches itself or a local video uploaded directly. The result is \
saved as audio_<timestamp>.mp3 in the output directory.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Video URL (http/https) or local video file path.
    input: String,

    /// Treat INPUT as a URL.
    #[arg(long, conflicts_with = "file")]
    url: bool,

    /// Treat INPUT as a local file to upload.
    #[arg(long)]
    file: bool,

    /// Directory to save the MP3 into.
    #[arg(short, long, env = "VIDEO2MP3_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Conversion service URL.
    #[arg(long, env = "VIDEO2MP3_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Request timeout in seconds.
    #[arg(long, env = "VIDEO2MP3_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Upload size limit in MB.
    #[arg(long, env = "VIDEO2MP3_MAX_SIZE_MB", default_value_t = 500,
          value_parser = clap::value_parser!(u64).range(1..))]
    max_size_mb: u64,

    /// Validate the input only, no conversion.
    #[arg(long)]
    check_only: bool,

    /// Output the outcome as JSON.
    #[arg(long, env = "VIDEO2MP3_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "VIDEO2MP3_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "VIDEO2MP3_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "VIDEO2MP3_QUIET")]
    quiet: bool,
}

impl Cli {
    fn mode(&self) -> InputMode {
        if self.url {
            InputMode::Url
        } else if self.file {
            InputMode::File
        } else if is_url(&self.input) {
            InputMode::Url
        } else {
            InputMode::File
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback that matters; keep library INFO
    // logs out of its way unless asked for.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.check_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let spinner = show_progress.then(CliProgressCallback::new);
    let progress_cb: Option<ProgressCallback> = spinner
        .clone()
        .map(|cb| cb as Arc<dyn ConversionProgressCallback>);
    let config = build_config(&cli, progress_cb)?;
    let mode = cli.mode();

    let mut controller =
        ConversionController::new(config).context("Failed to initialise the HTTP client")?;
    let picked = match mode {
        InputMode::Url => controller.set_url(cli.input.trim()),
        InputMode::File => controller.choose_file(&cli.input),
    };
    if let Err(e) = picked {
        return fail(&cli, mode, &e, spinner.as_deref());
    }

    // ── Check-only mode ──────────────────────────────────────────────────
    if cli.check_only {
        if let Err(e) = controller.validate() {
            return fail(&cli, mode, &ConvertError::from(e), spinner.as_deref());
        }
        let source = controller
            .request()
            .source()
            .context("Validated request has no input")?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&source).context("Failed to serialise input")?
            );
        } else {
            match source {
                Source::Url(url) => println!("URL:    {url}"),
                Source::File(f) => {
                    println!("File:   {}", f.path.display());
                    println!("Type:   {}", f.mime_type);
                    println!("Size:   {} bytes", f.size_bytes);
                }
            }
            println!("Status: {}", green("ok"));
        }
        return Ok(());
    }

    // ── Run conversion ───────────────────────────────────────────────────
    let start = Instant::now();
    let output = match controller.submit().await {
        Ok(result) => {
            ConversionOutput::from_result(result, mode, start.elapsed().as_millis() as u64)
        }
        Err(e) => return fail(&cli, mode, &e, spinner.as_deref()),
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        println!("{}", output.saved_path.display());
        if !cli.quiet {
            eprintln!(
                "{}  {}  {}  {}ms",
                green("✔"),
                bold(&output.filename),
                dim(&format!("{} bytes", output.size_bytes)),
                output.duration_ms,
            );
        }
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .endpoint(cli.endpoint.clone())
        .timeout_secs(cli.timeout)
        .max_file_size(cli.max_size_mb.saturating_mul(1024 * 1024))
        .output_dir(cli.output_dir.clone());

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Report a failed attempt and exit non-zero.
fn fail(
    cli: &Cli,
    mode: InputMode,
    error: &ConvertError,
    spinner: Option<&CliProgressCallback>,
) -> Result<()> {
    if let Some(spinner) = spinner {
        spinner.clear();
    }
    let message = error.user_message();
    let hint = error.hint();

    if cli.json {
        let report = serde_json::json!({
            "status": RequestStatus::Failed,
            "mode": mode,
            "error": message,
            "hint": hint,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise error")?
        );
    } else {
        eprintln!("{} {}", red("✘"), message);
        if let Some(advice) = hint.map(rerun_advice) {
            eprintln!("  {} {}", cyan("→"), advice);
        }
    }
    std::process::exit(1);
}

fn rerun_advice(hint: FailureHint) -> String {
    match hint {
        FailureHint::SwitchToFileUpload => {
            "Download the video, then re-run with the file: video2mp3 --file <PATH>".to_string()
        }
        FailureHint::SwitchToUrl => {
            "Re-run with a link to the video: video2mp3 --url <URL>".to_string()
        }
        FailureHint::RetryLater => hint.suggestion().to_string(),
    }
}
