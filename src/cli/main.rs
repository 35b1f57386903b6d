//! Background Remover CLI Tool
//!
//! Command-line front end for the upload/process/download workflow. Inputs are
//! processed one after another in batch mode, or driven command by command in
//! an interactive session.

use super::config::CliConfigBuilder;
use super::view::{render_status, Previews};
use crate::{
    client::RemovalClient,
    remote::RemovalService,
    services::{create_cli_progress_reporter, ImageIOService},
};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

/// Remove image backgrounds through a remote service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "bg-remover")]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Input image files or directories
    #[arg(value_name = "INPUT", required_unless_present = "interactive")]
    pub input: Vec<PathBuf>,

    /// Directory processed images are saved to [default: the user's download folder]
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Background removal endpoint URL
    #[arg(short, long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Largest accepted upload in megabytes
    #[arg(long, value_name = "MB")]
    pub max_size_mb: Option<u64>,

    /// Request timeout in seconds (0 = none)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// JSON configuration file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Start an interactive session instead of processing inputs
    #[arg(short, long)]
    pub interactive: bool,

    /// Process directories recursively
    #[arg(short, long)]
    pub recursive: bool,

    /// Pattern for files taken from directories (e.g., "*.jpg")
    #[arg(long)]
    pub pattern: Option<String>,

    /// Log progress lines instead of drawing a progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Enable verbose logging (-v: INFO, -vv: DEBUG, -vvv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

pub async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = init_tracing(cli.verbose).context("Failed to initialize tracing")?;

    let config = CliConfigBuilder::from_cli(&cli).context("Failed to build configuration")?;
    info!(endpoint = %config.endpoint, "Starting background remover");

    let reporter = create_cli_progress_reporter(!cli.no_progress, cli.verbose > 0);
    let mut client = RemovalClient::connect(config)
        .context("Failed to create service client")?
        .with_reporter(reporter);

    let mut stdout = std::io::stdout();

    if cli.interactive {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        return run_interactive(&mut client, stdin, &mut stdout).await;
    }

    let files = collect_input_files(&cli.input, cli.recursive, cli.pattern.as_deref())?;
    if files.is_empty() {
        warn!("No supported image files found in the provided inputs");
        return Ok(());
    }

    let summary = run_batch(&mut client, &files, &mut stdout).await?;
    writeln!(
        stdout,
        "{} processed, {} failed",
        summary.saved.len(),
        summary.failed
    )?;

    if summary.failed > 0 {
        anyhow::bail!(
            "{} of {} image(s) could not be processed",
            summary.failed,
            files.len()
        );
    }
    Ok(())
}

fn init_tracing(verbose_count: u8) -> Result<crate::tracing_config::LogGuard> {
    let guard = crate::tracing_config::init_cli_tracing(verbose_count)
        .context("Failed to initialize tracing subscriber")?;
    debug!(verbosity = verbose_count, "Tracing initialized");
    Ok(guard)
}

/// Outcome of a batch run
#[derive(Debug, Default)]
pub(crate) struct BatchSummary {
    pub(crate) saved: Vec<PathBuf>,
    pub(crate) failed: usize,
}

/// Select, submit, download and reset each file in turn
///
/// A failing file prints its error banner and the batch moves on.
pub(crate) async fn run_batch<S: RemovalService, W: Write>(
    client: &mut RemovalClient<S>,
    files: &[PathBuf],
    out: &mut W,
) -> Result<BatchSummary> {
    let mut summary = BatchSummary::default();

    for (index, path) in files.iter().enumerate() {
        writeln!(out, "[{}/{}] {}", index + 1, files.len(), path.display())?;

        match process_one(client, path).await {
            Ok(saved) => {
                writeln!(out, "  saved {}", saved.display())?;
                summary.saved.push(saved);
            },
            Err(e) => {
                let banner = client
                    .state()
                    .error()
                    .map_or_else(|| e.user_message(), |message| message.to_string());
                writeln!(out, "  ! {}", banner)?;
                debug!(file = %path.display(), error = %e, "Input failed");
                summary.failed += 1;
            },
        }

        client.reset();
    }

    Ok(summary)
}

async fn process_one<S: RemovalService>(
    client: &mut RemovalClient<S>,
    path: &Path,
) -> crate::Result<PathBuf> {
    client.reset();
    client.select_path(path)?;
    client.submit().await?;
    client.download(None)
}

const INTERACTIVE_HELP: &str = "\
Commands:
  select <path>     choose an image
  drop <path>       drop an image onto the drop zone
  submit            remove the background
  download [dir]    save the processed image
  preview           write preview files for both panels
  dismiss           close the error banner
  reset             start over with a new image
  status            show the current state
  help              show this help
  quit              leave";

/// One line of interactive input
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Command {
    Select(PathBuf),
    Drop(PathBuf),
    Submit,
    Download(Option<PathBuf>),
    Preview,
    Dismiss,
    Reset,
    Status,
    Help,
    Quit,
}

impl Command {
    /// Parse a line; blank lines yield `None`
    pub(crate) fn parse(line: &str) -> std::result::Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(word, rest)| (word, rest.trim()));
        let argument = (!rest.is_empty()).then(|| PathBuf::from(rest));

        let command = match (word.to_ascii_lowercase().as_str(), argument) {
            ("select" | "open", Some(path)) => Self::Select(path),
            ("drop", Some(path)) => Self::Drop(path),
            ("select" | "open" | "drop", None) => {
                return Err(format!("Usage: {} <path>", word));
            },
            ("submit" | "process", _) => Self::Submit,
            ("download" | "save", dir) => Self::Download(dir),
            ("preview", _) => Self::Preview,
            ("dismiss", _) => Self::Dismiss,
            ("reset" | "new", _) => Self::Reset,
            ("status", _) => Self::Status,
            ("help" | "?", _) => Self::Help,
            ("quit" | "exit", _) => Self::Quit,
            (other, _) => return Err(format!("Unknown command '{}', try 'help'", other)),
        };
        Ok(Some(command))
    }
}

/// Drive the client from line-oriented commands until `quit` or end of input
pub(crate) async fn run_interactive<S, R, W>(
    client: &mut RemovalClient<S>,
    reader: R,
    out: &mut W,
) -> Result<()>
where
    S: RemovalService,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = reader.lines();
    let mut previews = Previews::default();

    writeln!(out, "{}", INTERACTIVE_HELP)?;
    write!(out, "{}", render_status(client.state()))?;

    loop {
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(usage) => {
                writeln!(out, "{}", usage)?;
                continue;
            },
        };
        debug!(?command, "Interactive command");

        match command {
            // Failures are recorded in the error banner by the client
            Command::Select(path) => {
                let _ = client.select_path(&path);
                previews.clear();
                write!(out, "{}", render_status(client.state()))?;
            },
            Command::Drop(path) => {
                let _ = client.drop_path(&path);
                previews.clear();
                write!(out, "{}", render_status(client.state()))?;
            },
            Command::Submit => {
                if !client.state().can_submit() {
                    writeln!(out, "Select an image first")?;
                    continue;
                }
                let _ = client.submit().await;
                write!(out, "{}", render_status(client.state()))?;
            },
            Command::Download(dir) => match client.download(dir.as_deref()) {
                Ok(saved) => writeln!(out, "Saved {}", saved.display())?,
                Err(e) => writeln!(out, "! {}", e.user_message())?,
            },
            Command::Preview => match previews.refresh(client.state()) {
                Ok(()) => write!(out, "{}", previews.render())?,
                Err(e) => writeln!(out, "! {}", e.user_message())?,
            },
            Command::Dismiss => {
                client.dismiss_error();
                write!(out, "{}", render_status(client.state()))?;
            },
            Command::Reset => {
                client.reset();
                previews.clear();
                write!(out, "{}", render_status(client.state()))?;
            },
            Command::Status => write!(out, "{}", render_status(client.state()))?,
            Command::Help => writeln!(out, "{}", INTERACTIVE_HELP)?,
            Command::Quit => break,
        }
    }

    previews.clear();
    Ok(())
}

/// Expand inputs into the list of files to process
///
/// Files named directly are always included so unsupported ones get a
/// validation message; directory entries are filtered by extension and pattern.
pub(crate) fn collect_input_files(
    inputs: &[PathBuf],
    recursive: bool,
    pattern: Option<&str>,
) -> Result<Vec<PathBuf>> {
    let mut all_files = Vec::new();

    for path in inputs {
        if path.is_file() {
            all_files.push(path.clone());
        } else if path.is_dir() {
            let mut dir_files = find_image_files(path, recursive, pattern)?;
            dir_files.sort();
            all_files.extend(dir_files);
        } else {
            anyhow::bail!(
                "Input path does not exist or is not accessible: {}",
                path.display()
            );
        }
    }

    info!("Found {} image file(s) to process", all_files.len());
    Ok(all_files)
}

/// Find all supported image files in a directory
fn find_image_files(dir: &Path, recursive: bool, pattern: Option<&str>) -> Result<Vec<PathBuf>> {
    let pattern = pattern
        .map(glob::Pattern::new)
        .transpose()
        .context("Invalid --pattern")?;
    let max_depth = if recursive { usize::MAX } else { 1 };

    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(dir).max_depth(max_depth) {
        let entry = entry.with_context(|| format!("Failed to read {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if ImageIOService::is_supported_format(path) && matches_pattern(path, pattern.as_ref()) {
            files.push(path.to_path_buf());
        }
    }

    Ok(files)
}

/// Check if file name matches the given pattern
fn matches_pattern(path: &Path, pattern: Option<&glob::Pattern>) -> bool {
    match pattern {
        Some(pat) => path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| pat.matches(name)),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::remote::mock::{MockRemovalService, MockResponse, TRANSPARENT_PIXEL_PNG};
    use crate::types::{ProcessedResult, ProcessingState};
    use tempfile::TempDir;

    fn pixel_bytes() -> Vec<u8> {
        ProcessedResult::new(TRANSPARENT_PIXEL_PNG).decode().unwrap()
    }

    fn client_with(
        responses: Vec<MockResponse>,
        download_dir: &Path,
    ) -> RemovalClient<MockRemovalService> {
        let config = ClientConfig::builder()
            .download_dir(download_dir)
            .build()
            .unwrap();
        RemovalClient::new(config, MockRemovalService::new(responses)).with_progress_seed(7)
    }

    fn write_inputs(dir: &Path) -> Vec<PathBuf> {
        let good = dir.join("a.png");
        let text = dir.join("b.txt");
        let other = dir.join("c.png");
        std::fs::write(&good, pixel_bytes()).unwrap();
        std::fs::write(&text, b"not an image").unwrap();
        std::fs::write(&other, pixel_bytes()).unwrap();
        vec![good, text, other]
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "bg-remover",
            "-vv",
            "--recursive",
            "--pattern",
            "*.jpg",
            "photos",
        ]);
        assert_eq!(cli.verbose, 2);
        assert!(cli.recursive);
        assert_eq!(cli.pattern.as_deref(), Some("*.jpg"));
        assert_eq!(cli.input, vec![PathBuf::from("photos")]);

        assert!(Cli::try_parse_from(["bg-remover"]).is_err());
        assert!(Cli::try_parse_from(["bg-remover", "--interactive"]).is_ok());
    }

    #[test]
    fn test_command_parsing() {
        assert_eq!(
            Command::parse("select my photo.png").unwrap(),
            Some(Command::Select(PathBuf::from("my photo.png")))
        );
        assert_eq!(Command::parse("  SUBMIT ").unwrap(), Some(Command::Submit));
        assert_eq!(Command::parse("download").unwrap(), Some(Command::Download(None)));
        assert_eq!(
            Command::parse("download out").unwrap(),
            Some(Command::Download(Some(PathBuf::from("out"))))
        );
        assert_eq!(Command::parse("").unwrap(), None);
        assert!(Command::parse("select").is_err());
        assert!(Command::parse("frobnicate").is_err());
    }

    #[test]
    fn test_collect_input_files() {
        let dir = TempDir::new().unwrap();
        write_inputs(dir.path());
        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(nested.join("d.jpg"), b"jpeg").unwrap();

        let flat = collect_input_files(&[dir.path().to_path_buf()], false, None).unwrap();
        assert_eq!(flat, vec![dir.path().join("a.png"), dir.path().join("c.png")]);

        let deep = collect_input_files(&[dir.path().to_path_buf()], true, None).unwrap();
        assert_eq!(deep.len(), 3);

        let only_jpg =
            collect_input_files(&[dir.path().to_path_buf()], true, Some("*.jpg")).unwrap();
        assert_eq!(only_jpg, vec![nested.join("d.jpg")]);

        // Named files are kept even when unsupported
        let named = collect_input_files(&[dir.path().join("b.txt")], false, None).unwrap();
        assert_eq!(named.len(), 1);

        assert!(collect_input_files(&[dir.path().join("missing.png")], false, None).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_continues_after_failures() {
        let inputs = TempDir::new().unwrap();
        let outputs = TempDir::new().unwrap();
        let files = write_inputs(inputs.path());

        let mut client = client_with(
            vec![
                MockResponse::success(TRANSPARENT_PIXEL_PNG),
                MockResponse::error(500, "server overloaded"),
            ],
            outputs.path(),
        );
        let mut out = Vec::new();
        let summary = run_batch(&mut client, &files, &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(summary.saved.len(), 1);
        assert_eq!(summary.failed, 2);
        assert!(summary.saved[0].starts_with(outputs.path()));
        assert!(text.contains("! Please select a valid image file"));
        assert!(text.contains("! server overloaded"));

        // The text file never reached the service
        assert_eq!(client.service().calls(), 2);
        assert!(client.state().is_initial());
    }

    #[tokio::test(start_paused = true)]
    async fn test_interactive_session() {
        let inputs = TempDir::new().unwrap();
        let outputs = TempDir::new().unwrap();
        let files = write_inputs(inputs.path());

        let script = format!(
            "select {}\nsubmit\ndownload {}\nreset\nstatus\nquit\nsubmit\n",
            files[0].display(),
            outputs.path().display()
        );
        let mut client = client_with(
            vec![MockResponse::success(TRANSPARENT_PIXEL_PNG)],
            inputs.path(),
        );
        let mut out = Vec::new();
        run_interactive(&mut client, script.as_bytes(), &mut out)
            .await
            .unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("State: completed"));
        assert!(text.contains("Saved "));
        assert_eq!(std::fs::read_dir(outputs.path()).unwrap().count(), 1);
        assert_eq!(client.service().calls(), 1);
        assert_eq!(client.state().processing_state(), ProcessingState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interactive_errors_and_dismiss() {
        let inputs = TempDir::new().unwrap();
        let files = write_inputs(inputs.path());

        let script = format!(
            "submit\ndrop {}\ndismiss\ndownload\nbogus\n",
            files[1].display()
        );
        let mut client = client_with(vec![], inputs.path());
        let mut out = Vec::new();
        run_interactive(&mut client, script.as_bytes(), &mut out)
            .await
            .unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Select an image first"));
        assert!(text.contains("! Please select a valid image file"));
        assert!(text.contains("Unknown command 'bogus'"));
        assert!(client.state().error().is_none());
        assert_eq!(client.service().calls(), 0);
    }
}
