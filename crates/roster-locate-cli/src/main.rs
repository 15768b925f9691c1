//! roster-locate: prints where the submarine roster list is on screen
//!
//! On success a single JSON object `{"x":..,"y":..,"width":..,"height":..}`
//! in absolute screen coordinates goes to stdout and the exit code is 0.
//! Diagnostics go to stderr; "not detected" and setup failures exit with 2.

use std::future::Future;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use roster_locate_core::{
    DetectionOutcome, Detector,
    capture::{TitleMatcher, create_default_backend},
    config::DetectorConfig,
};
use tracing_subscriber::EnvFilter;

/// Exit code for "region not detected" and for setup failures
const EXIT_NOT_DETECTED: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "roster-locate")]
#[command(about = "Locate the submarine roster list in the game window via OCR")]
struct Cli {
    /// Keep retrying after a failed attempt until --timeout elapses
    #[arg(long)]
    watch: bool,

    /// Milliseconds between attempts in watch mode
    #[arg(long, value_name = "MS")]
    interval: Option<u64>,

    /// Overall deadline in milliseconds, checked between attempts
    #[arg(long, value_name = "MS")]
    timeout: Option<u64>,

    /// Tesseract executable
    #[arg(long, value_name = "PATH")]
    tesseract: Option<PathBuf>,

    /// Tesseract language spec, e.g. jpn+eng
    #[arg(long, value_name = "LANGS")]
    lang: Option<String>,

    /// Tesseract page segmentation mode
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u8).range(0..=13))]
    psm: Option<u8>,

    /// Milliseconds one OCR run may take
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    ocr_timeout: Option<u64>,

    /// Pixels added around the detected text
    #[arg(long, value_name = "PX", value_parser = clap::value_parser!(i32).range(0..))]
    padding: Option<i32>,

    /// Include whole OCR lines that contain a roster match
    #[arg(long)]
    group_lines: bool,

    /// Window title substring; repeat to match several (replaces the defaults)
    #[arg(long = "window-title", value_name = "SUBSTR")]
    window_titles: Vec<String>,

    /// Print visible windows, marking the one that would be used, and exit
    #[arg(long)]
    list_windows: bool,

    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Layers the flags over `config`
    fn apply(&self, config: &mut DetectorConfig) {
        config.retry.watch |= self.watch;
        if let Some(ms) = self.interval {
            config.retry.interval = Duration::from_millis(ms);
        }
        if let Some(ms) = self.timeout {
            config.retry.timeout = Duration::from_millis(ms);
        }

        if let Some(program) = &self.tesseract {
            config.ocr.program = program.clone();
        }
        if let Some(lang) = &self.lang {
            config.ocr.languages = lang.clone();
        }
        if let Some(psm) = self.psm {
            config.ocr.page_seg_mode = psm;
        }
        if let Some(ms) = self.ocr_timeout {
            config.ocr.timeout = Duration::from_millis(ms);
        }

        if let Some(padding) = self.padding {
            config.region.padding = padding;
        }
        config.region.group_lines |= self.group_lines;

        if !self.window_titles.is_empty() {
            config.title_patterns = self.window_titles.clone();
        }
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let core_level = if verbose { "debug" } else { "warn" };

    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives)?,
        _ => EnvFilter::default()
            .add_directive(format!("roster_locate={level}").parse()?)
            .add_directive(format!("roster_locate_core={core_level}").parse()?),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match block_on_abandoning(run(cli)) {
        Ok(Ok(code)) => code,
        Ok(Err(e)) | Err(e) => {
            eprintln!("roster-locate: {e:#}");
            ExitCode::from(EXIT_NOT_DETECTED)
        }
    }
}

/// Drives `fut` to completion on a fresh current-thread runtime
///
/// Blocking-pool threads still busy afterwards (a capture call that timed
/// out but never returned) are left behind instead of joined, so the
/// process can exit.
fn block_on_abandoning<F: Future>(fut: F) -> Result<F::Output> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;
    let output = rt.block_on(fut);
    rt.shutdown_background();
    Ok(output)
}

async fn run(cli: Cli) -> Result<ExitCode> {
    init_logging(cli.verbose).context("failed to initialise logging")?;

    let mut config = DetectorConfig::from_env();
    cli.apply(&mut config);
    tracing::debug!("Configuration: {:?}", config);

    if cli.list_windows {
        list_windows(&config).await?;
        return Ok(ExitCode::SUCCESS);
    }

    std::fs::create_dir_all(&config.temp_dir)
        .with_context(|| format!("cannot create temp dir {}", config.temp_dir.display()))?;

    let detector = Detector::from_config(&config)
        .map_err(|e| anyhow::anyhow!("{e}\nhint: {}", e.remediation_hint()))?;

    match detector.run().await {
        DetectionOutcome::Found(region) => {
            println!("{}", serde_json::to_string(&region)?);
            Ok(ExitCode::SUCCESS)
        }
        DetectionOutcome::NotDetected {
            attempts,
            last_error,
        } => {
            tracing::info!(attempts, "Giving up");
            match last_error {
                Some(kind) => eprintln!("roster-locate: region not detected (last error: {kind})"),
                None => eprintln!("roster-locate: region not detected"),
            }
            Ok(ExitCode::from(EXIT_NOT_DETECTED))
        }
    }
}

async fn list_windows(config: &DetectorConfig) -> Result<()> {
    let desktop = create_default_backend()
        .map_err(|e| anyhow::anyhow!("{e}\nhint: {}", e.remediation_hint()))?;
    let windows = desktop.enumerator.list_windows().await?;
    let matcher = TitleMatcher::new(config.title_patterns.clone());
    let picked = matcher.find(windows.iter().cloned()).map(|w| w.handle);

    let visible: Vec<_> = windows.iter().filter(|w| w.visible).collect();
    println!("{} visible windows ({} backend):", visible.len(), desktop.name);
    for window in visible {
        let marker = if Some(window.handle) == picked { "*" } else { " " };
        println!("{marker} {:>12}  {}", window.handle.to_string(), window.title);
    }
    if picked.is_none() {
        println!("No window title contains any of {:?}", matcher.patterns());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Instant;

    use clap::CommandFactory;
    use roster_locate_core::{
        ErrorKind,
        capture::{MockDesktop, MockStrategy, desktop_from_mock},
        model::WindowRect,
        ocr::MockOcrEngine,
    };

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("roster-locate").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_flags_keeps_config() {
        let mut config = DetectorConfig::default();
        parse(&[]).apply(&mut config);
        assert_eq!(config, DetectorConfig::default());
    }

    #[test]
    fn test_loop_flags() {
        let mut config = DetectorConfig::default();
        parse(&["--watch", "--interval=500", "--timeout", "3000"]).apply(&mut config);

        assert!(config.retry.watch);
        assert_eq!(config.retry.interval, Duration::from_millis(500));
        assert_eq!(config.retry.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_ocr_and_region_flags() {
        let mut config = DetectorConfig::default();
        parse(&[
            "--tesseract=/opt/tesseract/bin/tesseract",
            "--lang=eng",
            "--psm=11",
            "--ocr-timeout=5000",
            "--padding=0",
            "--group-lines",
        ])
        .apply(&mut config);

        assert_eq!(config.ocr.program, PathBuf::from("/opt/tesseract/bin/tesseract"));
        assert_eq!(config.ocr.languages, "eng");
        assert_eq!(config.ocr.page_seg_mode, 11);
        assert_eq!(config.ocr.timeout, Duration::from_secs(5));
        assert_eq!(config.region.padding, 0);
        assert!(config.region.group_lines);
    }

    #[test]
    fn test_window_titles_replace_defaults() {
        let mut config = DetectorConfig::default();
        parse(&["--window-title", "Game A", "--window-title=Game B"]).apply(&mut config);
        assert_eq!(config.title_patterns, vec!["Game A", "Game B"]);
    }

    #[test]
    fn test_rejects_invalid_values() {
        for args in [
            vec!["roster-locate", "--psm=14"],
            vec!["roster-locate", "--ocr-timeout=0"],
            vec!["roster-locate", "--padding=-4"],
            vec!["roster-locate", "--interval=soon"],
        ] {
            assert!(
                Cli::try_parse_from(args.iter().copied()).is_err(),
                "{args:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_abandoned_capture_does_not_block_exit() {
        let dir = tempfile::tempdir().unwrap();
        let config = DetectorConfig {
            temp_dir: dir.path().to_path_buf(),
            ..DetectorConfig::default()
        };
        let desktop = Arc::new(MockDesktop::new().with_window(
            "FINAL FANTASY XIV",
            true,
            WindowRect::new(0, 0, 800, 600),
        ));
        let strategy = Arc::new(MockStrategy::hung(
            "print",
            Duration::from_secs(3),
            Duration::from_millis(50),
        ));
        let detector = Detector::new(
            &config,
            desktop_from_mock(desktop, vec![strategy]),
            Arc::new(MockOcrEngine::with_output(String::new())),
        );

        let started = Instant::now();
        let outcome = block_on_abandoning(detector.run()).unwrap();
        let elapsed = started.elapsed();

        assert_eq!(
            outcome,
            DetectionOutcome::NotDetected {
                attempts: 1,
                last_error: Some(ErrorKind::CaptureFailed),
            }
        );
        assert!(
            elapsed < Duration::from_secs(2),
            "runtime waited {elapsed:?} on the hung capture"
        );
    }

    #[test]
    fn test_region_serializes_as_flat_json() {
        let json = serde_json::to_string(&roster_locate_core::Rectangle::new(1, 2, 3, 4)).unwrap();
        assert_eq!(json, r#"{"x":1,"y":2,"width":3,"height":4}"#);
    }
}
