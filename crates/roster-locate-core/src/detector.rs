//! Detection loop
//!
//! One attempt runs the pipeline strictly in order:
//!
//! 1. locate the game window by title
//! 2. capture it and write the frame as BMP
//! 3. run OCR on the frame
//! 4. parse the TSV layout
//! 5. infer the window-relative roster rectangle
//! 6. translate it to absolute screen coordinates
//!
//! Any failure ends the attempt. Without watch mode the loop stops after the
//! first attempt; with it, the loop sleeps for the retry interval and tries
//! again until the elapsed time exceeds the overall timeout. The timeout is
//! only checked between attempts, so an attempt in flight always finishes.
//!
//! Temporary files of an attempt are removed when the attempt ends,
//! whatever the outcome.

use std::sync::Arc;

use tokio::time::{Instant, sleep};

use crate::{
    capture::{Desktop, TitleMatcher, create_default_backend, locate_window},
    config::{DetectorConfig, LoopConfig},
    error::DetectResult,
    model::{DetectionOutcome, LocatedWindow, Rectangle},
    ocr::{OcrEngine, TesseractCli, layout::read_layout},
    region::RegionInferencer,
    util::temp_files::{AttemptArtifacts, RunContext},
};

/// Runs detection attempts against a desktop and an OCR engine
pub struct Detector {
    desktop: Desktop,
    ocr: Arc<dyn OcrEngine>,
    matcher: TitleMatcher,
    inferencer: RegionInferencer,
    retry: LoopConfig,
    context: RunContext,
}

impl std::fmt::Debug for Detector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Detector")
            .field("desktop", &self.desktop)
            .field("ocr", &self.ocr.name())
            .field("matcher", &self.matcher)
            .field("retry", &self.retry)
            .field("temp_dir", &self.context.temp_dir())
            .finish()
    }
}

impl Detector {
    /// Builds a detector from explicit parts
    pub fn new(config: &DetectorConfig, desktop: Desktop, ocr: Arc<dyn OcrEngine>) -> Self {
        Self {
            desktop,
            ocr,
            matcher: TitleMatcher::new(config.title_patterns.clone()),
            inferencer: RegionInferencer::new(config.region.clone()),
            retry: config.retry.clone(),
            context: RunContext::new(&config.temp_dir),
        }
    }

    /// Builds a detector with the platform backend and Tesseract
    pub fn from_config(config: &DetectorConfig) -> DetectResult<Self> {
        let desktop = create_default_backend()?;
        let ocr = Arc::new(TesseractCli::new(config.ocr.clone()));
        Ok(Self::new(config, desktop, ocr))
    }

    /// Replaces the region inferencer, e.g. to use custom match rules
    pub fn with_inferencer(mut self, inferencer: RegionInferencer) -> Self {
        self.inferencer = inferencer;
        self
    }

    pub fn desktop(&self) -> &Desktop {
        &self.desktop
    }

    pub fn matcher(&self) -> &TitleMatcher {
        &self.matcher
    }

    pub fn context(&self) -> &RunContext {
        &self.context
    }

    /// Runs attempts until one succeeds or the loop gives up
    pub async fn run(&self) -> DetectionOutcome {
        let start = Instant::now();
        let mut attempts: u32 = 0;
        let mut last_error = None;

        loop {
            attempts += 1;
            tracing::info!(attempt = attempts, "Starting detection attempt");

            match self.detect_once(attempts).await {
                Ok(region) => {
                    tracing::info!(
                        attempt = attempts,
                        x = region.x,
                        y = region.y,
                        width = region.width,
                        height = region.height,
                        "Roster region detected"
                    );
                    return DetectionOutcome::Found(region);
                }
                Err(e) => {
                    tracing::warn!(
                        attempt = attempts,
                        kind = %e.kind(),
                        transient = e.is_transient(),
                        "Detection attempt failed: {}",
                        e
                    );
                    last_error = Some(e.kind());
                }
            }

            if !self.retry.watch {
                break;
            }
            if start.elapsed() > self.retry.timeout {
                tracing::info!(
                    attempts,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Detection timed out"
                );
                break;
            }

            tracing::debug!("Retrying in {:?}", self.retry.interval);
            sleep(self.retry.interval).await;
        }

        DetectionOutcome::NotDetected {
            attempts,
            last_error,
        }
    }

    /// One full attempt; returns the roster rectangle in absolute coordinates
    ///
    /// Capture and OCR are never started when the window is not found.
    pub async fn detect_once(&self, attempt: u32) -> DetectResult<Rectangle> {
        let window = locate_window(self.desktop.enumerator.as_ref(), &self.matcher).await?;

        let mut artifacts = self.context.artifacts(attempt);
        let result = self.process_window(&window, &mut artifacts).await;
        artifacts.cleanup();

        let relative = result?;
        Ok(relative.translate(&window.rect))
    }

    /// Capture, OCR, parse and infer for an already located window
    async fn process_window(
        &self,
        window: &LocatedWindow,
        artifacts: &mut AttemptArtifacts,
    ) -> DetectResult<Rectangle> {
        let frame = self
            .desktop
            .capturer
            .capture_to(window, artifacts.image_path())
            .await?;
        tracing::debug!(
            "Captured {}x{} frame with {}",
            frame.width(),
            frame.height(),
            frame.strategy
        );
        // Pixels are on disk now; the OCR engine reads them from there
        drop(frame);

        let layout = self
            .ocr
            .recognize(artifacts.image_path(), artifacts.layout_base())
            .await?;
        if layout != artifacts.layout_path() {
            artifacts.track(&layout);
        }

        let fragments = read_layout(&layout).await?;
        tracing::debug!("{} recognized {} fragments", self.ocr.name(), fragments.len());

        self.inferencer.infer(&fragments)
    }
}
