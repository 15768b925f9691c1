//! Mock OCR engine for testing
//!
//! Writes a fixed TSV document to `<output_base>.tsv` instead of running a
//! real recognizer. Supports a simulated delay, error injection, and a mode
//! that "succeeds" without writing anything, mimicking an engine that exits
//! abnormally.
//!
//! # Examples
//!
//! ```
//! use roster_locate_core::ocr::{MockOcrEngine, OcrEngine};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let dir = std::env::temp_dir();
//!     let engine = MockOcrEngine::with_output("level\n");
//!     let layout = engine
//!         .recognize(&dir.join("frame.bmp"), &dir.join("mock_doc_ocr"))
//!         .await
//!         .unwrap();
//!
//!     assert!(layout.exists());
//!     assert_eq!(engine.calls(), 1);
//!     std::fs::remove_file(layout).unwrap();
//! }
//! ```

use std::{
    path::{Path, PathBuf},
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::time::sleep;

use super::OcrEngine;
use crate::{
    error::{DetectError, DetectResult},
    util::temp_files::layout_path_for,
};

/// Mock OCR engine with canned output
#[derive(Debug, Default)]
pub struct MockOcrEngine {
    /// TSV written on every call; `None` writes nothing
    output: Option<String>,
    delay: Option<Duration>,
    error_injection: Option<DetectError>,
    calls: AtomicUsize,
    /// Images seen, with whether the file existed when recognition started
    images: Mutex<Vec<(PathBuf, bool)>>,
}

impl MockOcrEngine {
    /// Engine that writes `tsv` for every image
    pub fn with_output(tsv: impl Into<String>) -> Self {
        Self {
            output: Some(tsv.into()),
            ..Self::default()
        }
    }

    /// Engine that reports success but never writes a layout file
    pub fn silent() -> Self {
        Self::default()
    }

    /// Sleeps before returning from `recognize`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fails every call with `error`
    pub fn with_error(mut self, error: DetectError) -> Self {
        self.error_injection = Some(error);
        self
    }

    /// Number of `recognize` calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Images passed to `recognize`, paired with whether each existed
    pub fn images(&self) -> Vec<(PathBuf, bool)> {
        self.images
            .lock()
            .map(|images| images.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl OcrEngine for MockOcrEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn recognize(&self, image: &Path, output_base: &Path) -> DetectResult<PathBuf> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut images) = self.images.lock() {
            images.push((image.to_path_buf(), image.exists()));
        }

        if let Some(delay) = self.delay {
            sleep(delay).await;
        }

        if let Some(error) = &self.error_injection {
            return Err(error.clone());
        }

        let layout = layout_path_for(output_base);
        if let Some(output) = &self.output {
            tokio::fs::write(&layout, output)
                .await
                .map_err(|e| DetectError::LayoutParseFailed {
                    path: layout.clone(),
                    reason: e.to_string(),
                })?;
        }
        Ok(layout)
    }
}
