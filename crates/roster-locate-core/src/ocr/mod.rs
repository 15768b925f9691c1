//! OCR invocation and layout parsing
//!
//! [`OcrEngine`] is the seam between the detector and whatever produces a
//! layout file for a captured frame. [`TesseractCli`] runs the real engine
//! as a child process; [`MockOcrEngine`] writes canned output for tests.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::DetectResult;

pub mod layout;
pub mod mock;
pub mod tesseract;

pub use mock::MockOcrEngine;
pub use tesseract::TesseractCli;

/// Capability: turn an image file into a TSV layout file.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Recognizes text in `image`, writing output next to `output_base`
    ///
    /// Returns the path of the layout file. The file is not guaranteed to
    /// exist; engines that exit abnormally may return a path that was never
    /// written, which the layout reader reports.
    async fn recognize(&self, image: &Path, output_base: &Path) -> DetectResult<PathBuf>;
}
