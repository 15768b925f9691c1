//! Frame capture with ordered strategy fallback
//!
//! [`FrameCapturer`] walks its strategy list until one produces an image of
//! exactly the window's extent, then writes that image to disk as BMP. The
//! first strategy on each platform is compositor-aware and works for
//! occluded windows; later ones copy from the screen and need the window to
//! be on top.

use std::{path::PathBuf, sync::Arc};

use image::RgbImage;

use super::traits::CaptureStrategy;
use crate::{
    error::{DetectError, DetectResult},
    model::LocatedWindow,
    util::encode::write_bmp,
};

/// A captured window image and where it was written
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub image: RgbImage,
    pub path: PathBuf,
    /// Name of the strategy that produced the image
    pub strategy: &'static str,
}

impl CapturedFrame {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Ordered list of capture strategies
#[derive(Clone)]
pub struct FrameCapturer {
    strategies: Vec<Arc<dyn CaptureStrategy>>,
}

impl std::fmt::Debug for FrameCapturer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameCapturer")
            .field("strategies", &self.strategy_names())
            .finish()
    }
}

impl FrameCapturer {
    pub fn new(strategies: Vec<Arc<dyn CaptureStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Captures `window` with the first strategy that succeeds
    ///
    /// An image whose size differs from the window rect counts as a failure
    /// of that strategy. The error of the last strategy tried is returned
    /// when all fail.
    pub async fn capture(&self, window: &LocatedWindow) -> DetectResult<(RgbImage, &'static str)> {
        if !window.rect.is_capturable() {
            return Err(DetectError::capture(format!(
                "window {} has empty extent {:?}",
                window.handle, window.rect
            )));
        }

        let expected = (window.rect.width() as u32, window.rect.height() as u32);
        let mut last_error = DetectError::capture("no capture strategy configured");

        for strategy in &self.strategies {
            match strategy.capture(window).await {
                Ok(image) if image.dimensions() == expected => {
                    tracing::debug!(
                        "Captured {}x{} with {}",
                        expected.0,
                        expected.1,
                        strategy.name()
                    );
                    return Ok((image, strategy.name()));
                }
                Ok(image) => {
                    let (width, height) = image.dimensions();
                    tracing::warn!(
                        "{} returned {}x{}, expected {}x{}",
                        strategy.name(),
                        width,
                        height,
                        expected.0,
                        expected.1
                    );
                    last_error = DetectError::capture(format!(
                        "{} returned {}x{} for a {}x{} window",
                        strategy.name(),
                        width,
                        height,
                        expected.0,
                        expected.1
                    ));
                }
                Err(e) => {
                    tracing::warn!("{} failed: {}", strategy.name(), e);
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }

    /// Captures `window` and writes the frame to `path`
    pub async fn capture_to(
        &self,
        window: &LocatedWindow,
        path: impl Into<PathBuf>,
    ) -> DetectResult<CapturedFrame> {
        let path = path.into();
        let (image, strategy) = self.capture(window).await?;
        write_bmp(&image, &path).await?;
        Ok(CapturedFrame {
            image,
            path,
            strategy,
        })
    }
}
