//! Desktop facade bundling a window enumerator with its capture strategies
//!
//! The detector only talks to [`Desktop`]; the factory functions below wire
//! up the platform pieces (or mocks) behind it.
//!
//! # Example
//!
//! ```rust,ignore
//! use roster_locate_core::capture::create_default_backend;
//!
//! let desktop = create_default_backend()?;
//! let window = locate_window(desktop.enumerator.as_ref(), &matcher).await?;
//! let frame = desktop.capturer.capture_to(&window, path).await?;
//! ```

use std::sync::Arc;

use super::{frame::FrameCapturer, traits::CaptureStrategy, traits::WindowEnumerator};

/// A window enumerator plus the ordered strategies that can capture its
/// windows.
#[derive(Clone)]
pub struct Desktop {
    /// Lists windows and reads their placement.
    pub enumerator: Arc<dyn WindowEnumerator>,

    /// Captures a located window, trying strategies in order.
    pub capturer: FrameCapturer,

    /// Backend name for diagnostics.
    pub name: &'static str,
}

impl Desktop {
    pub fn new(
        enumerator: Arc<dyn WindowEnumerator>,
        strategies: Vec<Arc<dyn CaptureStrategy>>,
        name: &'static str,
    ) -> Self {
        Self {
            enumerator,
            capturer: FrameCapturer::new(strategies),
            name,
        }
    }
}

impl std::fmt::Debug for Desktop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Desktop")
            .field("name", &self.name)
            .field("strategies", &self.capturer.strategy_names())
            .finish()
    }
}

// ============================================================================
// Factory Functions
// ============================================================================

/// Creates a Desktop from a scripted mock and mock strategies.
pub fn desktop_from_mock(
    desktop: Arc<super::mock::MockDesktop>,
    strategies: Vec<Arc<super::mock::MockStrategy>>,
) -> Desktop {
    Desktop::new(
        desktop as Arc<dyn WindowEnumerator>,
        strategies
            .into_iter()
            .map(|s| s as Arc<dyn CaptureStrategy>)
            .collect(),
        "mock",
    )
}

/// Creates a Desktop for Windows: `PrintWindow` first, then a screen copy.
#[cfg(target_os = "windows")]
pub fn desktop_from_windows() -> Desktop {
    use super::windows_backend::{PrintWindowCapture, ScreenCopyCapture, WindowsEnumerator};

    Desktop::new(
        Arc::new(WindowsEnumerator::new()),
        vec![Arc::new(PrintWindowCapture), Arc::new(ScreenCopyCapture)],
        "windows",
    )
}

/// Creates a Desktop backed by xcap: window capture, then a monitor crop.
#[cfg(not(target_os = "windows"))]
pub fn desktop_from_xcap() -> Desktop {
    use super::xcap_backend::{XcapEnumerator, XcapScreenRegionCapture, XcapWindowCapture};

    Desktop::new(
        Arc::new(XcapEnumerator::new()),
        vec![
            Arc::new(XcapWindowCapture),
            Arc::new(XcapScreenRegionCapture),
        ],
        "xcap",
    )
}
