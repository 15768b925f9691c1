//! Capability traits for the window and capture seams
//!
//! - [`WindowEnumerator`]: list top-level windows and read their placement
//! - [`CaptureStrategy`]: render one window into a pixel buffer
//!
//! Platform backends implement both; [`MockDesktop`](super::mock::MockDesktop)
//! and [`MockStrategy`](super::mock::MockStrategy) stand in for them in tests.

use async_trait::async_trait;
use image::RgbImage;

use crate::{
    error::DetectResult,
    model::{LocatedWindow, WindowHandle, WindowInfo, WindowRect},
};

/// Capability: Backend can enumerate top-level windows.
///
/// # Platform Support
///
/// - **Windows**: `EnumWindows`, visibility from `IsWindowVisible`
/// - **X11 / macOS**: xcap, visibility means "not minimized"
#[async_trait]
pub trait WindowEnumerator: Send + Sync {
    /// Lists titled top-level windows in the order the OS reports them.
    ///
    /// Invisible windows are included with `visible == false`; the locator
    /// skips them.
    async fn list_windows(&self) -> DetectResult<Vec<WindowInfo>>;

    /// Reads the current absolute placement of a window.
    async fn window_rect(&self, handle: WindowHandle) -> DetectResult<WindowRect>;
}

/// Capability: one way of turning a window into pixels.
///
/// Strategies are tried in order by the
/// [`FrameCapturer`](super::frame::FrameCapturer) until one succeeds.
#[async_trait]
pub trait CaptureStrategy: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Captures the window's full extent (client area plus borders).
    ///
    /// Implementations should fail rather than return a partial image; the
    /// capturer also rejects images whose size differs from `window.rect`.
    async fn capture(&self, window: &LocatedWindow) -> DetectResult<RgbImage>;
}
