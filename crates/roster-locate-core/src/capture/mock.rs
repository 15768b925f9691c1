//! Mock desktop and capture strategies for testing
//!
//! [`MockDesktop`] implements [`WindowEnumerator`] over a scripted window
//! list. [`MockStrategy`] implements [`CaptureStrategy`] with a scripted
//! result. Both count calls so tests can assert which stages ran.
//!
//! # Examples
//!
//! ```
//! use roster_locate_core::{
//!     capture::{WindowEnumerator, mock::MockDesktop},
//!     model::WindowRect,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let desktop = MockDesktop::new()
//!         .with_window("Notepad", true, WindowRect::new(0, 0, 640, 480))
//!         .with_window("FINAL FANTASY XIV", true, WindowRect::new(100, 50, 900, 650));
//!
//!     let windows = desktop.list_windows().await.unwrap();
//!     assert_eq!(windows.len(), 2);
//!     assert_eq!(desktop.list_calls(), 1);
//! }
//! ```

use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use image::{Rgb, RgbImage};
use tokio::time::sleep;

use super::{
    run_blocking,
    traits::{CaptureStrategy, WindowEnumerator},
};
use crate::{
    error::{DetectError, DetectResult},
    model::{LocatedWindow, WindowHandle, WindowInfo, WindowRect},
};

/// Handles start here so they look like real `HWND`s in logs
const FIRST_HANDLE: isize = 0x1000;

/// Scripted window list
#[derive(Debug, Default)]
pub struct MockDesktop {
    windows: Vec<(WindowInfo, WindowRect)>,
    /// Optional delay to simulate a slow window system
    delay: Option<Duration>,
    /// Returned by every enumeration when set
    error_injection: Option<DetectError>,
    list_calls: AtomicUsize,
    rect_calls: AtomicUsize,
}

impl MockDesktop {
    /// Creates a desktop with no windows
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a window; enumeration reports windows in insertion order
    pub fn with_window(mut self, title: &str, visible: bool, rect: WindowRect) -> Self {
        let handle = WindowHandle::new(FIRST_HANDLE + self.windows.len() as isize);
        self.windows.push((
            WindowInfo {
                handle,
                title: title.to_string(),
                visible,
            },
            rect,
        ));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Injects an error returned by every enumeration
    pub fn with_error(mut self, error: DetectError) -> Self {
        self.error_injection = Some(error);
        self
    }

    /// Handle assigned to the `index`-th window added
    pub fn handle(&self, index: usize) -> Option<WindowHandle> {
        self.windows.get(index).map(|(info, _)| info.handle)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn rect_calls(&self) -> usize {
        self.rect_calls.load(Ordering::SeqCst)
    }

    async fn simulate_delay(&self) {
        if let Some(delay) = self.delay {
            sleep(delay).await;
        }
    }
}

#[async_trait]
impl WindowEnumerator for MockDesktop {
    async fn list_windows(&self) -> DetectResult<Vec<WindowInfo>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_delay().await;

        if let Some(error) = &self.error_injection {
            return Err(error.clone());
        }

        Ok(self.windows.iter().map(|(info, _)| info.clone()).collect())
    }

    async fn window_rect(&self, handle: WindowHandle) -> DetectResult<WindowRect> {
        self.rect_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_delay().await;

        self.windows
            .iter()
            .find(|(info, _)| info.handle == handle)
            .map(|(_, rect)| *rect)
            .ok_or_else(|| DetectError::enumeration(format!("window {handle} no longer exists")))
    }
}

#[derive(Debug)]
enum Script {
    /// Image matching the window's extent
    Fitted,
    /// Image of a fixed size regardless of the window
    Sized(u32, u32),
    Fail(DetectError),
    /// Blocks a blocking-pool thread for `block_for`, abandoned after `timeout`
    Hung { block_for: Duration, timeout: Duration },
}

/// Capture strategy with a scripted outcome
#[derive(Debug)]
pub struct MockStrategy {
    name: &'static str,
    script: Script,
    fill: Rgb<u8>,
    calls: AtomicUsize,
}

impl MockStrategy {
    fn with_script(name: &'static str, script: Script) -> Self {
        Self {
            name,
            script,
            fill: Rgb([32, 48, 64]),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always produces an image exactly as large as the window
    pub fn fitted(name: &'static str) -> Self {
        Self::with_script(name, Script::Fitted)
    }

    /// Always produces a `width`x`height` image
    pub fn sized(name: &'static str, width: u32, height: u32) -> Self {
        Self::with_script(name, Script::Sized(width, height))
    }

    /// Always fails with `error`
    pub fn failing(name: &'static str, error: DetectError) -> Self {
        Self::with_script(name, Script::Fail(error))
    }

    /// Stands in for a window that stops answering paint requests
    ///
    /// The blocking thread stays busy for `block_for`; the capture gives up
    /// after `timeout` like the real backends do.
    pub fn hung(name: &'static str, block_for: Duration, timeout: Duration) -> Self {
        Self::with_script(name, Script::Hung { block_for, timeout })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptureStrategy for MockStrategy {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn capture(&self, window: &LocatedWindow) -> DetectResult<RgbImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let (width, height) = match &self.script {
            Script::Fitted => (
                window.rect.width().max(0) as u32,
                window.rect.height().max(0) as u32,
            ),
            Script::Sized(width, height) => (*width, *height),
            Script::Fail(error) => return Err(error.clone()),
            Script::Hung { block_for, timeout } => {
                let block_for = *block_for;
                let timeout_ms = timeout.as_millis().try_into().unwrap_or(u64::MAX);
                return run_blocking(self.name, timeout_ms, DetectError::capture, move || {
                    std::thread::sleep(block_for);
                    Err(DetectError::capture("window answered after the capture gave up"))
                })
                .await;
            }
        };

        Ok(RgbImage::from_pixel(width, height, self.fill))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn test_windows_in_insertion_order() {
        let desktop = MockDesktop::new()
            .with_window("A", true, WindowRect::new(0, 0, 10, 10))
            .with_window("B", false, WindowRect::new(5, 5, 20, 20));

        let windows = desktop.list_windows().await.unwrap();
        let titles: Vec<&str> = windows.iter().map(|w| w.title.as_str()).collect();
        assert_eq!(titles, ["A", "B"]);
        assert!(!windows[1].visible);
        assert_ne!(windows[0].handle, windows[1].handle);
    }

    #[tokio::test]
    async fn test_window_rect_lookup() {
        let desktop = MockDesktop::new().with_window("A", true, WindowRect::new(1, 2, 3, 4));
        let handle = desktop.handle(0).unwrap();

        assert_eq!(desktop.window_rect(handle).await.unwrap(), WindowRect::new(1, 2, 3, 4));
        let err = desktop.window_rect(WindowHandle::new(1)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EnumerationFailed);
        assert_eq!(desktop.rect_calls(), 2);
    }

    #[tokio::test]
    async fn test_error_injection() {
        let desktop = MockDesktop::new().with_error(DetectError::BackendNotAvailable {
            reason: "no display".to_string(),
        });

        let err = desktop.list_windows().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BackendNotAvailable);
        assert_eq!(desktop.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_strategy_scripts() {
        let window = LocatedWindow {
            handle: WindowHandle::new(1),
            title: "A".to_string(),
            rect: WindowRect::new(10, 20, 30, 60),
        };

        let fitted = MockStrategy::fitted("fit").capture(&window).await.unwrap();
        assert_eq!(fitted.dimensions(), (20, 40));

        let sized = MockStrategy::sized("fixed", 3, 4).capture(&window).await.unwrap();
        assert_eq!(sized.dimensions(), (3, 4));

        let failing = MockStrategy::failing("fail", DetectError::capture("boom"));
        assert!(failing.capture(&window).await.is_err());
        assert_eq!(failing.calls(), 1);
    }

    #[tokio::test]
    async fn test_hung_strategy_times_out() {
        let window = LocatedWindow {
            handle: WindowHandle::new(1),
            title: "A".to_string(),
            rect: WindowRect::new(0, 0, 10, 10),
        };
        let hung = MockStrategy::hung(
            "print",
            Duration::from_millis(600),
            Duration::from_millis(20),
        );

        let started = std::time::Instant::now();
        let err = hung.capture(&window).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::CaptureFailed);
        assert!(err.to_string().contains("timed out after 20ms"));
        assert!(started.elapsed() < Duration::from_millis(400));
        assert_eq!(hung.calls(), 1);
    }
}
