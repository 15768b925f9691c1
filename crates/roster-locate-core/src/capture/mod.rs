//! Window discovery and frame capture
//!
//! # Architecture
//!
//! - [`WindowEnumerator`] - list top-level windows, read a window's rect
//! - [`CaptureStrategy`] - render one window into pixels
//! - [`FrameCapturer`] - ordered strategy fallback plus BMP persistence
//! - [`Desktop`] - facade bundling an enumerator with its strategies
//!
//! ## Backends
//!
//! | Backend | Enumeration | Strategies (in order) |
//! |---------|-------------|-----------------------|
//! | Windows | `EnumWindows` | `PrintWindow`, `BitBlt` screen copy |
//! | xcap (X11, macOS) | `xcap::Window::all` | window capture, monitor crop |
//! | Mock | scripted | scripted |
//!
//! Use [`create_default_backend()`] for the current platform.

use std::time::Duration;

use crate::error::{DetectError, DetectResult};

pub mod composite;
pub mod constants;
pub mod frame;
pub mod matching;
pub mod mock;
pub mod traits;

#[cfg(target_os = "windows")]
pub mod windows_backend;

#[cfg(not(target_os = "windows"))]
pub mod xcap_backend;

pub use composite::{Desktop, desktop_from_mock};
#[cfg(target_os = "windows")]
pub use composite::desktop_from_windows;
#[cfg(not(target_os = "windows"))]
pub use composite::desktop_from_xcap;
pub use frame::{CapturedFrame, FrameCapturer};
pub use matching::{TitleMatcher, locate_window};
pub use mock::{MockDesktop, MockStrategy};
pub use traits::{CaptureStrategy, WindowEnumerator};

/// Creates the desktop backend for the current platform.
///
/// - **Windows**: Win32 enumeration with `PrintWindow` and screen-copy capture
/// - **Other**: xcap; fails with `BackendNotAvailable` when no display
///   server can be reached
pub fn create_default_backend() -> DetectResult<Desktop> {
    #[cfg(target_os = "windows")]
    {
        Ok(desktop_from_windows())
    }

    #[cfg(not(target_os = "windows"))]
    {
        xcap_backend::check_display()?;
        Ok(desktop_from_xcap())
    }
}

/// Runs a blocking desktop call on the blocking pool under a timeout
///
/// The pipeline awaits the result immediately, so no two stages overlap.
/// Timeouts and panics are reported through `fail`, which picks the error
/// variant for the calling stage.
///
/// A call that times out is abandoned, not cancelled: the thread keeps
/// running until the OS call returns. Runtimes driving the pipeline must be
/// shut down with `shutdown_background` so an abandoned call cannot hold up
/// process exit.
pub(crate) async fn run_blocking<F, T>(
    label: &'static str,
    timeout_ms: u64,
    fail: fn(String) -> DetectError,
    f: F,
) -> DetectResult<T>
where
    F: FnOnce() -> DetectResult<T> + Send + 'static,
    T: Send + 'static,
{
    let task = tokio::task::spawn_blocking(f);
    match tokio::time::timeout(Duration::from_millis(timeout_ms), task).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            tracing::error!("{} task panicked: {}", label, e);
            Err(fail(format!("{label} task failed: {e}")))
        }
        Err(_) => {
            tracing::warn!("{} timed out after {}ms, abandoning it", label, timeout_ms);
            Err(fail(format!("{label} timed out after {timeout_ms}ms")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn test_run_blocking_returns_value() {
        let value = run_blocking("answer", 1000, DetectError::capture, || Ok(42)).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_run_blocking_passes_errors() {
        let err = run_blocking::<_, ()>("fail", 1000, DetectError::capture, || {
            Err(DetectError::capture("GetDIBits failed"))
        })
        .await
        .unwrap_err();
        assert!(err.to_string().contains("GetDIBits"));
    }

    #[tokio::test]
    async fn test_run_blocking_times_out() {
        let err = run_blocking("sleepy", 10, DetectError::capture, || {
            std::thread::sleep(Duration::from_millis(500));
            Ok(())
        })
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CaptureFailed);
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_run_blocking_uses_stage_error() {
        let err = run_blocking("list_windows", 10, DetectError::enumeration, || {
            std::thread::sleep(Duration::from_millis(500));
            Ok(Vec::<u32>::new())
        })
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EnumerationFailed);
    }
}
