//! Timeouts for blocking desktop operations
//!
//! Enumeration and capture run on the blocking thread pool. If the window
//! system stops responding the attempt fails with `CaptureFailed` instead
//! of hanging the detection loop; the stuck blocking task is abandoned.
//!
//! ## Windows
//! - `PrintWindow` with full-content rendering waits for DWM composition and
//!   can take a few hundred milliseconds for large windows
//!
//! ## X11 / macOS (xcap)
//! - Window capture is usually well under 500ms
//! - The screen-region fallback grabs a whole monitor and crops it

/// Timeout for enumerating top-level windows.
pub const LIST_WINDOWS_TIMEOUT_MS: u64 = 1500;

/// Timeout for one capture strategy on one window.
pub const CAPTURE_TIMEOUT_MS: u64 = 5000;
