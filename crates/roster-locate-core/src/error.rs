//! Error types for roster detection
//!
//! Every stage of a detection attempt reports failure through
//! [`DetectError`]. The detection loop treats all of them as recoverable:
//! an error ends the current attempt, and the loop decides whether another
//! attempt is scheduled. Callers of the loop only see the final
//! [`DetectionOutcome`](crate::model::DetectionOutcome), which carries the
//! [`ErrorKind`] of the last failure for diagnostics.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Result type alias for detection operations
pub type DetectResult<T> = Result<T, DetectError>;

/// Coarse classification of a [`DetectError`].
///
/// Serialized in snake_case so it can be logged or embedded in JSON
/// diagnostics without exposing variant payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    WindowNotFound,
    EnumerationFailed,
    CaptureFailed,
    OcrUnavailable,
    OcrTimeout,
    LayoutParseFailed,
    RegionNotFound,
    InvalidParameter,
    BackendNotAvailable,
}

impl ErrorKind {
    /// Returns the kind as a snake_case string
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::WindowNotFound => "window_not_found",
            ErrorKind::EnumerationFailed => "enumeration_failed",
            ErrorKind::CaptureFailed => "capture_failed",
            ErrorKind::OcrUnavailable => "ocr_unavailable",
            ErrorKind::OcrTimeout => "ocr_timeout",
            ErrorKind::LayoutParseFailed => "layout_parse_failed",
            ErrorKind::RegionNotFound => "region_not_found",
            ErrorKind::InvalidParameter => "invalid_parameter",
            ErrorKind::BackendNotAvailable => "backend_not_available",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for every stage of a detection attempt
///
/// Payloads are plain strings so the error stays `Clone`; mocks hand the
/// same injected error out on every call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DetectError {
    /// No visible top-level window title contained a recognized substring
    #[error("No visible window title contains any of {patterns:?}")]
    WindowNotFound {
        /// Title substrings that were searched for
        patterns: Vec<String>,
    },

    /// The window system could not list windows or report a window's placement
    #[error("Window enumeration failed: {reason}")]
    EnumerationFailed {
        /// Error reported by the window system
        reason: String,
    },

    /// Neither capture strategy produced a frame, or the frame could not be written
    #[error("Window capture failed: {reason}")]
    CaptureFailed {
        /// What went wrong in the last strategy tried
        reason: String,
    },

    /// The OCR engine could not be launched
    #[error("OCR engine '{program}' could not be launched: {reason}")]
    OcrUnavailable {
        /// Program that was spawned
        program: String,
        /// Spawn error text
        reason: String,
    },

    /// The OCR engine did not exit within its time budget
    #[error("OCR engine timed out after {duration_ms}ms")]
    OcrTimeout {
        /// Timeout that elapsed
        duration_ms: u64,
    },

    /// The OCR layout file could not be opened or read
    #[error("Failed to read OCR layout {path:?}: {reason}")]
    LayoutParseFailed {
        /// Layout file path
        path: PathBuf,
        /// Underlying I/O error text
        reason: String,
    },

    /// No fragment matched the roster heuristics
    #[error("Roster region not found ({matched} of {fragments} fragments matched)")]
    RegionNotFound {
        /// Fragments produced by the layout parser
        fragments: usize,
        /// Fragments that satisfied at least one rule
        matched: usize,
    },

    /// A configuration value was rejected
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// Name of the parameter
        parameter: String,
        /// Why it was rejected
        reason: String,
    },

    /// No window/capture backend exists for this platform or session
    #[error("No capture backend available: {reason}")]
    BackendNotAvailable {
        /// Why the backend could not be created
        reason: String,
    },
}

impl DetectError {
    /// Shorthand for [`DetectError::CaptureFailed`]
    pub fn capture(reason: impl Into<String>) -> Self {
        DetectError::CaptureFailed {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`DetectError::EnumerationFailed`]
    pub fn enumeration(reason: impl Into<String>) -> Self {
        DetectError::EnumerationFailed {
            reason: reason.into(),
        }
    }

    /// Returns the coarse kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            DetectError::WindowNotFound { .. } => ErrorKind::WindowNotFound,
            DetectError::EnumerationFailed { .. } => ErrorKind::EnumerationFailed,
            DetectError::CaptureFailed { .. } => ErrorKind::CaptureFailed,
            DetectError::OcrUnavailable { .. } => ErrorKind::OcrUnavailable,
            DetectError::OcrTimeout { .. } => ErrorKind::OcrTimeout,
            DetectError::LayoutParseFailed { .. } => ErrorKind::LayoutParseFailed,
            DetectError::RegionNotFound { .. } => ErrorKind::RegionNotFound,
            DetectError::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            DetectError::BackendNotAvailable { .. } => ErrorKind::BackendNotAvailable,
        }
    }

    /// Whether a later attempt may succeed without user intervention
    ///
    /// The detection loop retries every error in watch mode regardless;
    /// this only shapes log severity and hints.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DetectError::WindowNotFound { .. }
                | DetectError::EnumerationFailed { .. }
                | DetectError::CaptureFailed { .. }
                | DetectError::OcrTimeout { .. }
                | DetectError::RegionNotFound { .. }
        )
    }

    /// Returns an actionable remediation hint for this error
    ///
    /// # Examples
    ///
    /// ```
    /// use roster_locate_core::error::DetectError;
    ///
    /// let error = DetectError::OcrUnavailable {
    ///     program: "tesseract".to_string(),
    ///     reason: "not found".to_string(),
    /// };
    /// assert!(error.remediation_hint().contains("ROSTER_LOCATE_TESSERACT"));
    /// ```
    pub fn remediation_hint(&self) -> &str {
        match self {
            DetectError::WindowNotFound { .. } => {
                "Start the game client and make sure its window is visible. Use --list-windows \
                 to see which titles are visible, and --window-title to match a custom title."
            }
            DetectError::EnumerationFailed { .. } => {
                "The window list could not be read. Check that the desktop session is unlocked \
                 and that the display server accepts connections."
            }
            DetectError::CaptureFailed { .. } => {
                "The window could not be captured. Keep the window on screen and unminimized, \
                 and avoid exclusive fullscreen mode."
            }
            DetectError::OcrUnavailable { .. } => {
                "Install Tesseract with the jpn and eng language data, or point \
                 ROSTER_LOCATE_TESSERACT / --tesseract at the executable."
            }
            DetectError::OcrTimeout { .. } => {
                "Tesseract took too long. Raise --ocr-timeout, or shrink the game window so the \
                 capture is smaller."
            }
            DetectError::LayoutParseFailed { .. } => {
                "Tesseract did not produce a TSV file. Check that the tsv config is available \
                 and that the temp directory is writable."
            }
            DetectError::RegionNotFound { .. } => {
                "Open the submarine list in the game so its rows are visible, then retry or use \
                 --watch."
            }
            DetectError::InvalidParameter { .. } => {
                "Check the flag value against `roster-locate --help`."
            }
            DetectError::BackendNotAvailable { .. } => {
                "Window capture is not supported in this session. Run inside a desktop session \
                 with a display server."
            }
        }
    }
}
