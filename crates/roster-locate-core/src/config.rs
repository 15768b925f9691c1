//! Defaults and runtime configuration for detection.
//!
//! Constants hold the built-in defaults. A few of them can be overridden
//! through environment variables; command-line flags in turn override the
//! environment. The assembled [`DetectorConfig`] is passed explicitly to the
//! detector, so no stage reads the environment on its own.
//!
//! | Environment Variable | Default | Description |
//! |----------------------|---------|-------------|
//! | `ROSTER_LOCATE_TESSERACT` | `tesseract` | OCR engine executable |
//! | `ROSTER_LOCATE_OCR_LANG` | `jpn+eng` | Tesseract language spec |
//! | `ROSTER_LOCATE_OCR_TIMEOUT_MS` | 120000 | OCR process timeout |
//! | `ROSTER_LOCATE_TEMP_DIR` | system temp dir | Where capture and OCR files go |

use std::{path::PathBuf, time::Duration};

/// Spacing between attempts in watch mode.
pub const DEFAULT_RETRY_INTERVAL_MS: u64 = 20_000;

/// Overall deadline for the detection loop, checked between attempts.
pub const DEFAULT_DETECT_TIMEOUT_MS: u64 = 300_000;

/// Upper bound on one OCR engine run.
///
/// Tesseract with two language models on a full 4K window can take well over
/// a minute on slow machines.
pub const DEFAULT_OCR_TIMEOUT_MS: u64 = 120_000;

/// Margin added around the union of matched fragments.
pub const DEFAULT_PADDING: i32 = 8;

pub const DEFAULT_OCR_PROGRAM: &str = "tesseract";

/// Japanese first so logographic time units win ties against Latin lookalikes.
pub const DEFAULT_OCR_LANGUAGES: &str = "jpn+eng";

/// Tesseract `--psm 6`: assume a single uniform block of text.
pub const DEFAULT_PAGE_SEG_MODE: u8 = 6;

/// Window title substrings identifying the game client.
pub const DEFAULT_TITLE_PATTERNS: &[&str] =
    &["FINAL FANTASY XIV", "ファイナルファンタジーXIV", "FFXIV"];

/// File name prefix for capture and OCR artifacts.
pub const ARTIFACT_PREFIX: &str = "roster_auto";

pub const ENV_OCR_PROGRAM: &str = "ROSTER_LOCATE_TESSERACT";
pub const ENV_OCR_LANGUAGES: &str = "ROSTER_LOCATE_OCR_LANG";
pub const ENV_OCR_TIMEOUT_MS: &str = "ROSTER_LOCATE_OCR_TIMEOUT_MS";
pub const ENV_TEMP_DIR: &str = "ROSTER_LOCATE_TEMP_DIR";

// =============================================================================
// Environment Variable Overrides
// =============================================================================

fn get_u64_from_env(env_var: &str, default: u64) -> u64 {
    std::env::var(env_var)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn get_string_from_env(env_var: &str) -> Option<String> {
    std::env::var(env_var)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// OCR executable, overridable with `ROSTER_LOCATE_TESSERACT`.
pub fn ocr_program() -> PathBuf {
    get_string_from_env(ENV_OCR_PROGRAM)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OCR_PROGRAM))
}

/// OCR language spec, overridable with `ROSTER_LOCATE_OCR_LANG`.
pub fn ocr_languages() -> String {
    get_string_from_env(ENV_OCR_LANGUAGES).unwrap_or_else(|| DEFAULT_OCR_LANGUAGES.to_string())
}

/// OCR timeout, overridable with `ROSTER_LOCATE_OCR_TIMEOUT_MS`.
///
/// A value of zero is rejected and falls back to the default.
pub fn ocr_timeout_ms() -> u64 {
    match get_u64_from_env(ENV_OCR_TIMEOUT_MS, DEFAULT_OCR_TIMEOUT_MS) {
        0 => DEFAULT_OCR_TIMEOUT_MS,
        ms => ms,
    }
}

/// Artifact directory, overridable with `ROSTER_LOCATE_TEMP_DIR`.
pub fn temp_dir() -> PathBuf {
    get_string_from_env(ENV_TEMP_DIR)
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
}

// =============================================================================
// Configuration Structures
// =============================================================================

/// Retry behavior of the detection loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopConfig {
    /// Retry after a failed attempt instead of giving up immediately
    pub watch: bool,
    pub interval: Duration,
    /// Elapsed time after which no further attempt is started
    pub timeout: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            watch: false,
            interval: Duration::from_millis(DEFAULT_RETRY_INTERVAL_MS),
            timeout: Duration::from_millis(DEFAULT_DETECT_TIMEOUT_MS),
        }
    }
}

/// How the OCR engine is invoked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrConfig {
    pub program: PathBuf,
    pub languages: String,
    pub page_seg_mode: u8,
    pub timeout: Duration,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_OCR_PROGRAM),
            languages: DEFAULT_OCR_LANGUAGES.to_string(),
            page_seg_mode: DEFAULT_PAGE_SEG_MODE,
            timeout: Duration::from_millis(DEFAULT_OCR_TIMEOUT_MS),
        }
    }
}

impl OcrConfig {
    /// Defaults with environment overrides applied
    pub fn from_env() -> Self {
        Self {
            program: ocr_program(),
            languages: ocr_languages(),
            page_seg_mode: DEFAULT_PAGE_SEG_MODE,
            timeout: Duration::from_millis(ocr_timeout_ms()),
        }
    }
}

/// Region inference tuning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionConfig {
    pub padding: i32,
    /// Include every fragment on a line that has at least one match
    pub group_lines: bool,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            padding: DEFAULT_PADDING,
            group_lines: false,
        }
    }
}

/// Everything the detector needs, assembled once per run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectorConfig {
    pub retry: LoopConfig,
    pub ocr: OcrConfig,
    pub region: RegionConfig,
    pub title_patterns: Vec<String>,
    pub temp_dir: PathBuf,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            retry: LoopConfig::default(),
            ocr: OcrConfig::default(),
            region: RegionConfig::default(),
            title_patterns: default_title_patterns(),
            temp_dir: std::env::temp_dir(),
        }
    }
}

impl DetectorConfig {
    /// Defaults with environment overrides applied
    pub fn from_env() -> Self {
        Self {
            ocr: OcrConfig::from_env(),
            temp_dir: temp_dir(),
            ..Self::default()
        }
    }
}

pub fn default_title_patterns() -> Vec<String> {
    DEFAULT_TITLE_PATTERNS.iter().map(|s| s.to_string()).collect()
}
