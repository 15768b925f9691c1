//! Temporary artifact naming and cleanup
//!
//! Each detection attempt writes two files: the captured frame and the OCR
//! layout output. [`RunContext`] decides where they go and how they are
//! named; [`AttemptArtifacts`] tracks the paths of one attempt and deletes
//! them when the attempt is over.
//!
//! Names combine a UTC timestamp taken when the run starts, the process id
//! and the attempt number, so concurrent invocations of the tool never
//! collide and no locking is needed.
//!
//! # Examples
//!
//! ```
//! use roster_locate_core::util::temp_files::RunContext;
//!
//! let dir = std::env::temp_dir();
//! let context = RunContext::new(&dir);
//! let artifacts = context.artifacts(1);
//!
//! assert!(artifacts.image_path().extension().is_some_and(|e| e == "bmp"));
//! assert!(artifacts.layout_path().to_string_lossy().ends_with(".tsv"));
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};

use crate::config::ARTIFACT_PREFIX;

/// Paths and naming discriminator shared by all attempts of one run
#[derive(Debug, Clone)]
pub struct RunContext {
    temp_dir: PathBuf,
    started_at: DateTime<Utc>,
    pid: u32,
}

impl RunContext {
    /// Creates a context rooted at `temp_dir`, stamped with the current time
    pub fn new(temp_dir: impl Into<PathBuf>) -> Self {
        Self::with_timestamp(temp_dir, Utc::now())
    }

    /// Creates a context with an explicit timestamp
    pub fn with_timestamp(temp_dir: impl Into<PathBuf>, started_at: DateTime<Utc>) -> Self {
        Self {
            temp_dir: temp_dir.into(),
            started_at,
            pid: std::process::id(),
        }
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// File stem shared by both artifacts of `attempt`
    ///
    /// Format: `roster_auto_{yyyymmddThhmmssSSS}_{pid}_{attempt}`
    fn stem(&self, attempt: u32) -> String {
        format!(
            "{}_{}_{}_{}",
            ARTIFACT_PREFIX,
            self.started_at.format("%Y%m%dT%H%M%S%3f"),
            self.pid,
            attempt
        )
    }

    /// Reserves artifact paths for one attempt
    ///
    /// Nothing is created on disk; the returned tracker deletes whatever the
    /// attempt ends up writing.
    pub fn artifacts(&self, attempt: u32) -> AttemptArtifacts {
        let stem = self.stem(attempt);
        let image_path = self.temp_dir.join(format!("{stem}.bmp"));
        let layout_base = self.temp_dir.join(format!("{stem}_ocr"));
        AttemptArtifacts::new(image_path, layout_base)
    }
}

/// Files belonging to one detection attempt
///
/// Cleanup is best-effort: failures are logged and never abort detection.
/// Dropping the tracker cleans up as well, so every exit path of an
/// attempt releases its files.
#[derive(Debug)]
pub struct AttemptArtifacts {
    image_path: PathBuf,
    layout_base: PathBuf,
    tracked: Vec<PathBuf>,
}

impl AttemptArtifacts {
    fn new(image_path: PathBuf, layout_base: PathBuf) -> Self {
        let layout_path = layout_path_for(&layout_base);
        Self {
            tracked: vec![image_path.clone(), layout_path],
            image_path,
            layout_base,
        }
    }

    /// Where the captured frame is written
    pub fn image_path(&self) -> &Path {
        &self.image_path
    }

    /// Output base handed to the OCR engine (without extension)
    pub fn layout_base(&self) -> &Path {
        &self.layout_base
    }

    /// Where the OCR engine writes its TSV output
    pub fn layout_path(&self) -> PathBuf {
        layout_path_for(&self.layout_base)
    }

    /// Adds an extra file produced during the attempt
    pub fn track(&mut self, path: impl Into<PathBuf>) {
        self.tracked.push(path.into());
    }

    /// Paths that will be removed on cleanup
    pub fn tracked(&self) -> &[PathBuf] {
        &self.tracked
    }

    /// Removes every tracked file that exists
    ///
    /// The list is emptied, so files tracked afterwards are cleaned up by
    /// the next call or on drop.
    pub fn cleanup(&mut self) {
        for path in self.tracked.drain(..) {
            if !path.exists() {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => tracing::trace!("Removed temp file {:?}", path),
                Err(e) => tracing::warn!("Failed to remove temp file {:?}: {}", path, e),
            }
        }
    }
}

impl Drop for AttemptArtifacts {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Tesseract appends the output format's extension to the output base
pub fn layout_path_for(base: &Path) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(".tsv");
    PathBuf::from(name)
}
