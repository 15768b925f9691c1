//! Tesseract command-line invoker
//!
//! Runs `tesseract <image> <base> -l <langs> --psm <n> tsv` and waits for it
//! under a timeout. The child is killed when the timeout elapses, and
//! `kill_on_drop` covers every other early exit.

use std::{
    path::{Path, PathBuf},
    process::Stdio,
};

use async_trait::async_trait;
use tokio::process::Command;

use super::OcrEngine;
use crate::{
    config::OcrConfig,
    error::{DetectError, DetectResult},
    util::temp_files::layout_path_for,
};

#[cfg(target_os = "windows")]
use windows_sys::Win32::System::Threading::CREATE_NO_WINDOW;

/// Tesseract output format producing one row per layout element
const OUTPUT_CONFIG: &str = "tsv";

/// Invokes the Tesseract executable
#[derive(Debug, Clone)]
pub struct TesseractCli {
    config: OcrConfig,
}

impl TesseractCli {
    pub fn new(config: OcrConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OcrConfig {
        &self.config
    }

    /// Arguments passed after the program name
    pub fn args(&self, image: &Path, output_base: &Path) -> Vec<std::ffi::OsString> {
        vec![
            image.as_os_str().to_os_string(),
            output_base.as_os_str().to_os_string(),
            "-l".into(),
            self.config.languages.clone().into(),
            "--psm".into(),
            self.config.page_seg_mode.to_string().into(),
            OUTPUT_CONFIG.into(),
        ]
    }

    fn command(&self, image: &Path, output_base: &Path) -> Command {
        let mut command = Command::new(&self.config.program);
        command
            .args(self.args(image, output_base))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(target_os = "windows")]
        command.creation_flags(CREATE_NO_WINDOW);

        command
    }

    fn timeout_ms(&self) -> u64 {
        self.config.timeout.as_millis().try_into().unwrap_or(u64::MAX)
    }
}

#[async_trait]
impl OcrEngine for TesseractCli {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn recognize(&self, image: &Path, output_base: &Path) -> DetectResult<PathBuf> {
        let program = self.config.program.display().to_string();
        tracing::debug!(
            "Running {} {:?} {:?} -l {} --psm {} {}",
            program,
            image,
            output_base,
            self.config.languages,
            self.config.page_seg_mode,
            OUTPUT_CONFIG
        );

        let mut child = self
            .command(image, output_base)
            .spawn()
            .map_err(|e| DetectError::OcrUnavailable {
                program: program.clone(),
                reason: e.to_string(),
            })?;

        // Drain stderr concurrently so a chatty engine cannot block on a full pipe
        let stderr_task = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let _ = tokio::io::AsyncReadExt::read_to_end(&mut stderr, &mut buf).await;
                buf
            })
        });

        let waited = tokio::time::timeout(self.config.timeout, child.wait()).await;
        let status = match waited {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                return Err(DetectError::OcrUnavailable {
                    program,
                    reason: format!("failed to wait for process: {e}"),
                });
            }
            Err(_) => {
                let duration_ms = self.timeout_ms();
                tracing::warn!("{} timed out after {}ms, killing it", program, duration_ms);
                if let Err(e) = child.kill().await {
                    tracing::warn!("Failed to kill {}: {}", program, e);
                }
                return Err(DetectError::OcrTimeout { duration_ms });
            }
        };

        if !status.success() {
            let stderr = match stderr_task {
                Some(task) => task.await.unwrap_or_default(),
                None => Vec::new(),
            };
            tracing::warn!(
                "{} exited with {}: {}",
                program,
                status,
                String::from_utf8_lossy(&stderr).trim()
            );
        }

        Ok(layout_path_for(output_base))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_command_line_shape() {
        let engine = TesseractCli::new(OcrConfig::default());
        let args = engine.args(Path::new("/tmp/frame.bmp"), Path::new("/tmp/frame_ocr"));

        let args: Vec<String> = args
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            ["/tmp/frame.bmp", "/tmp/frame_ocr", "-l", "jpn+eng", "--psm", "6", "tsv"]
        );
    }

    #[test]
    fn test_custom_languages_and_mode() {
        let engine = TesseractCli::new(OcrConfig {
            languages: "eng".to_string(),
            page_seg_mode: 11,
            ..OcrConfig::default()
        });
        let args = engine.args(Path::new("a.bmp"), Path::new("b"));

        assert_eq!(args[3], "eng");
        assert_eq!(args[5], "11");
    }

    #[tokio::test]
    async fn test_missing_program_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let engine = TesseractCli::new(OcrConfig {
            program: dir.path().join("no-such-tesseract"),
            ..OcrConfig::default()
        });

        let err = engine
            .recognize(&dir.path().join("frame.bmp"), &dir.path().join("frame_ocr"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OcrUnavailable);
        assert!(err.to_string().contains("no-such-tesseract"));
    }

    #[test]
    fn test_timeout_ms_from_config() {
        let engine = TesseractCli::new(OcrConfig {
            timeout: Duration::from_millis(1500),
            ..OcrConfig::default()
        });
        assert_eq!(engine.timeout_ms(), 1500);
    }
}
