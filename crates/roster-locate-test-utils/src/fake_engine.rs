//! Shell script standing in for the `tesseract` binary
//!
//! The script accepts the same positional arguments as the real engine
//! (`<image> <output_base> -l <langs> --psm <n> tsv`), records them one per
//! line in `args.log` and then behaves as configured. It lives in its own
//! temporary directory, removed when the [`FakeTesseract`] is dropped.

use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

const SCRIPT_NAME: &str = "fake-tesseract";
const ARGS_LOG: &str = "args.log";
const LAYOUT_FIXTURE: &str = "layout.tsv";

/// What the fake engine does after recording its arguments
#[derive(Debug, Clone, PartialEq)]
pub enum Behavior {
    /// Writes the layout to `<output_base>.tsv` and exits 0
    Emit(String),
    /// Writes the layout, then exits with the given nonzero code
    EmitAndFail(String, i32),
    /// Prints `message` to stderr and exits with `code`, writing nothing
    Fail { code: i32, message: String },
    /// Sleeps for the given number of seconds without writing anything
    Hang(u32),
}

/// An installed fake engine
#[derive(Debug)]
pub struct FakeTesseract {
    dir: TempDir,
    program: PathBuf,
}

impl FakeTesseract {
    pub fn install(behavior: Behavior) -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("fake-tesseract").tempdir()?;
        let program = dir.path().join(SCRIPT_NAME);
        let args_log = dir.path().join(ARGS_LOG);

        let body = match &behavior {
            Behavior::Emit(layout) => {
                let fixture = write_fixture(dir.path(), layout)?;
                format!("cp {} \"$2.tsv\"\n", quote(&fixture))
            }
            Behavior::EmitAndFail(layout, code) => {
                let fixture = write_fixture(dir.path(), layout)?;
                format!(
                    "cp {} \"$2.tsv\"\necho 'warning: partial result' >&2\nexit {code}\n",
                    quote(&fixture)
                )
            }
            Behavior::Fail { code, message } => {
                format!("echo {} >&2\nexit {code}\n", quote_str(message))
            }
            Behavior::Hang(secs) => format!("exec sleep {secs}\n"),
        };

        let script = format!(
            "#!/bin/sh\nprintf '%s\\n' \"$@\" > {}\n{body}",
            quote(&args_log)
        );
        fs::write(&program, script)?;
        fs::set_permissions(&program, fs::Permissions::from_mode(0o755))?;

        Ok(Self { dir, program })
    }

    pub fn emitting(layout: &str) -> io::Result<Self> {
        Self::install(Behavior::Emit(layout.to_string()))
    }

    pub fn failing(code: i32, message: &str) -> io::Result<Self> {
        Self::install(Behavior::Fail {
            code,
            message: message.to_string(),
        })
    }

    pub fn hanging(secs: u32) -> io::Result<Self> {
        Self::install(Behavior::Hang(secs))
    }

    /// Path to pass as the OCR program
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments of the most recent invocation; empty if never run
    pub fn recorded_args(&self) -> Vec<String> {
        fs::read_to_string(self.dir.path().join(ARGS_LOG))
            .map(|log| log.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

fn write_fixture(dir: &Path, layout: &str) -> io::Result<PathBuf> {
    let path = dir.join(LAYOUT_FIXTURE);
    fs::write(&path, layout)?;
    Ok(path)
}

fn quote(path: &Path) -> String {
    quote_str(&path.to_string_lossy())
}

fn quote_str(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
