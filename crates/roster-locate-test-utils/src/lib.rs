//! Test utilities for roster-locate integration tests
//!
//! Shared fixtures for the core crate's `tests/` directory. The crate does
//! not depend on `roster-locate-core`, so it can sit in the core crate's
//! dev-dependencies without pulling in a second copy of it.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! roster-locate-test-utils = { path = "../roster-locate-test-utils" }
//! ```
//!
//! # Modules
//!
//! - [`tsv`]: builder for Tesseract TSV layouts
//! - [`timing`]: duration measurement and assertions
//! - [`fake_engine`]: shell script standing in for the `tesseract` binary
//!   (Unix only)
//!
//! ## Fake OCR engine
//!
//! ```ignore
//! use roster_locate_test_utils::{fake_engine::FakeTesseract, tsv::TsvBuilder};
//!
//! let layout = TsvBuilder::new().word(10, 20, 30, 10, "12分").build();
//! let fake = FakeTesseract::emitting(&layout).unwrap();
//! // point OcrConfig::program at fake.program()
//! ```

pub mod timing;
pub mod tsv;

#[cfg(unix)]
pub mod fake_engine;
