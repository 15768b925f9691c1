//! roster-locate-core: finds the submarine roster panel on screen
//!
//! Captures the game client's window, runs Tesseract over the capture and
//! clusters the recognized text that looks like roster rows into a single
//! rectangle in absolute screen coordinates.
//!
//! The pipeline is sequential: [`capture`] locates and captures the window,
//! [`ocr`] runs the engine and parses its TSV layout, [`region`] infers the
//! rectangle, and [`detector`] ties the stages together in a retry loop.

pub mod capture;
pub mod config;
pub mod detector;
pub mod error;
pub mod model;
pub mod ocr;
pub mod region;
pub mod util;

pub use detector::Detector;
pub use error::{DetectError, DetectResult, ErrorKind};
pub use model::{DetectionOutcome, Rectangle};
