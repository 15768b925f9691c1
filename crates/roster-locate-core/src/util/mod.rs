//! Utility modules
//!
//! - [`encode`] - BMP serialization of captured frames
//! - [`temp_files`] - Per-attempt artifact naming and cleanup

pub mod encode;
pub mod temp_files;
