//! Path utilities.
//!
//! - [`fs`]: Filesystem path normalization (`normalize_path_in`)

pub mod fs;

pub use fs::normalize_path_in;
