//! Cross-platform utilities and helpers
//!
//! # Modules
//!
//! - [`fs`] - File system operations with atomic writes
//! - [`platform`] - Platform-specific helpers (home directory, path list separator)

pub mod fs;
pub mod platform;

pub use fs::{atomic_write, safe_write};
pub use platform::{expand_tilde, get_home_dir, is_windows, path_list_separator};
