//! File system utilities.
//!
//! - **Atomic operations**: files are written to a sibling temp file and renamed into
//!   place, so readers never see partially written kubeconfigs

pub mod atomic;

pub use atomic::{atomic_write, safe_write};
