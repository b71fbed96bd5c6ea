//! Core types shared by every part of oc-auth.
//!
//! At the moment this is the error system:
//! - [`OcAuthError`] - Enumerated error types for each failure mode of a run
//! - [`ErrorContext`] - User-friendly error wrapper with suggestions and details
//! - [`user_friendly_error`] - Convert any error to the user-friendly format

pub mod error;

pub use error::{ErrorContext, OcAuthError, user_friendly_error};

/// Result alias for the typed layers of the crate.
pub type Result<T, E = OcAuthError> = std::result::Result<T, E>;
