//! Error handling for oc-auth
//!
//! This module provides the error type used across the crate and the user-friendly
//! rendering used at the process boundary. The error system follows two rules:
//! 1. **Strongly-typed errors** for the store, the credential resolver and the OAuth client
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! - [`OcAuthError`] - Enumerated error types for every failure case of a run
//! - [`ErrorContext`] - Wrapper that adds suggestions and details for display
//!
//! # Error Categories
//!
//! - **Configuration files**: [`OcAuthError::ConfigFileError`], [`OcAuthError::DocumentNotFound`],
//!   [`OcAuthError::ComputedNotPersistable`], [`OcAuthError::InvalidEntry`]
//! - **Kubeconfig lookups**: [`OcAuthError::ContextNotFound`], [`OcAuthError::UserNotFound`],
//!   [`OcAuthError::ClusterNotFound`]
//! - **OAuth exchange**: [`OcAuthError::DiscoveryError`], [`OcAuthError::AuthenticationError`]
//!
//! Use [`user_friendly_error`] to convert any [`anyhow::Error`] into an [`ErrorContext`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use oc_auth::core::{OcAuthError, user_friendly_error};
//!
//! let error = OcAuthError::ClusterNotFound {
//!     name: "production".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display(); // Shows colored error with suggestions
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for oc-auth operations
///
/// Every variant names the entity or file involved so the message printed at exit is
/// enough to act on. HTTP failures carry the status and the response body.
#[derive(Error, Debug)]
pub enum OcAuthError {
    /// A kubeconfig file exists but cannot be read or parsed
    #[error("Cannot load kubeconfig file {path}: {reason}")]
    ConfigFileError {
        /// Path of the offending file
        path: String,
        /// Why reading or parsing failed
        reason: String,
    },

    /// No loaded document shares the origin of a snippet
    #[error("Source config for {origin} was not found")]
    DocumentNotFound {
        /// Display form of the snippet's origin
        origin: String,
    },

    /// Attempted to write the computed (merged) view to disk
    #[error("The merged kubeconfig view is computed in memory and cannot be persisted")]
    ComputedNotPersistable,

    /// A kubeconfig entry exists but does not have the expected shape
    #[error("Invalid kubeconfig entry {entry}: {reason}")]
    InvalidEntry {
        /// Which entry was malformed (e.g. "cluster 'dev'")
        entry: String,
        /// What is wrong with it
        reason: String,
    },

    /// Context could not be found or created
    #[error("No context '{name}' found in kubeconfig")]
    ContextNotFound {
        /// Requested context name (empty when no current context is set)
        name: String,
    },

    /// User could not be found or created
    #[error("No user '{name}' found in kubeconfig")]
    UserNotFound {
        /// Requested user name
        name: String,
    },

    /// Cluster could not be found. Clusters are never created.
    #[error("No cluster '{name}' found in kubeconfig")]
    ClusterNotFound {
        /// Requested cluster name
        name: String,
    },

    /// Authorization server metadata could not be fetched or parsed
    #[error("OAuth discovery failed for {url}: {reason}")]
    DiscoveryError {
        /// Discovery document URL
        url: String,
        /// Status, body, or parse failure
        reason: String,
    },

    /// The implicit-grant exchange did not yield a token
    #[error("Authentication failed: {reason}")]
    AuthenticationError {
        /// Status, body, or fragment problem
        reason: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML (de)serialization error
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Other error
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

impl Clone for OcAuthError {
    fn clone(&self) -> Self {
        match self {
            Self::ConfigFileError {
                path,
                reason,
            } => Self::ConfigFileError {
                path: path.clone(),
                reason: reason.clone(),
            },
            Self::DocumentNotFound {
                origin,
            } => Self::DocumentNotFound {
                origin: origin.clone(),
            },
            Self::ComputedNotPersistable => Self::ComputedNotPersistable,
            Self::InvalidEntry {
                entry,
                reason,
            } => Self::InvalidEntry {
                entry: entry.clone(),
                reason: reason.clone(),
            },
            Self::ContextNotFound {
                name,
            } => Self::ContextNotFound {
                name: name.clone(),
            },
            Self::UserNotFound {
                name,
            } => Self::UserNotFound {
                name: name.clone(),
            },
            Self::ClusterNotFound {
                name,
            } => Self::ClusterNotFound {
                name: name.clone(),
            },
            Self::DiscoveryError {
                url,
                reason,
            } => Self::DiscoveryError {
                url: url.clone(),
                reason: reason.clone(),
            },
            Self::AuthenticationError {
                reason,
            } => Self::AuthenticationError {
                reason: reason.clone(),
            },
            // For errors that don't implement Clone, convert to Other
            Self::IoError(e) => Self::Other {
                message: format!("IO error: {e}"),
            },
            Self::YamlError(e) => Self::Other {
                message: format!("YAML error: {e}"),
            },
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

/// Error context wrapper that provides user-friendly error information
///
/// When displayed, errors show:
/// 1. **Error**: The main error message in red
/// 2. **Details**: Additional context in yellow (optional)
/// 3. **Suggestion**: Actionable steps in green (optional)
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: OcAuthError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: OcAuthError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions
///
/// Recognizes [`OcAuthError`] anywhere in the error chain (so `.context(...)` wrapping
/// at the CLI layer does not hide it), [`std::io::Error`] and [`reqwest::Error`].
/// Anything else is rendered with its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(oc_error) = error.chain().find_map(|cause| cause.downcast_ref::<OcAuthError>()) {
        return create_error_context(oc_error.clone());
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        if io_error.kind() == std::io::ErrorKind::PermissionDenied {
            return ErrorContext::new(OcAuthError::Other {
                message: format!("Permission denied: {io_error}"),
            })
            .with_suggestion("Check the ownership and permissions of your kubeconfig files");
        }
    }

    if let Some(http_error) = error.chain().find_map(|cause| cause.downcast_ref::<reqwest::Error>())
    {
        let suggestion = if http_error.is_connect() || http_error.is_timeout() {
            "Check that the cluster server URL is reachable from this machine"
        } else {
            "Re-run with --verbose to see the requests that were made"
        };
        return ErrorContext::new(OcAuthError::Other {
            message: chain_message(&error),
        })
        .with_suggestion(suggestion);
    }

    ErrorContext::new(OcAuthError::Other {
        message: chain_message(&error),
    })
}

fn chain_message(error: &anyhow::Error) -> String {
    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }
    message
}

/// Map each [`OcAuthError`] variant to suggestions and details.
fn create_error_context(error: OcAuthError) -> ErrorContext {
    match &error {
        OcAuthError::ConfigFileError { path, .. } => ErrorContext::new(error.clone())
            .with_suggestion(format!("Check the YAML syntax in {path}, or remove it from KUBECONFIG"))
            .with_details("Every file listed in KUBECONFIG that exists must be valid YAML"),

        OcAuthError::ContextNotFound { name } if name.is_empty() => ErrorContext::new(error.clone())
            .with_suggestion("Pass --context, or set current-context in your kubeconfig")
            .with_details("No context name was given and the kubeconfig has no current-context"),

        OcAuthError::ContextNotFound { .. } => ErrorContext::new(error.clone())
            .with_suggestion("Pass --cluster and --credential so the context can be created")
            .with_details("Contexts are searched in every file listed in KUBECONFIG, first file first"),

        OcAuthError::ClusterNotFound { name } => ErrorContext::new(error.clone())
            .with_suggestion(format!(
                "Add a cluster named '{name}' with its server URL under 'clusters' in your kubeconfig"
            ))
            .with_details("Cluster connection info cannot be guessed, so clusters are never created"),

        OcAuthError::UserNotFound { .. } => ErrorContext::new(error.clone())
            .with_suggestion("Create ~/.kube/config or point KUBECONFIG at an existing file")
            .with_details("New users are written to the first kubeconfig file, but none was loaded"),

        OcAuthError::DiscoveryError { .. } => ErrorContext::new(error.clone())
            .with_suggestion("Check the cluster server URL, or use --insecure for self-signed certificates")
            .with_details("The server must expose /.well-known/oauth-authorization-server"),

        OcAuthError::AuthenticationError { .. } => ErrorContext::new(error.clone())
            .with_suggestion("Check your username and password")
            .with_details("The token is read from the fragment of the URL the server redirects to"),

        _ => ErrorContext::new(error.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_error_display() {
        let error = OcAuthError::ContextNotFound {
            name: "dev".to_string(),
        };
        assert_eq!(error.to_string(), "No context 'dev' found in kubeconfig");

        let error = OcAuthError::ClusterNotFound {
            name: "prod".to_string(),
        };
        assert_eq!(error.to_string(), "No cluster 'prod' found in kubeconfig");

        let error = OcAuthError::AuthenticationError {
            reason: "HTTP 401 Unauthorized".to_string(),
        };
        assert_eq!(error.to_string(), "Authentication failed: HTTP 401 Unauthorized");
    }

    #[test]
    fn test_error_context_display() {
        let ctx = ErrorContext::new(OcAuthError::ComputedNotPersistable)
            .with_details("merged")
            .with_suggestion("persist a file snippet");

        let display = format!("{ctx}");
        assert!(display.contains("cannot be persisted"));
        assert!(display.contains("Details: merged"));
        assert!(display.contains("Suggestion: persist a file snippet"));
    }

    #[test]
    fn test_user_friendly_error_sees_through_context() {
        let error = Err::<(), _>(OcAuthError::ClusterNotFound {
            name: "dev".to_string(),
        })
        .context("Failed to resolve credentials")
        .unwrap_err();

        let ctx = user_friendly_error(error);
        assert!(matches!(ctx.error, OcAuthError::ClusterNotFound { .. }));
        assert!(ctx.suggestion.unwrap().contains("'dev'"));
    }

    #[test]
    fn test_user_friendly_error_generic_chain() {
        let error = anyhow::anyhow!("root cause").context("outer");
        let ctx = user_friendly_error(error);
        match ctx.error {
            OcAuthError::Other {
                message,
            } => {
                assert!(message.starts_with("outer"));
                assert!(message.contains("1: root cause"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_context_name_suggests_flag() {
        let ctx = user_friendly_error(
            OcAuthError::ContextNotFound {
                name: String::new(),
            }
            .into(),
        );
        assert!(ctx.suggestion.unwrap().contains("--context"));
    }
}
