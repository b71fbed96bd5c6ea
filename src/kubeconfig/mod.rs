//! Layered kubeconfig documents with origin tracking.
//!
//! `KUBECONFIG` may name several files. Reads see them as one logical document (first
//! file wins), but every change has to be written back to the one file it belongs to.
//! This module provides:
//!
//! - [`ConfigDocument`] - one parsed file (or the computed merged view)
//! - [`ConfigSnippet`] - a route to a subtree of one specific document
//! - [`LayeredConfigStore`] - the ordered documents, the merged view, and persistence
//!
//! # Example
//!
//! ```rust,no_run
//! use oc_auth::kubeconfig::LayeredConfigStore;
//! use serde_yaml::Value;
//! use std::path::PathBuf;
//!
//! # fn example() -> anyhow::Result<()> {
//! let mut store = LayeredConfigStore::load(&[PathBuf::from("/home/me/.kube/config")])?;
//!
//! if let Some(mut user) = store.find_named("users", "me/auth") {
//!     store.update(&mut user, |node| node["user"]["token"] = Value::from("sha256~abc"))?;
//!     store.persist(&mut user)?;
//! }
//! # Ok(())
//! # }
//! ```

mod document;
mod layout;
mod store;

pub use document::{ConfigDocument, ConfigSnippet, Origin, TreePath};
pub use store::LayeredConfigStore;

/// Top-level key of the context list.
pub const CONTEXTS: &str = "contexts";
/// Top-level key of the user (credential) list.
pub const USERS: &str = "users";
/// Top-level key of the cluster list.
pub const CLUSTERS: &str = "clusters";
/// Top-level key naming the selected context.
pub const CURRENT_CONTEXT: &str = "current-context";
