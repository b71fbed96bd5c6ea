//! oc-auth - OpenShift OAuth token refresher
//!
//! Logs in to an OpenShift cluster through the OAuth2 implicit grant and stores the
//! resulting bearer token in a kubeconfig user entry, the way `oc login` does for
//! password logins.
//!
//! # Architecture Overview
//!
//! One run goes through three stages:
//! 1. The kubeconfig files named by `KUBECONFIG` are loaded into a
//!    [`kubeconfig::LayeredConfigStore`], keeping track of which file each entry came from
//! 2. The [`credentials`] resolver finds (or creates) the context and user and finds the
//!    cluster
//! 3. The [`oauth`] client discovers the authorization server of the cluster and runs the
//!    implicit grant; the token is written back to the file the user entry lives in
//!
//! Files that were not changed are never rewritten.
//!
//! # Core Modules
//!
//! - [`cli`] - Command-line parsing and the run entry point
//! - [`config`] - `KUBECONFIG` parsing and default paths
//! - [`core`] - Error types and user-facing error rendering
//! - [`credentials`] - Context, user and cluster resolution, and the refresh itself
//! - [`kubeconfig`] - Layered documents, snippets and atomic persistence
//! - [`oauth`] - Discovery, the implicit-grant client and fragment parsing
//! - [`utils`] - Platform helpers and atomic file writes
//!
//! # Command-Line Usage
//!
//! ```bash
//! # Refresh the token of the current context
//! oc-auth -u developer -p secret
//!
//! # Work on a specific context, creating it if needed
//! oc-auth -u developer -p secret --context work --cluster prod --credential developer
//!
//! # Several kubeconfig files, the first one wins
//! KUBECONFIG=~/.kube/work:~/.kube/config oc-auth -u developer -p secret
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod credentials;
pub mod kubeconfig;
pub mod oauth;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
