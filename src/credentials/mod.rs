//! Credential resolution for a token refresh.
//!
//! A run works on three kubeconfig entries:
//!
//! | Entry   | Lookup                                  | When missing                       |
//! |---------|-----------------------------------------|------------------------------------|
//! | context | `--context`, else `current-context`     | created if cluster + credential given |
//! | user    | the context's `user` field              | created with an empty token        |
//! | cluster | the context's `cluster` field           | error, never created               |
//!
//! Every lookup searches the documents in priority order and the first match wins.
//! Created entries go to the highest-priority document.
//!
//! [`refresh_token`] chains the lookups with the OAuth login and writes the new token
//! back to the file the user entry lives in.

mod refresh;
mod resolver;

pub use refresh::{RefreshOutcome, RefreshRequest, refresh_token};
pub use resolver::{DEFAULT_NAMESPACE, resolve_cluster, resolve_context, resolve_user};
