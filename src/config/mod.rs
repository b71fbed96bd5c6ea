//! Kubeconfig location resolution
//!
//! oc-auth reads and writes kubeconfig files, and which files it touches is decided the
//! same way `kubectl` decides it:
//!
//! 1. The `KUBECONFIG` environment variable (or the `--kubeconfig` flag, which overrides
//!    it), an ordered list of paths separated by `:` (`;` on Windows). The first entry
//!    has the highest priority.
//! 2. When the list is unset or contains only blank entries, the single default path
//!    `~/.kube/config`.
//!
//! Entries that do not exist are not an error here; the store skips them when loading.
//!
//! # Examples
//!
//! ```rust,no_run
//! use oc_auth::config::kubeconfig_paths;
//!
//! # fn example() -> anyhow::Result<()> {
//! let paths = kubeconfig_paths(Some("/etc/kube/admin:~/.kube/config"))?;
//! assert_eq!(paths.len(), 2);
//! # Ok(())
//! # }
//! ```

use crate::utils::platform::{expand_tilde, get_home_dir, path_list_separator};
use anyhow::Result;
use std::path::PathBuf;

/// Name of the environment variable holding the kubeconfig path list.
pub const KUBECONFIG_ENV: &str = "KUBECONFIG";

/// Get the default kubeconfig path (`~/.kube/config`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn default_kubeconfig_path() -> Result<PathBuf> {
    Ok(get_home_dir()?.join(".kube").join("config"))
}

/// Split a kubeconfig path list into its entries, preserving priority order.
///
/// Blank entries are dropped and a leading `~` is expanded. If nothing is left, the
/// list falls back to [`default_kubeconfig_path`].
///
/// # Errors
///
/// Returns an error only when the fallback is needed and the home directory cannot be
/// determined.
pub fn kubeconfig_paths(value: Option<&str>) -> Result<Vec<PathBuf>> {
    let paths: Vec<PathBuf> = value
        .unwrap_or_default()
        .split(path_list_separator())
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(expand_tilde)
        .collect();

    if paths.is_empty() {
        return Ok(vec![default_kubeconfig_path()?]);
    }
    Ok(paths)
}
