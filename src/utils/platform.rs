//! Platform-specific helpers
//!
//! oc-auth only cares about three platform differences: how the home directory is
//! found, which character separates entries of a path list such as `KUBECONFIG`, and
//! Windows' 260-character path limit when writing files.
//!
//! # Examples
//!
//! ```rust,no_run
//! use oc_auth::utils::platform::{get_home_dir, path_list_separator};
//!
//! # fn example() -> anyhow::Result<()> {
//! let home = get_home_dir()?;
//! println!("Home directory: {}", home.display());
//! println!("KUBECONFIG entries are separated by {:?}", path_list_separator());
//! # Ok(())
//! # }
//! ```

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Checks if the current platform is Windows.
#[must_use]
pub const fn is_windows() -> bool {
    cfg!(windows)
}

/// Separator between entries of a path list environment variable.
///
/// - `;` on Windows
/// - `:` on Unix-like systems
#[must_use]
pub const fn path_list_separator() -> char {
    if is_windows() {
        ';'
    } else {
        ':'
    }
}

/// Gets the home directory path for the current user.
///
/// # Error Cases
///
/// - Home directory environment variable is not set
pub fn get_home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| {
        let platform_help = if is_windows() {
            "On Windows: Check that the USERPROFILE environment variable is set"
        } else {
            "On Unix/Linux: Check that the HOME environment variable is set"
        };
        anyhow::anyhow!("Could not determine home directory.\n\n{platform_help}")
    })
}

/// Expands a leading `~` to the user's home directory.
///
/// Paths without a leading tilde, and paths where the home directory cannot be
/// determined, are returned unchanged.
#[must_use]
pub fn expand_tilde(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some("") => "",
        Some(rest) if rest.starts_with('/') || rest.starts_with('\\') => &rest[1..],
        _ => return PathBuf::from(path),
    };

    match dirs::home_dir() {
        Some(home) if rest.is_empty() => home,
        Some(home) => home.join(rest),
        None => PathBuf::from(path),
    }
}

/// Converts a path to its extended-length form when it exceeds 260 characters.
#[cfg(windows)]
pub fn windows_long_path(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    if path_str.len() > 260 && !path_str.starts_with(r"\\?\") {
        let absolute_path = if path.is_relative() {
            std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join(path)
        } else {
            path.to_path_buf()
        };

        let absolute_str = absolute_path.to_string_lossy();
        if absolute_str.len() > 260 {
            if let Some(stripped) = absolute_str.strip_prefix(r"\\") {
                // Network path
                PathBuf::from(format!(r"\\?\UNC\{}", stripped))
            } else {
                PathBuf::from(format!(r"\\?\{}", absolute_str))
            }
        } else {
            absolute_path
        }
    } else {
        path.to_path_buf()
    }
}

/// No-op on non-Windows platforms.
#[cfg(not(windows))]
#[must_use]
pub fn windows_long_path(path: &Path) -> PathBuf {
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_list_separator() {
        if cfg!(windows) {
            assert_eq!(path_list_separator(), ';');
        } else {
            assert_eq!(path_list_separator(), ':');
        }
    }

    #[test]
    fn test_expand_tilde() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_tilde("~"), home);
        assert_eq!(expand_tilde("~/.kube/config"), home.join(".kube/config"));
        assert_eq!(expand_tilde("/etc/kubeconfig"), PathBuf::from("/etc/kubeconfig"));
        assert_eq!(expand_tilde("~other/config"), PathBuf::from("~other/config"));
    }

    #[test]
    #[cfg(not(windows))]
    fn test_windows_long_path_noop() {
        let path = Path::new("/tmp/some/config");
        assert_eq!(windows_long_path(path), path.to_path_buf());
    }
}
