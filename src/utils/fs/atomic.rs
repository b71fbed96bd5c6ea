//! Atomic file write operations using temp-and-rename strategy.
//!
//! Kubeconfig files are rewritten in full on every persist, so an interrupted write
//! must never leave a truncated, unparsable file behind.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Safely writes a string to a file using atomic operations.
///
/// Convenience wrapper around [`atomic_write`].
pub fn safe_write(path: &Path, content: &str) -> Result<()> {
    atomic_write(path, content.as_bytes())
}

/// Atomically writes bytes to a file using a write-then-rename strategy.
///
/// 1. Writes content to a temporary file in the target's directory
/// 2. Syncs the temporary file to disk
/// 3. Copies the permissions of the file being replaced (kubeconfigs hold tokens)
/// 4. Atomically renames the temporary file over the target path
///
/// # Examples
///
/// ```rust,no_run
/// use oc_auth::utils::fs::atomic_write;
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// atomic_write(Path::new("/home/me/.kube/config"), b"current-context: dev\n")?;
/// # Ok(())
/// # }
/// ```
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let safe_path = crate::utils::platform::windows_long_path(path);

    let parent = match safe_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().context("Failed to determine current directory")?,
    };
    fs::create_dir_all(&parent)
        .with_context(|| format!("Failed to create directory: {}", parent.display()))?;

    let mut temp = tempfile::NamedTempFile::new_in(&parent).with_context(|| {
        let platform_help = if crate::utils::platform::is_windows() {
            "On Windows: Check file permissions, path length, and that directory exists"
        } else {
            "Check file permissions and that directory exists"
        };

        format!("Failed to create temp file in: {}\n\n{}", parent.display(), platform_help)
    })?;

    temp.write_all(content)
        .with_context(|| format!("Failed to write to temp file: {}", temp.path().display()))?;
    temp.as_file().sync_all().context("Failed to sync file to disk")?;

    if let Ok(metadata) = fs::metadata(&safe_path) {
        fs::set_permissions(temp.path(), metadata.permissions()).with_context(|| {
            format!("Failed to copy permissions from {}", safe_path.display())
        })?;
    }

    temp.persist(&safe_path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to rename temp file to: {}", safe_path.display()))?;

    Ok(())
}
