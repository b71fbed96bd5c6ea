//! Test utilities for oc-auth
//!
//! Helpers shared by unit tests and the integration tests in `tests/`:
//! - [`init_test_logging`] - Once-guarded tracing subscriber using the test writer
//! - [`KubeconfigFixture`] - builder for kubeconfig files
//!
//! # Example
//!
//! ```rust,no_run
//! use oc_auth::test_utils::KubeconfigFixture;
//!
//! let yaml = KubeconfigFixture::new()
//!     .current_context("dev")
//!     .cluster("c", "https://api.example.com:6443")
//!     .context("dev", "c", "me")
//!     .user("me", "old-token")
//!     .to_yaml();
//! assert!(yaml.contains("current-context: dev"));
//! ```

mod fixtures;

pub use fixtures::KubeconfigFixture;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` when given, otherwise `RUST_LOG`;
/// with neither, tests run without a subscriber.
///
/// ```bash
/// RUST_LOG=oc_auth=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}
