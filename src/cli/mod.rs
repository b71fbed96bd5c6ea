//! Command-line interface for oc-auth.
//!
//! `oc-auth` has no subcommands: one invocation logs in to the cluster of a kubeconfig
//! context and stores the new token in the context's user entry.
//!
//! # Usage
//!
//! ```bash
//! # Refresh the token of the current context
//! oc-auth -u developer -p secret
//!
//! # Refresh (or create) a specific context
//! oc-auth -u developer -p secret --context work --cluster prod --credential developer
//!
//! # Credentials from the environment, debug output
//! OC_USER=developer OC_PASS=secret oc-auth --verbose
//! ```
//!
//! # Kubeconfig selection
//!
//! `--kubeconfig` (or `KUBECONFIG`) lists files separated by `:` (`;` on Windows), the
//! first one taking priority. Without it, `~/.kube/config` is used.
//!
//! # Exit codes
//!
//! | Code | Meaning                      |
//! |------|------------------------------|
//! | 0    | token refreshed              |
//! | 1    | runtime error (printed with suggestions) |
//! | 2    | invalid arguments            |


use crate::config::{KUBECONFIG_ENV, kubeconfig_paths};
use crate::credentials::{RefreshRequest, refresh_token};
use crate::kubeconfig::LayeredConfigStore;
use crate::oauth::ClientSettings;
use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Runtime configuration for CLI execution.
///
/// Built from the parsed arguments by [`Cli::build_config`]; tests construct it directly
/// to control logging, file selection and TLS policy without touching process state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// Log filter used when `RUST_LOG` is not set (`"debug"`, `"info"`, `"error"`).
    pub log_level: String,

    /// Suppress the success message.
    pub quiet: bool,

    /// Raw kubeconfig list from `--kubeconfig` / `KUBECONFIG`.
    ///
    /// `None` or a blank value selects `~/.kube/config`.
    pub kubeconfig: Option<String>,

    /// Validate server certificates.
    pub verify_tls: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            quiet: false,
            kubeconfig: None,
            verify_tls: true,
        }
    }
}

impl CliConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Log filter to install: `RUST_LOG` when set, otherwise [`log_level`](Self::log_level).
    #[must_use]
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.log_level))
    }

    /// Install the global tracing subscriber, writing to stderr.
    ///
    /// Does nothing if a subscriber is already installed.
    pub fn init_logging(&self) {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(self.env_filter())
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// Refresh an OpenShift OAuth token stored in a kubeconfig context.
#[derive(Parser)]
#[command(
    name = "oc-auth",
    about = "Refresh the OAuth token of a kubeconfig context using the OpenShift implicit grant",
    version,
    author
)]
pub struct Cli {
    /// Login name
    #[arg(short, long, env = "OC_USER")]
    username: String,

    /// Password
    #[arg(short, long, env = "OC_PASS", hide_env_values = true)]
    password: String,

    /// Context to refresh (default: the current context)
    #[arg(long)]
    context: Option<String>,

    /// Cluster of the context when it has to be created
    #[arg(long, value_name = "NAME")]
    cluster: Option<String>,

    /// User entry of the context when it has to be created
    #[arg(long, value_name = "NAME")]
    credential: Option<String>,

    /// Kubeconfig files, highest priority first
    #[arg(long, env = KUBECONFIG_ENV)]
    kubeconfig: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long)]
    insecure: bool,

    /// Enable debug output
    #[arg(long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print errors
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    /// Build a [`CliConfig`] from the parsed arguments.
    ///
    /// - `--verbose` selects `debug`, `--quiet` selects `error`, otherwise `info`
    /// - `--insecure` turns certificate validation off
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        };

        CliConfig {
            log_level: log_level.to_string(),
            quiet: self.quiet,
            kubeconfig: self.kubeconfig.clone(),
            verify_tls: !self.insecure,
        }
    }

    /// The refresh this invocation asks for.
    ///
    /// A missing context is only created when both `--cluster` and `--credential` were
    /// given; a mistyped `--context` alone fails instead.
    #[must_use]
    pub fn refresh_request(&self) -> RefreshRequest {
        RefreshRequest {
            username: self.username.clone(),
            password: self.password.clone(),
            context: self.context.clone(),
            cluster: self.cluster.clone(),
            credential: self.credential.clone(),
        }
    }

    /// Load the kubeconfig files named by `config`, refresh the token and write it back.
    ///
    /// # Errors
    ///
    /// - the kubeconfig list cannot be resolved or a file cannot be parsed
    /// - the context, user or cluster cannot be resolved
    /// - discovery or authentication fails
    /// - a modified file cannot be written
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        let paths = kubeconfig_paths(config.kubeconfig.as_deref())
            .context("Failed to determine the kubeconfig files")?;
        debug!("Kubeconfig files: {paths:?}");

        let mut store = LayeredConfigStore::load(&paths).context("Failed to load kubeconfig")?;
        debug!("Loaded {} kubeconfig document(s)", store.len());

        let settings = ClientSettings::default().with_insecure(!config.verify_tls);
        let outcome = refresh_token(&mut store, &self.refresh_request(), settings).await?;

        if !config.quiet {
            println!(
                "{} Token updated for user '{}' (context '{}', cluster '{}')",
                "✓".green(),
                outcome.user.bold(),
                outcome.context,
                outcome.cluster
            );
        }
        Ok(())
    }
}
