//! One token refresh: resolve entries, log in, write the token back.

use super::resolver::{resolve_cluster, resolve_context, resolve_user};
use crate::core::{OcAuthError, Result};
use crate::kubeconfig::{ConfigSnippet, LayeredConfigStore};
use crate::oauth::{ClientSettings, ImplicitGrantClient};
use serde_yaml::{Mapping, Value};
use std::fmt;
use tracing::{info, warn};

/// What to refresh and with which credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshRequest {
    /// Login name sent to the authorization server
    pub username: String,
    /// Password sent to the authorization server
    pub password: String,
    /// Context to refresh; the current context when `None`
    pub context: Option<String>,
    /// Cluster for a context that has to be created
    pub cluster: Option<String>,
    /// User entry for a context that has to be created
    pub credential: Option<String>,
}

impl fmt::Debug for RefreshRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("context", &self.context)
            .field("cluster", &self.cluster)
            .field("credential", &self.credential)
            .finish()
    }
}

/// Result of a successful refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshOutcome {
    /// Context that was refreshed
    pub context: String,
    /// User entry holding the new token
    pub user: String,
    /// Cluster that issued the token
    pub cluster: String,
    /// Server URL the login went to
    pub server: String,
    /// Number of kubeconfig files rewritten
    pub files_written: usize,
}

/// Log in to the cluster of the requested context and store the token in its user.
///
/// The context and user are created when missing (see [`resolve_context`] and
/// [`resolve_user`]). A user entry with an empty name is renamed to `{username}/auth`
/// and the context is pointed at the new name. The context, user and cluster snippets
/// are then persisted, which writes each touched file once.
///
/// `insecure-skip-tls-verify: true` on the cluster disables certificate validation for
/// this run, as if it had been requested through `settings`.
///
/// # Errors
///
/// Resolution errors, [`OcAuthError::InvalidEntry`] for contexts or clusters missing
/// required fields, OAuth errors, and write failures. Nothing is written when the login
/// fails.
pub async fn refresh_token(
    store: &mut LayeredConfigStore,
    request: &RefreshRequest,
    settings: ClientSettings,
) -> Result<RefreshOutcome> {
    let mut context = resolve_context(
        store,
        request.context.as_deref(),
        request.cluster.as_deref(),
        request.credential.as_deref(),
    )?;

    let (context_name, cluster_name, user_name) = {
        let node = store.get(&context)?;
        let name = node.get("name").and_then(Value::as_str).unwrap_or_default().to_string();
        let body = &node["context"];
        let cluster = required_str(body, "cluster", || format!("context '{name}'"))?;
        let user = required_str(body, "user", || format!("context '{name}'"))?;
        (name, cluster, user)
    };

    let mut user = resolve_user(store, &user_name)?;
    let mut cluster = resolve_cluster(store, &cluster_name)?;

    let (server, cluster_insecure) = {
        let body = &store.get(&cluster)?["cluster"];
        let server = required_str(body, "server", || format!("cluster '{cluster_name}'"))?;
        let insecure = body.get("insecure-skip-tls-verify").and_then(Value::as_bool).unwrap_or(false);
        (server, insecure)
    };

    let settings = if cluster_insecure {
        warn!("Cluster '{cluster_name}' sets insecure-skip-tls-verify");
        settings.with_insecure(true)
    } else {
        settings
    };

    info!("Logging in to {server} as {}", request.username);
    let mut client = ImplicitGrantClient::new(settings)?;
    let token = client.login(&server, &request.username, &request.password).await?;

    let synthesized = format!("{}/auth", request.username);
    let renamed = store.update(&mut user, |node| {
        set_field(node, "user", "token", Value::from(token.access_token.as_str()));

        let unnamed = node.get("name").and_then(Value::as_str).is_none_or(str::is_empty);
        if unnamed {
            node["name"] = Value::from(synthesized.as_str());
        }
        unnamed
    })?;

    let user_name = if renamed {
        info!("Named the user entry of context '{context_name}' {synthesized}");
        store.update(&mut context, |node| {
            set_field(node, "context", "user", Value::from(synthesized.as_str()));
        })?;
        synthesized
    } else {
        user_name
    };

    let files_written = persist_each(store, [&mut context, &mut user, &mut cluster])?;
    info!("Stored new token for user '{user_name}' of context '{context_name}'");

    Ok(RefreshOutcome {
        context: context_name,
        user: user_name,
        cluster: cluster_name,
        server,
        files_written,
    })
}

fn persist_each<const N: usize>(
    store: &mut LayeredConfigStore,
    snippets: [&mut ConfigSnippet; N],
) -> Result<usize> {
    let mut written = 0;
    for snippet in snippets {
        if store.persist(snippet)? {
            written += 1;
        }
    }
    Ok(written)
}

fn required_str(body: &Value, key: &str, entry: impl FnOnce() -> String) -> Result<String> {
    body.get(key).and_then(Value::as_str).map(str::to_string).ok_or_else(|| {
        OcAuthError::InvalidEntry {
            entry: entry(),
            reason: format!("missing '{key}'"),
        }
    })
}

/// `node[section][key] = value`, replacing `node[section]` if it is not a mapping.
fn set_field(node: &mut Value, section: &str, key: &str, value: Value) {
    if !node.is_mapping() {
        *node = Value::Mapping(Mapping::new());
    }
    let section = &mut node[section];
    if !section.is_mapping() {
        *section = Value::Mapping(Mapping::new());
    }
    section[key] = value;
}
