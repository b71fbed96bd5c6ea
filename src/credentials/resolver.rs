//! Lookup and creation of the context, user and cluster entries of one run.

use crate::core::{OcAuthError, Result};
use crate::kubeconfig::{CLUSTERS, CONTEXTS, CURRENT_CONTEXT, ConfigSnippet, LayeredConfigStore, USERS};
use serde_yaml::{Mapping, Value};
use tracing::{debug, warn};

/// Namespace written into contexts created by [`resolve_context`].
pub const DEFAULT_NAMESPACE: &str = "default";

/// Find the context to refresh, creating it when possible.
///
/// Without `name`, the merged view's `current-context` is used. When no document has
/// a context of that name and both `cluster` and `credential` are given, a new context
/// is appended to the highest-priority document.
///
/// # Errors
///
/// [`OcAuthError::ContextNotFound`] when no name can be determined, or the context is
/// missing and cannot be created.
pub fn resolve_context(
    store: &mut LayeredConfigStore,
    name: Option<&str>,
    cluster: Option<&str>,
    credential: Option<&str>,
) -> Result<ConfigSnippet> {
    let name = match name {
        Some(name) => name.to_string(),
        None => current_context(store).ok_or_else(|| OcAuthError::ContextNotFound {
            name: String::new(),
        })?,
    };

    if let Some(snippet) = store.find_named(CONTEXTS, &name) {
        debug!("Using context '{name}' from {}", snippet.origin());
        return Ok(snippet);
    }

    let (Some(cluster), Some(credential)) = (cluster, credential) else {
        return Err(OcAuthError::ContextNotFound {
            name,
        });
    };

    let entry = named_entry(
        &name,
        "context",
        [
            ("cluster", Value::from(cluster)),
            ("namespace", Value::from(DEFAULT_NAMESPACE)),
            ("user", Value::from(credential)),
        ],
    );
    let snippet = store.append_named(CONTEXTS, entry)?.ok_or_else(|| OcAuthError::ContextNotFound {
        name: name.clone(),
    })?;

    warn!(
        "Context '{name}' not found, created it in {} (cluster '{cluster}', user '{credential}')",
        snippet.origin()
    );
    Ok(snippet)
}

/// Find the user entry `name`, creating one with an empty token when missing.
///
/// # Errors
///
/// [`OcAuthError::UserNotFound`] when the store holds no document to create it in.
pub fn resolve_user(store: &mut LayeredConfigStore, name: &str) -> Result<ConfigSnippet> {
    if let Some(snippet) = store.find_named(USERS, name) {
        debug!("Using user '{name}' from {}", snippet.origin());
        return Ok(snippet);
    }

    let entry = named_entry(name, "user", [("token", Value::from(""))]);
    let snippet = store.append_named(USERS, entry)?.ok_or_else(|| OcAuthError::UserNotFound {
        name: name.to_string(),
    })?;

    warn!("User '{name}' not found, created it in {}", snippet.origin());
    Ok(snippet)
}

/// Find the cluster entry `name`. Clusters are never created.
///
/// # Errors
///
/// [`OcAuthError::ClusterNotFound`] when no document has it.
pub fn resolve_cluster(store: &LayeredConfigStore, name: &str) -> Result<ConfigSnippet> {
    let snippet = store.find_named(CLUSTERS, name).ok_or_else(|| OcAuthError::ClusterNotFound {
        name: name.to_string(),
    })?;
    debug!("Using cluster '{name}' from {}", snippet.origin());
    Ok(snippet)
}

fn current_context(store: &LayeredConfigStore) -> Option<String> {
    let merged = store.merged_view();
    merged
        .tree()
        .get(CURRENT_CONTEXT)
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// `{name: <name>, <kind>: {<fields>}}`
fn named_entry<const N: usize>(name: &str, kind: &str, fields: [(&str, Value); N]) -> Value {
    let body: Mapping = fields.into_iter().map(|(key, value)| (Value::from(key), value)).collect();

    let mut entry = Mapping::new();
    entry.insert(Value::from("name"), Value::from(name));
    entry.insert(Value::from(kind), Value::Mapping(body));
    Value::Mapping(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kubeconfig::{ConfigDocument, Origin};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn document(path: &str, yaml: &str) -> ConfigDocument {
        ConfigDocument::from_tree(Origin::File(PathBuf::from(path)), serde_yaml::from_str(yaml).unwrap())
    }

    fn store(docs: &[(&str, &str)]) -> LayeredConfigStore {
        LayeredConfigStore::from_documents(docs.iter().map(|(path, yaml)| document(path, yaml)).collect())
    }

    #[test]
    fn test_context_defaults_to_current_context() {
        let mut store = store(&[
            ("/a", "current-context: dev\n"),
            ("/b", "contexts:\n- name: dev\n  context: {cluster: c, user: u}\n"),
        ]);

        let snippet = resolve_context(&mut store, None, None, None).unwrap();
        assert_eq!(snippet.origin(), &Origin::File(PathBuf::from("/b")));
        assert!(!snippet.is_dirty());
        assert_eq!(store.get(&snippet).unwrap()["context"]["cluster"], Value::from("c"));
    }

    #[test]
    fn test_first_document_wins_for_contexts() {
        let mut store = store(&[
            ("/a", "contexts:\n- name: dev\n  context: {cluster: from-a}\n"),
            ("/b", "contexts:\n- name: dev\n  context: {cluster: from-b}\n"),
        ]);

        let snippet = resolve_context(&mut store, Some("dev"), None, None).unwrap();
        assert_eq!(store.get(&snippet).unwrap()["context"]["cluster"], Value::from("from-a"));
    }

    #[test]
    fn test_missing_context_without_name() {
        let mut store = store(&[("/a", "contexts: []\n")]);
        let err = resolve_context(&mut store, None, Some("c"), Some("u")).unwrap_err();
        assert!(matches!(err, OcAuthError::ContextNotFound { ref name } if name.is_empty()));
    }

    #[test]
    fn test_missing_context_without_cluster_and_credential() {
        let mut store = store(&[("/a", "{}\n")]);
        let err = resolve_context(&mut store, Some("missing"), Some("c"), None).unwrap_err();
        assert!(matches!(err, OcAuthError::ContextNotFound { ref name } if name == "missing"));
        assert!(!store.documents().any(ConfigDocument::is_dirty));
    }

    #[test]
    fn test_creates_missing_context_in_first_document() {
        let mut store = store(&[("/a", "current-context: x\n"), ("/b", "contexts: []\n")]);

        let snippet = resolve_context(&mut store, Some("missing"), Some("foo"), Some("bar")).unwrap();
        assert!(snippet.is_dirty());
        assert_eq!(snippet.origin(), &Origin::File(PathBuf::from("/a")));

        let first = store.documents().next().unwrap();
        assert!(first.is_dirty());
        let expected: Value = serde_yaml::from_str(
            "name: missing\ncontext:\n  cluster: foo\n  namespace: default\n  user: bar\n",
        )
        .unwrap();
        assert_eq!(store.get(&snippet).unwrap(), &expected);

        // Resolving again returns the created record
        let again = resolve_context(&mut store, Some("missing"), None, None).unwrap();
        assert_eq!(again.path(), snippet.path());
    }

    #[test]
    fn test_context_cannot_be_created_without_documents() {
        let mut store = LayeredConfigStore::default();
        let err = resolve_context(&mut store, Some("dev"), Some("c"), Some("u")).unwrap_err();
        assert!(matches!(err, OcAuthError::ContextNotFound { .. }));
    }

    #[test]
    fn test_resolve_existing_user() {
        let mut store = store(&[("/a", "users:\n- name: me\n  user: {token: old}\n")]);
        let snippet = resolve_user(&mut store, "me").unwrap();
        assert!(!snippet.is_dirty());
        assert_eq!(store.get(&snippet).unwrap()["user"]["token"], Value::from("old"));
    }

    #[test]
    fn test_creates_missing_user() {
        let mut store = store(&[("/a", "users: ~\n"), ("/b", "{}\n")]);

        let snippet = resolve_user(&mut store, "me").unwrap();
        assert!(snippet.is_dirty());
        assert_eq!(snippet.origin(), &Origin::File(PathBuf::from("/a")));
        assert_eq!(store.get(&snippet).unwrap()["user"]["token"], Value::from(""));

        let again = resolve_user(&mut store, "me").unwrap();
        assert_eq!(again.path(), snippet.path());
    }

    #[test]
    fn test_user_without_documents() {
        let mut store = LayeredConfigStore::default();
        let err = resolve_user(&mut store, "me").unwrap_err();
        assert!(matches!(err, OcAuthError::UserNotFound { ref name } if name == "me"));
    }

    #[test]
    fn test_cluster_is_never_created() {
        let store = store(&[
            ("/a", "{}\n"),
            ("/b", "clusters:\n- name: c\n  cluster: {server: 'https://api:6443'}\n"),
        ]);

        let snippet = resolve_cluster(&store, "c").unwrap();
        assert_eq!(snippet.origin(), &Origin::File(PathBuf::from("/b")));

        let err = resolve_cluster(&store, "other").unwrap_err();
        assert!(matches!(err, OcAuthError::ClusterNotFound { ref name } if name == "other"));
    }
}
