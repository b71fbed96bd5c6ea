//! Builder for kubeconfig test files.

use anyhow::{Context, Result};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;

/// Test fixture producing kubeconfig YAML
#[derive(Clone, Debug, Default)]
pub struct KubeconfigFixture {
    current_context: Option<String>,
    clusters: Vec<Value>,
    contexts: Vec<Value>,
    users: Vec<Value>,
}

impl KubeconfigFixture {
    /// Empty kubeconfig
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `current-context`
    pub fn current_context(mut self, name: &str) -> Self {
        self.current_context = Some(name.to_string());
        self
    }

    /// Add a cluster with the given server URL
    pub fn cluster(mut self, name: &str, server: &str) -> Self {
        self.clusters.push(entry(name, "cluster", &[("server", Value::from(server))]));
        self
    }

    /// Add a cluster with `insecure-skip-tls-verify: true`
    pub fn insecure_cluster(mut self, name: &str, server: &str) -> Self {
        self.clusters.push(entry(
            name,
            "cluster",
            &[("server", Value::from(server)), ("insecure-skip-tls-verify", Value::from(true))],
        ));
        self
    }

    /// Add a context in the `default` namespace
    pub fn context(mut self, name: &str, cluster: &str, user: &str) -> Self {
        self.contexts.push(entry(
            name,
            "context",
            &[
                ("cluster", Value::from(cluster)),
                ("namespace", Value::from("default")),
                ("user", Value::from(user)),
            ],
        ));
        self
    }

    /// Add a user holding `token`
    pub fn user(mut self, name: &str, token: &str) -> Self {
        self.users.push(entry(name, "user", &[("token", Value::from(token))]));
        self
    }

    /// The kubeconfig as a YAML tree. Empty lists are left out.
    pub fn to_value(&self) -> Value {
        let mut root = Mapping::new();
        root.insert(Value::from("apiVersion"), Value::from("v1"));
        root.insert(Value::from("kind"), Value::from("Config"));
        if let Some(current) = &self.current_context {
            root.insert(Value::from("current-context"), Value::from(current.as_str()));
        }
        for (key, list) in [("clusters", &self.clusters), ("contexts", &self.contexts), ("users", &self.users)] {
            if !list.is_empty() {
                root.insert(Value::from(key), Value::Sequence(list.clone()));
            }
        }
        Value::Mapping(root)
    }

    /// The kubeconfig as YAML text
    pub fn to_yaml(&self) -> String {
        serde_yaml::to_string(&self.to_value()).unwrap_or_default()
    }

    /// Write the kubeconfig to `path`
    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_yaml())
            .with_context(|| format!("Failed to write kubeconfig fixture {}", path.display()))
    }
}

fn entry(name: &str, kind: &str, fields: &[(&str, Value)]) -> Value {
    let mut body = Mapping::new();
    for (key, value) in fields {
        body.insert(Value::from(*key), value.clone());
    }

    let mut entry = Mapping::new();
    entry.insert(Value::from("name"), Value::from(name));
    entry.insert(Value::from(kind), Value::Mapping(body));
    Value::Mapping(entry)
}
