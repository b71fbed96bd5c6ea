//! Common helpers for oc-auth integration tests
//!
//! Every test runs the real binary against a private home directory and, where a login
//! is needed, a wiremock server standing in for the OpenShift OAuth server.

// Not every test file uses every helper
#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Output;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub use oc_auth::test_utils::KubeconfigFixture;

/// Isolated home directory for one test
pub struct TestHome {
    _temp_dir: TempDir, // Keep alive for RAII cleanup
    home: PathBuf,
}

impl TestHome {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let home = temp_dir.path().join("home");
        fs::create_dir_all(&home).unwrap();
        Self {
            _temp_dir: temp_dir,
            home,
        }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    /// `~/.kube/config`, with its directory created
    pub fn default_kubeconfig(&self) -> PathBuf {
        let dir = self.home.join(".kube");
        fs::create_dir_all(&dir).unwrap();
        dir.join("config")
    }

    /// Write `fixture` to `name` inside the home directory
    pub fn write(&self, name: &str, fixture: &KubeconfigFixture) -> PathBuf {
        let path = self.home.join(name);
        fixture.write_to(&path).unwrap();
        path
    }

    /// The binary with a clean environment pointing at this home
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("oc-auth").unwrap();
        cmd.env("HOME", &self.home)
            .env("NO_COLOR", "1")
            .env_remove("KUBECONFIG")
            .env_remove("OC_USER")
            .env_remove("OC_PASS")
            .env_remove("RUST_LOG");
        cmd
    }
}

/// Join paths into a `KUBECONFIG` value
pub fn kubeconfig_list(paths: &[&Path]) -> String {
    std::env::join_paths(paths).unwrap().to_string_lossy().into_owned()
}

/// Run `cmd` off the async runtime so the mock server keeps serving
pub async fn run(cmd: Command) -> Output {
    tokio::task::spawn_blocking(move || {
        let mut cmd = cmd;
        cmd.output().unwrap()
    })
    .await
    .unwrap()
}

/// Parse a kubeconfig file
pub fn read_yaml(path: &Path) -> serde_yaml::Value {
    serde_yaml::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

/// A mock OpenShift OAuth server issuing `token` for any credentials
pub async fn mock_openshift(token: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/.well-known/oauth-authorization-server"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "issuer": server.uri(),
            "authorization_endpoint": format!("{}/oauth/authorize", server.uri()),
            "scopes_supported": ["user:full"],
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/oauth/authorize"))
        .respond_with(ResponseTemplate::new(302).insert_header(
            "Location",
            format!("{}/oauth/token/implicit#access_token={token}&token_type=Bearer&expires_in=86400", server.uri()),
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/oauth/token/implicit"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    server
}

/// A mock OAuth server rejecting every login
pub async fn mock_rejecting_openshift() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/.well-known/oauth-authorization-server"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "issuer": server.uri(),
            "authorization_endpoint": "/oauth/authorize",
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/oauth/authorize"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&server)
        .await;
    server
}
