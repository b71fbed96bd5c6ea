//! End-to-end token refreshes through the oc-auth binary.

use assert_cmd::assert::OutputAssertExt;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use serde_yaml::Value;
use std::fs;

mod common;
use common::{
    KubeconfigFixture, TestHome, kubeconfig_list, mock_openshift, mock_rejecting_openshift, read_yaml, run,
};

#[cfg(unix)]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_refresh_current_context() {
    let server = mock_openshift("sha256~fresh").await;
    let home = TestHome::new();
    let config = home.default_kubeconfig();
    KubeconfigFixture::new()
        .current_context("dev")
        .cluster("dev-cluster", &server.uri())
        .context("dev", "dev-cluster", "developer/auth")
        .user("developer/auth", "stale")
        .write_to(&config)
        .unwrap();

    let mut cmd = home.command();
    cmd.args(["-u", "developer", "-p", "secret"]);
    run(cmd).await.assert().success().stdout(predicate::str::contains("Token updated"));

    let tree = read_yaml(&config);
    assert_eq!(tree["users"][0]["user"]["token"], Value::from("sha256~fresh"));
    assert_eq!(tree["current-context"], Value::from("dev"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_credentials_from_environment() {
    let server = mock_openshift("from-env").await;
    let home = TestHome::new();
    let config = home.write(
        "config",
        &KubeconfigFixture::new()
            .current_context("dev")
            .cluster("c", &server.uri())
            .context("dev", "c", "me")
            .user("me", ""),
    );

    let mut cmd = home.command();
    cmd.env("OC_USER", "developer").env("OC_PASS", "secret").env("KUBECONFIG", &config).arg("--quiet");
    run(cmd).await.assert().success().stdout(predicate::str::is_empty());

    assert_eq!(read_yaml(&config)["users"][0]["user"]["token"], Value::from("from-env"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_only_owning_file_is_rewritten() {
    let server = mock_openshift("layered").await;
    let home = TestHome::new();
    let primary = home.write("primary", &KubeconfigFixture::new().current_context("dev"));
    let secondary = home.write(
        "secondary",
        &KubeconfigFixture::new()
            .current_context("ignored")
            .cluster("c", &server.uri())
            .context("dev", "c", "me")
            .user("me", "old"),
    );
    let primary_before = fs::read(&primary).unwrap();

    let kubeconfig = kubeconfig_list(&[primary.as_path(), secondary.as_path()]);
    let mut cmd = home.command();
    cmd.args(["-u", "developer", "-p", "secret", "--kubeconfig", kubeconfig.as_str()]);
    run(cmd).await.assert().success();

    assert_eq!(fs::read(&primary).unwrap(), primary_before);
    assert_eq!(read_yaml(&secondary)["users"][0]["user"]["token"], Value::from("layered"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_missing_context_is_created() {
    let server = mock_openshift("created").await;
    let home = TestHome::new();
    let config = home.write("config", &KubeconfigFixture::new().cluster("foo", &server.uri()));

    let mut cmd = home.command();
    cmd.args(["-u", "developer", "-p", "secret", "--context", "missing", "--cluster", "foo", "--credential", "bar"])
        .env("KUBECONFIG", &config);
    run(cmd).await.assert().success();

    let tree = read_yaml(&config);
    let context = &tree["contexts"][0];
    assert_eq!(context["name"], Value::from("missing"));
    assert_eq!(context["context"]["cluster"], Value::from("foo"));
    assert_eq!(context["context"]["namespace"], Value::from("default"));
    assert_eq!(context["context"]["user"], Value::from("bar"));
    assert_eq!(tree["users"][0]["name"], Value::from("bar"));
    assert_eq!(tree["users"][0]["user"]["token"], Value::from("created"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_insecure_cluster_is_accepted() {
    let server = mock_openshift("insecure").await;
    let home = TestHome::new();
    let config = home.write(
        "config",
        &KubeconfigFixture::new()
            .current_context("dev")
            .insecure_cluster("c", &server.uri())
            .context("dev", "c", "me")
            .user("me", ""),
    );

    let mut cmd = home.command();
    cmd.args(["-u", "developer", "-p", "secret"]).env("KUBECONFIG", &config);
    run(cmd)
        .await
        .assert()
        .success()
        .stderr(predicate::str::contains("TLS certificate verification is disabled"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_rejected_login_leaves_files_untouched() {
    let server = mock_rejecting_openshift().await;
    let home = TestHome::new();
    let config = home.write(
        "config",
        &KubeconfigFixture::new()
            .current_context("dev")
            .cluster("c", &server.uri())
            .context("dev", "c", "me")
            .user("me", "old"),
    );
    let before = fs::read(&config).unwrap();

    let mut cmd = home.command();
    cmd.args(["-u", "developer", "-p", "wrong"]).env("KUBECONFIG", &config);
    run(cmd)
        .await
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Authentication failed").and(predicate::str::contains("401")));

    assert_eq!(fs::read(&config).unwrap(), before);
}

#[cfg(unix)]
#[test]
fn test_empty_kubeconfig_without_default_file() {
    let home = TestHome::new();
    home.command()
        .args(["-u", "developer", "-p", "secret"])
        .env("KUBECONFIG", "")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No context").and(predicate::str::contains("--context")));

    assert!(!home.home().join(".kube").exists());
}

#[test]
fn test_unknown_cluster_is_reported() {
    let home = TestHome::new();
    let config = home.write("config", &KubeconfigFixture::new().current_context("dev").context("dev", "gone", "me"));

    home.command()
        .args(["-u", "developer", "-p", "secret"])
        .env("KUBECONFIG", &config)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No cluster 'gone' found"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_refresh_keeps_comments() {
    let server = mock_openshift("kept").await;
    let home = TestHome::new();
    let config = home.home().join("commented");
    let original = format!(
        "# cluster access, edit with care\n\
         current-context: dev\n\
         clusters:\n\
         - name: c   # staging\n  cluster: {{server: '{}'}}\n\
         contexts:\n\
         - name: dev\n  context: {{cluster: c, user: me}}\n\
         users:\n\
         - name: me\n  user:\n    token: stale  # expires daily\n",
        server.uri()
    );
    fs::write(&config, &original).unwrap();

    let mut cmd = home.command();
    cmd.args(["-u", "developer", "-p", "secret"]).env("KUBECONFIG", &config);
    run(cmd).await.assert().success();

    assert_eq!(fs::read_to_string(&config).unwrap(), original.replace("token: stale", "token: kept"));
}
