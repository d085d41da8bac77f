use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Nothing listens here; any request fails fast.
const DEAD_API: &str = "http://127.0.0.1:9";

fn clausewise(api_url: &str, session_dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_clausewise"));
    cmd.env("CLAUSEWISE_API_URL", api_url)
        .env("CLAUSEWISE_SESSION_FILE", session_dir.join("auth-storage.json"))
        .env("CLAUSEWISE_API_MAX_RETRIES", "0")
        .env_remove("CLAUSEWISE_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

fn write_session(dir: &Path, token: &str) {
    let session = json!({
        "user": null,
        "token": token,
        "isAuthenticated": true
    });
    std::fs::write(dir.join("auth-storage.json"), session.to_string()).unwrap();
}

#[test]
fn help_lists_commands() {
    let dir = TempDir::new().unwrap();
    clausewise(DEAD_API, dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("login")
                .and(predicate::str::contains("docs"))
                .and(predicate::str::contains("playbooks"))
                .and(predicate::str::contains("analyze")),
        );
}

#[test]
fn oversized_upload_rejected_before_network() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("big.pdf");
    // Sparse: sized without being written, and never read by the command.
    std::fs::File::create(&file)
        .unwrap()
        .set_len(4 * 1024 * 1024 * 1024)
        .unwrap();

    clausewise(DEAD_API, dir.path())
        .args(["docs", "upload"])
        .arg(&file)
        .assert()
        .code(4)
        .stderr(predicate::str::contains("file-too-large"));
}

#[test]
fn missing_upload_file_is_reported_as_such() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("missing.pdf");

    clausewise(DEAD_API, dir.path())
        .args(["docs", "upload"])
        .arg(&file)
        .assert()
        .code(1)
        .stderr(
            predicate::str::contains("cannot read")
                .and(predicate::str::contains("missing.pdf"))
                .and(predicate::str::contains("session").not()),
        );
}

#[test]
fn unsupported_type_rejected() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("notes.txt");
    std::fs::write(&file, "plain text").unwrap();

    clausewise(DEAD_API, dir.path())
        .args(["docs", "upload"])
        .arg(&file)
        .assert()
        .code(4)
        .stderr(predicate::str::contains("file-invalid-type"));
}

#[test]
fn whoami_without_session_is_unauthorized() {
    let dir = TempDir::new().unwrap();
    clausewise(DEAD_API, dir.path())
        .arg("whoami")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Not logged in"));
}

#[test]
fn logout_without_session_succeeds() {
    let dir = TempDir::new().unwrap();
    clausewise(DEAD_API, dir.path())
        .arg("logout")
        .assert()
        .success();
}

#[test]
fn unreachable_api_maps_to_network_exit_code() {
    let dir = TempDir::new().unwrap();
    clausewise(DEAD_API, dir.path())
        .arg("health")
        .assert()
        .code(5);
}

#[tokio::test(flavor = "multi_thread")]
async fn health_reports_service_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "healthy", "service": "contract-analysis"})),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut cmd = clausewise(&server.uri(), dir.path());
    let output = tokio::task::spawn_blocking(move || cmd.arg("health").output().unwrap())
        .await
        .unwrap();

    output
        .assert()
        .success()
        .stdout(predicate::str::contains("contract-analysis: healthy"));
}

#[tokio::test(flavor = "multi_thread")]
async fn whoami_uses_persisted_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/user/profile"))
        .and(header("authorization", "Bearer persisted-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "u1",
            "email": "a@b.com",
            "is_active": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    write_session(dir.path(), "persisted-token");

    let mut cmd = clausewise(&server.uri(), dir.path());
    let output = tokio::task::spawn_blocking(move || cmd.args(["--json", "whoami"]).output().unwrap())
        .await
        .unwrap();

    output
        .assert()
        .success()
        .stdout(predicate::str::contains("\"email\": \"a@b.com\""));
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_session_is_cleared() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/documents"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"})),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    write_session(dir.path(), "stale-token");
    let session_file = dir.path().join("auth-storage.json");

    let mut cmd = clausewise(&server.uri(), dir.path());
    let output = tokio::task::spawn_blocking(move || cmd.args(["docs", "list"]).output().unwrap())
        .await
        .unwrap();

    output
        .assert()
        .code(3)
        .stderr(predicate::str::contains("clausewise login"));
    assert!(!session_file.exists());
}
