//! Command-line behaviour of blog-post that needs no browser

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY_VAR: &str = "BLOGCAST_TEST_API_KEY";

fn escape_path_for_toml(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "\\\\")
}

/// Write a config whose files all live in `dir`
fn write_config(dir: &TempDir, base_url: &str) -> String {
    let root = dir.path();
    let config_path = root.join("config.toml");
    let content = format!(
        r#"
[files]
keywords = "{keywords}"
used_keywords = "{used}"
prompt1 = "{prompt1}"
prompt2 = "{prompt2}"
latest_posts = "{latest}"
results_dir = "{results}"

[generator]
base_url = "{base_url}"
api_key_env = "{KEY_VAR}"
timeout = "5s"

[browser]
blog_id = "tester"

[retry]
file_backoff = "10ms"
generation_backoff = "10ms"
"#,
        keywords = escape_path_for_toml(&root.join("keywords.txt")),
        used = escape_path_for_toml(&root.join("used_keywords.txt")),
        prompt1 = escape_path_for_toml(&root.join("prompt1.txt")),
        prompt2 = escape_path_for_toml(&root.join("prompt2.txt")),
        latest = escape_path_for_toml(&root.join("latest_posts.txt")),
        results = escape_path_for_toml(&root.join("results")),
    );
    fs::write(&config_path, content).unwrap();
    config_path.to_string_lossy().to_string()
}

fn blog_post() -> Command {
    let mut cmd = Command::cargo_bin("blog-post").unwrap();
    cmd.env_remove("BLOGCAST_CONFIG").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_flags() {
    blog_post()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--count"));
}

#[test]
fn test_zero_count_is_invalid_input() {
    blog_post()
        .args(["--count", "0"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("--count must be at least 1"));
}

#[test]
fn test_keyword_with_count_is_rejected() {
    blog_post()
        .args(["--keyword", "jeju", "--count", "2"])
        .assert()
        .code(3);
}

#[test]
fn test_invalid_format_is_rejected() {
    blog_post()
        .args(["--format", "yaml"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Invalid format"));
}

#[test]
fn test_missing_config_file_exits_2() {
    let dir = TempDir::new().unwrap();
    blog_post()
        .arg("--config")
        .arg(dir.path().join("nope.toml"))
        .arg("--dry-run")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_missing_api_key_exits_2() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "http://127.0.0.1:9");

    blog_post()
        .env_remove(KEY_VAR)
        .args(["--config", &config, "--dry-run"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains(KEY_VAR));
}

#[test]
fn test_dry_run_with_missing_queue_exits_2() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "http://127.0.0.1:9");

    blog_post()
        .env(KEY_VAR, "test-key")
        .args(["--config", &config, "--dry-run"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Keyword file not found"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_dry_run_saves_article_and_keeps_queue() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.0-flash:generateContent"))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{ "text": "제목:\n봄날의 제주\n서론:\n봄의 제주\n소제목:\n바다\n본문:\n푸른 바다" }]
                },
                "finishReason": "STOP"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, &server.uri());
    fs::write(dir.path().join("keywords.txt"), "제주 여행\n부산 맛집\n").unwrap();
    fs::write(dir.path().join("prompt1.txt"), "Write a travel post.").unwrap();
    fs::write(dir.path().join("prompt2.txt"), "Use three sections.").unwrap();

    let output = blog_post()
        .env(KEY_VAR, "test-key")
        .args(["--config", &config, "--dry-run", "--format", "json"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let line: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(line["keyword"], "제주 여행");
    let record = line["record"].as_str().unwrap();
    let saved = fs::read_to_string(record).unwrap();
    assert!(saved.contains("keyword: 제주 여행\n"));
    assert!(saved.contains("\n봄날의 제주\n"));
    assert!(saved.contains("푸른 바다"));

    assert_eq!(
        fs::read_to_string(dir.path().join("keywords.txt")).unwrap(),
        "제주 여행\n부산 맛집\n"
    );
    assert!(!dir.path().join("used_keywords.txt").exists());
}
