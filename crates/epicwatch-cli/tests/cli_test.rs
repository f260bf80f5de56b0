//! Binary tests: `epicwatch report` against a mock GitHub API.
//!
//! Every command runs with `GITHUB_TOKEN` set and a private config
//! directory, so neither the keychain nor the user's config is touched.

mod common;

use assert_cmd::Command;
use common::fixture_text;
use httpmock::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Nothing listens here; validation failures must never get this far.
const UNREACHABLE_API: &str = "http://127.0.0.1:9";

fn epicwatch(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("epicwatch").unwrap();
    cmd.env("GITHUB_TOKEN", "test-token")
        .env("XDG_CONFIG_HOME", config_home.path())
        .env_remove("RUST_LOG");
    cmd
}

fn mock_issue(server: &MockServer, number: u64) {
    server.mock(|when, then| {
        when.method(GET)
            .path(format!("/repos/LDFLK/launch/issues/{}", number))
            .header("Authorization", "Bearer test-token");
        then.status(200)
            .header("content-type", "application/json")
            .body(fixture_text(&format!("issue_{}.json", number)));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path(format!("/repos/LDFLK/launch/issues/{}/comments", number))
            .query_param("page", "1");
        then.status(200)
            .header("content-type", "application/json")
            .body(fixture_text(&format!("comments_{}.json", number)));
    });
}

#[test]
fn test_help_lists_commands() {
    let home = TempDir::new().unwrap();
    epicwatch(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("report"))
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_report_end_to_end() {
    let server = MockServer::start();
    mock_issue(&server, 151);
    mock_issue(&server, 152);
    let missing = server.mock(|when, then| {
        when.method(GET).path("/repos/LDFLK/launch/issues/999");
        then.status(404).json_body(serde_json::json!({"message": "Not Found"}));
    });

    let home = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let output = out.path().join("report.json");

    epicwatch(&home)
        .args(["report", "-r", "LDFLK/launch", "-d", "2025-08-07", "--issues", "151,152,999"])
        .arg("-o")
        .arg(&output)
        .arg("--base-url")
        .arg(server.base_url())
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 2 EPIC update(s) in 3 issue(s)"))
        .stdout(predicate::str::contains("1 issue(s) could not be retrieved"));

    missing.assert();

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(report["repo"], "LDFLK/launch");
    assert_eq!(report["target_date"], "2025-08-07");
    assert_eq!(report["issue_numbers"], serde_json::json!([151, 152, 999]));
    assert!(report["generated_at"].as_str().unwrap().starts_with("20"));

    let raw = &report["raw_epic_data"];
    assert_eq!(raw["total_updates"], 2);
    assert_eq!(raw["updates"][0]["comment_id"], 9102);
    assert_eq!(raw["updates"][0]["parsed_data"]["progress"], "65%");
    assert_eq!(raw["updates"][1]["comment_id"], 9202);
    assert_eq!(raw["failures"][0]["issue_number"], 999);

    let board = report["board_report"].as_str().unwrap();
    assert!(board.contains("https://github.com/LDFLK/launch/issues/151"));
    assert!(board.contains("## Issues Not Retrieved"));
}

#[test]
fn test_report_from_issues_file() {
    let server = MockServer::start();
    mock_issue(&server, 152);

    let home = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let issues = out.path().join("issues.txt");
    std::fs::write(&issues, "# dashboard\n152\n").unwrap();
    let output = out.path().join("report.json");

    epicwatch(&home)
        .args(["report", "--repo", "LDFLK/launch", "--date", "2025-08-01"])
        .args(["--end-date", "2025-08-06"])
        .arg("-f")
        .arg(&issues)
        .arg("--output")
        .arg(&output)
        .arg("--base-url")
        .arg(server.base_url())
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 1 EPIC update(s) in 1 issue(s)"));

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(report["raw_epic_data"]["updates"][0]["comment_id"], 9201);
}

#[test]
fn test_validation_fails_before_network() {
    let cases: [(&[&str], &str); 5] = [
        (
            &["--repo", "launch", "--date", "2025-08-07", "--issues", "1"],
            "Invalid repository format",
        ),
        (
            &["--repo", "LDFLK/launch", "--date", "2025-8-7", "--issues", "1"],
            "Invalid date format",
        ),
        (
            &["--repo", "LDFLK/launch", "--date", "2025-08-07", "--issues", "x,-3"],
            "No valid issue numbers found",
        ),
        (
            &[
                "--repo", "LDFLK/launch", "--date", "2025-08-07", "--end-date", "2025-08-01",
                "--issues", "1",
            ],
            "is before start date",
        ),
        (
            &["--repo", "LDFLK/launch", "--date", "2025-08-07", "-f", "no-such-file.txt"],
            "not found",
        ),
    ];

    let home = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let output = out.path().join("report.json");

    for (args, expected) in cases {
        epicwatch(&home)
            .arg("report")
            .args(args)
            .arg("--output")
            .arg(&output)
            .args(["--base-url", UNREACHABLE_API])
            .assert()
            .failure()
            .stderr(predicate::str::contains(expected));
        assert!(!output.exists(), "{:?} wrote a report", args);
    }
}

#[test]
fn test_missing_output_directory() {
    let home = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    epicwatch(&home)
        .args(["report", "-r", "LDFLK/launch", "-d", "2025-08-07", "--issues", "151"])
        .arg("-o")
        .arg(out.path().join("missing").join("report.json"))
        .args(["--base-url", UNREACHABLE_API])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_issue_sources_are_exclusive() {
    let home = TempDir::new().unwrap();

    epicwatch(&home)
        .args(["report", "-r", "LDFLK/launch", "-d", "2025-08-07", "-o", "r.json"])
        .args(["--issues", "1", "--issues-file", "issues.txt"])
        .assert()
        .failure()
        .code(2);

    epicwatch(&home)
        .args(["report", "-r", "LDFLK/launch", "-d", "2025-08-07", "-o", "r.json"])
        .assert()
        .failure()
        .code(2);
}

#[cfg(target_os = "linux")]
#[test]
fn test_config_set_get() {
    let home = TempDir::new().unwrap();

    epicwatch(&home)
        .args(["config", "get", "epic.min_body_len"])
        .assert()
        .success()
        .stdout("(not set)\n");

    epicwatch(&home)
        .args(["config", "set", "epic.min_body_len", "60"])
        .assert()
        .success();

    epicwatch(&home)
        .args(["config", "get", "epic.min_body_len"])
        .assert()
        .success()
        .stdout("60\n");

    let saved = std::fs::read_to_string(home.path().join("epicwatch").join("config.toml")).unwrap();
    assert!(saved.contains("min_body_len = 60"));

    epicwatch(&home)
        .args(["config", "set", "epic.min_body_len", "sixty"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid value for epic.min_body_len"));

    epicwatch(&home)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("min_body_len = 60"))
        .stdout(predicate::str::contains("GitHub token: environment (GITHUB_TOKEN)"));
}
