//! CLI integration tests.
//!
//! These tests exercise the CLI commands end-to-end. None of them touches the
//! network: advertisement is suppressed before any responder starts.

use std::io::Write;
use std::process::{Command, Stdio};

const RECORD: &str = "hostname=host\n\
    project_name=project\n\
    device_name=device\n\
    device_id=device_id\n\
    target_platform=android\n\
    mode=debug\n\
    ws_uri=http://127.0.0.1:1234/auth/\n\
    epoch=0\n\
    pid=1\n\
    flutter_version=1.0.0\n\
    dart_version=2.0.0\n\
    dtdUri=http://127.0.0.1:4321/auth/\n";

fn vmbeacon() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_vmbeacon"));
    command
        .env_remove("VMBEACON_ENABLE_LOCAL_DISCOVERY")
        .env_remove("RUST_LOG");
    command
}

#[test]
fn test_help_command() {
    let output = vmbeacon()
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("advertise"));
    assert!(stdout.contains("browse"));
    assert!(stdout.contains("parse"));
}

#[test]
fn test_version_command() {
    let output = vmbeacon()
        .arg("--version")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("vmbeacon"));
}

#[test]
fn test_parse_file() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("record.txt");
    std::fs::write(&path, RECORD).expect("Failed to write record");

    let output = vmbeacon()
        .arg("parse")
        .arg(&path)
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is not JSON");
    assert_eq!(json["dtdUri"], "http://127.0.0.1:4321/auth/");
    assert_eq!(json["ws_uri"], "http://127.0.0.1:1234/auth/");
}

#[test]
fn test_parse_stdin() {
    let mut child = vmbeacon()
        .arg("parse")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("Failed to spawn command");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(RECORD.replace("dtdUri=http://127.0.0.1:4321/auth/\n", "").as_bytes())
        .expect("Failed to write stdin");

    let output = child.wait_with_output().expect("Failed to wait");
    assert!(output.status.success());
    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is not JSON");
    assert!(json.get("dtdUri").is_none());
    assert_eq!(json["project_name"], "project");
}

#[test]
fn test_log_file_receives_logs() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let record = temp_dir.path().join("record.txt");
    std::fs::write(&record, RECORD).expect("Failed to write record");
    let log_file = temp_dir.path().join("logs").join("vmbeacon.log");

    let output = vmbeacon()
        .arg("--verbose")
        .arg("--log-file")
        .arg(&log_file)
        .arg("parse")
        .arg(&record)
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let logs = std::fs::read_to_string(&log_file).expect("log file was not created");
    assert!(logs.contains("Parsing observation record"));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains("Parsing observation record"));
}

#[test]
fn test_parse_malformed_fails() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("record.txt");
    std::fs::write(&path, "hostname=host\n").expect("Failed to write record");

    let output = vmbeacon()
        .arg("parse")
        .arg(&path)
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("malformed observation record"));
}

#[test]
fn test_advertise_with_local_discovery_disabled() {
    let output = vmbeacon()
        .args([
            "advertise",
            "--app-name",
            "counter",
            "--vm-service-uri",
            "http://127.0.0.1:1234/auth/",
            "--no-local-discovery",
        ])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("mDNS local discovery is disabled."));
}

#[test]
fn test_advertise_disabled_by_config_file() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = temp_dir.path().join("config.json");
    std::fs::write(&config, r#"{"enable_local_discovery": false}"#)
        .expect("Failed to write config");

    let output = vmbeacon()
        .arg("--config")
        .arg(&config)
        .args(["advertise", "--app-name", "counter"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("mDNS local discovery is disabled."));
}

#[test]
fn test_missing_config_file_fails() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");

    let output = vmbeacon()
        .arg("--config")
        .arg(temp_dir.path().join("absent.json"))
        .args(["advertise", "--app-name", "counter"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("config file not found"));
}
