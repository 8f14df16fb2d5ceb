#![cfg(all(unix, feature = "cli"))]

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "vnalink-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn vnalink(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_vnalink"))
        .args(["--log-level", "error"])
        .args(args)
        .output()
        .expect("vnalink should run")
}

fn vnalink_with_stdin(args: &[&str], stdin: &[u8]) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_vnalink"))
        .args(["--log-level", "error"])
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("vnalink should start");
    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(stdin)
        .expect("stdin should accept input");
    child.wait_with_output().expect("vnalink should finish")
}

#[test]
fn encode_ack_writes_raw_frame() {
    let output = vnalink(&["--format", "raw", "encode", "--json", r#"{"kind":"ack"}"#]);
    assert!(output.status.success());
    assert_eq!(output.stdout, vec![0x5A, 0x07, 0x2E, 0x7A, 0x66, 0x4C, 0xA5]);
}

#[test]
fn encode_json_reports_hex() {
    let output = vnalink(&["--format", "json", "encode", "--json", r#"{"kind":"nack"}"#]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"kind\":\"Nack\""));
    assert!(stdout.contains("\"hex\":\"5a 0a "));
}

#[test]
fn encode_then_decode_pipeline() {
    let record = r#"{"kind":"generator_settings","frequency":2400000000,"level_cdbm":-1500,"active_port":1}"#;
    let encoded = vnalink(&["--format", "raw", "encode", "--json", record]);
    assert!(encoded.status.success());

    let mut wire = b"noise".to_vec();
    wire.extend_from_slice(&encoded.stdout);
    let decoded = vnalink_with_stdin(&["--format", "json", "decode"], &wire);
    assert!(decoded.status.success());

    let stdout = String::from_utf8_lossy(&decoded.stdout);
    assert_eq!(stdout.lines().count(), 1);
    assert!(stdout.contains("\"status\":\"ok\""));
    assert!(stdout.contains("\"kind\":\"generator_settings\""));
    assert!(stdout.contains("\"frequency\":2400000000"));
}

#[test]
fn decode_hex_reports_rejections() {
    // Ack with one corrupted checksum byte, then a clean Ack.
    let hex = "5a 07 2e 7a 66 4d a5  5a 07 2e 7a 66 4c a5";
    let output = vnalink_with_stdin(&["--format", "json", "decode", "--hex"], hex.as_bytes());
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("\"status\":\"rejected\""));
    assert!(lines[0].contains("checksum mismatch"));
    assert!(lines[1].contains("\"kind\":\"ack\""));
}

#[test]
fn decode_strict_returns_60_on_rejections() {
    let output = vnalink_with_stdin(
        &["--format", "json", "decode", "--hex", "--strict"],
        b"5a a5 5a 07 2e 7a 66 4c a5",
    );
    assert_eq!(output.status.code(), Some(60));
    assert!(String::from_utf8_lossy(&output.stderr).contains("rejected"));
}

#[test]
fn decode_missing_file_returns_66() {
    let output = vnalink(&["decode", "/nonexistent/vnalink/capture.bin"]);
    assert_eq!(output.status.code(), Some(66));
}

#[test]
fn encode_invalid_json_returns_64() {
    let output = vnalink(&["encode", "--json", r#"{"kind":"bogus"}"#]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn firmware_plan_and_emit() {
    let dir = unique_temp_dir("plan");
    let image = dir.join("image.bin");
    let emitted = dir.join("update.bin");
    std::fs::write(&image, vec![0x5Au8; 600]).expect("image should be writable");

    let output = vnalink(&[
        "--format",
        "json",
        "firmware",
        "plan",
        image.to_str().expect("utf-8 path"),
        "--base-address",
        "0x08000000",
        "--emit",
        emitted.to_str().expect("utf-8 path"),
    ]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"chunks\":3"));
    assert!(stdout.contains("\"base_address\":134217728"));

    let decoded = vnalink(&[
        "--format",
        "pretty",
        "decode",
        emitted.to_str().expect("utf-8 path"),
    ]);
    assert!(decoded.status.success());
    let stdout = String::from_utf8_lossy(&decoded.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[0].contains("kind=ClearFlash"));
    assert!(lines[1].contains("address=0x08000000"));
    assert!(lines[4].contains("kind=PerformFirmwareUpdate"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn version_prints_package_version() {
    let output = vnalink(&["version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), format!("vnalink {}", env!("CARGO_PKG_VERSION")));
}

#[test]
fn version_extended_reports_build_facts() {
    let output = vnalink(&["version", "--extended"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("build_target: unknown"));
    assert!(stdout.contains("build_profile: debug") || stdout.contains("build_profile: release"));
    assert!(stdout.contains("max_frame_len: 532"));
}

#[test]
fn logs_never_reach_stdout() {
    let output = Command::new(env!("CARGO_BIN_EXE_vnalink"))
        .args(["--log-level", "trace", "--format", "raw", "encode", "--json"])
        .arg(r#"{"kind":"ack"}"#)
        .output()
        .expect("vnalink should run");
    assert!(output.status.success());
    assert_eq!(output.stdout, vec![0x5A, 0x07, 0x2E, 0x7A, 0x66, 0x4C, 0xA5]);
    assert!(String::from_utf8_lossy(&output.stderr).contains("encoded record"));
}
