use std::process::{Command, Output};

fn run_cli(args: &[&str]) -> (Output, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let log_file = dir.path().join("provision.log");
    let output = Command::new(env!("CARGO_BIN_EXE_tunnel-provision"))
        .args(args)
        .arg("--log-file")
        .arg(&log_file)
        .env("INSTALL_DIR", dir.path().join("tunnel"))
        .output()
        .unwrap();
    (output, dir)
}

#[test]
fn unknown_role_exits_one_with_a_single_diagnostic() {
    let (output, dir) = run_cli(&["relay", "5300", "1.1.1.1:53", "t.example.com"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8(output.stderr).unwrap();
    let lines: Vec<&str> = stderr.lines().collect();
    assert_eq!(lines.len(), 1, "{stderr}");
    assert!(lines[0].starts_with("error: "), "{stderr}");
    assert!(lines[0].contains("precondition failed"), "{stderr}");
    assert!(!dir.path().join("tunnel").exists());
}

#[test]
fn missing_role_exits_one() {
    let (output, _dir) = run_cli(&[]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert_eq!(stderr.lines().count(), 1, "{stderr}");
    assert!(stderr.contains("precondition failed"), "{stderr}");
}

#[test]
fn help_exits_zero() {
    let output = Command::new(env!("CARGO_BIN_EXE_tunnel-provision"))
        .arg("--help")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("tunnel-provision"));
}
