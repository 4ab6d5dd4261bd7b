//! Runs the built binary end to end

use std::io::Write;
use std::process::{Command, Output};

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_vmprint-cli"))
        .args(args)
        .output()
        .expect("failed to run vmprint-cli")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn prints_to_stdout() {
    let output = run(&["%d apples", "7"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "7 apples\n");
}

#[test]
fn errors_go_to_stderr() {
    let output = run(&["-q", "--error", "code=%d msg=%s", "500", "fail"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "");
    assert_eq!(stderr(&output), "code=500 msg=fail\n");
}

#[test]
fn empty_format_prints_empty_line() {
    let output = run(&["", "ignored"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "\n");
}

#[test]
fn typed_arguments() {
    let output = run(&["%s|%5.2f|%x|%p", "s:42", "f:3", "u:255", "p:0x10", "--handle", "0x2a"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "42| 3.00|ff|0x10\n");
}

#[test]
fn negative_arguments_are_values() {
    let output = run(&["%d %d", "-5", "i:-6"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "-5 -6\n");
}

#[test]
fn config_selects_sinks() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[sinks]\nprint = \"stderr\"\nprefix_handle = true").unwrap();

    let output = run(&[
        "-q",
        "--config",
        file.path().to_str().unwrap(),
        "--handle",
        "42",
        "hello %s",
        "world",
    ]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "");
    assert_eq!(stderr(&output), "[vm 0x2a] hello world\n");
}

#[test]
fn message_limit_from_config() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[forwarder]\nmax_message_len = 4").unwrap();

    let output = run(&["--config", file.path().to_str().unwrap(), "%s", "too long"]);
    assert!(!output.status.success());
    assert_eq!(stdout(&output), "");
    assert!(stderr(&output).contains("Failed to format"));
}

#[test]
fn format_errors_fail() {
    let output = run(&["%d and %d", "1"]);
    assert!(!output.status.success());
    assert_eq!(stdout(&output), "");
    assert!(stderr(&output).contains("Failed to format"));
}

#[test]
fn invalid_handle_is_rejected() {
    let output = run(&["--handle", "vm", "x"]);
    assert!(!output.status.success());
}
