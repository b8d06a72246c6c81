//! CLI tests for the `trustkit` binary
//!
//! Only loopback or refused destinations are used; nothing leaves the host.

use std::process::{Command, Output};

fn trustkit(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_trustkit"))
        .args(args)
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn auth_encode_prints_header_value() {
    let out = trustkit(&["auth", "encode", "alice", "pa:ss"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out), "Basic YWxpY2U6cGE6c3M=\n");
}

#[test]
fn auth_decode_prints_credentials() {
    let out = trustkit(&["auth", "decode", "Basic YWxpY2U6cGE6c3M="]);
    assert!(out.status.success());
    assert_eq!(stdout(&out), "alice\npa:ss\n");
}

#[test]
fn auth_decode_rejects_other_schemes() {
    let out = trustkit(&["auth", "decode", "Bearer abcd"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("invalid basic auth header"));
}

#[test]
fn check_addr_classifies() {
    assert_eq!(stdout(&trustkit(&["check-addr", "[::1]:443"])), "local\n");
    assert_eq!(stdout(&trustkit(&["check-addr", "localhost:80"])), "local\n");
    assert_eq!(
        stdout(&trustkit(&["check-addr", "93.184.216.34:80"])),
        "remote\n"
    );
    assert_eq!(stdout(&trustkit(&["check-addr", "bad-addr"])), "remote\n");
}

#[test]
fn fetch_local_only_refuses_remote() {
    let out = trustkit(&["fetch", "--local-only", "http://93.184.216.34/"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("connection refused"));
}

#[test]
fn auth_decode_passes_latin1_bytes_through() {
    // "j\xf6rg:pw" in ISO-8859-1
    let out = trustkit(&["auth", "decode", "Basic avZyZzpwdw=="]);
    assert!(out.status.success());
    assert_eq!(out.stdout, b"j\xf6rg\npw\n");
}
