//! The compiled binary's failure path.

use std::process::{Command, Stdio};

use sessiongen::prompt::PHONE_LABEL;

#[test]
fn invalid_api_id_exits_with_status_1() {
    let output = Command::new(env!("CARGO_BIN_EXE_sessiongen"))
        .current_dir(std::env::temp_dir())
        .env("API_ID", "abc")
        .env("API_HASH", "0123456789abcdef")
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .stdin(Stdio::null())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(r#"API_ID must be a positive number, got "abc""#), "{stdout}");
    assert!(
        !stdout.lines().any(|l| l.starts_with('1') && l.len() > 300),
        "no session line expected:\n{stdout}"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains(PHONE_LABEL), "phone prompt shown:\n{stderr}");
}
