//! Integration tests for the CLI binary.
//!
//! Verifies that the `solvault` binary responds to basic flags and drives
//! custody, signing, and login against a temporary data directory.
//!
//! This test is registered as a [[test]] in the solvault-cli crate
//! so that CARGO_BIN_EXE_solvault is available.

use std::path::Path;
use std::process::{Command, Output, Stdio};

/// Get a Command pointing to the `solvault` binary.
fn solvault_binary() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_solvault"));
    cmd.env_remove("SOLVAULT_PASSPHRASE");
    cmd
}

/// Run against `dir` and return the raw output.
fn run(dir: &Path, args: &[&str]) -> Output {
    solvault_binary()
        .arg("--dir")
        .arg(dir)
        .args(args)
        .output()
        .expect("failed to execute solvault")
}

/// Run against `dir`, require success, and parse stdout as JSON.
fn run_json(dir: &Path, args: &[&str]) -> serde_json::Value {
    let output = run(dir, args);
    assert!(
        output.status.success(),
        "solvault {args:?} should succeed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

fn field(value: &serde_json::Value, name: &str) -> String {
    value[name]
        .as_str()
        .unwrap_or_else(|| panic!("missing string field {name} in {value}"))
        .to_string()
}

#[test]
fn cli_responds_to_help() {
    let output = solvault_binary()
        .arg("--help")
        .output()
        .expect("failed to execute solvault --help");

    assert!(
        output.status.success(),
        "solvault --help should exit with success, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Usage") && stdout.contains("wallet") && stdout.contains("auth"),
        "solvault --help output should list the subcommands, got: {stdout}"
    );
}

#[test]
fn cli_responds_to_version() {
    let output = solvault_binary()
        .arg("--version")
        .output()
        .expect("failed to execute solvault --version");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("solvault") && stdout.contains("0.1"),
        "solvault --version should contain version info, got: {stdout}"
    );
}

#[test]
fn cli_exits_with_error_on_unknown_flag() {
    let output = solvault_binary()
        .arg("--nonexistent-flag")
        .output()
        .expect("failed to execute solvault");

    assert!(
        !output.status.success(),
        "solvault with unknown flag should exit with error"
    );
}

#[test]
fn cli_wallet_sign_and_verify() {
    let dir = tempfile::tempdir().unwrap();

    let created = run_json(dir.path(), &["wallet", "create", "w1"]);
    let public_key = field(&created, "public_key");

    let shown = run_json(dir.path(), &["wallet", "show", "w1", "--public-only"]);
    assert_eq!(field(&shown, "public_key"), public_key);
    assert!(shown.get("private_key").is_none());

    let listed = run_json(dir.path(), &["wallet", "list"]);
    assert_eq!(listed["keys"], serde_json::json!(["w1"]));

    for mode in ["raw", "offchain"] {
        let signed = run_json(
            dir.path(),
            &["wallet", "sign", "w1", "--message", "hello", "--mode", mode],
        );
        let signature = field(&signed, "signature");

        let verified = run_json(
            dir.path(),
            &[
                "wallet", "verify", "w1", "--message", "hello", "--mode", mode,
                "--signature", &signature,
            ],
        );
        assert_eq!(verified["verified"], serde_json::json!(true));

        let tampered = run_json(
            dir.path(),
            &[
                "wallet", "verify", "w1", "--message", "goodbye", "--mode", mode,
                "--signature", &signature,
            ],
        );
        assert_eq!(tampered["verified"], serde_json::json!(false));
    }

    // aGVsbG8= is "hello"
    let from_b64 = run_json(
        dir.path(),
        &["wallet", "sign", "w1", "--message", "aGVsbG8=", "--base64"],
    );
    let from_text = run_json(dir.path(), &["wallet", "sign", "w1", "--message", "hello"]);
    assert_eq!(field(&from_b64, "signature"), field(&from_text, "signature"));
}

#[test]
fn cli_client_errors_exit_with_code_1() {
    let dir = tempfile::tempdir().unwrap();
    run_json(dir.path(), &["wallet", "create", "dup"]);

    let again = run(dir.path(), &["wallet", "create", "dup"]);
    assert_eq!(again.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&again.stderr).contains("already exists"));

    let missing = run(dir.path(), &["wallet", "show", "ghost"]);
    assert_eq!(missing.status.code(), Some(1));

    let bad_id = run(dir.path(), &["wallet", "create", "-leading-dash"]);
    assert!(!bad_id.status.success());

    let bad_key = run(dir.path(), &["auth", "nonce", "not-a-key"]);
    assert_eq!(bad_key.status.code(), Some(1));
}

#[test]
fn cli_challenge_login_flow() {
    let dir = tempfile::tempdir().unwrap();

    run_json(
        dir.path(),
        &["auth", "set-config", "--policy", "ops", "--ttl", "900"],
    );
    let config = run_json(dir.path(), &["auth", "show-config"]);
    assert_eq!(config["token_policies"], serde_json::json!(["ops"]));
    assert_eq!(config["token_ttl"], serde_json::json!(900));
    assert_eq!(config["token_max_ttl"], serde_json::json!(86400));

    // Keep a wallet in custody only to obtain a private key for the client side
    run_json(dir.path(), &["wallet", "create", "client"]);
    let keypair = run_json(dir.path(), &["wallet", "show", "client"]);
    let public_key = field(&keypair, "public_key");
    let private_key = field(&keypair, "private_key");

    let challenge = run_json(dir.path(), &["auth", "nonce", &public_key]);
    let nonce = field(&challenge, "nonce");
    assert!(nonce.starts_with("vault:solana:"));
    assert!(challenge["expires_at"].is_i64());

    let signed = run_json(
        dir.path(),
        &["sign-offline", "--private-key", &private_key, "--message", &nonce],
    );
    assert_eq!(field(&signed, "public_key"), public_key);
    let signature = field(&signed, "signature");

    let login = [
        "auth",
        "login",
        "--public-key",
        &public_key,
        "--nonce",
        &nonce,
        "--signature",
        &signature,
    ];
    let grant = run_json(dir.path(), &login);
    assert_eq!(field(&grant, "identity"), public_key);
    assert_eq!(grant["policies"], serde_json::json!(["ops"]));
    assert_eq!(grant["ttl"], serde_json::json!(900));
    assert_eq!(grant["renewable"], serde_json::json!(true));

    // Replay
    let replay = run(dir.path(), &login);
    assert_eq!(replay.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&replay.stderr).contains("no challenge"));
}

#[test]
fn cli_sealed_storage_with_passphrase() {
    let dir = tempfile::tempdir().unwrap();

    let output = solvault_binary()
        .env("SOLVAULT_PASSPHRASE", "correct horse")
        .arg("--dir")
        .arg(dir.path())
        .args(["wallet", "create", "sealed"])
        .output()
        .expect("failed to execute solvault");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(dir.path().join("seal.salt").exists());

    // Without the passphrase the record cannot be opened: internal fault
    let unsealed = run(dir.path(), &["wallet", "show", "sealed"]);
    assert_eq!(unsealed.status.code(), Some(2));
}

#[test]
fn cli_concurrent_first_runs_share_one_salt() {
    let dir = tempfile::tempdir().unwrap();

    let children: Vec<_> = (0..4)
        .map(|i| {
            solvault_binary()
                .env("SOLVAULT_PASSPHRASE", "correct horse")
                .arg("--dir")
                .arg(dir.path())
                .args(["wallet", "create", &format!("w{i}")])
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .spawn()
                .expect("failed to execute solvault")
        })
        .collect();
    for (i, child) in children.into_iter().enumerate() {
        let output = child.wait_with_output().expect("solvault did not exit");
        assert!(
            output.status.success(),
            "create w{i} stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    }

    // Every record opens under the one salt left on disk
    for i in 0..4 {
        let output = solvault_binary()
            .env("SOLVAULT_PASSPHRASE", "correct horse")
            .arg("--dir")
            .arg(dir.path())
            .args(["wallet", "show", &format!("w{i}"), "--public-only"])
            .output()
            .expect("failed to execute solvault");
        assert!(
            output.status.success(),
            "show w{i} stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    }
    let leftovers = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .count();
    assert_eq!(leftovers, 0);
}
