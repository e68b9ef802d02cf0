//! The pre-network half of the pipeline: configuration, known-hosts parsing,
//! and key decryption all succeed or fail before any socket is opened.

use std::env;
use std::path::Path;

use faraway::config::{
    ConfigError, RunConfig, ENV_KNOWN_HOST_SHA, ENV_PASSWORD, ENV_PRIVATE_KEY_FILE_PATH,
    ENV_REMOTE_HOST, ENV_REMOTE_USER,
};
use faraway::identity::{self, IdentityError};
use faraway::session::{SessionOptions, CONNECT_TIMEOUT};
use faraway::trust::{self, TrustError};

const PASSPHRASE: &str = "far far away";
const HOST_KEY_BASE64: &str = "AAAAC3NzaC1lZDI1NTE5AAAAIDzEH+V9JHfrFqkXCzx2Zokz/IJHkcxI4uiRWg3erYmg";

fn fixture(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(name)
}

/// All env manipulation lives in this single test; the others stay off the
/// process environment so parallel execution is safe.
#[test]
fn config_round_trips_through_the_environment() {
    let key_path = fixture("enc_ed25519");
    let entry = format!("build.example.com ssh-ed25519 {HOST_KEY_BASE64}");

    env::set_var(ENV_REMOTE_USER, "deploy");
    env::set_var(ENV_PASSWORD, PASSPHRASE);
    env::set_var(ENV_REMOTE_HOST, "build.example.com");
    env::set_var(ENV_PRIVATE_KEY_FILE_PATH, &key_path);
    env::set_var(ENV_KNOWN_HOST_SHA, &entry);

    let config = RunConfig::from_env().expect("config should resolve");
    assert_eq!(config.username, "deploy");
    assert_eq!(config.host, "build.example.com");
    assert_eq!(config.port, 22);
    assert_eq!(config.private_key_path, key_path);
    assert_eq!(config.known_host_entry, entry);

    env::remove_var(ENV_PASSWORD);
    match RunConfig::from_env() {
        Err(ConfigError::Missing(name)) => assert_eq!(name, ENV_PASSWORD),
        other => panic!("expected a missing-variable error, got {other:?}"),
    }
}

#[tokio::test]
async fn credentials_resolve_before_any_dial() {
    let host_key = trust::parse_known_hosts_entry(&format!(
        "build.example.com ssh-ed25519 {HOST_KEY_BASE64}"
    ))
    .expect("known-hosts entry should parse");
    assert_eq!(host_key.algorithm().as_str(), "ssh-ed25519");

    let identity = identity::load_identity(&fixture("enc_ed25519"), PASSPHRASE)
        .await
        .expect("key should decrypt");
    assert_eq!(identity.algorithm().as_str(), "ssh-ed25519");
}

#[tokio::test]
async fn wrong_passphrase_fails_before_any_dial() {
    match identity::load_identity(&fixture("enc_ed25519"), "wrong").await {
        Err(IdentityError::Decrypt(_)) => {}
        Err(err) => panic!("expected a decrypt error, got {err:?}"),
        Ok(_) => panic!("decryption should fail"),
    }
}

#[tokio::test]
async fn unreadable_key_path_is_a_read_error() {
    match identity::load_identity(&fixture("no_such_key"), PASSPHRASE).await {
        Err(IdentityError::Read(_)) => {}
        Err(err) => panic!("expected a read error, got {err:?}"),
        Ok(_) => panic!("read should fail"),
    }
}

#[test]
fn malformed_known_hosts_entry_aborts_the_run() {
    let err = trust::parse_known_hosts_entry("not a known hosts line at all !!!")
        .expect_err("parse should fail");
    assert!(
        matches!(err, TrustError::Malformed(_) | TrustError::UnparsableKey(_)),
        "got {err:?}"
    );
}

#[test]
fn session_defaults_match_the_demo_contract() {
    let options = SessionOptions::new("build.example.com", "deploy");
    assert_eq!(options.port, 22);
    assert_eq!(options.connect_timeout, CONNECT_TIMEOUT);
    assert_eq!(options.connect_timeout.as_secs(), 10);
    assert!(options.host_key_algorithms.is_none());
}
