use std::io::Write;

use healthgate_auth::{Argon2Hasher, Authorizer, Credentials};
use healthgate_backend::auth_builder::build_authorizer_from_config;
use healthgate_config::Config;

#[tokio::test]
async fn plaintext_config_builds_static_authorizer() {
    let cfg = Config::default();
    let (authorizer, info) = build_authorizer_from_config(&cfg).expect("build");
    assert_eq!(info.mode, "plaintext");
    assert_eq!(info.username, "admin");
    assert_eq!(info.fingerprint.len(), 12);

    let principal = authorizer
        .authorize(&Credentials::new("admin", "admin"))
        .await
        .expect("admin accepted");
    assert_eq!(principal.login(), "admin");
    assert!(authorizer
        .authorize(&Credentials::new("admin", "nope"))
        .await
        .is_err());
}

#[tokio::test]
async fn hash_takes_priority_over_password() {
    let hash = Argon2Hasher::new()
        .with_memory_cost(1024)
        .with_time_cost(1)
        .hash("s3cret")
        .expect("hash");

    let mut cfg = Config::default();
    cfg.auth.username = "ops".into();
    cfg.auth.password_hash = Some(hash);

    let (authorizer, info) = build_authorizer_from_config(&cfg).expect("build");
    assert_eq!(info.mode, "argon2id(hash)");
    assert!(authorizer
        .authorize(&Credentials::new("ops", "s3cret"))
        .await
        .is_ok());
    // The plaintext default password is ignored once a hash is set.
    assert!(authorizer
        .authorize(&Credentials::new("ops", "admin"))
        .await
        .is_err());
}

#[test]
fn invalid_hash_is_rejected() {
    let mut cfg = Config::default();
    cfg.auth.password_hash = Some("$argon2id$garbage".into());
    assert!(build_authorizer_from_config(&cfg).is_err());
}

#[test]
fn missing_secret_is_rejected() {
    let mut cfg = Config::default();
    cfg.auth.password = None;
    cfg.auth.password_hash = None;
    assert!(build_authorizer_from_config(&cfg).is_err());
}

#[test]
fn config_file_drives_authorizer() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("tempfile");
    writeln!(
        file,
        "[auth]\nusername = \"monitor\"\npassword = \"probe\"\n\n[server]\nport = 9191"
    )
    .expect("write");

    let raw = healthgate_config::load_raw_from_file(file.path()).expect("parse");
    let mut cfg = Config::default();
    healthgate_config::merge_raw(&mut cfg, raw);
    healthgate_config::validate_config(&cfg).expect("valid");

    assert_eq!(cfg.server.port, 9191);
    let (_, info) = build_authorizer_from_config(&cfg).expect("build");
    assert_eq!(info.username, "monitor");
    assert_eq!(info.mode, "plaintext");
}
