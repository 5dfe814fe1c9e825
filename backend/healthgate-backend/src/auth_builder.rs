use std::sync::Arc;

use healthgate_auth::{fingerprint, Authorizer, HashedAuthorizer, StaticAuthorizer};

/// Metadata about the configured identity for logging purposes.
#[derive(Debug, Clone)]
pub struct AuthKeyInfo {
    pub mode: &'static str,
    pub username: String,
    pub fingerprint: String,
}

/// Result of building an authorizer: the trait object and associated metadata.
pub type AuthResult = Result<(Arc<dyn Authorizer>, AuthKeyInfo), String>;

/// Build the authorizer from config.
///
/// Prefers `auth.password_hash` (Argon2id) over a plaintext `auth.password`.
pub fn build_authorizer_from_config(cfg: &healthgate_config::Config) -> AuthResult {
    let username = cfg.auth.username.clone();

    if let Some(ref hash) = cfg.auth.password_hash {
        let auth = HashedAuthorizer::new(username.clone(), hash.clone())
            .map_err(|e| format!("invalid auth.password_hash: {e}"))?;
        return Ok((
            Arc::new(auth),
            AuthKeyInfo {
                mode: "argon2id(hash)",
                username,
                fingerprint: fingerprint(hash.as_bytes()),
            },
        ));
    }

    if let Some(ref password) = cfg.auth.password {
        let auth = StaticAuthorizer::new(username.clone(), password.clone());
        return Ok((
            Arc::new(auth),
            AuthKeyInfo {
                mode: "plaintext",
                username,
                fingerprint: fingerprint(password.as_bytes()),
            },
        ));
    }

    Err("no credentials configured: set auth.password or auth.password_hash".into())
}
