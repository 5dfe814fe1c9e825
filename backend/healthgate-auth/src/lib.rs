//! Credential authorization facade used by the health-check gate.
//!
//! Provides:
//! - The credential pair submitted with a request and the principal it maps to
//! - The `Authorizer` trait plus plaintext, Argon2id and test implementations
//! - Password hashing with Argon2id
//! - The authorization error taxonomy

use std::fmt;

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as Argon2PasswordHasher, PasswordVerifier,
        SaltString,
    },
    Argon2,
};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Request field carrying the username, in every transport.
pub const USERNAME_FIELD: &str = "X-Username";
/// Request field carrying the password, in every transport.
pub const PASSWORD_FIELD: &str = "X-Password";

/// Login of the built-in admin identity.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
/// Password of the built-in admin identity.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin";

// ============================================================================
// Credentials
// ============================================================================

/// Username/password claim pulled out of a single request transport.
///
/// Either field may be absent; an absent field reads as the empty string.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    username: Option<String>,
    password: Option<String>,
}

impl Credentials {
    #[inline]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    /// Build a claim where either side may be missing.
    #[inline]
    pub fn from_parts(username: Option<String>, password: Option<String>) -> Self {
        Self { username, password }
    }

    /// A claim with neither field present.
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn username(&self) -> &str {
        self.username.as_deref().unwrap_or_default()
    }

    #[inline]
    pub fn password(&self) -> &str {
        self.password.as_deref().unwrap_or_default()
    }

    /// True when neither field was supplied.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.password.is_none()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

// ============================================================================
// Principal
// ============================================================================

/// Identity produced by a successful authorization. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    login: String,
}

impl Principal {
    #[inline]
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
        }
    }

    /// Display name of the authorized identity.
    #[inline]
    pub fn login(&self) -> &str {
        &self.login
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Reasons a request is denied. Every variant maps to the same 403 response.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("no credentials supplied")]
    MissingCredential,
    #[error("credentials do not match")]
    IncorrectCredential,
    #[error("credential payload is not a JSON object")]
    MalformedPayload,
    #[error("credential payload content type is not supported")]
    UnsupportedContentType,
    #[error("authorization subsystem is unavailable: {0}")]
    Subsystem(String),
}

impl AuthError {
    /// False only for failures of the authorization backend itself.
    #[inline]
    pub fn is_credential_failure(&self) -> bool {
        !matches!(self, AuthError::Subsystem(_))
    }
}

/// Password-related errors.
#[derive(Debug, Error, Clone)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    HashingFailed(String),
    #[error("password verification failed")]
    VerificationFailed,
    #[error("invalid hash format")]
    InvalidHashFormat,
}

// ============================================================================
// Outcome
// ============================================================================

/// The single result of gating a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Authorized(Principal),
    Denied(AuthError),
}

impl AuthOutcome {
    #[inline]
    pub fn is_authorized(&self) -> bool {
        matches!(self, AuthOutcome::Authorized(_))
    }

    pub fn principal(&self) -> Option<&Principal> {
        match self {
            AuthOutcome::Authorized(p) => Some(p),
            AuthOutcome::Denied(_) => None,
        }
    }
}

impl From<Result<Principal, AuthError>> for AuthOutcome {
    fn from(result: Result<Principal, AuthError>) -> Self {
        match result {
            Ok(p) => AuthOutcome::Authorized(p),
            Err(e) => AuthOutcome::Denied(e),
        }
    }
}

// ============================================================================
// Authorizer Trait
// ============================================================================

/// Trait for authorization backends. Implement this for production and test authorizers.
#[async_trait::async_trait]
pub trait Authorizer: Send + Sync + 'static {
    async fn authorize(&self, candidate: &Credentials) -> Result<Principal, AuthError>;
}

/// Check a claim against the built-in `admin`/`admin` identity.
pub fn authorize(candidate: &Credentials) -> AuthOutcome {
    StaticAuthorizer::admin().verify(candidate).into()
}

// ============================================================================
// Static Authorizer
// ============================================================================

/// Authorizer holding a single plaintext identity. Comparison is exact and
/// case-sensitive with no trimming.
#[derive(Clone)]
pub struct StaticAuthorizer {
    username: String,
    password: String,
}

impl StaticAuthorizer {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn admin() -> Self {
        Self::new(DEFAULT_ADMIN_USERNAME, DEFAULT_ADMIN_PASSWORD)
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Synchronous check used by the trait implementation.
    pub fn verify(&self, candidate: &Credentials) -> Result<Principal, AuthError> {
        if candidate.is_empty() {
            return Err(AuthError::MissingCredential);
        }
        if candidate.username() == self.username && candidate.password() == self.password {
            Ok(Principal::new(self.username.as_str()))
        } else {
            Err(AuthError::IncorrectCredential)
        }
    }
}

impl fmt::Debug for StaticAuthorizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticAuthorizer")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Default for StaticAuthorizer {
    fn default() -> Self {
        Self::admin()
    }
}

#[async_trait::async_trait]
impl Authorizer for StaticAuthorizer {
    async fn authorize(&self, candidate: &Credentials) -> Result<Principal, AuthError> {
        self.verify(candidate)
    }
}

// ============================================================================
// Hashed Authorizer
// ============================================================================

/// Authorizer holding a username and an Argon2id PHC hash of the password.
#[derive(Debug, Clone)]
pub struct HashedAuthorizer {
    username: String,
    password_hash: String,
    hasher: Argon2Hasher,
}

impl HashedAuthorizer {
    /// Build from a stored PHC hash. The hash must be a complete Argon2id
    /// string (algorithm, valid params, salt and output) so a bad config
    /// fails at startup rather than on the first request.
    pub fn new(
        username: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Result<Self, PasswordError> {
        let password_hash = password_hash.into();
        check_argon2id_hash(&password_hash)?;
        Ok(Self {
            username: username.into(),
            password_hash,
            hasher: Argon2Hasher::new(),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn verify(&self, candidate: &Credentials) -> Result<Principal, AuthError> {
        if candidate.is_empty() {
            return Err(AuthError::MissingCredential);
        }
        if candidate.username() != self.username {
            return Err(AuthError::IncorrectCredential);
        }
        match self.hasher.verify(candidate.password(), &self.password_hash) {
            Ok(()) => Ok(Principal::new(self.username.as_str())),
            Err(PasswordError::VerificationFailed) => Err(AuthError::IncorrectCredential),
            Err(e) => Err(AuthError::Subsystem(e.to_string())),
        }
    }
}

// Argon2 verification is CPU-bound and must not stall the runtime workers.
#[async_trait::async_trait]
impl Authorizer for HashedAuthorizer {
    async fn authorize(&self, candidate: &Credentials) -> Result<Principal, AuthError> {
        let this = self.clone();
        let candidate = candidate.clone();
        tokio::task::spawn_blocking(move || this.verify(&candidate))
            .await
            .map_err(|e| AuthError::Subsystem(format!("password check did not complete: {e}")))?
    }
}

fn check_argon2id_hash(stored_hash: &str) -> Result<(), PasswordError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|_| PasswordError::InvalidHashFormat)?;
    if parsed.algorithm != argon2::Algorithm::Argon2id.ident()
        || parsed.salt.is_none()
        || parsed.hash.is_none()
    {
        return Err(PasswordError::InvalidHashFormat);
    }
    argon2::Params::try_from(&parsed).map_err(|_| PasswordError::InvalidHashFormat)?;
    Ok(())
}

// ============================================================================
// Test Authorizer
// ============================================================================

/// Test-only authorizer returning a fixed outcome regardless of input.
#[derive(Debug, Clone)]
pub struct TestAuthorizer {
    outcome: Result<Principal, AuthError>,
}

impl TestAuthorizer {
    pub fn allow(login: impl Into<String>) -> Self {
        Self {
            outcome: Ok(Principal::new(login)),
        }
    }

    pub fn deny(error: AuthError) -> Self {
        Self { outcome: Err(error) }
    }
}

#[async_trait::async_trait]
impl Authorizer for TestAuthorizer {
    async fn authorize(&self, _candidate: &Credentials) -> Result<Principal, AuthError> {
        self.outcome.clone()
    }
}

// ============================================================================
// Password Hashing
// ============================================================================

/// Password hasher using Argon2id.
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    /// Memory cost in KiB (default: 19456 = 19 MiB)
    m_cost: u32,
    /// Time cost / iterations (default: 2)
    t_cost: u32,
    /// Parallelism factor (default: 1)
    p_cost: u32,
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        // OWASP recommended minimum parameters for Argon2id
        Self {
            m_cost: 19456,
            t_cost: 2,
            p_cost: 1,
        }
    }
}

impl Argon2Hasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure memory cost in KiB.
    pub fn with_memory_cost(mut self, kib: u32) -> Self {
        self.m_cost = kib;
        self
    }

    /// Configure time cost (iterations).
    pub fn with_time_cost(mut self, iterations: u32) -> Self {
        self.t_cost = iterations;
        self
    }

    fn argon2(&self) -> Result<Argon2<'_>, PasswordError> {
        let params = argon2::Params::new(self.m_cost, self.t_cost, self.p_cost, None)
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;
        Ok(Argon2::new(
            argon2::Algorithm::Argon2id,
            argon2::Version::V0x13,
            params,
        ))
    }

    /// Hash a password, returning the PHC-format hash string.
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()?
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }

    /// Verify a password against a stored PHC-format hash. Cost parameters
    /// are taken from the stored hash.
    pub fn verify(&self, password: &str, stored_hash: &str) -> Result<(), PasswordError> {
        let parsed =
            PasswordHash::new(stored_hash).map_err(|_| PasswordError::InvalidHashFormat)?;

        self.argon2()?
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| PasswordError::VerificationFailed)
    }
}

/// Hash a password using default Argon2id parameters.
#[inline]
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    Argon2Hasher::new().hash(password)
}

/// Short SHA-256 fingerprint (first 12 hex chars) for logging key material
/// without revealing it.
pub fn fingerprint(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    let mut hex = hex::encode(digest);
    hex.truncate(12);
    hex
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hasher() -> Argon2Hasher {
        Argon2Hasher::new().with_memory_cost(1024).with_time_cost(1)
    }

    #[test]
    fn admin_admin_is_authorized() {
        let outcome = authorize(&Credentials::new("admin", "admin"));
        assert!(outcome.is_authorized());
        assert_eq!(outcome.principal().map(Principal::login), Some("admin"));
    }

    #[test]
    fn anything_else_is_denied() {
        let cases = [
            Credentials::new("admin", "wrong password"),
            Credentials::new("Admin", "admin"),
            Credentials::new("admin", "ADMIN"),
            Credentials::new("admin ", "admin"),
            Credentials::new("admin", " admin"),
            Credentials::new("", ""),
            Credentials::new("root", "admin"),
            Credentials::from_parts(None, Some("admin".into())),
            Credentials::from_parts(Some("admin".into()), None),
        ];
        for c in cases {
            let outcome = authorize(&c);
            assert_eq!(
                outcome,
                AuthOutcome::Denied(AuthError::IncorrectCredential),
                "{c:?} should be denied"
            );
        }
    }

    #[test]
    fn absent_credentials_are_missing() {
        let outcome = authorize(&Credentials::empty());
        assert_eq!(outcome, AuthOutcome::Denied(AuthError::MissingCredential));
    }

    #[test]
    fn absent_fields_read_as_empty() {
        let c = Credentials::from_parts(Some("admin".into()), None);
        assert_eq!(c.username(), "admin");
        assert_eq!(c.password(), "");
        assert!(!c.is_empty());
    }

    #[test]
    fn debug_redacts_password() {
        let rendered = format!("{:?}", Credentials::new("admin", "s3cret"));
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("s3cret"));
    }

    #[test]
    fn static_authorizer_debug_redacts_password() {
        let rendered = format!("{:?}", StaticAuthorizer::new("ops", "s3cret"));
        assert!(rendered.contains("ops"));
        assert!(!rendered.contains("s3cret"));
    }

    #[test]
    fn subsystem_errors_are_not_credential_failures() {
        assert!(AuthError::IncorrectCredential.is_credential_failure());
        assert!(AuthError::UnsupportedContentType.is_credential_failure());
        assert!(!AuthError::Subsystem("down".into()).is_credential_failure());
    }

    #[test]
    fn password_hash_and_verify() {
        let hasher = fast_hasher();
        let hash = hasher.hash("supersecret123").expect("hash should succeed");
        assert!(hash.starts_with("$argon2id$"));

        hasher
            .verify("supersecret123", &hash)
            .expect("verification should succeed");
        assert!(hasher.verify("wrongpassword", &hash).is_err());
    }

    #[test]
    fn hashed_authorizer_rejects_bad_hash() {
        let good = fast_hasher().hash("admin").expect("hash");
        let argon2i = good.replacen("$argon2id$", "$argon2i$", 1);
        let (no_output, _) = good.rsplit_once('$').expect("phc segments");

        for bad in [
            "not-a-phc-string",
            "$argon2id$garbage",
            "$argon2id$v=19$m=1024,t=1,p=1",
            no_output,
            argon2i.as_str(),
            "$argon2id$v=19$m=1,t=1,p=1$c29tZXNhbHQ$aGFzaGhhc2hoYXNoaGFzaA",
        ] {
            assert!(
                matches!(
                    HashedAuthorizer::new("admin", bad),
                    Err(PasswordError::InvalidHashFormat)
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn hashed_authorizer_through_trait() {
        let hash = fast_hasher().hash("admin").expect("hash");
        let auth: Box<dyn Authorizer> =
            Box::new(HashedAuthorizer::new("admin", hash).expect("authorizer"));
        let p = auth
            .authorize(&Credentials::new("admin", "admin"))
            .await
            .expect("authorized");
        assert_eq!(p.login(), "admin");
        assert_eq!(
            auth.authorize(&Credentials::new("admin", "nope")).await,
            Err(AuthError::IncorrectCredential)
        );
    }

    #[test]
    fn hashed_authorizer_verifies() {
        let hash = fast_hasher().hash("admin").expect("hash");
        let auth = HashedAuthorizer::new("admin", hash).expect("authorizer");

        let ok = auth.verify(&Credentials::new("admin", "admin")).expect("ok");
        assert_eq!(ok.login(), "admin");
        assert_eq!(
            auth.verify(&Credentials::new("admin", "nope")),
            Err(AuthError::IncorrectCredential)
        );
        assert_eq!(
            auth.verify(&Credentials::new("other", "admin")),
            Err(AuthError::IncorrectCredential)
        );
        assert_eq!(
            auth.verify(&Credentials::empty()),
            Err(AuthError::MissingCredential)
        );
    }

    #[test]
    fn fingerprint_is_short_hex() {
        let fp = fingerprint(b"admin");
        assert_eq!(fp.len(), 12);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn static_authorizer_through_trait() {
        let auth: Box<dyn Authorizer> = Box::new(StaticAuthorizer::new("ops", "pa55"));
        let p = auth
            .authorize(&Credentials::new("ops", "pa55"))
            .await
            .expect("authorized");
        assert_eq!(p.login(), "ops");
        assert!(auth
            .authorize(&Credentials::new("admin", "admin"))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn concurrent_authorizations_are_independent() {
        let auth = std::sync::Arc::new(StaticAuthorizer::admin());
        let mut handles = Vec::new();
        for i in 0..32 {
            let auth = auth.clone();
            handles.push(tokio::spawn(async move {
                let c = if i % 2 == 0 {
                    Credentials::new("admin", "admin")
                } else {
                    Credentials::new("admin", format!("wrong-{i}"))
                };
                (i, auth.authorize(&c).await.is_ok())
            }));
        }
        for h in handles {
            let (i, ok) = h.await.expect("join");
            assert_eq!(ok, i % 2 == 0);
        }
    }

    #[tokio::test]
    async fn test_authorizer_fixed_outcomes() {
        let allow = TestAuthorizer::allow("tester");
        let deny = TestAuthorizer::deny(AuthError::Subsystem("offline".into()));
        let c = Credentials::empty();
        assert_eq!(allow.authorize(&c).await.unwrap().login(), "tester");
        assert_eq!(
            deny.authorize(&c).await,
            Err(AuthError::Subsystem("offline".into()))
        );
    }
}
