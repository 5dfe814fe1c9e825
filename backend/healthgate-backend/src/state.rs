use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use healthgate_auth::{AuthError, AuthOutcome, Authorizer, Credentials};
use tracing::{debug, warn};

use crate::credentials::Transport;

/// Shared application state passed to every route handler.
#[derive(Clone)]
pub struct AppState {
    // Arc-wrapped RwLock so the inner authorizer can be swapped on config reload.
    authorizer: Arc<RwLock<Arc<dyn Authorizer>>>,
    auth_timeout: Duration,
}

impl AppState {
    pub fn new(authorizer: Arc<dyn Authorizer>, auth_timeout: Duration) -> Self {
        Self {
            authorizer: Arc::new(RwLock::new(authorizer)),
            auth_timeout,
        }
    }

    /// Atomically get a clone of the current authorizer.
    pub fn authorizer(&self) -> Arc<dyn Authorizer> {
        let guard = self
            .authorizer
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        guard.clone()
    }

    /// Atomically swap the authorizer, returning the previous one.
    pub fn swap_authorizer(&self, new: Arc<dyn Authorizer>) -> Arc<dyn Authorizer> {
        let mut guard = self
            .authorizer
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, new)
    }

    /// Turn an extraction result into the request's single authorization outcome.
    ///
    /// Extraction failures, authorizer errors and timeouts all end up as
    /// `Denied`. The authorizer call completes (or times out) before this returns.
    pub async fn gate(
        &self,
        transport: Option<Transport>,
        extracted: Result<Credentials, AuthError>,
    ) -> AuthOutcome {
        let transport = transport.map(|t| t.as_label()).unwrap_or("none");

        let result = match extracted {
            Ok(candidate) => {
                let authorizer = self.authorizer();
                match tokio::time::timeout(self.auth_timeout, authorizer.authorize(&candidate))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(AuthError::Subsystem("authorization timed out".into())),
                }
            }
            Err(e) => Err(e),
        };

        match &result {
            Ok(principal) => debug!(login = principal.login(), transport, "request authorized"),
            Err(e) if e.is_credential_failure() => {
                debug!(reason = %e, transport, "request denied")
            }
            Err(e) => warn!(reason = %e, transport, "authorizer failed; denying request"),
        }

        AuthOutcome::from(result)
    }
}
