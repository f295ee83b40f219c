use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use portal_backend::{RpcRequest, RpcTransport};
use portal_domain::{CoreError, Identity};
use serde_json::{json, Value};

const METHOD_LOGIN: &str = "login";
const METHOD_LOGOUT: &str = "logout";
const METHOD_LOGGED_USER: &str = "frappe.auth.get_logged_user";

/// The unauthenticated placeholder user the backend reports when no
/// session cookie is present.
const GUEST_USER: &str = "Guest";

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Where the session stands. `Unknown` is the startup state before the
/// first resolution completes; callers must not treat it as a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Unknown,
    Authenticated(Identity),
    Unauthenticated,
}

impl SessionStatus {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionStatus::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, SessionStatus::Unknown)
    }
}

/// Authentication seam. Production talks to the billing backend's session
/// endpoints; tests stub it.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<Identity, CoreError>;
    async fn logout(&self) -> Result<(), CoreError>;
    /// Asks the backend who the session cookie belongs to. `None` means the
    /// session is anonymous, not that the check failed.
    async fn current_identity(&self) -> Result<Option<Identity>, CoreError>;
}

/// Tracks session status for the rest of the portal. Starts `Unknown` and
/// only leaves it once a resolution or an explicit login/logout lands.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    status: SessionStatus,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.status.identity()
    }

    /// Resolves the current session against the provider. A transport
    /// failure leaves the status `Unknown` so callers keep rendering the
    /// loading state instead of bouncing the user to login.
    pub async fn resolve(&mut self, provider: &dyn AuthProvider) -> Result<(), CoreError> {
        match provider.current_identity().await {
            Ok(Some(identity)) => {
                tracing::debug!(identity = identity.as_str(), "session resolved");
                self.status = SessionStatus::Authenticated(identity);
                Ok(())
            }
            Ok(None) => {
                self.status = SessionStatus::Unauthenticated;
                Ok(())
            }
            Err(CoreError::Unauthenticated(_)) => {
                self.status = SessionStatus::Unauthenticated;
                Ok(())
            }
            Err(error) => Err(error),
        }
    }

    pub async fn login(
        &mut self,
        provider: &dyn AuthProvider,
        credentials: &Credentials,
    ) -> Result<Identity, CoreError> {
        match provider.login(credentials).await {
            Ok(identity) => {
                self.status = SessionStatus::Authenticated(identity.clone());
                Ok(identity)
            }
            Err(error) => {
                if matches!(error, CoreError::Unauthenticated(_)) {
                    self.status = SessionStatus::Unauthenticated;
                }
                Err(error)
            }
        }
    }

    /// Logs out and forgets the identity even when the network call fails;
    /// a stale cookie on the server is not a reason to keep the user
    /// looking signed in.
    pub async fn logout(&mut self, provider: &dyn AuthProvider) -> Result<(), CoreError> {
        let result = provider.logout().await;
        self.status = SessionStatus::Unauthenticated;
        result
    }
}

/// Session provider speaking the billing backend's auth endpoints. Shares
/// the transport (and its cookie store) with [`portal_backend`] so the
/// login cookie scopes every later data fetch.
#[derive(Clone)]
pub struct FrappeAuthProvider {
    transport: Arc<dyn RpcTransport>,
}

impl fmt::Debug for FrappeAuthProvider {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("FrappeAuthProvider").finish()
    }
}

impl FrappeAuthProvider {
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl AuthProvider for FrappeAuthProvider {
    async fn login(&self, credentials: &Credentials) -> Result<Identity, CoreError> {
        let email = credentials.email.trim();
        if email.is_empty() || credentials.password.is_empty() {
            return Err(CoreError::Configuration(
                "login requires both an email and a password.".to_owned(),
            ));
        }

        self.transport
            .execute(RpcRequest::post(
                METHOD_LOGIN,
                json!({ "usr": email, "pwd": credentials.password }),
            ))
            .await?;
        Ok(Identity::from(email))
    }

    async fn logout(&self) -> Result<(), CoreError> {
        self.transport
            .execute(RpcRequest::get(METHOD_LOGOUT, Vec::new()))
            .await?;
        Ok(())
    }

    async fn current_identity(&self) -> Result<Option<Identity>, CoreError> {
        let payload = self
            .transport
            .execute(RpcRequest::get(METHOD_LOGGED_USER, Vec::new()))
            .await?;

        let user = payload
            .get("message")
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or_default();
        if user.is_empty() || user.eq_ignore_ascii_case(GUEST_USER) {
            return Ok(None);
        }
        Ok(Some(Identity::from(user)))
    }
}
