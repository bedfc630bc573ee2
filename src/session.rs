//! Session state management
//!
//! Owns the single current-session object. All mutations go through the
//! login/register/verify/logout operations here; consumers observe the state
//! through [`Session::subscribe`] and never write it directly.

use crate::api::AuthBackend;
use crate::error::{incomplete, AuthError, AuthResult};
use crate::models::{AuthResponse, Credentials, User};
use crate::storage::PrefStore;
use crate::token;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tracing::{info, warn};

/// Lifecycle of the authenticated session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Initial state, before the stored token has been checked
    Unknown,
    /// A login/register/verify call is in flight
    Authenticating,
    Authenticated { user: User, role: Option<String> },
    Unauthenticated,
}

impl SessionState {
    /// True while route guards must hold off on redirecting
    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Unknown | SessionState::Authenticating)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. })
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Authenticated { user, .. } => Some(user),
            _ => None,
        }
    }

    pub fn role(&self) -> Option<&str> {
        match self {
            SessionState::Authenticated { role, .. } => role.as_deref(),
            _ => None,
        }
    }
}

/// Process-wide session authority
pub struct Session {
    backend: Arc<dyn AuthBackend>,
    prefs: Arc<PrefStore>,
    state: RwLock<SessionState>,
    tx: watch::Sender<SessionState>,
}

impl Session {
    pub fn new(backend: Arc<dyn AuthBackend>, prefs: Arc<PrefStore>) -> Self {
        let (tx, _rx) = watch::channel(SessionState::Unknown);
        Self {
            backend,
            prefs,
            state: RwLock::new(SessionState::Unknown),
            tx,
        }
    }

    /// Current state snapshot
    pub async fn current(&self) -> SessionState {
        self.state.read().await.clone()
    }

    /// Observe state transitions. The receiver always holds the latest
    /// snapshot; permission refresh is driven from these notifications.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    /// Check the stored token against the remote verify endpoint.
    ///
    /// Always settles into `Authenticated` or `Unauthenticated`; guards may
    /// not rely on authentication state before this completes.
    pub async fn init(&self) {
        let Some(stored) = self.prefs.token() else {
            self.transition(SessionState::Unauthenticated).await;
            return;
        };

        self.transition(SessionState::Authenticating).await;
        let verified = match self.backend.verify_auth().await {
            Ok(resp) if resp.success => resp.user,
            Ok(_) => None,
            Err(e) => {
                warn!("session verification failed: {}", e);
                None
            }
        };

        match verified {
            Some(user) => {
                let role = user.role_name.clone().or_else(|| token::role_of(&stored));
                info!("session restored for {}", user.email);
                self.transition(SessionState::Authenticated { user, role })
                    .await;
            }
            None => {
                if let Err(e) = self.prefs.clear_token() {
                    warn!("failed to clear stored token: {}", e);
                }
                self.transition(SessionState::Unauthenticated).await;
            }
        }
    }

    /// Authenticate against the remote login endpoint
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<User> {
        self.transition(SessionState::Authenticating).await;
        let credentials = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        let outcome = self.backend.login(&credentials).await;
        self.settle("login", outcome).await
    }

    /// Create an account against the remote registration endpoint
    pub async fn register(&self, email: &str, password: &str) -> AuthResult<User> {
        self.transition(SessionState::Authenticating).await;
        let credentials = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        let outcome = self.backend.register(&credentials).await;
        self.settle("register", outcome).await
    }

    /// End the session. Remote errors are logged, never propagated: local
    /// state is always cleared.
    pub async fn logout(&self) {
        if let Err(e) = self.backend.logout().await {
            warn!("remote logout failed: {}", e);
        }
        if let Err(e) = self.prefs.clear_token() {
            warn!("failed to clear stored token: {}", e);
        }
        info!("session cleared");
        self.transition(SessionState::Unauthenticated).await;
    }

    async fn settle(&self, what: &str, outcome: AuthResult<AuthResponse>) -> AuthResult<User> {
        match outcome {
            Ok(resp) if resp.success => match (resp.user, resp.token) {
                (Some(user), Some(tok)) => {
                    if let Err(e) = self.prefs.set_token(&tok) {
                        warn!("failed to persist token: {}", e);
                    }
                    let role = user.role_name.clone().or_else(|| token::role_of(&tok));
                    info!("{} succeeded for {}", what, user.email);
                    self.transition(SessionState::Authenticated {
                        user: user.clone(),
                        role,
                    })
                    .await;
                    Ok(user)
                }
                _ => {
                    self.fail(
                        what,
                        incomplete(format!("{} response missing user or token", what)),
                    )
                    .await
                }
            },
            Ok(resp) => {
                let message = resp
                    .message
                    .unwrap_or_else(|| format!("{} rejected by service", what));
                self.fail(what, AuthError::Rejected(message)).await
            }
            Err(e) => self.fail(what, e).await,
        }
    }

    async fn fail(&self, what: &str, err: AuthError) -> AuthResult<User> {
        warn!("{} failed: {}", what, err);
        if let Err(e) = self.prefs.clear_token() {
            warn!("failed to clear stored token: {}", e);
        }
        self.transition(SessionState::Unauthenticated).await;
        Err(err)
    }

    async fn transition(&self, next: SessionState) {
        let mut state = self.state.write().await;
        *state = next.clone();
        // Publish while holding the write lock so observers see transitions
        // in the same order the session applied them.
        self.tx.send_replace(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::rejected;
    use crate::models::VerifyResponse;
    use async_trait::async_trait;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    /// Backend returning canned responses; `None` scripts a transport error.
    #[derive(Default)]
    struct ScriptedBackend {
        login_response: Option<AuthResponse>,
        register_response: Option<AuthResponse>,
        verify_response: Option<VerifyResponse>,
        logout_fails: bool,
    }

    #[async_trait]
    impl AuthBackend for ScriptedBackend {
        async fn login(&self, _credentials: &Credentials) -> AuthResult<AuthResponse> {
            self.login_response
                .clone()
                .ok_or_else(|| rejected("login unavailable"))
        }

        async fn register(&self, _credentials: &Credentials) -> AuthResult<AuthResponse> {
            self.register_response
                .clone()
                .ok_or_else(|| rejected("register unavailable"))
        }

        async fn logout(&self) -> AuthResult<()> {
            if self.logout_fails {
                Err(rejected("logout unavailable"))
            } else {
                Ok(())
            }
        }

        async fn verify_auth(&self) -> AuthResult<VerifyResponse> {
            self.verify_response
                .clone()
                .ok_or_else(|| rejected("verify unavailable"))
        }
    }

    fn test_user(role_name: Option<&str>) -> User {
        User {
            id: Uuid::new_v4(),
            email: "amy@store.test".to_string(),
            name: Some("Amy".to_string()),
            role_name: role_name.map(str::to_string),
        }
    }

    fn test_token(role: &str) -> String {
        let payload = serde_json::json!({
            "sub": "42",
            "email": "amy@store.test",
            "role": role,
        });
        format!(
            "h.{}.s",
            URL_SAFE_NO_PAD.encode(payload.to_string().as_bytes())
        )
    }

    fn session_with(backend: ScriptedBackend) -> (tempfile::TempDir, Arc<PrefStore>, Session) {
        let dir = tempfile::tempdir().expect("tempdir");
        let prefs = Arc::new(PrefStore::new(dir.path().join("prefs.json")));
        let session = Session::new(Arc::new(backend), prefs.clone());
        (dir, prefs, session)
    }

    #[tokio::test]
    async fn starts_unknown_and_loading() {
        let (_dir, _prefs, session) = session_with(ScriptedBackend::default());
        let state = session.current().await;
        assert_eq!(state, SessionState::Unknown);
        assert!(state.is_loading());
    }

    #[tokio::test]
    async fn init_without_stored_token_is_unauthenticated() {
        let (_dir, _prefs, session) = session_with(ScriptedBackend::default());
        session.init().await;
        let state = session.current().await;
        assert_eq!(state, SessionState::Unauthenticated);
        assert!(!state.is_loading());
    }

    #[tokio::test]
    async fn init_with_valid_token_restores_session() {
        let backend = ScriptedBackend {
            verify_response: Some(VerifyResponse {
                success: true,
                user: Some(test_user(Some("Sales Manager"))),
            }),
            ..Default::default()
        };
        let (_dir, prefs, session) = session_with(backend);
        prefs.set_token(&test_token("ignored")).unwrap();

        session.init().await;
        let state = session.current().await;
        assert!(state.is_authenticated());
        assert_eq!(state.role(), Some("Sales Manager"));
    }

    #[tokio::test]
    async fn init_falls_back_to_token_role_when_user_has_none() {
        let backend = ScriptedBackend {
            verify_response: Some(VerifyResponse {
                success: true,
                user: Some(test_user(None)),
            }),
            ..Default::default()
        };
        let (_dir, prefs, session) = session_with(backend);
        prefs.set_token(&test_token("Stock Clerk")).unwrap();

        session.init().await;
        assert_eq!(session.current().await.role(), Some("Stock Clerk"));
    }

    #[tokio::test]
    async fn init_with_failing_verify_clears_token() {
        let (_dir, prefs, session) = session_with(ScriptedBackend::default());
        prefs.set_token("some.stored.token").unwrap();

        session.init().await;
        assert_eq!(session.current().await, SessionState::Unauthenticated);
        assert_eq!(prefs.token(), None);
    }

    #[tokio::test]
    async fn login_success_persists_token_and_authenticates() {
        let token = test_token("Sales Manager");
        let backend = ScriptedBackend {
            login_response: Some(AuthResponse {
                success: true,
                user: Some(test_user(Some("Sales Manager"))),
                token: Some(token.clone()),
                message: None,
            }),
            ..Default::default()
        };
        let (_dir, prefs, session) = session_with(backend);
        let mut rx = session.subscribe();

        let user = session.login("amy@store.test", "secret").await.unwrap();
        assert_eq!(user.email, "amy@store.test");
        assert_eq!(prefs.token(), Some(token));
        assert!(session.current().await.is_authenticated());

        // Observer sees the settled state.
        rx.changed().await.ok();
        assert!(rx.borrow().is_authenticated());
    }

    #[tokio::test]
    async fn login_rejection_surfaces_service_message() {
        let backend = ScriptedBackend {
            login_response: Some(AuthResponse {
                success: false,
                user: None,
                token: None,
                message: Some("Invalid credentials".to_string()),
            }),
            ..Default::default()
        };
        let (_dir, prefs, session) = session_with(backend);

        let err = session.login("amy@store.test", "wrong").await.unwrap_err();
        assert!(matches!(err, AuthError::Rejected(ref m) if m.as_str() == "Invalid credentials"));
        assert_eq!(session.current().await, SessionState::Unauthenticated);
        assert_eq!(prefs.token(), None);
    }

    #[tokio::test]
    async fn login_response_missing_token_is_a_failure() {
        let backend = ScriptedBackend {
            login_response: Some(AuthResponse {
                success: true,
                user: Some(test_user(None)),
                token: None,
                message: None,
            }),
            ..Default::default()
        };
        let (_dir, prefs, session) = session_with(backend);

        let err = session.login("amy@store.test", "secret").await.unwrap_err();
        assert!(matches!(err, AuthError::IncompleteResponse(_)));
        assert_eq!(session.current().await, SessionState::Unauthenticated);
        assert_eq!(prefs.token(), None);
    }

    #[tokio::test]
    async fn login_transport_error_settles_unauthenticated() {
        let (_dir, _prefs, session) = session_with(ScriptedBackend::default());
        let err = session.login("amy@store.test", "secret").await.unwrap_err();
        assert!(matches!(err, AuthError::Rejected(_)));
        let state = session.current().await;
        assert_eq!(state, SessionState::Unauthenticated);
        assert!(!state.is_loading());
    }

    #[tokio::test]
    async fn register_follows_login_contract() {
        let token = test_token("Viewer");
        let backend = ScriptedBackend {
            register_response: Some(AuthResponse {
                success: true,
                user: Some(test_user(None)),
                token: Some(token.clone()),
                message: None,
            }),
            ..Default::default()
        };
        let (_dir, prefs, session) = session_with(backend);

        session.register("amy@store.test", "secret").await.unwrap();
        assert_eq!(prefs.token(), Some(token));
        // Role came from the token claims.
        assert_eq!(session.current().await.role(), Some("Viewer"));
    }

    #[tokio::test]
    async fn logout_clears_state_even_when_remote_call_fails() {
        let token = test_token("Sales Manager");
        let backend = ScriptedBackend {
            login_response: Some(AuthResponse {
                success: true,
                user: Some(test_user(Some("Sales Manager"))),
                token: Some(token),
                message: None,
            }),
            logout_fails: true,
            ..Default::default()
        };
        let (_dir, prefs, session) = session_with(backend);
        session.login("amy@store.test", "secret").await.unwrap();

        session.logout().await;
        assert_eq!(session.current().await, SessionState::Unauthenticated);
        assert_eq!(prefs.token(), None);
    }
}
