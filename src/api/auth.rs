//! Auth service client

use crate::api::ApiClient;
use crate::config::ApiConfig;
use crate::error::AuthResult;
use crate::models::{AuthResponse, Credentials, VerifyResponse};
use crate::storage::PrefStore;
use async_trait::async_trait;
use std::sync::Arc;

/// Remote operations the session depends on.
///
/// The seam exists so session tests can run against a scripted backend.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> AuthResult<AuthResponse>;
    async fn register(&self, credentials: &Credentials) -> AuthResult<AuthResponse>;
    async fn logout(&self) -> AuthResult<()>;
    async fn verify_auth(&self) -> AuthResult<VerifyResponse>;
}

/// HTTP client for the auth service
#[derive(Clone)]
pub struct AuthApi {
    client: ApiClient,
}

impl AuthApi {
    pub fn new(config: &ApiConfig, prefs: Arc<PrefStore>) -> AuthResult<Self> {
        Ok(Self {
            client: ApiClient::new(config, prefs)?,
        })
    }

    /// Local token-presence check; no remote call is made
    pub fn is_authenticated(&self) -> bool {
        self.client.prefs().token().is_some()
    }
}

#[async_trait]
impl AuthBackend for AuthApi {
    async fn login(&self, credentials: &Credentials) -> AuthResult<AuthResponse> {
        self.client.post_json("auth/login", credentials).await
    }

    async fn register(&self, credentials: &Credentials) -> AuthResult<AuthResponse> {
        self.client.post_json("auth/register", credentials).await
    }

    async fn logout(&self) -> AuthResult<()> {
        self.client.post_empty("auth/logout").await
    }

    async fn verify_auth(&self) -> AuthResult<VerifyResponse> {
        self.client.get_json("auth/verify").await
    }
}
