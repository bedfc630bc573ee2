//! Typed clients for the remote auth and permission services
//!
//! Both clients share one HTTP core that attaches the stored bearer token
//! and maps non-success responses to [`AuthError::Rejected`], preferring the
//! service's own message when the body carries one.

mod auth;
mod permissions;

pub use auth::{AuthApi, AuthBackend};
pub use permissions::{PermissionApi, PermissionBackend};

use crate::config::ApiConfig;
use crate::error::{AuthError, AuthResult};
use crate::storage::PrefStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use url::Url;

/// Shared HTTP plumbing for the service clients
#[derive(Clone)]
pub(crate) struct ApiClient {
    base: Url,
    http: reqwest::Client,
    prefs: Arc<PrefStore>,
}

impl ApiClient {
    pub(crate) fn new(config: &ApiConfig, prefs: Arc<PrefStore>) -> AuthResult<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            base: config.base_url.clone(),
            http,
            prefs,
        })
    }

    pub(crate) fn prefs(&self) -> &PrefStore {
        &self.prefs
    }

    fn endpoint(&self, path: &str) -> AuthResult<Url> {
        Ok(self.base.join(path)?)
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.prefs.token() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> AuthResult<T> {
        let resp = self
            .authorized(self.http.get(self.endpoint(path)?))
            .send()
            .await?;
        Self::read_json(resp).await
    }

    pub(crate) async fn post_json<B, T>(&self, path: &str, body: &B) -> AuthResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self
            .authorized(self.http.post(self.endpoint(path)?))
            .json(body)
            .send()
            .await?;
        Self::read_json(resp).await
    }

    pub(crate) async fn post_empty(&self, path: &str) -> AuthResult<()> {
        let resp = self
            .authorized(self.http.post(self.endpoint(path)?))
            .send()
            .await?;
        Self::check_status(resp).await.map(|_| ())
    }

    async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> AuthResult<T> {
        let resp = Self::check_status(resp).await?;
        Ok(resp.json().await?)
    }

    async fn check_status(resp: reqwest::Response) -> AuthResult<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let fallback = format!("HTTP {}", status);
        let message = resp
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|v| {
                v.get("message")
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
            })
            .unwrap_or(fallback);
        Err(AuthError::Rejected(message))
    }
}
