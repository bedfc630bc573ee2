//! Route guards
//!
//! Pure decision functions consumed by the navigation shell. Guards never
//! redirect while session or authorization state is still settling.

use crate::authz::{normalize_role, PermissionSet};
use crate::session::SessionState;

/// Where unauthenticated principals are sent
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Default authenticated landing page
pub const DEFAULT_HOME_PATH: &str = "/dashboard";

/// Outcome of a guard evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// State is still settling; render a neutral loading indicator
    Loading,
    Allow,
    Redirect(String),
}

/// Gate on module access.
///
/// OR semantics over the required set: access to any one listed module is
/// sufficient. An empty required set only demands authentication.
#[derive(Debug, Clone)]
pub struct ModuleGuard {
    required: Vec<String>,
    login_path: String,
    fallback_path: String,
}

impl ModuleGuard {
    pub fn new<I, S>(required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required: required.into_iter().map(Into::into).collect(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            fallback_path: DEFAULT_HOME_PATH.to_string(),
        }
    }

    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    pub fn with_fallback_path(mut self, path: impl Into<String>) -> Self {
        self.fallback_path = path.into();
        self
    }

    pub fn evaluate(
        &self,
        session: &SessionState,
        authz_loading: bool,
        permissions: &PermissionSet,
    ) -> GuardDecision {
        if session.is_loading() || authz_loading {
            return GuardDecision::Loading;
        }
        if !session.is_authenticated() {
            return GuardDecision::Redirect(self.login_path.clone());
        }
        if self.required.is_empty()
            || self
                .required
                .iter()
                .any(|module| permissions.has_module_access(module))
        {
            GuardDecision::Allow
        } else {
            GuardDecision::Redirect(self.fallback_path.clone())
        }
    }
}

/// Gate on exact role membership in an allow-list.
///
/// Roles are compared in normalized form; a principal outside the list is
/// sent to the default authenticated page rather than the login screen.
#[derive(Debug, Clone)]
pub struct RoleGuard {
    allowed: Vec<String>,
    login_path: String,
    home_path: String,
}

impl RoleGuard {
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed: allowed
                .into_iter()
                .map(|role| normalize_role(role.as_ref()))
                .collect(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            home_path: DEFAULT_HOME_PATH.to_string(),
        }
    }

    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    pub fn with_home_path(mut self, path: impl Into<String>) -> Self {
        self.home_path = path.into();
        self
    }

    pub fn evaluate(&self, session: &SessionState) -> GuardDecision {
        if session.is_loading() {
            return GuardDecision::Loading;
        }
        if !session.is_authenticated() {
            return GuardDecision::Redirect(self.login_path.clone());
        }
        match session.role() {
            Some(role) if self.allowed.contains(&normalize_role(role)) => GuardDecision::Allow,
            _ => GuardDecision::Redirect(self.home_path.clone()),
        }
    }
}
