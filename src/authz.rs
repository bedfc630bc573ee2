//! Authorization evaluator
//!
//! Owns the single current-permission-set object: a cache of the permissions
//! granted to the session's role, refreshed whenever the session settles.
//! Every ambiguous or failed lookup resolves to zero permissions; only the
//! exact super-role sentinel grants blanket access.

use crate::api::PermissionBackend;
use crate::models::Permission;
use crate::session::SessionState;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

/// Sentinel role granted unconditional access to every module and action
pub const SUPER_ROLE: &str = "SUPER_ADMIN";

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid pattern"));

/// Canonical form of a role string: trimmed, uppercased, internal
/// whitespace runs collapsed to a single underscore
pub fn normalize_role(raw: &str) -> String {
    WHITESPACE.replace_all(raw.trim(), "_").to_uppercase()
}

/// Cached permissions for the current role, queryable without I/O
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PermissionSet {
    all_access: bool,
    grants: Vec<Permission>,
}

impl PermissionSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Super-role set: no materialized grants, every query satisfied
    pub fn all_access() -> Self {
        Self {
            all_access: true,
            grants: Vec::new(),
        }
    }

    pub fn from_grants(grants: Vec<Permission>) -> Self {
        Self {
            all_access: false,
            grants,
        }
    }

    pub fn is_all_access(&self) -> bool {
        self.all_access
    }

    /// Case-insensitive match on both module and action
    pub fn has_permission(&self, module: &str, action: &str) -> bool {
        self.all_access
            || self.grants.iter().any(|p| {
                p.module.eq_ignore_ascii_case(module) && p.action.eq_ignore_ascii_case(action)
            })
    }

    /// Case-insensitive match on module only
    pub fn has_module_access(&self, module: &str) -> bool {
        self.all_access
            || self
                .grants
                .iter()
                .any(|p| p.module.eq_ignore_ascii_case(module))
    }

    pub fn can_create(&self, module: &str) -> bool {
        self.has_permission(module, "create")
    }

    pub fn can_view(&self, module: &str) -> bool {
        self.has_permission(module, "view")
    }

    pub fn can_edit(&self, module: &str) -> bool {
        self.has_permission(module, "edit")
    }

    pub fn can_delete(&self, module: &str) -> bool {
        self.has_permission(module, "delete")
    }
}

struct CacheState {
    loading: bool,
    set: PermissionSet,
}

/// Permission cache authority
pub struct Authorizer {
    backend: Arc<dyn PermissionBackend>,
    cache: RwLock<CacheState>,
}

impl Authorizer {
    pub fn new(backend: Arc<dyn PermissionBackend>) -> Self {
        Self {
            backend,
            cache: RwLock::new(CacheState {
                // Loading until the first refresh settles, so guards hold.
                loading: true,
                set: PermissionSet::empty(),
            }),
        }
    }

    pub async fn is_loading(&self) -> bool {
        self.cache.read().await.loading
    }

    /// Snapshot of the cached set for pure, synchronous queries
    pub async fn permissions(&self) -> PermissionSet {
        self.cache.read().await.set.clone()
    }

    pub async fn has_permission(&self, module: &str, action: &str) -> bool {
        self.cache.read().await.set.has_permission(module, action)
    }

    pub async fn has_module_access(&self, module: &str) -> bool {
        self.cache.read().await.set.has_module_access(module)
    }

    /// Rebuild the cache for the given session state.
    ///
    /// Called strictly after the session settles; a stale refresh racing a
    /// newer one is clobbered last-write-wins.
    pub async fn refresh(&self, state: &SessionState) {
        {
            let mut cache = self.cache.write().await;
            cache.loading = true;
        }
        let set = self.resolve(state).await;
        let mut cache = self.cache.write().await;
        cache.set = set;
        cache.loading = false;
    }

    async fn resolve(&self, state: &SessionState) -> PermissionSet {
        let SessionState::Authenticated { user, role } = state else {
            return PermissionSet::empty();
        };

        // Prefer the role name on the fetched user record, fall back to the
        // session-held role.
        let role_display = match user.role_name.clone().or_else(|| role.clone()) {
            Some(name) => name,
            None => {
                warn!("authenticated principal has no role; permissions fail closed");
                return PermissionSet::empty();
            }
        };

        if normalize_role(&role_display) == SUPER_ROLE {
            return PermissionSet::all_access();
        }

        let roles = match self.backend.get_roles().await {
            Ok(roles) => roles,
            Err(e) => {
                warn!("role catalog fetch failed: {}; permissions fail closed", e);
                return PermissionSet::empty();
            }
        };

        let matched = match roles
            .iter()
            .find(|r| r.name.trim().eq_ignore_ascii_case(role_display.trim()))
        {
            Some(role) => role,
            None => {
                warn!(
                    "role {:?} not found in catalog; permissions fail closed",
                    role_display
                );
                return PermissionSet::empty();
            }
        };

        match self.backend.get_role_permissions_by_role(matched.id).await {
            Ok(grants) => PermissionSet::from_grants(grants),
            Err(e) => {
                warn!(
                    "permission fetch for role {:?} failed: {}; permissions fail closed",
                    matched.name, e
                );
                PermissionSet::empty()
            }
        }
    }
}
