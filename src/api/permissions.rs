//! Permission service client

use crate::api::ApiClient;
use crate::config::ApiConfig;
use crate::error::AuthResult;
use crate::models::{
    NewPermission, NewRole, NewRolePermission, Permission, Role, RolePermission,
    RolePermissionsResponse,
};
use crate::storage::PrefStore;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Remote catalog operations the authorization evaluator depends on.
///
/// The seam exists so evaluator tests can run against a scripted backend.
#[async_trait]
pub trait PermissionBackend: Send + Sync {
    async fn get_permissions(&self) -> AuthResult<Vec<Permission>>;
    async fn get_roles(&self) -> AuthResult<Vec<Role>>;
    async fn get_role_permissions(&self) -> AuthResult<Vec<RolePermission>>;
    async fn get_modules(&self) -> AuthResult<Vec<String>>;
    async fn get_role_permissions_by_role(&self, role_id: Uuid) -> AuthResult<Vec<Permission>>;
}

/// HTTP client for the permission service
#[derive(Clone)]
pub struct PermissionApi {
    client: ApiClient,
}

impl PermissionApi {
    pub fn new(config: &ApiConfig, prefs: Arc<PrefStore>) -> AuthResult<Self> {
        Ok(Self {
            client: ApiClient::new(config, prefs)?,
        })
    }

    pub async fn create_permission(&self, permission: &NewPermission) -> AuthResult<Permission> {
        self.client.post_json("permissions", permission).await
    }

    pub async fn create_permissions(
        &self,
        permissions: &[NewPermission],
    ) -> AuthResult<Vec<Permission>> {
        self.client.post_json("permissions/bulk", permissions).await
    }

    pub async fn create_role(&self, role: &NewRole) -> AuthResult<Role> {
        self.client.post_json("roles", role).await
    }

    pub async fn create_role_permission(
        &self,
        link: &NewRolePermission,
    ) -> AuthResult<RolePermission> {
        self.client.post_json("role-permissions", link).await
    }

    pub async fn create_role_permissions(
        &self,
        links: &[NewRolePermission],
    ) -> AuthResult<Vec<RolePermission>> {
        self.client.post_json("role-permissions/bulk", links).await
    }
}

#[async_trait]
impl PermissionBackend for PermissionApi {
    async fn get_permissions(&self) -> AuthResult<Vec<Permission>> {
        self.client.get_json("permissions").await
    }

    async fn get_roles(&self) -> AuthResult<Vec<Role>> {
        self.client.get_json("roles").await
    }

    async fn get_role_permissions(&self) -> AuthResult<Vec<RolePermission>> {
        self.client.get_json("role-permissions").await
    }

    async fn get_modules(&self) -> AuthResult<Vec<String>> {
        self.client.get_json("modules").await
    }

    async fn get_role_permissions_by_role(&self, role_id: Uuid) -> AuthResult<Vec<Permission>> {
        let resp: RolePermissionsResponse = self
            .client
            .get_json(&format!("role-permissions/role/{}", role_id))
            .await?;
        Ok(resp.permissions)
    }
}
