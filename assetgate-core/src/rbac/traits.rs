//! Core traits for RBAC system

use super::Role;
use crate::error::AuthResult;

/// Lookup against the external role assignment relation
///
/// Implement this trait to connect the auth store to the data backend.
#[async_trait::async_trait]
pub trait RoleDirectory: Send + Sync {
    /// Role assigned to an identity
    ///
    /// `Ok(None)` means the identity has no row in the relation; errors are
    /// reported separately so callers can tell the two apart.
    async fn resolve_role(&self, identity_id: &str) -> AuthResult<Option<Role>>;

    /// Whether an identity is an administrator
    ///
    /// Backends exposing a dedicated check can override this; by default it is
    /// derived from [`RoleDirectory::resolve_role`].
    async fn resolve_is_admin(&self, identity_id: &str) -> AuthResult<bool> {
        Ok(self.resolve_role(identity_id).await? == Some(Role::Admin))
    }
}

#[async_trait::async_trait]
impl<D: RoleDirectory + ?Sized> RoleDirectory for std::sync::Arc<D> {
    async fn resolve_role(&self, identity_id: &str) -> AuthResult<Option<Role>> {
        (**self).resolve_role(identity_id).await
    }

    async fn resolve_is_admin(&self, identity_id: &str) -> AuthResult<bool> {
        (**self).resolve_is_admin(identity_id).await
    }
}
