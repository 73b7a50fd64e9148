//! RBAC data-access layer.
//!
//! # Purpose
//! Defines the [`RbacStore`] contract consumed by the HTTP handlers and the
//! command interpreter, plus the error taxonomy every backend maps into.
//!
//! # Key invariants
//! - Permission names and role names are unique within their kind.
//! - Assignments always reference an existing role and permission; deleting
//!   either side removes its assignments.
//! - `set_role_permissions` has replace semantics and is idempotent.
//! - Every write of a role's permission set bumps `Role::revision`.
use crate::model::{IdSet, Permission, Role};
use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod postgres;
pub mod seed;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("invalid: {0}")]
    Invalid(String),
    #[error("revision mismatch: expected {expected}, found {actual}")]
    RevisionMismatch { expected: u64, actual: u64 },
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unexpected(err.into())
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::Unexpected(err.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait RbacStore: Send + Sync {
    async fn list_permissions(&self) -> StoreResult<Vec<Permission>>;
    async fn get_permission(&self, id: &str) -> StoreResult<Permission>;
    async fn get_permission_by_name(&self, name: &str) -> StoreResult<Option<Permission>>;
    async fn create_permission(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> StoreResult<Permission>;
    async fn update_permission(
        &self,
        id: &str,
        name: &str,
        description: Option<&str>,
    ) -> StoreResult<Permission>;
    async fn delete_permission(&self, id: &str) -> StoreResult<()>;

    async fn list_roles(&self) -> StoreResult<Vec<Role>>;
    async fn get_role(&self, id: &str) -> StoreResult<Role>;
    async fn get_role_by_name(&self, name: &str) -> StoreResult<Option<Role>>;
    async fn create_role(&self, name: &str) -> StoreResult<Role>;
    async fn update_role(&self, id: &str, name: &str) -> StoreResult<Role>;
    async fn delete_role(&self, id: &str) -> StoreResult<()>;

    /// Current permission ids granted by `role_id`.
    async fn role_permission_ids(&self, role_id: &str) -> StoreResult<IdSet> {
        Ok(self.get_role(role_id).await?.permission_ids)
    }

    /// Replace the role's permission set unconditionally.
    async fn set_role_permissions(&self, role_id: &str, permission_ids: &IdSet)
    -> StoreResult<Role>;

    /// Replace the role's permission set only if its revision is still
    /// `expected_revision`; otherwise fail with [`StoreError::RevisionMismatch`].
    async fn replace_role_permissions_checked(
        &self,
        role_id: &str,
        expected_revision: u64,
        permission_ids: &IdSet,
    ) -> StoreResult<Role>;

    async fn health_check(&self) -> StoreResult<()>;
    fn is_durable(&self) -> bool;
    fn backend_name(&self) -> &'static str;
}
