//! Role model definitions and request payloads.
//!
//! # Purpose
//! Defines role records, the role-to-permission assignment pair, and the
//! payloads used to create, rename, and re-assign roles.
use super::IdSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    /// Permissions granted by this role, joined by the store on read.
    #[schema(value_type = Vec<String>)]
    pub permission_ids: IdSet,
    /// Incremented on every write of `permission_ids`.
    pub revision: u64,
}

/// A single "role grants permission" pair.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoleAssignment {
    pub role_id: String,
    pub permission_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct RoleCreateRequest {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct RolePatchRequest {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct RolePermissionsRequest {
    pub permission_ids: Vec<String>,
}
