//! RBAC data model module.
//!
//! # Purpose
//! Re-exports the permission and role records, their request payloads, and
//! the shared name validation used by every store backend.
mod permission;
mod role;

pub use permission::{Permission, PermissionCreateRequest, PermissionPatchRequest};
pub use role::{Role, RoleAssignment, RoleCreateRequest, RolePatchRequest, RolePermissionsRequest};

use std::collections::BTreeSet;

/// Ordered, duplicate-free set of entity ids.
pub type IdSet = BTreeSet<String>;

/// Trim a permission or role name and reject it when nothing is left.
///
/// Names are otherwise kept verbatim: lookups are case-sensitive.
pub fn normalize_name(kind: &str, name: &str) -> Result<String, String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(format!("{kind} name must not be empty"));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_name_trims_and_rejects_blank() {
        assert_eq!(normalize_name("role", "  Editor ").unwrap(), "Editor");
        assert_eq!(
            normalize_name("permission", "   ").unwrap_err(),
            "permission name must not be empty"
        );
    }

    #[test]
    fn normalize_name_keeps_case() {
        assert_eq!(normalize_name("role", "Content Editor").unwrap(), "Content Editor");
    }
}
