//! Demo data set for local runs.
//!
//! Loads the permissions, roles, and assignments the admin console ships with
//! in demo mode. Seeding goes through the [`RbacStore`] trait so it works
//! against any backend, and skips entries whose names already exist.
use super::{RbacStore, StoreResult};
use crate::model::IdSet;

pub const DEMO_PERMISSIONS: &[(&str, &str)] = &[
    ("read_articles", "Can view and read articles"),
    ("edit_articles", "Can create and edit articles"),
    ("delete_articles", "Can delete articles"),
    ("manage_users", "Can create, edit, and delete user accounts"),
];

pub const DEMO_ROLES: &[(&str, &[&str])] = &[
    ("Viewer", &["read_articles"]),
    ("Content Editor", &["read_articles", "edit_articles"]),
    (
        "Administrator",
        &[
            "read_articles",
            "edit_articles",
            "delete_articles",
            "manage_users",
        ],
    ),
];

pub async fn seed_demo_data(store: &dyn RbacStore) -> StoreResult<()> {
    for (name, description) in DEMO_PERMISSIONS {
        if store.get_permission_by_name(name).await?.is_none() {
            store.create_permission(name, Some(*description)).await?;
        }
    }
    for (role_name, permission_names) in DEMO_ROLES {
        let role = match store.get_role_by_name(role_name).await? {
            Some(role) => role,
            None => store.create_role(role_name).await?,
        };
        let mut wanted = IdSet::new();
        for permission_name in *permission_names {
            if let Some(permission) = store.get_permission_by_name(permission_name).await? {
                wanted.insert(permission.id);
            }
        }
        if role.permission_ids != wanted {
            store.set_role_permissions(&role.id, &wanted).await?;
        }
    }
    tracing::info!(
        backend = store.backend_name(),
        permissions = DEMO_PERMISSIONS.len(),
        roles = DEMO_ROLES.len(),
        "seeded demo rbac data"
    );
    Ok(())
}
