//! In-memory implementation of the RBAC store.
//!
//! # Purpose
//! This store implements the `RbacStore` trait entirely in memory using `HashMap`s guarded by a
//! single `tokio::sync::RwLock`. It exists for:
//! - local development and tests (no external dependencies)
//! - demo deployments where durability is not required
//! - as a fallback when Postgres is not configured
//!
//! # Durability and consistency
//! - **Not durable**: all state is lost on process restart.
//! - **Single-process consistency**: permissions, roles, and the assignment table share one lock,
//!   so a cascading delete or a permission-set replacement is observed all-or-nothing.
//! - **No multi-node coordination**: multiple instances each have independent state.
//!
//! # Associations
//! Assignments live in one `BTreeSet<RoleAssignment>`; `Role::permission_ids` and
//! `Permission::role_ids` are computed from it on every read.
use super::{RbacStore, StoreError, StoreResult};
use crate::model::{IdSet, Permission, Role, RoleAssignment, normalize_name};
use crate::observability;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct PermissionRecord {
    id: String,
    name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct RoleRecord {
    id: String,
    name: String,
    created_at: DateTime<Utc>,
    revision: u64,
}

#[derive(Debug, Default)]
struct RbacState {
    permissions: HashMap<String, PermissionRecord>,
    roles: HashMap<String, RoleRecord>,
    assignments: BTreeSet<RoleAssignment>,
}

impl RbacState {
    fn permission_view(&self, record: &PermissionRecord) -> Permission {
        Permission {
            id: record.id.clone(),
            name: record.name.clone(),
            description: record.description.clone(),
            created_at: record.created_at,
            role_ids: self
                .assignments
                .iter()
                .filter(|a| a.permission_id == record.id)
                .map(|a| a.role_id.clone())
                .collect(),
        }
    }

    fn role_view(&self, record: &RoleRecord) -> Role {
        Role {
            id: record.id.clone(),
            name: record.name.clone(),
            created_at: record.created_at,
            permission_ids: self.permission_ids_of(&record.id),
            revision: record.revision,
        }
    }

    fn permission_ids_of(&self, role_id: &str) -> IdSet {
        self.assignments
            .iter()
            .filter(|a| a.role_id == role_id)
            .map(|a| a.permission_id.clone())
            .collect()
    }

    fn permission_name_taken(&self, name: &str, except_id: Option<&str>) -> bool {
        self.permissions
            .values()
            .any(|p| p.name == name && Some(p.id.as_str()) != except_id)
    }

    fn role_name_taken(&self, name: &str, except_id: Option<&str>) -> bool {
        self.roles
            .values()
            .any(|r| r.name == name && Some(r.id.as_str()) != except_id)
    }

    /// Swap the role's assignments for `permission_ids` and bump its revision.
    fn replace_assignments(&mut self, role_id: &str, permission_ids: &IdSet) -> StoreResult<Role> {
        if let Some(missing) = permission_ids
            .iter()
            .find(|id| !self.permissions.contains_key(id.as_str()))
        {
            return Err(StoreError::NotFound(format!("permission {missing}")));
        }
        self.assignments.retain(|a| a.role_id != role_id);
        for permission_id in permission_ids {
            self.assignments.insert(RoleAssignment {
                role_id: role_id.to_string(),
                permission_id: permission_id.clone(),
            });
        }
        let role = self
            .roles
            .get_mut(role_id)
            .ok_or_else(|| StoreError::NotFound("role".into()))?;
        role.revision += 1;
        let role = role.clone();
        Ok(self.role_view(&role))
    }

    fn record_gauges(&self) {
        observability::record_inventory(self.permissions.len(), self.roles.len());
    }
}

/// In-memory RBAC store.
///
/// Cloning is cheap and clones share state, so one instance can be handed to
/// the HTTP layer and the interpreter alike.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<RbacState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, String)) {
    items.sort_by(|a, b| {
        let (a_at, a_name) = key(a);
        let (b_at, b_name) = key(b);
        b_at.cmp(&a_at).then(a_name.cmp(&b_name))
    });
}

#[async_trait]
impl RbacStore for InMemoryStore {
    async fn list_permissions(&self) -> StoreResult<Vec<Permission>> {
        let state = self.state.read().await;
        let mut items: Vec<_> = state
            .permissions
            .values()
            .map(|record| state.permission_view(record))
            .collect();
        newest_first(&mut items, |p| (p.created_at, p.name.clone()));
        Ok(items)
    }

    async fn get_permission(&self, id: &str) -> StoreResult<Permission> {
        let state = self.state.read().await;
        state
            .permissions
            .get(id)
            .map(|record| state.permission_view(record))
            .ok_or_else(|| StoreError::NotFound("permission".into()))
    }

    async fn get_permission_by_name(&self, name: &str) -> StoreResult<Option<Permission>> {
        let state = self.state.read().await;
        Ok(state
            .permissions
            .values()
            .find(|p| p.name == name)
            .map(|record| state.permission_view(record)))
    }

    async fn create_permission(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> StoreResult<Permission> {
        let name = normalize_name("permission", name).map_err(StoreError::Invalid)?;
        let mut state = self.state.write().await;
        if state.permission_name_taken(&name, None) {
            return Err(StoreError::Conflict(format!(
                "permission '{name}' already exists"
            )));
        }
        let record = PermissionRecord {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            description: description.map(str::to_string),
            created_at: Utc::now(),
        };
        state.permissions.insert(record.id.clone(), record.clone());
        state.record_gauges();
        Ok(state.permission_view(&record))
    }

    async fn update_permission(
        &self,
        id: &str,
        name: &str,
        description: Option<&str>,
    ) -> StoreResult<Permission> {
        let name = normalize_name("permission", name).map_err(StoreError::Invalid)?;
        let mut state = self.state.write().await;
        if !state.permissions.contains_key(id) {
            return Err(StoreError::NotFound("permission".into()));
        }
        if state.permission_name_taken(&name, Some(id)) {
            return Err(StoreError::Conflict(format!(
                "permission '{name}' already exists"
            )));
        }
        let record = state
            .permissions
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound("permission".into()))?;
        record.name = name;
        record.description = description.map(str::to_string);
        let record = record.clone();
        Ok(state.permission_view(&record))
    }

    async fn delete_permission(&self, id: &str) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if state.permissions.remove(id).is_none() {
            return Err(StoreError::NotFound("permission".into()));
        }
        // Cascade: every role that granted it loses the assignment and moves
        // to a new revision, since its permission set changed.
        let affected: Vec<String> = state
            .assignments
            .iter()
            .filter(|a| a.permission_id == id)
            .map(|a| a.role_id.clone())
            .collect();
        state.assignments.retain(|a| a.permission_id != id);
        for role_id in affected {
            if let Some(role) = state.roles.get_mut(&role_id) {
                role.revision += 1;
            }
        }
        state.record_gauges();
        Ok(())
    }

    async fn list_roles(&self) -> StoreResult<Vec<Role>> {
        let state = self.state.read().await;
        let mut items: Vec<_> = state
            .roles
            .values()
            .map(|record| state.role_view(record))
            .collect();
        newest_first(&mut items, |r| (r.created_at, r.name.clone()));
        Ok(items)
    }

    async fn get_role(&self, id: &str) -> StoreResult<Role> {
        let state = self.state.read().await;
        state
            .roles
            .get(id)
            .map(|record| state.role_view(record))
            .ok_or_else(|| StoreError::NotFound("role".into()))
    }

    async fn get_role_by_name(&self, name: &str) -> StoreResult<Option<Role>> {
        let state = self.state.read().await;
        Ok(state
            .roles
            .values()
            .find(|r| r.name == name)
            .map(|record| state.role_view(record)))
    }

    async fn create_role(&self, name: &str) -> StoreResult<Role> {
        let name = normalize_name("role", name).map_err(StoreError::Invalid)?;
        let mut state = self.state.write().await;
        if state.role_name_taken(&name, None) {
            return Err(StoreError::Conflict(format!("role '{name}' already exists")));
        }
        let record = RoleRecord {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            created_at: Utc::now(),
            revision: 0,
        };
        state.roles.insert(record.id.clone(), record.clone());
        state.record_gauges();
        Ok(state.role_view(&record))
    }

    async fn update_role(&self, id: &str, name: &str) -> StoreResult<Role> {
        let name = normalize_name("role", name).map_err(StoreError::Invalid)?;
        let mut state = self.state.write().await;
        if !state.roles.contains_key(id) {
            return Err(StoreError::NotFound("role".into()));
        }
        if state.role_name_taken(&name, Some(id)) {
            return Err(StoreError::Conflict(format!("role '{name}' already exists")));
        }
        let record = state
            .roles
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound("role".into()))?;
        record.name = name;
        let record = record.clone();
        Ok(state.role_view(&record))
    }

    async fn delete_role(&self, id: &str) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if state.roles.remove(id).is_none() {
            return Err(StoreError::NotFound("role".into()));
        }
        state.assignments.retain(|a| a.role_id != id);
        state.record_gauges();
        Ok(())
    }

    async fn role_permission_ids(&self, role_id: &str) -> StoreResult<IdSet> {
        let state = self.state.read().await;
        if !state.roles.contains_key(role_id) {
            return Err(StoreError::NotFound("role".into()));
        }
        Ok(state.permission_ids_of(role_id))
    }

    async fn set_role_permissions(
        &self,
        role_id: &str,
        permission_ids: &IdSet,
    ) -> StoreResult<Role> {
        let mut state = self.state.write().await;
        if !state.roles.contains_key(role_id) {
            return Err(StoreError::NotFound("role".into()));
        }
        state.replace_assignments(role_id, permission_ids)
    }

    async fn replace_role_permissions_checked(
        &self,
        role_id: &str,
        expected_revision: u64,
        permission_ids: &IdSet,
    ) -> StoreResult<Role> {
        let mut state = self.state.write().await;
        let actual = state
            .roles
            .get(role_id)
            .map(|role| role.revision)
            .ok_or_else(|| StoreError::NotFound("role".into()))?;
        if actual != expected_revision {
            return Err(StoreError::RevisionMismatch {
                expected: expected_revision,
                actual,
            });
        }
        state.replace_assignments(role_id, permission_ids)
    }

    async fn health_check(&self) -> StoreResult<()> {
        // Always healthy while the process runs.
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
