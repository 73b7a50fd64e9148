//! Template-driven command interpreter behind `POST /natural-language`.
//!
//! # Purpose
//! Turns short free-text admin commands ("create a permission called
//! 'publish'", "give the role 'Editor' the permission 'publish'") into store
//! operations and renders a one-line, human readable reply.
//!
//! # Behavior
//! - Matching is deterministic: see [`templates`] for the phrase shapes and
//!   their priority order.
//! - Every outcome, including store failures, is reported through the reply
//!   text; [`CommandInterpreter::evaluate`] never returns an error.
//! - Role lookups happen before permission lookups, so a command naming two
//!   unknown entities reports the role.
//! - Grants and revocations rewrite the role's whole permission set under an
//!   optimistic revision check and retry when a concurrent writer got there
//!   first.
use crate::model::Role;
use crate::observability;
use crate::store::{RbacStore, StoreError, StoreResult};
use std::sync::Arc;

pub mod templates;

pub use templates::{Intent, ParsedCommand, parse_command};

/// Attempts for one read-modify-write of a role's permission set.
pub const MAX_WRITE_ATTEMPTS: u32 = 3;

pub const NOT_UNDERSTOOD_MESSAGE: &str = "🤔 I couldn't understand that command. Please try using one of the example formats like:\n\
• 'Create a new permission called \"manage posts\"'\n\
• 'Give the role \"Editor\" the permission to \"edit articles\"'\n\
• 'Remove the permission \"delete posts\" from role \"Editor\"'";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
    /// The store changed.
    Success,
    /// Nothing to do; the store already had the requested state.
    Info,
    /// Lookup failed, name clashed, or the store returned an error.
    Failure,
    NotUnderstood,
}

impl ReplyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReplyStatus::Success => "success",
            ReplyStatus::Info => "info",
            ReplyStatus::Failure => "failure",
            ReplyStatus::NotUnderstood => "not_understood",
        }
    }

    fn glyph(self) -> &'static str {
        match self {
            ReplyStatus::Success => "✅",
            ReplyStatus::Info => "ℹ️",
            ReplyStatus::Failure => "❌",
            ReplyStatus::NotUnderstood => "🤔",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReply {
    pub intent: Option<Intent>,
    pub status: ReplyStatus,
    pub message: String,
}

impl CommandReply {
    fn new(intent: Intent, status: ReplyStatus, text: impl AsRef<str>) -> Self {
        Self {
            intent: Some(intent),
            status,
            message: format!("{} {}", status.glyph(), text.as_ref()),
        }
    }

    fn not_understood() -> Self {
        Self {
            intent: None,
            status: ReplyStatus::NotUnderstood,
            message: NOT_UNDERSTOOD_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Change {
    Grant,
    Revoke,
}

pub struct CommandInterpreter {
    store: Arc<dyn RbacStore>,
}

impl CommandInterpreter {
    pub fn new(store: Arc<dyn RbacStore>) -> Self {
        Self { store }
    }

    /// Run `text` and return only the reply message.
    pub async fn process(&self, text: &str) -> String {
        self.evaluate(text).await.message
    }

    pub async fn evaluate(&self, text: &str) -> CommandReply {
        let reply = match parse_command(text) {
            Some(command) => self.execute(command).await,
            None => CommandReply::not_understood(),
        };
        observability::record_command(
            reply.intent.map(Intent::as_str).unwrap_or("none"),
            reply.status.as_str(),
        );
        reply
    }

    /// Names are trimmed here once, so lookups see what the store keeps.
    async fn execute(&self, command: ParsedCommand) -> CommandReply {
        match command {
            ParsedCommand::CreatePermission { name, description } => {
                self.create_permission(name.trim(), description.as_deref())
                    .await
            }
            ParsedCommand::CreateRole { name } => self.create_role(name.trim()).await,
            ParsedCommand::AssignPermission { role, permission } => {
                self.assign(role.trim(), permission.trim()).await
            }
            ParsedCommand::RemovePermission { role, permission } => {
                self.remove(role.trim(), permission.trim()).await
            }
        }
    }

    async fn create_permission(&self, name: &str, description: Option<&str>) -> CommandReply {
        let intent = Intent::CreatePermission;
        match self.store.create_permission(name, description).await {
            Ok(permission) => {
                let name = permission.name;
                let text = match permission.description {
                    Some(description) => {
                        format!("Created permission '{name}' with description '{description}'.")
                    }
                    None => format!("Created permission '{name}'."),
                };
                CommandReply::new(intent, ReplyStatus::Success, text)
            }
            Err(StoreError::Conflict(_)) => CommandReply::new(
                intent,
                ReplyStatus::Failure,
                format!("Permission '{name}' already exists."),
            ),
            Err(err) => CommandReply::new(
                intent,
                ReplyStatus::Failure,
                format!("Failed to create permission: {err}"),
            ),
        }
    }

    async fn create_role(&self, name: &str) -> CommandReply {
        let intent = Intent::CreateRole;
        match self.store.create_role(name).await {
            Ok(role) => CommandReply::new(
                intent,
                ReplyStatus::Success,
                format!("Created role '{}'.", role.name),
            ),
            Err(StoreError::Conflict(_)) => CommandReply::new(
                intent,
                ReplyStatus::Failure,
                format!("Role '{name}' already exists."),
            ),
            Err(err) => CommandReply::new(
                intent,
                ReplyStatus::Failure,
                format!("Failed to create role: {err}"),
            ),
        }
    }

    async fn assign(&self, role_name: &str, permission_name: &str) -> CommandReply {
        let intent = Intent::AssignPermission;
        let failed = |err: StoreError| {
            CommandReply::new(
                intent,
                ReplyStatus::Failure,
                format!("Failed to assign permission: {err}"),
            )
        };
        let role = match self.store.get_role_by_name(role_name).await {
            Ok(Some(role)) => role,
            Ok(None) => {
                return CommandReply::new(
                    intent,
                    ReplyStatus::Failure,
                    format!("Role '{role_name}' not found. Please create it first."),
                );
            }
            Err(err) => return failed(err),
        };
        let permission = match self.store.get_permission_by_name(permission_name).await {
            Ok(Some(permission)) => permission,
            Ok(None) => {
                return CommandReply::new(
                    intent,
                    ReplyStatus::Failure,
                    format!("Permission '{permission_name}' not found. Please create it first."),
                );
            }
            Err(err) => return failed(err),
        };
        match self.rewrite(role, &permission.id, Change::Grant).await {
            Ok(true) => CommandReply::new(
                intent,
                ReplyStatus::Success,
                format!("Assigned permission '{permission_name}' to role '{role_name}'."),
            ),
            Ok(false) => CommandReply::new(
                intent,
                ReplyStatus::Info,
                format!("Role '{role_name}' already has permission '{permission_name}'."),
            ),
            Err(err) => failed(err),
        }
    }

    async fn remove(&self, role_name: &str, permission_name: &str) -> CommandReply {
        let intent = Intent::RemovePermission;
        let failed = |err: StoreError| {
            CommandReply::new(
                intent,
                ReplyStatus::Failure,
                format!("Failed to remove permission: {err}"),
            )
        };
        let role = match self.store.get_role_by_name(role_name).await {
            Ok(Some(role)) => role,
            Ok(None) => {
                return CommandReply::new(
                    intent,
                    ReplyStatus::Failure,
                    format!("Role '{role_name}' not found."),
                );
            }
            Err(err) => return failed(err),
        };
        let permission = match self.store.get_permission_by_name(permission_name).await {
            Ok(Some(permission)) => permission,
            Ok(None) => {
                return CommandReply::new(
                    intent,
                    ReplyStatus::Failure,
                    format!("Permission '{permission_name}' not found."),
                );
            }
            Err(err) => return failed(err),
        };
        match self.rewrite(role, &permission.id, Change::Revoke).await {
            Ok(true) => CommandReply::new(
                intent,
                ReplyStatus::Success,
                format!("Removed permission '{permission_name}' from role '{role_name}'."),
            ),
            Ok(false) => CommandReply::new(
                intent,
                ReplyStatus::Info,
                format!("Role '{role_name}' doesn't have permission '{permission_name}'."),
            ),
            Err(err) => failed(err),
        }
    }

    /// Apply `change` to the role's permission set. Returns `false` when the
    /// set already had the requested shape and nothing was written.
    async fn rewrite(&self, mut role: Role, permission_id: &str, change: Change) -> StoreResult<bool> {
        let mut attempt = 1;
        loop {
            let mut wanted = role.permission_ids.clone();
            let changed = match change {
                Change::Grant => wanted.insert(permission_id.to_string()),
                Change::Revoke => wanted.remove(permission_id),
            };
            if !changed {
                return Ok(false);
            }
            match self
                .store
                .replace_role_permissions_checked(&role.id, role.revision, &wanted)
                .await
            {
                Ok(_) => return Ok(true),
                Err(StoreError::RevisionMismatch { expected, actual })
                    if attempt < MAX_WRITE_ATTEMPTS =>
                {
                    tracing::debug!(
                        role_id = %role.id,
                        expected,
                        actual,
                        attempt,
                        "role permissions changed concurrently; retrying"
                    );
                    attempt += 1;
                    role = self.store.get_role(&role.id).await?;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
