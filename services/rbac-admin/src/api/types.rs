//! HTTP API request/response types.
//!
//! # Purpose
//! Defines shared payload shapes for the RBAC admin REST API and OpenAPI
//! schema generation. Entity types live in [`crate::model`].
use crate::model::{Permission, Role};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct FeatureFlags {
    pub durable_storage: bool,
    pub lowercase_commands: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct SystemInfo {
    pub service: String,
    pub api_version: String,
    pub storage_backend: String,
    pub features: FeatureFlags,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct HealthStatus {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub request_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct PermissionListResponse {
    pub items: Vec<Permission>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct RoleListResponse {
    pub items: Vec<Role>,
}

/// Body of `POST /natural-language`. Only documents the schema; the handler
/// validates the raw JSON itself so that every malformed body maps to the
/// same 400.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct CommandRequest {
    pub command: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct CommandResponse {
    /// Human readable outcome, prefixed with a status glyph.
    pub result: String,
    /// One of `success`, `info`, `failure`, `not_understood`.
    pub status: String,
}
