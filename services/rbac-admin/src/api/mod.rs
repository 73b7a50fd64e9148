//! RBAC admin HTTP API module.
//!
//! # Purpose
//! Exposes route handler modules plus the shared error and payload types.
pub mod commands;
pub mod error;
pub mod openapi;
pub mod permissions;
pub mod roles;
pub mod system;
pub mod types;
