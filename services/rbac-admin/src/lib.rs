//! RBAC admin service library crate.
//!
//! # Purpose
//! Exposes the permission/role data model, the storage backends, the free-text
//! command interpreter, and the HTTP API for use by the binary and tests.
//!
//! # Notes
//! Module boundaries mirror the HTTP API and storage backends for clarity.
pub mod api;
pub mod app;
pub mod config;
pub mod interpreter;
pub mod model;
pub mod observability;
pub mod store;
