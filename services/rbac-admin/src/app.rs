//! RBAC admin HTTP application wiring.
//!
//! # Purpose
//! Builds the Axum router, configures middleware, and defines the shared
//! application state injected into handlers.
//!
//! # Notes
//! This module centralizes route composition to keep `main` small and testable.
use crate::api;
use crate::api::openapi::ApiDoc;
use crate::api::types::FeatureFlags;
use crate::interpreter::CommandInterpreter;
use crate::observability;
use crate::store::RbacStore;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

#[derive(Clone)]
pub struct AppState {
    pub api_version: String,
    pub features: FeatureFlags,
    pub store: Arc<dyn RbacStore>,
    pub interpreter: Arc<CommandInterpreter>,
    pub lowercase_commands: bool,
}

impl AppState {
    /// State for `store`; the interpreter shares the same store handle.
    pub fn new(store: Arc<dyn RbacStore>, lowercase_commands: bool) -> Self {
        let features = FeatureFlags {
            durable_storage: store.is_durable(),
            lowercase_commands,
        };
        Self {
            api_version: "v1".to_string(),
            features,
            interpreter: Arc::new(CommandInterpreter::new(store.clone())),
            store,
            lowercase_commands,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &axum::http::Request<_>| observability::request_span(request));

    Router::new()
        .route(
            "/v1/system/info",
            axum::routing::get(api::system::system_info),
        )
        .route(
            "/v1/system/health",
            axum::routing::get(api::system::system_health),
        )
        .route(
            "/natural-language",
            axum::routing::post(api::commands::run_command),
        )
        .route(
            "/v1/permissions",
            axum::routing::get(api::permissions::list_permissions)
                .post(api::permissions::create_permission),
        )
        .route(
            "/v1/permissions/:permission_id",
            axum::routing::get(api::permissions::get_permission)
                .patch(api::permissions::patch_permission)
                .delete(api::permissions::delete_permission),
        )
        .route(
            "/v1/roles",
            axum::routing::get(api::roles::list_roles).post(api::roles::create_role),
        )
        .route(
            "/v1/roles/:role_id",
            axum::routing::get(api::roles::get_role)
                .patch(api::roles::patch_role)
                .delete(api::roles::delete_role),
        )
        .route(
            "/v1/roles/:role_id/permissions",
            axum::routing::put(api::roles::put_role_permissions),
        )
        .merge(
            utoipa_swagger_ui::SwaggerUi::new("/docs").url("/v1/openapi.json", ApiDoc::openapi()),
        )
        .layer(trace_layer)
        .with_state(state)
}
