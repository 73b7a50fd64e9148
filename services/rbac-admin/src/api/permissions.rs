//! Permission API handlers.
//!
//! # Purpose
//! Implements permission CRUD with consistent error mapping for name
//! conflicts and missing records. Deleting a permission revokes it from every
//! role that held it.
use crate::api::error::{ApiError, api_internal, api_store_error};
use crate::api::types::PermissionListResponse;
use crate::app::AppState;
use crate::model::{Permission, PermissionCreateRequest, PermissionPatchRequest};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

#[utoipa::path(
    get,
    path = "/v1/permissions",
    tag = "permissions",
    responses(
        (status = 200, description = "List permissions, newest first", body = PermissionListResponse)
    )
)]
pub(crate) async fn list_permissions(
    State(state): State<AppState>,
) -> Result<Json<PermissionListResponse>, ApiError> {
    let items = state
        .store
        .list_permissions()
        .await
        .map_err(|err| api_internal("failed to list permissions", &err))?;
    Ok(Json(PermissionListResponse { items }))
}

#[utoipa::path(
    post,
    path = "/v1/permissions",
    tag = "permissions",
    request_body = PermissionCreateRequest,
    responses(
        (status = 201, description = "Permission created", body = Permission),
        (status = 400, description = "Blank name", body = crate::api::types::ErrorResponse),
        (status = 409, description = "Permission name already exists", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn create_permission(
    State(state): State<AppState>,
    Json(body): Json<PermissionCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let permission = state
        .store
        .create_permission(&body.name, body.description.as_deref())
        .await
        .map_err(|err| api_store_error("permission", "create permission", err))?;
    tracing::info!(permission_id = %permission.id, name = %permission.name, "permission created");
    Ok((StatusCode::CREATED, Json(permission)))
}

#[utoipa::path(
    get,
    path = "/v1/permissions/{permission_id}",
    tag = "permissions",
    params(
        ("permission_id" = String, Path, description = "Permission identifier")
    ),
    responses(
        (status = 200, description = "Permission with the roles granting it", body = Permission),
        (status = 404, description = "Permission not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn get_permission(
    Path(permission_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Permission>, ApiError> {
    state
        .store
        .get_permission(&permission_id)
        .await
        .map(Json)
        .map_err(|err| api_store_error("permission", "fetch permission", err))
}

#[utoipa::path(
    patch,
    path = "/v1/permissions/{permission_id}",
    tag = "permissions",
    params(
        ("permission_id" = String, Path, description = "Permission identifier")
    ),
    request_body = PermissionPatchRequest,
    responses(
        (status = 200, description = "Permission updated", body = Permission),
        (status = 404, description = "Permission not found", body = crate::api::types::ErrorResponse),
        (status = 409, description = "Permission name already exists", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn patch_permission(
    Path(permission_id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<PermissionPatchRequest>,
) -> Result<Json<Permission>, ApiError> {
    let current = state
        .store
        .get_permission(&permission_id)
        .await
        .map_err(|err| api_store_error("permission", "fetch permission", err))?;
    let description = body.merged_description(current.description);
    let name = body.name.unwrap_or(current.name);
    state
        .store
        .update_permission(&permission_id, &name, description.as_deref())
        .await
        .map(Json)
        .map_err(|err| api_store_error("permission", "update permission", err))
}

#[utoipa::path(
    delete,
    path = "/v1/permissions/{permission_id}",
    tag = "permissions",
    params(
        ("permission_id" = String, Path, description = "Permission identifier")
    ),
    responses(
        (status = 204, description = "Permission deleted and revoked from all roles"),
        (status = 404, description = "Permission not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn delete_permission(
    Path(permission_id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .delete_permission(&permission_id)
        .await
        .map_err(|err| api_store_error("permission", "delete permission", err))?;
    tracing::info!(permission_id = %permission_id, "permission deleted");
    Ok(StatusCode::NO_CONTENT)
}
