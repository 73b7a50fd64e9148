//! Role API handlers.
//!
//! # Purpose
//! Implements role CRUD and the replace-set endpoint for a role's granted
//! permissions.
use crate::api::error::{ApiError, api_internal, api_store_error};
use crate::api::types::RoleListResponse;
use crate::app::AppState;
use crate::model::{IdSet, Role, RoleCreateRequest, RolePatchRequest, RolePermissionsRequest};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

#[utoipa::path(
    get,
    path = "/v1/roles",
    tag = "roles",
    responses(
        (status = 200, description = "List roles, newest first", body = RoleListResponse)
    )
)]
pub(crate) async fn list_roles(
    State(state): State<AppState>,
) -> Result<Json<RoleListResponse>, ApiError> {
    let items = state
        .store
        .list_roles()
        .await
        .map_err(|err| api_internal("failed to list roles", &err))?;
    Ok(Json(RoleListResponse { items }))
}

#[utoipa::path(
    post,
    path = "/v1/roles",
    tag = "roles",
    request_body = RoleCreateRequest,
    responses(
        (status = 201, description = "Role created", body = Role),
        (status = 400, description = "Blank name", body = crate::api::types::ErrorResponse),
        (status = 409, description = "Role name already exists", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn create_role(
    State(state): State<AppState>,
    Json(body): Json<RoleCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let role = state
        .store
        .create_role(&body.name)
        .await
        .map_err(|err| api_store_error("role", "create role", err))?;
    tracing::info!(role_id = %role.id, name = %role.name, "role created");
    Ok((StatusCode::CREATED, Json(role)))
}

#[utoipa::path(
    get,
    path = "/v1/roles/{role_id}",
    tag = "roles",
    params(
        ("role_id" = String, Path, description = "Role identifier")
    ),
    responses(
        (status = 200, description = "Role with its granted permissions", body = Role),
        (status = 404, description = "Role not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn get_role(
    Path(role_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Role>, ApiError> {
    state
        .store
        .get_role(&role_id)
        .await
        .map(Json)
        .map_err(|err| api_store_error("role", "fetch role", err))
}

#[utoipa::path(
    patch,
    path = "/v1/roles/{role_id}",
    tag = "roles",
    params(
        ("role_id" = String, Path, description = "Role identifier")
    ),
    request_body = RolePatchRequest,
    responses(
        (status = 200, description = "Role renamed", body = Role),
        (status = 404, description = "Role not found", body = crate::api::types::ErrorResponse),
        (status = 409, description = "Role name already exists", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn patch_role(
    Path(role_id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<RolePatchRequest>,
) -> Result<Json<Role>, ApiError> {
    state
        .store
        .update_role(&role_id, &body.name)
        .await
        .map(Json)
        .map_err(|err| api_store_error("role", "update role", err))
}

#[utoipa::path(
    delete,
    path = "/v1/roles/{role_id}",
    tag = "roles",
    params(
        ("role_id" = String, Path, description = "Role identifier")
    ),
    responses(
        (status = 204, description = "Role deleted"),
        (status = 404, description = "Role not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn delete_role(
    Path(role_id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .delete_role(&role_id)
        .await
        .map_err(|err| api_store_error("role", "delete role", err))?;
    tracing::info!(role_id = %role_id, "role deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/v1/roles/{role_id}/permissions",
    tag = "roles",
    params(
        ("role_id" = String, Path, description = "Role identifier")
    ),
    request_body = RolePermissionsRequest,
    responses(
        (status = 200, description = "Permission set replaced", body = Role),
        (status = 404, description = "Role or permission not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn put_role_permissions(
    Path(role_id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<RolePermissionsRequest>,
) -> Result<Json<Role>, ApiError> {
    let wanted: IdSet = body.permission_ids.into_iter().collect();
    let role = state
        .store
        .set_role_permissions(&role_id, &wanted)
        .await
        .map_err(|err| api_store_error("role", "replace role permissions", err))?;
    tracing::info!(
        role_id = %role.id,
        permissions = role.permission_ids.len(),
        revision = role.revision,
        "role permissions replaced"
    );
    Ok(Json(role))
}
