//! OpenAPI schema aggregation for the RBAC admin API.
//!
//! # Purpose
//! Collects all routes and schema types into a single OpenAPI document for docs
//! and client generation.
use crate::api::{
    commands, permissions, roles, system,
    types::{
        CommandRequest, CommandResponse, ErrorResponse, FeatureFlags, HealthStatus,
        PermissionListResponse, RoleListResponse, SystemInfo,
    },
};
use crate::model::{
    Permission, PermissionCreateRequest, PermissionPatchRequest, Role, RoleCreateRequest,
    RolePatchRequest, RolePermissionsRequest,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "rbac-admin",
        version = "v1",
        description = "Role-based access control administration API"
    ),
    paths(
        system::system_info,
        system::system_health,
        commands::run_command,
        permissions::list_permissions,
        permissions::create_permission,
        permissions::get_permission,
        permissions::patch_permission,
        permissions::delete_permission,
        roles::list_roles,
        roles::create_role,
        roles::get_role,
        roles::patch_role,
        roles::delete_role,
        roles::put_role_permissions
    ),
    components(schemas(
        FeatureFlags,
        SystemInfo,
        HealthStatus,
        ErrorResponse,
        CommandRequest,
        CommandResponse,
        Permission,
        PermissionCreateRequest,
        PermissionPatchRequest,
        PermissionListResponse,
        Role,
        RoleCreateRequest,
        RolePatchRequest,
        RolePermissionsRequest,
        RoleListResponse
    )),
    tags(
        (name = "system", description = "System and discovery endpoints"),
        (name = "commands", description = "Free-text administration commands"),
        (name = "permissions", description = "Permission management"),
        (name = "roles", description = "Role management and permission grants")
    )
)]
pub struct ApiDoc;
