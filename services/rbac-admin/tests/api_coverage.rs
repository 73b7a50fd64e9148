mod common;
mod http_helpers;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::read_json;
use http_helpers::json_request;
use rbac_admin::app::{AppState, build_router};
use rbac_admin::model::{IdSet, Permission, Role};
use rbac_admin::store::memory::InMemoryStore;
use rbac_admin::store::{RbacStore, StoreError, StoreResult};
use std::sync::Arc;
use tower::ServiceExt;

/// Store whose every call fails as if the database were gone.
struct UnavailableStore;

fn down<T>() -> StoreResult<T> {
    Err(StoreError::Unexpected(anyhow::anyhow!("database unavailable")))
}

#[async_trait]
impl RbacStore for UnavailableStore {
    async fn list_permissions(&self) -> StoreResult<Vec<Permission>> {
        down()
    }
    async fn get_permission(&self, _id: &str) -> StoreResult<Permission> {
        down()
    }
    async fn get_permission_by_name(&self, _name: &str) -> StoreResult<Option<Permission>> {
        down()
    }
    async fn create_permission(
        &self,
        _name: &str,
        _description: Option<&str>,
    ) -> StoreResult<Permission> {
        down()
    }
    async fn update_permission(
        &self,
        _id: &str,
        _name: &str,
        _description: Option<&str>,
    ) -> StoreResult<Permission> {
        down()
    }
    async fn delete_permission(&self, _id: &str) -> StoreResult<()> {
        down()
    }
    async fn list_roles(&self) -> StoreResult<Vec<Role>> {
        down()
    }
    async fn get_role(&self, _id: &str) -> StoreResult<Role> {
        down()
    }
    async fn get_role_by_name(&self, _name: &str) -> StoreResult<Option<Role>> {
        down()
    }
    async fn create_role(&self, _name: &str) -> StoreResult<Role> {
        down()
    }
    async fn update_role(&self, _id: &str, _name: &str) -> StoreResult<Role> {
        down()
    }
    async fn delete_role(&self, _id: &str) -> StoreResult<()> {
        down()
    }
    async fn set_role_permissions(
        &self,
        _role_id: &str,
        _permission_ids: &IdSet,
    ) -> StoreResult<Role> {
        down()
    }
    async fn replace_role_permissions_checked(
        &self,
        _role_id: &str,
        _expected_revision: u64,
        _permission_ids: &IdSet,
    ) -> StoreResult<Role> {
        down()
    }
    async fn health_check(&self) -> StoreResult<()> {
        down()
    }
    fn is_durable(&self) -> bool {
        true
    }
    fn backend_name(&self) -> &'static str {
        "unavailable"
    }
}

fn app_with_store(store: Arc<dyn RbacStore>) -> axum::routing::RouterIntoService<Body, ()> {
    build_router(AppState::new(store, true)).into_service()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).expect("get")
}

#[tokio::test]
async fn storage_failures_map_to_internal_errors() {
    let app = app_with_store(Arc::new(UnavailableStore));

    let response = app
        .clone()
        .oneshot(get("/v1/system/health"))
        .await
        .expect("health");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = read_json(response).await;
    assert_eq!(body["code"], "internal");
    assert_eq!(body["message"], "storage unavailable");

    let response = app
        .clone()
        .oneshot(get("/v1/permissions"))
        .await
        .expect("list permissions");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(read_json(response).await["message"], "failed to list permissions");

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/roles",
            serde_json::json!({ "name": "ops" }),
        ))
        .await
        .expect("create role");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = read_json(response).await;
    assert_eq!(body["message"], "failed to create role");
    assert!(!body["message"].as_str().expect("message").contains("database"));
}

#[tokio::test]
async fn storage_failures_are_reported_inside_command_replies() {
    let app = app_with_store(Arc::new(UnavailableStore));

    let cases = [
        ("create role \"ops\"", "❌ Failed to create role: database unavailable"),
        (
            "create permission \"read\"",
            "❌ Failed to create permission: database unavailable",
        ),
        (
            "give the role \"ops\" the permission \"read\"",
            "❌ Failed to assign permission: database unavailable",
        ),
        (
            "remove permission \"read\" from role \"ops\"",
            "❌ Failed to remove permission: database unavailable",
        ),
    ];
    for (command, expected) in cases {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/natural-language",
                serde_json::json!({ "command": command }),
            ))
            .await
            .expect("command");
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["result"], expected);
        assert_eq!(body["status"], "failure");
    }
}

#[tokio::test]
async fn unknown_ids_return_not_found() {
    let app = app_with_store(Arc::new(InMemoryStore::new()));

    for request in [
        get("/v1/roles/nope"),
        get("/v1/permissions/nope"),
        json_request(
            "PATCH",
            "/v1/roles/nope",
            serde_json::json!({ "name": "x" }),
        ),
        json_request(
            "PATCH",
            "/v1/permissions/nope",
            serde_json::json!({ "name": "x" }),
        ),
        json_request(
            "PUT",
            "/v1/roles/nope/permissions",
            serde_json::json!({ "permission_ids": [] }),
        ),
        Request::builder()
            .method("DELETE")
            .uri("/v1/permissions/nope")
            .body(Body::empty())
            .expect("delete"),
    ] {
        let uri = request.uri().to_string();
        let response = app.clone().oneshot(request).await.expect("request");
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(read_json(response).await["code"], "not_found");
    }
}

#[tokio::test]
async fn blank_role_rename_is_rejected() {
    let store = InMemoryStore::new();
    let role = store.create_role("ops").await.expect("role");
    let app = app_with_store(Arc::new(store));

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/v1/roles/{}", role.id),
            serde_json::json!({ "name": "   " }),
        ))
        .await
        .expect("rename");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["code"], "validation_error");
    assert_eq!(body["message"], "role name must not be empty");
}
