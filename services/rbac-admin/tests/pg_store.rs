#![cfg(feature = "pg-tests")]

use rbac_admin::config::PostgresConfig;
use rbac_admin::interpreter::CommandInterpreter;
use rbac_admin::model::IdSet;
use rbac_admin::store::postgres::PostgresStore;
use rbac_admin::store::seed::seed_demo_data;
use rbac_admin::store::{RbacStore, StoreError};
use serial_test::serial;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

fn database_url() -> Option<String> {
    std::env::var("RBAC_ADMIN_TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
}

async fn reset_postgres(url: &str) -> Result<(), sqlx::Error> {
    let pool = match tokio::time::timeout(
        std::time::Duration::from_secs(2),
        PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(std::time::Duration::from_secs(2))
            .connect(url),
    )
    .await
    {
        Ok(result) => result?,
        Err(_) => return Err(sqlx::Error::PoolTimedOut),
    };
    sqlx::query("TRUNCATE role_permissions, roles, permissions")
        .execute(&pool)
        .await
        .map(|_| ())
}

async fn pg_store() -> Option<PostgresStore> {
    let Some(url) = database_url() else {
        eprintln!("skipping pg-tests: set RBAC_ADMIN_TEST_DATABASE_URL or DATABASE_URL");
        return None;
    };
    let config = PostgresConfig {
        url: url.clone(),
        max_connections: 5,
        connect_timeout_ms: 5_000,
        acquire_timeout_ms: 5_000,
    };
    // Connecting first applies the migrations the reset relies on.
    let store = match PostgresStore::connect(&config).await {
        Ok(store) => store,
        Err(err) => {
            eprintln!("skipping pg-tests: connect postgres store failed: {err}");
            return None;
        }
    };
    if let Err(err) = reset_postgres(&url).await {
        eprintln!("skipping pg-tests: cannot reset postgres: {err}");
        return None;
    }
    Some(store)
}

#[tokio::test]
#[serial]
async fn permission_and_role_crud() {
    let Some(store) = pg_store().await else {
        return;
    };

    let permission = store
        .create_permission("publish", Some("Can publish"))
        .await
        .expect("create permission");
    assert_eq!(permission.description.as_deref(), Some("Can publish"));
    let err = store
        .create_permission("publish", None)
        .await
        .expect_err("duplicate");
    assert!(matches!(err, StoreError::Conflict(_)));
    let err = store.create_permission("  ", None).await.expect_err("blank");
    assert!(matches!(err, StoreError::Invalid(_)));

    let found = store
        .get_permission_by_name("publish")
        .await
        .expect("lookup")
        .expect("present");
    assert_eq!(found.id, permission.id);
    assert!(
        store
            .get_permission_by_name("Publish")
            .await
            .expect("lookup")
            .is_none()
    );

    let role = store.create_role("Editor").await.expect("create role");
    assert_eq!(role.revision, 0);
    let renamed = store.update_role(&role.id, "Writer").await.expect("rename");
    assert_eq!(renamed.name, "Writer");
    let other = store.create_role("Viewer").await.expect("viewer");
    let err = store
        .update_role(&other.id, "Writer")
        .await
        .expect_err("rename clash");
    assert!(matches!(err, StoreError::Conflict(_)));

    let updated = store
        .update_permission(&permission.id, "publish posts", None)
        .await
        .expect("update permission");
    assert_eq!(updated.name, "publish posts");
    assert_eq!(updated.description, None);

    store.delete_role(&other.id).await.expect("delete role");
    let err = store.get_role(&other.id).await.expect_err("deleted");
    assert!(matches!(err, StoreError::NotFound(_)));
    assert_eq!(store.list_roles().await.expect("roles").len(), 1);
}

#[tokio::test]
#[serial]
async fn replace_set_and_revision_checks() {
    let Some(store) = pg_store().await else {
        return;
    };
    let read = store.create_permission("read", None).await.expect("read");
    let write = store.create_permission("write", None).await.expect("write");
    let role = store.create_role("Author").await.expect("role");

    let wanted = IdSet::from([read.id.clone(), write.id.clone()]);
    let updated = store
        .set_role_permissions(&role.id, &wanted)
        .await
        .expect("replace");
    assert_eq!(updated.permission_ids, wanted);
    assert_eq!(updated.revision, 1);
    assert_eq!(
        store.role_permission_ids(&role.id).await.expect("ids"),
        wanted
    );

    let err = store
        .set_role_permissions(&role.id, &IdSet::from(["missing".to_string()]))
        .await
        .expect_err("unknown permission");
    assert!(matches!(err, StoreError::NotFound(_)));
    assert_eq!(
        store.role_permission_ids(&role.id).await.expect("ids"),
        wanted
    );

    let err = store
        .replace_role_permissions_checked(&role.id, 0, &IdSet::new())
        .await
        .expect_err("stale revision");
    assert!(matches!(
        err,
        StoreError::RevisionMismatch {
            expected: 0,
            actual: 1
        }
    ));
    let cleared = store
        .replace_role_permissions_checked(&role.id, 1, &IdSet::from([read.id.clone()]))
        .await
        .expect("checked replace");
    assert_eq!(cleared.revision, 2);

    store
        .delete_permission(&read.id)
        .await
        .expect("delete permission");
    let role = store.get_role(&role.id).await.expect("role");
    assert!(role.permission_ids.is_empty());
    assert_eq!(role.revision, 3);
}

#[tokio::test]
#[serial]
async fn interpreter_and_seed_against_postgres() {
    let Some(store) = pg_store().await else {
        return;
    };
    seed_demo_data(&store).await.expect("seed");
    seed_demo_data(&store).await.expect("seed twice");
    let store: Arc<dyn RbacStore> = Arc::new(store);
    assert_eq!(store.list_permissions().await.expect("permissions").len(), 4);

    let interpreter = CommandInterpreter::new(store.clone());
    assert_eq!(
        interpreter
            .process("Give the role \"Viewer\" the permission \"manage_users\"")
            .await,
        "✅ Assigned permission 'manage_users' to role 'Viewer'."
    );
    assert_eq!(
        interpreter
            .process("Remove the permission \"read_articles\" from role \"Viewer\"")
            .await,
        "✅ Removed permission 'read_articles' from role 'Viewer'."
    );
    let viewer = store
        .get_role_by_name("Viewer")
        .await
        .expect("lookup")
        .expect("viewer");
    assert_eq!(viewer.permission_ids.len(), 1);
    assert!(store.is_durable());
    assert_eq!(store.backend_name(), "postgres");
}
