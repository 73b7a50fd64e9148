//! RBAC admin HTTP service entry point.
//!
//! # Purpose
//! Wires configuration, storage, and the HTTP router, then serves the API and
//! the Prometheus metrics listener until shutdown.
//!
//! # Notes
//! The `build_state` helper keeps wiring testable and minimizes main setup logic.
use anyhow::Context;
use rbac_admin::app::{AppState, build_router};
use rbac_admin::config::{RbacAdminConfig, StorageBackend};
use rbac_admin::observability;
use rbac_admin::store::RbacStore;
use rbac_admin::store::memory::InMemoryStore;
use rbac_admin::store::postgres::PostgresStore;
use rbac_admin::store::seed::seed_demo_data;
use std::future::Future;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = RbacAdminConfig::from_env_or_yaml().context("rbac admin config")?;
    run_with_shutdown(config, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

async fn run_with_shutdown<F>(config: RbacAdminConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let telemetry = observability::init_observability(observability::SERVICE_NAME);
    let state = build_state(&config).await?;
    let metrics_listener = tokio::net::TcpListener::bind(config.metrics_bind)
        .await
        .with_context(|| format!("bind metrics listener {}", config.metrics_bind))?;
    let (stop_metrics, metrics_stopped) = tokio::sync::oneshot::channel::<()>();
    let metrics_task = tokio::spawn(observability::serve_metrics(
        telemetry.metrics().clone(),
        metrics_listener,
        async move {
            let _ = metrics_stopped.await;
        },
    ));

    let app = build_router(state.clone());
    let addr = config.bind_addr;
    tracing::info!(
        %addr,
        backend = state.store.backend_name(),
        lowercase_commands = state.lowercase_commands,
        exports_spans = telemetry.exports_spans(),
        "rbac admin listening"
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tokio::pin!(shutdown);
    tokio::select! {
        result = axum::serve(listener, app.into_make_service()) => {
            result?;
        }
        _ = &mut shutdown => {}
    }

    let _ = stop_metrics.send(());
    match metrics_task.await {
        Ok(Err(err)) => tracing::warn!(error = %err, "metrics listener failed"),
        Err(err) => tracing::warn!(error = %err, "metrics listener task failed"),
        Ok(Ok(())) => {}
    }
    Ok(())
}

async fn build_state(config: &RbacAdminConfig) -> anyhow::Result<AppState> {
    let store: Arc<dyn RbacStore> = match config.storage {
        StorageBackend::Memory => Arc::new(InMemoryStore::new()),
        StorageBackend::Postgres => {
            let pg = config
                .postgres
                .as_ref()
                .context("postgres configuration missing")?;
            Arc::new(
                PostgresStore::connect(pg)
                    .await
                    .context("connect postgres store")?,
            )
        }
    };
    if config.seed_demo {
        seed_demo_data(store.as_ref())
            .await
            .context("seed demo data")?;
    }
    Ok(AppState::new(store, config.lowercase_commands))
}
