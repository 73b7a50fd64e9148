//! Logging, trace export, and metrics for the RBAC admin service.
//!
//! # Purpose
//! Owns every series the service emits and the one place they are recorded:
//! the interpreter reports each command through [`record_command`], stores
//! report their size through [`record_inventory`], and the metrics listener
//! renders both at `/metrics`.
//!
//! # Notes
//! - [`init_observability`] installs global state (subscriber, propagator,
//!   recorder) once per process; later calls return the same [`Telemetry`].
//! - Spans go to OTLP only when an exporter can be built from the standard
//!   `OTEL_EXPORTER_OTLP_*` environment; logging works either way.
use axum::http::{HeaderMap, Request};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use opentelemetry::KeyValue;
use opentelemetry::global;
use opentelemetry::propagation::Extractor;
use opentelemetry::trace::TracerProvider;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::future::Future;
use std::sync::OnceLock;
use tracing_opentelemetry::OpenTelemetrySpanExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Name reported in traces, OTLP resources, and `/v1/system/info`.
pub const SERVICE_NAME: &str = "rbac-admin";

pub const COMMANDS_TOTAL: &str = "rbac_commands_total";
pub const PERMISSIONS_TOTAL: &str = "rbac_permissions_total";
pub const ROLES_TOTAL: &str = "rbac_roles_total";

/// Resource attributes read from the environment; the first variable set wins.
const RESOURCE_ENV: &[(&str, &[&str])] = &[
    (
        "service.instance.id",
        &["RBAC_ADMIN_SERVICE_INSTANCE_ID", "HOSTNAME"],
    ),
    (
        "deployment.environment",
        &["RBAC_ADMIN_ENVIRONMENT", "DEPLOYMENT_ENVIRONMENT"],
    ),
];

static TELEMETRY: OnceLock<Telemetry> = OnceLock::new();
static PROPAGATOR: OnceLock<()> = OnceLock::new();

/// Handles produced by [`init_observability`].
#[derive(Clone)]
pub struct Telemetry {
    metrics: PrometheusHandle,
    exports_spans: bool,
}

impl Telemetry {
    pub fn metrics(&self) -> &PrometheusHandle {
        &self.metrics
    }

    /// Whether an OTLP span exporter was installed.
    pub fn exports_spans(&self) -> bool {
        self.exports_spans
    }
}

pub fn init_observability(service_name: &str) -> Telemetry {
    TELEMETRY
        .get_or_init(|| {
            install_propagator();
            let provider = build_tracer_provider(service_name);
            let exports_spans = provider.is_some();
            init_subscriber(service_name, provider);
            let metrics = install_metrics_recorder();
            describe_metrics();
            tracing::debug!(service = service_name, exports_spans, "telemetry initialized");
            Telemetry {
                metrics,
                exports_spans,
            }
        })
        .clone()
}

fn init_subscriber(service_name: &str, provider: Option<SdkTracerProvider>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer());
    // A subscriber set by the embedding test harness stays in place.
    let _ = match provider {
        Some(provider) => {
            let tracer = provider.tracer(service_name.to_string());
            registry
                .with(tracing_opentelemetry::layer().with_tracer(tracer))
                .try_init()
        }
        None => registry.try_init(),
    };
}

fn build_tracer_provider(service_name: &str) -> Option<SdkTracerProvider> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .build()
        .ok()?;
    let resource = Resource::builder_empty()
        .with_attributes(resource_attributes(service_name, |key| std::env::var(key).ok()))
        .build();
    Some(
        SdkTracerProvider::builder()
            .with_batch_exporter(exporter)
            .with_resource(resource)
            .build(),
    )
}

fn resource_attributes(
    service_name: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Vec<KeyValue> {
    let mut attrs = vec![
        KeyValue::new("service.name", service_name.to_string()),
        KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
    ];
    for (attribute, keys) in RESOURCE_ENV {
        if let Some(value) = keys.iter().find_map(|key| lookup(*key)) {
            attrs.push(KeyValue::new(*attribute, value));
        }
    }
    attrs
}

fn describe_metrics() {
    metrics::describe_counter!(
        COMMANDS_TOTAL,
        "Free-text commands processed, labelled by intent and outcome"
    );
    metrics::describe_gauge!(PERMISSIONS_TOTAL, "Permissions currently stored");
    metrics::describe_gauge!(ROLES_TOTAL, "Roles currently stored");
}

/// Count one interpreter outcome and log it.
pub fn record_command(intent: &'static str, status: &'static str) {
    metrics::counter!(COMMANDS_TOTAL, "intent" => intent, "status" => status).increment(1);
    tracing::info!(intent, status, "processed rbac command");
}

/// Publish the current number of permissions and roles.
pub fn record_inventory(permissions: usize, roles: usize) {
    metrics::gauge!(PERMISSIONS_TOTAL).set(permissions as f64);
    metrics::gauge!(ROLES_TOTAL).set(roles as f64);
}

fn install_propagator() {
    PROPAGATOR.get_or_init(|| {
        global::set_text_map_propagator(TraceContextPropagator::new());
    });
}

/// `http.request` span for `request`, parented on any incoming W3C trace context.
pub fn request_span<B>(request: &Request<B>) -> tracing::Span {
    let span = tracing::info_span!(
        "http.request",
        method = %request.method(),
        uri = %request.uri(),
        version = ?request.version()
    );
    span.set_parent(trace_context_from_headers(request.headers()));
    span
}

pub fn trace_context_from_headers(headers: &HeaderMap) -> opentelemetry::Context {
    install_propagator();
    global::get_text_map_propagator(|prop| prop.extract(&HeaderMapExtractor(headers)))
}

struct HeaderMapExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderMapExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|name| name.as_str()).collect()
    }
}

/// Serve `/metrics` on an already bound listener until `shutdown` resolves.
pub async fn serve_metrics<F>(
    handle: PrometheusHandle,
    listener: tokio::net::TcpListener,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = axum::Router::new().route(
        "/metrics",
        axum::routing::get(move || async move { handle.render() }),
    );
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
}

fn install_metrics_recorder() -> PrometheusHandle {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => handle,
        Err(err) => {
            // Another recorder owns the global slot; render from a detached one.
            tracing::warn!(error = %err, "metrics recorder already installed");
            PrometheusBuilder::new().build_recorder().handle()
        }
    }
}
