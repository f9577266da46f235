//! Logging and `OpenTelemetry` trace export.
//!
//! Console logging is always on (filtered by `RUST_LOG`). When any
//! `OTEL_EXPORTER_OTLP_*` variable is set, spans are also exported over OTLP.
//! Only available with the `telemetry` feature.

use std::env;
use std::time::Duration;

use axum::http::{Request, Response};
use opentelemetry::trace::{Status, TracerProvider};
use opentelemetry::{KeyValue, Value};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::trace::{Sampler, SdkTracerProvider};
use opentelemetry_semantic_conventions::SCHEMA_URL;
use opentelemetry_semantic_conventions::attribute::{DEPLOYMENT_ENVIRONMENT_NAME, SERVICE_VERSION};
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{DefaultOnRequest, MakeSpan, OnResponse, TraceLayer};
use tracing::Span;
use tracing_opentelemetry::{OpenTelemetryLayer, OpenTelemetrySpanExt};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// HTTP tracing layer produced by [`TelemetryGuard::http_tracing`].
pub type HttpTraceLayer = TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    HttpMakeSpan,
    DefaultOnRequest,
    HttpOnResponse,
>;

/// Reads a non-blank variable, falling back to a programmatic value.
fn env_or(key: &str, fallback: Option<&Value>) -> Option<Value> {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(Value::from)
        .or_else(|| fallback.cloned())
}

/// OTLP transport, or `None` when no exporter is configured.
fn otlp_protocol() -> Option<OtlpProtocol> {
    let configured = [
        "OTEL_EXPORTER_OTLP_ENDPOINT",
        "OTEL_EXPORTER_OTLP_HEADERS",
        "OTEL_EXPORTER_OTLP_PROTOCOL",
    ]
    .iter()
    .any(|key| env::var(key).is_ok());
    configured.then(|| match env::var("OTEL_EXPORTER_OTLP_PROTOCOL").as_deref() {
        Ok("grpc") => OtlpProtocol::Grpc,
        _ => OtlpProtocol::Http,
    })
}

#[derive(Debug, Clone, Copy)]
enum OtlpProtocol {
    Http,
    Grpc,
}

/// Telemetry settings for the service.
///
/// Name and version may be overridden with `OTEL_SERVICE_NAME` and
/// `OTEL_SERVICE_VERSION`; `OTEL_SERVICE_DEPLOYMENT` tags the environment.
#[derive(Debug, Default)]
pub struct Telemetry {
    name: Option<Value>,
    version: Option<Value>,
    log_level: Option<String>,
}

impl Telemetry {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the service name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<Value>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the service version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<Value>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Log filter used when `RUST_LOG` is not set (e.g. `"connect=debug"`).
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    fn resource(&self) -> Resource {
        let mut builder = Resource::builder();
        if let Some(name) = env_or("OTEL_SERVICE_NAME", self.name.as_ref()) {
            builder = builder.with_service_name(name);
        }
        let attributes: Vec<KeyValue> = [
            (SERVICE_VERSION, env_or("OTEL_SERVICE_VERSION", self.version.as_ref())),
            (DEPLOYMENT_ENVIRONMENT_NAME, env_or("OTEL_SERVICE_DEPLOYMENT", None)),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|value| KeyValue::new(key, value)))
        .collect();
        if !attributes.is_empty() {
            builder = builder.with_schema_url(attributes, SCHEMA_URL);
        }
        builder.build()
    }

    fn tracer_provider(&self, protocol: OtlpProtocol) -> Option<SdkTracerProvider> {
        let exporter = match protocol {
            OtlpProtocol::Http => opentelemetry_otlp::SpanExporter::builder().with_http().build(),
            OtlpProtocol::Grpc => opentelemetry_otlp::SpanExporter::builder().with_tonic().build(),
        };
        let exporter = exporter.ok()?;
        Some(
            SdkTracerProvider::builder()
                .with_sampler(Sampler::ParentBased(Box::new(Sampler::AlwaysOn)))
                .with_resource(self.resource())
                .with_batch_exporter(exporter)
                .build(),
        )
    }

    /// Installs the global subscriber.
    ///
    /// Returns a [`TelemetryGuard`] that flushes exported spans on drop.
    pub fn register(self) -> TelemetryGuard {
        let tracer_provider = otlp_protocol().and_then(|p| self.tracer_provider(p));
        let otel_layer = tracer_provider
            .as_ref()
            .map(|tp| OpenTelemetryLayer::new(tp.tracer("connect")));

        let fallback = self.log_level.as_deref().unwrap_or("info");
        tracing_subscriber::registry()
            .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
            .with(tracing_subscriber::fmt::layer())
            .with(otel_layer)
            .init();

        if tracer_provider.is_some() {
            tracing::info!("OTLP trace export enabled");
        } else {
            tracing::debug!("OTLP not configured, console logging only");
        }

        TelemetryGuard { tracer_provider }
    }
}

/// Owns the tracer provider; flushes and shuts it down on drop.
#[derive(Debug)]
pub struct TelemetryGuard {
    tracer_provider: Option<SdkTracerProvider>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(ref tp) = self.tracer_provider
            && let Err(err) = tp.shutdown()
        {
            tracing::error!(?err, "tracer provider shutdown error");
        }
    }
}

impl TelemetryGuard {
    /// Request tracing layer for the axum router.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn http_tracing(&self) -> HttpTraceLayer {
        TraceLayer::new_for_http()
            .make_span_with(HttpMakeSpan)
            .on_response(HttpOnResponse)
    }
}

/// Span per HTTP request.
#[derive(Clone, Copy, Debug)]
pub struct HttpMakeSpan;

impl<A> MakeSpan<A> for HttpMakeSpan {
    fn make_span(&mut self, request: &Request<A>) -> Span {
        tracing::info_span!(
            "http_request",
            otel.kind = "server",
            otel.name = %format!("{} {}", request.method(), request.uri().path()),
            method = %request.method(),
            path = %request.uri().path(),
            status = tracing::field::Empty,
        )
    }
}

/// Records status and latency on the request span.
#[derive(Clone, Copy, Debug)]
pub struct HttpOnResponse;

impl<A> OnResponse<A> for HttpOnResponse {
    fn on_response(self, response: &Response<A>, latency: Duration, span: &Span) {
        let status = response.status();
        span.record("status", status.as_u16());

        // Redirects after connect/disconnect are the normal outcome.
        if status.is_success() || status.is_redirection() {
            span.set_status(Status::Ok);
        } else {
            span.set_status(Status::error(
                status.canonical_reason().unwrap_or("unknown").to_owned(),
            ));
        }

        tracing::debug!(
            status = status.as_u16(),
            elapsed_ms = latency.as_millis(),
            "response"
        );
    }
}
