use opentelemetry::KeyValue;
use opentelemetry::global;
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    Resource, logs::SdkLoggerProvider, metrics::SdkMeterProvider, trace::SdkTracerProvider,
};
use std::time::Duration;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

const EXPORT_TIMEOUT: Duration = Duration::from_secs(10);

struct OtlpProviders {
    tracer_provider: SdkTracerProvider,
    logger_provider: SdkLoggerProvider,
    meter_provider: SdkMeterProvider,
}

/// Keeps the OTLP providers alive; call `shutdown` before the process exits
/// so batched spans, logs and metrics are flushed.
#[derive(Default)]
pub struct TelemetryGuard {
    providers: Option<OtlpProviders>,
}

impl TelemetryGuard {
    pub fn exports_otlp(&self) -> bool {
        self.providers.is_some()
    }

    pub fn shutdown(&self) {
        let Some(providers) = &self.providers else {
            return;
        };
        if let Err(e) = providers.tracer_provider.shutdown() {
            eprintln!("Error shutting down tracer provider: {e}");
        }
        if let Err(e) = providers.logger_provider.shutdown() {
            eprintln!("Error shutting down logger provider: {e}");
        }
        if let Err(e) = providers.meter_provider.shutdown() {
            eprintln!("Error shutting down meter provider: {e}");
        }
    }
}

fn build_otlp(config: &Config, endpoint: &str) -> anyhow::Result<OtlpProviders> {
    let resource = Resource::builder()
        .with_service_name(config.otel_service_name.clone())
        .with_attribute(KeyValue::new("service.version", env!("CARGO_PKG_VERSION")))
        .with_attribute(KeyValue::new(
            "deployment.environment",
            config.environment.clone(),
        ))
        .build();

    let trace_exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .with_timeout(EXPORT_TIMEOUT)
        .build()?;

    let tracer_provider = SdkTracerProvider::builder()
        .with_batch_exporter(trace_exporter)
        .with_resource(resource.clone())
        .build();

    global::set_tracer_provider(tracer_provider.clone());

    let log_exporter = opentelemetry_otlp::LogExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .with_timeout(EXPORT_TIMEOUT)
        .build()?;

    let logger_provider = SdkLoggerProvider::builder()
        .with_batch_exporter(log_exporter)
        .with_resource(resource.clone())
        .build();

    let metric_exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .with_timeout(EXPORT_TIMEOUT)
        .build()?;

    let meter_provider = SdkMeterProvider::builder()
        .with_periodic_exporter(metric_exporter)
        .with_resource(resource)
        .build();

    global::set_meter_provider(meter_provider.clone());

    Ok(OtlpProviders {
        tracer_provider,
        logger_provider,
        meter_provider,
    })
}

/// Installs the global tracing subscriber.
///
/// Console output is always on (JSON in production, pretty otherwise). OTLP
/// export of spans, logs and metrics is added only when
/// `OTEL_EXPORTER_OTLP_ENDPOINT` is configured. Must run inside a tokio
/// runtime when OTLP export is enabled, and before the first metric is
/// recorded.
pub fn init_telemetry(config: &Config) -> anyhow::Result<TelemetryGuard> {
    let providers = match config.otel_exporter_endpoint.as_deref() {
        Some(endpoint) => Some(build_otlp(config, endpoint)?),
        None => None,
    };

    let telemetry_layer = providers
        .as_ref()
        .map(|_| OpenTelemetryLayer::new(global::tracer(config.otel_service_name.clone())));
    let otel_log_layer = providers
        .as_ref()
        .map(|p| OpenTelemetryTracingBridge::new(&p.logger_provider));

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn"));

    let fmt_layer = if config.is_production() {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().pretty().boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(telemetry_layer)
        .with(otel_log_layer)
        .with(fmt_layer)
        .try_init()?;

    tracing::info!(
        service = %config.otel_service_name,
        endpoint = config.otel_exporter_endpoint.as_deref().unwrap_or("none"),
        "Telemetry initialized"
    );

    Ok(TelemetryGuard { providers })
}
