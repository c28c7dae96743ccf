//! Telemetry setup for OpenTelemetry integration

use tracing_subscriber::{Layer, Registry};

/// Boxed layer stacked directly on the registry
pub type TelemetryLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Build the OpenTelemetry layer if enabled
///
/// # Environment Variables
///
/// - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (e.g., http://localhost:4317)
/// - `OTEL_SERVICE_NAME`: Service name (default: qnd)
///
/// # Example
///
/// ```text
/// OTEL_EXPORTER_OTLP_ENDPOINT=http://localhost:4317 \
/// OTEL_SERVICE_NAME=qnd-staging \
///     ./qnd-daemon
/// ```
///
/// Returns `None` (with a message for the log) when telemetry is not configured.
pub fn layer() -> (Option<TelemetryLayer>, Option<String>) {
    let Ok(endpoint) = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") else {
        return (None, None);
    };

    #[cfg(feature = "telemetry")]
    {
        match otlp_layer(&endpoint) {
            Ok(layer) => (
                Some(layer),
                Some(format!("OpenTelemetry export to {}", endpoint)),
            ),
            Err(e) => (
                None,
                Some(format!("Failed to initialize OpenTelemetry: {}", e)),
            ),
        }
    }

    #[cfg(not(feature = "telemetry"))]
    {
        (
            None,
            Some(format!(
                "OTEL_EXPORTER_OTLP_ENDPOINT={} set but feature 'telemetry' not enabled \
                 (rebuild with: cargo build --features telemetry)",
                endpoint
            )),
        )
    }
}

#[cfg(feature = "telemetry")]
fn otlp_layer(endpoint: &str) -> anyhow::Result<TelemetryLayer> {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::Resource;

    let service_name = std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "qnd".to_string());

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    let provider = opentelemetry_sdk::trace::TracerProvider::builder()
        .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
        .with_resource(Resource::new(vec![KeyValue::new(
            "service.name",
            service_name.clone(),
        )]))
        .build();

    let tracer = provider.tracer(service_name);
    opentelemetry::global::set_tracer_provider(provider);

    Ok(Box::new(tracing_opentelemetry::layer().with_tracer(tracer)))
}
