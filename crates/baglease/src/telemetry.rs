use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::BagLeaseError;

/// Configuration for the telemetry subsystem.
#[derive(Debug)]
pub struct TelemetryConfig {
    service_name: String,
    otlp_endpoint: Option<String>,
    log_level: String,
    export_spans: bool,
}

impl TelemetryConfig {
    /// Creates a new configuration builder with default settings.
    pub fn builder() -> TelemetryConfigBuilder {
        TelemetryConfigBuilder::default()
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Installs the global subscriber: `RUST_LOG` (or the configured level)
    /// filtering a console layer, plus an OTLP span exporter when enabled.
    ///
    /// Span export needs a running tokio runtime.
    pub fn init(self) -> Result<(), BagLeaseError> {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.log_level));
        let console = tracing_subscriber::fmt::layer().with_target(true);

        let otel = if self.export_spans {
            opentelemetry::global::set_text_map_propagator(TraceContextPropagator::new());

            let mut exporter = opentelemetry_otlp::new_exporter().tonic();
            if let Some(endpoint) = self.otlp_endpoint {
                exporter = exporter.with_endpoint(endpoint);
            }

            let tracer = opentelemetry_otlp::new_pipeline()
                .tracing()
                .with_exporter(exporter)
                .with_trace_config(opentelemetry_sdk::trace::config().with_resource(
                    opentelemetry_sdk::Resource::new(vec![opentelemetry::KeyValue::new(
                        "service.name",
                        self.service_name,
                    )]),
                ))
                .install_batch(opentelemetry_sdk::runtime::Tokio)?;

            Some(tracing_opentelemetry::layer().with_tracer(tracer))
        } else {
            None
        };

        tracing_subscriber::registry()
            .with(filter)
            .with(console)
            .with(otel)
            .try_init()?;

        Ok(())
    }
}

/// Builder for `TelemetryConfig`.
#[derive(Default)]
pub struct TelemetryConfigBuilder {
    service_name: Option<String>,
    otlp_endpoint: Option<String>,
    log_level: Option<String>,
    export_spans: Option<bool>,
}

impl TelemetryConfigBuilder {
    /// Sets the service name reported with exported spans.
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Sets the OTLP endpoint URL. Implies span export.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.otlp_endpoint = Some(endpoint.into());
        self.export_spans.get_or_insert(true);
        self
    }

    /// Sets the log level used when `RUST_LOG` is unset (default: "info").
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    /// Exports spans over OTLP/gRPC (default: only with an endpoint).
    pub fn export_spans(mut self, enabled: bool) -> Self {
        self.export_spans = Some(enabled);
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> TelemetryConfig {
        TelemetryConfig {
            service_name: self
                .service_name
                .unwrap_or_else(|| "baglease".to_string()),
            otlp_endpoint: self.otlp_endpoint,
            log_level: self.log_level.unwrap_or_else(|| "info".to_string()),
            export_spans: self.export_spans.unwrap_or(false),
        }
    }
}

/// Shuts down the telemetry subsystem, flushing pending spans.
pub fn shutdown_tracing() {
    opentelemetry::global::shutdown_tracer_provider();
}
