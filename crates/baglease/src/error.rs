use thiserror::Error;

/// Unified error type for applications embedding baglease.
///
/// Arbitration itself never fails; these come from setting things up.
#[derive(Error, Debug)]
pub enum BagLeaseError {
    /// A resource key could not be built.
    #[error("Invalid key: {0}")]
    Key(#[from] baglease_core::KeyError),

    /// Configuration rejected.
    #[error("Config error: {0}")]
    Config(#[from] baglease_lease::ConfigError),

    /// Metric collectors could not be created or registered.
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// The OTLP trace pipeline could not be installed.
    #[error("Trace export error: {0}")]
    Trace(#[from] opentelemetry::trace::TraceError),

    /// A global tracing subscriber is already installed.
    #[error("Subscriber error: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}
