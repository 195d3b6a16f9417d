//! Telemetry initialization and configuration

use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable, one event per line.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Subscriber settings.
///
/// `default_level` is only used when `RUST_LOG` is unset.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub default_level: String,
    pub format: LogFormat,
    /// OTLP collector endpoint (e.g. `http://localhost:4317`). Spans are
    /// exported in addition to console output when set.
    pub otlp_endpoint: Option<String>,
}

impl TelemetryConfig {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            default_level: "info".to_string(),
            format: LogFormat::Pretty,
            otlp_endpoint: None,
        }
    }

    #[must_use]
    pub fn with_default_level(mut self, level: impl Into<String>) -> Self {
        self.default_level = level.into();
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_otlp_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.otlp_endpoint = Some(endpoint.into());
        self
    }
}

/// Initialize basic telemetry with console logging
///
/// # Example
/// ```
/// use bookreel_telemetry::init_telemetry;
/// init_telemetry("bookreel").expect("Failed to initialize telemetry");
/// ```
pub fn init_telemetry(service_name: &str) -> Result<(), Box<dyn std::error::Error>> {
    init_with_config(&TelemetryConfig::new(service_name))
}

/// Initialize telemetry from a [`TelemetryConfig`].
///
/// Only the first successful call installs a subscriber. Later calls are no-ops.
pub fn init_with_config(config: &TelemetryConfig) -> Result<(), Box<dyn std::error::Error>> {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    let result = install(config);
    if result.is_err() {
        INITIALIZED.store(false, Ordering::SeqCst);
    }
    result
}

fn env_filter(default_level: &str) -> Result<EnvFilter, Box<dyn std::error::Error>> {
    Ok(EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?)
}

fn install(config: &TelemetryConfig) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(endpoint) = &config.otlp_endpoint {
        return install_with_otlp(config, endpoint);
    }

    let filter = env_filter(&config.default_level)?;
    match config.format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_line_number(true),
            )
            .try_init()?,
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init()?,
    }

    tracing::info!(service.name = %config.service_name, "Telemetry initialized");
    Ok(())
}

fn install_with_otlp(
    config: &TelemetryConfig,
    endpoint: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    use opentelemetry_otlp::WithExportConfig;
    use tracing_opentelemetry::OpenTelemetryLayer;

    let tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(opentelemetry_otlp::new_exporter().tonic().with_endpoint(endpoint))
        .with_trace_config(opentelemetry_sdk::trace::config().with_resource(
            opentelemetry_sdk::Resource::new(vec![opentelemetry::KeyValue::new(
                "service.name",
                config.service_name.clone(),
            )]),
        ))
        .install_batch(opentelemetry_sdk::runtime::Tokio)?;

    tracing_subscriber::registry()
        .with(env_filter(&config.default_level)?)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .with(OpenTelemetryLayer::new(tracer))
        .try_init()?;

    tracing::info!(
        service.name = %config.service_name,
        otlp.endpoint = endpoint,
        "Telemetry initialized with OpenTelemetry"
    );
    Ok(())
}

/// Flush pending spans before exit.
pub fn shutdown_telemetry() {
    opentelemetry::global::shutdown_tracer_provider();
}
