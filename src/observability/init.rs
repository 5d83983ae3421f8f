//! Subscriber installation.

use super::exporter::file_tracer_provider;
use super::rotating::RotatingFile;
use crate::Config;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_sdk::resource::Resource;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Service name recorded on the trace resource.
pub const SERVICE_NAME: &str = "tablesync";

/// File name of the active trace file inside the data directory.
pub const TRACE_FILE_NAME: &str = "tablesync-otlp.json";

/// Installs the global tracing subscriber.
///
/// The filter comes from `RUST_LOG` when set, otherwise from
/// `config.trace_level`, otherwise `"info"`. Spans are written to
/// [`TRACE_FILE_NAME`] under the data directory.
///
/// Tracing is optional: if the directory cannot be created or a subscriber
/// is already installed, this returns `false` and leaves things as they are.
///
/// ```no_run
/// use tablesync::observability::init_tracing;
/// use tablesync::Config;
///
/// let config = Config {
///     trace_level: Some("debug".to_string()),
///     ..Config::default()
/// };
/// init_tracing(&config);
/// tracing::debug!("tracing is now active");
/// ```
pub fn init_tracing(config: &Config) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(config.trace_level.as_deref().unwrap_or("info"))
    });

    let data_dir = crate::infrastructure::data_dir();
    if std::fs::create_dir_all(&data_dir).is_err() {
        return false;
    }

    let resource = Resource::new(vec![
        KeyValue::new("service.name", SERVICE_NAME),
        KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
    ]);
    let file = RotatingFile::new(
        data_dir.join(TRACE_FILE_NAME),
        config.trace_max_bytes,
        config.trace_backups,
    );
    let provider = file_tracer_provider(file, resource);
    let layer = OpenTelemetryLayer::new(provider.tracer(SERVICE_NAME));

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .is_ok()
}
