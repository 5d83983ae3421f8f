//! Local trace export.
//!
//! `tracing` spans emitted anywhere in the crate are bridged into
//! OpenTelemetry and written as OTLP/JSON lines to a size-rotated file in the
//! data directory:
//!
//! ```text
//! tracing → tracing-opentelemetry → FileSpanExporter → tablesync-otlp.json
//! ```
//!
//! Nothing is sent over the network. The active file rotates at
//! [`DEFAULT_MAX_BYTES`] by default, keeping [`DEFAULT_MAX_BACKUPS`] older
//! files; both are configurable through [`crate::Config`].

mod exporter;
mod init;
mod otlp;
mod rotating;

pub use exporter::{file_tracer_provider, FileSpanExporter};
pub use init::{init_tracing, SERVICE_NAME, TRACE_FILE_NAME};
pub use rotating::{RotatingFile, DEFAULT_MAX_BACKUPS, DEFAULT_MAX_BYTES};
