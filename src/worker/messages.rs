//! Worker message types.
//!
//! Requests and responses cross the worker boundary as JSON. Every request
//! carries an optional [`TraceContext`] so spans created while serving it
//! join the trace of the table event that asked for it.

use crate::domain::{FetchError, Page};
use crate::query::QueryParams;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Trace and parent span ids of the sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceContext {
    /// OpenTelemetry trace id, 32 hex digits.
    pub trace_id: String,

    /// Sender's span id, 16 hex digits.
    pub parent_span_id: String,
}

impl TraceContext {
    /// Captures the context of the current span.
    ///
    /// Returns `None` when no OpenTelemetry layer is installed or the span
    /// context is invalid.
    #[must_use]
    pub fn from_current() -> Option<Self> {
        use opentelemetry::trace::TraceContextExt;
        use tracing_opentelemetry::OpenTelemetrySpanExt;

        let otel_context = tracing::Span::current().context();
        let span_ref = otel_context.span();
        let span_context = span_ref.span_context();

        if !span_context.is_valid() {
            tracing::trace!("no valid span context to propagate");
            return None;
        }

        let context = Self {
            trace_id: format!("{:032x}", span_context.trace_id()),
            parent_span_id: format!("{:016x}", span_context.span_id()),
        };
        tracing::trace!(trace_id = %context.trace_id, parent_span_id = %context.parent_span_id, "trace context captured");
        Some(context)
    }
}

/// Generates constructors that attach the current trace context.
macro_rules! worker_message_builders {
    (
        $(
            $builder_name:ident($variant:ident { $($field:ident: $ty:ty),* $(,)? })
        ),* $(,)?
    ) => {
        impl WorkerMessage {
            $(
                #[doc = concat!("Creates a `", stringify!($variant), "` message with the current trace context.")]
                #[must_use]
                pub fn $builder_name($($field: $ty),*) -> Self {
                    Self::$variant {
                        $($field,)*
                        trace_context: TraceContext::from_current(),
                    }
                }
            )*
        }
    };
}

worker_message_builders! {
    fetch_page(FetchPage { request_id: u64, params: QueryParams }),
    count_rows(CountRows {}),
}

/// Requests sent to the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerMessage {
    /// Serve one page for these request parameters.
    FetchPage {
        request_id: u64,
        params: QueryParams,

        #[serde(skip_serializing_if = "Option::is_none")]
        trace_context: Option<TraceContext>,
    },

    /// Report how many rows the source holds.
    CountRows {
        #[serde(skip_serializing_if = "Option::is_none")]
        trace_context: Option<TraceContext>,
    },
}

impl WorkerMessage {
    #[must_use]
    pub const fn trace_context(&self) -> Option<&TraceContext> {
        match self {
            Self::FetchPage { trace_context, .. } | Self::CountRows { trace_context } => trace_context.as_ref(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::FetchPage { .. } => "fetch_page",
            Self::CountRows { .. } => "count_rows",
        }
    }
}

/// Responses sent back from the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorkerResponse {
    PageLoaded {
        request_id: u64,
        page: Page<Value>,
    },

    RowCount {
        count: usize,
    },

    /// The request failed. `request_id` is absent when the message itself
    /// could not be read.
    Error {
        request_id: Option<u64>,
        error: FetchError,
    },
}
