//! Worker that serves page requests from a [`PageSource`].
//!
//! [`FetchWorker::on_message`] is the JSON bridge: it decodes a
//! [`WorkerMessage`], serves it and encodes the [`WorkerResponse`]. The same
//! worker also implements [`Fetcher`] so it can be plugged straight into the
//! query layer in-process.

use crate::domain::{FetchError, Page};
use crate::query::{Fetcher, QueryOptions, QueryParams};
use crate::source::{PageQuery, PageSource};
use crate::worker::{WorkerMessage, WorkerResponse};
use futures_util::future::{self, BoxFuture};
use futures_util::FutureExt;
use serde_json::Value;

/// Serves [`WorkerMessage`]s from a page source.
#[derive(Debug)]
pub struct FetchWorker<S> {
    source: S,
    options: QueryOptions,
}

impl<S: PageSource> FetchWorker<S> {
    /// Creates a worker reading request parameters named per `options`.
    #[must_use]
    pub const fn new(source: S, options: QueryOptions) -> Self {
        Self { source, options }
    }

    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Parses `params` and asks the source for the page.
    fn serve(&self, params: &QueryParams) -> Result<Page<Value>, FetchError> {
        let query = PageQuery::from_params(params, &self.options)?;
        Ok(self.source.page(&query)?)
    }

    /// Attaches the sender's trace context, if the message carries one.
    ///
    /// The returned guard must be held while the message is served.
    fn attach_parent_trace_context(message: &WorkerMessage) -> Option<opentelemetry::ContextGuard> {
        use opentelemetry::trace::{SpanContext, SpanId, TraceContextExt, TraceFlags, TraceId, TraceState};

        let trace_context = message.trace_context()?;
        let trace_id = TraceId::from_hex(&trace_context.trace_id).ok()?;
        let span_id = SpanId::from_hex(&trace_context.parent_span_id).ok()?;

        let span_context = SpanContext::new(trace_id, span_id, TraceFlags::SAMPLED, true, TraceState::default());
        Some(
            opentelemetry::Context::current()
                .with_remote_span_context(span_context)
                .attach(),
        )
    }

    /// Serves one message.
    pub fn handle_message(&self, message: WorkerMessage) -> WorkerResponse {
        let _context_guard = Self::attach_parent_trace_context(&message);
        let _span = tracing::debug_span!("worker_handle_message", message_type = message.kind()).entered();

        match message {
            WorkerMessage::FetchPage { request_id, params, .. } => match self.serve(&params) {
                Ok(page) => {
                    tracing::debug!(request_id, total = page.total_count, "page loaded");
                    WorkerResponse::PageLoaded { request_id, page }
                }
                Err(error) => {
                    tracing::debug!(request_id, %error, "page request failed");
                    WorkerResponse::Error {
                        request_id: Some(request_id),
                        error,
                    }
                }
            },
            WorkerMessage::CountRows { .. } => WorkerResponse::RowCount {
                count: self.source.len(),
            },
        }
    }

    /// Decodes a JSON message, serves it and encodes the response.
    ///
    /// A payload that does not decode is answered with an error response
    /// rather than dropped, so the caller never waits forever.
    #[must_use]
    pub fn on_message(&self, payload: &str) -> String {
        let response = match serde_json::from_str::<WorkerMessage>(payload) {
            Ok(message) => self.handle_message(message),
            Err(e) => {
                tracing::debug!(error = %e, "failed to deserialize worker message");
                WorkerResponse::Error {
                    request_id: None,
                    error: FetchError::Parse(format!("unreadable worker message: {e}")),
                }
            }
        };

        serde_json::to_string(&response).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "failed to serialize worker response");
            unserializable_response(&e.to_string())
        })
    }
}

/// Error reply used when a response cannot be encoded.
fn unserializable_response(reason: &str) -> String {
    serde_json::json!({
        "Error": {
            "request_id": null,
            "error": { "parse": format!("unserializable worker response: {reason}") },
        }
    })
    .to_string()
}

impl<S: PageSource> Fetcher<Value> for FetchWorker<S> {
    fn fetch(&self, params: &QueryParams) -> BoxFuture<'static, Result<Page<Value>, FetchError>> {
        future::ready(self.serve(params)).boxed()
    }
}

/// Decodes a worker's JSON response.
///
/// # Errors
///
/// Returns [`FetchError::Parse`] if `payload` is not a [`WorkerResponse`].
pub fn decode_response(payload: &str) -> Result<WorkerResponse, FetchError> {
    serde_json::from_str(payload).map_err(|e| FetchError::Parse(e.to_string()))
}
