//! JSON message bridge for page fetches.
//!
//! - `messages`: request/response types with trace context propagation
//! - `handler`: [`FetchWorker`], serving messages from a page source

pub mod handler;
pub mod messages;

pub use handler::{decode_response, FetchWorker};
pub use messages::{TraceContext, WorkerMessage, WorkerResponse};
