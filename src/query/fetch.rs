//! The async boundary between the query manager and whatever serves pages.

use super::manager::{FetchOutcome, FetchRequest};
use super::params::QueryParams;
use crate::domain::{FetchError, Page};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tracing::Instrument;

/// Serves one page for a set of request parameters.
///
/// Implementations own transport, timeouts and retries. A rejected future
/// becomes the query's error state.
pub trait Fetcher<T> {
    fn fetch(&self, params: &QueryParams) -> BoxFuture<'static, Result<Page<T>, FetchError>>;
}

impl<T, F> Fetcher<T> for F
where
    F: Fn(&QueryParams) -> BoxFuture<'static, Result<Page<T>, FetchError>>,
{
    fn fetch(&self, params: &QueryParams) -> BoxFuture<'static, Result<Page<T>, FetchError>> {
        self(params)
    }
}

/// Runs `request` through `fetcher`, tagging the result with the request id
/// so it can be handed back to the manager in any order.
pub fn dispatch<T, F>(fetcher: &F, request: &FetchRequest) -> BoxFuture<'static, FetchOutcome<T>>
where
    T: Send + 'static,
    F: Fetcher<T> + ?Sized,
{
    let request_id = request.id;
    let span = tracing::debug_span!("fetch", request_id, params = %request.params);
    fetcher
        .fetch(&request.params)
        .map(move |result| FetchOutcome { request_id, result })
        .instrument(span)
        .boxed()
}
