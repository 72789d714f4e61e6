//! Bounded concurrent fan-out of per-pet requests.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::remote::{RemoteError, RemoteResult};

/// Default cap on concurrent requests in one fan-out.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 8;

/// Limits applied to every fan-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Maximum number of requests in flight at once (at least 1)
    pub max_in_flight: usize,
    /// Per-request timeout, `None` to wait indefinitely
    pub request_timeout: Option<Duration>,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            request_timeout: None,
        }
    }
}

impl FetchPolicy {
    pub fn new(max_in_flight: usize, request_timeout: Option<Duration>) -> Self {
        Self {
            max_in_flight: max_in_flight.max(1),
            request_timeout,
        }
    }
}

/// Run `fetch` for every item concurrently, at most `policy.max_in_flight`
/// at a time, and return the results in input order.
///
/// The first failure aborts the remaining requests. Cancelling `cancel`
/// abandons everything still in flight and yields [`RemoteError::Cancelled`].
pub async fn fan_out<I, T, F, Fut>(
    items: Vec<I>,
    policy: &FetchPolicy,
    cancel: &CancellationToken,
    fetch: F,
) -> RemoteResult<Vec<T>>
where
    I: Send + 'static,
    T: Send + 'static,
    F: Fn(I) -> Fut,
    Fut: Future<Output = RemoteResult<T>> + Send + 'static,
{
    if cancel.is_cancelled() {
        return Err(RemoteError::Cancelled);
    }

    let total = items.len();
    let permits = Arc::new(Semaphore::new(policy.max_in_flight.max(1)));
    let mut tasks = JoinSet::new();

    for (index, item) in items.into_iter().enumerate() {
        let request = fetch(item);
        let permits = Arc::clone(&permits);
        let cancel = cancel.clone();
        let timeout = policy.request_timeout;

        tasks.spawn(async move {
            let result = tokio::select! {
                _ = cancel.cancelled() => Err(RemoteError::Cancelled),
                result = run_bounded(permits, request, timeout) => result,
            };
            (index, result)
        });
    }

    let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(total).collect();
    while let Some(joined) = tasks.join_next().await {
        let (index, result) = joined.map_err(|e| {
            if e.is_cancelled() {
                RemoteError::Cancelled
            } else {
                RemoteError::Network(format!("request task failed: {e}"))
            }
        })?;
        match result {
            Ok(value) => slots[index] = Some(value),
            Err(e) => {
                if !matches!(e, RemoteError::Cancelled) {
                    warn!(error = %e, "fan-out request failed, abandoning the rest");
                }
                tasks.abort_all();
                return Err(e);
            }
        }
    }

    debug!(count = total, "fan-out complete");
    slots
        .into_iter()
        .map(|slot| slot.ok_or(RemoteError::Cancelled))
        .collect()
}

async fn run_bounded<T, Fut>(
    permits: Arc<Semaphore>,
    request: Fut,
    timeout: Option<Duration>,
) -> RemoteResult<T>
where
    Fut: Future<Output = RemoteResult<T>>,
{
    let _permit = permits
        .acquire_owned()
        .await
        .map_err(|_| RemoteError::Cancelled)?;
    match timeout {
        Some(limit) => tokio::time::timeout(limit, request)
            .await
            .map_err(|_| RemoteError::Timeout)?,
        None => request.await,
    }
}
