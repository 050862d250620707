//! Debounced, sequence-guarded fetch slot.
//!
//! A [`DebouncedFetcher`] owns at most one pending task. Each
//! [`DebouncedFetcher::request`] takes the next sequence number, aborts the
//! previous task (whether it is still waiting out the debounce or already
//! in flight) and schedules a new one. A response is written to the
//! published [`FetchState`] only if its sequence number is still the latest
//! when it lands; the check and the write happen under one lock, so a
//! superseded response can never overwrite a newer one.
//!
//! Locks are always taken `pending` first, then the ledger.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::BackendError;
use crate::state::FetchState;

/// Boxed future returned by a [`FetchFn`].
pub type FetchFuture<T> = BoxFuture<'static, Result<T, BackendError>>;

/// The network call behind a fetch slot.
pub type FetchFn<P, T> = Arc<dyn Fn(P) -> FetchFuture<T> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceConfig {
    /// Quiet period before the call fires. Zero fires on the next poll.
    pub debounce: Duration,
    /// Upper bound on a single call; expiry is reported as an error.
    pub timeout: Duration,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            timeout: Duration::from_secs(12),
        }
    }
}

#[derive(Debug, Default)]
struct Ledger {
    latest: u64,
    closed: bool,
}

impl Ledger {
    fn is_current(&self, seq: u64) -> bool {
        !self.closed && self.latest == seq
    }
}

struct Shared<T> {
    label: String,
    ledger: Mutex<Ledger>,
    fired: AtomicU64,
    state: watch::Sender<FetchState<T>>,
}

impl<T> Shared<T> {
    fn new(label: String) -> Self {
        let (state, _) = watch::channel(FetchState::default());
        Self {
            label,
            ledger: Mutex::new(Ledger::default()),
            fired: AtomicU64::new(0),
            state,
        }
    }

    /// Marks the slot as loading if `seq` is still the latest request.
    fn begin(&self, seq: u64) -> bool {
        let ledger = lock(&self.ledger);
        if !ledger.is_current(seq) {
            return false;
        }
        self.fired.fetch_add(1, Ordering::SeqCst);
        self.state.send_modify(FetchState::begin_loading);
        tracing::debug!(fetcher = %self.label, seq, "fetch fired");
        true
    }

    /// Applies `outcome` if `seq` is still the latest request.
    fn apply(&self, seq: u64, outcome: Result<T, BackendError>) -> bool {
        let ledger = lock(&self.ledger);
        if !ledger.is_current(seq) {
            tracing::debug!(fetcher = %self.label, seq, latest = ledger.latest, "discarding stale response");
            return false;
        }
        match outcome {
            Ok(data) => self.state.send_modify(|s| s.succeed(data)),
            Err(err) => {
                tracing::warn!(fetcher = %self.label, seq, error = %err, "fetch failed");
                let message = format!("{}: {err}", self.label);
                self.state.send_modify(|s| s.fail(message));
            }
        }
        true
    }
}

/// One debounced fetch slot publishing a [`FetchState<T>`].
///
/// All methods that schedule work must be called from within a tokio
/// runtime. Dropping the fetcher tears it down like [`DebouncedFetcher::shutdown`].
pub struct DebouncedFetcher<P, T> {
    shared: Arc<Shared<T>>,
    fetch: FetchFn<P, T>,
    config: DebounceConfig,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl<P, T> DebouncedFetcher<P, T>
where
    P: Send + 'static,
    T: Send + Sync + 'static,
{
    pub fn new(label: impl Into<String>, config: DebounceConfig, fetch: FetchFn<P, T>) -> Self {
        Self {
            shared: Arc::new(Shared::new(label.into())),
            fetch,
            config,
            pending: Mutex::new(None),
        }
    }

    /// Schedules a fetch for `params`, superseding any earlier request.
    ///
    /// Returns immediately. Ignored after [`DebouncedFetcher::shutdown`].
    pub fn request(&self, params: P) {
        // Held until the new task is stored, so a concurrent caller with a
        // lower sequence number cannot abort a newer task.
        let mut pending = lock(&self.pending);
        let seq = {
            let mut ledger = lock(&self.shared.ledger);
            if ledger.closed {
                tracing::debug!(fetcher = %self.shared.label, "request after shutdown ignored");
                return;
            }
            ledger.latest += 1;
            ledger.latest
        };

        let shared = Arc::clone(&self.shared);
        let fetch = Arc::clone(&self.fetch);
        let config = self.config;
        let task = tokio::spawn(async move {
            if !config.debounce.is_zero() {
                tokio::time::sleep(config.debounce).await;
            }
            if !shared.begin(seq) {
                return;
            }
            let outcome = match tokio::time::timeout(config.timeout, fetch(params)).await {
                Ok(result) => result,
                Err(_) => Err(BackendError::Timeout {
                    after_ms: u64::try_from(config.timeout.as_millis()).unwrap_or(u64::MAX),
                }),
            };
            shared.apply(seq, outcome);
        });

        if let Some(previous) = pending.replace(task) {
            previous.abort();
        }
    }

    /// Drops any pending or in-flight request and returns the slot to idle
    /// with no data.
    pub fn clear(&self) {
        let mut pending = lock(&self.pending);
        {
            let mut ledger = lock(&self.shared.ledger);
            ledger.latest += 1;
            self.shared.state.send_modify(FetchState::reset);
        }
        abort(&mut pending);
    }

    /// Supersedes anything pending and publishes `err` right away, for
    /// requests rejected before they reach the network.
    pub fn fail_now(&self, err: BackendError) {
        let mut pending = lock(&self.pending);
        let seq = {
            let mut ledger = lock(&self.shared.ledger);
            if ledger.closed {
                return;
            }
            ledger.latest += 1;
            ledger.latest
        };
        abort(&mut pending);
        self.shared.apply(seq, Err(err));
    }

    /// Tears the slot down: the pending timer is cancelled, an in-flight
    /// call is aborted, and no further state update is published.
    pub fn shutdown(&self) {
        let mut pending = lock(&self.pending);
        {
            let mut ledger = lock(&self.shared.ledger);
            ledger.closed = true;
            ledger.latest += 1;
        }
        abort(&mut pending);
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FetchState<T>> {
        self.shared.state.subscribe()
    }

    /// Number of calls that actually fired (got past the debounce).
    #[must_use]
    pub fn fired_count(&self) -> u64 {
        self.shared.fired.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.shared.label
    }
}

impl<P, T> DebouncedFetcher<P, T>
where
    P: Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    /// Snapshot of the published state.
    #[must_use]
    pub fn state(&self) -> FetchState<T> {
        self.shared.state.borrow().clone()
    }
}

impl<P, T> Drop for DebouncedFetcher<P, T> {
    fn drop(&mut self) {
        let mut pending = lock(&self.pending);
        lock(&self.shared.ledger).closed = true;
        abort(&mut pending);
    }
}

fn abort(pending: &mut Option<JoinHandle<()>>) {
    if let Some(task) = pending.take() {
        task.abort();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[path = "fetcher_test.rs"]
mod tests;
