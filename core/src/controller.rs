//! Retrying fetch controller for the client list.
//!
//! # States
//! ```text
//! Idle ──load()──▶ Loading ──ok──────────────────────────▶ Success
//!                    │  ▲
//!    retryable error,│  │delay elapses
//!    retries remain  ▼  │
//!                 RetryWaiting
//!
//! Loading ──retryable error, retries exhausted──▶ Failed
//! Loading ──any other error─────────────────────▶ Failed
//! Success / Failed ──load()──▶ Loading
//! ```
//!
//! # Concurrency
//! Every `load()` starts a new chain with a fresh generation number. Attempts
//! carry the generation they belong to and their completion is dropped if
//! the controller has moved on: a second `load()`, or `dispose()`. The pending
//! retry of a superseded chain is cancelled through its [`ScheduledTask`].
//! State lives behind a mutex that is never held across an await.
//!
//! A scheduled retry only holds a weak reference to the controller. Dropping
//! the last handle cancels the pending retry, the same as `dispose()`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::directory::ClientDirectory;
use crate::error::ApiError;
use crate::scheduler::{ScheduledTask, Scheduler};
use crate::search::filter_by_name;
use crate::types::ClientRecord;

pub const RETRIES_EXHAUSTED_MESSAGE: &str = "Failed to load clients after multiple attempts. \
     Please check your network connection or try again later.";

pub const LOAD_FAILED_MESSAGE: &str = "Failed to load clients. Please try again.";

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub retry_delay: Duration,
    /// Which failures are worth another attempt.
    pub retryable: fn(&ApiError) -> bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            retryable: ApiError::is_connectivity,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            max_retries,
            retry_delay,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPhase {
    #[default]
    Idle,
    Loading,
    RetryWaiting,
    Success,
    Failed,
}

/// What the view renders.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FetchState {
    pub phase: FetchPhase,
    pub records: Vec<ClientRecord>,
    /// True from `load()` until the chain ends, including retry waits.
    pub is_loading: bool,
    pub error: Option<String>,
    pub retry_count: u32,
}

impl FetchState {
    /// The error banner text, with retry progress while a retry is pending.
    pub fn status_line(&self, max_retries: u32) -> Option<String> {
        let error = self.error.as_deref()?;
        if self.phase == FetchPhase::RetryWaiting {
            return Some(format!(
                "{error} Retrying ({}/{max_retries})...",
                self.retry_count
            ));
        }
        Some(error.to_string())
    }
}

struct Inner {
    state: FetchState,
    generation: u64,
    pending: Option<ScheduledTask>,
    disposed: bool,
}

struct Shared<D, S> {
    directory: D,
    scheduler: S,
    policy: RetryPolicy,
    inner: Mutex<Inner>,
    updates: watch::Sender<FetchState>,
    requests: AtomicU64,
}

/// Loads the client list with bounded, classified retry.
///
/// Cloning is cheap and every clone drives the same state.
pub struct FetchController<D, S> {
    shared: Arc<Shared<D, S>>,
}

impl<D, S> Drop for Shared<D, S> {
    fn drop(&mut self) {
        let inner = self.inner.get_mut().unwrap_or_else(|p| p.into_inner());
        if let Some(task) = inner.pending.take() {
            task.cancel();
            debug!("fetch controller dropped, pending retry cancelled");
        }
    }
}

impl<D, S> Clone for FetchController<D, S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<D, S> FetchController<D, S>
where
    D: ClientDirectory + 'static,
    S: Scheduler + 'static,
{
    pub fn new(directory: D, scheduler: S, policy: RetryPolicy) -> Self {
        let (updates, _) = watch::channel(FetchState::default());
        Self {
            shared: Arc::new(Shared {
                directory,
                scheduler,
                policy,
                inner: Mutex::new(Inner {
                    state: FetchState::default(),
                    generation: 0,
                    pending: None,
                    disposed: false,
                }),
                updates,
                requests: AtomicU64::new(0),
            }),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.shared.policy
    }

    pub fn state(&self) -> FetchState {
        self.lock().state.clone()
    }

    /// Receives every published state change.
    pub fn subscribe(&self) -> watch::Receiver<FetchState> {
        self.shared.updates.subscribe()
    }

    /// Total requests sent to the directory over the controller's life.
    pub fn requests_issued(&self) -> u64 {
        self.shared.requests.load(Ordering::SeqCst)
    }

    pub fn is_disposed(&self) -> bool {
        self.lock().disposed
    }

    /// Start a fresh load chain and run its first attempt.
    ///
    /// Returns when the first attempt completes; later retries run on the
    /// scheduler. A chain already in flight is superseded: its pending retry
    /// is cancelled and its outstanding completion will be ignored.
    pub async fn load(&self) {
        let generation = {
            let mut inner = self.lock();
            if inner.disposed {
                debug!("load ignored, controller disposed");
                return;
            }
            if let Some(task) = inner.pending.take() {
                task.cancel();
            }
            inner.generation += 1;
            inner.state.retry_count = 0;
            inner.generation
        };
        self.attempt(generation).await;
    }

    /// Filter the held records by name. Network state is untouched.
    pub fn search(&self, term: &str) -> Vec<ClientRecord> {
        filter_by_name(&self.lock().state.records, term)
    }

    /// Stop for good: cancel any pending retry and ignore every completion
    /// still in flight. State is left as it was.
    pub fn dispose(&self) {
        let mut inner = self.lock();
        if inner.disposed {
            return;
        }
        inner.disposed = true;
        inner.generation += 1;
        if let Some(task) = inner.pending.take() {
            task.cancel();
        }
        debug!("fetch controller disposed");
    }

    fn attempt(&self, generation: u64) -> BoxFuture<'static, ()> {
        let this = self.clone();
        async move {
            if !this.begin_attempt(generation) {
                return;
            }
            this.shared.requests.fetch_add(1, Ordering::SeqCst);
            let outcome = this.shared.directory.fetch_clients().await;
            this.finish_attempt(generation, outcome);
        }
        .boxed()
    }

    /// The attempt a retry timer runs. It does nothing once every controller
    /// handle is gone.
    fn retry(&self, generation: u64) -> BoxFuture<'static, ()> {
        let weak: Weak<Shared<D, S>> = Arc::downgrade(&self.shared);
        async move {
            let Some(shared) = weak.upgrade() else {
                debug!(generation, "retry skipped, controller dropped");
                return;
            };
            FetchController { shared }.attempt(generation).await;
        }
        .boxed()
    }

    fn begin_attempt(&self, generation: u64) -> bool {
        let mut inner = self.lock();
        if inner.disposed || inner.generation != generation {
            debug!(generation, "attempt skipped, chain superseded");
            return false;
        }
        inner.state.phase = FetchPhase::Loading;
        inner.state.is_loading = true;
        inner.state.error = None;
        debug!(generation, retry_count = inner.state.retry_count, "requesting client list");
        self.publish(&inner.state);
        true
    }

    fn finish_attempt(&self, generation: u64, outcome: Result<Vec<ClientRecord>, ApiError>) {
        let mut inner = self.lock();
        if inner.disposed || inner.generation != generation {
            debug!(generation, "completion discarded, chain superseded");
            return;
        }
        let policy = self.shared.policy;

        match outcome {
            Ok(records) => {
                info!(count = records.len(), "client list loaded");
                inner.pending = None;
                inner.state = FetchState {
                    phase: FetchPhase::Success,
                    records,
                    is_loading: false,
                    error: None,
                    retry_count: 0,
                };
            }
            Err(err) if (policy.retryable)(&err) && inner.state.retry_count < policy.max_retries => {
                inner.state.retry_count += 1;
                warn!(
                    error = %err,
                    retry = inner.state.retry_count,
                    max_retries = policy.max_retries,
                    delay_ms = policy.retry_delay.as_millis() as u64,
                    "client list unreachable, retrying"
                );
                inner.state.phase = FetchPhase::RetryWaiting;
                inner.state.is_loading = true;
                inner.state.error = Some(err.user_message(LOAD_FAILED_MESSAGE));
                let next = self.retry(generation);
                inner.pending = Some(self.shared.scheduler.schedule(policy.retry_delay, next));
            }
            Err(err) if (policy.retryable)(&err) => {
                error!(error = %err, attempts = inner.state.retry_count + 1, "giving up on client list");
                inner.pending = None;
                inner.state.phase = FetchPhase::Failed;
                inner.state.is_loading = false;
                inner.state.error = Some(RETRIES_EXHAUSTED_MESSAGE.to_string());
            }
            Err(err) => {
                error!(status = err.status(), error = %err, "client list request rejected");
                inner.pending = None;
                inner.state.phase = FetchPhase::Failed;
                inner.state.is_loading = false;
                inner.state.error = Some(err.user_message(LOAD_FAILED_MESSAGE));
            }
        }
        self.publish(&inner.state);
    }

    fn publish(&self, state: &FetchState) {
        self.shared.updates.send_replace(state.clone());
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.shared.inner.lock().unwrap_or_else(|p| p.into_inner())
    }
}
