//! Cancellable delayed tasks.
//!
//! The fetch controller never sleeps itself. It hands the next attempt to a
//! [`Scheduler`] and keeps the returned [`ScheduledTask`] so a refresh or a
//! dispose can cancel it. Production code uses [`TokioScheduler`]; tests use
//! [`ManualScheduler`] and decide when a delay has "elapsed".

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::task::AbortHandle;

pub trait Scheduler: Send + Sync {
    /// Run `task` once `delay` has passed, unless cancelled first.
    fn schedule(&self, delay: Duration, task: BoxFuture<'static, ()>) -> ScheduledTask;
}

impl<S: Scheduler + ?Sized> Scheduler for Arc<S> {
    fn schedule(&self, delay: Duration, task: BoxFuture<'static, ()>) -> ScheduledTask {
        (**self).schedule(delay, task)
    }
}

/// Handle to a scheduled task. Dropping it does not cancel the task.
#[derive(Debug)]
pub struct ScheduledTask {
    cancelled: Arc<AtomicBool>,
    abort: Option<AbortHandle>,
}

impl ScheduledTask {
    fn new(cancelled: Arc<AtomicBool>, abort: Option<AbortHandle>) -> Self {
        Self { cancelled, abort }
    }

    /// A task whose body has not started will never run. One that is already
    /// running is aborted at its next await point when the scheduler supports
    /// it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Some(abort) = &self.abort {
            abort.abort();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Spawns each task on the current tokio runtime behind a `sleep`.
#[derive(Debug, Clone, Default)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: BoxFuture<'static, ()>) -> ScheduledTask {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !flag.load(Ordering::SeqCst) {
                task.await;
            }
        });
        ScheduledTask::new(cancelled, Some(handle.abort_handle()))
    }
}

struct Queued {
    delay: Duration,
    cancelled: Arc<AtomicBool>,
    task: BoxFuture<'static, ()>,
}

/// Holds tasks until the test fires them. Delays are recorded, not waited.
#[derive(Default)]
pub struct ManualScheduler {
    queue: Mutex<VecDeque<Queued>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued tasks that have not been cancelled.
    pub fn pending(&self) -> usize {
        self.lock()
            .iter()
            .filter(|q| !q.cancelled.load(Ordering::SeqCst))
            .count()
    }

    /// Delays of the queued, uncancelled tasks in scheduling order.
    pub fn pending_delays(&self) -> Vec<Duration> {
        self.lock()
            .iter()
            .filter(|q| !q.cancelled.load(Ordering::SeqCst))
            .map(|q| q.delay)
            .collect()
    }

    /// Run the oldest uncancelled task to completion. Cancelled tasks ahead
    /// of it are discarded. Returns `false` if nothing was left to run.
    pub async fn fire_next(&self) -> bool {
        loop {
            let next = self.lock().pop_front();
            match next {
                None => return false,
                Some(q) if q.cancelled.load(Ordering::SeqCst) => continue,
                Some(q) => {
                    q.task.await;
                    return true;
                }
            }
        }
    }

    /// Fire tasks until the queue is empty, including ones scheduled by the
    /// tasks themselves. Returns how many ran.
    pub async fn fire_all(&self) -> usize {
        let mut fired = 0;
        while self.fire_next().await {
            fired += 1;
        }
        fired
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Queued>> {
        self.queue.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: BoxFuture<'static, ()>) -> ScheduledTask {
        let cancelled = Arc::new(AtomicBool::new(false));
        self.lock().push_back(Queued {
            delay,
            cancelled: Arc::clone(&cancelled),
            task,
        });
        ScheduledTask::new(cancelled, None)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use futures::FutureExt;

    use super::*;

    fn counting_task(counter: &Arc<AtomicUsize>) -> BoxFuture<'static, ()> {
        let counter = Arc::clone(counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
        .boxed()
    }

    #[tokio::test]
    async fn manual_scheduler_runs_on_fire() {
        let scheduler = ManualScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));

        scheduler.schedule(Duration::from_millis(2000), counting_task(&counter));
        assert_eq!(scheduler.pending(), 1);
        assert_eq!(scheduler.pending_delays(), vec![Duration::from_millis(2000)]);
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        assert!(scheduler.fire_next().await);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(!scheduler.fire_next().await);
    }

    #[tokio::test]
    async fn manual_scheduler_skips_cancelled() {
        let scheduler = ManualScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let first = scheduler.schedule(Duration::ZERO, counting_task(&counter));
        scheduler.schedule(Duration::ZERO, counting_task(&counter));
        first.cancel();

        assert!(first.is_cancelled());
        assert_eq!(scheduler.pending(), 1);
        assert_eq!(scheduler.fire_all().await, 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_scheduler_waits_for_delay() {
        let counter = Arc::new(AtomicUsize::new(0));
        TokioScheduler.schedule(Duration::from_secs(2), counting_task(&counter));

        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        tokio::task::yield_now().await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_scheduler_cancel_prevents_run() {
        let counter = Arc::new(AtomicUsize::new(0));
        let task = TokioScheduler.schedule(Duration::from_secs(2), counting_task(&counter));
        task.cancel();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
