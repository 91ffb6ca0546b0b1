//! Bounded-concurrency request scheduling.
//!
//! [`RequestScheduler`] multiplexes outbound async work through a fixed
//! number of concurrency slots. Submissions queue FIFO and are admitted
//! head-first whenever a slot is free; completion order is unconstrained.
//! The scheduler never retries and never drops a submitted task — a failing
//! or slow task costs its caller, not the queue.
//!
//! Tasks run via `tokio::spawn`, so submission requires a running tokio
//! runtime.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::BoxFuture;
use tokio::sync::oneshot;
use tracing::trace;

/// A bounded-concurrency multiplexer for outbound async operations.
///
/// Cloning is cheap and shares the same queue and slots.
#[derive(Clone)]
pub struct RequestScheduler {
    inner: Arc<Inner>,
}

struct Inner {
    limit: usize,
    state: Mutex<State>,
}

/// Pending queue + in-flight counter. Admission's check-then-act sequence
/// runs under this one lock, so the in-flight count can never exceed the
/// limit. The lock is never held across an await point.
struct State {
    queue: VecDeque<BoxFuture<'static, ()>>,
    in_flight: usize,
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RequestScheduler {
    /// Create a scheduler with the given concurrency limit (clamped to ≥ 1).
    pub fn new(limit: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                limit: limit.max(1),
                state: Mutex::new(State {
                    queue: VecDeque::new(),
                    in_flight: 0,
                }),
            }),
        }
    }

    /// Create a scheduler sized by a planner config.
    pub fn from_plan(plan: &crate::planner::PlannerConfig) -> Self {
        Self::new(plan.max_concurrent_requests)
    }

    /// The concurrency limit.
    pub fn limit(&self) -> usize {
        self.inner.limit
    }

    /// Number of tasks currently holding a slot.
    pub fn in_flight(&self) -> usize {
        lock(&self.inner.state).in_flight
    }

    /// Number of tasks waiting for admission.
    pub fn queued(&self) -> usize {
        lock(&self.inner.state).queue.len()
    }

    /// Enqueue a task and return a future for its result.
    ///
    /// The task is appended to the FIFO queue immediately and admitted as
    /// soon as a slot is free. The returned future settles exactly once
    /// with the task's output; if the task itself produces a `Result`, its
    /// failure passes through untouched — the scheduler does not retry.
    /// The `Err` arm here covers only the result channel closing before
    /// delivery, which admission guarantees not to happen while any handle
    /// to the scheduler is alive.
    ///
    /// Dropping the returned future does not cancel the task; it still
    /// runs (and releases its slot) normally.
    pub fn submit<T, F>(&self, task: F) -> BoxFuture<'static, Result<T, String>>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel::<T>();
        let job: BoxFuture<'static, ()> = Box::pin(async move {
            let out = task.await;
            // The caller may have dropped its handle; the task still ran.
            let _ = tx.send(out);
        });
        {
            let mut state = lock(&self.inner.state);
            state.queue.push_back(job);
            trace!(
                queued = state.queue.len(),
                in_flight = state.in_flight,
                "task submitted"
            );
        }
        pump(&self.inner);
        Box::pin(async move {
            rx.await
                .map_err(|_| "scheduler dropped before task completion".to_string())
        })
    }
}

/// Admit queued tasks head-first while a slot is free.
fn pump(inner: &Arc<Inner>) {
    loop {
        let job = {
            let mut state = lock(&inner.state);
            if state.in_flight >= inner.limit {
                return;
            }
            let Some(job) = state.queue.pop_front() else {
                return;
            };
            state.in_flight += 1;
            job
        };
        let slot = SlotGuard {
            inner: Arc::clone(inner),
        };
        tokio::spawn(async move {
            let _slot = slot;
            job.await;
        });
    }
}

/// Releases a concurrency slot on drop, then re-attempts admission.
/// Drop-based so the slot is freed even if the task panics.
struct SlotGuard {
    inner: Arc<Inner>,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        {
            let mut state = lock(&self.inner.state);
            state.in_flight -= 1;
        }
        pump(&self.inner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn results_pass_through() {
        let scheduler = RequestScheduler::new(2);
        let ok = scheduler.submit(async { 41 + 1 }).await;
        assert_eq!(ok, Ok(42));

        let err: Result<Result<(), String>, String> = scheduler
            .submit(async { Err("upstream exploded".to_string()) })
            .await;
        assert_eq!(err, Ok(Err("upstream exploded".to_string())));
    }

    #[tokio::test]
    async fn concurrency_never_exceeds_limit() {
        let scheduler = RequestScheduler::new(2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for i in 0..8 {
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            handles.push(scheduler.submit(async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                running.fetch_sub(1, Ordering::SeqCst);
                i
            }));
        }

        let results = futures::future::join_all(handles).await;
        assert_eq!(results.len(), 8);
        for (i, r) in results.into_iter().enumerate() {
            assert_eq!(r, Ok(i));
        }
        assert!(peak.load(Ordering::SeqCst) <= 2, "peak exceeded limit");
    }

    #[tokio::test]
    async fn admission_is_fifo() {
        let scheduler = RequestScheduler::new(1);
        let order = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for i in 0..3 {
            let order = Arc::clone(&order);
            handles.push(scheduler.submit(async move {
                order.lock().unwrap().push(i);
                tokio::time::sleep(Duration::from_millis(5)).await;
            }));
        }
        futures::future::join_all(handles).await;

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn failure_releases_slot() {
        let scheduler = RequestScheduler::new(1);

        let first: Result<Result<(), String>, String> = scheduler
            .submit(async { Err("boom".to_string()) })
            .await;
        assert_eq!(first, Ok(Err("boom".to_string())));

        // The failed task must not hold its slot: the next task runs.
        let second = scheduler.submit(async { "ran" }).await;
        assert_eq!(second, Ok("ran"));

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(scheduler.in_flight(), 0);
        assert_eq!(scheduler.queued(), 0);
    }

    #[tokio::test]
    async fn dropped_handle_still_runs_task() {
        let scheduler = RequestScheduler::new(1);
        let ran = Arc::new(AtomicUsize::new(0));

        let ran2 = Arc::clone(&ran);
        drop(scheduler.submit(async move {
            ran2.fetch_add(1, Ordering::SeqCst);
        }));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn limit_clamped_to_one() {
        let scheduler = RequestScheduler::new(0);
        assert_eq!(scheduler.limit(), 1);
    }

    #[test]
    fn from_plan_uses_concurrency_limit() {
        let plan = crate::planner::plan(crate::capability::CapabilityTier::Medium);
        let scheduler = RequestScheduler::from_plan(&plan);
        assert_eq!(scheduler.limit(), 4);
    }
}
