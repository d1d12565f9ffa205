use crate::queue::manager::QueueInner;
use crate::queue::types::*;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Run one attempt of `entry` and wait for it to settle.
///
/// The attempt itself runs on its own tokio task, so dropping the returned
/// future stops the wait but never the attempt: callbacks, retention and guard
/// release still happen.
pub(crate) async fn run_attempt(inner: Arc<QueueInner>, entry: Arc<TaskEntry>) -> AttemptOutcome {
    let id = entry.id.clone();
    match tokio::spawn(async move { attempt(&inner, &entry).await }).await {
        Ok(outcome) => outcome,
        Err(join_error) => {
            warn!("Attempt of task {} did not finish: {}", id, join_error);
            AttemptOutcome::Failed
        }
    }
}

/// One attempt of `entry`.
///
/// The attempt holds the execution guard for the task id from start to finish.
/// Exactly one of `success`/`fail` fires, followed by `complete`; a non-strict
/// task is retired from the store before the guard is released.
async fn attempt(inner: &QueueInner, entry: &Arc<TaskEntry>) -> AttemptOutcome {
    let Some(permit) = inner.guard.try_acquire(&entry.id) else {
        debug!("Task {} already has an attempt in flight, skipping", entry.id);
        return AttemptOutcome::Skipped(SkipReason::AlreadyRunning);
    };

    if !inner.tasks.read().await.contains_entry(entry) {
        debug!("Task {} is no longer queued, skipping", entry.id);
        return AttemptOutcome::Skipped(SkipReason::NotQueued);
    }

    debug!("Starting attempt of task {} ({})", entry.id, entry.describe);
    let settlement = settle(entry).await;

    // Slots are read now so reassignments made during the attempt take effect.
    let callbacks = entry.callbacks.read().await.clone();

    let outcome = match settlement {
        Ok(value) => {
            info!("Task {} succeeded", entry.id);
            invoke(&entry.id, "success", move || (callbacks.success)(value)).await;
            AttemptOutcome::Succeeded
        }
        Err(failure) => {
            let outcome = if failure.is_timeout() {
                AttemptOutcome::TimedOut
            } else {
                AttemptOutcome::Failed
            };
            warn!("Task {} failed: {}", entry.id, failure);
            invoke(&entry.id, "fail", move || (callbacks.fail)(failure)).await;
            outcome
        }
    };

    invoke(&entry.id, "complete", move || (callbacks.complete)()).await;

    if !entry.strict && inner.tasks.write().await.remove_entry(entry) {
        debug!("Retired non-strict task {}", entry.id);
    }

    drop(permit);
    outcome
}

/// Call the task function and wait for it, bounded by the task's timeout.
///
/// The function's future runs on its own tokio task. When the timer wins, the
/// join handle is dropped, which detaches the work: it keeps running but its
/// result is never observed.
async fn settle(entry: &TaskEntry) -> Result<TaskOutput, TaskFailure> {
    let future = catch_unwind(AssertUnwindSafe(|| (entry.func)()))
        .map_err(|payload| TaskFailure::Panicked(panic_message(payload.as_ref())))?;
    let handle = tokio::spawn(future);

    let joined = match entry.timeout {
        Some(limit) => match tokio::time::timeout(limit, handle).await {
            Ok(joined) => joined,
            Err(_) => {
                return Err(TaskFailure::Timeout {
                    id: entry.id.clone(),
                    describe: entry.describe.clone(),
                    timeout: limit,
                });
            }
        },
        None => handle.await,
    };

    match joined {
        Ok(result) => result.map_err(TaskFailure::Function),
        Err(join_error) if join_error.is_panic() => Err(TaskFailure::Panicked(panic_message(
            join_error.into_panic().as_ref(),
        ))),
        Err(join_error) => Err(TaskFailure::Function(anyhow::anyhow!(
            "task function was cancelled: {}",
            join_error
        ))),
    }
}

/// Run a callback, containing any panic it raises
async fn invoke<F>(id: &str, slot: &str, make: F)
where
    F: FnOnce() -> BoxFuture<'static, ()>,
{
    let future = match catch_unwind(AssertUnwindSafe(make)) {
        Ok(future) => future,
        Err(payload) => {
            warn!(
                "{} callback of task {} panicked: {}",
                slot,
                id,
                panic_message(payload.as_ref())
            );
            return;
        }
    };

    if let Err(payload) = AssertUnwindSafe(future).catch_unwind().await {
        warn!(
            "{} callback of task {} panicked: {}",
            slot,
            id,
            panic_message(payload.as_ref())
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
