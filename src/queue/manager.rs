use crate::error::QueueError;
use crate::queue::conditions::*;
use crate::queue::execution::run_attempt;
use crate::queue::guard::ExecutionGuard;
use crate::queue::scheduler::*;
use crate::queue::store::*;
use crate::queue::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Condition-gated task queue.
///
/// Cloning is cheap; clones share the same conditions and tasks.
#[derive(Clone)]
pub struct ConditionQueue {
    inner: Arc<QueueInner>,
}

/// Configuration for a condition queue
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Conditions registered at construction, all initially `true`
    pub conditions: Vec<String>,
    pub rescan_policy: RescanPolicy,
    /// Timeout applied to tasks that do not set one; 0 disables it
    pub default_timeout_ms: u64,
}

pub(crate) struct QueueInner {
    pub(crate) conditions: RwLock<ConditionStore>,
    pub(crate) tasks: RwLock<TaskStore>,
    pub(crate) guard: ExecutionGuard,
    next_id: AtomicU64,
    config: QueueConfig,
}

/// Non-owning handle to a [`ConditionQueue`].
///
/// Task callbacks that need to reach back into their queue should capture one
/// of these: a strong clone stored in a strict task's callback keeps the queue
/// alive for as long as the task stays queued.
#[derive(Clone, Debug)]
pub struct WeakConditionQueue {
    inner: Weak<QueueInner>,
}

/// Live handle to a task created on a queue
#[derive(Clone)]
pub struct TaskHandle {
    entry: Arc<TaskEntry>,
    queue: Weak<QueueInner>,
}

impl ConditionQueue {
    /// Create a queue with the given conditions, all initially `true`
    pub fn new<I, S>(conditions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_config(QueueConfig {
            conditions: conditions.into_iter().map(Into::into).collect(),
            ..Default::default()
        })
    }

    pub fn with_config(config: QueueConfig) -> Self {
        let conditions = ConditionStore::new(config.conditions.iter().cloned());
        info!(
            "Created condition queue with {} conditions ({:?})",
            conditions.len(),
            config.rescan_policy
        );

        Self {
            inner: Arc::new(QueueInner {
                conditions: RwLock::new(conditions),
                tasks: RwLock::new(TaskStore::new()),
                guard: ExecutionGuard::new(),
                next_id: AtomicU64::new(0),
                config,
            }),
        }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.inner.config
    }

    /// Handle that does not keep the queue alive
    pub fn downgrade(&self) -> WeakConditionQueue {
        WeakConditionQueue {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Set a condition; setting one to `true` re-scans pending tasks according to
    /// the queue's [`RescanPolicy`], running every task that became eligible
    /// before returning.
    ///
    /// The re-scan runs on its own tokio task. Dropping this future (for example
    /// under `tokio::time::timeout`) stops the wait, not the pass.
    pub async fn set_condition(&self, name: &str, value: bool) -> Result<(), QueueError> {
        if let Some(pass) = self.spawn_set_condition(name, value).await?
            && let Err(join_error) = pass.await
        {
            warn!("Re-scan after setting {} did not finish: {}", name, join_error);
        }
        Ok(())
    }

    /// Set a condition and return as soon as the value is stored.
    ///
    /// When the set triggers a re-scan, the pass is started in the background and
    /// its handle returned; `None` means no re-scan was due under the
    /// queue's [`RescanPolicy`].
    pub async fn spawn_set_condition(
        &self,
        name: &str,
        value: bool,
    ) -> Result<Option<JoinHandle<ScanReport>>, QueueError> {
        let rescan = {
            let mut conditions = self.inner.conditions.write().await;
            conditions.set(name, value, self.inner.config.rescan_policy)?
        };

        Ok(rescan.then(|| self.spawn_rescan()))
    }

    /// Re-scan pending tasks without changing any condition
    pub async fn rescan(&self) -> ScanReport {
        match self.spawn_rescan().await {
            Ok(report) => report,
            Err(join_error) => {
                warn!("Re-scan did not finish: {}", join_error);
                ScanReport::default()
            }
        }
    }

    fn spawn_rescan(&self) -> JoinHandle<ScanReport> {
        let inner = self.inner.clone();
        tokio::spawn(async move { execute_all(&inner).await })
    }

    /// Queue a task and, if its conditions already hold, run it once before
    /// returning.
    ///
    /// A non-strict task that ran here is no longer queued when this returns.
    ///
    /// The in-flight check is keyed by task id. When `spec` replaces a task whose
    /// attempt is still running, the replacement is queued but not run here; the
    /// next re-scan after the old attempt settles picks it up.
    pub async fn create_task(&self, spec: TaskSpec) -> TaskHandle {
        let handle = self.register(spec).await;
        if self.is_eligible(&handle.entry).await {
            handle.run_initial().await;
        }
        handle
    }

    /// Like [`create_task`](Self::create_task), but the initial attempt runs on a
    /// background tokio task and this returns immediately.
    pub async fn spawn_task(&self, spec: TaskSpec) -> TaskHandle {
        let handle = self.register(spec).await;
        if self.is_eligible(&handle.entry).await {
            let background = handle.clone();
            tokio::spawn(async move {
                background.run_initial().await;
            });
        }
        handle
    }

    /// Whether every listed condition is registered and currently `true`.
    ///
    /// This is the rule re-scans use to pick tasks; an empty list holds.
    pub async fn check_conditions<S: AsRef<str>>(&self, keys: &[S]) -> bool {
        self.inner.conditions.read().await.all_satisfied(keys)
    }

    /// Remove the listed tasks, or all tasks when `ids` is empty.
    ///
    /// Attempts already in flight are not interrupted.
    pub async fn clear<S: AsRef<str>>(&self, ids: &[S]) -> usize {
        let removed = self.inner.tasks.write().await.remove(ids);
        debug!("Cleared {} tasks", removed);
        removed
    }

    pub async fn clear_all(&self) -> usize {
        self.clear::<&str>(&[]).await
    }

    pub async fn get_conditions(&self) -> BTreeMap<String, bool> {
        self.inner.conditions.read().await.snapshot()
    }

    pub async fn get_tasks(&self) -> Vec<TaskInfo> {
        let guard = &self.inner.guard;
        self.inner.tasks.read().await.list(|id| guard.is_guarded(id))
    }

    /// Handle to a queued task, e.g. to re-run it manually
    pub async fn get_task(&self, id: &str) -> Option<TaskHandle> {
        let entry = self.inner.tasks.read().await.get(id)?;
        Some(TaskHandle {
            entry,
            queue: Arc::downgrade(&self.inner),
        })
    }

    async fn register(&self, spec: TaskSpec) -> TaskHandle {
        let id = match spec.id.clone().filter(|id| !id.is_empty()) {
            Some(id) => id,
            None => self.inner.next_id.fetch_add(1, Ordering::Relaxed).to_string(),
        };

        let mut spec = spec;
        if spec.timeout.is_none() && self.inner.config.default_timeout_ms > 0 {
            spec.timeout = Some(Duration::from_millis(self.inner.config.default_timeout_ms));
        }

        {
            let conditions = self.inner.conditions.read().await;
            for key in spec.condition_keys.iter().filter(|key| !conditions.contains(key)) {
                warn!(
                    "Task {} depends on unknown condition {}; it will never become eligible",
                    id, key
                );
            }
        }

        let entry = Arc::new(TaskEntry::from_spec(id, spec));
        if let Some(replaced) = self.inner.tasks.write().await.insert(entry.clone()) {
            debug!("Task {} replaced an existing task with the same id", replaced.id);
        }
        debug!(
            "Queued task {} ({}) on {:?}",
            entry.id, entry.describe, entry.condition_keys
        );

        TaskHandle {
            entry,
            queue: Arc::downgrade(&self.inner),
        }
    }

    async fn is_eligible(&self, entry: &TaskEntry) -> bool {
        all_satisfied(entry, &*self.inner.conditions.read().await)
    }
}

impl std::fmt::Debug for ConditionQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditionQueue")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl TaskHandle {
    pub fn id(&self) -> &str {
        &self.entry.id
    }

    pub fn describe(&self) -> &str {
        &self.entry.describe
    }

    pub fn is_strict(&self) -> bool {
        self.entry.strict
    }

    pub fn condition_keys(&self) -> &[String] {
        &self.entry.condition_keys
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.entry.timeout
    }

    /// Replace the success callback.
    ///
    /// A callback that needs the queue should capture
    /// [`ConditionQueue::downgrade`] rather than a clone: the task owns its
    /// callbacks, so a strong clone kept by a strict task forms a cycle and the
    /// queue is never freed.
    pub async fn set_success<F, Fut>(&self, f: F)
    where
        F: Fn(TaskOutput) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.entry.callbacks.write().await.success = success_callback(f);
    }

    pub async fn set_fail<F, Fut>(&self, f: F)
    where
        F: Fn(TaskFailure) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.entry.callbacks.write().await.fail = fail_callback(f);
    }

    pub async fn set_complete<F, Fut>(&self, f: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.entry.callbacks.write().await.complete = complete_callback(f);
    }

    /// Run one attempt now, regardless of the task's conditions.
    ///
    /// A no-op while another attempt of this task is in flight, and once the task
    /// has left the queue (cleared, replaced, or retired after a non-strict run).
    pub async fn run(&self) -> AttemptOutcome {
        match self.queue.upgrade() {
            Some(inner) => run_attempt(inner, self.entry.clone()).await,
            None => AttemptOutcome::Skipped(SkipReason::QueueDropped),
        }
    }

    async fn run_initial(&self) {
        if self.run().await == AttemptOutcome::Skipped(SkipReason::AlreadyRunning) {
            debug!(
                "Task {} was queued while an attempt under the same id is in flight; \
                 it will run on a later re-scan",
                self.entry.id
            );
        }
    }

    /// Whether the task is still queued
    pub async fn is_queued(&self) -> bool {
        match self.queue.upgrade() {
            Some(inner) => inner.tasks.read().await.contains_entry(&self.entry),
            None => false,
        }
    }

    pub async fn is_running(&self) -> bool {
        match self.queue.upgrade() {
            Some(inner) => inner.guard.is_guarded(&self.entry.id),
            None => false,
        }
    }

    pub fn info(&self) -> TaskInfo {
        let running = self
            .queue
            .upgrade()
            .is_some_and(|inner| inner.guard.is_guarded(&self.entry.id));
        self.entry.info(running)
    }
}

impl WeakConditionQueue {
    /// The queue, if it has not been dropped
    pub fn upgrade(&self) -> Option<ConditionQueue> {
        self.inner.upgrade().map(|inner| ConditionQueue { inner })
    }
}

impl std::fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.entry.id)
            .field("describe", &self.entry.describe)
            .finish_non_exhaustive()
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            conditions: Vec::new(),
            rescan_policy: RescanPolicy::EveryTrueSet,
            default_timeout_ms: 0,
        }
    }
}

impl QueueConfig {
    /// Parse a config from TOML
    pub fn from_toml_str(content: &str) -> Result<Self, crate::error::ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> Result<String, crate::error::ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
