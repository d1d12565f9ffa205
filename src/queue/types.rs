use futures::FutureExt;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Unique identifier for tasks
pub type TaskId = String;

/// Value produced by a task function on success
pub type TaskOutput = serde_json::Value;

/// Future returned by a task function
pub type TaskFuture = BoxFuture<'static, anyhow::Result<TaskOutput>>;

/// Zero-argument task function, invoked once per attempt
pub type TaskFn = Arc<dyn Fn() -> TaskFuture + Send + Sync>;

pub type SuccessCallback = Arc<dyn Fn(TaskOutput) -> BoxFuture<'static, ()> + Send + Sync>;
pub type FailCallback = Arc<dyn Fn(TaskFailure) -> BoxFuture<'static, ()> + Send + Sync>;
pub type CompleteCallback = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Why a task attempt did not succeed
#[derive(Debug, thiserror::Error)]
pub enum TaskFailure {
    /// The function did not settle before the task's timeout elapsed
    #[error("Task {id} ({describe}) timed out after {timeout:?}")]
    Timeout {
        id: TaskId,
        describe: String,
        timeout: Duration,
    },

    /// The function itself returned an error
    #[error("Task function failed: {0:#}")]
    Function(anyhow::Error),

    /// The function panicked
    #[error("Task function panicked: {0}")]
    Panicked(String),
}

impl TaskFailure {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TaskFailure::Timeout { .. })
    }
}

/// Lifecycle callbacks for a task.
///
/// Each slot is replaceable for the lifetime of the task; an attempt reads the
/// slots when it settles, not when it starts.
#[derive(Clone)]
pub struct TaskCallbacks {
    pub success: SuccessCallback,
    pub fail: FailCallback,
    pub complete: CompleteCallback,
}

impl Default for TaskCallbacks {
    fn default() -> Self {
        Self {
            success: Arc::new(|_: TaskOutput| async {}.boxed()),
            fail: Arc::new(|_: TaskFailure| async {}.boxed()),
            complete: Arc::new(|| async {}.boxed()),
        }
    }
}

impl std::fmt::Debug for TaskCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskCallbacks").finish_non_exhaustive()
    }
}

pub(crate) fn success_callback<F, Fut>(f: F) -> SuccessCallback
where
    F: Fn(TaskOutput) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |value: TaskOutput| f(value).boxed())
}

pub(crate) fn fail_callback<F, Fut>(f: F) -> FailCallback
where
    F: Fn(TaskFailure) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |failure: TaskFailure| f(failure).boxed())
}

pub(crate) fn complete_callback<F, Fut>(f: F) -> CompleteCallback
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move || f().boxed())
}

/// Description of a task to be created on a queue
pub struct TaskSpec {
    pub id: Option<TaskId>,
    pub describe: String,
    pub strict: bool,
    pub timeout: Option<Duration>,
    pub condition_keys: Vec<String>,
    pub func: TaskFn,
    pub callbacks: TaskCallbacks,
}

impl TaskSpec {
    /// Create a spec for `func`, gated on every condition in `condition_keys`
    pub fn new<K, S, F, Fut>(condition_keys: K, func: F) -> Self
    where
        K: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<TaskOutput>> + Send + 'static,
    {
        Self {
            id: None,
            describe: String::new(),
            strict: false,
            timeout: None,
            condition_keys: condition_keys.into_iter().map(Into::into).collect(),
            func: Arc::new(move || func().boxed()),
            callbacks: TaskCallbacks::default(),
        }
    }

    /// Use a caller-chosen id; an existing task with the same id is replaced
    pub fn with_id(mut self, id: impl Into<TaskId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_description(mut self, describe: impl Into<String>) -> Self {
        self.describe = describe.into();
        self
    }

    /// Keep the task queued after each attempt
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Fail attempts that have not settled after `timeout`; zero disables it
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_timeout_ms(self, timeout_ms: u64) -> Self {
        self.with_timeout(Duration::from_millis(timeout_ms))
    }

    pub fn on_success<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(TaskOutput) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.callbacks.success = success_callback(f);
        self
    }

    pub fn on_fail<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(TaskFailure) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.callbacks.fail = fail_callback(f);
        self
    }

    pub fn on_complete<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.callbacks.complete = complete_callback(f);
        self
    }
}

impl std::fmt::Debug for TaskSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskSpec")
            .field("id", &self.id)
            .field("describe", &self.describe)
            .field("strict", &self.strict)
            .field("timeout", &self.timeout)
            .field("condition_keys", &self.condition_keys)
            .finish_non_exhaustive()
    }
}

/// A task registered in the queue
pub struct TaskEntry {
    pub id: TaskId,
    pub describe: String,
    pub strict: bool,
    pub timeout: Option<Duration>,
    pub condition_keys: Vec<String>,
    pub(crate) func: TaskFn,
    pub(crate) callbacks: RwLock<TaskCallbacks>,
}

impl TaskEntry {
    /// Build an entry from a normalised spec.
    ///
    /// Condition keys are deduplicated keeping the first occurrence, and a zero
    /// timeout is treated as no timeout.
    pub(crate) fn from_spec(id: TaskId, spec: TaskSpec) -> Self {
        let mut condition_keys: Vec<String> = Vec::with_capacity(spec.condition_keys.len());
        for key in spec.condition_keys {
            if !condition_keys.contains(&key) {
                condition_keys.push(key);
            }
        }

        Self {
            id,
            describe: spec.describe,
            strict: spec.strict,
            timeout: spec.timeout.filter(|t| !t.is_zero()),
            condition_keys,
            func: spec.func,
            callbacks: RwLock::new(spec.callbacks),
        }
    }

    pub(crate) fn info(&self, running: bool) -> TaskInfo {
        TaskInfo {
            id: self.id.clone(),
            describe: self.describe.clone(),
            condition_keys: self.condition_keys.clone(),
            strict: self.strict,
            timeout_ms: self.timeout.map(|t| t.as_millis() as u64),
            running,
        }
    }
}

impl std::fmt::Debug for TaskEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskEntry")
            .field("id", &self.id)
            .field("describe", &self.describe)
            .field("strict", &self.strict)
            .field("timeout", &self.timeout)
            .field("condition_keys", &self.condition_keys)
            .finish_non_exhaustive()
    }
}

/// Read-only snapshot of a queued task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInfo {
    pub id: TaskId,
    pub describe: String,
    pub condition_keys: Vec<String>,
    pub strict: bool,
    pub timeout_ms: Option<u64>,
    /// An attempt under this id is in flight. The guard is keyed by id, so this
    /// is also `true` for a replacement queued while its predecessor still runs.
    pub running: bool,
}

/// Result of a single attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Succeeded,
    Failed,
    TimedOut,
    /// The attempt never started; no callbacks fired
    Skipped(SkipReason),
}

impl AttemptOutcome {
    pub fn ran(&self) -> bool {
        !matches!(self, AttemptOutcome::Skipped(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another attempt of the same task is still in flight
    AlreadyRunning,
    /// The task was removed (cleared, replaced, or retired after a non-strict run)
    NotQueued,
    /// The queue owning the task has been dropped
    QueueDropped,
}
