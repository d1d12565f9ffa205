//! # Gated Queue
//!
//! A condition-gated async task queue. Named boolean conditions guard deferred
//! tasks: a task runs once every condition it depends on holds, and setting a
//! condition to `true` re-scans the queue for tasks that became eligible.
//!
//! ## Architecture Overview
//!
//! - **[`queue::conditions`]**: registered conditions and the re-scan policy
//! - **[`queue::store`]**: pending tasks in insertion order, eligibility check
//! - **[`queue::guard`]**: per-task re-entrancy guard
//! - **[`queue::scheduler`]**: sequential re-scan passes
//! - **[`queue::execution`]**: one attempt, with timeout race, callbacks and retention
//! - **[`queue::manager`]**: the [`ConditionQueue`] façade and [`TaskHandle`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gated_queue::{ConditionQueue, TaskSpec};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let queue = ConditionQueue::new(["login"]);
//!     queue.set_condition("login", false).await?;
//!
//!     let task = queue
//!         .create_task(
//!             TaskSpec::new(["login"], || async {
//!                 Ok::<_, anyhow::Error>(serde_json::json!("profile loaded"))
//!             })
//!             .with_description("load profile")
//!             .on_success(|value| async move { println!("{}", value) }),
//!         )
//!         .await;
//!     assert_eq!(queue.get_tasks().await.len(), 1);
//!
//!     // Runs the task, then drops it from the queue
//!     queue.set_condition("login", true).await?;
//!     assert!(!task.is_queued().await);
//!     Ok(())
//! }
//! ```

/// Condition-gated task queue.
///
/// Condition tracking, task storage, the execution guard, re-scan scheduling
/// and single-attempt execution.
pub mod queue;

/// Error types returned by queue and configuration operations.
pub mod error;

/// Environment constants and path utilities.
pub mod env;

// CLI module for the demo runner
pub mod cli;

pub use error::{ConfigError, QueueError};
pub use queue::{
    AttemptOutcome, ConditionQueue, QueueConfig, RescanPolicy, ScanReport, SkipReason,
    TaskFailure, TaskHandle, TaskId, TaskInfo, TaskOutput, TaskSpec, WeakConditionQueue,
};
