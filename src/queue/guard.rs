use crate::queue::types::TaskId;
use dashmap::DashSet;
use std::sync::Arc;

/// Ids of tasks with an attempt in flight
#[derive(Debug, Clone, Default)]
pub struct ExecutionGuard {
    in_flight: Arc<DashSet<TaskId>>,
}

/// Proof that an attempt holds the guard for one task id.
///
/// Dropping the permit releases the guard, so it is released on every exit path
/// of an attempt, including unwinding.
#[derive(Debug)]
#[must_use = "the guard is released as soon as the permit is dropped"]
pub struct GuardPermit {
    guard: ExecutionGuard,
    id: TaskId,
}

impl ExecutionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `id` as running; `None` if it already is
    pub fn try_acquire(&self, id: &str) -> Option<GuardPermit> {
        if self.in_flight.insert(id.to_string()) {
            Some(GuardPermit {
                guard: self.clone(),
                id: id.to_string(),
            })
        } else {
            None
        }
    }

    pub fn release(&self, id: &str) {
        self.in_flight.remove(id);
    }

    pub fn is_guarded(&self, id: &str) -> bool {
        self.in_flight.contains(id)
    }

    pub fn len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }
}

impl GuardPermit {
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for GuardPermit {
    fn drop(&mut self) {
        self.guard.release(&self.id);
    }
}
