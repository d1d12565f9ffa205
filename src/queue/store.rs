use crate::queue::conditions::ConditionStore;
use crate::queue::types::*;
use std::sync::Arc;

/// Pending tasks in insertion order
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: Vec<Arc<TaskEntry>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `entry`, replacing any task that already uses its id.
    ///
    /// A replacement is not kept in its predecessor's position: the new entry
    /// always goes to the tail.
    pub fn insert(&mut self, entry: Arc<TaskEntry>) -> Option<Arc<TaskEntry>> {
        let replaced = self
            .tasks
            .iter()
            .position(|task| task.id == entry.id)
            .map(|index| self.tasks.remove(index));
        self.tasks.push(entry);
        replaced
    }

    /// Remove the listed ids, or every task when `ids` is empty.
    /// Returns how many tasks were removed.
    pub fn remove<S: AsRef<str>>(&mut self, ids: &[S]) -> usize {
        let before = self.tasks.len();
        if ids.is_empty() {
            self.tasks.clear();
        } else {
            self.tasks
                .retain(|task| !ids.iter().any(|id| id.as_ref() == task.id));
        }
        before - self.tasks.len()
    }

    /// Remove this exact entry; a newer task that reused its id is left alone
    pub fn remove_entry(&mut self, entry: &Arc<TaskEntry>) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| !Arc::ptr_eq(task, entry));
        before != self.tasks.len()
    }

    pub fn get(&self, id: &str) -> Option<Arc<TaskEntry>> {
        self.tasks.iter().find(|task| task.id == id).cloned()
    }

    pub fn contains_entry(&self, entry: &Arc<TaskEntry>) -> bool {
        self.tasks.iter().any(|task| Arc::ptr_eq(task, entry))
    }

    /// Cheap copy of the current order, safe to walk while tasks retire themselves
    pub fn snapshot(&self) -> Vec<Arc<TaskEntry>> {
        self.tasks.clone()
    }

    pub fn list(&self, is_running: impl Fn(&str) -> bool) -> Vec<TaskInfo> {
        self.tasks
            .iter()
            .map(|task| task.info(is_running(&task.id)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Whether every condition the task depends on currently holds
pub fn all_satisfied(task: &TaskEntry, conditions: &ConditionStore) -> bool {
    conditions.all_satisfied(task.condition_keys.as_slice())
}
