use crate::error::QueueError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// When setting a condition should trigger a re-scan of pending tasks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RescanPolicy {
    /// Every set to `true` re-scans, even if the condition already held
    #[default]
    EveryTrueSet,
    /// Only a `false -> true` transition re-scans
    OnTransition,
}

/// Current value of every registered condition
#[derive(Debug, Clone, Default)]
pub struct ConditionStore {
    values: BTreeMap<String, bool>,
}

impl ConditionStore {
    /// Register every name with an initial value of `true`
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut store = Self::default();
        for name in names {
            store.register(name);
        }
        store
    }

    pub(crate) fn register(&mut self, name: impl Into<String>) {
        self.values.entry(name.into()).or_insert(true);
    }

    /// Current value; an unregistered name never counts as satisfied
    pub fn get(&self, name: &str) -> bool {
        self.values.get(name).copied().unwrap_or(false)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Store `value` for `name` and report whether pending tasks should be re-scanned
    pub fn set(
        &mut self,
        name: &str,
        value: bool,
        policy: RescanPolicy,
    ) -> Result<bool, QueueError> {
        let slot = self
            .values
            .get_mut(name)
            .ok_or_else(|| QueueError::UnknownCondition(name.to_string()))?;

        let previous = std::mem::replace(slot, value);
        debug!("Condition {} set: {} -> {}", name, previous, value);

        Ok(match policy {
            RescanPolicy::EveryTrueSet => value,
            RescanPolicy::OnTransition => value && !previous,
        })
    }

    /// Whether every key is registered and currently `true`; an empty list holds
    pub fn all_satisfied<S: AsRef<str>>(&self, keys: &[S]) -> bool {
        keys.iter().all(|key| self.get(key.as_ref()))
    }

    pub fn snapshot(&self) -> BTreeMap<String, bool> {
        self.values.clone()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
