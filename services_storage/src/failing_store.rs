//! # Failing Store
//!
//! A KeyValueStore wrapper that can simulate failures for testing save paths.
//! Useful for exercising quota and unavailability handling without a real
//! full disk.

use std::collections::BTreeMap;

use crate::store::{KeyValueStore, StorageError, StorageResult};

/// Policy for when failures should occur
#[derive(Debug, Clone)]
pub enum FailurePolicy {
    /// Never fail (passthrough)
    Never,
    /// Fail every write
    Always,
    /// Fail after N writes
    AfterWrites(usize),
    /// Fail writes to specific keys
    OnKeys(Vec<String>),
    /// Fail after N writes to specific keys
    AfterWritesToKeys { count: usize, keys: Vec<String> },
}

/// Wrapper around a KeyValueStore that can simulate failures
pub struct FailingStore<S: KeyValueStore> {
    inner: S,
    policy: FailurePolicy,
    write_count: usize,
    key_write_counts: BTreeMap<String, usize>,
}

impl<S: KeyValueStore> FailingStore<S> {
    pub fn new(inner: S, policy: FailurePolicy) -> Self {
        Self {
            inner,
            policy,
            write_count: 0,
            key_write_counts: BTreeMap::new(),
        }
    }

    fn should_fail(&self, key: &str) -> bool {
        match &self.policy {
            FailurePolicy::Never => false,
            FailurePolicy::Always => true,
            FailurePolicy::AfterWrites(n) => self.write_count >= *n,
            FailurePolicy::OnKeys(keys) => keys.iter().any(|k| k == key),
            FailurePolicy::AfterWritesToKeys { count, keys } => {
                keys.iter().any(|k| k == key)
                    && self.key_write_counts.get(key).copied().unwrap_or(0) >= *count
            }
        }
    }

    /// Get the underlying store (for inspection)
    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Number of writes that reached the inner store
    pub fn write_count(&self) -> usize {
        self.write_count
    }

    /// Replace the failure policy and reset counters
    pub fn set_policy(&mut self, policy: FailurePolicy) {
        self.policy = policy;
        self.write_count = 0;
        self.key_write_counts.clear();
    }
}

impl<S: KeyValueStore> KeyValueStore for FailingStore<S> {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: &[u8]) -> StorageResult<()> {
        if self.should_fail(key) {
            return Err(StorageError::Full);
        }
        self.inner.set(key, value)?;
        self.write_count += 1;
        *self.key_write_counts.entry(key.to_string()).or_insert(0) += 1;
        Ok(())
    }

    fn delete(&mut self, key: &str) -> StorageResult<()> {
        if matches!(self.policy, FailurePolicy::Always) {
            return Err(StorageError::Unavailable("simulated failure".into()));
        }
        self.inner.delete(key)
    }
}
