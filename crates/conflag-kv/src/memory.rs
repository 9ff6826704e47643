//! In-memory key-value store with failure injection
//!
//! Test double for a remote configuration store. Supports per-key failure
//! injection and artificial delay so error and latency paths can be
//! exercised without a live backend.

use std::collections::HashMap;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use crate::{KvError, KvStore};

/// Failure configuration for a key
#[derive(Debug, Clone, Default)]
pub struct FailureConfig {
    /// Error message to return (if any)
    pub error_message: Option<String>,
    /// Delay to add before responding
    pub delay: Option<Duration>,
    /// Number of times to fail before succeeding (None = always fail)
    pub fail_count: Option<u32>,
}

impl FailureConfig {
    /// Create a config that returns a backend error
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error_message: Some(message.into()),
            delay: None,
            fail_count: None,
        }
    }

    /// Create a config that just adds delay
    pub fn delay(duration: Duration) -> Self {
        Self {
            error_message: None,
            delay: Some(duration),
            fail_count: None,
        }
    }

    /// Set the number of times to fail before succeeding
    pub fn with_fail_count(mut self, count: u32) -> Self {
        self.fail_count = Some(count);
        self
    }
}

struct Inner {
    values: HashMap<String, String>,
    failures: HashMap<String, FailureConfig>,
    unavailable: bool,
}

/// In-memory mock store
pub struct MemoryKv {
    inner: Mutex<Inner>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                values: HashMap::new(),
                failures: HashMap::new(),
                unavailable: false,
            }),
        }
    }

    /// Store a value under a key
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        let mut inner = self.lock();
        inner.values.insert(key.into(), value.into());
    }

    /// Remove a key
    pub fn remove(&self, key: &str) {
        let mut inner = self.lock();
        inner.values.remove(key);
    }

    /// Configure failure injection for a key
    pub fn fail_key(&self, key: impl Into<String>, config: FailureConfig) {
        let mut inner = self.lock();
        inner.failures.insert(key.into(), config);
    }

    /// Simulate the whole store being unreachable
    pub fn set_unavailable(&self, unavailable: bool) {
        let mut inner = self.lock();
        inner.unavailable = unavailable;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MemoryKv {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStore for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let delay = {
            let inner = self.lock();
            inner.failures.get(key).and_then(|f| f.delay)
        };
        if let Some(delay) = delay {
            thread::sleep(delay);
        }

        let mut inner = self.lock();
        if inner.unavailable {
            return Err(KvError::ConnectionFailed("store unavailable".to_string()));
        }

        let mut clear = false;
        if let Some(config) = inner.failures.get_mut(key) {
            if let Some(message) = config.error_message.clone() {
                match config.fail_count {
                    Some(0) => clear = true,
                    Some(ref mut n) => {
                        *n -= 1;
                        return Err(KvError::Backend(message));
                    }
                    None => return Err(KvError::Backend(message)),
                }
            }
        }
        if clear {
            inner.failures.remove(key);
        }

        Ok(inner.values.get(key).cloned())
    }
}
