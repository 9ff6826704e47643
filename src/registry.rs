//! Flag registry
//!
//! An explicit registry object that independently-initialized components
//! register named options against, without a central list. One `Mutex`
//! serializes registration, resolution, and notification bookkeeping; the
//! whole registry state is a single critical section, so no two mutations
//! interleave.
//!
//! Option names are case-insensitive: they are lower-cased at registration
//! and used in folded form everywhere (argv long option, config-file key,
//! remote-store key).

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::{debug, warn};

use crate::cell::{FlagHandle, TypedSlot};
use crate::error::RegistryError;
use crate::notify::NotifyQueue;
use crate::provenance::ResolutionReport;
use crate::scope::ScopeSet;
use crate::value::{FlagKind, FlagValue};

/// Canonical flag for an option name, recorded on first registration.
/// Later registrations of the same name reuse it; their usage text is
/// ignored, as is their default for the canonical entry.
pub(crate) struct CanonicalFlag {
    pub(crate) kind: FlagKind,
    pub(crate) usage: String,
}

pub(crate) struct NameEntry {
    pub(crate) canonical: CanonicalFlag,
    pub(crate) scopes: ScopeSet,
}

pub(crate) struct RegistryState {
    pub(crate) names: BTreeMap<String, NameEntry>,
    pub(crate) resolved: bool,
    pub(crate) report: Option<ResolutionReport>,
    pub(crate) queue: NotifyQueue,
}

/// Process-wide configuration registry.
///
/// Lifecycle: construct, register from any number of threads, resolve once,
/// read handles for the rest of the process. Tests may construct as many
/// independent registries as they like.
pub struct FlagRegistry {
    state: Mutex<RegistryState>,
}

impl FlagRegistry {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RegistryState {
                names: BTreeMap::new(),
                resolved: false,
                report: None,
                queue: NotifyQueue::default(),
            }),
        }
    }

    /// Register an option under a name and a caller-supplied scope key.
    ///
    /// The first registration of a name fixes its kind and usage text.
    /// Registering the same name under a different kind is rejected.
    /// Registering the same (name, scope) pair twice displaces the earlier
    /// slot — a caller contract violation that is warned, not checked.
    pub fn register<T: FlagValue>(
        &self,
        name: &str,
        scope: &str,
        default: T,
        usage: &str,
    ) -> Result<FlagHandle<T>, RegistryError> {
        let folded = name.to_lowercase();
        let mut state = self.lock();

        if state.resolved {
            warn!(
                "option '{}' registered after resolution; its slot keeps the default",
                folded
            );
        }

        let entry = match state.names.entry(folded.clone()) {
            Entry::Occupied(occupied) => {
                let entry = occupied.into_mut();
                if entry.canonical.kind != T::KIND {
                    return Err(RegistryError::KindMismatch {
                        name: folded,
                        registered: entry.canonical.kind,
                        requested: T::KIND,
                    });
                }
                entry
            }
            Entry::Vacant(vacant) => {
                debug!("canonical flag '{}' registered ({})", folded, T::KIND);
                vacant.insert(NameEntry {
                    canonical: CanonicalFlag {
                        kind: T::KIND,
                        usage: usage.to_string(),
                    },
                    scopes: ScopeSet::new(),
                })
            }
        };

        let (slot, handle) = TypedSlot::new(default);
        if entry.scopes.insert(scope, Arc::new(slot)) {
            warn!(
                "scope '{}' re-registered option '{}'; previous slot detached",
                scope, folded
            );
        }

        Ok(handle)
    }

    /// Register a text option
    pub fn register_text(
        &self,
        name: &str,
        scope: &str,
        default: impl Into<String>,
        usage: &str,
    ) -> Result<FlagHandle<String>, RegistryError> {
        self.register(name, scope, default.into(), usage)
    }

    /// Register a boolean option
    pub fn register_bool(
        &self,
        name: &str,
        scope: &str,
        default: bool,
        usage: &str,
    ) -> Result<FlagHandle<bool>, RegistryError> {
        self.register(name, scope, default, usage)
    }

    /// Register a duration option (humantime syntax, e.g. "30s", "2m30s")
    pub fn register_duration(
        &self,
        name: &str,
        scope: &str,
        default: Duration,
        usage: &str,
    ) -> Result<FlagHandle<Duration>, RegistryError> {
        self.register(name, scope, default, usage)
    }

    /// Register a 64-bit floating-point option
    pub fn register_f64(
        &self,
        name: &str,
        scope: &str,
        default: f64,
        usage: &str,
    ) -> Result<FlagHandle<f64>, RegistryError> {
        self.register(name, scope, default, usage)
    }

    /// Register an integer option
    pub fn register_int(
        &self,
        name: &str,
        scope: &str,
        default: i32,
        usage: &str,
    ) -> Result<FlagHandle<i32>, RegistryError> {
        self.register(name, scope, default, usage)
    }

    /// Register a 64-bit integer option
    pub fn register_int64(
        &self,
        name: &str,
        scope: &str,
        default: i64,
        usage: &str,
    ) -> Result<FlagHandle<i64>, RegistryError> {
        self.register(name, scope, default, usage)
    }

    /// Whether resolution has completed
    pub fn resolved(&self) -> bool {
        self.lock().resolved
    }

    /// All registered option names (folded form)
    pub fn option_names(&self) -> Vec<String> {
        self.lock().names.keys().cloned().collect()
    }

    /// Number of scopes registered under a name
    pub fn scope_count(&self, name: &str) -> Option<usize> {
        let state = self.lock();
        state
            .names
            .get(&name.to_lowercase())
            .map(|entry| entry.scopes.len())
    }

    /// Run a callback once resolution completes.
    ///
    /// If resolution already happened the callback is dispatched
    /// immediately on a detached thread; otherwise it is queued. Callbacks
    /// are fire-and-forget: unordered, never awaited by the resolver, no
    /// error propagation.
    pub fn on_resolved<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = self.lock();
        if state.resolved {
            state.queue.dispatch_now(Box::new(callback));
        } else {
            state.queue.enqueue(Box::new(callback));
        }
    }

    /// Wait for every dispatched notification callback to finish.
    ///
    /// Handles are taken while holding the lock but joined outside it;
    /// callbacks may call back into the registry.
    pub fn join_notifications(&self) {
        let handles = {
            let mut state = self.lock();
            state.queue.take_handles()
        };
        for handle in handles {
            let _ = handle.join();
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, RegistryState> {
        // A poisoned lock still guards structurally sound state.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for FlagRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_holds_default_before_resolve() {
        let registry = FlagRegistry::new();
        let workers = registry
            .register_int("workers", "pool", 4, "worker pool size")
            .unwrap();

        assert_eq!(workers.get(), 4);
        assert!(!registry.resolved());
    }

    #[test]
    fn test_case_folded_names_share_entry() {
        let registry = FlagRegistry::new();
        registry
            .register_int("Workers", "pool", 4, "worker pool size")
            .unwrap();
        registry
            .register_int("workers", "scheduler", 2, "worker pool size")
            .unwrap();
        registry
            .register_int("WORKERS", "reporter", 8, "worker pool size")
            .unwrap();

        assert_eq!(registry.option_names(), vec!["workers".to_string()]);
        assert_eq!(registry.scope_count("Workers"), Some(3));
    }

    #[test]
    fn test_kind_mismatch_rejected() {
        let registry = FlagRegistry::new();
        registry
            .register_int("workers", "pool", 4, "worker pool size")
            .unwrap();

        let err = registry
            .register_text("workers", "reporter", "four", "worker pool size")
            .unwrap_err();
        assert!(matches!(err, RegistryError::KindMismatch { .. }));
        assert!(err.to_string().contains("int"));
        assert!(err.to_string().contains("text"));
    }

    #[test]
    fn test_duplicate_scope_displaces_slot() {
        let registry = FlagRegistry::new();
        registry
            .register_int("workers", "pool", 4, "worker pool size")
            .unwrap();
        registry
            .register_int("workers", "pool", 7, "worker pool size")
            .unwrap();

        assert_eq!(registry.scope_count("workers"), Some(1));
    }

    #[test]
    fn test_registration_is_monotonic() {
        let registry = FlagRegistry::new();
        for i in 0..10 {
            registry
                .register_int("workers", &format!("scope-{}", i), i, "worker pool size")
                .unwrap();
        }
        assert_eq!(registry.scope_count("workers"), Some(10));
    }
}
