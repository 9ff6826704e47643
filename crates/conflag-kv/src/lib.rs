//! Remote key-value client seam for conflag
//!
//! Abstracts the remote configuration store for testability. Provides:
//! - KvStore trait: interface for single-key lookups
//! - MemoryKv: in-process store for unit tests, with failure injection
//!
//! A production backend (etcd, Consul, ...) implements `KvStore` in its own
//! crate; the resolver only ever issues one synchronous `get` per name.

mod memory;

pub use memory::{FailureConfig, MemoryKv};

/// Remote key-value store interface.
///
/// `Ok(None)` means the key is absent; callers treat absence and errors the
/// same way (fall through to the next value source), so implementations
/// should not retry internally.
pub trait KvStore: Send + Sync {
    /// Look up a single key, returning its value if present.
    fn get(&self, key: &str) -> Result<Option<String>, KvError>;
}

/// Remote store errors
#[derive(Debug, thiserror::Error)]
pub enum KvError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection timeout")]
    ConnectionTimeout,

    #[error("Backend error: {0}")]
    Backend(String),
}
