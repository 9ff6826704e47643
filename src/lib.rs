//! conflag - shared flag registration with multi-source resolution
//!
//! Independently-initialized components register named options against a
//! `FlagRegistry` without a central list; callers that register under the
//! same name share one resolved value. A single resolution pass merges the
//! command line, a TOML config file, and optionally a remote key-value
//! store, in strict priority order:
//!
//! explicit command line > config file > remote store > default
//!
//! ```no_run
//! use conflag::{FlagRegistry, ResolveOptions};
//!
//! let registry = FlagRegistry::new();
//! let workers = registry.register_int("workers", "pool", 4, "worker pool size")?;
//!
//! registry.resolve(ResolveOptions::new())?;
//! println!("workers = {}", workers.get());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cell;
pub mod error;
mod notify;
pub mod provenance;
pub mod registry;
pub mod resolve;
mod scope;
pub mod value;

pub use cell::FlagHandle;
pub use error::{RegistryError, ResolveError};
pub use provenance::{ResolutionReport, SourceRecord, ValueOrigin};
pub use registry::FlagRegistry;
pub use resolve::ResolveOptions;
pub use value::{FlagKind, FlagValue};

pub use conflag_kv as kv;
pub use conflag_kv::{KvError, KvStore};
