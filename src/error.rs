//! Registry and resolver errors
//!
//! Source-parse failures propagate verbatim and leave the registry
//! unresolved, so the caller can fix configuration and retry. Remote-store
//! failures never surface here; the resolver treats them as
//! value-not-provided.

use crate::provenance::ValueOrigin;
use crate::value::FlagKind;

/// Registration errors
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("option '{name}' already registered as {registered}, cannot re-register as {requested}")]
    KindMismatch {
        name: String,
        registered: FlagKind,
        requested: FlagKind,
    },
}

/// Resolution errors
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("argument parse error: {0}")]
    Args(#[from] clap::Error),

    #[error("config file IO error: {path}: {message}")]
    ConfigIo { path: String, message: String },

    #[error("config file parse error: {path}: {message}")]
    ConfigParse { path: String, message: String },

    #[error("invalid value '{value}' for option '{name}' from {origin}: {message}")]
    InvalidValue {
        name: String,
        value: String,
        origin: ValueOrigin,
        message: String,
    },
}
