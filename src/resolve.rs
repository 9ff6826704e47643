//! Multi-source resolution
//!
//! Merges three sources into every registered name, in strict priority
//! order: explicit command line, config file, remote store; names no source
//! provides keep their registration-time defaults. Argv tokenizing is
//! delegated to clap, file parsing to toml, remote lookups to a `KvStore`
//! handle. Runs at most once per registry; a failed run leaves the registry
//! unresolved so the caller can fix configuration and retry.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use clap::parser::ValueSource;
use clap::{Arg, Command};
use conflag_kv::KvStore;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::ResolveError;
use crate::provenance::{ResolutionReport, SourceRecord, ValueOrigin};
use crate::registry::FlagRegistry;
use crate::value::FlagKind;

/// Resolution options
///
/// All fields are optional: with the default bundle the resolver parses the
/// process argv and consults no file and no remote store.
#[derive(Default)]
pub struct ResolveOptions {
    /// Argv tokens to parse instead of the process arguments (no binary
    /// name). Used by tests and embedding hosts.
    pub args: Option<Vec<String>>,

    /// Config file path; an absent file is skipped silently.
    pub config_path: Option<PathBuf>,

    /// Remote store handle; one `get` per name not set by argv or file.
    pub remote: Option<Arc<dyn KvStore>>,
}

impl ResolveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn with_remote(mut self, store: Arc<dyn KvStore>) -> Self {
        self.remote = Some(store);
        self
    }
}

impl FlagRegistry {
    /// Resolve every registered option.
    ///
    /// Idempotent: once resolution has completed, later calls return the
    /// cached report without re-reading any source. The file read and the
    /// remote round trips happen synchronously inside the registry's
    /// critical section; a slow store stalls concurrent registrations for
    /// the duration.
    pub fn resolve(&self, options: ResolveOptions) -> Result<ResolutionReport, ResolveError> {
        let mut state = self.lock();
        if state.resolved {
            if let Some(report) = state.report.clone() {
                return Ok(report);
            }
        }

        let args: Vec<String> = match options.args {
            Some(args) => args,
            None => std::env::args().skip(1).collect(),
        };

        let mut command = Command::new("conflag")
            .no_binary_name(true)
            .disable_help_flag(true)
            .disable_version_flag(true);
        for (name, entry) in &state.names {
            let arg = Arg::new(name.clone())
                .long(name.clone())
                .value_name("VALUE")
                .help(entry.canonical.usage.clone());
            let arg = match entry.canonical.kind {
                FlagKind::Bool => arg
                    .num_args(0..=1)
                    .require_equals(true)
                    .default_missing_value("true"),
                _ => arg.num_args(1),
            };
            command = command.arg(arg);
        }
        let matches = command.try_get_matches_from(args)?;

        let mut file_values: BTreeMap<String, String> = BTreeMap::new();
        let mut file_record = None;
        if let Some(path) = &options.config_path {
            if path.exists() {
                let (values, digest) = load_config_file(path)?;
                file_values = values;
                file_record = Some(SourceRecord {
                    origin: ValueOrigin::File,
                    path: Some(path.to_string_lossy().to_string()),
                    digest: Some(digest),
                });
            }
        }

        // Pick one value per name and validate everything before any slot
        // is written: resolution either fully completes or fully fails.
        let mut chosen: Vec<(String, String, ValueOrigin)> = Vec::new();
        let mut origins: BTreeMap<String, ValueOrigin> = BTreeMap::new();
        for (name, entry) in &state.names {
            let explicit = matches.value_source(name) == Some(ValueSource::CommandLine);
            let picked = if explicit {
                matches
                    .get_one::<String>(name)
                    .cloned()
                    .map(|value| (value, ValueOrigin::Cli))
            } else if let Some(value) = file_values.get(name) {
                Some((value.clone(), ValueOrigin::File))
            } else if let Some(store) = &options.remote {
                match store.get(name) {
                    Ok(Some(value)) => Some((value, ValueOrigin::Remote)),
                    Ok(None) => None,
                    Err(err) => {
                        warn!("remote lookup for '{}' failed: {}", name, err);
                        None
                    }
                }
            } else {
                None
            };

            match picked {
                Some((value, origin)) => {
                    if let Err(message) = entry.canonical.kind.validate(&value) {
                        return Err(ResolveError::InvalidValue {
                            name: name.clone(),
                            value,
                            origin,
                            message,
                        });
                    }
                    origins.insert(name.clone(), origin);
                    chosen.push((name.clone(), value, origin));
                }
                None => {
                    origins.insert(name.clone(), ValueOrigin::Default);
                }
            }
        }

        for (name, value, origin) in &chosen {
            if let Some(entry) = state.names.get(name) {
                if let Err(message) = entry.scopes.fan_out(value) {
                    return Err(ResolveError::InvalidValue {
                        name: name.clone(),
                        value: value.clone(),
                        origin: *origin,
                        message,
                    });
                }
            }
            debug!("option '{}' resolved from {}", name, origin);
        }

        let mut sources = vec![SourceRecord {
            origin: ValueOrigin::Cli,
            path: None,
            digest: None,
        }];
        if let Some(record) = file_record {
            sources.push(record);
        }
        if options.remote.is_some() {
            sources.push(SourceRecord {
                origin: ValueOrigin::Remote,
                path: None,
                digest: None,
            });
        }

        let report = ResolutionReport {
            created_at: Utc::now(),
            sources,
            origins,
        };
        state.report = Some(report.clone());
        state.resolved = true;
        state.queue.dispatch_pending();
        debug!("resolution complete: {} option(s)", report.origins.len());

        Ok(report)
    }
}

/// Load a flat TOML config file, returning folded key -> textual value and
/// the file digest.
fn load_config_file(path: &Path) -> Result<(BTreeMap<String, String>, String), ResolveError> {
    let display = path.to_string_lossy().to_string();

    let bytes = fs::read(path).map_err(|e| ResolveError::ConfigIo {
        path: display.clone(),
        message: e.to_string(),
    })?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = hex::encode(hasher.finalize());

    let contents = String::from_utf8(bytes).map_err(|e| ResolveError::ConfigParse {
        path: display.clone(),
        message: format!("invalid UTF-8: {}", e),
    })?;

    let value: toml::Value = toml::from_str(&contents).map_err(|e| ResolveError::ConfigParse {
        path: display.clone(),
        message: e.to_string(),
    })?;

    let table = value.as_table().ok_or_else(|| ResolveError::ConfigParse {
        path: display.clone(),
        message: "top level must be a table".to_string(),
    })?;

    let mut values = BTreeMap::new();
    for (key, item) in table {
        let text = scalar_text(item).map_err(|message| ResolveError::ConfigParse {
            path: display.clone(),
            message: format!("key '{}': {}", key, message),
        })?;
        values.insert(key.to_lowercase(), text);
    }

    Ok((values, digest))
}

fn scalar_text(value: &toml::Value) -> Result<String, String> {
    match value {
        toml::Value::String(s) => Ok(s.clone()),
        toml::Value::Integer(i) => Ok(i.to_string()),
        toml::Value::Float(f) => Ok(f.to_string()),
        toml::Value::Boolean(b) => Ok(b.to_string()),
        toml::Value::Datetime(dt) => Ok(dt.to_string()),
        toml::Value::Array(_) | toml::Value::Table(_) => {
            Err("option values must be scalars".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_scalar_text_renders_primitives() {
        assert_eq!(
            scalar_text(&toml::Value::String("on".to_string())).unwrap(),
            "on"
        );
        assert_eq!(scalar_text(&toml::Value::Integer(16)).unwrap(), "16");
        assert_eq!(scalar_text(&toml::Value::Boolean(true)).unwrap(), "true");
        assert!(scalar_text(&toml::Value::Array(vec![])).is_err());
    }

    #[test]
    fn test_load_config_file_folds_keys() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "Workers = 16").unwrap();
        writeln!(temp, "verbose = true").unwrap();

        let (values, digest) = load_config_file(temp.path()).unwrap();

        assert_eq!(values.get("workers"), Some(&"16".to_string()));
        assert_eq!(values.get("verbose"), Some(&"true".to_string()));
        assert_eq!(digest.len(), 64);
    }

    #[test]
    fn test_load_config_file_rejects_tables() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "[cache]").unwrap();
        writeln!(temp, "mode = \"on\"").unwrap();

        let err = load_config_file(temp.path()).unwrap_err();
        assert!(matches!(err, ResolveError::ConfigParse { .. }));
    }

    #[test]
    fn test_load_config_file_rejects_bad_toml() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "workers = = 16").unwrap();

        let err = load_config_file(temp.path()).unwrap_err();
        assert!(matches!(err, ResolveError::ConfigParse { .. }));
    }
}
