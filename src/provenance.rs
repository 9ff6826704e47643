//! Resolution provenance
//!
//! The report captures where each option's value came from plus the
//! sources consulted, so operators can audit a running process's effective
//! configuration.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Origin of a resolved value
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ValueOrigin {
    /// Explicitly set on the command line
    Cli,
    /// Present in the config file
    File,
    /// Retrieved from the remote store
    Remote,
    /// No source provided a value; each slot keeps its registration default
    Default,
}

impl ValueOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueOrigin::Cli => "cli",
            ValueOrigin::File => "file",
            ValueOrigin::Remote => "remote",
            ValueOrigin::Default => "default",
        }
    }
}

impl std::fmt::Display for ValueOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A consulted value source with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Which source this record describes
    pub origin: ValueOrigin,

    /// File path (config file only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of raw file bytes (config file only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Outcome of a resolution pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionReport {
    /// When resolution completed
    pub created_at: DateTime<Utc>,

    /// Sources consulted, highest priority first
    pub sources: Vec<SourceRecord>,

    /// Per-option origin of the resolved value
    pub origins: BTreeMap<String, ValueOrigin>,
}

impl ResolutionReport {
    /// Origin of a single option's value
    pub fn origin_of(&self, name: &str) -> Option<ValueOrigin> {
        self.origins.get(name).copied()
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_roundtrip() {
        let mut origins = BTreeMap::new();
        origins.insert("workers".to_string(), ValueOrigin::Cli);
        origins.insert("verbose".to_string(), ValueOrigin::Default);

        let report = ResolutionReport {
            created_at: Utc::now(),
            sources: vec![SourceRecord {
                origin: ValueOrigin::Cli,
                path: None,
                digest: None,
            }],
            origins,
        };

        let json = report.to_json().unwrap();
        assert!(json.contains("\"workers\": \"cli\""));

        let parsed: ResolutionReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.origin_of("workers"), Some(ValueOrigin::Cli));
        assert_eq!(parsed.origin_of("verbose"), Some(ValueOrigin::Default));
        assert_eq!(parsed.origin_of("missing"), None);
    }
}
