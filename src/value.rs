//! Primitive flag values
//!
//! Every option is one of six primitive kinds. `FlagValue` carries the
//! textual parse/render pair the resolver uses to move values between
//! sources (argv, config file, remote store) and typed slots.

use std::time::Duration;

/// Kind tag for a registered option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagKind {
    Text,
    Bool,
    Duration,
    Float,
    Int,
    Int64,
}

impl FlagKind {
    /// Returns the human-readable name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagKind::Text => "text",
            FlagKind::Bool => "bool",
            FlagKind::Duration => "duration",
            FlagKind::Float => "float",
            FlagKind::Int => "int",
            FlagKind::Int64 => "int64",
        }
    }

    /// Check that a textual value parses as this kind
    pub fn validate(self, text: &str) -> Result<(), String> {
        match self {
            FlagKind::Text => String::parse_text(text).map(|_| ()),
            FlagKind::Bool => bool::parse_text(text).map(|_| ()),
            FlagKind::Duration => Duration::parse_text(text).map(|_| ()),
            FlagKind::Float => f64::parse_text(text).map(|_| ()),
            FlagKind::Int => i32::parse_text(text).map(|_| ()),
            FlagKind::Int64 => i64::parse_text(text).map(|_| ()),
        }
    }
}

impl std::fmt::Display for FlagKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A value that can live behind a flag
pub trait FlagValue: Clone + Send + Sync + 'static {
    /// Kind tag recorded with the canonical flag
    const KIND: FlagKind;

    /// Parse from the textual form used by every source
    fn parse_text(text: &str) -> Result<Self, String>;

    /// Render back to the textual form
    fn render(&self) -> String;
}

impl FlagValue for String {
    const KIND: FlagKind = FlagKind::Text;

    fn parse_text(text: &str) -> Result<Self, String> {
        Ok(text.to_string())
    }

    fn render(&self) -> String {
        self.clone()
    }
}

impl FlagValue for bool {
    const KIND: FlagKind = FlagKind::Bool;

    fn parse_text(text: &str) -> Result<Self, String> {
        match text.to_ascii_lowercase().as_str() {
            "1" | "t" | "true" => Ok(true),
            "0" | "f" | "false" => Ok(false),
            other => Err(format!("invalid boolean: {:?}", other)),
        }
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

impl FlagValue for Duration {
    const KIND: FlagKind = FlagKind::Duration;

    fn parse_text(text: &str) -> Result<Self, String> {
        humantime::parse_duration(text).map_err(|e| e.to_string())
    }

    fn render(&self) -> String {
        humantime::format_duration(*self).to_string()
    }
}

impl FlagValue for f64 {
    const KIND: FlagKind = FlagKind::Float;

    fn parse_text(text: &str) -> Result<Self, String> {
        text.parse().map_err(|e: std::num::ParseFloatError| e.to_string())
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

impl FlagValue for i32 {
    const KIND: FlagKind = FlagKind::Int;

    fn parse_text(text: &str) -> Result<Self, String> {
        text.parse().map_err(|e: std::num::ParseIntError| e.to_string())
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

impl FlagValue for i64 {
    const KIND: FlagKind = FlagKind::Int64;

    fn parse_text(text: &str) -> Result<Self, String> {
        text.parse().map_err(|e: std::num::ParseIntError| e.to_string())
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_forms() {
        assert_eq!(bool::parse_text("true").unwrap(), true);
        assert_eq!(bool::parse_text("T").unwrap(), true);
        assert_eq!(bool::parse_text("1").unwrap(), true);
        assert_eq!(bool::parse_text("0").unwrap(), false);
        assert_eq!(bool::parse_text("F").unwrap(), false);
        assert!(bool::parse_text("yes").is_err());
    }

    #[test]
    fn test_duration_parse_and_render() {
        assert_eq!(
            Duration::parse_text("2m30s").unwrap(),
            Duration::from_secs(150)
        );
        assert_eq!(
            Duration::parse_text("500ms").unwrap(),
            Duration::from_millis(500)
        );
        assert_eq!(Duration::from_secs(90).render(), "1m 30s");
        assert!(Duration::parse_text("not-a-duration").is_err());
    }

    #[test]
    fn test_kind_validate() {
        assert!(FlagKind::Int.validate("42").is_ok());
        assert!(FlagKind::Int.validate("abc").is_err());
        assert!(FlagKind::Float.validate("2.5").is_ok());
        assert!(FlagKind::Int64.validate("9223372036854775807").is_ok());
        assert!(FlagKind::Int.validate("9223372036854775807").is_err());
        assert!(FlagKind::Text.validate("anything").is_ok());
    }
}
