//! # Config - session and codec settings
//!
//! A single plain struct, [`DbfConfig`], carries every knob the codec and the
//! file session read: which text encoding to force or fall back to, whether a
//! `.cpg` sidecar next to the file is consulted, the three truncation flags a
//! new record starts with, and optional per-type null sentinels.
//!
//! The struct is passed explicitly to whoever needs it, so two sessions with
//! different encodings can live side by side in one process.
//!
//! ## Environment
//!
//! ```text
//! DBF_ENCODING                forced codec label        (default: none)
//! DBF_DEFAULT_ENCODING        legacy fallback codec     (default: "windows-1252")
//! DBF_READ_CPG                consult <name>.cpg        (default: "true")
//! DBF_ALLOW_STRING_TRUNCATE   trim long strings         (default: "true")
//! DBF_ALLOW_DECIMAL_TRUNCATE  drop extra decimals       (default: "false")
//! DBF_ALLOW_INTEGER_TRUNCATE  drop leading digits       (default: "false")
//! ```

use std::collections::HashMap;

/// Codec used when nothing else names one.
pub const DEFAULT_ENCODING: &str = "windows-1252";

/// Column type families a null sentinel can be configured for.
///
/// Kept independent from the codec's own column type so this crate has no
/// dependencies; the codec maps its types onto these keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NullKind {
    Character,
    Number,
    Boolean,
    Date,
    Integer,
}

/// Truncation policy a new record starts with.
///
/// Strings are usually safe to trim; numbers usually are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Truncation {
    pub allow_string: bool,
    pub allow_decimal: bool,
    pub allow_integer: bool,
}

impl Default for Truncation {
    fn default() -> Self {
        Self {
            allow_string: true,
            allow_decimal: false,
            allow_integer: false,
        }
    }
}

/// Per-type null sentinels.
///
/// When a sentinel is set for a type, writing a null stores the sentinel text
/// and reading a field whose trimmed text equals it yields an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NullValues {
    markers: HashMap<NullKind, String>,
}

impl NullValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `marker` as the null sentinel for `kind`, replacing any previous one.
    pub fn set(&mut self, kind: NullKind, marker: impl Into<String>) {
        self.markers.insert(kind, marker.into());
    }

    /// Builder-style variant of [`set`](NullValues::set).
    #[must_use]
    pub fn with(mut self, kind: NullKind, marker: impl Into<String>) -> Self {
        self.set(kind, marker);
        self
    }

    pub fn get(&self, kind: NullKind) -> Option<&str> {
        self.markers.get(&kind).map(String::as_str)
    }

    /// Returns `true` if `text` is the configured sentinel for `kind`.
    #[must_use]
    pub fn is_null(&self, kind: NullKind, text: &str) -> bool {
        self.get(kind).map(|m| m == text).unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

/// Settings for one DBF session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbfConfig {
    /// Codec label that overrides the sidecar and the language-driver byte.
    pub encoding: Option<String>,
    /// Codec used when neither an override nor the header names a usable one.
    pub default_encoding: String,
    /// Look for a `<name>.cpg` file next to a path-opened table.
    pub read_sidecar: bool,
    pub truncation: Truncation,
    pub null_values: NullValues,
}

impl Default for DbfConfig {
    fn default() -> Self {
        Self {
            encoding: None,
            default_encoding: DEFAULT_ENCODING.to_string(),
            read_sidecar: true,
            truncation: Truncation::default(),
            null_values: NullValues::default(),
        }
    }
}

impl DbfConfig {
    /// Builds a config from `DBF_*` environment variables, falling back to
    /// the defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](DbfConfig::from_env) but reads values through
    /// `lookup`, so callers (and tests) can supply their own source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let flag = |key: &str, default: bool| -> bool {
            lookup(key)
                .and_then(|v| parse_bool(&v))
                .unwrap_or(default)
        };

        Self {
            encoding: lookup("DBF_ENCODING")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            default_encoding: lookup("DBF_DEFAULT_ENCODING")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.default_encoding),
            read_sidecar: flag("DBF_READ_CPG", defaults.read_sidecar),
            truncation: Truncation {
                allow_string: flag("DBF_ALLOW_STRING_TRUNCATE", defaults.truncation.allow_string),
                allow_decimal: flag("DBF_ALLOW_DECIMAL_TRUNCATE", defaults.truncation.allow_decimal),
                allow_integer: flag("DBF_ALLOW_INTEGER_TRUNCATE", defaults.truncation.allow_integer),
            },
            null_values: NullValues::default(),
        }
    }

    /// Forces `label` as the codec for every session using this config.
    #[must_use]
    pub fn with_encoding(mut self, label: impl Into<String>) -> Self {
        self.encoding = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_truncation(mut self, truncation: Truncation) -> Self {
        self.truncation = truncation;
        self
    }

    #[must_use]
    pub fn with_null_values(mut self, null_values: NullValues) -> Self {
        self.null_values = null_values;
        self
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
