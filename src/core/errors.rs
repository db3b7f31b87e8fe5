//! SFO-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, SfoError>;

/// Top-level error type for the submission fan-out tool.
#[derive(Debug, Error)]
pub enum SfoError {
    #[error("[SFO-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[SFO-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[SFO-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[SFO-2001] submission root not found: {path}")]
    MissingTarget { path: PathBuf },

    #[error("[SFO-2002] malformed submission name {name:?}: {details}")]
    MalformedName { name: String, details: &'static str },

    #[error("[SFO-2003] output root already exists: {path}")]
    OutputExists { path: PathBuf },

    #[error("[SFO-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[SFO-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[SFO-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl SfoError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "SFO-1001",
            Self::MissingConfig { .. } => "SFO-1002",
            Self::ConfigParse { .. } => "SFO-1003",
            Self::MissingTarget { .. } => "SFO-2001",
            Self::MalformedName { .. } => "SFO-2002",
            Self::OutputExists { .. } => "SFO-2003",
            Self::Serialization { .. } => "SFO-2101",
            Self::Io { .. } => "SFO-3002",
            Self::Runtime { .. } => "SFO-3900",
        }
    }

    /// Whether the failure is scoped to a single input file.
    ///
    /// Per-file errors are skipped and logged during fan-out; everything
    /// else aborts the whole run.
    #[must_use]
    pub const fn is_per_file(&self) -> bool {
        matches!(self, Self::MalformedName { .. })
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for SfoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for SfoError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
