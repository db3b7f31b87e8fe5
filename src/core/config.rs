//! Configuration system: TOML file + env var overrides + defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, SfoError};
use crate::decode::identity::DecodeRules;

/// Full configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
#[derive(Default)]
pub struct Config {
    pub walker: WalkerSection,
    pub decode: DecodeSection,
    pub fanout: FanoutSection,
    pub log: LogSection,
}

/// Traversal bounds and extension filtering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WalkerSection {
    /// Maximum traversal depth below the scan root. `-1` means unbounded,
    /// `0` lists only the root itself.
    pub max_depth: i64,
    /// Extensions collected during the walk (no leading dot). Empty matches
    /// every file.
    pub extensions: Vec<String>,
    pub follow_symlinks: bool,
}

impl Default for WalkerSection {
    fn default() -> Self {
        Self {
            max_depth: -1,
            extensions: vec!["java".to_string()],
            follow_symlinks: false,
        }
    }
}

/// Naming-convention characters for the decoder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DecodeSection {
    /// Single ASCII character separating encoded fields in a raw filename.
    pub field_delimiter: String,
    /// Single ASCII character introducing a copy-identifier suffix.
    pub copy_marker: String,
}

impl Default for DecodeSection {
    fn default() -> Self {
        Self {
            field_delimiter: "_".to_string(),
            copy_marker: "-".to_string(),
        }
    }
}

impl DecodeSection {
    /// Build the validated decoder rules.
    ///
    /// `Config::validate` guarantees both fields are single ASCII
    /// characters; the fallbacks here only guard hand-built sections.
    #[must_use]
    pub fn rules(&self) -> DecodeRules {
        DecodeRules::new(
            self.field_delimiter.bytes().next().unwrap_or(b'_'),
            self.copy_marker.bytes().next().unwrap_or(b'-'),
        )
    }
}

/// Output directory naming.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FanoutSection {
    /// Name (not path) of the output root created next to the scan root.
    pub output_folder_name: String,
    /// Append a UTC timestamp to the output folder name, allowing repeated
    /// runs against the same root.
    pub stamp_output: bool,
}

impl Default for FanoutSection {
    fn default() -> Self {
        Self {
            output_folder_name: "AllStudents".to_string(),
            stamp_output: false,
        }
    }
}

/// Activity log destination.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct LogSection {
    /// JSONL activity log path. `None` disables the log.
    pub jsonl_path: Option<PathBuf>,
}

impl Config {
    /// Default configuration path (`~/.config/sfo/config.toml`).
    #[must_use]
    pub fn default_path() -> PathBuf {
        let home_dir = env::var_os("HOME").map_or_else(|| PathBuf::from("/tmp"), PathBuf::from);
        home_dir.join(".config").join("sfo").join("config.toml")
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from the default
    /// path; defaults are used. An explicit path that does not exist is.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| SfoError::Io {
                path: path_buf.clone(),
                source,
            })?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if path.is_some() {
            return Err(SfoError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// The walker depth bound as an `Option` (`None` = unbounded).
    #[must_use]
    pub fn depth_limit(&self) -> Option<usize> {
        usize::try_from(self.walker.max_depth).ok()
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_env_overrides_from(env_var)
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        // walker
        if let Some(raw) = lookup("SFO_WALKER_MAX_DEPTH") {
            self.walker.max_depth = parse_env_i64("SFO_WALKER_MAX_DEPTH", &raw)?;
        }
        if let Some(raw) = lookup("SFO_WALKER_FOLLOW_SYMLINKS") {
            self.walker.follow_symlinks = parse_env_bool("SFO_WALKER_FOLLOW_SYMLINKS", &raw)?;
        }
        if let Some(raw) = lookup("SFO_WALKER_EXTENSIONS") {
            self.walker.extensions = raw
                .split(',')
                .map(|e| e.trim().trim_start_matches('.').to_string())
                .filter(|e| !e.is_empty())
                .collect();
        }

        // decode
        if let Some(raw) = lookup("SFO_DECODE_FIELD_DELIMITER") {
            self.decode.field_delimiter = raw;
        }
        if let Some(raw) = lookup("SFO_DECODE_COPY_MARKER") {
            self.decode.copy_marker = raw;
        }

        // fanout
        if let Some(raw) = lookup("SFO_FANOUT_OUTPUT_FOLDER_NAME") {
            self.fanout.output_folder_name = raw;
        }
        if let Some(raw) = lookup("SFO_FANOUT_STAMP_OUTPUT") {
            self.fanout.stamp_output = parse_env_bool("SFO_FANOUT_STAMP_OUTPUT", &raw)?;
        }

        // log
        if let Some(raw) = lookup("SFO_LOG_JSONL_PATH") {
            self.log.jsonl_path = Some(PathBuf::from(raw));
        }

        Ok(())
    }

    /// Validate invariants that serde defaults cannot enforce.
    pub fn validate(&self) -> Result<()> {
        validate_ascii_char("decode.field_delimiter", &self.decode.field_delimiter)?;
        validate_ascii_char("decode.copy_marker", &self.decode.copy_marker)?;
        if self.decode.field_delimiter == self.decode.copy_marker {
            return Err(SfoError::InvalidConfig {
                details: "decode.field_delimiter and decode.copy_marker must differ".to_string(),
            });
        }

        if self.walker.max_depth < -1 {
            return Err(SfoError::InvalidConfig {
                details: format!(
                    "walker.max_depth must be >= -1 (-1 = unbounded), got {}",
                    self.walker.max_depth
                ),
            });
        }

        for ext in &self.walker.extensions {
            if ext.is_empty() || ext.contains('.') || ext.contains('*') {
                return Err(SfoError::InvalidConfig {
                    details: format!(
                        "walker.extensions entries must be bare extensions, got {ext:?}"
                    ),
                });
            }
        }

        let out = &self.fanout.output_folder_name;
        if out.is_empty() || out.contains('/') || out.contains('\\') {
            return Err(SfoError::InvalidConfig {
                details: format!(
                    "fanout.output_folder_name must be a bare directory name, got {out:?}"
                ),
            });
        }

        Ok(())
    }
}

fn validate_ascii_char(name: &str, value: &str) -> Result<()> {
    let mut bytes = value.bytes();
    match (bytes.next(), bytes.next()) {
        (Some(b), None) if b.is_ascii() && !b.is_ascii_control() => Ok(()),
        _ => Err(SfoError::InvalidConfig {
            details: format!("{name} must be a single printable ASCII character, got {value:?}"),
        }),
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env_i64(name: &str, raw: &str) -> Result<i64> {
    raw.parse::<i64>().map_err(|error| SfoError::ConfigParse {
        context: "env",
        details: format!("{name}={raw:?}: {error}"),
    })
}

fn parse_env_bool(name: &str, raw: &str) -> Result<bool> {
    raw.parse::<bool>().map_err(|error| SfoError::ConfigParse {
        context: "env",
        details: format!("{name}={raw:?}: {error}"),
    })
}
