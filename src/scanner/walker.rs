//! Bounded-depth directory walker collecting candidate submission files.
//!
//! The walker is the discovery phase of a run: it produces the flat list of
//! [`SourceFile`]s that the decoder classifies and the fan-out builder
//! distributes. Traversal is single-threaded and synchronous; each directory
//! listing is opened, fully consumed, and dropped before the next one.

#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use crate::core::errors::{Result, SfoError};
use crate::core::paths;

/// Extension filter applied to candidate file names.
///
/// Accepts either a bare list (`java,txt`) or the glob-brace form bulk
/// download tooling tends to pass around (`*.{java,txt}`). An empty filter
/// matches every file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionFilter {
    extensions: Vec<String>,
}

impl ExtensionFilter {
    /// Filter that matches every file.
    #[must_use]
    pub fn match_all() -> Self {
        Self::default()
    }

    /// Build from bare extension names (case-insensitive, no leading dot).
    #[must_use]
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Parse a filter pattern: `java`, `java,txt`, `.java`, or `*.{java,txt}`.
    /// `*` and the empty string match everything.
    pub fn parse(pattern: &str) -> Result<Self> {
        let trimmed = pattern.trim();
        if trimmed.is_empty() || trimmed == "*" || trimmed == "*.*" {
            return Ok(Self::match_all());
        }

        let body = trimmed
            .strip_prefix("*.")
            .unwrap_or(trimmed)
            .trim_start_matches('{')
            .trim_end_matches('}');

        let mut extensions = Vec::new();
        for part in body.split(',') {
            let ext = part.trim().trim_start_matches('.');
            if ext.is_empty() || ext.contains('*') || ext.contains('.') {
                return Err(SfoError::InvalidConfig {
                    details: format!("invalid extension pattern {pattern:?}"),
                });
            }
            extensions.push(ext.to_ascii_lowercase());
        }
        Ok(Self { extensions })
    }

    /// Whether a raw filename passes the filter.
    #[must_use]
    pub fn matches(&self, raw_name: &str) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        raw_name.rsplit_once('.').is_some_and(|(_, ext)| {
            self.extensions.iter().any(|e| ext.eq_ignore_ascii_case(e))
        })
    }
}

/// Walker configuration, passed explicitly at call time.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Depth bound below the scan root. `None` is unbounded; `Some(0)` lists
    /// only the root itself.
    pub max_depth: Option<usize>,
    pub follow_symlinks: bool,
    pub filter: ExtensionFilter,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            follow_symlinks: false,
            filter: ExtensionFilter::match_all(),
        }
    }
}

/// A candidate file discovered during traversal. Immutable once discovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute path to the file.
    pub path: PathBuf,
    /// The raw encoded filename, as found.
    pub raw_name: String,
}

/// Depth-first walker over an explicit `(path, depth)` stack.
///
/// Depth is tracked per branch, so the bound holds uniformly for every file
/// regardless of sibling ordering. Any listing failure aborts the whole walk;
/// there is no partial-result recovery.
#[derive(Debug, Clone)]
pub struct TreeWalker {
    config: WalkerConfig,
}

impl TreeWalker {
    #[must_use]
    pub fn new(config: WalkerConfig) -> Self {
        Self { config }
    }

    /// Walk the tree under `root`, collecting files that pass the filter.
    ///
    /// `root` is normalized first: a file resolves to its parent directory,
    /// an unresolvable path is [`SfoError::MissingTarget`]. No ordering
    /// guarantee across sibling directories.
    pub fn walk(&self, root: &Path) -> Result<Vec<SourceFile>> {
        let root = paths::normalize_scan_root(root)?;
        let mut found = Vec::new();
        let mut stack: Vec<(PathBuf, usize)> = vec![(root, 0)];

        while let Some((dir, depth)) = stack.pop() {
            let entries = fs::read_dir(&dir).map_err(|source| SfoError::io(&dir, source))?;
            for entry in entries {
                let entry = entry.map_err(|source| SfoError::io(&dir, source))?;
                let path = entry.path();
                let file_type = entry
                    .file_type()
                    .map_err(|source| SfoError::io(&path, source))?;

                let is_dir = if file_type.is_symlink() {
                    if !self.config.follow_symlinks {
                        continue;
                    }
                    fs::metadata(&path).is_ok_and(|m| m.is_dir())
                } else {
                    file_type.is_dir()
                };

                if is_dir {
                    if self.config.max_depth.is_none_or(|limit| depth < limit) {
                        stack.push((path, depth + 1));
                    }
                    continue;
                }

                // Names outside UTF-8 cannot match the ASCII naming
                // convention; they never reach the decoder.
                let Some(raw_name) = path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                if self.config.filter.matches(raw_name) {
                    found.push(SourceFile {
                        raw_name: raw_name.to_string(),
                        path,
                    });
                }
            }
        }

        Ok(found)
    }
}
