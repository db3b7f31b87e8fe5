//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use submission_fanout::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{Result, SfoError};
pub use crate::core::paths::{normalize_scan_root, output_root_for};

// Decoder
pub use crate::decode::identity::{DecodeRules, DecodedIdentity};

// Scanner
pub use crate::scanner::walker::{ExtensionFilter, SourceFile, TreeWalker, WalkerConfig};

// Fan-out
pub use crate::fanout::builder::{FanoutBuilder, FanoutPlan, FanoutReport, SkippedFile};

// Logger
pub use crate::logger::jsonl::{EventType, JsonlWriter, LogEntry, Severity};
