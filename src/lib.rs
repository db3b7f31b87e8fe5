#![forbid(unsafe_code)]

//! Submission fan-out (sfo) — reorganizes bulk-downloaded submission exports
//! into one directory per author, restoring original filenames.
//!
//! Three phases, in dependency order:
//! 1. **Tree walker** — bounded-depth traversal collecting candidate files
//! 2. **Name decoder** — author key + original stem from the encoded filename
//! 3. **Fan-out builder** — per-author directories, then the copy pass
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use submission_fanout::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use submission_fanout::decode::identity::DecodeRules;
//! use submission_fanout::scanner::walker::{TreeWalker, WalkerConfig};
//! ```

pub mod prelude;

pub mod core;
pub mod decode;
pub mod fanout;
pub mod logger;
pub mod scanner;
