//! Fan-out: per-author destination directories and the copy pass.

pub mod builder;
