//! Submission scanner: bounded-depth tree walker with extension filtering.

pub mod walker;
