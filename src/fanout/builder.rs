//! Fan-out builder: distributes a flat list of submissions into one
//! directory per author, restoring original filenames.
//!
//! Pipeline: decode every file once -> dedupe authors into a destination map
//! -> create output root and author directories -> copy pass.
//!
//! The plan step is pure over its inputs; `execute` is the only place in the
//! crate that mutates the filesystem. Malformed names are skipped and
//! logged, never fatal; any I/O failure aborts the remaining fan-out.

#![allow(missing_docs)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::errors::{Result, SfoError};
use crate::decode::identity::DecodeRules;
use crate::logger::jsonl::{EventType, JsonlWriter, LogEntry, Severity};
use crate::scanner::walker::SourceFile;

/// One copy operation the plan commits to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedCopy {
    pub source: PathBuf,
    pub dest: PathBuf,
    pub author: String,
}

/// A file excluded from the fan-out, with the typed reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub error_code: String,
    pub reason: String,
}

/// Plan produced before any filesystem mutation.
#[derive(Debug, Clone, Serialize)]
pub struct FanoutPlan {
    pub output_root: PathBuf,
    /// Destination directory per distinct author key. Direct mapping — no
    /// substring matching, so one author's key being a prefix of another's
    /// cannot misroute a file.
    pub author_dirs: BTreeMap<String, PathBuf>,
    pub copies: Vec<PlannedCopy>,
    pub skipped: Vec<SkippedFile>,
}

/// Summary after the fan-out completes.
#[derive(Debug, Clone, Serialize)]
pub struct FanoutReport {
    pub output_root: PathBuf,
    pub authors: usize,
    pub copied: usize,
    pub bytes_copied: u64,
    pub skipped: Vec<SkippedFile>,
}

/// The fan-out builder: owns the output root for the duration of a run.
pub struct FanoutBuilder {
    rules: DecodeRules,
}

impl FanoutBuilder {
    #[must_use]
    pub fn new(rules: DecodeRules) -> Self {
        Self { rules }
    }

    /// Build the fan-out plan: decode every file, dedupe authors, resolve
    /// destinations. Pure over its inputs — nothing is created yet.
    ///
    /// Malformed names land in `skipped` with their typed error; the plan
    /// stays total over the input set.
    #[must_use]
    pub fn plan(&self, files: &[SourceFile], output_root: &Path) -> FanoutPlan {
        let mut author_dirs: BTreeMap<String, PathBuf> = BTreeMap::new();
        let mut copies = Vec::with_capacity(files.len());
        let mut skipped = Vec::new();

        for file in files {
            match self.rules.decode(&file.raw_name) {
                Ok(identity) => {
                    let dir = author_dirs
                        .entry(identity.author_key.clone())
                        .or_insert_with(|| output_root.join(&identity.author_key))
                        .clone();
                    copies.push(PlannedCopy {
                        source: file.path.clone(),
                        dest: dir.join(identity.destination_name()),
                        author: identity.author_key,
                    });
                }
                Err(err) => {
                    debug_assert!(err.is_per_file());
                    skipped.push(SkippedFile {
                        path: file.path.clone(),
                        error_code: err.code().to_string(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        FanoutPlan {
            output_root: output_root.to_path_buf(),
            author_dirs,
            copies,
            skipped,
        }
    }

    /// Materialize the plan: create the output root, one directory per
    /// author, then copy every planned file.
    ///
    /// Fails fast with [`SfoError::OutputExists`] when the output root is
    /// already present — repeated runs never merge. Pre-existing files at a
    /// destination path are overwritten (last-write-wins). Any I/O failure
    /// aborts the remaining fan-out.
    pub fn execute(&self, plan: &FanoutPlan, log: &mut JsonlWriter) -> Result<FanoutReport> {
        if plan.output_root.symlink_metadata().is_ok() {
            return Err(SfoError::OutputExists {
                path: plan.output_root.clone(),
            });
        }
        fs::create_dir(&plan.output_root)
            .map_err(|source| SfoError::io(&plan.output_root, source))?;
        log.write_entry(
            &LogEntry::new(EventType::DirCreate, Severity::Info).with_path(&plan.output_root),
        );

        for (author, dir) in &plan.author_dirs {
            fs::create_dir(dir).map_err(|source| SfoError::io(dir, source))?;
            log.write_entry(
                &LogEntry::new(EventType::DirCreate, Severity::Info)
                    .with_path(dir)
                    .with_author(author),
            );
        }

        let mut skipped = plan.skipped.clone();
        for skip in &plan.skipped {
            log.write_entry(&skip_entry(skip));
        }

        let mut copied = 0usize;
        let mut bytes_copied = 0u64;
        for copy in &plan.copies {
            // The map holds every planned author by construction; a miss is
            // still surfaced as a warning rather than a silent drop.
            if !plan.author_dirs.contains_key(&copy.author) {
                let err = SfoError::Runtime {
                    details: format!("no destination directory for author {:?}", copy.author),
                };
                let skip = SkippedFile {
                    path: copy.source.clone(),
                    error_code: err.code().to_string(),
                    reason: err.to_string(),
                };
                log.write_entry(&skip_entry(&skip));
                skipped.push(skip);
                continue;
            }

            let size = fs::copy(&copy.source, &copy.dest)
                .map_err(|source| SfoError::io(&copy.dest, source))?;
            copied += 1;
            bytes_copied += size;
            let mut entry = LogEntry::new(EventType::FileCopy, Severity::Info)
                .with_path(&copy.dest)
                .with_author(&copy.author)
                .with_details(copy.source.display().to_string());
            entry.size = Some(size);
            log.write_entry(&entry);
        }

        Ok(FanoutReport {
            output_root: plan.output_root.clone(),
            authors: plan.author_dirs.len(),
            copied,
            bytes_copied,
            skipped,
        })
    }
}

fn skip_entry(skip: &SkippedFile) -> LogEntry {
    let mut entry =
        LogEntry::new(EventType::FileSkip, Severity::Warning).with_path(&skip.path);
    entry.error_code = Some(skip.error_code.clone());
    entry.details = Some(skip.reason.clone());
    entry
}
