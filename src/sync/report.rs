use std::io::{self, Write};
use std::path::PathBuf;

use crate::error::Result;
use crate::resource::ResourceSet;

/// What happened to one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetStatus {
    /// The batch was merged and the document written.
    Merged { added: usize, updated: usize },
    /// Entries were removed and the document written.
    Removed(usize),
    /// Nothing needed to change.
    UpToDate,
    /// The translated batch, not applied.
    DryRun(ResourceSet),
}

/// Outcome of an operation for a single target.
#[derive(Debug)]
pub struct TargetReport {
    pub language: String,
    pub location: Option<PathBuf>,
    pub outcome: Result<TargetStatus>,
}

impl TargetReport {
    pub const fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Per-target outcomes of a fan-out operation, in target order.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub targets: Vec<TargetReport>,
}

impl SyncReport {
    pub fn failures(&self) -> impl Iterator<Item = &TargetReport> {
        self.targets.iter().filter(|report| !report.is_success())
    }

    pub fn failed_count(&self) -> usize {
        self.failures().count()
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Writes the entries found in one document but not another.
///
/// ```text
/// Entries in first file but not in second:
///   key: value
/// ```
pub fn write_compare_report(entries: &ResourceSet, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Entries in first file but not in second:")?;
    for (key, value) in entries.iter() {
        writeln!(out, "  {key}: {value}")?;
    }
    Ok(())
}
