use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::project::Project;
use crate::resource::{Document, ResourceSet, differing};
use crate::sync::write_compare_report;
use crate::ui::Style;

/// `compare <index>`: base entries missing from the target at `index`.
pub fn run_compare_target(project: &Project, index: usize, output: &Path) -> Result<()> {
    let coordinator = project.offline()?;
    let missing = coordinator.compare_base_to_target(index)?;
    write_report(&missing, output)
}

/// `compare --against <file>`: base entries absent from, or different in, `other`.
pub fn run_compare_file(project: &Project, other: &Path, output: &Path) -> Result<()> {
    let (base, _) = project.documents()?;
    let other = Document::load(other)?;
    write_report(&differing(&base.snapshot(), &other.snapshot()), output)
}

fn write_report(entries: &ResourceSet, output: &Path) -> Result<()> {
    let file = File::create(output)
        .with_context(|| format!("Failed to create report file: {}", output.display()))?;
    let mut writer = BufWriter::new(file);
    write_compare_report(entries, &mut writer)
        .and_then(|()| writer.flush())
        .with_context(|| format!("Failed to write report file: {}", output.display()))?;

    println!(
        "{} entries written to {}",
        entries.len(),
        Style::secondary(output.display())
    );
    Ok(())
}
