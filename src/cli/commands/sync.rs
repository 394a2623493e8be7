//! Commands that edit the base file and translate entries into the targets.

use anyhow::Result;
use std::path::Path;

use super::project::Project;
use crate::input::edit_value;
use crate::sync::{SyncReport, TargetReport, TargetStatus};
use crate::translation::language_name;
use crate::ui::{Spinner, Style};

/// `add`: appends a base entry and translates it to every target.
pub async fn run_add(
    project: &Project,
    key: &str,
    value: Option<String>,
    interactive: bool,
) -> Result<()> {
    let value = match value {
        Some(value) if !interactive => value,
        value => {
            let Some(value) = edit_value(key, value.as_deref())? else {
                crate::status!("{}", Style::hint("Empty value, nothing added."));
                return Ok(());
            };
            value
        }
    };

    let mut coordinator = project.online()?;
    let report = {
        let _spinner = Spinner::new(&format!("Translating {key}..."));
        coordinator.add_new_entry(key, &value).await?
    };

    crate::status!("{} {key}", Style::success("Added"));
    print_report(&report);
    Ok(())
}

/// `update`: retranslates an entry, or replaces its base value first.
pub async fn run_update(
    project: &Project,
    key: &str,
    value: Option<String>,
    interactive: bool,
) -> Result<()> {
    let mut coordinator = project.online()?;

    let new_value = if interactive {
        let current = value.or_else(|| coordinator.base().get(key).map(str::to_string));
        let Some(value) = edit_value(key, current.as_deref())? else {
            crate::status!("{}", Style::hint("Empty value, nothing updated."));
            return Ok(());
        };
        Some(value)
    } else {
        value
    };

    let report = {
        let _spinner = Spinner::new(&format!("Translating {key}..."));
        match new_value {
            Some(value) => coordinator.update_with_replace(key, &value).await?,
            None => coordinator.translate_item_updates(&[key]).await,
        }
    };

    print_report(&report);
    Ok(())
}

/// `update-multi`: retranslates several base entries.
pub async fn run_update_multi(project: &Project, keys: &[String]) -> Result<()> {
    let mut coordinator = project.online()?;
    let report = {
        let _spinner = Spinner::new(&format!("Translating {} entries...", keys.len()));
        coordinator.translate_item_updates(keys).await
    };
    print_report(&report);
    Ok(())
}

/// `add-multi`: translates base entries as new target entries, one target at a time.
pub async fn run_add_multi(project: &Project, keys: &[String]) -> Result<()> {
    let mut coordinator = project.online()?;
    let report = {
        let _spinner = Spinner::new(&format!("Translating {} entries...", keys.len()));
        coordinator.translate_new_entries(keys).await
    };
    print_report(&report);
    Ok(())
}

/// `translate`: translates the whole base file.
pub async fn run_translate_all(project: &Project) -> Result<()> {
    let mut coordinator = project.online()?;
    let report = {
        let _spinner = Spinner::new(&format!(
            "Translating {} entries into {} targets...",
            coordinator.base().len(),
            coordinator.targets().len()
        ));
        coordinator.translate_everything().await
    };
    print_report(&report);
    Ok(())
}

/// `update-latest`: translates the last `count` base entries.
pub async fn run_update_latest(project: &Project, count: usize, dry_run: bool) -> Result<()> {
    let mut coordinator = project.online()?;
    let report = {
        let _spinner = Spinner::new(&format!("Translating the last {count} entries..."));
        coordinator.translate_latest_to_all(count, dry_run).await
    };
    print_report(&report);
    Ok(())
}

/// `sync`: fills in what each target is missing.
pub async fn run_sync(project: &Project) -> Result<()> {
    let mut coordinator = project.online()?;
    let report = {
        let _spinner = Spinner::new("Translating missing entries...");
        coordinator.translate_missing_only().await
    };
    print_report(&report);
    Ok(())
}

/// `delete`: removes entries everywhere.
pub fn run_delete(project: &Project, keys: &[String]) -> Result<()> {
    let mut coordinator = project.offline()?;
    for key in keys {
        let report = coordinator.delete_entry(key)?;
        crate::status!("{} {key}", Style::success("Deleted"));
        print_report(&report);
    }
    Ok(())
}

/// `import`: copies translations for one language from another file.
pub fn run_import(project: &Project, file: &Path, language: &str) -> Result<()> {
    let mut coordinator = project.offline()?;
    let updated = coordinator.update_translations_from_external_file(file, language)?;
    println!(
        "{} {updated} translations for {}",
        Style::success("Updated"),
        describe_language(language)
    );
    Ok(())
}

/// Prints one line per target, then a summary on stderr.
pub fn print_report(report: &SyncReport) {
    for target in &report.targets {
        print_target(target);
    }

    let failed = report.failed_count();
    if failed > 0 {
        crate::warn!(
            "{} {failed} of {} targets failed",
            Style::warning("Warning:"),
            report.targets.len()
        );
    }
}

fn print_target(target: &TargetReport) {
    let language = Style::value(&target.language);
    match &target.outcome {
        Ok(TargetStatus::Merged { added, updated }) => {
            println!("{} {language}  +{added} ~{updated}", Style::success("✓"));
        }
        Ok(TargetStatus::Removed(count)) => {
            println!("{} {language}  -{count}", Style::success("✓"));
        }
        Ok(TargetStatus::UpToDate) => {
            println!("- {language}  {}", Style::secondary("up to date"));
        }
        Ok(TargetStatus::DryRun(batch)) => {
            println!("{} {language}", Style::header("[dry run]"));
            for (key, value) in batch.iter() {
                println!("  {}: {value}", Style::label(key));
            }
        }
        Err(e) => {
            println!("{} {language}  {}", Style::error("✗"), e);
        }
    }
}

fn describe_language(identifier: &str) -> String {
    language_name(identifier).map_or_else(
        || Style::value(identifier),
        |name| format!("{} ({name})", Style::value(identifier)),
    )
}
