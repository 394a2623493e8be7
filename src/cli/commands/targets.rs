//! Target listing command handler.

use anyhow::Result;

use super::project::Project;
use crate::resource::diff;
use crate::translation::language_name;
use crate::ui::Style;

/// Prints every configured target with its entry and missing counts.
pub fn print_targets(project: &Project) -> Result<()> {
    let coordinator = project.offline()?;
    let base = coordinator.base().snapshot();

    println!(
        "{} {} ({} entries)\n",
        Style::header("Base:"),
        coordinator
            .base()
            .location()
            .map_or_else(String::new, |path| path.display().to_string()),
        base.len()
    );

    if coordinator.targets().is_empty() {
        println!("No targets configured.");
        return Ok(());
    }

    println!("{}", Style::header("Targets:"));
    for (index, target) in coordinator.targets().iter().enumerate() {
        let entries = target.document().snapshot();
        let missing = diff(&base, &entries).missing.len();
        let name = language_name(target.language())
            .map(|name| format!(" {}", Style::secondary(format!("({name})"))))
            .unwrap_or_default();

        println!(
            "  {index}  {}{name}  {} entries, {} missing",
            Style::value(target.language()),
            entries.len(),
            missing
        );
        if let Some(location) = target.document().location() {
            println!("     {}", Style::secondary(location.display()));
        }
    }

    Ok(())
}
