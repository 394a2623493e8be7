//! Provider listing command handler.

use anyhow::Result;

use crate::config::{ConfigError, ConfigFile};
use crate::ui::Style;

/// Prints configured providers to stdout.
///
/// If `specific_provider` is provided, shows detailed information for that provider.
/// Otherwise, lists all configured providers with their endpoints and models.
pub fn print_providers(config: &ConfigFile, specific_provider: Option<&str>) -> Result<()> {
    if config.providers.is_empty() {
        println!("No providers configured.");
        println!(
            "{}",
            Style::hint("Add a [providers.<name>] section to stringsync.toml")
        );
        return Ok(());
    }

    let default_provider = config.stringsync.provider.as_deref();
    let marker = |name: &str| {
        if default_provider == Some(name) {
            format!(" {}", Style::default_marker())
        } else {
            String::new()
        }
    };

    if let Some(provider_name) = specific_provider {
        let provider = config.providers.get(provider_name).ok_or_else(|| {
            ConfigError::new(format!("Provider '{provider_name}' not found"))
        })?;

        println!(
            "{} {}{}",
            Style::header("Provider:"),
            Style::value(provider_name),
            marker(provider_name)
        );
        println!("  {} = {}", Style::label("endpoint"), provider.endpoint);
        if provider.requires_api_key() {
            let state = if provider.get_api_key().is_some() {
                Style::success("(set)")
            } else {
                Style::warning("(not set)")
            };
            println!("  {}  = {state}", Style::label("api_key"));
        }
        if provider.models.is_empty() {
            println!("  {}   = (none configured)", Style::label("models"));
        } else {
            println!("  {}:", Style::label("models"));
            for model in &provider.models {
                println!("    - {model}");
            }
        }
    } else {
        println!("{}\n", Style::header("Configured providers:"));
        let mut names: Vec<_> = config.providers.keys().collect();
        names.sort();
        for name in names {
            let provider = &config.providers[name];
            println!("  {}{}", Style::value(name), marker(name));
            println!("    {} {}", Style::label("endpoint:"), provider.endpoint);
            if !provider.models.is_empty() {
                println!("    {} {}", Style::label("models:"), provider.models.join(", "));
            }
        }
    }

    Ok(())
}
