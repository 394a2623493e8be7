use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::paths::PROJECT_FILE;

#[derive(Parser, Debug)]
#[command(name = "stringsync")]
#[command(about = "Keep localized strings.xml files in sync with AI translation")]
#[command(version)]
pub struct Args {
    /// Project file listing the base and target documents
    #[arg(long, global = true, default_value = PROJECT_FILE, value_name = "FILE")]
    pub project: PathBuf,

    /// Provider name (overrides the configured default)
    #[arg(short = 'p', long, global = true)]
    pub provider: Option<String>,

    /// Model name (overrides the configured default)
    #[arg(short = 'm', long, global = true)]
    pub model: Option<String>,

    /// Disable the translation cache
    #[arg(short = 'n', long, global = true)]
    pub no_cache: bool,

    /// Only print results and errors
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new entry to the base file and translate it to every target
    Add {
        key: String,
        /// Value of the entry (opens $EDITOR when omitted)
        value: Option<String>,
        /// Enter the value in $EDITOR
        #[arg(short = 'i', long)]
        interactive: bool,
    },
    /// Delete entries from the base file and every target
    #[command(visible_alias = "remove")]
    Delete {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Retranslate an entry, or replace its base value and retranslate it
    Update {
        key: String,
        /// New base value
        value: Option<String>,
        /// Enter the new value in $EDITOR
        #[arg(short = 'i', long)]
        interactive: bool,
    },
    /// Retranslate several base entries into every target
    #[command(alias = "update_multi")]
    UpdateMulti {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Translate several base entries as new entries of every target
    #[command(alias = "add_multi")]
    AddMulti {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Translate the whole base file into every target
    Translate,
    /// Translate the most recently appended base entries into every target
    #[command(alias = "update_latest")]
    UpdateLatest {
        /// Number of entries, counted from the end of the base file
        count: usize,
        /// Print the translations instead of writing them
        #[arg(long)]
        dry_run: bool,
    },
    /// Write the base entries a target is missing to a report file
    Compare {
        /// Position of the target in the project file (starting at 0)
        #[arg(required_unless_present = "against")]
        index: Option<usize>,
        /// Compare the base file against another strings.xml instead
        #[arg(long, conflicts_with = "index", value_name = "FILE")]
        against: Option<PathBuf>,
        /// Report file
        #[arg(short = 'o', long, default_value = "compare_temp.txt")]
        output: PathBuf,
    },
    /// Translate only the entries each target is missing
    #[command(alias = "sync_missing")]
    Sync,
    /// Copy translations from another strings.xml into a target
    Import {
        file: PathBuf,
        /// Language identifier of the target (its directory name)
        #[arg(short = 'l', long)]
        lang: String,
    },
    /// List the configured targets
    Targets,
    /// List configured providers
    Providers {
        /// Show details of one provider
        provider: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_underscore_aliases() {
        let args = Args::try_parse_from(["stringsync", "update_latest", "3", "--dry-run"]);
        assert!(matches!(
            args.map(|args| args.command),
            Ok(Command::UpdateLatest {
                count: 3,
                dry_run: true
            })
        ));

        let args = Args::try_parse_from(["stringsync", "sync_missing"]);
        assert!(matches!(args.map(|args| args.command), Ok(Command::Sync)));
    }

    #[test]
    fn test_remove_alias_and_global_flags() {
        let args = Args::try_parse_from(["stringsync", "remove", "a", "b", "-q"]);
        let Ok(args) = args else {
            panic!("expected arguments to parse");
        };
        assert!(args.quiet);
        assert!(matches!(args.command, Command::Delete { keys } if keys == ["a", "b"]));
    }

    #[test]
    fn test_compare_needs_index_or_file() {
        assert!(Args::try_parse_from(["stringsync", "compare"]).is_err());
        assert!(Args::try_parse_from(["stringsync", "compare", "1", "--against", "x.xml"]).is_err());
        assert!(Args::try_parse_from(["stringsync", "compare", "--against", "x.xml"]).is_ok());
    }
}
