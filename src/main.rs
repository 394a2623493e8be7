use clap::Parser;

use stringsync::cli::commands::project::{Project, ProjectOptions};
use stringsync::cli::commands::{compare, providers, sync, targets};
use stringsync::cli::{Args, Command};
use stringsync::config::ConfigError;
use stringsync::output::{self, OutputConfig};
use stringsync::ui::Style;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    output::init(OutputConfig::from_flags(args.quiet, args.no_color));

    if let Err(e) = run(args).await {
        eprintln!("{} {e:#}", Style::error("Error:"));
        std::process::exit(exit_code(&e));
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let project = Project::load(ProjectOptions {
        project: args.project,
        provider: args.provider,
        model: args.model,
        no_cache: args.no_cache,
    })?;

    match args.command {
        Command::Add {
            key,
            value,
            interactive,
        } => sync::run_add(&project, &key, value, interactive).await,
        Command::Delete { keys } => sync::run_delete(&project, &keys),
        Command::Update {
            key,
            value,
            interactive,
        } => sync::run_update(&project, &key, value, interactive).await,
        Command::UpdateMulti { keys } => sync::run_update_multi(&project, &keys).await,
        Command::AddMulti { keys } => sync::run_add_multi(&project, &keys).await,
        Command::Translate => sync::run_translate_all(&project).await,
        Command::UpdateLatest { count, dry_run } => {
            sync::run_update_latest(&project, count, dry_run).await
        }
        Command::Compare {
            index,
            against,
            output,
        } => match (index, against) {
            (_, Some(other)) => compare::run_compare_file(&project, &other, &output),
            (Some(index), None) => compare::run_compare_target(&project, index, &output),
            (None, None) => anyhow::bail!("compare needs a target index or --against <FILE>"),
        },
        Command::Sync => sync::run_sync(&project).await,
        Command::Import { file, lang } => sync::run_import(&project, &file, &lang),
        Command::Targets => targets::print_targets(&project),
        Command::Providers { provider } => {
            providers::print_providers(project.config(), provider.as_deref())
        }
    }
}

/// Maps a fatal error to a sysexits code.
fn exit_code(err: &anyhow::Error) -> exitcode::ExitCode {
    for cause in err.chain() {
        if cause.is::<ConfigError>() {
            return exitcode::CONFIG;
        }
        if let Some(e) = cause.downcast_ref::<stringsync::Error>() {
            return match e {
                stringsync::Error::Parse { .. }
                | stringsync::Error::KeyNotFound(_)
                | stringsync::Error::DuplicateKey(_)
                | stringsync::Error::LanguageNotFound(_)
                | stringsync::Error::TargetIndex { .. } => exitcode::DATAERR,
                _ => exitcode::SOFTWARE,
            };
        }
    }
    exitcode::SOFTWARE
}
