use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use log::{LevelFilter, debug};
use pillartool::{
    args::ArgBag,
    components::ComponentKind,
    config::{Overrides, ToolConfig},
    ctx::AppContext,
    lifecycle::{Outcome, Report, run_components},
    pillarcfg::PillarStore,
};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Tool configuration file [default: .pillartool.toml]
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Reference schema file (YAML or JSON)
    #[arg(long, global = true)]
    schema: Option<PathBuf>,
    /// Directory receiving the pillar files
    #[arg(long, global = true)]
    pillar_dir: Option<PathBuf>,
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: SubCommands,
}

#[derive(Subcommand, Debug)]
enum SubCommands {
    /// Build, validate and save pillars
    Apply(ComponentArgs),
    /// Build and validate pillars without writing them
    Check(ComponentArgs),
    /// Print a saved pillar
    Show {
        #[arg(value_enum)]
        component: ComponentKind,
    },
}

#[derive(Args, Debug)]
struct ComponentArgs {
    /// Components to process
    #[arg(value_enum, required = true)]
    components: Vec<ComponentKind>,
    /// Component input as `component.key=value`
    #[arg(short, long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .init();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let ctx = ToolConfig::load(cli.config.as_deref())?.resolve(Overrides {
        schema: cli.schema,
        pillar_dir: cli.pillar_dir,
    });
    debug!("context: {ctx:?}");

    match cli.command {
        SubCommands::Apply(args) => process(&ctx, args, false).await,
        SubCommands::Check(args) => process(&ctx, args, true).await,
        SubCommands::Show { component } => {
            let path = ctx.paths.pillar_path(component.name());
            let record = PillarStore::load(&path)?;
            print!("{}", PillarStore::render(&record)?);
            Ok(true)
        }
    }
}

async fn process(ctx: &AppContext, args: ComponentArgs, dry_run: bool) -> anyhow::Result<bool> {
    let schema = Arc::new(ctx.load_schema()?);
    let bag = Arc::new(ArgBag::from_pairs(&args.set).context("Invalid --set value")?);

    let reports = run_components(&args.components, ctx, bag, schema, dry_run).await?;

    let mut all_ok = true;
    for report in &reports {
        all_ok &= print_report(report);
    }
    Ok(all_ok)
}

fn print_report(report: &Report) -> bool {
    let name = report.kind.name().bold();
    let outcome = match &report.result {
        Ok(outcome) => outcome,
        Err(e) => {
            println!("{name}: {}", e.to_string().red());
            return false;
        }
    };

    match outcome {
        Outcome::Saved(path) => {
            println!("{name}: {} {}", "saved".green(), path.display());
        }
        Outcome::Valid => println!("{name}: {}", "valid".green()),
        Outcome::InsufficientInputs => {
            println!("{name}: {}", "insufficient inputs".yellow());
        }
        Outcome::Invalid(validation) => {
            println!(
                "{name}: {}",
                format!("{} validation error(s)", validation.len()).red()
            );
            for err in validation {
                println!("  - {err}");
            }
        }
    }
    outcome.is_success()
}
