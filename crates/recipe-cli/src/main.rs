//! Recipe resolver CLI
//!
//! Resolves build option requests against package recipes and prints the
//! resulting build-tool flags.

mod cli;
mod commands;
mod context;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use commands::ResolveOptions;
use context::Context;
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{}: logging unavailable: {}", "warning".yellow().bold(), e);
    }

    let Some(command) = cli.command else {
        println!("{} Recipe resolver CLI", "recipe".green().bold());
        println!();
        println!("Run {} for available commands.", "recipe --help".cyan());
        return Ok(());
    };

    let root = match cli.project {
        Some(path) => path,
        None => std::env::current_dir()?,
    };
    let context = Context::load(&root, cli.config_dir)?;
    execute_command(&context, command)
}

fn execute_command(context: &Context, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::List { json } => commands::run_list(context, json),
        Commands::Info { recipe, json } => commands::run_info(context, &recipe, json),
        Commands::Versions { recipe, json } => commands::run_versions(context, &recipe, json),
        Commands::Check(request) => commands::run_check(context, &request),
        Commands::Deps { request, json } => commands::run_deps(context, &request, json),
        Commands::Resolve {
            request,
            json,
            style,
            attrs,
            version,
        } => commands::run_resolve(
            context,
            &request,
            ResolveOptions {
                json,
                style: style.as_deref(),
                attrs: &attrs,
                version: version.as_deref(),
            },
        ),
    }
}
