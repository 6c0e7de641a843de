use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;

use cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so command output stays pipeable
    let directive = if cli.verbose {
        "romreloc=debug"
    } else {
        "romreloc=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive.parse()?))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Compare {
            vanilla,
            patched,
            report,
            table,
            lua,
            mode,
            catalog,
            config,
            no_deep_scan,
        } => commands::compare::run(commands::compare::CompareArgs {
            vanilla,
            patched,
            report,
            table,
            lua,
            mode,
            catalog,
            config,
            no_deep_scan,
        }),
        Command::Diff {
            vanilla,
            patched,
            limit,
        } => commands::diff::run(&vanilla, &patched, limit),
        Command::Inspect {
            rom,
            catalog,
            address,
            top,
        } => commands::inspect::run(&rom, catalog.as_deref(), &address, top),
        Command::Catalog { output } => commands::catalog::run(output.as_deref()),
        Command::Lookup {
            table,
            name,
            mode,
            report,
        } => commands::lookup::run(&table, &name, mode, report),
    }
}
