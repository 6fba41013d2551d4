//! CLI module - argument parsing and command dispatch

pub mod args;
pub mod commands;
pub mod filters;
pub mod helpers;
pub mod output;

pub use args::{Cli, Commands, GlobalOpts, OutputFormat};
pub use filters::StatusFilter;

use miette::Result;

/// Dispatch a parsed command line
pub fn run(cli: Cli) -> Result<()> {
    let global = cli.global;
    match cli.command {
        Commands::Init(args) => commands::init::run(args, &global),
        Commands::Gauge(cmd) => commands::gauge::run(cmd, &global),
        Commands::Set(cmd) => commands::set::run(cmd, &global),
        Commands::Spares(args) => commands::spares::run(args, &global),
        Commands::Status(args) => commands::status::run(args, &global),
        Commands::Cal(cmd) => commands::cal::run(cmd, &global),
        Commands::Cert(cmd) => commands::cert::run(cmd, &global),
        Commands::Verify(args) => commands::verify::run(args, &global),
        Commands::Team(cmd) => cmd.run(&global),
    }
}
