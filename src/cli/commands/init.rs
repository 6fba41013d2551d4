//! `gtt init` command - create a gauge tracking project

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::helpers::to_diagnostic;
use crate::cli::GlobalOpts;
use crate::core::{GaugeTracker, Project};

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg()]
    pub path: Option<PathBuf>,
}

pub fn run(args: InitArgs, _global: &GlobalOpts) -> Result<()> {
    let root = match args.path {
        Some(path) => path,
        None => std::env::current_dir().into_diagnostic()?,
    };
    std::fs::create_dir_all(&root).into_diagnostic()?;

    let project = Project::init(&root).into_diagnostic()?;
    // Opening creates the database and schema
    GaugeTracker::open(&project).map_err(to_diagnostic)?;

    println!(
        "{} Initialized gauge tracking project at {}",
        style("✓").green(),
        style(project.root().display()).cyan()
    );
    println!("  Config:   {}", project.gtt_dir().join("config.yaml").display());
    println!(
        "  Next:     {}",
        style("gtt set create --category UN --size .250-20 --class 2A --location A1").dim()
    );
    Ok(())
}
