//! `gtt spares` command - compatible spare lookup

use console::style;
use miette::Result;

use crate::cli::helpers::{open_tracker, to_diagnostic};
use crate::cli::output::print_gauges;
use crate::cli::GlobalOpts;

#[derive(clap::Args, Debug)]
pub struct SparesArgs {
    /// Gauge to find a partner for
    pub gauge: String,
}

pub fn run(args: SparesArgs, global: &GlobalOpts) -> Result<()> {
    let (mut tracker, _) = open_tracker(global)?;
    let spares = tracker
        .find_compatible_spares(&args.gauge)
        .map_err(to_diagnostic)?;

    if spares.is_empty() {
        println!(
            "No compatible spares for {}.",
            style(&args.gauge).cyan()
        );
        return Ok(());
    }
    print_gauges(&spares, global.output)
}
