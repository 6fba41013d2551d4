//! `gtt status` command - show or change a gauge's status

use console::style;
use miette::Result;

use crate::cli::helpers::{open_tracker, styled_status, to_diagnostic};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{allowed_transitions, moves_whole_set, TransitionContext};
use crate::entities::GaugeStatus;

#[derive(clap::Args, Debug)]
pub struct StatusArgs {
    /// Gauge ID
    pub gauge: String,

    /// New status (e.g., checked-out, pending-qc); omit to show the current one
    pub state: Option<GaugeStatus>,

    /// Reason recorded in the status history
    #[arg(long, short = 'r')]
    pub reason: Option<String>,

    /// Location to record with the change (required when releasing)
    #[arg(long, short = 'l')]
    pub location: Option<String>,
}

pub fn run(args: StatusArgs, global: &GlobalOpts) -> Result<()> {
    let (mut tracker, actor) = open_tracker(global)?;

    let Some(target) = args.state else {
        let gauge = tracker.get_gauge(&args.gauge).map_err(to_diagnostic)?;
        if global.output == OutputFormat::Id {
            println!("{}", gauge.status);
            return Ok(());
        }
        println!("{}: {}", style(&gauge.id).cyan(), styled_status(gauge.status));
        let next = allowed_transitions(gauge.status);
        if next.is_empty() {
            println!("   {}", style("no further transitions").dim());
        } else {
            let names: Vec<&str> = next.iter().map(GaugeStatus::as_str).collect();
            println!("   next: {}", style(names.join(", ")).dim());
        }
        return Ok(());
    };

    let from = tracker.get_gauge(&args.gauge).map_err(to_diagnostic)?.status;
    let ctx = TransitionContext {
        reason: args.reason,
        location: args.location,
    };
    let status = tracker
        .transition(&args.gauge, target, &actor, &ctx)
        .map_err(to_diagnostic)?;

    println!(
        "{} {} is now {}",
        style("✓").green(),
        style(&args.gauge).cyan(),
        styled_status(status)
    );
    if moves_whole_set(from, target) {
        if let Some(companion) = tracker.companion_of(&args.gauge).map_err(to_diagnostic)? {
            println!("   companion {} went with it", style(&companion.id).cyan());
        }
    }
    Ok(())
}
