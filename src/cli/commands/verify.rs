//! `gtt verify` command - data-integrity scan

use console::style;
use miette::{bail, Result};

use crate::cli::helpers::{open_tracker, to_diagnostic};
use crate::cli::output::print_structured;
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(clap::Args, Debug)]
pub struct VerifyArgs {
    /// Also show audit entries awaiting review
    #[arg(long)]
    pub audit: bool,
}

pub fn run(args: VerifyArgs, global: &GlobalOpts) -> Result<()> {
    let (mut tracker, _) = open_tracker(global)?;
    let issues = tracker.verify_integrity().map_err(to_diagnostic)?;

    if matches!(global.output, OutputFormat::Json | OutputFormat::Yaml) {
        print_structured(&issues, global.output)?;
    } else if issues.is_empty() {
        println!("{} No integrity violations found", style("✓").green());
    } else {
        for issue in &issues {
            println!(
                "{} {}: {}",
                style("✗").red(),
                style(&issue.subject).cyan(),
                issue.message
            );
        }
    }

    if args.audit {
        let entries = tracker.audit_log().map_err(to_diagnostic)?;
        println!();
        println!("{}", style("Audit entries needing review").bold());
        if entries.is_empty() {
            println!("   {}", style("none").dim());
        }
        for entry in &entries {
            println!(
                "{} [{}] {}: {}",
                entry.timestamp.format("%Y-%m-%d %H:%M"),
                entry.category,
                style(&entry.subject).cyan(),
                entry.message
            );
        }
    }

    if !issues.is_empty() {
        bail!("{} integrity violation(s) found", issues.len());
    }
    Ok(())
}
