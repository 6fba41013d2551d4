//! Output formatting utilities

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::helpers::{escape_csv, styled_status, truncate_str};
use crate::cli::OutputFormat;
use crate::entities::{BatchReport, Gauge};

/// Determine the effective output format based on context
pub fn effective_format(format: OutputFormat, is_list: bool) -> OutputFormat {
    match format {
        OutputFormat::Auto => {
            if is_list {
                OutputFormat::Tsv
            } else {
                OutputFormat::Yaml
            }
        }
        other => other,
    }
}

/// Print any record as JSON or YAML; other formats fall back to YAML
pub fn print_structured<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value).into_diagnostic()?;
            println!("{}", json);
        }
        _ => {
            let yaml = serde_yml::to_string(value).into_diagnostic()?;
            print!("{}", yaml);
        }
    }
    Ok(())
}

/// Print a gauge listing in the requested format
pub fn print_gauges(gauges: &[Gauge], format: OutputFormat) -> Result<()> {
    match effective_format(format, true) {
        OutputFormat::Json | OutputFormat::Yaml => print_structured(&gauges, format)?,
        OutputFormat::Csv => {
            println!("id,set_id,role,spec,status,ownership,location");
            for g in gauges {
                println!(
                    "{},{},{},{},{},{},{}",
                    g.id,
                    g.set_id.as_deref().unwrap_or(""),
                    g.role.map(|r| r.to_string()).unwrap_or_default(),
                    escape_csv(&g.spec.summary()),
                    g.status,
                    g.ownership,
                    escape_csv(g.location.as_deref().unwrap_or(""))
                );
            }
        }
        OutputFormat::Id => {
            for g in gauges {
                println!("{}", g.id);
            }
        }
        OutputFormat::Md => {
            println!("| ID | Set | Role | Spec | Status | Location |");
            println!("|---|---|---|---|---|---|");
            for g in gauges {
                println!(
                    "| {} | {} | {} | {} | {} | {} |",
                    g.id,
                    g.set_id.as_deref().unwrap_or("-"),
                    g.role.map(|r| r.to_string()).unwrap_or_default(),
                    g.spec.summary(),
                    g.status,
                    g.location.as_deref().unwrap_or("-")
                );
            }
        }
        OutputFormat::Tsv | OutputFormat::Auto => {
            println!(
                "{:<18} {:<14} {:<5} {:<24} {:<20} {:<12}",
                style("ID").bold(),
                style("SET").bold(),
                style("ROLE").bold(),
                style("SPEC").bold(),
                style("STATUS").bold(),
                style("LOCATION").bold()
            );
            println!("{}", "-".repeat(98));
            for g in gauges {
                println!(
                    "{:<18} {:<14} {:<5} {:<24} {:<20} {:<12}",
                    style(&g.id).cyan(),
                    g.set_id.as_deref().unwrap_or("-"),
                    g.role.map(|r| r.to_string()).unwrap_or_default(),
                    truncate_str(&g.spec.summary(), 22),
                    styled_status(g.status),
                    g.location.as_deref().unwrap_or("-")
                );
            }
            println!();
            println!("{} gauge(s) found.", style(gauges.len()).cyan());
        }
    }
    Ok(())
}

/// Print the per-set outcome of a batch operation
pub fn print_report(report: &BatchReport, verb: &str, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json | OutputFormat::Yaml => return print_structured(report, format),
        OutputFormat::Id => {
            for outcome in report.succeeded() {
                println!("{}", outcome.set_id);
            }
            return Ok(());
        }
        _ => {}
    }

    if let Some(batch_id) = &report.batch_id {
        println!("Batch {}", style(batch_id).cyan());
    }
    for outcome in &report.outcomes {
        match &outcome.error {
            None => println!("{} {} {}", style("✓").green(), verb, style(&outcome.set_id).cyan()),
            Some(error) => println!(
                "{} {} {}: {}",
                style("✗").red(),
                style(&outcome.set_id).cyan(),
                style("failed").red(),
                error
            ),
        }
    }
    let failed = report.failed().count();
    println!(
        "{} succeeded, {} failed",
        style(report.succeeded().count()).green(),
        if failed > 0 {
            style(failed).red()
        } else {
            style(failed).dim()
        }
    );
    Ok(())
}
