//! `gtt cert` command - certificate history, retrieval, and due dates

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;

use crate::cli::helpers::{open_tracker, styled_status, to_diagnostic, truncate_str};
use crate::cli::output::{effective_format, print_structured};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(Subcommand, Debug)]
pub enum CertCommands {
    /// List every certificate recorded for a gauge, newest first
    History(HistoryArgs),

    /// Show a certificate record, optionally saving its file
    Show(ShowArgs),

    /// List gauges whose calibration is expired or expiring soon
    Due(DueArgs),
}

#[derive(clap::Args, Debug)]
pub struct HistoryArgs {
    /// Gauge ID
    pub gauge: String,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Certificate ID
    pub id: String,

    /// Write the certificate file to this path ("-" for stdout)
    #[arg(long)]
    pub save: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct DueArgs {
    /// Days ahead to look; defaults to the configured warning window
    #[arg(long, short = 'w')]
    pub within: Option<i64>,
}

pub fn run(cmd: CertCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        CertCommands::History(args) => run_history(args, global),
        CertCommands::Show(args) => run_show(args, global),
        CertCommands::Due(args) => run_due(args, global),
    }
}

fn run_history(args: HistoryArgs, global: &GlobalOpts) -> Result<()> {
    let (mut tracker, _) = open_tracker(global)?;
    let certificates = tracker
        .certificate_history(&args.gauge)
        .map_err(to_diagnostic)?;

    match effective_format(global.output, true) {
        OutputFormat::Json | OutputFormat::Yaml => {
            return print_structured(&certificates, global.output)
        }
        OutputFormat::Id => {
            for cert in &certificates {
                println!("{}", cert.id);
            }
            return Ok(());
        }
        _ => {}
    }
    if certificates.is_empty() {
        println!("No certificates for {}.", style(&args.gauge).cyan());
        return Ok(());
    }

    println!(
        "{:<28} {:<12} {:<17} {:<12} {}",
        style("CERTIFICATE").bold(),
        style("VALID UNTIL").bold(),
        style("UPLOADED").bold(),
        style("BY").bold(),
        style("FILE").bold()
    );
    for cert in &certificates {
        let id = if cert.is_current {
            style(cert.id.as_str()).green()
        } else {
            style(cert.id.as_str()).dim()
        };
        println!(
            "{:<28} {:<12} {:<17} {:<12} {}",
            id,
            cert.valid_until,
            cert.uploaded_at.format("%Y-%m-%d %H:%M"),
            truncate_str(&cert.uploaded_by, 12),
            cert.file_name
        );
    }
    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let (mut tracker, _) = open_tracker(global)?;
    let (cert, mut content) = tracker.open_certificate(&args.id).map_err(to_diagnostic)?;

    match args.save {
        Some(path) if path.as_os_str() == "-" => {
            io::copy(&mut content, &mut io::stdout().lock()).into_diagnostic()?;
        }
        Some(path) => {
            let mut file = File::create(&path).into_diagnostic()?;
            let bytes = io::copy(&mut content, &mut file).into_diagnostic()?;
            eprintln!(
                "{} Saved {} ({} bytes) to {}",
                style("✓").green(),
                cert.file_name,
                bytes,
                path.display()
            );
        }
        None => print_structured(&cert, effective_format(global.output, false))?,
    }
    Ok(())
}

fn run_due(args: DueArgs, global: &GlobalOpts) -> Result<()> {
    let (mut tracker, _) = open_tracker(global)?;
    let due = tracker
        .due_for_calibration(args.within)
        .map_err(to_diagnostic)?;

    match effective_format(global.output, true) {
        OutputFormat::Json | OutputFormat::Yaml => return print_structured(&due, global.output),
        OutputFormat::Id => {
            for entry in &due {
                println!("{}", entry.gauge.id);
            }
            return Ok(());
        }
        _ => {}
    }
    if due.is_empty() {
        println!("Nothing due for calibration.");
        return Ok(());
    }

    println!(
        "{:<18} {:<14} {:<20} {:<12} {}",
        style("GAUGE").bold(),
        style("SET").bold(),
        style("STATUS").bold(),
        style("VALID UNTIL").bold(),
        style("DAYS").bold()
    );
    for entry in &due {
        let valid_until = entry
            .certificate
            .as_ref()
            .map(|c| c.valid_until.to_string())
            .unwrap_or_else(|| "-".to_string());
        let days = match entry.days_remaining {
            Some(d) if d < 0 => style(format!("{} (expired)", d)).red(),
            Some(d) => style(d.to_string()).yellow(),
            None => style("no certificate".to_string()).red(),
        };
        println!(
            "{:<18} {:<14} {:<20} {:<12} {}",
            style(&entry.gauge.id).cyan(),
            entry.gauge.set_id.as_deref().unwrap_or("-"),
            styled_status(entry.gauge.status),
            valid_until,
            days
        );
    }
    println!();
    println!("{} gauge(s) due.", style(due.len()).cyan());
    Ok(())
}
