//! `gtt cal` command - the calibration workflow
//!
//! Sets go out to the vendor, come back, get a certificate per member, and are
//! released to a location. Every multi-set command reports per set; one set
//! failing never stops the others.

use chrono::NaiveDate;
use clap::Subcommand;
use console::style;
use miette::{bail, IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::helpers::{ids_or_stdin, open_tracker, styled_status, to_diagnostic};
use crate::cli::output::{print_report, print_structured};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{GaugeTracker, UploadRequest};
use crate::entities::{BatchReport, BatchStage};

#[derive(Subcommand, Debug)]
pub enum CalCommands {
    /// Send sets out for calibration as one batch
    Send(SendArgs),

    /// Record sets coming back from the vendor
    Receive(ReceiveArgs),

    /// Upload a calibration certificate for a gauge
    Upload(UploadArgs),

    /// Release fully certified sets to a location
    Release(ReleaseArgs),

    /// Send pending-release sets back to waiting for certificates
    Cancel(CancelArgs),

    /// Show batch progress, or list batches
    Batch(BatchArgs),
}

#[derive(clap::Args, Debug)]
pub struct SendArgs {
    /// Set IDs (reads from stdin if omitted)
    pub sets: Vec<String>,

    /// Calibration vendor
    #[arg(long)]
    pub vendor: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ReceiveArgs {
    /// Set IDs (reads from stdin if omitted)
    pub sets: Vec<String>,

    /// Receive every set of this batch still out at the vendor
    #[arg(long, short = 'b', conflicts_with = "sets")]
    pub batch: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct UploadArgs {
    /// Gauge ID
    pub gauge: String,

    /// Certificate file
    pub file: PathBuf,

    /// Last day the calibration is valid (YYYY-MM-DD); defaults from config
    #[arg(long)]
    pub valid_until: Option<NaiveDate>,
}

#[derive(clap::Args, Debug)]
pub struct ReleaseArgs {
    /// Set IDs (reads from stdin if omitted)
    pub sets: Vec<String>,

    /// Release every certified set of this batch
    #[arg(long, short = 'b', conflicts_with = "sets")]
    pub batch: Option<String>,

    /// Where the released sets go
    #[arg(long, short = 'l')]
    pub location: String,
}

#[derive(clap::Args, Debug)]
pub struct CancelArgs {
    /// Set IDs (reads from stdin if omitted)
    pub sets: Vec<String>,

    #[arg(long, short = 'r')]
    pub reason: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct BatchArgs {
    /// Batch ID; lists all batches when omitted
    pub id: Option<String>,
}

pub fn run(cmd: CalCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        CalCommands::Send(args) => run_send(args, global),
        CalCommands::Receive(args) => run_receive(args, global),
        CalCommands::Upload(args) => run_upload(args, global),
        CalCommands::Release(args) => run_release(args, global),
        CalCommands::Cancel(args) => run_cancel(args, global),
        CalCommands::Batch(args) => run_batch(args, global),
    }
}

/// Sets named on the command line, by batch, or on stdin
fn select_sets(
    tracker: &mut GaugeTracker,
    sets: &[String],
    batch: Option<&str>,
    stage: BatchStage,
) -> Result<Vec<String>> {
    match batch {
        Some(batch_id) => {
            let ids = tracker
                .batch_sets_at(batch_id, stage)
                .map_err(to_diagnostic)?;
            if ids.is_empty() {
                bail!("no sets of batch {} are at stage {}", batch_id, stage);
            }
            Ok(ids)
        }
        None => ids_or_stdin(sets, "set IDs"),
    }
}

/// Print the report and turn any per-set failure into a non-zero exit
fn finish(report: &BatchReport, verb: &str, global: &GlobalOpts) -> Result<()> {
    print_report(report, verb, global.output)?;
    let failed = report.failed().count();
    if failed > 0 {
        bail!("{} of {} set(s) failed", failed, report.outcomes.len());
    }
    Ok(())
}

fn run_send(args: SendArgs, global: &GlobalOpts) -> Result<()> {
    let (mut tracker, actor) = open_tracker(global)?;
    let sets = ids_or_stdin(&args.sets, "set IDs")?;
    let report = tracker
        .send_to_calibration(&sets, args.vendor.as_deref(), &actor)
        .map_err(to_diagnostic)?;
    finish(&report, "Sent", global)
}

fn run_receive(args: ReceiveArgs, global: &GlobalOpts) -> Result<()> {
    let (mut tracker, actor) = open_tracker(global)?;
    let sets = select_sets(&mut tracker, &args.sets, args.batch.as_deref(), BatchStage::Sent)?;
    let report = tracker
        .receive_from_calibration(&sets, &actor)
        .map_err(to_diagnostic)?;
    finish(&report, "Received", global)
}

fn run_upload(args: UploadArgs, global: &GlobalOpts) -> Result<()> {
    let content = std::fs::read(&args.file).into_diagnostic()?;
    let file_name = args
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let (mut tracker, actor) = open_tracker(global)?;
    let outcome = tracker
        .upload_certificate(
            &UploadRequest {
                gauge_id: args.gauge.clone(),
                file_name,
                content,
                valid_until: args.valid_until,
            },
            &actor,
        )
        .map_err(to_diagnostic)?;

    match global.output {
        OutputFormat::Id => {
            println!("{}", outcome.certificate.id);
            return Ok(());
        }
        OutputFormat::Json | OutputFormat::Yaml => return print_structured(&outcome, global.output),
        _ => {}
    }

    println!(
        "{} Uploaded certificate {} for {} (valid until {})",
        style("✓").green(),
        style(&outcome.certificate.id).cyan(),
        args.gauge,
        outcome.certificate.valid_until
    );
    if let Some(previous) = &outcome.certificate.supersedes {
        println!("   supersedes {}", style(previous).dim());
    }
    if outcome.advanced {
        println!(
            "   set {} is {}",
            style(outcome.set_id.as_deref().unwrap_or("-")).cyan(),
            styled_status(outcome.status)
        );
    } else if let Some(waiting) = &outcome.waiting_on {
        println!("   waiting on a certificate for {}", style(waiting).yellow());
    }
    Ok(())
}

fn run_release(args: ReleaseArgs, global: &GlobalOpts) -> Result<()> {
    let (mut tracker, actor) = open_tracker(global)?;
    let sets = select_sets(
        &mut tracker,
        &args.sets,
        args.batch.as_deref(),
        BatchStage::Certified,
    )?;
    let report = tracker
        .release(&sets, &args.location, &actor)
        .map_err(to_diagnostic)?;
    finish(&report, "Released", global)
}

fn run_cancel(args: CancelArgs, global: &GlobalOpts) -> Result<()> {
    let (mut tracker, actor) = open_tracker(global)?;
    let sets = ids_or_stdin(&args.sets, "set IDs")?;
    let report = tracker
        .cancel_back(&sets, args.reason.as_deref(), &actor)
        .map_err(to_diagnostic)?;
    finish(&report, "Cancelled", global)
}

fn run_batch(args: BatchArgs, global: &GlobalOpts) -> Result<()> {
    let (mut tracker, _) = open_tracker(global)?;

    let ids = match args.id {
        Some(id) => vec![id],
        None => tracker.batch_ids().map_err(to_diagnostic)?,
    };
    let statuses = ids
        .iter()
        .map(|id| tracker.batch_status(id))
        .collect::<crate::core::Result<Vec<_>>>()
        .map_err(to_diagnostic)?;

    match global.output {
        OutputFormat::Json | OutputFormat::Yaml => return print_structured(&statuses, global.output),
        OutputFormat::Id => {
            for status in &statuses {
                println!("{}", status.batch_id);
            }
            return Ok(());
        }
        _ => {}
    }
    if statuses.is_empty() {
        println!("No calibration batches.");
        return Ok(());
    }

    println!(
        "{:<28} {:>5} {:>5} {:>9} {:>10} {:>9}",
        style("BATCH").bold(),
        style("SETS").bold(),
        style("SENT").bold(),
        style("RECEIVED").bold(),
        style("CERTIFIED").bold(),
        style("RELEASED").bold()
    );
    for status in &statuses {
        let id = if status.is_complete() {
            style(status.batch_id.as_str()).green()
        } else {
            style(status.batch_id.as_str()).cyan()
        };
        println!(
            "{:<28} {:>5} {:>5} {:>9} {:>10} {:>9}",
            id,
            status.total_sets,
            status.sent,
            status.received,
            status.certified,
            status.released
        );
    }
    Ok(())
}
