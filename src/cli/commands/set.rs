//! `gtt set` command - GO/NOGO thread gauge sets

use clap::Subcommand;
use console::style;
use dialoguer::Confirm;
use miette::{IntoDiagnostic, Result};

use crate::cli::commands::gauge::CliOwnership;
use crate::cli::filters::StatusFilter;
use crate::cli::helpers::{open_tracker, styled_status, to_diagnostic, truncate_str};
use crate::cli::output::{effective_format, print_structured};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::NewSet;
use crate::entities::{GaugeSet, GaugeSpec, ThreadSpec};

#[derive(Subcommand, Debug)]
pub enum SetCommands {
    /// Receive a new GO/NOGO pair as a set
    Create(CreateArgs),

    /// Pair two compatible spares into a set
    Pair(PairArgs),

    /// Break a set back into spares
    Unpair(UnpairArgs),

    /// Swap one member of a set for a compatible spare
    Replace(ReplaceArgs),

    /// Show a set and both of its members
    Show(ShowArgs),

    /// Show membership events for a set or gauge
    History(HistoryArgs),

    /// List sets
    List(ListArgs),
}

#[derive(clap::Args, Debug)]
pub struct CreateArgs {
    /// Category code (e.g., UN)
    #[arg(long, short = 'c')]
    pub category: String,

    /// Thread size (e.g., ".250-20")
    #[arg(long)]
    pub size: String,

    /// Thread class (e.g., "2A")
    #[arg(long)]
    pub class: String,

    #[arg(long, default_value = "UN")]
    pub form: String,

    /// Class of the NOGO member when it differs from the GO member
    #[arg(long)]
    pub nogo_class: Option<String>,

    /// Current location
    #[arg(long, short = 'l')]
    pub location: String,

    #[arg(long, value_enum, default_value = "company")]
    pub ownership: CliOwnership,
}

#[derive(clap::Args, Debug)]
pub struct PairArgs {
    /// First spare gauge ID
    pub gauge_a: String,

    /// Second spare gauge ID
    pub gauge_b: String,

    /// Location of the new set
    #[arg(long, short = 'l')]
    pub location: String,
}

#[derive(clap::Args, Debug)]
pub struct UnpairArgs {
    /// Set ID
    pub set_id: String,

    /// Why the set is being broken up
    #[arg(long, short = 'r')]
    pub reason: String,

    /// Skip confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(clap::Args, Debug)]
pub struct ReplaceArgs {
    /// Set ID
    pub set_id: String,

    /// Member leaving the set
    #[arg(long = "out")]
    pub outgoing: String,

    /// Spare joining the set
    #[arg(long = "in")]
    pub incoming: String,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Set ID
    pub set_id: String,
}

#[derive(clap::Args, Debug)]
pub struct HistoryArgs {
    /// Set ID or gauge ID
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only sets whose members both match this status
    #[arg(long, short = 's', value_enum, default_value = "active")]
    pub status: StatusFilter,

    /// Show count only
    #[arg(long)]
    pub count: bool,
}

pub fn run(cmd: SetCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        SetCommands::Create(args) => run_create(args, global),
        SetCommands::Pair(args) => run_pair(args, global),
        SetCommands::Unpair(args) => run_unpair(args, global),
        SetCommands::Replace(args) => run_replace(args, global),
        SetCommands::Show(args) => run_show(args, global),
        SetCommands::History(args) => run_history(args, global),
        SetCommands::List(args) => run_list(args, global),
    }
}

fn print_set_created(set: &GaugeSet, verb: &str, global: &GlobalOpts) -> Result<()> {
    match global.output {
        OutputFormat::Id => println!("{}", set.set_id),
        OutputFormat::Json | OutputFormat::Yaml => print_structured(set, global.output)?,
        _ => {
            println!(
                "{} {} set {}",
                style("✓").green(),
                verb,
                style(&set.set_id).cyan()
            );
            println!("   GO:   {}", set.go.id);
            println!("   NOGO: {}", set.nogo.id);
        }
    }
    Ok(())
}

fn run_create(args: CreateArgs, global: &GlobalOpts) -> Result<()> {
    let (mut tracker, actor) = open_tracker(global)?;
    let thread = |class: &str| {
        GaugeSpec::ThreadGauge(ThreadSpec {
            thread_size: args.size.clone(),
            thread_class: class.to_string(),
            thread_form: args.form.clone(),
        })
    };
    let new = NewSet {
        category: args.category.clone(),
        go_spec: thread(&args.class),
        nogo_spec: thread(args.nogo_class.as_deref().unwrap_or(&args.class)),
        location: args.location.clone(),
        ownership: args.ownership.into(),
    };

    let set = tracker.create_set(&new, &actor).map_err(to_diagnostic)?;
    print_set_created(&set, "Created", global)
}

fn run_pair(args: PairArgs, global: &GlobalOpts) -> Result<()> {
    let (mut tracker, actor) = open_tracker(global)?;
    let set = tracker
        .pair_spares(&args.gauge_a, &args.gauge_b, &args.location, &actor)
        .map_err(to_diagnostic)?;
    print_set_created(&set, "Paired", global)
}

fn run_unpair(args: UnpairArgs, global: &GlobalOpts) -> Result<()> {
    if !args.yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Break up set {}?", args.set_id))
            .default(false)
            .interact()
            .into_diagnostic()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    let (mut tracker, actor) = open_tracker(global)?;
    tracker
        .unpair_set(&args.set_id, &args.reason, &actor)
        .map_err(to_diagnostic)?;
    println!(
        "{} Unpaired {}; both gauges are now spares",
        style("✓").green(),
        style(&args.set_id).cyan()
    );
    Ok(())
}

fn run_replace(args: ReplaceArgs, global: &GlobalOpts) -> Result<()> {
    let (mut tracker, actor) = open_tracker(global)?;
    let set = tracker
        .replace_gauge(&args.set_id, &args.outgoing, &args.incoming, &actor)
        .map_err(to_diagnostic)?;
    if global.output == OutputFormat::Json || global.output == OutputFormat::Yaml {
        return print_structured(&set, global.output);
    }
    println!(
        "{} Replaced {} with {} in {}",
        style("✓").green(),
        args.outgoing,
        style(&args.incoming).cyan(),
        style(&set.set_id).cyan()
    );
    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let (mut tracker, _) = open_tracker(global)?;
    let set = tracker.get_set(&args.set_id).map_err(to_diagnostic)?;

    match effective_format(global.output, false) {
        OutputFormat::Id => {
            println!("{}", set.set_id);
            return Ok(());
        }
        OutputFormat::Json | OutputFormat::Yaml => {
            return print_structured(&set, effective_format(global.output, false));
        }
        _ => {}
    }

    println!("{}", style(&set.set_id).bold().cyan());
    println!("{}", "-".repeat(40));
    println!("Spec:     {}", set.go.spec.summary());
    println!("Location: {}", set.location().unwrap_or("-"));
    for gauge in set.members() {
        println!(
            "{:<5} {:<18} {}",
            gauge.role.map(|r| r.to_string()).unwrap_or_default(),
            gauge.id,
            styled_status(gauge.status)
        );
    }
    Ok(())
}

fn run_history(args: HistoryArgs, global: &GlobalOpts) -> Result<()> {
    let (mut tracker, _) = open_tracker(global)?;
    let events = tracker.set_history(&args.id).map_err(to_diagnostic)?;

    if matches!(global.output, OutputFormat::Json | OutputFormat::Yaml) {
        return print_structured(&events, global.output);
    }

    println!(
        "{:<17} {:<14} {:<10} {:<40} {}",
        style("WHEN").bold(),
        style("SET").bold(),
        style("EVENT").bold(),
        style("GAUGES").bold(),
        style("ACTOR").bold()
    );
    for event in &events {
        let gauges = match (&event.outgoing, &event.incoming) {
            (Some(out), Some(inc)) => format!("{} -> {}", out, inc),
            _ => event.gauge_ids.join(", "),
        };
        println!(
            "{:<17} {:<14} {:<10} {:<40} {}",
            event.timestamp.format("%Y-%m-%d %H:%M"),
            event.set_id,
            event.kind,
            truncate_str(&gauges, 40),
            event.actor
        );
        if let Some(reason) = &event.reason {
            println!("{:<17} {}", "", style(reason).dim());
        }
    }
    Ok(())
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let (mut tracker, _) = open_tracker(global)?;
    let sets: Vec<GaugeSet> = tracker
        .list_sets()
        .map_err(to_diagnostic)?
        .into_iter()
        .filter(|set| set.members().iter().all(|g| args.status.matches(g.status)))
        .collect();

    if args.count {
        println!("{}", sets.len());
        return Ok(());
    }

    match effective_format(global.output, true) {
        OutputFormat::Json | OutputFormat::Yaml => print_structured(&sets, global.output),
        OutputFormat::Id => {
            for set in &sets {
                println!("{}", set.set_id);
            }
            Ok(())
        }
        OutputFormat::Csv => {
            println!("set_id,go,nogo,spec,go_status,nogo_status");
            for set in &sets {
                println!(
                    "{},{},{},{},{},{}",
                    set.set_id,
                    set.go.id,
                    set.nogo.id,
                    set.go.spec.summary(),
                    set.go.status,
                    set.nogo.status
                );
            }
            Ok(())
        }
        _ => {
            if sets.is_empty() {
                println!("No sets found.");
                return Ok(());
            }
            println!(
                "{:<14} {:<24} {:<20} {:<20} {}",
                style("SET").bold(),
                style("SPEC").bold(),
                style("GO").bold(),
                style("NOGO").bold(),
                style("LOCATION").bold()
            );
            println!("{}", "-".repeat(92));
            for set in &sets {
                println!(
                    "{:<14} {:<24} {:<20} {:<20} {}",
                    style(&set.set_id).cyan(),
                    truncate_str(&set.go.spec.summary(), 22),
                    styled_status(set.go.status),
                    styled_status(set.nogo.status),
                    set.location().unwrap_or("-")
                );
            }
            println!();
            println!("{} set(s) found.", style(sets.len()).cyan());
            Ok(())
        }
    }
}
