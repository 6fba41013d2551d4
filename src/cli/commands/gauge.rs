//! `gtt gauge` command - intake, lookup, history, retirement

use clap::{Subcommand, ValueEnum};
use console::style;
use dialoguer::Confirm;
use miette::{bail, IntoDiagnostic, Result};

use crate::cli::filters::StatusFilter;
use crate::cli::helpers::{open_tracker, styled_status, to_diagnostic, truncate_str};
use crate::cli::output::{effective_format, print_gauges, print_structured};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::status::allowed_transitions;
use crate::core::NewGauge;
use crate::entities::{
    EquipmentType, GaugeRole, GaugeSpec, HandToolSpec, LargeEquipmentSpec, Ownership,
    StandardSpec, ThreadSpec,
};

/// CLI-friendly equipment type enum
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliEquipmentType {
    Thread,
    HandTool,
    Large,
    Standard,
}

impl From<CliEquipmentType> for EquipmentType {
    fn from(cli: CliEquipmentType) -> Self {
        match cli {
            CliEquipmentType::Thread => EquipmentType::ThreadGauge,
            CliEquipmentType::HandTool => EquipmentType::HandTool,
            CliEquipmentType::Large => EquipmentType::LargeEquipment,
            CliEquipmentType::Standard => EquipmentType::CalibrationStandard,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliRole {
    Go,
    Nogo,
}

impl From<CliRole> for GaugeRole {
    fn from(cli: CliRole) -> Self {
        match cli {
            CliRole::Go => GaugeRole::Go,
            CliRole::Nogo => GaugeRole::Nogo,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliOwnership {
    Company,
    Employee,
    Customer,
}

impl From<CliOwnership> for Ownership {
    fn from(cli: CliOwnership) -> Self {
        match cli {
            CliOwnership::Company => Ownership::Company,
            CliOwnership::Employee => Ownership::Employee,
            CliOwnership::Customer => Ownership::Customer,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum GaugeCommands {
    /// Receive a new gauge into the crib
    New(NewArgs),

    /// Show a gauge's details
    Show(ShowArgs),

    /// List gauges with filtering
    List(ListArgs),

    /// Show a gauge's status history
    History(HistoryArgs),

    /// Retire a gauge permanently
    Retire(RetireArgs),

    /// Record a customer-owned gauge going back to its owner
    Return(ReturnArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Category code (e.g., UN, MIC)
    #[arg(long, short = 'c')]
    pub category: String,

    /// Equipment type
    #[arg(long = "type", short = 't', value_enum, default_value = "thread")]
    pub equipment_type: CliEquipmentType,

    /// GO or NOGO (thread gauges only)
    #[arg(long, short = 'r', value_enum)]
    pub role: Option<CliRole>,

    /// Current location
    #[arg(long, short = 'l')]
    pub location: String,

    #[arg(long, value_enum, default_value = "company")]
    pub ownership: CliOwnership,

    #[command(flatten)]
    pub spec: SpecArgs,
}

/// Specification fields; which are required depends on the equipment type
#[derive(clap::Args, Debug, Default)]
pub struct SpecArgs {
    /// Thread size (e.g., ".250-20")
    #[arg(long)]
    pub size: Option<String>,

    /// Thread class (e.g., "2A")
    #[arg(long)]
    pub class: Option<String>,

    /// Thread form
    #[arg(long, default_value = "UN")]
    pub form: String,

    /// Hand tool type (e.g., micrometer)
    #[arg(long)]
    pub tool_type: Option<String>,

    #[arg(long)]
    pub range_min: Option<f64>,

    #[arg(long)]
    pub range_max: Option<f64>,

    #[arg(long, default_value = "in")]
    pub unit: String,

    #[arg(long)]
    pub resolution: Option<f64>,

    /// Large equipment name
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub manufacturer: Option<String>,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub capacity: Option<String>,

    /// Calibration standard type (e.g., gauge block)
    #[arg(long)]
    pub standard_type: Option<String>,

    #[arg(long)]
    pub nominal: Option<f64>,

    #[arg(long)]
    pub uncertainty: Option<f64>,
}

impl SpecArgs {
    pub fn build(&self, equipment_type: EquipmentType) -> Result<GaugeSpec> {
        fn need<T: Clone>(value: &Option<T>, flag: &str, what: EquipmentType) -> Result<T> {
            match value {
                Some(v) => Ok(v.clone()),
                None => bail!("--{} is required for {} gauges", flag, what),
            }
        }

        let spec = match equipment_type {
            EquipmentType::ThreadGauge => GaugeSpec::ThreadGauge(ThreadSpec {
                thread_size: need(&self.size, "size", equipment_type)?,
                thread_class: need(&self.class, "class", equipment_type)?,
                thread_form: self.form.clone(),
            }),
            EquipmentType::HandTool => GaugeSpec::HandTool(HandToolSpec {
                tool_type: need(&self.tool_type, "tool-type", equipment_type)?,
                range_min: need(&self.range_min, "range-min", equipment_type)?,
                range_max: need(&self.range_max, "range-max", equipment_type)?,
                unit: self.unit.clone(),
                resolution: self.resolution,
            }),
            EquipmentType::LargeEquipment => GaugeSpec::LargeEquipment(LargeEquipmentSpec {
                equipment_name: need(&self.name, "name", equipment_type)?,
                manufacturer: self.manufacturer.clone(),
                model: self.model.clone(),
                capacity: self.capacity.clone(),
            }),
            EquipmentType::CalibrationStandard => GaugeSpec::CalibrationStandard(StandardSpec {
                standard_type: need(&self.standard_type, "standard-type", equipment_type)?,
                nominal_value: need(&self.nominal, "nominal", equipment_type)?,
                unit: self.unit.clone(),
                uncertainty: self.uncertainty,
            }),
        };
        Ok(spec)
    }
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Gauge ID
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by status
    #[arg(long, short = 's', value_enum, default_value = "active")]
    pub status: StatusFilter,

    /// Filter by category code
    #[arg(long, short = 'c')]
    pub category: Option<String>,

    /// Only gauges without a set
    #[arg(long)]
    pub spares: bool,

    /// Show count only
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct HistoryArgs {
    /// Gauge ID
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct RetireArgs {
    /// Gauge ID
    pub id: String,

    #[arg(long)]
    pub reason: Option<String>,

    /// Skip confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(clap::Args, Debug)]
pub struct ReturnArgs {
    /// Gauge ID
    pub id: String,

    #[arg(long)]
    pub reason: Option<String>,

    /// Skip confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(cmd: GaugeCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        GaugeCommands::New(args) => run_new(args, global),
        GaugeCommands::Show(args) => run_show(args, global),
        GaugeCommands::List(args) => run_list(args, global),
        GaugeCommands::History(args) => run_history(args, global),
        GaugeCommands::Retire(args) => run_retire(args, global),
        GaugeCommands::Return(args) => run_return(args, global),
    }
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let (mut tracker, actor) = open_tracker(global)?;
    let spec = args.spec.build(args.equipment_type.into())?;

    let gauge = tracker
        .intake_gauge(
            &NewGauge {
                category: args.category,
                spec,
                role: args.role.map(Into::into),
                ownership: args.ownership.into(),
                location: args.location,
            },
            &actor,
        )
        .map_err(to_diagnostic)?;

    match global.output {
        OutputFormat::Id => println!("{}", gauge.id),
        OutputFormat::Json | OutputFormat::Yaml => print_structured(&gauge, global.output)?,
        _ => println!(
            "{} Received gauge {} ({})",
            style("✓").green(),
            style(&gauge.id).cyan(),
            gauge.spec.summary()
        ),
    }
    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let (mut tracker, _) = open_tracker(global)?;
    let gauge = tracker.get_gauge(&args.id).map_err(to_diagnostic)?;

    match effective_format(global.output, false) {
        OutputFormat::Id => {
            println!("{}", gauge.id);
            return Ok(());
        }
        OutputFormat::Json | OutputFormat::Yaml => {
            return print_structured(&gauge, effective_format(global.output, false));
        }
        _ => {}
    }

    let companion = tracker.companion_of(&gauge.id).map_err(to_diagnostic)?;
    let certificate = tracker
        .certificate_history(&gauge.id)
        .map_err(to_diagnostic)?
        .into_iter()
        .find(|c| c.is_current);

    println!("{}", style(&gauge.id).bold().cyan());
    println!("{}", "-".repeat(40));
    println!("Type:       {}", gauge.equipment_type());
    println!("Spec:       {}", gauge.spec.summary());
    if let Some(role) = gauge.role {
        println!("Role:       {}", role);
    }
    println!("Status:     {}", styled_status(gauge.status));
    println!("Ownership:  {}", gauge.ownership);
    println!("Location:   {}", gauge.location.as_deref().unwrap_or("-"));
    match (&gauge.set_id, &companion) {
        (Some(set_id), Some(c)) => println!("Set:        {} (companion {})", set_id, c.id),
        _ => println!("Set:        {}", style("spare").dim()),
    }
    match certificate {
        Some(cert) => println!(
            "Certificate: {} valid until {}",
            truncate_str(&cert.id, 18),
            cert.valid_until
        ),
        None => println!("Certificate: {}", style("none").yellow()),
    }
    let next: Vec<String> = allowed_transitions(gauge.status)
        .iter()
        .map(|s| s.to_string())
        .collect();
    if !next.is_empty() {
        println!("Next:       {}", style(next.join(", ")).dim());
    }
    Ok(())
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let (mut tracker, _) = open_tracker(global)?;
    let category = args.category.map(|c| c.to_ascii_uppercase());

    let gauges: Vec<_> = tracker
        .list_gauges(args.status.exact())
        .map_err(to_diagnostic)?
        .into_iter()
        .filter(|g| args.status.matches(g.status))
        .filter(|g| category.as_deref().map_or(true, |c| g.category == c))
        .filter(|g| !args.spares || g.is_spare())
        .collect();

    if args.count {
        println!("{}", gauges.len());
        return Ok(());
    }
    if gauges.is_empty() {
        println!("No gauges found.");
        return Ok(());
    }
    print_gauges(&gauges, global.output)
}

fn run_history(args: HistoryArgs, global: &GlobalOpts) -> Result<()> {
    let (mut tracker, _) = open_tracker(global)?;
    let history = tracker.status_history(&args.id).map_err(to_diagnostic)?;

    match global.output {
        OutputFormat::Json | OutputFormat::Yaml => return print_structured(&history, global.output),
        _ => {}
    }
    if history.is_empty() {
        println!("No status changes recorded for {}.", args.id);
        return Ok(());
    }

    println!(
        "{:<17} {:<20} {:<20} {:<12} {}",
        style("WHEN").bold(),
        style("FROM").bold(),
        style("TO").bold(),
        style("ACTOR").bold(),
        style("REASON").bold()
    );
    for change in &history {
        println!(
            "{:<17} {:<20} {:<20} {:<12} {}",
            change.timestamp.format("%Y-%m-%d %H:%M"),
            change.from,
            styled_status(change.to),
            truncate_str(&change.actor, 12),
            change.reason.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

fn confirm(prompt: String, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .into_diagnostic()
}

fn run_retire(args: RetireArgs, global: &GlobalOpts) -> Result<()> {
    if !confirm(format!("Retire {}? This cannot be undone", args.id), args.yes)? {
        println!("Aborted.");
        return Ok(());
    }
    let (mut tracker, actor) = open_tracker(global)?;
    tracker
        .retire(&args.id, args.reason.as_deref(), &actor)
        .map_err(to_diagnostic)?;
    println!("{} Retired {}", style("✓").green(), style(&args.id).cyan());
    Ok(())
}

fn run_return(args: ReturnArgs, global: &GlobalOpts) -> Result<()> {
    if !confirm(format!("Return {} to its owner?", args.id), args.yes)? {
        println!("Aborted.");
        return Ok(());
    }
    let (mut tracker, actor) = open_tracker(global)?;
    tracker
        .record_customer_return(&args.id, args.reason.as_deref(), &actor)
        .map_err(to_diagnostic)?;
    println!(
        "{} Returned {} to customer",
        style("✓").green(),
        style(&args.id).cyan()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_args_require_type_fields() {
        let args = SpecArgs {
            size: Some(".250-20".to_string()),
            form: "UNC".to_string(),
            unit: "in".to_string(),
            ..Default::default()
        };
        assert!(args.build(EquipmentType::ThreadGauge).is_err());

        let args = SpecArgs {
            class: Some("2A".to_string()),
            ..args
        };
        let spec = args.build(EquipmentType::ThreadGauge).unwrap();
        assert_eq!(spec.summary(), ".250-20 2A UNC");
        assert!(args.build(EquipmentType::HandTool).is_err());
    }
}
