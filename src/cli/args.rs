//! Top-level argument definitions

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::cli::commands::cal::CalCommands;
use crate::cli::commands::cert::CertCommands;
use crate::cli::commands::gauge::GaugeCommands;
use crate::cli::commands::init::InitArgs;
use crate::cli::commands::set::SetCommands;
use crate::cli::commands::spares::SparesArgs;
use crate::cli::commands::status::StatusArgs;
use crate::cli::commands::team::TeamCommands;
use crate::cli::commands::verify::VerifyArgs;

/// Gauge tracking toolkit - thread gauge sets, spares, and the calibration lifecycle
#[derive(Debug, Parser)]
#[command(name = "gtt", version, about, propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options accepted by every command
#[derive(Debug, Clone, Args)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value_t = OutputFormat::Auto)]
    pub output: OutputFormat,

    /// Act as this user (defaults to config `author`, then $USER)
    #[arg(long = "as", global = true, env = "GTT_ACTOR", value_name = "USER")]
    pub actor: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// YAML for single records, a table for lists
    Auto,
    Yaml,
    Json,
    /// Tab-aligned table
    Tsv,
    Csv,
    /// Identifiers only, one per line
    Id,
    /// Markdown table
    Md,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Initialize a gauge tracking project in the current directory
    Init(InitArgs),

    /// Gauge intake, lookup, and retirement
    #[command(subcommand)]
    Gauge(GaugeCommands),

    /// GO/NOGO set management
    #[command(subcommand)]
    Set(SetCommands),

    /// List spares that could pair with a gauge
    Spares(SparesArgs),

    /// Show or change a gauge's status
    Status(StatusArgs),

    /// Calibration workflow: send, receive, upload, release, cancel
    #[command(subcommand)]
    Cal(CalCommands),

    /// Certificate history, retrieval, and due dates
    #[command(subcommand)]
    Cert(CertCommands),

    /// Scan for data-integrity violations
    Verify(VerifyArgs),

    /// Team roster management
    #[command(subcommand)]
    Team(TeamCommands),
}
