//! Shared helper functions for CLI commands
//!
//! This module contains utility functions that are used across multiple
//! command modules to avoid code duplication.

use console::{style, StyledObject};
use miette::{miette, IntoDiagnostic, Result};
use std::io::{self, BufRead, IsTerminal};

use crate::cli::GlobalOpts;
use crate::core::{Config, GaugeError, GaugeTracker, Project};
use crate::entities::GaugeStatus;

/// Open the tracker for the project containing the working directory
///
/// Returns the tracker along with the resolved acting user.
pub fn open_tracker(global: &GlobalOpts) -> Result<(GaugeTracker, String)> {
    let project = Project::discover().into_diagnostic()?;
    let tracker = GaugeTracker::open(&project).map_err(to_diagnostic)?;
    let actor = resolve_actor(tracker.config(), global);
    Ok((tracker, actor))
}

pub fn resolve_actor(config: &Config, global: &GlobalOpts) -> String {
    config.actor(global.actor.as_deref())
}

/// Convert an engine error into a diagnostic, keeping its category visible
pub fn to_diagnostic(err: GaugeError) -> miette::Report {
    let kind = err.kind();
    if err.is_retryable() {
        miette!(
            help = "the gauge changed since it was read; check its status and retry",
            "[{}] {}",
            kind,
            err
        )
    } else {
        miette!("[{}] {}", kind, err)
    }
}

/// Color a status for terminal listings
pub fn styled_status(status: GaugeStatus) -> StyledObject<&'static str> {
    let s = style(status.as_str());
    match status {
        GaugeStatus::Available => s.green(),
        GaugeStatus::CheckedOut | GaugeStatus::PendingQc | GaugeStatus::PendingTransfer => {
            s.yellow()
        }
        GaugeStatus::OutForCalibration
        | GaugeStatus::PendingCertificate
        | GaugeStatus::PendingRelease
        | GaugeStatus::CalibrationDue => s.cyan(),
        GaugeStatus::OutOfService | GaugeStatus::PendingUnseal => s.magenta(),
        GaugeStatus::Retired | GaugeStatus::Returned => s.dim(),
    }
}

/// Truncate a string to max_len, adding "..." if truncated
///
/// Useful for table columns that need fixed-width output.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Escape a string for CSV output
///
/// Handles commas, quotes, and newlines according to RFC 4180.
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Read identifiers from stdin if it is piped
///
/// Enables pipelines like:
/// ```bash
/// gtt set list --status calibration-due -o id | gtt cal send
/// ```
///
/// IDs are read one per line, with blank lines ignored.
pub fn read_ids_from_stdin() -> Option<Vec<String>> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return None;
    }

    let ids: Vec<String> = stdin
        .lock()
        .lines()
        .map_while(|line| line.ok())
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();

    if ids.is_empty() {
        None
    } else {
        Some(ids)
    }
}

/// Identifiers from the command line, or from stdin when none were given
pub fn ids_or_stdin(ids: &[String], what: &str) -> Result<Vec<String>> {
    if !ids.is_empty() {
        return Ok(ids.to_vec());
    }
    read_ids_from_stdin().ok_or_else(|| miette!("no {} given (pass them as arguments or pipe them in)", what))
}
