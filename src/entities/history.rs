//! History records for status transitions and set membership changes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::gauge::GaugeStatus;

/// One executed status transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChange {
    pub gauge_id: String,
    pub from: GaugeStatus,
    pub to: GaugeStatus,
    pub actor: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Location persisted with the change, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Kind of set membership change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetEventKind {
    /// New pair created at intake
    Created,
    /// Two spares paired
    Paired,
    /// Set dissolved, both members became spares
    Unpaired,
    /// One member substituted by a spare
    Replaced,
}

impl std::fmt::Display for SetEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SetEventKind::Created => write!(f, "created"),
            SetEventKind::Paired => write!(f, "paired"),
            SetEventKind::Unpaired => write!(f, "unpaired"),
            SetEventKind::Replaced => write!(f, "replaced"),
        }
    }
}

impl std::str::FromStr for SetEventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(SetEventKind::Created),
            "paired" => Ok(SetEventKind::Paired),
            "unpaired" => Ok(SetEventKind::Unpaired),
            "replaced" => Ok(SetEventKind::Replaced),
            _ => Err(format!("Unknown set event: {}", s)),
        }
    }
}

/// One set membership change
///
/// `gauge_ids` lists the members after the event (before it, for unpairing).
/// For replacements, `outgoing` and `incoming` name the substituted gauges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetEvent {
    pub set_id: String,
    pub kind: SetEventKind,
    pub gauge_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outgoing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incoming: Option<String>,
    pub actor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}
