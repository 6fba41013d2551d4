//! Calibration batch - sets sent out for calibration together

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How far a set in a batch has progressed
///
/// Ordered: a set at `Certified` has also been sent and received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStage {
    Sent,
    Received,
    Certified,
    Released,
}

impl std::fmt::Display for BatchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchStage::Sent => write!(f, "sent"),
            BatchStage::Received => write!(f, "received"),
            BatchStage::Certified => write!(f, "certified"),
            BatchStage::Released => write!(f, "released"),
        }
    }
}

impl std::str::FromStr for BatchStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sent" => Ok(BatchStage::Sent),
            "received" => Ok(BatchStage::Received),
            "certified" => Ok(BatchStage::Certified),
            "released" => Ok(BatchStage::Released),
            _ => Err(format!("Unknown batch stage: {}", s)),
        }
    }
}

/// A set's membership in a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchMember {
    pub set_id: String,
    pub stage: BatchStage,
    pub updated: DateTime<Utc>,
}

/// A calibration batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    /// Batch ID (e.g., "BATCH-01J...")
    pub id: String,
    pub created_by: String,
    pub created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    pub members: Vec<BatchMember>,
}

/// Aggregate progress for a batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStatus {
    pub batch_id: String,
    pub total_sets: usize,
    pub sent: usize,
    pub received: usize,
    pub certified: usize,
    pub released: usize,
}

impl BatchStatus {
    /// Tally members by the furthest stage each has reached
    pub fn from_batch(batch: &Batch) -> Self {
        let reached = |stage: BatchStage| batch.members.iter().filter(|m| m.stage >= stage).count();
        Self {
            batch_id: batch.id.clone(),
            total_sets: batch.members.len(),
            sent: reached(BatchStage::Sent),
            received: reached(BatchStage::Received),
            certified: reached(BatchStage::Certified),
            released: reached(BatchStage::Released),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.total_sets > 0 && self.released == self.total_sets
    }
}

/// Outcome of a batch operation for one set
///
/// Batch operations are not atomic across sets; each set reports on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetOutcome {
    pub set_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SetOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of a batch operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    pub outcomes: Vec<SetOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<BatchStatus>,
}

impl BatchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &SetOutcome> {
        self.outcomes.iter().filter(|o| o.succeeded())
    }

    pub fn failed(&self) -> impl Iterator<Item = &SetOutcome> {
        self.outcomes.iter().filter(|o| !o.succeeded())
    }
}
