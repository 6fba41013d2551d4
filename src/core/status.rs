//! Status state machine
//!
//! Validates and executes every status transition. It is the only writer of
//! the `status` column; other engines call it rather than updating rows.
//! Each executed transition writes a history record (old status, new status,
//! actor, timestamp, reason).
//!
//! Calibration pipeline steps move both members of a set together, and no
//! gauge enters `pending_release` without a valid certificate from its
//! current calibration cycle.

use crate::core::auth::{require, Action, Authorizer};
use crate::core::companion::load_set;
use crate::core::error::{GaugeError, Result};
use crate::core::ledger::certified_this_cycle;
use crate::core::store::Tx;
use crate::entities::{Gauge, GaugeSet, GaugeStatus, Ownership, StatusChange};

/// Optional details carried with a transition
#[derive(Debug, Clone, Default)]
pub struct TransitionContext {
    /// Free-text reason recorded in history
    pub reason: Option<String>,
    /// Location persisted atomically with the status change
    pub location: Option<String>,
}

impl TransitionContext {
    pub fn with_reason(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            location: None,
        }
    }

    pub fn with_location(location: impl Into<String>) -> Self {
        Self {
            reason: None,
            location: Some(location.into()),
        }
    }

    fn location(&self) -> Option<&str> {
        self.location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
    }
}

/// Check if a status transition is part of the lifecycle
///
/// `Returned` is deliberately absent: it is reachable only through
/// [`StatusMachine::record_customer_return`].
pub fn is_valid_transition(from: GaugeStatus, to: GaugeStatus) -> bool {
    use GaugeStatus::*;
    matches!(
        (from, to),
        // Shop floor
        (Available, CheckedOut)
            | (Available, OutOfService)
            | (Available, PendingUnseal)
            | (Available, Retired)
            | (CheckedOut, PendingQc)
            | (CheckedOut, PendingTransfer)
            | (PendingQc, Available)
            | (PendingQc, OutOfService)
            | (PendingTransfer, CheckedOut)
            | (PendingTransfer, Available)
            // Calibration pipeline
            | (Available, OutForCalibration)
            | (OutForCalibration, PendingCertificate)
            | (PendingCertificate, PendingRelease)
            | (PendingRelease, Available)
            // Cancel-back
            | (PendingRelease, PendingCertificate)
            // Holds
            | (OutOfService, Available)
            | (OutOfService, Retired)
            | (PendingUnseal, Available)
            | (PendingUnseal, Retired)
            // Calibration due
            | (Available, CalibrationDue)
            | (PendingQc, CalibrationDue)
            | (CalibrationDue, OutForCalibration)
            | (CalibrationDue, OutOfService)
            | (CalibrationDue, Retired)
    )
}

/// Whether a set member may only make this move together with its companion
pub fn moves_whole_set(from: GaugeStatus, to: GaugeStatus) -> bool {
    use GaugeStatus::*;
    matches!(to, OutForCalibration | PendingCertificate | PendingRelease)
        || (from == PendingRelease && to == Available)
}

/// Get allowed transitions from the current status
pub fn allowed_transitions(current: GaugeStatus) -> Vec<GaugeStatus> {
    GaugeStatus::all()
        .iter()
        .copied()
        .filter(|to| is_valid_transition(current, *to))
        .collect()
}

/// Executes status transitions for single gauges and whole sets
pub struct StatusMachine<'a> {
    auth: &'a dyn Authorizer,
}

impl<'a> StatusMachine<'a> {
    pub fn new(auth: &'a dyn Authorizer) -> Self {
        Self { auth }
    }

    /// Move one gauge to `target`
    ///
    /// Calibration pipeline moves of a set member take the companion along:
    /// both members must be eligible and both rows change or neither.
    pub fn transition(
        &self,
        tx: &Tx<'_>,
        gauge_id: &str,
        target: GaugeStatus,
        actor: &str,
        ctx: &TransitionContext,
    ) -> Result<GaugeStatus> {
        let gauge = tx.require_gauge(gauge_id)?;

        if let Some(set_id) = gauge.set_id.as_deref() {
            if moves_whole_set(gauge.status, target) {
                self.transition_set(tx, set_id, target, actor, ctx)?;
                return Ok(target);
            }
        }

        self.transition_members(tx, &[&gauge], target, actor, ctx)?;
        Ok(target)
    }

    /// Move both members of a set to `target` in one step
    ///
    /// Both members are checked before either row is written; any failure
    /// leaves both statuses as they were.
    pub fn transition_set(
        &self,
        tx: &Tx<'_>,
        set_id: &str,
        target: GaugeStatus,
        actor: &str,
        ctx: &TransitionContext,
    ) -> Result<GaugeSet> {
        let set = load_set(tx, set_id)?;
        self.transition_members(tx, &set.members(), target, actor, ctx)?;
        tracing::info!(set_id, status = %target, "set transitioned");
        load_set(tx, set_id)
    }

    /// Check every gauge in `members`, then move them all to `target`
    ///
    /// Skips the set-wide routing of [`transition`](Self::transition); the
    /// calibration workflow uses it to receive one member of a set at a time.
    pub(crate) fn transition_members(
        &self,
        tx: &Tx<'_>,
        members: &[&Gauge],
        target: GaugeStatus,
        actor: &str,
        ctx: &TransitionContext,
    ) -> Result<()> {
        for member in members {
            self.check(tx, member, target, actor, ctx)?;
        }
        for member in members {
            self.apply(tx, member, target, actor, ctx)?;
        }
        Ok(())
    }

    /// Record a customer-owned gauge going back to its owner
    ///
    /// The only way into `Returned`; allowed from any non-terminal status.
    pub fn record_customer_return(
        &self,
        tx: &Tx<'_>,
        gauge_id: &str,
        actor: &str,
        ctx: &TransitionContext,
    ) -> Result<GaugeStatus> {
        let gauge = tx.require_gauge(gauge_id)?;
        require(self.auth, actor, Action::Retire, gauge_id)?;

        if gauge.ownership != Ownership::Customer {
            return Err(GaugeError::validation(format!(
                "gauge {} is {}-owned; only customer gauges can be returned",
                gauge_id, gauge.ownership
            )));
        }
        if gauge.status.is_terminal() {
            return Err(GaugeError::InvalidTransition {
                gauge_id: gauge_id.to_string(),
                from: gauge.status,
                to: GaugeStatus::Returned,
            });
        }
        if let Some(set_id) = &gauge.set_id {
            return Err(GaugeError::conflict(format!(
                "gauge {} still belongs to set {}; unpair it first",
                gauge_id, set_id
            )));
        }

        self.apply(tx, &gauge, GaugeStatus::Returned, actor, ctx)?;
        Ok(GaugeStatus::Returned)
    }

    /// Every rule a transition must pass before any write
    fn check(
        &self,
        tx: &Tx<'_>,
        gauge: &Gauge,
        target: GaugeStatus,
        actor: &str,
        ctx: &TransitionContext,
    ) -> Result<()> {
        require(
            self.auth,
            actor,
            Action::for_transition(gauge.status, target),
            &gauge.id,
        )?;

        if !is_valid_transition(gauge.status, target) {
            return Err(GaugeError::InvalidTransition {
                gauge_id: gauge.id.clone(),
                from: gauge.status,
                to: target,
            });
        }

        match (gauge.status, target) {
            (GaugeStatus::PendingRelease, GaugeStatus::Available) if ctx.location().is_none() => {
                return Err(GaugeError::validation(format!(
                    "releasing {} requires a verified location",
                    gauge.id
                )))
            }
            (_, GaugeStatus::PendingRelease) if ctx.location().is_some() => {
                return Err(GaugeError::validation(
                    "location does not change when entering pending_release",
                ))
            }
            (_, GaugeStatus::Retired) if gauge.set_id.is_some() => {
                return Err(GaugeError::conflict(format!(
                    "gauge {} still belongs to set {}; unpair or replace it first",
                    gauge.id,
                    gauge.set_id.as_deref().unwrap_or_default()
                )))
            }
            _ => {}
        }

        if target == GaugeStatus::PendingRelease && !certified_this_cycle(tx, gauge)? {
            return Err(GaugeError::conflict(format!(
                "gauge {} has no valid certificate from this calibration cycle",
                gauge.id
            )));
        }
        Ok(())
    }

    fn apply(
        &self,
        tx: &Tx<'_>,
        gauge: &Gauge,
        target: GaugeStatus,
        actor: &str,
        ctx: &TransitionContext,
    ) -> Result<()> {
        let location = ctx.location();
        tx.update_status_if(&gauge.id, gauge.status, target, location)?;
        tx.insert_status_change(&StatusChange {
            gauge_id: gauge.id.clone(),
            from: gauge.status,
            to: target,
            actor: actor.to_string(),
            timestamp: tx.now(),
            reason: ctx.reason.clone(),
            location: location.map(str::to_string),
        })?;
        tracing::debug!(gauge_id = %gauge.id, from = %gauge.status, to = %target, actor, "status changed");
        Ok(())
    }
}
