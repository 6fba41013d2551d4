//! Authorization collaborator
//!
//! Engines ask an [`Authorizer`] before every state transition or pairing
//! operation and turn a denial into [`GaugeError::Forbidden`].

use crate::core::error::{GaugeError, Result};
use crate::core::team::TeamRoster;
use crate::entities::GaugeStatus;

/// Coarse-grained actions checked against the authorization collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Create gauges or sets at intake
    Intake,
    /// Ordinary status changes (checkout, QC, transfer)
    ChangeStatus,
    /// Pair, unpair, or replace set members
    ManageSets,
    /// Move gauges through the calibration pipeline
    Calibrate,
    /// Upload calibration certificates
    Certify,
    /// Retire a gauge or record a customer return
    Retire,
}

impl Action {
    pub fn all() -> &'static [Action] {
        &[
            Action::Intake,
            Action::ChangeStatus,
            Action::ManageSets,
            Action::Calibrate,
            Action::Certify,
            Action::Retire,
        ]
    }

    /// Action needed for a specific status change
    pub fn for_transition(from: GaugeStatus, to: GaugeStatus) -> Action {
        match (from, to) {
            (_, GaugeStatus::Retired) | (_, GaugeStatus::Returned) => Action::Retire,
            // Advancing a fully certified set follows from the upload itself
            (GaugeStatus::PendingCertificate, GaugeStatus::PendingRelease) => Action::Certify,
            (_, GaugeStatus::OutForCalibration)
            | (_, GaugeStatus::PendingCertificate)
            | (_, GaugeStatus::PendingRelease)
            | (GaugeStatus::PendingRelease, GaugeStatus::Available) => Action::Calibrate,
            _ => Action::ChangeStatus,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Intake => write!(f, "intake"),
            Action::ChangeStatus => write!(f, "change status of"),
            Action::ManageSets => write!(f, "manage set"),
            Action::Calibrate => write!(f, "calibrate"),
            Action::Certify => write!(f, "certify"),
            Action::Retire => write!(f, "retire"),
        }
    }
}

/// Decides whether an actor may perform an action on a resource
pub trait Authorizer {
    fn is_authorized(&self, actor: &str, action: Action, resource: &str) -> bool;
}

/// Allows everything; used when no team roster is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn is_authorized(&self, _actor: &str, _action: Action, _resource: &str) -> bool {
        true
    }
}

impl Authorizer for TeamRoster {
    fn is_authorized(&self, actor: &str, action: Action, _resource: &str) -> bool {
        self.can(actor, action)
    }
}

/// Check authorization, mapping a denial to `Forbidden`
pub fn require(
    authorizer: &dyn Authorizer,
    actor: &str,
    action: Action,
    resource: &str,
) -> Result<()> {
    if authorizer.is_authorized(actor, action, resource) {
        Ok(())
    } else {
        tracing::warn!(actor, %action, resource, "authorization denied");
        Err(GaugeError::Forbidden {
            actor: actor.to_string(),
            action,
            resource: resource.to_string(),
        })
    }
}
