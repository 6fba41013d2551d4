//! Core module - lifecycle engines, persistence, and collaborators

pub mod auth;
pub mod blob;
pub mod calibration;
pub mod companion;
pub mod config;
pub mod error;
pub mod identity;
pub mod integrity;
pub mod ledger;
pub mod project;
pub mod service;
pub mod spares;
pub mod status;
pub mod store;
pub mod team;

#[cfg(test)]
pub(crate) mod test_support;

pub use auth::{Action, AllowAll, Authorizer};
pub use blob::{BlobError, BlobStore, FsBlobStore};
pub use calibration::{CalibrationWorkflow, CertifyOutcome};
pub use companion::{NewSet, SetManager};
pub use config::{Config, ConfigError};
pub use error::{ErrorKind, GaugeError, Result};
pub use integrity::IntegrityIssue;
pub use ledger::{CertificateLedger, CertificateUpload, DueGauge};
pub use project::{Project, ProjectError};
pub use service::{GaugeTracker, NewGauge, UploadRequest};
pub use spares::Incompatibility;
pub use status::{
    allowed_transitions, is_valid_transition, moves_whole_set, StatusMachine, TransitionContext,
};
pub use store::{AuditEntry, Store, Tx};
pub use team::{Role, TeamMember, TeamRoster};
