//! Entity type definitions

pub mod batch;
pub mod certificate;
pub mod gauge;
pub mod history;

pub use batch::{Batch, BatchMember, BatchReport, BatchStage, BatchStatus, SetOutcome};
pub use certificate::Certificate;
pub use gauge::{
    EquipmentType, Gauge, GaugeRole, GaugeSet, GaugeSpec, GaugeStatus, HandToolSpec,
    LargeEquipmentSpec, Ownership, SpecKey, StandardSpec, ThreadSpec,
};
pub use history::{SetEvent, SetEventKind, StatusChange};
