//! Identifier generation for gauges, sets, certificates, and batches
//!
//! Gauge and set identifiers are sequential per category/type scope:
//! `TG-UN-0001` is the first thread-gauge base in category `UN`. A new thread
//! set reserves one base; its members are `<base>-GO` and `<base>-NOGO`.
//!
//! The suffix is cosmetic. Membership is only ever read from the `set_id`
//! column - after a replacement the incoming gauge keeps its own identifier,
//! so an identifier's suffix says nothing reliable about which set it is in.

use ulid::Ulid;

use crate::core::error::{GaugeError, Result};
use crate::core::store::Tx;
use crate::entities::{EquipmentType, GaugeRole};

const MAX_CATEGORY_LEN: usize = 8;

/// Validate and normalize a category code (alphanumeric, upper-cased)
pub fn normalize_category(category: &str) -> Result<String> {
    let trimmed = category.trim();
    if trimmed.is_empty() {
        return Err(GaugeError::validation("category code is required"));
    }
    if trimmed.len() > MAX_CATEGORY_LEN || !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(GaugeError::validation(format!(
            "category code '{}' must be 1-{} letters or digits",
            trimmed, MAX_CATEGORY_LEN
        )));
    }
    Ok(trimmed.to_ascii_uppercase())
}

fn scope(category: &str, equipment_type: EquipmentType) -> String {
    format!("{}-{}", equipment_type.code(), category)
}

/// Reserve a fresh base identifier in the category/type scope
///
/// Skips any value already present as a gauge or set identifier, so imported
/// rows with hand-assigned identifiers cannot collide with generated ones.
pub fn reserve_base(tx: &Tx<'_>, category: &str, equipment_type: EquipmentType) -> Result<String> {
    let category = normalize_category(category)?;
    let scope = scope(&category, equipment_type);
    loop {
        let seq = tx.next_sequence(&scope)?;
        let base = format!("{}-{:04}", scope, seq);
        let taken = tx.gauge_id_exists(&base)?
            || tx.gauge_id_exists(&derive_gauge_id(&base, GaugeRole::Go))?
            || tx.gauge_id_exists(&derive_gauge_id(&base, GaugeRole::Nogo))?;
        if !taken {
            return Ok(base);
        }
        tracing::debug!(%base, "skipping identifier already in use");
    }
}

/// Per-gauge identifier for a set member
pub fn derive_gauge_id(base: &str, role: GaugeRole) -> String {
    format!("{}-{}", base, role.id_suffix())
}

/// Generate a new gauge identifier
///
/// Thread gauges need a role and get a role suffix; other equipment must not
/// have one.
pub fn generate_id(
    tx: &Tx<'_>,
    category: &str,
    equipment_type: EquipmentType,
    role: Option<GaugeRole>,
) -> Result<String> {
    match (equipment_type, role) {
        (EquipmentType::ThreadGauge, Some(role)) => {
            let base = reserve_base(tx, category, equipment_type)?;
            Ok(derive_gauge_id(&base, role))
        }
        (EquipmentType::ThreadGauge, None) => Err(GaugeError::validation(
            "thread gauges require a GO or NOGO role",
        )),
        (_, Some(role)) => Err(GaugeError::validation(format!(
            "{} gauges cannot have a {} role",
            equipment_type, role
        ))),
        (_, None) => reserve_base(tx, category, equipment_type),
    }
}

/// Generate a new set identifier in `category`
pub fn generate_set_id(tx: &Tx<'_>, category: &str) -> Result<String> {
    reserve_base(tx, category, EquipmentType::ThreadGauge)
}

pub fn new_certificate_id() -> String {
    format!("CERT-{}", Ulid::new())
}

pub fn new_batch_id() -> String {
    format!("BATCH-{}", Ulid::new())
}
