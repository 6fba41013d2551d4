//! Spare pool matching
//!
//! A spare is a thread gauge with no set identifier. Two gauges are compatible
//! when they have opposite GO/NOGO roles and the same specification key.

use thiserror::Error;

use crate::core::error::Result;
use crate::core::store::Tx;
use crate::entities::{EquipmentType, Gauge};

/// Why two gauges cannot form a set
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Incompatibility {
    #[error("a gauge cannot be paired with itself")]
    SameGauge,

    #[error("{0} is not a thread gauge; only thread gauges form sets")]
    NotThreadGauge(String),

    #[error("{0} has no GO/NOGO role")]
    MissingRole(String),

    #[error("both gauges have the same GO/NOGO role")]
    SameRole,

    #[error("thread size, class, and form must match exactly")]
    SpecMismatch,
}

/// Check whether `a` and `b` could be members of one set
///
/// Set membership and status are not considered here.
pub fn check_compatible(a: &Gauge, b: &Gauge) -> Result<(), Incompatibility> {
    if a.id == b.id {
        return Err(Incompatibility::SameGauge);
    }
    for g in [a, b] {
        if g.equipment_type() != EquipmentType::ThreadGauge {
            return Err(Incompatibility::NotThreadGauge(g.id.clone()));
        }
    }
    let (Some(role_a), Some(role_b)) = (a.role, b.role) else {
        let missing = if a.role.is_none() { &a.id } else { &b.id };
        return Err(Incompatibility::MissingRole(missing.clone()));
    };
    if role_a == role_b {
        return Err(Incompatibility::SameRole);
    }
    if a.spec.key() != b.spec.key() {
        return Err(Incompatibility::SpecMismatch);
    }
    Ok(())
}

/// Spares that could pair with `gauge_id`
///
/// Returns an empty list (never an error) when nothing matches, including for
/// equipment that does not form sets. Retired and returned gauges are never
/// offered.
pub fn find_compatible_spares(tx: &Tx<'_>, gauge_id: &str) -> Result<Vec<Gauge>> {
    let gauge = tx.require_gauge(gauge_id)?;
    let Some(role) = gauge.role else {
        return Ok(Vec::new());
    };

    let matches: Vec<Gauge> = tx
        .spare_candidates(role.opposite(), &gauge.spec.key())?
        .into_iter()
        .filter(|candidate| candidate.id != gauge.id)
        .collect();

    tracing::debug!(gauge_id, count = matches.len(), "compatible spares found");
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::Store;
    use crate::core::test_support::{force_status, gauge, insert_member, insert_thread, micrometer_spec};
    use crate::entities::{GaugeRole, GaugeStatus};

    #[test]
    fn test_finds_only_matching_opposite_role_spares() {
        let mut store = Store::open_in_memory().unwrap();
        let tx = store.begin().unwrap();
        insert_thread(&tx, "G1", GaugeRole::Go, ".250-20", "2A");
        insert_thread(&tx, "G3", GaugeRole::Nogo, ".250-20", "2A");
        insert_thread(&tx, "G4", GaugeRole::Nogo, ".375-16", "2A");

        let spares = find_compatible_spares(&tx, "G1").unwrap();
        let ids: Vec<_> = spares.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["G3"]);
    }

    #[test]
    fn test_excludes_same_role_paired_and_retired() {
        let mut store = Store::open_in_memory().unwrap();
        let tx = store.begin().unwrap();
        insert_thread(&tx, "G1", GaugeRole::Go, ".250-20", "2A");
        insert_thread(&tx, "G5", GaugeRole::Go, ".250-20", "2A");
        insert_member(&tx, "G6", GaugeRole::Nogo, "S9");
        insert_thread(&tx, "G7", GaugeRole::Nogo, ".250-20", "2A");
        force_status(&tx, "G7", GaugeStatus::Retired);

        assert!(find_compatible_spares(&tx, "G1").unwrap().is_empty());
    }

    #[test]
    fn test_matching_ignores_case_and_whitespace() {
        let mut store = Store::open_in_memory().unwrap();
        let tx = store.begin().unwrap();
        insert_thread(&tx, "G1", GaugeRole::Go, ".250-20", "2A");
        insert_thread(&tx, "G8", GaugeRole::Nogo, " .250-20", "2a");

        assert_eq!(find_compatible_spares(&tx, "G1").unwrap().len(), 1);
    }

    #[test]
    fn test_non_thread_gauge_has_no_spares() {
        let mut store = Store::open_in_memory().unwrap();
        let tx = store.begin().unwrap();
        tx.insert_gauge(&gauge("HT1", micrometer_spec(), None)).unwrap();

        assert!(find_compatible_spares(&tx, "HT1").unwrap().is_empty());
        assert!(find_compatible_spares(&tx, "MISSING").is_err());
    }

    #[test]
    fn test_check_compatible_reasons() {
        let go = gauge("A", crate::core::test_support::thread_spec(".250-20", "2A"), Some(GaugeRole::Go));
        let mut nogo = go.clone();
        nogo.id = "B".to_string();
        nogo.role = Some(GaugeRole::Nogo);

        assert!(check_compatible(&go, &nogo).is_ok());
        assert_eq!(check_compatible(&go, &go), Err(Incompatibility::SameGauge));

        let mut also_go = nogo.clone();
        also_go.role = Some(GaugeRole::Go);
        assert_eq!(check_compatible(&go, &also_go), Err(Incompatibility::SameRole));

        let tool = gauge("T", micrometer_spec(), None);
        assert_eq!(
            check_compatible(&go, &tool),
            Err(Incompatibility::NotThreadGauge("T".to_string()))
        );
    }
}
