//! Companion/set management
//!
//! A set is never stored as such. It is the pair of gauge rows sharing a
//! `set_id`, and "find my companion" is always a lookup by that value. This
//! module is the only writer of the `set_id` column.

use crate::core::auth::{require, Action, Authorizer};
use crate::core::error::{GaugeError, Result};
use crate::core::identity::{derive_gauge_id, generate_set_id, normalize_category, reserve_base};
use crate::core::spares::{check_compatible, find_compatible_spares};
use crate::core::store::Tx;
use crate::entities::{
    EquipmentType, Gauge, GaugeRole, GaugeSet, GaugeSpec, GaugeStatus, Ownership, SetEvent,
    SetEventKind,
};

/// Resolve the two members of `set_id`
///
/// No rows is `NotFound`. Any other count than two, or two rows that are not
/// one GO plus one NOGO, is an integrity violation.
pub fn load_set(tx: &Tx<'_>, set_id: &str) -> Result<GaugeSet> {
    let mut rows = tx.gauges_in_set(set_id)?;
    match rows.len() {
        0 => Err(GaugeError::set_not_found(set_id)),
        2 => {
            let second = rows.pop();
            let first = rows.pop();
            match (first, second) {
                (Some(a), Some(b)) => pair_by_role(set_id, a, b),
                _ => Err(cardinality_violation(set_id, 0)),
            }
        }
        n => Err(cardinality_violation(set_id, n)),
    }
}

fn pair_by_role(set_id: &str, a: Gauge, b: Gauge) -> Result<GaugeSet> {
    match (a.role, b.role) {
        (Some(GaugeRole::Go), Some(GaugeRole::Nogo)) => Ok(GaugeSet {
            set_id: set_id.to_string(),
            go: a,
            nogo: b,
        }),
        (Some(GaugeRole::Nogo), Some(GaugeRole::Go)) => Ok(GaugeSet {
            set_id: set_id.to_string(),
            go: b,
            nogo: a,
        }),
        _ => {
            let message = format!(
                "set {} does not have exactly one GO and one NOGO member ({}, {})",
                set_id, a.id, b.id
            );
            tracing::error!(set_id, "{}", message);
            Err(GaugeError::Integrity(message))
        }
    }
}

fn cardinality_violation(set_id: &str, count: usize) -> GaugeError {
    let message = format!(
        "set {} is referenced by {} gauge(s); expected exactly 2",
        set_id, count
    );
    tracing::error!(set_id, count, "{}", message);
    GaugeError::Integrity(message)
}

/// The other member of the gauge's set, if it belongs to one
pub fn companion_of(tx: &Tx<'_>, gauge_id: &str) -> Result<Option<Gauge>> {
    let gauge = tx.require_gauge(gauge_id)?;
    let Some(set_id) = gauge.set_id.as_deref() else {
        return Ok(None);
    };
    let set = load_set(tx, set_id)?;
    Ok(set.companion_of(gauge_id).cloned())
}

/// Every well-formed set, ordered by identifier
///
/// Sets that fail to resolve are skipped with a warning; the integrity scan
/// reports them.
pub fn list_sets(tx: &Tx<'_>) -> Result<Vec<GaugeSet>> {
    let mut sets = Vec::new();
    for (set_id, _) in tx.set_member_counts()? {
        match load_set(tx, &set_id) {
            Ok(set) => sets.push(set),
            Err(GaugeError::Integrity(message)) => {
                tracing::warn!(set_id = %set_id, "skipping malformed set: {}", message)
            }
            Err(e) => return Err(e),
        }
    }
    Ok(sets)
}

/// Input for creating a brand-new set at intake
#[derive(Debug, Clone)]
pub struct NewSet {
    pub category: String,
    pub go_spec: GaugeSpec,
    pub nogo_spec: GaugeSpec,
    pub location: String,
    pub ownership: Ownership,
}

/// Pairs, unpairs, and substitutes set members
pub struct SetManager<'a> {
    auth: &'a dyn Authorizer,
}

impl<'a> SetManager<'a> {
    pub fn new(auth: &'a dyn Authorizer) -> Self {
        Self { auth }
    }

    /// Intake a new GO/NOGO pair under one freshly generated base identifier
    pub fn create_set(&self, tx: &Tx<'_>, new: &NewSet, actor: &str) -> Result<GaugeSet> {
        let category = normalize_category(&new.category)?;
        require(self.auth, actor, Action::Intake, &category)?;
        let location = require_location(&new.location)?;

        for spec in [&new.go_spec, &new.nogo_spec] {
            if spec.equipment_type() != EquipmentType::ThreadGauge {
                return Err(GaugeError::validation(format!(
                    "sets are made of thread gauges, not {}",
                    spec.equipment_type()
                )));
            }
        }
        if new.go_spec.key() != new.nogo_spec.key() {
            return Err(GaugeError::validation(
                "GO and NOGO specifications must match exactly",
            ));
        }

        let base = reserve_base(tx, &category, EquipmentType::ThreadGauge)?;
        let now = tx.now();
        let member = |role: GaugeRole, spec: &GaugeSpec| Gauge {
            id: derive_gauge_id(&base, role),
            set_id: Some(base.clone()),
            category: category.clone(),
            spec: spec.clone(),
            role: Some(role),
            status: GaugeStatus::Available,
            ownership: new.ownership,
            location: Some(location.to_string()),
            created: now,
            updated: now,
        };
        let go = member(GaugeRole::Go, &new.go_spec);
        let nogo = member(GaugeRole::Nogo, &new.nogo_spec);
        tx.insert_gauge(&go)?;
        tx.insert_gauge(&nogo)?;

        tx.insert_set_event(&SetEvent {
            set_id: base.clone(),
            kind: SetEventKind::Created,
            gauge_ids: vec![go.id.clone(), nogo.id.clone()],
            outgoing: None,
            incoming: None,
            actor: actor.to_string(),
            reason: None,
            timestamp: now,
        })?;

        tracing::info!(set_id = %base, go = %go.id, nogo = %nogo.id, "set created");
        Ok(GaugeSet {
            set_id: base,
            go,
            nogo,
        })
    }

    /// Pair two spares into a new set at `location`
    pub fn pair_spares(
        &self,
        tx: &Tx<'_>,
        gauge_a: &str,
        gauge_b: &str,
        location: &str,
        actor: &str,
    ) -> Result<GaugeSet> {
        let location = require_location(location)?;
        if gauge_a == gauge_b {
            return Err(GaugeError::validation("a gauge cannot be paired with itself"));
        }

        let a = tx.require_gauge(gauge_a)?;
        let b = tx.require_gauge(gauge_b)?;
        require(self.auth, actor, Action::ManageSets, &format!("{}+{}", a.id, b.id))?;

        for g in [&a, &b] {
            if let Some(existing) = &g.set_id {
                return Err(GaugeError::conflict(format!(
                    "gauge {} already belongs to set {}",
                    g.id, existing
                )));
            }
            ensure_pairable_status(g)?;
        }
        check_compatible(&a, &b).map_err(|e| GaugeError::validation(e.to_string()))?;

        let (go, nogo) = if a.role == Some(GaugeRole::Go) {
            (&a, &b)
        } else {
            (&b, &a)
        };
        let set_id = generate_set_id(tx, &go.category)?;

        for g in [go, nogo] {
            tx.update_set_id_if(&g.id, None, Some(&set_id))?;
            tx.update_location(&g.id, location)?;
        }

        tx.insert_set_event(&SetEvent {
            set_id: set_id.clone(),
            kind: SetEventKind::Paired,
            gauge_ids: vec![go.id.clone(), nogo.id.clone()],
            outgoing: None,
            incoming: None,
            actor: actor.to_string(),
            reason: None,
            timestamp: tx.now(),
        })?;

        tracing::info!(%set_id, go = %go.id, nogo = %nogo.id, location, "spares paired");
        load_set(tx, &set_id)
    }

    /// Dissolve a set; both members become spares with their status untouched
    pub fn unpair_set(&self, tx: &Tx<'_>, set_id: &str, reason: &str, actor: &str) -> Result<()> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(GaugeError::validation("a reason is required to unpair a set"));
        }
        require(self.auth, actor, Action::ManageSets, set_id)?;

        let members = tx.gauges_in_set(set_id)?;
        match members.len() {
            2 => {}
            n if n < 2 => {
                tracing::warn!(set_id, members = n, "unpair requested for incomplete set");
                return Err(GaugeError::NotFound {
                    kind: "Complete set",
                    id: set_id.to_string(),
                });
            }
            n => return Err(cardinality_violation(set_id, n)),
        }

        for g in &members {
            tx.update_set_id_if(&g.id, Some(set_id), None)?;
        }

        tx.insert_set_event(&SetEvent {
            set_id: set_id.to_string(),
            kind: SetEventKind::Unpaired,
            gauge_ids: members.iter().map(|g| g.id.clone()).collect(),
            outgoing: None,
            incoming: None,
            actor: actor.to_string(),
            reason: Some(reason.to_string()),
            timestamp: tx.now(),
        })?;

        tracing::info!(set_id, reason, "set unpaired");
        Ok(())
    }

    /// Swap `outgoing` out of the set for the compatible spare `incoming`
    ///
    /// The surviving member's set identifier is never written.
    pub fn replace_gauge(
        &self,
        tx: &Tx<'_>,
        set_id: &str,
        outgoing: &str,
        incoming: &str,
        actor: &str,
    ) -> Result<GaugeSet> {
        let set = load_set(tx, set_id)?;
        require(self.auth, actor, Action::ManageSets, set_id)?;

        let survivor = set.companion_of(outgoing).cloned().ok_or_else(|| {
            GaugeError::validation(format!("{} is not a member of set {}", outgoing, set_id))
        })?;

        let replacement = tx.require_gauge(incoming)?;
        if let Some(existing) = &replacement.set_id {
            return Err(GaugeError::conflict(format!(
                "gauge {} already belongs to set {}",
                incoming, existing
            )));
        }
        ensure_pairable_status(&replacement)?;
        if replacement.status != survivor.status {
            return Err(GaugeError::conflict(format!(
                "{} is {} but {} is {}; a replacement must share the surviving member's status",
                incoming, replacement.status, survivor.id, survivor.status
            )));
        }

        let compatible = find_compatible_spares(tx, &survivor.id)?
            .iter()
            .any(|g| g.id == replacement.id);
        if !compatible {
            let reason = check_compatible(&survivor, &replacement)
                .err()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "not in the spare pool".to_string());
            return Err(GaugeError::validation(format!(
                "{} cannot replace {}: {}",
                incoming, outgoing, reason
            )));
        }

        tx.update_set_id_if(outgoing, Some(set_id), None)?;
        tx.update_set_id_if(incoming, None, Some(set_id))?;
        if let Some(location) = survivor.location.as_deref() {
            tx.update_location(incoming, location)?;
        }

        tx.insert_set_event(&SetEvent {
            set_id: set_id.to_string(),
            kind: SetEventKind::Replaced,
            gauge_ids: vec![survivor.id.clone(), incoming.to_string()],
            outgoing: Some(outgoing.to_string()),
            incoming: Some(incoming.to_string()),
            actor: actor.to_string(),
            reason: None,
            timestamp: tx.now(),
        })?;

        tracing::info!(set_id, outgoing, incoming, "set member replaced");
        load_set(tx, set_id)
    }
}

fn require_location(location: &str) -> Result<&str> {
    let location = location.trim();
    if location.is_empty() {
        return Err(GaugeError::validation("a location is required"));
    }
    Ok(location)
}

fn ensure_pairable_status(gauge: &Gauge) -> Result<()> {
    match gauge.status {
        GaugeStatus::CheckedOut | GaugeStatus::PendingTransfer => Err(GaugeError::conflict(
            format!("gauge {} is checked out and cannot be paired", gauge.id),
        )),
        status if status.is_terminal() => Err(GaugeError::conflict(format!(
            "gauge {} is {} and cannot be paired",
            gauge.id, status
        ))),
        _ => Ok(()),
    }
}
