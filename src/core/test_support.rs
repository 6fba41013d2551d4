//! Fixtures shared by the engine unit tests

use chrono::{Duration, NaiveDate, Utc};

use crate::core::store::{Store, Tx};
use crate::entities::{
    Certificate, Gauge, GaugeRole, GaugeSpec, GaugeStatus, HandToolSpec, Ownership, ThreadSpec,
};

pub fn thread_spec(size: &str, class: &str) -> GaugeSpec {
    GaugeSpec::ThreadGauge(ThreadSpec {
        thread_size: size.to_string(),
        thread_class: class.to_string(),
        thread_form: "UNC".to_string(),
    })
}

pub fn micrometer_spec() -> GaugeSpec {
    GaugeSpec::HandTool(HandToolSpec {
        tool_type: "micrometer".to_string(),
        range_min: 0.0,
        range_max: 1.0,
        unit: "in".to_string(),
        resolution: Some(0.0001),
    })
}

pub fn gauge(id: &str, spec: GaugeSpec, role: Option<GaugeRole>) -> Gauge {
    let now = Utc::now();
    Gauge {
        id: id.to_string(),
        set_id: None,
        category: "UN".to_string(),
        spec,
        role,
        status: GaugeStatus::Available,
        ownership: Ownership::Company,
        location: Some("CRIB".to_string()),
        created: now,
        updated: now,
    }
}

/// Insert a spare thread gauge
pub fn insert_thread(tx: &Tx<'_>, id: &str, role: GaugeRole, size: &str, class: &str) -> Gauge {
    let g = gauge(id, thread_spec(size, class), Some(role));
    tx.insert_gauge(&g).unwrap();
    g
}

/// Insert a thread gauge already belonging to `set_id`
pub fn insert_member(tx: &Tx<'_>, id: &str, role: GaugeRole, set_id: &str) -> Gauge {
    let mut g = gauge(id, thread_spec(".250-20", "2A"), Some(role));
    g.set_id = Some(set_id.to_string());
    tx.insert_gauge(&g).unwrap();
    g
}

/// Store with set `S1` = {G1 (GO), G2 (NOGO)}, both available
pub fn store_with_set() -> Store {
    let mut store = Store::open_in_memory().unwrap();
    let tx = store.begin().unwrap();
    insert_member(&tx, "G1", GaugeRole::Go, "S1");
    insert_member(&tx, "G2", GaugeRole::Nogo, "S1");
    tx.commit().unwrap();
    store
}

/// Force a status without going through the state machine
pub fn force_status(tx: &Tx<'_>, id: &str, status: GaugeStatus) {
    let current = tx.require_gauge(id).unwrap().status;
    tx.update_status_if(id, current, status, None).unwrap();
}

/// Record a current certificate valid for a year, bypassing the ledger
pub fn insert_certificate(tx: &Tx<'_>, id: &str, gauge_id: &str) {
    tx.insert_certificate(&Certificate {
        id: id.to_string(),
        gauge_id: gauge_id.to_string(),
        file_ref: format!("ref-{}", id),
        file_name: "cert.pdf".to_string(),
        uploaded_by: "cal".to_string(),
        uploaded_at: tx.now(),
        valid_until: in_days(365),
        is_current: true,
        supersedes: None,
        superseded_by: None,
    })
    .unwrap();
}

pub fn in_days(days: i64) -> NaiveDate {
    (Utc::now() + Duration::days(days)).date_naive()
}
