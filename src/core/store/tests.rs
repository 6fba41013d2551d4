//! Unit tests for the store module

use super::*;
use crate::core::error::ErrorKind;
use crate::core::test_support::{
    force_status, gauge, in_days, insert_member, insert_thread, micrometer_spec, store_with_set,
    thread_spec,
};
use crate::entities::SetEventKind;
use tempfile::tempdir;

fn certificate(id: &str, gauge_id: &str, is_current: bool) -> Certificate {
    Certificate {
        id: id.to_string(),
        gauge_id: gauge_id.to_string(),
        file_ref: format!("ref-{}", id),
        file_name: "cert.pdf".to_string(),
        uploaded_by: "cal".to_string(),
        uploaded_at: Utc::now(),
        valid_until: in_days(365),
        is_current,
        supersedes: None,
        superseded_by: None,
    }
}

fn event(set_id: &str, kind: SetEventKind, gauge_ids: &[&str]) -> SetEvent {
    SetEvent {
        set_id: set_id.to_string(),
        kind,
        gauge_ids: gauge_ids.iter().map(|s| s.to_string()).collect(),
        outgoing: None,
        incoming: None,
        actor: "qe".to_string(),
        reason: None,
        timestamp: Utc::now(),
    }
}

#[test]
fn test_store_persists_across_opens() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("nested").join("gauges.db");

    {
        let mut store = Store::open(&path).unwrap();
        let tx = store.begin().unwrap();
        insert_thread(&tx, "TG-UN-0001", GaugeRole::Go, ".250-20", "2A");
        tx.commit().unwrap();
    }

    let mut store = Store::open(&path).unwrap();
    let tx = store.begin().unwrap();
    let gauge = tx.require_gauge("TG-UN-0001").unwrap();
    assert_eq!(gauge.role, Some(GaugeRole::Go));
    assert_eq!(gauge.spec.summary(), ".250-20 2A UNC");
}

#[test]
fn test_dropped_transaction_rolls_back() {
    let mut store = Store::open_in_memory().unwrap();
    {
        let tx = store.begin().unwrap();
        insert_thread(&tx, "G1", GaugeRole::Go, ".250-20", "2A");
        assert_eq!(tx.next_sequence("TG-UN").unwrap(), 1);
    }

    let tx = store.begin().unwrap();
    assert!(tx.get_gauge("G1").unwrap().is_none());
    assert_eq!(tx.next_sequence("TG-UN").unwrap(), 1);
}

#[test]
fn test_duplicate_gauge_is_conflict() {
    let mut store = Store::open_in_memory().unwrap();
    let tx = store.begin().unwrap();
    let gauge = insert_thread(&tx, "G1", GaugeRole::Go, ".250-20", "2A");

    let err = tx.insert_gauge(&gauge).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[test]
fn test_require_missing_gauge() {
    let mut store = Store::open_in_memory().unwrap();
    let tx = store.begin().unwrap();
    let err = tx.require_gauge("NOPE").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_status_update_is_guarded() {
    let mut store = store_with_set();
    let tx = store.begin().unwrap();

    tx.update_status_if("G1", GaugeStatus::Available, GaugeStatus::CheckedOut, None)
        .unwrap();

    // A writer that still believes G1 is available loses
    let err = tx
        .update_status_if("G1", GaugeStatus::Available, GaugeStatus::OutOfService, None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(tx.require_gauge("G1").unwrap().status, GaugeStatus::CheckedOut);
}

#[test]
fn test_status_update_with_location() {
    let mut store = store_with_set();
    let tx = store.begin().unwrap();
    force_status(&tx, "G1", GaugeStatus::PendingRelease);

    tx.update_status_if(
        "G1",
        GaugeStatus::PendingRelease,
        GaugeStatus::Available,
        Some("CELL-7"),
    )
    .unwrap();

    let gauge = tx.require_gauge("G1").unwrap();
    assert_eq!(gauge.status, GaugeStatus::Available);
    assert_eq!(gauge.location.as_deref(), Some("CELL-7"));
}

#[test]
fn test_set_id_update_is_guarded() {
    let mut store = store_with_set();
    let tx = store.begin().unwrap();

    let err = tx.update_set_id_if("G1", None, Some("S9")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    tx.update_set_id_if("G1", Some("S1"), None).unwrap();
    assert!(tx.require_gauge("G1").unwrap().set_id.is_none());
}

#[test]
fn test_gauges_in_set_go_first() {
    let mut store = Store::open_in_memory().unwrap();
    let tx = store.begin().unwrap();
    insert_member(&tx, "A-NOGO", GaugeRole::Nogo, "S1");
    insert_member(&tx, "B-GO", GaugeRole::Go, "S1");

    let members = tx.gauges_in_set("S1").unwrap();
    let ids: Vec<&str> = members.iter().map(|g| g.id.as_str()).collect();
    assert_eq!(ids, vec!["B-GO", "A-NOGO"]);
    assert_eq!(tx.set_member_counts().unwrap(), vec![("S1".to_string(), 2)]);
}

#[test]
fn test_spare_candidates_exclude_members_and_retired() {
    let mut store = store_with_set();
    let tx = store.begin().unwrap();
    insert_thread(&tx, "G3", GaugeRole::Go, ".250-20", "2A");
    insert_thread(&tx, "G4", GaugeRole::Go, ".250-20", "2A");
    insert_thread(&tx, "G5", GaugeRole::Nogo, ".250-20", "2A");
    insert_thread(&tx, "G6", GaugeRole::Go, ".375-16", "2A");
    force_status(&tx, "G4", GaugeStatus::Retired);

    let key = thread_spec(".250-20", "2A").key();
    let spares = tx.spare_candidates(GaugeRole::Go, &key).unwrap();
    let ids: Vec<&str> = spares.iter().map(|g| g.id.as_str()).collect();
    assert_eq!(ids, vec!["G3"]);
}

#[test]
fn test_spare_candidates_match_normalized_key_columns() {
    let mut store = Store::open_in_memory().unwrap();
    let tx = store.begin().unwrap();
    insert_thread(&tx, "G1", GaugeRole::Nogo, " .250-20 ", "2a");
    tx.insert_gauge(&gauge("HT1", micrometer_spec(), None)).unwrap();

    let key = thread_spec(".250-20", "2A").key();
    let spares = tx.spare_candidates(GaugeRole::Nogo, &key).unwrap();
    assert_eq!(spares.len(), 1);
    assert_eq!(spares[0].id, "G1");

    let tool_key = micrometer_spec().key();
    assert!(tx.spare_candidates(GaugeRole::Nogo, &tool_key).unwrap().is_empty());
}

#[test]
fn test_sequences_are_per_scope() {
    let mut store = Store::open_in_memory().unwrap();
    let tx = store.begin().unwrap();
    assert_eq!(tx.next_sequence("TG-UN").unwrap(), 1);
    assert_eq!(tx.next_sequence("TG-UN").unwrap(), 2);
    assert_eq!(tx.next_sequence("HT-MIC").unwrap(), 1);
}

#[test]
fn test_gauge_id_exists_checks_set_ids() {
    let mut store = store_with_set();
    let tx = store.begin().unwrap();
    assert!(tx.gauge_id_exists("G1").unwrap());
    assert!(tx.gauge_id_exists("S1").unwrap());
    assert!(!tx.gauge_id_exists("S2").unwrap());
}

#[test]
fn test_status_history_newest_first() {
    let mut store = store_with_set();
    let tx = store.begin().unwrap();
    for (from, to) in [
        (GaugeStatus::Available, GaugeStatus::CheckedOut),
        (GaugeStatus::CheckedOut, GaugeStatus::PendingQc),
    ] {
        tx.insert_status_change(&StatusChange {
            gauge_id: "G1".to_string(),
            from,
            to,
            actor: "op".to_string(),
            timestamp: tx.now(),
            reason: None,
            location: None,
        })
        .unwrap();
    }

    let history = tx.status_history("G1").unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].to, GaugeStatus::PendingQc);
    assert!(tx.status_history("G2").unwrap().is_empty());
}

#[test]
fn test_set_history_for_gauge_matches_whole_ids() {
    let mut store = Store::open_in_memory().unwrap();
    let tx = store.begin().unwrap();
    tx.insert_set_event(&event("S1", SetEventKind::Created, &["G1", "G2"]))
        .unwrap();
    tx.insert_set_event(&event("S2", SetEventKind::Paired, &["G10", "G20"]))
        .unwrap();

    let mut replaced = event("S2", SetEventKind::Replaced, &["G10", "G1"]);
    replaced.outgoing = Some("G20".to_string());
    replaced.incoming = Some("G1".to_string());
    tx.insert_set_event(&replaced).unwrap();

    let for_g1 = tx.set_history_for_gauge("G1").unwrap();
    assert_eq!(for_g1.len(), 2);
    assert_eq!(for_g1[0].kind, SetEventKind::Replaced);

    let for_g2 = tx.set_history_for_gauge("G2").unwrap();
    assert_eq!(for_g2.len(), 1);
    assert_eq!(for_g2[0].gauge_ids, vec!["G1", "G2"]);

    let s2 = tx.set_history("S2").unwrap();
    assert_eq!(s2.len(), 2);
    assert_eq!(s2[0].outgoing.as_deref(), Some("G20"));
}

#[test]
fn test_certificate_supersession_rows() {
    let mut store = store_with_set();
    let tx = store.begin().unwrap();
    tx.insert_certificate(&certificate("C1", "G1", true)).unwrap();
    tx.mark_superseded("C1", "C2").unwrap();
    let mut second = certificate("C2", "G1", true);
    second.supersedes = Some("C1".to_string());
    tx.insert_certificate(&second).unwrap();

    let current = tx.current_certificate("G1").unwrap().unwrap();
    assert_eq!(current.id, "C2");

    let old = tx.get_certificate("C1").unwrap().unwrap();
    assert!(!old.is_current);
    assert_eq!(old.superseded_by.as_deref(), Some("C2"));

    // Superseding twice is a lost race
    let err = tx.mark_superseded("C1", "C3").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let all = tx.certificates_for("G1").unwrap();
    let ids: Vec<&str> = all.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["C2", "C1"]);
    assert!(tx.duplicate_current_certificates().unwrap().is_empty());
}

#[test]
fn test_batch_stage_skips_released_memberships() {
    let mut store = store_with_set();
    let tx = store.begin().unwrap();
    let now = tx.now();
    let member = |stage| BatchMember {
        set_id: "S1".to_string(),
        stage,
        updated: now,
    };

    tx.insert_batch(&Batch {
        id: "B-OLD".to_string(),
        created_by: "cal".to_string(),
        created: now,
        vendor: None,
        members: vec![member(BatchStage::Released)],
    })
    .unwrap();
    tx.insert_batch(&Batch {
        id: "B-NEW".to_string(),
        created_by: "cal".to_string(),
        created: now,
        vendor: Some("Acme Metrology".to_string()),
        members: vec![member(BatchStage::Sent)],
    })
    .unwrap();

    tx.set_batch_stage("S1", BatchStage::Received).unwrap();

    let old = tx.get_batch("B-OLD").unwrap().unwrap();
    assert_eq!(old.members[0].stage, BatchStage::Released);
    let new = tx.get_batch("B-NEW").unwrap().unwrap();
    assert_eq!(new.members[0].stage, BatchStage::Received);
    assert_eq!(new.vendor.as_deref(), Some("Acme Metrology"));

    assert!(tx.get_batch("B-NONE").unwrap().is_none());
    assert_eq!(tx.batch_ids().unwrap().len(), 2);
}

#[test]
fn test_audit_entries_needing_review() {
    let mut store = Store::open_in_memory().unwrap();
    let tx = store.begin().unwrap();
    for (subject, needs_review) in [("S1", true), ("S2", false)] {
        tx.insert_audit(&AuditEntry {
            timestamp: tx.now(),
            category: "integrity".to_string(),
            subject: subject.to_string(),
            message: "set has 3 members".to_string(),
            needs_review,
        })
        .unwrap();
    }

    let entries = tx.audit_entries_needing_review().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].subject, "S1");
}
