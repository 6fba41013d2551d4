//! Calibration workflow orchestration
//!
//! Drives sets through send, receive, certify, release, and cancel-back.
//! Every status change is delegated to the [`StatusMachine`]; certificates go
//! through the [`CertificateLedger`].
//!
//! Single-set operations take the caller's transaction. Batch operations open
//! one transaction per set so that a failing set never blocks the others.

use serde::Serialize;

use crate::core::auth::Authorizer;
use crate::core::blob::BlobStore;
use crate::core::companion::load_set;
use crate::core::error::{GaugeError, Result};
use crate::core::identity::new_batch_id;
use crate::core::integrity::audit_failure;
use crate::core::ledger::{certified_this_cycle, CertificateLedger, CertificateUpload};
use crate::core::status::{StatusMachine, TransitionContext};
use crate::core::store::{Store, Tx};
use crate::entities::{
    Batch, BatchMember, BatchReport, BatchStage, BatchStatus, Certificate, Gauge, GaugeSet,
    GaugeStatus, SetOutcome,
};

/// Result of uploading a certificate during calibration
#[derive(Debug, Clone, Serialize)]
pub struct CertifyOutcome {
    pub certificate: Certificate,
    /// Set the gauge belongs to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_id: Option<String>,
    /// Status of the certified gauge after the companion check
    pub status: GaugeStatus,
    /// Whether the upload advanced the gauge (and its companion) to pending_release
    pub advanced: bool,
    /// Companion still waiting for its own certificate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waiting_on: Option<String>,
}

pub struct CalibrationWorkflow<'a> {
    auth: &'a dyn Authorizer,
    blobs: &'a dyn BlobStore,
}

impl<'a> CalibrationWorkflow<'a> {
    pub fn new(auth: &'a dyn Authorizer, blobs: &'a dyn BlobStore) -> Self {
        Self { auth, blobs }
    }

    fn machine(&self) -> StatusMachine<'a> {
        StatusMachine::new(self.auth)
    }

    // =========================================================================
    // Single-set stages
    // =========================================================================

    /// Stage 1: both members go out for calibration
    pub fn send_set(
        &self,
        tx: &Tx<'_>,
        set_id: &str,
        batch_id: Option<&str>,
        actor: &str,
    ) -> Result<GaugeSet> {
        let ctx = TransitionContext {
            reason: batch_id.map(|b| format!("sent in {}", b)),
            location: None,
        };
        let set = self
            .machine()
            .transition_set(tx, set_id, GaugeStatus::OutForCalibration, actor, &ctx)?;
        if let Some(batch_id) = batch_id {
            tx.insert_batch_member(
                batch_id,
                &BatchMember {
                    set_id: set_id.to_string(),
                    stage: BatchStage::Sent,
                    updated: tx.now(),
                },
            )?;
        }
        tracing::info!(set_id, batch_id, "set sent for calibration");
        Ok(set)
    }

    /// Stage 2: the vendor returned the physical gauges
    ///
    /// Members already received by an early certificate upload stay where
    /// they are. The companion check runs afterwards, so certificates that
    /// arrived before the gauges advance the set right away.
    pub fn receive_set(&self, tx: &Tx<'_>, set_id: &str, actor: &str) -> Result<GaugeSet> {
        let set = load_set(tx, set_id)?;
        let outstanding: Vec<&Gauge> = set
            .members()
            .into_iter()
            .filter(|m| m.status != GaugeStatus::PendingCertificate)
            .collect();
        if outstanding.is_empty() {
            return Err(GaugeError::conflict(format!(
                "set {} has already been received",
                set_id
            )));
        }

        self.machine().transition_members(
            tx,
            &outstanding,
            GaugeStatus::PendingCertificate,
            actor,
            &TransitionContext::with_reason("received from calibration"),
        )?;
        tx.set_batch_stage(set_id, BatchStage::Received)?;
        tracing::info!(set_id, "set received from calibration");

        self.companion_check(tx, set_id, actor)?;
        load_set(tx, set_id)
    }

    /// Stages 3 and 4: upload a certificate for one gauge, then run the
    /// companion check
    ///
    /// A gauge still out for calibration is received on its own first; its
    /// companion keeps its status until its own certificate or the set
    /// receive arrives.
    pub fn certify_gauge(
        &self,
        tx: &Tx<'_>,
        gauge_id: &str,
        upload: &CertificateUpload<'_>,
        uploader: &str,
    ) -> Result<CertifyOutcome> {
        let gauge = tx.require_gauge(gauge_id)?;
        if !matches!(
            gauge.status,
            GaugeStatus::OutForCalibration | GaugeStatus::PendingCertificate
        ) {
            return Err(GaugeError::conflict(format!(
                "gauge {} is {}; certificates are recorded once it is out_for_calibration or pending_certificate",
                gauge_id, gauge.status
            )));
        }
        let set = gauge.set_id.as_deref().map(|id| load_set(tx, id)).transpose()?;

        if gauge.status == GaugeStatus::OutForCalibration {
            self.machine().transition_members(
                tx,
                &[&gauge],
                GaugeStatus::PendingCertificate,
                uploader,
                &TransitionContext::with_reason("received with certificate"),
            )?;
            if let Some(set) = &set {
                let companion_received = set
                    .companion_of(gauge_id)
                    .is_some_and(|c| c.status == GaugeStatus::PendingCertificate);
                if companion_received {
                    tx.set_batch_stage(&set.set_id, BatchStage::Received)?;
                }
            }
        }

        let certificate = CertificateLedger::new(self.auth, self.blobs)
            .upload_certificate(tx, gauge_id, upload, uploader)?;

        let (status, advanced, waiting_on) = match gauge.set_id.as_deref() {
            Some(set_id) => self.companion_check(tx, set_id, uploader)?,
            None => self.advance_single(tx, &gauge, uploader)?,
        };

        Ok(CertifyOutcome {
            certificate,
            set_id: gauge.set_id,
            status,
            advanced,
            waiting_on,
        })
    }

    /// Advance a set to pending_release once both members hold a certificate
    /// from this calibration cycle that is valid today
    ///
    /// Returns the certified gauge's resulting status, whether the set
    /// advanced, and the member still waiting if not.
    pub fn companion_check(
        &self,
        tx: &Tx<'_>,
        set_id: &str,
        actor: &str,
    ) -> Result<(GaugeStatus, bool, Option<String>)> {
        let set = load_set(tx, set_id)?;

        let mut waiting = None;
        for member in set.members() {
            if member.status != GaugeStatus::PendingCertificate || !certified_this_cycle(tx, member)? {
                waiting = Some(member.id.clone());
                break;
            }
        }
        if let Some(waiting) = waiting {
            tracing::debug!(set_id, waiting = %waiting, "companion not yet certified");
            return Ok((GaugeStatus::PendingCertificate, false, Some(waiting)));
        }

        self.machine().transition_set(
            tx,
            set_id,
            GaugeStatus::PendingRelease,
            actor,
            &TransitionContext::with_reason("both members certified"),
        )?;
        tx.set_batch_stage(set_id, BatchStage::Certified)?;
        tracing::info!(set_id, "set certified; awaiting release");
        Ok((GaugeStatus::PendingRelease, true, None))
    }

    fn advance_single(
        &self,
        tx: &Tx<'_>,
        gauge: &Gauge,
        actor: &str,
    ) -> Result<(GaugeStatus, bool, Option<String>)> {
        if !certified_this_cycle(tx, gauge)? {
            return Ok((GaugeStatus::PendingCertificate, false, None));
        }
        self.machine().transition(
            tx,
            &gauge.id,
            GaugeStatus::PendingRelease,
            actor,
            &TransitionContext::with_reason("certified"),
        )?;
        Ok((GaugeStatus::PendingRelease, true, None))
    }

    /// Stages 5 and 6: release to a verified location
    pub fn release_set(
        &self,
        tx: &Tx<'_>,
        set_id: &str,
        location: &str,
        actor: &str,
    ) -> Result<GaugeSet> {
        let location = location.trim();
        if location.is_empty() {
            return Err(GaugeError::validation(format!(
                "releasing set {} requires a verified location",
                set_id
            )));
        }
        let set = self.machine().transition_set(
            tx,
            set_id,
            GaugeStatus::Available,
            actor,
            &TransitionContext {
                reason: Some("released from calibration".to_string()),
                location: Some(location.to_string()),
            },
        )?;
        tx.set_batch_stage(set_id, BatchStage::Released)?;
        tracing::info!(set_id, location, "set released");
        Ok(set)
    }

    /// Stage 7: revert a certified set to pending_certificate
    ///
    /// Uploaded certificates stay current.
    pub fn cancel_back(
        &self,
        tx: &Tx<'_>,
        set_id: &str,
        reason: Option<&str>,
        actor: &str,
    ) -> Result<GaugeSet> {
        let set = self.machine().transition_set(
            tx,
            set_id,
            GaugeStatus::PendingCertificate,
            actor,
            &TransitionContext {
                reason: Some(reason.unwrap_or("cancelled back").to_string()),
                location: None,
            },
        )?;
        tx.set_batch_stage(set_id, BatchStage::Received)?;
        tracing::info!(set_id, "set cancelled back to pending_certificate");
        Ok(set)
    }

    // =========================================================================
    // Batches
    // =========================================================================

    /// Send several sets in one batch
    ///
    /// Each set is sent in its own transaction; failures are reported per set.
    pub fn send_batch(
        &self,
        store: &mut Store,
        set_ids: &[String],
        vendor: Option<&str>,
        actor: &str,
    ) -> Result<BatchReport> {
        let set_ids = dedup(set_ids)?;

        let batch_id = new_batch_id();
        let tx = store.begin()?;
        tx.insert_batch(&Batch {
            id: batch_id.clone(),
            created_by: actor.to_string(),
            created: tx.now(),
            vendor: vendor.map(str::to_string),
            members: Vec::new(),
        })?;
        tx.commit()?;

        let outcomes = run_per_set(store, &set_ids, |tx, set_id| {
            self.send_set(tx, set_id, Some(&batch_id), actor).map(|_| ())
        });

        let tx = store.begin()?;
        let status = batch_status(&tx, &batch_id)?;
        tracing::info!(batch_id = %batch_id, sent = status.sent, requested = set_ids.len(), "batch sent");
        Ok(BatchReport {
            batch_id: Some(batch_id),
            outcomes,
            status: Some(status),
        })
    }

    pub fn receive_batch(&self, store: &mut Store, set_ids: &[String], actor: &str) -> Result<BatchReport> {
        let set_ids = dedup(set_ids)?;
        let outcomes = run_per_set(store, &set_ids, |tx, set_id| {
            self.receive_set(tx, set_id, actor).map(|_| ())
        });
        Ok(BatchReport {
            batch_id: None,
            outcomes,
            status: None,
        })
    }

    pub fn release_batch(
        &self,
        store: &mut Store,
        set_ids: &[String],
        location: &str,
        actor: &str,
    ) -> Result<BatchReport> {
        let set_ids = dedup(set_ids)?;
        let outcomes = run_per_set(store, &set_ids, |tx, set_id| {
            self.release_set(tx, set_id, location, actor).map(|_| ())
        });
        Ok(BatchReport {
            batch_id: None,
            outcomes,
            status: None,
        })
    }

    pub fn cancel_batch(
        &self,
        store: &mut Store,
        set_ids: &[String],
        reason: Option<&str>,
        actor: &str,
    ) -> Result<BatchReport> {
        let set_ids = dedup(set_ids)?;
        let outcomes = run_per_set(store, &set_ids, |tx, set_id| {
            self.cancel_back(tx, set_id, reason, actor).map(|_| ())
        });
        Ok(BatchReport {
            batch_id: None,
            outcomes,
            status: None,
        })
    }
}

/// Aggregate progress of a batch
pub fn batch_status(tx: &Tx<'_>, batch_id: &str) -> Result<BatchStatus> {
    let batch = tx.get_batch(batch_id)?.ok_or_else(|| GaugeError::NotFound {
        kind: "Batch",
        id: batch_id.to_string(),
    })?;
    Ok(BatchStatus::from_batch(&batch))
}

/// Sets in a batch still at `stage`
pub fn batch_sets_at(tx: &Tx<'_>, batch_id: &str, stage: BatchStage) -> Result<Vec<String>> {
    let batch = tx.get_batch(batch_id)?.ok_or_else(|| GaugeError::NotFound {
        kind: "Batch",
        id: batch_id.to_string(),
    })?;
    Ok(batch
        .members
        .into_iter()
        .filter(|m| m.stage == stage)
        .map(|m| m.set_id)
        .collect())
}

fn dedup(set_ids: &[String]) -> Result<Vec<String>> {
    let mut unique: Vec<String> = Vec::with_capacity(set_ids.len());
    for id in set_ids {
        let id = id.trim();
        if !id.is_empty() && !unique.iter().any(|u| u == id) {
            unique.push(id.to_string());
        }
    }
    if unique.is_empty() {
        return Err(GaugeError::validation("at least one set is required"));
    }
    Ok(unique)
}

/// Run `op` for each set in its own transaction, committing the successes
fn run_per_set<F>(store: &mut Store, set_ids: &[String], op: F) -> Vec<SetOutcome>
where
    F: Fn(&Tx<'_>, &str) -> Result<()>,
{
    set_ids
        .iter()
        .map(|set_id| {
            let result = store.begin().and_then(|tx| {
                op(&tx, set_id)?;
                tx.commit()
            });
            match result {
                Ok(()) => SetOutcome {
                    set_id: set_id.clone(),
                    error: None,
                },
                Err(e) => {
                    tracing::warn!(set_id = %set_id, error = %e, "set skipped in batch");
                    audit_failure(store, set_id, &e);
                    SetOutcome {
                        set_id: set_id.clone(),
                        error: Some(e.to_string()),
                    }
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::AllowAll;
    use crate::core::blob::FsBlobStore;
    use crate::core::error::ErrorKind;
    use crate::core::test_support::{force_status, in_days, insert_member, store_with_set};
    use crate::entities::GaugeRole;
    use tempfile::TempDir;

    fn cert(content: &'static [u8]) -> CertificateUpload<'static> {
        CertificateUpload {
            file_name: "cert.pdf".to_string(),
            content,
            valid_until: in_days(365),
        }
    }

    fn status_of(tx: &Tx<'_>, id: &str) -> GaugeStatus {
        tx.require_gauge(id).unwrap().status
    }

    #[test]
    fn test_full_cycle_with_companion_check() {
        let dir = TempDir::new().unwrap();
        let blobs = FsBlobStore::new(dir.path());
        let flow = CalibrationWorkflow::new(&AllowAll, &blobs);
        let mut store = store_with_set();
        let tx = store.begin().unwrap();

        flow.send_set(&tx, "S1", None, "cal").unwrap();
        assert_eq!(status_of(&tx, "G1"), GaugeStatus::OutForCalibration);
        assert_eq!(status_of(&tx, "G2"), GaugeStatus::OutForCalibration);

        flow.receive_set(&tx, "S1", "cal").unwrap();

        let first = flow.certify_gauge(&tx, "G1", &cert(b"g1"), "cal").unwrap();
        assert!(!first.advanced);
        assert_eq!(first.waiting_on.as_deref(), Some("G2"));
        assert_eq!(status_of(&tx, "G1"), GaugeStatus::PendingCertificate);
        assert_eq!(status_of(&tx, "G2"), GaugeStatus::PendingCertificate);

        let second = flow.certify_gauge(&tx, "G2", &cert(b"g2"), "cal").unwrap();
        assert!(second.advanced);
        assert_eq!(status_of(&tx, "G1"), GaugeStatus::PendingRelease);
        assert_eq!(status_of(&tx, "G2"), GaugeStatus::PendingRelease);

        let err = flow.release_set(&tx, "S1", "  ", "cal").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let set = flow.release_set(&tx, "S1", "A2", "cal").unwrap();
        assert_eq!(set.go.status, GaugeStatus::Available);
        assert_eq!(set.location(), Some("A2"));
    }

    #[test]
    fn test_expired_certificate_does_not_advance() {
        let dir = TempDir::new().unwrap();
        let blobs = FsBlobStore::new(dir.path());
        let flow = CalibrationWorkflow::new(&AllowAll, &blobs);
        let mut store = store_with_set();
        let tx = store.begin().unwrap();
        flow.send_set(&tx, "S1", None, "cal").unwrap();
        flow.receive_set(&tx, "S1", "cal").unwrap();

        flow.certify_gauge(&tx, "G1", &cert(b"g1"), "cal").unwrap();
        let expired = CertificateUpload {
            file_name: "late.pdf".to_string(),
            content: b"g2",
            valid_until: in_days(-3),
        };
        let outcome = flow.certify_gauge(&tx, "G2", &expired, "cal").unwrap();

        assert!(!outcome.advanced);
        assert_eq!(status_of(&tx, "G2"), GaugeStatus::PendingCertificate);
    }

    #[test]
    fn test_cancel_back_keeps_certificates() {
        let dir = TempDir::new().unwrap();
        let blobs = FsBlobStore::new(dir.path());
        let flow = CalibrationWorkflow::new(&AllowAll, &blobs);
        let mut store = store_with_set();
        let tx = store.begin().unwrap();
        flow.send_set(&tx, "S1", None, "cal").unwrap();
        flow.receive_set(&tx, "S1", "cal").unwrap();
        flow.certify_gauge(&tx, "G1", &cert(b"g1"), "cal").unwrap();
        flow.certify_gauge(&tx, "G2", &cert(b"g2"), "cal").unwrap();

        flow.cancel_back(&tx, "S1", Some("wrong cert attached"), "cal").unwrap();

        assert_eq!(status_of(&tx, "G1"), GaugeStatus::PendingCertificate);
        assert!(tx.current_certificate("G1").unwrap().is_some());
        assert!(tx.current_certificate("G2").unwrap().is_some());

        // A corrected upload re-runs the companion check
        let outcome = flow.certify_gauge(&tx, "G2", &cert(b"g2-fixed"), "cal").unwrap();
        assert!(outcome.advanced);
        assert_eq!(tx.certificates_for("G2").unwrap().len(), 2);
    }

    #[test]
    fn test_certificates_before_receive_advance_the_set() {
        let dir = TempDir::new().unwrap();
        let blobs = FsBlobStore::new(dir.path());
        let flow = CalibrationWorkflow::new(&AllowAll, &blobs);
        let mut store = store_with_set();
        let tx = store.begin().unwrap();
        flow.send_set(&tx, "S1", None, "cal").unwrap();

        let first = flow.certify_gauge(&tx, "G1", &cert(b"g1"), "cal").unwrap();
        assert!(!first.advanced);
        assert_eq!(status_of(&tx, "G1"), GaugeStatus::PendingCertificate);
        assert_eq!(status_of(&tx, "G2"), GaugeStatus::OutForCalibration);

        let second = flow.certify_gauge(&tx, "G2", &cert(b"g2"), "cal").unwrap();
        assert!(second.advanced);
        assert_eq!(status_of(&tx, "G1"), GaugeStatus::PendingRelease);
        assert_eq!(status_of(&tx, "G2"), GaugeStatus::PendingRelease);
    }

    #[test]
    fn test_receive_runs_companion_check() {
        let dir = TempDir::new().unwrap();
        let blobs = FsBlobStore::new(dir.path());
        let flow = CalibrationWorkflow::new(&AllowAll, &blobs);
        let ledger = CertificateLedger::new(&AllowAll, &blobs);
        let mut store = store_with_set();
        let tx = store.begin().unwrap();
        flow.send_set(&tx, "S1", None, "cal").unwrap();

        // Certificates recorded straight into the ledger while the gauges are away
        ledger.upload_certificate(&tx, "G1", &cert(b"g1"), "cal").unwrap();
        ledger.upload_certificate(&tx, "G2", &cert(b"g2"), "cal").unwrap();
        assert_eq!(status_of(&tx, "G1"), GaugeStatus::OutForCalibration);

        let set = flow.receive_set(&tx, "S1", "cal").unwrap();
        assert_eq!(set.go.status, GaugeStatus::PendingRelease);
        assert_eq!(set.nogo.status, GaugeStatus::PendingRelease);
    }

    #[test]
    fn test_receive_completes_a_partly_received_set() {
        let dir = TempDir::new().unwrap();
        let blobs = FsBlobStore::new(dir.path());
        let flow = CalibrationWorkflow::new(&AllowAll, &blobs);
        let mut store = store_with_set();
        let tx = store.begin().unwrap();
        flow.send_set(&tx, "S1", None, "cal").unwrap();
        flow.certify_gauge(&tx, "G1", &cert(b"g1"), "cal").unwrap();

        let set = flow.receive_set(&tx, "S1", "cal").unwrap();
        assert_eq!(set.go.status, GaugeStatus::PendingCertificate);
        assert_eq!(set.nogo.status, GaugeStatus::PendingCertificate);
        assert_eq!(tx.status_history("G1").unwrap().len(), 2);

        let err = flow.receive_set(&tx, "S1", "cal").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_broken_set_stores_no_certificate_file() {
        let dir = TempDir::new().unwrap();
        let blobs = FsBlobStore::new(dir.path());
        let flow = CalibrationWorkflow::new(&AllowAll, &blobs);
        let mut store = store_with_set();
        let tx = store.begin().unwrap();
        insert_member(&tx, "G9", GaugeRole::Go, "S1");
        force_status(&tx, "G1", GaugeStatus::PendingCertificate);

        let err = flow.certify_gauge(&tx, "G1", &cert(b"orphan"), "cal").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Integrity);
        assert!(tx.certificates_for("G1").unwrap().is_empty());
        let reference = blobs.reference_for(b"orphan").unwrap();
        assert!(blobs.retrieve(&reference).is_err());
    }

    #[test]
    fn test_certify_requires_gauge_in_calibration() {
        let dir = TempDir::new().unwrap();
        let blobs = FsBlobStore::new(dir.path());
        let flow = CalibrationWorkflow::new(&AllowAll, &blobs);
        let mut store = store_with_set();
        let tx = store.begin().unwrap();

        let err = flow.certify_gauge(&tx, "G1", &cert(b"g1"), "cal").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(tx.certificates_for("G1").unwrap().is_empty());
    }

    #[test]
    fn test_batch_isolates_failing_sets() {
        let dir = TempDir::new().unwrap();
        let blobs = FsBlobStore::new(dir.path());
        let flow = CalibrationWorkflow::new(&AllowAll, &blobs);
        let mut store = store_with_set();
        {
            let tx = store.begin().unwrap();
            insert_member(&tx, "G3", GaugeRole::Go, "S2");
            insert_member(&tx, "G4", GaugeRole::Nogo, "S2");
            force_status(&tx, "G4", GaugeStatus::CheckedOut);
            tx.commit().unwrap();
        }

        let sets = vec!["S1".to_string(), "S2".to_string(), "S1".to_string()];
        let report = flow.send_batch(&mut store, &sets, Some("Acme Metrology"), "cal").unwrap();

        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.succeeded().count(), 1);
        let failed: Vec<_> = report.failed().map(|o| o.set_id.as_str()).collect();
        assert_eq!(failed, vec!["S2"]);
        let status = report.status.unwrap();
        assert_eq!(status.total_sets, 1);
        assert_eq!(status.sent, 1);

        let tx = store.begin().unwrap();
        assert_eq!(status_of(&tx, "G1"), GaugeStatus::OutForCalibration);
        assert_eq!(status_of(&tx, "G3"), GaugeStatus::Available);
        assert_eq!(status_of(&tx, "G4"), GaugeStatus::CheckedOut);
    }

    #[test]
    fn test_batch_status_tracks_stages() {
        let dir = TempDir::new().unwrap();
        let blobs = FsBlobStore::new(dir.path());
        let flow = CalibrationWorkflow::new(&AllowAll, &blobs);
        let mut store = store_with_set();

        let report = flow
            .send_batch(&mut store, &["S1".to_string()], None, "cal")
            .unwrap();
        let batch_id = report.batch_id.unwrap();

        flow.receive_batch(&mut store, &["S1".to_string()], "cal").unwrap();
        {
            let tx = store.begin().unwrap();
            assert_eq!(
                batch_sets_at(&tx, &batch_id, BatchStage::Received).unwrap(),
                vec!["S1".to_string()]
            );
            flow.certify_gauge(&tx, "G1", &cert(b"g1"), "cal").unwrap();
            flow.certify_gauge(&tx, "G2", &cert(b"g2"), "cal").unwrap();
            tx.commit().unwrap();
        }
        flow.release_batch(&mut store, &["S1".to_string()], "B7", "cal").unwrap();

        let tx = store.begin().unwrap();
        let status = batch_status(&tx, &batch_id).unwrap();
        assert_eq!(status.released, 1);
        assert!(status.is_complete());
        assert_eq!(
            batch_status(&tx, "BATCH-NONE").unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_broken_set_is_audited() {
        let dir = TempDir::new().unwrap();
        let blobs = FsBlobStore::new(dir.path());
        let flow = CalibrationWorkflow::new(&AllowAll, &blobs);
        let mut store = store_with_set();
        {
            let tx = store.begin().unwrap();
            insert_member(&tx, "G9", GaugeRole::Go, "S1");
            tx.commit().unwrap();
        }

        let report = flow
            .receive_batch(&mut store, &["S1".to_string()], "cal")
            .unwrap();
        assert_eq!(report.failed().count(), 1);

        let tx = store.begin().unwrap();
        let audit = tx.audit_entries_needing_review().unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].subject, "S1");
    }
}
