//! Gauge tracker service
//!
//! The upward-facing API. Every operation runs in one transaction that is
//! committed on success and rolled back on any error; integrity errors are
//! additionally written to the audit log in a transaction of their own.

use chrono::{Duration, NaiveDate};
use std::io::Read;

use crate::core::auth::{require, Action, AllowAll, Authorizer};
use crate::core::blob::{BlobStore, FsBlobStore};
use crate::core::calibration::{batch_sets_at, batch_status, CalibrationWorkflow, CertifyOutcome};
use crate::core::companion::{self, NewSet, SetManager};
use crate::core::config::Config;
use crate::core::error::{GaugeError, Result};
use crate::core::identity::{generate_id, normalize_category};
use crate::core::integrity::{audit_failure, verify_integrity, IntegrityIssue};
use crate::core::ledger::{CertificateLedger, CertificateUpload, DueGauge};
use crate::core::project::Project;
use crate::core::spares::find_compatible_spares;
use crate::core::status::{StatusMachine, TransitionContext};
use crate::core::store::{AuditEntry, Store, Tx};
use crate::core::team::TeamRoster;
use crate::entities::{
    BatchReport, BatchStage, BatchStatus, Certificate, Gauge, GaugeRole, GaugeSet,
    GaugeSpec, GaugeStatus, Ownership, SetEvent, StatusChange,
};

/// Input for intake of a single gauge
#[derive(Debug, Clone)]
pub struct NewGauge {
    pub category: String,
    pub spec: GaugeSpec,
    /// Required for thread gauges, forbidden otherwise
    pub role: Option<GaugeRole>,
    pub ownership: Ownership,
    pub location: String,
}

/// Certificate upload request; `valid_until` defaults from config
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub gauge_id: String,
    pub file_name: String,
    pub content: Vec<u8>,
    pub valid_until: Option<NaiveDate>,
}

/// Borrowed collaborators handed to each operation
struct Engines<'a> {
    auth: &'a dyn Authorizer,
    blobs: &'a dyn BlobStore,
}

impl<'a> Engines<'a> {
    fn machine(&self) -> StatusMachine<'a> {
        StatusMachine::new(self.auth)
    }

    fn sets(&self) -> SetManager<'a> {
        SetManager::new(self.auth)
    }

    fn ledger(&self) -> CertificateLedger<'a> {
        CertificateLedger::new(self.auth, self.blobs)
    }

    fn calibration(&self) -> CalibrationWorkflow<'a> {
        CalibrationWorkflow::new(self.auth, self.blobs)
    }
}

pub struct GaugeTracker {
    store: Store,
    config: Config,
    auth: Box<dyn Authorizer>,
    blobs: Box<dyn BlobStore>,
}

impl GaugeTracker {
    pub fn new(
        store: Store,
        config: Config,
        auth: Box<dyn Authorizer>,
        blobs: Box<dyn BlobStore>,
    ) -> Self {
        Self {
            store,
            config,
            auth,
            blobs,
        }
    }

    /// Open the project's database and certificate store
    ///
    /// Authorization comes from `.gtt/team.yaml`; without one every actor is
    /// allowed everything.
    pub fn open(project: &Project) -> Result<Self> {
        let config = Config::load(project)?;
        let store = Store::open(&project.resolve(&config.database))?;
        let blobs = FsBlobStore::new(project.resolve(&config.blob_dir));
        let auth: Box<dyn Authorizer> = match TeamRoster::load(project) {
            Some(roster) => {
                tracing::debug!(members = roster.members.len(), "team roster loaded");
                Box::new(roster)
            }
            None => Box::new(AllowAll),
        };
        Ok(Self::new(store, config, auth, Box::new(blobs)))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run `op` in a transaction and commit it
    fn write<T>(
        &mut self,
        subject: &str,
        op: impl FnOnce(&Engines<'_>, &Tx<'_>) -> Result<T>,
    ) -> Result<T> {
        let engines = Engines {
            auth: self.auth.as_ref(),
            blobs: self.blobs.as_ref(),
        };
        let result = self.store.begin().and_then(|tx| {
            let value = op(&engines, &tx)?;
            tx.commit()?;
            Ok(value)
        });
        if let Err(e) = &result {
            audit_failure(&mut self.store, subject, e);
        }
        result
    }

    /// Run `op` in a transaction that is always rolled back
    fn read<T>(
        &mut self,
        subject: &str,
        op: impl FnOnce(&Engines<'_>, &Tx<'_>) -> Result<T>,
    ) -> Result<T> {
        let engines = Engines {
            auth: self.auth.as_ref(),
            blobs: self.blobs.as_ref(),
        };
        let result = self.store.begin().and_then(|tx| op(&engines, &tx));
        if let Err(e) = &result {
            audit_failure(&mut self.store, subject, e);
        }
        result
    }

    // =========================================================================
    // Intake and sets
    // =========================================================================

    pub fn intake_gauge(&mut self, new: &NewGauge, actor: &str) -> Result<Gauge> {
        self.write(&new.category, |engines, tx| {
            let category = normalize_category(&new.category)?;
            require(engines.auth, actor, Action::Intake, &category)?;
            let location = new.location.trim();
            if location.is_empty() {
                return Err(GaugeError::validation("a location is required"));
            }
            validate_spec(&new.spec)?;

            let id = generate_id(tx, &category, new.spec.equipment_type(), new.role)?;
            let now = tx.now();
            let gauge = Gauge {
                id,
                set_id: None,
                category,
                spec: new.spec.clone(),
                role: new.role,
                status: GaugeStatus::Available,
                ownership: new.ownership,
                location: Some(location.to_string()),
                created: now,
                updated: now,
            };
            tx.insert_gauge(&gauge)?;
            tracing::info!(gauge_id = %gauge.id, "gauge received");
            Ok(gauge)
        })
    }

    pub fn create_set(&mut self, new: &NewSet, actor: &str) -> Result<GaugeSet> {
        validate_spec(&new.go_spec)?;
        validate_spec(&new.nogo_spec)?;
        self.write(&new.category, |engines, tx| {
            engines.sets().create_set(tx, new, actor)
        })
    }

    pub fn pair_spares(
        &mut self,
        gauge_a: &str,
        gauge_b: &str,
        location: &str,
        actor: &str,
    ) -> Result<GaugeSet> {
        self.write(gauge_a, |engines, tx| {
            engines.sets().pair_spares(tx, gauge_a, gauge_b, location, actor)
        })
    }

    pub fn unpair_set(&mut self, set_id: &str, reason: &str, actor: &str) -> Result<()> {
        self.write(set_id, |engines, tx| {
            engines.sets().unpair_set(tx, set_id, reason, actor)
        })
    }

    pub fn replace_gauge(
        &mut self,
        set_id: &str,
        outgoing: &str,
        incoming: &str,
        actor: &str,
    ) -> Result<GaugeSet> {
        self.write(set_id, |engines, tx| {
            engines.sets().replace_gauge(tx, set_id, outgoing, incoming, actor)
        })
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn get_gauge(&mut self, gauge_id: &str) -> Result<Gauge> {
        self.read(gauge_id, |_, tx| tx.require_gauge(gauge_id))
    }

    pub fn list_gauges(&mut self, status: Option<GaugeStatus>) -> Result<Vec<Gauge>> {
        self.read("gauges", |_, tx| match status {
            Some(status) => tx.gauges_with_status(status),
            None => tx.all_gauges(),
        })
    }

    pub fn get_set(&mut self, set_id: &str) -> Result<GaugeSet> {
        self.read(set_id, |_, tx| companion::load_set(tx, set_id))
    }

    pub fn list_sets(&mut self) -> Result<Vec<GaugeSet>> {
        self.read("sets", |_, tx| companion::list_sets(tx))
    }

    pub fn companion_of(&mut self, gauge_id: &str) -> Result<Option<Gauge>> {
        self.read(gauge_id, |_, tx| companion::companion_of(tx, gauge_id))
    }

    pub fn find_compatible_spares(&mut self, gauge_id: &str) -> Result<Vec<Gauge>> {
        self.read(gauge_id, |_, tx| find_compatible_spares(tx, gauge_id))
    }

    pub fn status_history(&mut self, gauge_id: &str) -> Result<Vec<StatusChange>> {
        self.read(gauge_id, |_, tx| {
            tx.require_gauge(gauge_id)?;
            tx.status_history(gauge_id)
        })
    }

    /// Membership events for a set identifier, or for a gauge identifier
    pub fn set_history(&mut self, id: &str) -> Result<Vec<SetEvent>> {
        self.read(id, |_, tx| {
            let events = tx.set_history(id)?;
            if !events.is_empty() {
                return Ok(events);
            }
            if tx.get_gauge(id)?.is_some() {
                return tx.set_history_for_gauge(id);
            }
            Err(GaugeError::set_not_found(id))
        })
    }

    // =========================================================================
    // Status
    // =========================================================================

    pub fn transition(
        &mut self,
        gauge_id: &str,
        target: GaugeStatus,
        actor: &str,
        ctx: &TransitionContext,
    ) -> Result<GaugeStatus> {
        self.write(gauge_id, |engines, tx| {
            engines.machine().transition(tx, gauge_id, target, actor, ctx)
        })
    }

    pub fn retire(&mut self, gauge_id: &str, reason: Option<&str>, actor: &str) -> Result<()> {
        let ctx = TransitionContext {
            reason: reason.map(str::to_string),
            location: None,
        };
        self.transition(gauge_id, GaugeStatus::Retired, actor, &ctx)
            .map(|_| ())
    }

    pub fn record_customer_return(
        &mut self,
        gauge_id: &str,
        reason: Option<&str>,
        actor: &str,
    ) -> Result<()> {
        let ctx = TransitionContext {
            reason: reason.map(str::to_string),
            location: None,
        };
        self.write(gauge_id, |engines, tx| {
            engines
                .machine()
                .record_customer_return(tx, gauge_id, actor, &ctx)
                .map(|_| ())
        })
    }

    // =========================================================================
    // Calibration
    // =========================================================================

    pub fn send_to_calibration(
        &mut self,
        set_ids: &[String],
        vendor: Option<&str>,
        actor: &str,
    ) -> Result<BatchReport> {
        CalibrationWorkflow::new(self.auth.as_ref(), self.blobs.as_ref())
            .send_batch(&mut self.store, set_ids, vendor, actor)
    }

    pub fn receive_from_calibration(&mut self, set_ids: &[String], actor: &str) -> Result<BatchReport> {
        CalibrationWorkflow::new(self.auth.as_ref(), self.blobs.as_ref())
            .receive_batch(&mut self.store, set_ids, actor)
    }

    pub fn release(&mut self, set_ids: &[String], location: &str, actor: &str) -> Result<BatchReport> {
        CalibrationWorkflow::new(self.auth.as_ref(), self.blobs.as_ref())
            .release_batch(&mut self.store, set_ids, location, actor)
    }

    pub fn cancel_back(
        &mut self,
        set_ids: &[String],
        reason: Option<&str>,
        actor: &str,
    ) -> Result<BatchReport> {
        CalibrationWorkflow::new(self.auth.as_ref(), self.blobs.as_ref())
            .cancel_batch(&mut self.store, set_ids, reason, actor)
    }

    /// Upload a certificate
    ///
    /// A gauge in calibration (out_for_calibration or pending_certificate)
    /// goes through the companion check; any other gauge simply gets a new
    /// current certificate.
    pub fn upload_certificate(&mut self, request: &UploadRequest, uploader: &str) -> Result<CertifyOutcome> {
        let validity_days = i64::from(self.config.calibration.default_validity_days);
        self.write(&request.gauge_id, |engines, tx| {
            let upload = CertificateUpload {
                file_name: request.file_name.clone(),
                content: &request.content,
                valid_until: request
                    .valid_until
                    .unwrap_or_else(|| tx.today() + Duration::days(validity_days)),
            };
            let gauge = tx.require_gauge(&request.gauge_id)?;
            if matches!(
                gauge.status,
                GaugeStatus::OutForCalibration | GaugeStatus::PendingCertificate
            ) {
                return engines
                    .calibration()
                    .certify_gauge(tx, &gauge.id, &upload, uploader);
            }
            let certificate = engines
                .ledger()
                .upload_certificate(tx, &gauge.id, &upload, uploader)?;
            Ok(CertifyOutcome {
                certificate,
                set_id: gauge.set_id,
                status: gauge.status,
                advanced: false,
                waiting_on: None,
            })
        })
    }

    pub fn batch_status(&mut self, batch_id: &str) -> Result<BatchStatus> {
        self.read(batch_id, |_, tx| batch_status(tx, batch_id))
    }

    pub fn batch_ids(&mut self) -> Result<Vec<String>> {
        self.read("batches", |_, tx| tx.batch_ids())
    }

    /// Sets of a batch still at `stage`
    pub fn batch_sets_at(&mut self, batch_id: &str, stage: BatchStage) -> Result<Vec<String>> {
        self.read(batch_id, |_, tx| batch_sets_at(tx, batch_id, stage))
    }

    // =========================================================================
    // Certificates
    // =========================================================================

    pub fn certificate_history(&mut self, gauge_id: &str) -> Result<Vec<Certificate>> {
        self.read(gauge_id, |engines, tx| {
            engines.ledger().certificate_history(tx, gauge_id)
        })
    }

    pub fn open_certificate(&mut self, cert_id: &str) -> Result<(Certificate, Box<dyn Read>)> {
        self.read(cert_id, |engines, tx| engines.ledger().open_certificate(tx, cert_id))
    }

    /// Calibration-due report; the window defaults from config
    pub fn due_for_calibration(&mut self, within_days: Option<i64>) -> Result<Vec<DueGauge>> {
        let within = within_days
            .unwrap_or_else(|| i64::from(self.config.calibration.expiry_warning_days));
        self.read("due", |engines, tx| engines.ledger().due_for_calibration(tx, within))
    }

    // =========================================================================
    // Integrity
    // =========================================================================

    /// Scan for violations, recording each one for review
    pub fn verify_integrity(&mut self) -> Result<Vec<IntegrityIssue>> {
        let tx = self.store.begin()?;
        let issues = verify_integrity(&tx)?;
        tx.commit()?;
        Ok(issues)
    }

    pub fn audit_log(&mut self) -> Result<Vec<AuditEntry>> {
        let tx = self.store.begin()?;
        let entries = tx.audit_entries_needing_review()?;
        Ok(entries)
    }
}

fn validate_spec(spec: &GaugeSpec) -> Result<()> {
    let missing = |field: &str, value: &str| {
        if value.trim().is_empty() {
            Err(GaugeError::validation(format!("{} is required", field)))
        } else {
            Ok(())
        }
    };
    match spec {
        GaugeSpec::ThreadGauge(t) => {
            missing("thread size", &t.thread_size)?;
            missing("thread class", &t.thread_class)?;
            missing("thread form", &t.thread_form)
        }
        GaugeSpec::HandTool(h) => {
            missing("tool type", &h.tool_type)?;
            if h.range_max < h.range_min {
                return Err(GaugeError::validation(format!(
                    "range maximum {} is below minimum {}",
                    h.range_max, h.range_min
                )));
            }
            Ok(())
        }
        GaugeSpec::LargeEquipment(l) => missing("equipment name", &l.equipment_name),
        GaugeSpec::CalibrationStandard(s) => missing("standard type", &s.standard_type),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use crate::core::test_support::{in_days, thread_spec};
    use tempfile::TempDir;

    fn tracker(dir: &TempDir) -> GaugeTracker {
        GaugeTracker::new(
            Store::open_in_memory().unwrap(),
            Config::default(),
            Box::new(AllowAll),
            Box::new(FsBlobStore::new(dir.path())),
        )
    }

    fn new_set() -> NewSet {
        NewSet {
            category: "UN".to_string(),
            go_spec: thread_spec(".250-20", "2A"),
            nogo_spec: thread_spec(".250-20", "2A"),
            location: "A1".to_string(),
            ownership: Ownership::Company,
        }
    }

    fn upload(gauge_id: &str) -> UploadRequest {
        UploadRequest {
            gauge_id: gauge_id.to_string(),
            file_name: format!("{}.pdf", gauge_id),
            content: gauge_id.as_bytes().to_vec(),
            valid_until: None,
        }
    }

    #[test]
    fn test_calibration_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut tracker = tracker(&dir);
        let set = tracker.create_set(&new_set(), "quinn").unwrap();
        assert_eq!(set.set_id, "TG-UN-0001");
        assert_eq!(set.go.id, "TG-UN-0001-GO");

        let sets = vec![set.set_id.clone()];
        let report = tracker.send_to_calibration(&sets, Some("Acme"), "cal").unwrap();
        assert_eq!(report.failed().count(), 0);
        tracker.receive_from_calibration(&sets, "cal").unwrap();

        let first = tracker.upload_certificate(&upload(&set.go.id), "cal").unwrap();
        assert!(!first.advanced);
        assert_eq!(first.certificate.valid_until, in_days(365));
        let second = tracker.upload_certificate(&upload(&set.nogo.id), "cal").unwrap();
        assert!(second.advanced);

        let report = tracker.release(&sets, "B2", "cal").unwrap();
        assert_eq!(report.succeeded().count(), 1);
        let set = tracker.get_set(&set.set_id).unwrap();
        assert_eq!(set.go.status, GaugeStatus::Available);
        assert_eq!(set.location(), Some("B2"));
        assert_eq!(tracker.status_history(&set.go.id).unwrap().len(), 4);
    }

    #[test]
    fn test_certificates_uploaded_before_receive_advance_the_set() {
        let dir = TempDir::new().unwrap();
        let mut tracker = tracker(&dir);
        let set = tracker.create_set(&new_set(), "quinn").unwrap();
        let sets = vec![set.set_id.clone()];
        tracker.send_to_calibration(&sets, None, "cal").unwrap();

        let first = tracker.upload_certificate(&upload(&set.go.id), "cal").unwrap();
        assert!(!first.advanced);
        assert_eq!(first.status, GaugeStatus::PendingCertificate);
        assert_eq!(first.waiting_on.as_deref(), Some(set.nogo.id.as_str()));
        let current = tracker.get_set(&set.set_id).unwrap();
        assert_eq!(current.go.status, GaugeStatus::PendingCertificate);
        assert_eq!(current.nogo.status, GaugeStatus::OutForCalibration);

        let second = tracker.upload_certificate(&upload(&set.nogo.id), "cal").unwrap();
        assert!(second.advanced);
        let current = tracker.get_set(&set.set_id).unwrap();
        assert_eq!(current.go.status, GaugeStatus::PendingRelease);
        assert_eq!(current.nogo.status, GaugeStatus::PendingRelease);
    }

    #[test]
    fn test_single_member_cannot_skip_certification() {
        let dir = TempDir::new().unwrap();
        let mut tracker = tracker(&dir);
        let set = tracker.create_set(&new_set(), "quinn").unwrap();
        let sets = vec![set.set_id.clone()];
        tracker.send_to_calibration(&sets, None, "cal").unwrap();
        tracker.receive_from_calibration(&sets, "cal").unwrap();

        let err = tracker
            .transition(&set.go.id, GaugeStatus::PendingRelease, "cal", &TransitionContext::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        let err = tracker
            .transition(
                &set.go.id,
                GaugeStatus::Available,
                "cal",
                &TransitionContext::with_location("Z9"),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let current = tracker.get_set(&set.set_id).unwrap();
        assert_eq!(current.go.status, GaugeStatus::PendingCertificate);
        assert_eq!(current.nogo.status, GaugeStatus::PendingCertificate);
        assert!(tracker.certificate_history(&set.go.id).unwrap().is_empty());
    }

    #[test]
    fn test_failed_operation_rolls_back() {
        let dir = TempDir::new().unwrap();
        let mut tracker = tracker(&dir);
        let mut bad = new_set();
        bad.nogo_spec = thread_spec(".375-16", "2A");

        let err = tracker.create_set(&bad, "quinn").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(tracker.list_gauges(None).unwrap().is_empty());

        // The sequence reserved by the failed attempt was rolled back too
        let set = tracker.create_set(&new_set(), "quinn").unwrap();
        assert_eq!(set.set_id, "TG-UN-0001");
    }

    #[test]
    fn test_intake_and_pair_spares() {
        let dir = TempDir::new().unwrap();
        let mut tracker = tracker(&dir);
        let intake = |role| NewGauge {
            category: "un".to_string(),
            spec: thread_spec(".250-20", "2A"),
            role: Some(role),
            ownership: Ownership::Company,
            location: "SPARES".to_string(),
        };
        let go = tracker.intake_gauge(&intake(GaugeRole::Go), "quinn").unwrap();
        let nogo = tracker.intake_gauge(&intake(GaugeRole::Nogo), "quinn").unwrap();
        assert!(go.is_spare());

        let spares = tracker.find_compatible_spares(&go.id).unwrap();
        assert_eq!(spares.len(), 1);

        let set = tracker.pair_spares(&go.id, &nogo.id, "A2", "quinn").unwrap();
        assert_eq!(tracker.list_sets().unwrap().len(), 1);
        assert_eq!(tracker.companion_of(&go.id).unwrap().map(|g| g.id), Some(nogo.id.clone()));
        assert_eq!(tracker.set_history(&set.set_id).unwrap().len(), 1);
        assert_eq!(tracker.set_history(&go.id).unwrap().len(), 1);
        assert_eq!(
            tracker.set_history("NOPE").unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_intake_validation() {
        let dir = TempDir::new().unwrap();
        let mut tracker = tracker(&dir);
        let gauge = NewGauge {
            category: "UN".to_string(),
            spec: thread_spec("", "2A"),
            role: Some(GaugeRole::Go),
            ownership: Ownership::Company,
            location: "A1".to_string(),
        };
        assert_eq!(
            tracker.intake_gauge(&gauge, "quinn").unwrap_err().kind(),
            ErrorKind::Validation
        );
        let no_location = NewGauge {
            location: " ".to_string(),
            spec: thread_spec(".250-20", "2A"),
            ..gauge
        };
        assert_eq!(
            tracker.intake_gauge(&no_location, "quinn").unwrap_err().kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn test_due_report_uses_config_window() {
        let dir = TempDir::new().unwrap();
        let mut tracker = tracker(&dir);
        let set = tracker.create_set(&new_set(), "quinn").unwrap();
        let mut request = upload(&set.go.id);
        request.valid_until = Some(in_days(45));
        tracker.upload_certificate(&request, "cal").unwrap();

        let due = tracker.due_for_calibration(None).unwrap();
        let ids: Vec<_> = due.iter().map(|d| d.gauge.id.as_str()).collect();
        assert_eq!(ids, vec![set.nogo.id.as_str()]);
        assert_eq!(tracker.due_for_calibration(Some(60)).unwrap().len(), 2);
    }
}
