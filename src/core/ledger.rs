//! Certificate ledger
//!
//! Owns every write to certificate rows. Uploading supersedes the previous
//! current certificate in place; rows are never deleted.

use chrono::NaiveDate;
use serde::Serialize;
use std::io::Read;

use crate::core::auth::{require, Action, Authorizer};
use crate::core::blob::BlobStore;
use crate::core::error::{GaugeError, Result};
use crate::core::identity::new_certificate_id;
use crate::core::store::Tx;
use crate::entities::{Certificate, Gauge, GaugeStatus};

/// Certificate file and metadata supplied by an uploader
#[derive(Debug, Clone)]
pub struct CertificateUpload<'b> {
    pub file_name: String,
    pub content: &'b [u8],
    pub valid_until: NaiveDate,
}

/// One row of the calibration-due report
#[derive(Debug, Clone, Serialize)]
pub struct DueGauge {
    pub gauge: Gauge,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<Certificate>,
    /// Days until expiry, negative when overdue; absent without a certificate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_remaining: Option<i64>,
}

pub struct CertificateLedger<'a> {
    auth: &'a dyn Authorizer,
    blobs: &'a dyn BlobStore,
}

impl<'a> CertificateLedger<'a> {
    pub fn new(auth: &'a dyn Authorizer, blobs: &'a dyn BlobStore) -> Self {
        Self { auth, blobs }
    }

    /// Record a new current certificate for `gauge_id`
    ///
    /// Any previous current certificate is superseded in the same
    /// transaction: its flag is cleared and it points at the new one.
    pub fn upload_certificate(
        &self,
        tx: &Tx<'_>,
        gauge_id: &str,
        upload: &CertificateUpload<'_>,
        uploader: &str,
    ) -> Result<Certificate> {
        let gauge = tx.require_gauge(gauge_id)?;
        require(self.auth, uploader, Action::Certify, gauge_id)?;

        if gauge.status.is_terminal() {
            return Err(GaugeError::conflict(format!(
                "gauge {} is {}; certificates can no longer be added",
                gauge_id, gauge.status
            )));
        }
        let file_name = upload.file_name.trim();
        if file_name.is_empty() {
            return Err(GaugeError::validation("certificate file name is required"));
        }
        if upload.content.is_empty() {
            return Err(GaugeError::validation(format!(
                "certificate file {} is empty",
                file_name
            )));
        }

        let file_ref = self.blobs.reference_for(upload.content)?;
        let id = new_certificate_id();
        let previous = tx.current_certificate(gauge_id)?;

        if let Some(old) = &previous {
            tx.mark_superseded(&old.id, &id)?;
        }

        let cert = Certificate {
            id,
            gauge_id: gauge_id.to_string(),
            file_ref,
            file_name: file_name.to_string(),
            uploaded_by: uploader.to_string(),
            uploaded_at: tx.now(),
            valid_until: upload.valid_until,
            is_current: true,
            supersedes: previous.map(|old| old.id),
            superseded_by: None,
        };
        tx.insert_certificate(&cert)?;
        self.blobs.store(upload.content)?;

        if !cert.is_valid_on(tx.today()) {
            tracing::warn!(gauge_id, cert_id = %cert.id, valid_until = %cert.valid_until, "certificate is already expired");
        }
        tracing::info!(gauge_id, cert_id = %cert.id, supersedes = ?cert.supersedes, "certificate uploaded");
        Ok(cert)
    }

    /// Every certificate for a gauge, newest first
    pub fn certificate_history(&self, tx: &Tx<'_>, gauge_id: &str) -> Result<Vec<Certificate>> {
        tx.require_gauge(gauge_id)?;
        tx.certificates_for(gauge_id)
    }

    /// Certificate metadata plus a reader over the stored file
    pub fn open_certificate(
        &self,
        tx: &Tx<'_>,
        cert_id: &str,
    ) -> Result<(Certificate, Box<dyn Read>)> {
        let cert = tx.get_certificate(cert_id)?.ok_or_else(|| GaugeError::NotFound {
            kind: "Certificate",
            id: cert_id.to_string(),
        })?;
        let reader = self.blobs.retrieve(&cert.file_ref)?;
        Ok((cert, reader))
    }

    /// Gauges in service whose current certificate expires within
    /// `within_days`, or that have no current certificate at all
    ///
    /// Sorted most urgent first; gauges without a certificate lead.
    pub fn due_for_calibration(&self, tx: &Tx<'_>, within_days: i64) -> Result<Vec<DueGauge>> {
        let today = tx.today();
        let mut due = Vec::new();

        for gauge in tx.all_gauges()? {
            if gauge.status.is_terminal() {
                continue;
            }
            let certificate = tx.current_certificate(&gauge.id)?;
            let days_remaining = certificate.as_ref().map(|c| c.days_remaining(today));
            if days_remaining.is_some_and(|days| days > within_days) {
                continue;
            }
            due.push(DueGauge {
                gauge,
                certificate,
                days_remaining,
            });
        }

        due.sort_by_key(|d| (d.days_remaining.unwrap_or(i64::MIN), d.gauge.id.clone()));
        Ok(due)
    }
}

/// Whether the gauge's current certificate is valid today and was uploaded
/// at or after the gauge last went out for calibration
///
/// A gauge that has never been sent counts any valid current certificate.
pub fn certified_this_cycle(tx: &Tx<'_>, gauge: &Gauge) -> Result<bool> {
    let Some(cert) = tx.current_certificate(&gauge.id)? else {
        return Ok(false);
    };
    if !cert.is_current_and_valid(tx.today()) {
        return Ok(false);
    }
    let sent_at = tx
        .status_history(&gauge.id)?
        .into_iter()
        .find(|change| change.to == GaugeStatus::OutForCalibration)
        .map(|change| change.timestamp);
    Ok(sent_at.map_or(true, |sent| cert.uploaded_at >= sent))
}

/// Whether the gauge's current certificate is valid today
pub fn has_valid_certificate(tx: &Tx<'_>, gauge_id: &str) -> Result<bool> {
    Ok(tx
        .current_certificate(gauge_id)?
        .is_some_and(|c| c.is_current_and_valid(tx.today())))
}
