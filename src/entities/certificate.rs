//! Certificate entity type - calibration records with supersession pointers

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A calibration certificate for one gauge
///
/// Once superseded a certificate is never modified again; `supersedes` always
/// points at an older certificate and `superseded_by` at a newer one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    /// Certificate ID (e.g., "CERT-01J...")
    pub id: String,

    /// Gauge this certificate belongs to
    pub gauge_id: String,

    /// Reference returned by the blob store
    pub file_ref: String,

    /// Original file name as uploaded
    pub file_name: String,

    /// Who uploaded the certificate
    pub uploaded_by: String,

    pub uploaded_at: DateTime<Utc>,

    /// Last day the calibration is valid
    pub valid_until: NaiveDate,

    /// Whether this is the gauge's current certificate
    pub is_current: bool,

    /// Previous current certificate this one replaced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supersedes: Option<String>,

    /// Newer certificate that replaced this one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superseded_by: Option<String>,
}

impl Certificate {
    /// Valid on the given day (inclusive of `valid_until`)
    pub fn is_valid_on(&self, day: NaiveDate) -> bool {
        day <= self.valid_until
    }

    /// Current and not expired as of `day`
    pub fn is_current_and_valid(&self, day: NaiveDate) -> bool {
        self.is_current && self.is_valid_on(day)
    }

    /// Days remaining until expiry; negative once expired
    pub fn days_remaining(&self, day: NaiveDate) -> i64 {
        (self.valid_until - day).num_days()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cert(valid_until: NaiveDate, is_current: bool) -> Certificate {
        Certificate {
            id: "CERT-1".to_string(),
            gauge_id: "TG-UN-0001-GO".to_string(),
            file_ref: "sha256:abc".to_string(),
            file_name: "cert.pdf".to_string(),
            uploaded_by: "jsmith".to_string(),
            uploaded_at: Utc::now(),
            valid_until,
            is_current,
            supersedes: None,
            superseded_by: None,
        }
    }

    #[test]
    fn test_validity_is_inclusive() {
        let day = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let c = cert(day, true);
        assert!(c.is_valid_on(day));
        assert!(!c.is_valid_on(day.succ_opt().unwrap()));
        assert_eq!(c.days_remaining(day), 0);
    }

    #[test]
    fn test_superseded_certificate_is_not_current_and_valid() {
        let until = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert!(cert(until, true).is_current_and_valid(today));
        assert!(!cert(until, false).is_current_and_valid(today));
    }
}
