//! Integrity scanning and the manual-review audit trail
//!
//! An integrity violation means stored data broke an invariant the engines
//! never produce themselves (a set with other than two members, two current
//! certificates for one gauge). Every violation is logged at error level and
//! written to the audit log flagged for manual review.

use serde::Serialize;

use crate::core::companion::load_set;
use crate::core::error::{ErrorKind, GaugeError, Result};
use crate::core::store::{AuditEntry, Store, Tx};

const CATEGORY: &str = "integrity";

/// One violation found by [`verify_integrity`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityIssue {
    /// Set or gauge identifier the violation concerns
    pub subject: String,
    pub message: String,
}

/// Scan every set and every gauge's certificates
///
/// Each issue found is also written to the audit log inside `tx`.
pub fn verify_integrity(tx: &Tx<'_>) -> Result<Vec<IntegrityIssue>> {
    let mut issues = Vec::new();

    for (set_id, count) in tx.set_member_counts()? {
        if count != 2 {
            issues.push(IntegrityIssue {
                message: format!(
                    "set {} is referenced by {} gauge(s); expected exactly 2",
                    set_id, count
                ),
                subject: set_id,
            });
            continue;
        }
        match load_set(tx, &set_id) {
            Ok(_) => {}
            Err(GaugeError::Integrity(message)) => issues.push(IntegrityIssue {
                subject: set_id,
                message,
            }),
            Err(e) => return Err(e),
        }
    }

    for (gauge_id, count) in tx.duplicate_current_certificates()? {
        issues.push(IntegrityIssue {
            message: format!(
                "gauge {} has {} current certificates; expected at most 1",
                gauge_id, count
            ),
            subject: gauge_id,
        });
    }

    for issue in &issues {
        record_violation(tx, &issue.subject, &issue.message)?;
    }
    tracing::info!(issues = issues.len(), "integrity scan complete");
    Ok(issues)
}

/// Log a violation and flag it for manual review
pub fn record_violation(tx: &Tx<'_>, subject: &str, message: &str) -> Result<()> {
    tracing::error!(subject, "{}", message);
    tx.insert_audit(&AuditEntry {
        timestamp: tx.now(),
        category: CATEGORY.to_string(),
        subject: subject.to_string(),
        message: message.to_string(),
        needs_review: true,
    })
}

/// Persist an audit entry for a failed operation's integrity error
///
/// The failed transaction has already rolled back, so the entry gets its own.
/// Errors of any other kind are ignored.
pub fn audit_failure(store: &mut Store, subject: &str, err: &GaugeError) {
    if err.kind() != ErrorKind::Integrity {
        return;
    }
    let recorded = store.begin().and_then(|tx| {
        record_violation(&tx, subject, &err.to_string())?;
        tx.commit()
    });
    if let Err(e) = recorded {
        tracing::warn!(subject, error = %e, "failed to write audit entry");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::{in_days, insert_member, store_with_set};
    use crate::entities::{Certificate, GaugeRole};
    use chrono::Utc;

    fn current_cert(id: &str, gauge_id: &str) -> Certificate {
        Certificate {
            id: id.to_string(),
            gauge_id: gauge_id.to_string(),
            file_ref: "sha256:00".to_string(),
            file_name: "c.pdf".to_string(),
            uploaded_by: "cal".to_string(),
            uploaded_at: Utc::now(),
            valid_until: in_days(100),
            is_current: true,
            supersedes: None,
            superseded_by: None,
        }
    }

    #[test]
    fn test_clean_store_has_no_issues() {
        let mut store = store_with_set();
        let tx = store.begin().unwrap();
        assert!(verify_integrity(&tx).unwrap().is_empty());
        assert!(tx.audit_entries_needing_review().unwrap().is_empty());
    }

    #[test]
    fn test_reports_bad_cardinality_and_roles() {
        let mut store = store_with_set();
        let tx = store.begin().unwrap();
        insert_member(&tx, "G3", GaugeRole::Go, "S1");
        insert_member(&tx, "G4", GaugeRole::Go, "S2");
        insert_member(&tx, "G5", GaugeRole::Go, "S2");

        let issues = verify_integrity(&tx).unwrap();
        let subjects: Vec<_> = issues.iter().map(|i| i.subject.as_str()).collect();
        assert_eq!(subjects, vec!["S1", "S2"]);
        assert!(issues[0].message.contains("3 gauge(s)"));

        let audit = tx.audit_entries_needing_review().unwrap();
        assert_eq!(audit.len(), 2);
        assert!(audit.iter().all(|e| e.category == "integrity"));
    }

    #[test]
    fn test_audit_failure_survives_rollback() {
        let mut store = store_with_set();
        {
            let tx = store.begin().unwrap();
            tx.insert_audit(&AuditEntry {
                timestamp: tx.now(),
                category: "other".to_string(),
                subject: "X".to_string(),
                message: "dropped".to_string(),
                needs_review: true,
            })
            .unwrap();
        }

        audit_failure(&mut store, "S1", &GaugeError::Integrity("broken".to_string()));
        audit_failure(&mut store, "S1", &GaugeError::conflict("ignored"));

        let tx = store.begin().unwrap();
        let audit = tx.audit_entries_needing_review().unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].subject, "S1");
        assert_eq!(audit[0].message, "Integrity violation: broken");
    }

    #[test]
    fn test_duplicate_current_certificates_need_schema_bypass() {
        let mut store = store_with_set();
        let tx = store.begin().unwrap();
        tx.insert_certificate(&current_cert("C1", "G1")).unwrap();
        // The partial unique index refuses a second current row
        assert!(tx.insert_certificate(&current_cert("C2", "G1")).is_err());
        assert!(tx.duplicate_current_certificates().unwrap().is_empty());
    }
}
