//! SQLite persistence for gauges, sets, certificates, and history
//!
//! All work happens inside a [`Tx`] obtained from [`Store::begin`]. The
//! transaction is passed explicitly to every engine call that belongs to the
//! same top-level operation; dropping a `Tx` without committing rolls it back.
//!
//! Writes to the status and set-identifier columns go through guarded updates
//! (`update_status_if`, `update_set_id_if`) that re-check the expected value in
//! the `WHERE` clause and report a conflict when another writer got there first.

mod serialize;

#[cfg(test)]
mod tests;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::Path;
use std::time::Duration;

use crate::core::error::{GaugeError, Result};
use crate::entities::{
    Batch, BatchMember, BatchStage, Certificate, Gauge, GaugeRole, GaugeSpec, GaugeStatus,
    SetEvent, SpecKey, StatusChange,
};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS gauges (
    id TEXT PRIMARY KEY,
    set_id TEXT,
    category TEXT NOT NULL,
    equipment_type TEXT NOT NULL,
    spec_json TEXT NOT NULL,
    thread_size_key TEXT,
    thread_class_key TEXT,
    thread_form_key TEXT,
    role TEXT,
    status TEXT NOT NULL,
    ownership TEXT NOT NULL,
    location TEXT,
    created TEXT NOT NULL,
    updated TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_gauges_set ON gauges(set_id);
CREATE INDEX IF NOT EXISTS idx_gauges_status ON gauges(status);
CREATE INDEX IF NOT EXISTS idx_gauges_thread_key
    ON gauges(thread_size_key, thread_class_key, thread_form_key) WHERE set_id IS NULL;

CREATE TABLE IF NOT EXISTS id_sequences (
    scope TEXT PRIMARY KEY,
    next_value INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS certificates (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    gauge_id TEXT NOT NULL REFERENCES gauges(id),
    file_ref TEXT NOT NULL,
    file_name TEXT NOT NULL,
    uploaded_by TEXT NOT NULL,
    uploaded_at TEXT NOT NULL,
    valid_until TEXT NOT NULL,
    is_current INTEGER NOT NULL,
    supersedes TEXT,
    superseded_by TEXT
);
CREATE INDEX IF NOT EXISTS idx_certificates_gauge ON certificates(gauge_id);
CREATE UNIQUE INDEX IF NOT EXISTS idx_certificates_current
    ON certificates(gauge_id) WHERE is_current = 1;

CREATE TABLE IF NOT EXISTS status_history (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    gauge_id TEXT NOT NULL,
    from_status TEXT NOT NULL,
    to_status TEXT NOT NULL,
    actor TEXT NOT NULL,
    reason TEXT,
    location TEXT,
    timestamp TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_status_history_gauge ON status_history(gauge_id);

CREATE TABLE IF NOT EXISTS set_history (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    set_id TEXT NOT NULL,
    kind TEXT NOT NULL,
    gauge_ids TEXT NOT NULL,
    outgoing TEXT,
    incoming TEXT,
    actor TEXT NOT NULL,
    reason TEXT,
    timestamp TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_set_history_set ON set_history(set_id);

CREATE TABLE IF NOT EXISTS batches (
    id TEXT PRIMARY KEY,
    created_by TEXT NOT NULL,
    created TEXT NOT NULL,
    vendor TEXT
);

CREATE TABLE IF NOT EXISTS batch_members (
    batch_id TEXT NOT NULL REFERENCES batches(id),
    set_id TEXT NOT NULL,
    stage TEXT NOT NULL,
    updated TEXT NOT NULL,
    PRIMARY KEY (batch_id, set_id)
);

CREATE TABLE IF NOT EXISTS audit_log (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    category TEXT NOT NULL,
    subject TEXT NOT NULL,
    message TEXT NOT NULL,
    needs_review INTEGER NOT NULL
);
"#;

const GAUGE_COLUMNS: &str =
    "id, set_id, category, spec_json, role, status, ownership, location, created, updated";

const CERTIFICATE_COLUMNS: &str = "id, gauge_id, file_ref, file_name, uploaded_by, uploaded_at, \
     valid_until, is_current, supersedes, superseded_by";

/// An audit log entry
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub category: String,
    pub subject: String,
    pub message: String,
    pub needs_review: bool,
}

/// Owner of the SQLite connection
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (creating if needed) the database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Start a write transaction
    ///
    /// `IMMEDIATE` takes the write lock up front so two processes cannot both
    /// read a status and then race to update it.
    pub fn begin(&mut self) -> Result<Tx<'_>> {
        let inner = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        Ok(Tx {
            inner,
            now: Utc::now(),
        })
    }
}

/// A scoped transaction; every row primitive lives here
pub struct Tx<'conn> {
    inner: rusqlite::Transaction<'conn>,
    now: DateTime<Utc>,
}

impl<'conn> Tx<'conn> {
    /// Timestamp shared by every write in this transaction
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    pub fn commit(self) -> Result<()> {
        self.inner.commit()?;
        Ok(())
    }

    // =====================================================================
    // Gauges
    // =====================================================================

    pub fn get_gauge(&self, id: &str) -> Result<Option<Gauge>> {
        let sql = format!("SELECT {} FROM gauges WHERE id = ?1", GAUGE_COLUMNS);
        Ok(self
            .inner
            .query_row(&sql, [id], gauge_from_row)
            .optional()?)
    }

    /// Like `get_gauge`, but a missing row is `NotFound`
    pub fn require_gauge(&self, id: &str) -> Result<Gauge> {
        self.get_gauge(id)?
            .ok_or_else(|| GaugeError::gauge_not_found(id))
    }

    pub fn insert_gauge(&self, gauge: &Gauge) -> Result<()> {
        let spec_json = serde_json::to_string(&gauge.spec)?;
        let (size_key, class_key, form_key) = match gauge.spec.key() {
            SpecKey::Thread { size, class, form } => (Some(size), Some(class), Some(form)),
            _ => (None, None, None),
        };
        let inserted = self.inner.execute(
            "INSERT OR IGNORE INTO gauges (id, set_id, category, equipment_type, spec_json, \
             thread_size_key, thread_class_key, thread_form_key, role, status, ownership, \
             location, created, updated) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                gauge.id,
                gauge.set_id,
                gauge.category,
                gauge.equipment_type(),
                spec_json,
                size_key,
                class_key,
                form_key,
                gauge.role,
                gauge.status,
                gauge.ownership,
                gauge.location,
                gauge.created,
                gauge.updated,
            ],
        )?;
        if inserted == 0 {
            return Err(GaugeError::conflict(format!(
                "gauge {} already exists",
                gauge.id
            )));
        }
        Ok(())
    }

    /// All rows carrying `set_id`, GO first
    pub fn gauges_in_set(&self, set_id: &str) -> Result<Vec<Gauge>> {
        let sql = format!(
            "SELECT {} FROM gauges WHERE set_id = ?1 ORDER BY role = 'nogo', id",
            GAUGE_COLUMNS
        );
        self.query_gauges(&sql, [set_id])
    }

    pub fn gauges_with_status(&self, status: GaugeStatus) -> Result<Vec<Gauge>> {
        let sql = format!(
            "SELECT {} FROM gauges WHERE status = ?1 ORDER BY id",
            GAUGE_COLUMNS
        );
        self.query_gauges(&sql, [status])
    }

    pub fn all_gauges(&self) -> Result<Vec<Gauge>> {
        let sql = format!("SELECT {} FROM gauges ORDER BY id", GAUGE_COLUMNS);
        self.query_gauges(&sql, [])
    }

    /// Unpaired, non-terminal thread gauges in `role` whose normalized
    /// size, class, and form equal `key`
    pub fn spare_candidates(&self, role: GaugeRole, key: &SpecKey) -> Result<Vec<Gauge>> {
        let SpecKey::Thread { size, class, form } = key else {
            return Ok(Vec::new());
        };
        let sql = format!(
            "SELECT {} FROM gauges \
             WHERE set_id IS NULL AND equipment_type = 'thread_gauge' AND role = ?1 \
             AND thread_size_key = ?2 AND thread_class_key = ?3 AND thread_form_key = ?4 \
             AND status NOT IN ('retired', 'returned') ORDER BY id",
            GAUGE_COLUMNS
        );
        self.query_gauges(&sql, params![role, size, class, form])
    }

    fn query_gauges<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<Gauge>> {
        let mut stmt = self.inner.prepare(sql)?;
        let rows = stmt.query_map(params, gauge_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Set status (and optionally location) only if the row still has `expected`
    pub fn update_status_if(
        &self,
        id: &str,
        expected: GaugeStatus,
        new: GaugeStatus,
        location: Option<&str>,
    ) -> Result<()> {
        let changed = match location {
            Some(location) => self.inner.execute(
                "UPDATE gauges SET status = ?3, location = ?4, updated = ?5 \
                 WHERE id = ?1 AND status = ?2",
                params![id, expected, new, location, self.now],
            )?,
            None => self.inner.execute(
                "UPDATE gauges SET status = ?3, updated = ?4 WHERE id = ?1 AND status = ?2",
                params![id, expected, new, self.now],
            )?,
        };
        if changed != 1 {
            return Err(GaugeError::conflict(format!(
                "gauge {} is no longer {}; re-read and retry",
                id, expected
            )));
        }
        Ok(())
    }

    /// Set the set identifier only if the row still has `expected`
    pub fn update_set_id_if(
        &self,
        id: &str,
        expected: Option<&str>,
        new: Option<&str>,
    ) -> Result<()> {
        let changed = self.inner.execute(
            "UPDATE gauges SET set_id = ?3, updated = ?4 WHERE id = ?1 AND set_id IS ?2",
            params![id, expected, new, self.now],
        )?;
        if changed != 1 {
            return Err(GaugeError::conflict(format!(
                "set membership of gauge {} changed concurrently; re-read and retry",
                id
            )));
        }
        Ok(())
    }

    pub fn update_location(&self, id: &str, location: &str) -> Result<()> {
        let changed = self.inner.execute(
            "UPDATE gauges SET location = ?2, updated = ?3 WHERE id = ?1",
            params![id, location, self.now],
        )?;
        if changed != 1 {
            return Err(GaugeError::gauge_not_found(id));
        }
        Ok(())
    }

    /// Row count per set identifier in use
    pub fn set_member_counts(&self) -> Result<Vec<(String, usize)>> {
        let mut stmt = self.inner.prepare(
            "SELECT set_id, COUNT(*) FROM gauges WHERE set_id IS NOT NULL \
             GROUP BY set_id ORDER BY set_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize))
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    // =====================================================================
    // Identifier sequences
    // =====================================================================

    /// Reserve the next value in `scope`, starting at 1
    pub fn next_sequence(&self, scope: &str) -> Result<u64> {
        self.inner.execute(
            "INSERT OR IGNORE INTO id_sequences (scope, next_value) VALUES (?1, 1)",
            [scope],
        )?;
        let value: i64 = self.inner.query_row(
            "SELECT next_value FROM id_sequences WHERE scope = ?1",
            [scope],
            |row| row.get(0),
        )?;
        self.inner.execute(
            "UPDATE id_sequences SET next_value = next_value + 1 WHERE scope = ?1",
            [scope],
        )?;
        Ok(value as u64)
    }

    pub fn gauge_id_exists(&self, id: &str) -> Result<bool> {
        let count: i64 = self.inner.query_row(
            "SELECT COUNT(*) FROM gauges WHERE id = ?1 OR set_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // =====================================================================
    // History
    // =====================================================================

    pub fn insert_status_change(&self, change: &StatusChange) -> Result<()> {
        self.inner.execute(
            "INSERT INTO status_history (gauge_id, from_status, to_status, actor, reason, \
             location, timestamp) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                change.gauge_id,
                change.from,
                change.to,
                change.actor,
                change.reason,
                change.location,
                change.timestamp,
            ],
        )?;
        Ok(())
    }

    /// Transitions for a gauge, newest first
    pub fn status_history(&self, gauge_id: &str) -> Result<Vec<StatusChange>> {
        let mut stmt = self.inner.prepare(
            "SELECT gauge_id, from_status, to_status, actor, reason, location, timestamp \
             FROM status_history WHERE gauge_id = ?1 ORDER BY seq DESC",
        )?;
        let rows = stmt.query_map([gauge_id], |row| {
            Ok(StatusChange {
                gauge_id: row.get(0)?,
                from: row.get(1)?,
                to: row.get(2)?,
                actor: row.get(3)?,
                reason: row.get(4)?,
                location: row.get(5)?,
                timestamp: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn insert_set_event(&self, event: &SetEvent) -> Result<()> {
        self.inner.execute(
            "INSERT INTO set_history (set_id, kind, gauge_ids, outgoing, incoming, actor, \
             reason, timestamp) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                event.set_id,
                event.kind,
                event.gauge_ids.join(","),
                event.outgoing,
                event.incoming,
                event.actor,
                event.reason,
                event.timestamp,
            ],
        )?;
        Ok(())
    }

    /// Membership events for a set, newest first
    pub fn set_history(&self, set_id: &str) -> Result<Vec<SetEvent>> {
        self.query_set_events(
            "SELECT set_id, kind, gauge_ids, outgoing, incoming, actor, reason, timestamp \
             FROM set_history WHERE set_id = ?1 ORDER BY seq DESC",
            set_id,
        )
    }

    /// Membership events that mention a gauge, newest first
    pub fn set_history_for_gauge(&self, gauge_id: &str) -> Result<Vec<SetEvent>> {
        self.query_set_events(
            "SELECT set_id, kind, gauge_ids, outgoing, incoming, actor, reason, timestamp \
             FROM set_history WHERE ',' || gauge_ids || ',' LIKE '%,' || ?1 || ',%' \
             OR outgoing = ?1 OR incoming = ?1 ORDER BY seq DESC",
            gauge_id,
        )
    }

    fn query_set_events(&self, sql: &str, key: &str) -> Result<Vec<SetEvent>> {
        let mut stmt = self.inner.prepare(sql)?;
        let rows = stmt.query_map([key], |row| {
            let gauge_ids: String = row.get(2)?;
            Ok(SetEvent {
                set_id: row.get(0)?,
                kind: row.get(1)?,
                gauge_ids: gauge_ids
                    .split(',')
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
                outgoing: row.get(3)?,
                incoming: row.get(4)?,
                actor: row.get(5)?,
                reason: row.get(6)?,
                timestamp: row.get(7)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    // =====================================================================
    // Certificates
    // =====================================================================

    pub fn insert_certificate(&self, cert: &Certificate) -> Result<()> {
        self.inner.execute(
            "INSERT INTO certificates (id, gauge_id, file_ref, file_name, uploaded_by, \
             uploaded_at, valid_until, is_current, supersedes, superseded_by) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                cert.id,
                cert.gauge_id,
                cert.file_ref,
                cert.file_name,
                cert.uploaded_by,
                cert.uploaded_at,
                cert.valid_until,
                cert.is_current,
                cert.supersedes,
                cert.superseded_by,
            ],
        )?;
        Ok(())
    }

    pub fn get_certificate(&self, id: &str) -> Result<Option<Certificate>> {
        let sql = format!(
            "SELECT {} FROM certificates WHERE id = ?1",
            CERTIFICATE_COLUMNS
        );
        Ok(self
            .inner
            .query_row(&sql, [id], certificate_from_row)
            .optional()?)
    }

    pub fn current_certificate(&self, gauge_id: &str) -> Result<Option<Certificate>> {
        let sql = format!(
            "SELECT {} FROM certificates WHERE gauge_id = ?1 AND is_current = 1",
            CERTIFICATE_COLUMNS
        );
        Ok(self
            .inner
            .query_row(&sql, [gauge_id], certificate_from_row)
            .optional()?)
    }

    /// Clear the current flag on `old_id` and point it at `new_id`
    ///
    /// Guarded on `is_current = 1`: a certificate is superseded at most once.
    pub fn mark_superseded(&self, old_id: &str, new_id: &str) -> Result<()> {
        let changed = self.inner.execute(
            "UPDATE certificates SET is_current = 0, superseded_by = ?2 \
             WHERE id = ?1 AND is_current = 1",
            params![old_id, new_id],
        )?;
        if changed != 1 {
            return Err(GaugeError::conflict(format!(
                "certificate {} was superseded concurrently; re-read and retry",
                old_id
            )));
        }
        Ok(())
    }

    /// All certificates for a gauge, newest first
    pub fn certificates_for(&self, gauge_id: &str) -> Result<Vec<Certificate>> {
        let sql = format!(
            "SELECT {} FROM certificates WHERE gauge_id = ?1 ORDER BY seq DESC",
            CERTIFICATE_COLUMNS
        );
        let mut stmt = self.inner.prepare(&sql)?;
        let rows = stmt.query_map([gauge_id], certificate_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Gauges with more than one current certificate
    pub fn duplicate_current_certificates(&self) -> Result<Vec<(String, usize)>> {
        let mut stmt = self.inner.prepare(
            "SELECT gauge_id, COUNT(*) FROM certificates WHERE is_current = 1 \
             GROUP BY gauge_id HAVING COUNT(*) > 1 ORDER BY gauge_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize))
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    // =====================================================================
    // Batches
    // =====================================================================

    pub fn insert_batch(&self, batch: &Batch) -> Result<()> {
        self.inner.execute(
            "INSERT INTO batches (id, created_by, created, vendor) VALUES (?1, ?2, ?3, ?4)",
            params![batch.id, batch.created_by, batch.created, batch.vendor],
        )?;
        for member in &batch.members {
            self.insert_batch_member(&batch.id, member)?;
        }
        Ok(())
    }

    pub fn insert_batch_member(&self, batch_id: &str, member: &BatchMember) -> Result<()> {
        self.inner.execute(
            "INSERT INTO batch_members (batch_id, set_id, stage, updated) \
             VALUES (?1, ?2, ?3, ?4)",
            params![batch_id, member.set_id, member.stage, member.updated],
        )?;
        Ok(())
    }

    pub fn get_batch(&self, id: &str) -> Result<Option<Batch>> {
        let header = self
            .inner
            .query_row(
                "SELECT id, created_by, created, vendor FROM batches WHERE id = ?1",
                [id],
                |row| {
                    Ok(Batch {
                        id: row.get(0)?,
                        created_by: row.get(1)?,
                        created: row.get(2)?,
                        vendor: row.get(3)?,
                        members: Vec::new(),
                    })
                },
            )
            .optional()?;

        let Some(mut batch) = header else {
            return Ok(None);
        };

        let mut stmt = self.inner.prepare(
            "SELECT set_id, stage, updated FROM batch_members WHERE batch_id = ?1 \
             ORDER BY set_id",
        )?;
        let rows = stmt.query_map([id], |row| {
            Ok(BatchMember {
                set_id: row.get(0)?,
                stage: row.get(1)?,
                updated: row.get(2)?,
            })
        })?;
        batch.members = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Some(batch))
    }

    /// Batch ids, newest first
    pub fn batch_ids(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .inner
            .prepare("SELECT id FROM batches ORDER BY created DESC, id DESC")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Move a set's open batch membership (not yet released) to `stage`
    pub fn set_batch_stage(&self, set_id: &str, stage: BatchStage) -> Result<()> {
        self.inner.execute(
            "UPDATE batch_members SET stage = ?2, updated = ?3 \
             WHERE set_id = ?1 AND stage != 'released'",
            params![set_id, stage, self.now],
        )?;
        Ok(())
    }

    // =====================================================================
    // Audit log
    // =====================================================================

    pub fn insert_audit(&self, entry: &AuditEntry) -> Result<()> {
        self.inner.execute(
            "INSERT INTO audit_log (timestamp, category, subject, message, needs_review) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.timestamp,
                entry.category,
                entry.subject,
                entry.message,
                entry.needs_review,
            ],
        )?;
        Ok(())
    }

    /// Entries flagged for manual review, newest first
    pub fn audit_entries_needing_review(&self) -> Result<Vec<AuditEntry>> {
        let mut stmt = self.inner.prepare(
            "SELECT timestamp, category, subject, message, needs_review FROM audit_log \
             WHERE needs_review = 1 ORDER BY seq DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(AuditEntry {
                timestamp: row.get(0)?,
                category: row.get(1)?,
                subject: row.get(2)?,
                message: row.get(3)?,
                needs_review: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

fn gauge_from_row(row: &Row<'_>) -> rusqlite::Result<Gauge> {
    let spec_json: String = row.get(3)?;
    let spec: GaugeSpec = serde_json::from_str(&spec_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Gauge {
        id: row.get(0)?,
        set_id: row.get(1)?,
        category: row.get(2)?,
        spec,
        role: row.get(4)?,
        status: row.get(5)?,
        ownership: row.get(6)?,
        location: row.get(7)?,
        created: row.get(8)?,
        updated: row.get(9)?,
    })
}

fn certificate_from_row(row: &Row<'_>) -> rusqlite::Result<Certificate> {
    Ok(Certificate {
        id: row.get(0)?,
        gauge_id: row.get(1)?,
        file_ref: row.get(2)?,
        file_name: row.get(3)?,
        uploaded_by: row.get(4)?,
        uploaded_at: row.get(5)?,
        valid_until: row.get(6)?,
        is_current: row.get(7)?,
        supersedes: row.get(8)?,
        superseded_by: row.get(9)?,
    })
}
