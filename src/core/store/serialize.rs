//! SQLite serialization for typed enums
//!
//! Implements ToSql and FromSql for the gauge lifecycle enums so that rows
//! store readable text and reads fail loudly on unknown values.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

use crate::entities::{BatchStage, EquipmentType, GaugeRole, GaugeStatus, Ownership, SetEventKind};

fn invalid_data(e: String) -> FromSqlError {
    FromSqlError::Other(Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        e,
    )))
}

// =========================================================================
// GaugeStatus - ToSql/FromSql
// =========================================================================

impl ToSql for GaugeStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for GaugeStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(invalid_data)
    }
}

// =========================================================================
// Ownership - ToSql/FromSql
// =========================================================================

impl ToSql for Ownership {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for Ownership {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(invalid_data)
    }
}

// =========================================================================
// GaugeRole - ToSql/FromSql
// =========================================================================

impl ToSql for GaugeRole {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let s = match self {
            GaugeRole::Go => "go",
            GaugeRole::Nogo => "nogo",
        };
        Ok(ToSqlOutput::from(s))
    }
}

impl FromSql for GaugeRole {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(invalid_data)
    }
}

// =========================================================================
// EquipmentType - ToSql/FromSql
// =========================================================================

impl std::str::FromStr for EquipmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "thread_gauge" => Ok(EquipmentType::ThreadGauge),
            "hand_tool" => Ok(EquipmentType::HandTool),
            "large_equipment" => Ok(EquipmentType::LargeEquipment),
            "calibration_standard" => Ok(EquipmentType::CalibrationStandard),
            _ => Err(format!("Unknown equipment type: {}", s)),
        }
    }
}

impl ToSql for EquipmentType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for EquipmentType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(invalid_data)
    }
}

// =========================================================================
// SetEventKind / BatchStage - ToSql/FromSql
// =========================================================================

impl ToSql for SetEventKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for SetEventKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(invalid_data)
    }
}

impl ToSql for BatchStage {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for BatchStage {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(invalid_data)
    }
}
