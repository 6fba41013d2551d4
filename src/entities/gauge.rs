//! Gauge entity type - physical inspection instruments

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a gauge
///
/// `Available` is the intake state; `Retired` and `Returned` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum GaugeStatus {
    #[default]
    Available,
    CheckedOut,
    PendingQc,
    PendingTransfer,
    CalibrationDue,
    OutOfService,
    PendingUnseal,
    Retired,
    OutForCalibration,
    PendingCertificate,
    PendingRelease,
    Returned,
}

impl GaugeStatus {
    /// All statuses, in declaration order
    pub fn all() -> &'static [GaugeStatus] {
        &[
            GaugeStatus::Available,
            GaugeStatus::CheckedOut,
            GaugeStatus::PendingQc,
            GaugeStatus::PendingTransfer,
            GaugeStatus::CalibrationDue,
            GaugeStatus::OutOfService,
            GaugeStatus::PendingUnseal,
            GaugeStatus::Retired,
            GaugeStatus::OutForCalibration,
            GaugeStatus::PendingCertificate,
            GaugeStatus::PendingRelease,
            GaugeStatus::Returned,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GaugeStatus::Available => "available",
            GaugeStatus::CheckedOut => "checked_out",
            GaugeStatus::PendingQc => "pending_qc",
            GaugeStatus::PendingTransfer => "pending_transfer",
            GaugeStatus::CalibrationDue => "calibration_due",
            GaugeStatus::OutOfService => "out_of_service",
            GaugeStatus::PendingUnseal => "pending_unseal",
            GaugeStatus::Retired => "retired",
            GaugeStatus::OutForCalibration => "out_for_calibration",
            GaugeStatus::PendingCertificate => "pending_certificate",
            GaugeStatus::PendingRelease => "pending_release",
            GaugeStatus::Returned => "returned",
        }
    }

    /// Terminal states accept no ordinary transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, GaugeStatus::Retired | GaugeStatus::Returned)
    }

    /// Statuses that belong to the calibration pipeline
    pub fn is_in_calibration(&self) -> bool {
        matches!(
            self,
            GaugeStatus::OutForCalibration
                | GaugeStatus::PendingCertificate
                | GaugeStatus::PendingRelease
        )
    }
}

impl std::fmt::Display for GaugeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for GaugeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        GaugeStatus::all()
            .iter()
            .find(|status| status.as_str() == normalized)
            .copied()
            .ok_or_else(|| format!("Unknown gauge status: {}", s))
    }
}

/// Who owns the physical gauge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum Ownership {
    #[default]
    Company,
    Employee,
    Customer,
}

impl std::fmt::Display for Ownership {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ownership::Company => write!(f, "company"),
            Ownership::Employee => write!(f, "employee"),
            Ownership::Customer => write!(f, "customer"),
        }
    }
}

impl std::str::FromStr for Ownership {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "company" => Ok(Ownership::Company),
            "employee" => Ok(Ownership::Employee),
            "customer" => Ok(Ownership::Customer),
            _ => Err(format!(
                "Invalid ownership: {}. Use company, employee, or customer",
                s
            )),
        }
    }
}

/// Role of a thread gauge within a GO/NOGO set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GaugeRole {
    Go,
    Nogo,
}

impl GaugeRole {
    /// The complementary role required of a set companion
    pub fn opposite(&self) -> GaugeRole {
        match self {
            GaugeRole::Go => GaugeRole::Nogo,
            GaugeRole::Nogo => GaugeRole::Go,
        }
    }

    /// Suffix appended to a set base identifier for the member in this role
    pub fn id_suffix(&self) -> &'static str {
        match self {
            GaugeRole::Go => "GO",
            GaugeRole::Nogo => "NOGO",
        }
    }
}

impl std::fmt::Display for GaugeRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GaugeRole::Go => write!(f, "GO"),
            GaugeRole::Nogo => write!(f, "NOGO"),
        }
    }
}

impl std::str::FromStr for GaugeRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "go" => Ok(GaugeRole::Go),
            "nogo" => Ok(GaugeRole::Nogo),
            _ => Err(format!("Invalid gauge role: {}. Use go or nogo", s)),
        }
    }
}

/// Equipment type tag, derived from the specification payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentType {
    ThreadGauge,
    HandTool,
    LargeEquipment,
    CalibrationStandard,
}

impl EquipmentType {
    /// Two-letter code used as the leading part of generated identifiers
    pub fn code(&self) -> &'static str {
        match self {
            EquipmentType::ThreadGauge => "TG",
            EquipmentType::HandTool => "HT",
            EquipmentType::LargeEquipment => "LE",
            EquipmentType::CalibrationStandard => "CS",
        }
    }
}

impl std::fmt::Display for EquipmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EquipmentType::ThreadGauge => write!(f, "thread_gauge"),
            EquipmentType::HandTool => write!(f, "hand_tool"),
            EquipmentType::LargeEquipment => write!(f, "large_equipment"),
            EquipmentType::CalibrationStandard => write!(f, "calibration_standard"),
        }
    }
}

/// Thread gauge specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadSpec {
    /// Nominal size and pitch, e.g. ".250-20" or "M8x1.25"
    pub thread_size: String,

    /// Thread class, e.g. "2A", "3B", "6g"
    pub thread_class: String,

    /// Thread form, e.g. "UNC", "UNF", "M"
    #[serde(default = "default_thread_form")]
    pub thread_form: String,
}

fn default_thread_form() -> String {
    "UN".to_string()
}

/// Hand tool specification (micrometers, calipers, indicators)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandToolSpec {
    pub tool_type: String,
    pub range_min: f64,
    pub range_max: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<f64>,
}

fn default_unit() -> String {
    "in".to_string()
}

/// Large equipment specification (CMMs, height stands, comparators)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LargeEquipmentSpec {
    pub equipment_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<String>,
}

/// Calibration standard specification (gauge blocks, master rings)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardSpec {
    pub standard_type: String,
    pub nominal_value: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncertainty: Option<f64>,
}

/// Type-specific specification block, tagged by equipment type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "equipment_type", rename_all = "snake_case")]
pub enum GaugeSpec {
    ThreadGauge(ThreadSpec),
    HandTool(HandToolSpec),
    LargeEquipment(LargeEquipmentSpec),
    CalibrationStandard(StandardSpec),
}

impl GaugeSpec {
    pub fn equipment_type(&self) -> EquipmentType {
        match self {
            GaugeSpec::ThreadGauge(_) => EquipmentType::ThreadGauge,
            GaugeSpec::HandTool(_) => EquipmentType::HandTool,
            GaugeSpec::LargeEquipment(_) => EquipmentType::LargeEquipment,
            GaugeSpec::CalibrationStandard(_) => EquipmentType::CalibrationStandard,
        }
    }

    /// Compatibility key for pairing
    pub fn key(&self) -> SpecKey {
        match self {
            GaugeSpec::ThreadGauge(t) => SpecKey::Thread {
                size: normalize_key_part(&t.thread_size),
                class: normalize_key_part(&t.thread_class),
                form: normalize_key_part(&t.thread_form),
            },
            GaugeSpec::HandTool(h) => SpecKey::HandTool {
                tool_type: normalize_key_part(&h.tool_type),
                unit: normalize_key_part(&h.unit),
            },
            GaugeSpec::LargeEquipment(e) => SpecKey::LargeEquipment {
                name: normalize_key_part(&e.equipment_name),
            },
            GaugeSpec::CalibrationStandard(s) => SpecKey::Standard {
                standard_type: normalize_key_part(&s.standard_type),
                unit: normalize_key_part(&s.unit),
            },
        }
    }

    /// Short human-readable summary for listings
    pub fn summary(&self) -> String {
        match self {
            GaugeSpec::ThreadGauge(t) => {
                format!("{} {} {}", t.thread_size, t.thread_class, t.thread_form)
            }
            GaugeSpec::HandTool(h) => format!(
                "{} {}-{} {}",
                h.tool_type, h.range_min, h.range_max, h.unit
            ),
            GaugeSpec::LargeEquipment(e) => match &e.model {
                Some(model) => format!("{} ({})", e.equipment_name, model),
                None => e.equipment_name.clone(),
            },
            GaugeSpec::CalibrationStandard(s) => {
                format!("{} {} {}", s.standard_type, s.nominal_value, s.unit)
            }
        }
    }
}

/// Case-normalized specification key
///
/// Equality is exact after normalization; there is no fuzzy matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SpecKey {
    Thread {
        size: String,
        class: String,
        form: String,
    },
    HandTool {
        tool_type: String,
        unit: String,
    },
    LargeEquipment {
        name: String,
    },
    Standard {
        standard_type: String,
        unit: String,
    },
}

fn normalize_key_part(s: &str) -> String {
    s.trim().to_uppercase()
}

/// A physical inspection gauge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gauge {
    /// Unique identifier (e.g., "TG-UN-0001-GO")
    pub id: String,

    /// Shared set identifier; only thread gauges ever carry one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_id: Option<String>,

    /// Category code the identifier was generated under
    pub category: String,

    /// Type-specific specification
    pub spec: GaugeSpec,

    /// GO/NOGO role, present only for thread gauges
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<GaugeRole>,

    pub status: GaugeStatus,

    #[serde(default)]
    pub ownership: Ownership,

    /// Storage location identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    pub created: DateTime<Utc>,

    pub updated: DateTime<Utc>,
}

impl Gauge {
    pub fn equipment_type(&self) -> EquipmentType {
        self.spec.equipment_type()
    }

    /// A thread gauge with no set identifier
    pub fn is_spare(&self) -> bool {
        self.set_id.is_none() && self.equipment_type() == EquipmentType::ThreadGauge
    }
}

/// A GO/NOGO set resolved from the two rows sharing a set identifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaugeSet {
    pub set_id: String,
    pub go: Gauge,
    pub nogo: Gauge,
}

impl GaugeSet {
    pub fn members(&self) -> [&Gauge; 2] {
        [&self.go, &self.nogo]
    }

    pub fn member_ids(&self) -> [&str; 2] {
        [self.go.id.as_str(), self.nogo.id.as_str()]
    }

    /// The member that is not `gauge_id`
    pub fn companion_of(&self, gauge_id: &str) -> Option<&Gauge> {
        if self.go.id == gauge_id {
            Some(&self.nogo)
        } else if self.nogo.id == gauge_id {
            Some(&self.go)
        } else {
            None
        }
    }

    pub fn location(&self) -> Option<&str> {
        self.go.location.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thread(size: &str, class: &str) -> GaugeSpec {
        GaugeSpec::ThreadGauge(ThreadSpec {
            thread_size: size.to_string(),
            thread_class: class.to_string(),
            thread_form: "UNC".to_string(),
        })
    }

    #[test]
    fn test_status_parse_accepts_dashes_and_case() {
        assert_eq!(
            "Pending-Release".parse::<GaugeStatus>().unwrap(),
            GaugeStatus::PendingRelease
        );
        assert_eq!(
            "out_for_calibration".parse::<GaugeStatus>().unwrap(),
            GaugeStatus::OutForCalibration
        );
        assert!("lost".parse::<GaugeStatus>().is_err());
    }

    #[test]
    fn test_terminal_statuses() {
        let terminal: Vec<_> = GaugeStatus::all()
            .iter()
            .filter(|s| s.is_terminal())
            .collect();
        assert_eq!(terminal, vec![&GaugeStatus::Retired, &GaugeStatus::Returned]);
    }

    #[test]
    fn test_role_parse_and_opposite() {
        assert_eq!("NO-GO".parse::<GaugeRole>().unwrap(), GaugeRole::Nogo);
        assert_eq!("go".parse::<GaugeRole>().unwrap(), GaugeRole::Go);
        assert_eq!(GaugeRole::Go.opposite(), GaugeRole::Nogo);
    }

    #[test]
    fn test_spec_key_is_case_normalized() {
        let a = thread(".250-20", "2a");
        let b = thread(" .250-20 ", "2A");
        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), thread(".375-16", "2A").key());
    }

    #[test]
    fn test_spec_yaml_is_tagged() {
        let yaml = r#"
equipment_type: thread_gauge
thread_size: ".250-20"
thread_class: 2A
"#;
        let spec: GaugeSpec = serde_yml::from_str(yaml).unwrap();
        assert_eq!(spec.equipment_type(), EquipmentType::ThreadGauge);
        match spec {
            GaugeSpec::ThreadGauge(t) => assert_eq!(t.thread_form, "UN"),
            other => panic!("unexpected spec: {:?}", other),
        }
    }

    #[test]
    fn test_different_equipment_types_never_share_keys() {
        let tool = GaugeSpec::HandTool(HandToolSpec {
            tool_type: "micrometer".to_string(),
            range_min: 0.0,
            range_max: 1.0,
            unit: "in".to_string(),
            resolution: Some(0.0001),
        });
        assert_ne!(tool.key(), thread(".250-20", "2A").key());
    }
}
