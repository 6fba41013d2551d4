//! Filter enums for list commands

use clap::ValueEnum;

use crate::entities::GaugeStatus;

/// Status filter for `gauge list`
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum StatusFilter {
    Available,
    CheckedOut,
    PendingQc,
    PendingTransfer,
    CalibrationDue,
    OutOfService,
    PendingUnseal,
    OutForCalibration,
    PendingCertificate,
    PendingRelease,
    Retired,
    Returned,
    /// Anything in the calibration pipeline
    InCalibration,
    /// Everything except retired and returned - default
    #[default]
    Active,
    /// All statuses
    All,
}

impl StatusFilter {
    /// Check if a status matches this filter
    pub fn matches(&self, status: GaugeStatus) -> bool {
        match self {
            StatusFilter::InCalibration => status.is_in_calibration(),
            StatusFilter::Active => !status.is_terminal(),
            StatusFilter::All => true,
            exact => exact.exact() == Some(status),
        }
    }

    /// The single status selected, if this filter names one
    pub fn exact(&self) -> Option<GaugeStatus> {
        match self {
            StatusFilter::Available => Some(GaugeStatus::Available),
            StatusFilter::CheckedOut => Some(GaugeStatus::CheckedOut),
            StatusFilter::PendingQc => Some(GaugeStatus::PendingQc),
            StatusFilter::PendingTransfer => Some(GaugeStatus::PendingTransfer),
            StatusFilter::CalibrationDue => Some(GaugeStatus::CalibrationDue),
            StatusFilter::OutOfService => Some(GaugeStatus::OutOfService),
            StatusFilter::PendingUnseal => Some(GaugeStatus::PendingUnseal),
            StatusFilter::OutForCalibration => Some(GaugeStatus::OutForCalibration),
            StatusFilter::PendingCertificate => Some(GaugeStatus::PendingCertificate),
            StatusFilter::PendingRelease => Some(GaugeStatus::PendingRelease),
            StatusFilter::Retired => Some(GaugeStatus::Retired),
            StatusFilter::Returned => Some(GaugeStatus::Returned),
            StatusFilter::InCalibration | StatusFilter::Active | StatusFilter::All => None,
        }
    }
}
