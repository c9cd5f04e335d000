//! Snapshot data model: per-constituent metrics and the per-index set.

use serde::Serialize;

use crate::{ConstituentRecord, SymbolFamily, UtcDateTime};

/// Data quality of one snapshot row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotStatus {
    Complete,
    Unavailable,
}

/// Why a row ended up [`SnapshotStatus::Unavailable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    InvalidSymbol,
    InsufficientHistory,
    GatewayUnavailable,
    Timeout,
    ZeroBaselineVolume,
    ZeroClose,
    Internal,
}

impl UnavailableReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidSymbol => "invalid_symbol",
            Self::InsufficientHistory => "insufficient_history",
            Self::GatewayUnavailable => "gateway_unavailable",
            Self::Timeout => "timeout",
            Self::ZeroBaselineVolume => "zero_baseline_volume",
            Self::ZeroClose => "zero_close",
            Self::Internal => "internal",
        }
    }
}

/// Derived momentum metrics for one constituent.
///
/// Rows are replaced wholesale, never patched in place. `pct_change` and
/// `volume_ratio` are both `Some` exactly when `status` is `Complete`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MomentumSnapshot {
    code: String,
    name: String,
    weight: f64,
    reference_close: Option<f64>,
    baseline_avg_volume_10d: Option<f64>,
    latest_close: Option<f64>,
    latest_volume: Option<u64>,
    pct_change: Option<f64>,
    volume_ratio: Option<f64>,
    status: SnapshotStatus,
    unavailable_reason: Option<UnavailableReason>,
    computed_at: Option<UtcDateTime>,
}

/// Baseline-derived inputs of a complete row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct CompleteFields {
    pub reference_close: f64,
    pub baseline_avg_volume_10d: f64,
    pub latest_close: f64,
    pub latest_volume: u64,
    pub pct_change: f64,
    pub volume_ratio: f64,
}

impl MomentumSnapshot {
    pub(crate) fn complete(
        record: &ConstituentRecord,
        fields: CompleteFields,
        computed_at: UtcDateTime,
    ) -> Self {
        Self {
            code: record.code().to_owned(),
            name: record.name().to_owned(),
            weight: record.weight(),
            reference_close: Some(fields.reference_close),
            baseline_avg_volume_10d: Some(fields.baseline_avg_volume_10d),
            latest_close: Some(fields.latest_close),
            latest_volume: Some(fields.latest_volume),
            pct_change: Some(fields.pct_change),
            volume_ratio: Some(fields.volume_ratio),
            status: SnapshotStatus::Complete,
            unavailable_reason: None,
            computed_at: Some(computed_at),
        }
    }

    pub(crate) fn unavailable(record: &ConstituentRecord, reason: UnavailableReason) -> Self {
        Self {
            code: record.code().to_owned(),
            name: record.name().to_owned(),
            weight: record.weight(),
            reference_close: None,
            baseline_avg_volume_10d: None,
            latest_close: None,
            latest_volume: None,
            pct_change: None,
            volume_ratio: None,
            status: SnapshotStatus::Unavailable,
            unavailable_reason: Some(reason),
            computed_at: None,
        }
    }

    /// Copy of this row with the latest-bar fields replaced.
    ///
    /// Identity and baseline fields are carried over untouched.
    pub(crate) fn with_latest(
        &self,
        latest_close: f64,
        latest_volume: u64,
        pct_change: f64,
        volume_ratio: f64,
        computed_at: UtcDateTime,
    ) -> Self {
        Self {
            latest_close: Some(latest_close),
            latest_volume: Some(latest_volume),
            pct_change: Some(pct_change),
            volume_ratio: Some(volume_ratio),
            status: SnapshotStatus::Complete,
            unavailable_reason: None,
            computed_at: Some(computed_at),
            ..self.clone()
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn reference_close(&self) -> Option<f64> {
        self.reference_close
    }

    pub fn baseline_avg_volume_10d(&self) -> Option<f64> {
        self.baseline_avg_volume_10d
    }

    pub fn latest_close(&self) -> Option<f64> {
        self.latest_close
    }

    pub fn latest_volume(&self) -> Option<u64> {
        self.latest_volume
    }

    pub fn pct_change(&self) -> Option<f64> {
        self.pct_change
    }

    pub fn volume_ratio(&self) -> Option<f64> {
        self.volume_ratio
    }

    pub fn status(&self) -> SnapshotStatus {
        self.status
    }

    pub fn unavailable_reason(&self) -> Option<UnavailableReason> {
        self.unavailable_reason
    }

    pub fn computed_at(&self) -> Option<UtcDateTime> {
        self.computed_at
    }

    pub fn is_complete(&self) -> bool {
        self.status == SnapshotStatus::Complete
    }
}

/// Refresh state of one index's snapshot set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshMode {
    Uninitialized,
    BaselineReady,
    IntradayRefreshed,
}

impl RefreshMode {
    pub const fn accepts_intraday(self) -> bool {
        matches!(self, Self::BaselineReady | Self::IntradayRefreshed)
    }
}

/// Published snapshots of one index, in universe order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexSnapshotSet {
    index: String,
    family: SymbolFamily,
    snapshots: Vec<MomentumSnapshot>,
    mode: RefreshMode,
    last_baseline_at: Option<UtcDateTime>,
    last_intraday_at: Option<UtcDateTime>,
}

impl IndexSnapshotSet {
    pub(crate) fn baseline(
        index: impl Into<String>,
        family: SymbolFamily,
        snapshots: Vec<MomentumSnapshot>,
        at: UtcDateTime,
    ) -> Self {
        Self {
            index: index.into(),
            family,
            snapshots,
            mode: RefreshMode::BaselineReady,
            last_baseline_at: Some(at),
            last_intraday_at: None,
        }
    }

    /// Successor set after an intraday pass; `last_baseline_at` is kept.
    pub(crate) fn refreshed(&self, snapshots: Vec<MomentumSnapshot>, at: UtcDateTime) -> Self {
        Self {
            index: self.index.clone(),
            family: self.family,
            snapshots,
            mode: RefreshMode::IntradayRefreshed,
            last_baseline_at: self.last_baseline_at,
            last_intraday_at: Some(at),
        }
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn family(&self) -> SymbolFamily {
        self.family
    }

    pub fn snapshots(&self) -> &[MomentumSnapshot] {
        &self.snapshots
    }

    pub fn mode(&self) -> RefreshMode {
        self.mode
    }

    pub fn last_baseline_at(&self) -> Option<UtcDateTime> {
        self.last_baseline_at
    }

    pub fn last_intraday_at(&self) -> Option<UtcDateTime> {
        self.last_intraday_at
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn complete_count(&self) -> usize {
        self.snapshots.iter().filter(|row| row.is_complete()).count()
    }

    pub fn unavailable_count(&self) -> usize {
        self.len() - self.complete_count()
    }

    /// First row with the given code.
    pub fn find(&self, code: &str) -> Option<&MomentumSnapshot> {
        self.snapshots.iter().find(|row| row.code() == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ConstituentRecord {
        ConstituentRecord::new("700", "Tencent", 8.0).expect("valid record")
    }

    #[test]
    fn unavailable_row_has_no_metrics() {
        let row = MomentumSnapshot::unavailable(&record(), UnavailableReason::Timeout);
        assert_eq!(row.status(), SnapshotStatus::Unavailable);
        assert!(row.pct_change().is_none());
        assert!(row.volume_ratio().is_none());
        assert_eq!(row.unavailable_reason(), Some(UnavailableReason::Timeout));
        assert_eq!(row.code(), "700");
    }

    #[test]
    fn with_latest_keeps_baseline_fields() {
        let at = UtcDateTime::parse("2024-01-02T00:00:00Z").expect("timestamp");
        let row = MomentumSnapshot::complete(
            &record(),
            CompleteFields {
                reference_close: 100.0,
                baseline_avg_volume_10d: 1_000.0,
                latest_close: 100.0,
                latest_volume: 1_500,
                pct_change: 1.0,
                volume_ratio: 1.5,
            },
            at,
        );

        let later = UtcDateTime::parse("2024-01-02T03:00:00Z").expect("timestamp");
        let next = row.with_latest(103.0, 500, 3.0, 0.5, later);
        assert_eq!(next.reference_close(), Some(100.0));
        assert_eq!(next.baseline_avg_volume_10d(), Some(1_000.0));
        assert_eq!(next.latest_close(), Some(103.0));
        assert_eq!(next.computed_at(), Some(later));
        assert_eq!(next.name(), "Tencent");
    }

    #[test]
    fn only_baseline_modes_accept_intraday() {
        assert!(!RefreshMode::Uninitialized.accepts_intraday());
        assert!(RefreshMode::BaselineReady.accepts_intraday());
        assert!(RefreshMode::IntradayRefreshed.accepts_intraday());
    }
}
