//! Chart-ready view of a published snapshot set.

use serde::Serialize;

use crate::bucket::{classify, VolumeBucket};
use crate::snapshot::{IndexSnapshotSet, MomentumSnapshot, RefreshMode, SnapshotStatus, UnavailableReason};
use crate::UtcDateTime;

/// Scale of the volume-ratio axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisScale {
    Log,
    Linear,
}

/// One scatter point. Unavailable rows are kept with no metrics and the
/// neutral bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresentationRow {
    pub code: String,
    pub name: String,
    pub weight: f64,
    pub pct_change: Option<f64>,
    pub volume_ratio: Option<f64>,
    pub bucket: VolumeBucket,
    pub colour: &'static str,
    pub status: SnapshotStatus,
    pub unavailable_reason: Option<UnavailableReason>,
}

impl From<&MomentumSnapshot> for PresentationRow {
    fn from(row: &MomentumSnapshot) -> Self {
        let bucket = classify(row.volume_ratio());
        Self {
            code: row.code().to_owned(),
            name: row.name().to_owned(),
            weight: row.weight(),
            pct_change: row.pct_change(),
            volume_ratio: row.volume_ratio(),
            bucket,
            colour: bucket.colour(),
            status: row.status(),
            unavailable_reason: row.unavailable_reason(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresentationFrame {
    pub index: String,
    pub title: String,
    pub mode: RefreshMode,
    pub x_axis: AxisScale,
    pub last_baseline_at: Option<UtcDateTime>,
    pub last_intraday_at: Option<UtcDateTime>,
    pub rows: Vec<PresentationRow>,
}

impl PresentationFrame {
    pub fn from_set(set: &IndexSnapshotSet) -> Self {
        let rows: Vec<PresentationRow> = set.snapshots().iter().map(PresentationRow::from).collect();
        Self {
            index: set.index().to_owned(),
            title: format!("{} Volume Ratio: Today VS.10 Days Average", set.index()),
            mode: set.mode(),
            x_axis: axis_scale(&rows),
            last_baseline_at: set.last_baseline_at(),
            last_intraday_at: set.last_intraday_at(),
            rows,
        }
    }

    /// Row count per bucket, hottest first, empty buckets omitted.
    pub fn bucket_counts(&self) -> Vec<(VolumeBucket, usize)> {
        VolumeBucket::ALL
            .iter()
            .map(|bucket| {
                let count = self.rows.iter().filter(|row| row.bucket == *bucket).count();
                (*bucket, count)
            })
            .filter(|(_, count)| *count > 0)
            .collect()
    }
}

/// Log scale only when there is at least one ratio and all are positive.
fn axis_scale(rows: &[PresentationRow]) -> AxisScale {
    let mut ratios = rows.iter().filter_map(|row| row.volume_ratio).peekable();
    if ratios.peek().is_none() {
        return AxisScale::Linear;
    }
    if ratios.all(|ratio| ratio > 0.0) {
        AxisScale::Log
    } else {
        AxisScale::Linear
    }
}
