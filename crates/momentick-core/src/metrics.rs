//! Pure per-constituent metric computation.
//!
//! Every function here maps inputs to fresh values; nothing touches shared
//! state, so the engine can run them on any task.

use crate::snapshot::{CompleteFields, MomentumSnapshot, UnavailableReason};
use crate::{ConstituentRecord, DailyBar, UtcDateTime};

/// Sessions averaged into the baseline volume.
pub const BASELINE_VOLUME_WINDOW: usize = 10;

/// Bars needed for a baseline: the ten-session volume window, the prior
/// close it ends on, the reference session, and the still-forming session.
pub const MIN_HISTORY_BARS: usize = BASELINE_VOLUME_WINDOW + 2;

/// Rounds half away from zero to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percent change from `from` to `to`, rounded to two decimals.
///
/// `None` when `from` is zero.
pub fn percent_change(from: f64, to: f64) -> Option<f64> {
    if from == 0.0 {
        return None;
    }
    Some(round2((to - from) / from * 100.0))
}

/// `volume / average`, rounded to two decimals.
///
/// `None` when the average is zero or negative.
pub fn volume_ratio(volume: u64, average: f64) -> Option<f64> {
    if average.is_nan() || average <= 0.0 {
        return None;
    }
    Some(round2(volume as f64 / average))
}

/// Exponential moving average over `values` with smoothing `2 / (span + 1)`.
///
/// Seeded with the first value and not bias-adjusted, so the output has one
/// entry per input. Empty when `span` is zero.
pub fn ema(values: &[f64], span: usize) -> Vec<f64> {
    if span == 0 {
        return Vec::new();
    }
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut averages = Vec::with_capacity(values.len());
    let mut current: Option<f64> = None;
    for &value in values {
        let next = match current {
            Some(previous) => previous + alpha * (value - previous),
            None => value,
        };
        averages.push(next);
        current = Some(next);
    }
    averages
}

/// Computes the baseline row of one constituent from its daily history.
///
/// The second-to-last bar is the reference session; the last bar may be a
/// partial current session and is ignored.
pub fn baseline_snapshot(
    record: &ConstituentRecord,
    bars: &[DailyBar],
    computed_at: UtcDateTime,
) -> MomentumSnapshot {
    if bars.len() < MIN_HISTORY_BARS {
        return MomentumSnapshot::unavailable(record, UnavailableReason::InsufficientHistory);
    }

    let reference_index = bars.len() - 2;
    let reference = &bars[reference_index];
    let prior = &bars[reference_index - 1];
    let window = &bars[reference_index - BASELINE_VOLUME_WINDOW..reference_index];

    let total_volume: f64 = window.iter().map(|bar| bar.volume as f64).sum();
    let baseline_avg_volume_10d = total_volume / BASELINE_VOLUME_WINDOW as f64;

    if reference.close == 0.0 {
        return MomentumSnapshot::unavailable(record, UnavailableReason::ZeroClose);
    }
    let Some(pct_change) = percent_change(prior.close, reference.close) else {
        return MomentumSnapshot::unavailable(record, UnavailableReason::ZeroClose);
    };
    let Some(volume_ratio) = volume_ratio(reference.volume, baseline_avg_volume_10d) else {
        return MomentumSnapshot::unavailable(record, UnavailableReason::ZeroBaselineVolume);
    };

    MomentumSnapshot::complete(
        record,
        CompleteFields {
            reference_close: reference.close,
            baseline_avg_volume_10d,
            latest_close: reference.close,
            latest_volume: reference.volume,
            pct_change,
            volume_ratio,
        },
        computed_at,
    )
}

/// Recomputes a complete row against a freshly observed bar.
///
/// Reuses the stored reference close and baseline volume; returns `None`
/// for rows that have no baseline to reuse.
pub fn intraday_snapshot(
    previous: &MomentumSnapshot,
    latest: &DailyBar,
    computed_at: UtcDateTime,
) -> Option<MomentumSnapshot> {
    if !previous.is_complete() {
        return None;
    }

    let pct_change = percent_change(previous.reference_close()?, latest.close)?;
    let volume_ratio = volume_ratio(latest.volume, previous.baseline_avg_volume_10d()?)?;

    Some(previous.with_latest(
        latest.close,
        latest.volume,
        pct_change,
        volume_ratio,
        computed_at,
    ))
}
