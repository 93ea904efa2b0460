/// Transient spike vs sustained drift classification.
///
/// A single high reading is often instrument noise or a pump transient —
/// paging on every one produces nuisance alarms that operators learn to
/// ignore. This filter only flags a threshold breach when the trailing
/// moving average over a time window is also elevated.
///
/// The window is time-based and strictly backward-looking, inclusive of
/// the reading itself: `[t - window, t]`. Readings may be irregularly
/// spaced, so each reading is classified independently against its own
/// window rather than by a fixed-width running average.
///
/// # Clock injection
/// Nothing here calls `Utc::now()` — every function works from the
/// timestamps carried by the readings, so classification is fully
/// deterministic in tests.

use chrono::Duration;
use serde::Serialize;

use crate::model::{AlertClass, PipelineError, Reading};

// ---------------------------------------------------------------------------
// Filter configuration
// ---------------------------------------------------------------------------

/// Caller-supplied window and threshold. Defaults match the regulatory
/// monitoring profile: a 5-minute trailing window and a 95% MAOP ratio.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    pub window: Duration,
    pub threshold_ratio: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            window: Duration::minutes(5),
            threshold_ratio: 0.95,
        }
    }
}

// ---------------------------------------------------------------------------
// Classification result
// ---------------------------------------------------------------------------

/// Full classification detail for one reading — the verdict plus the
/// ratios that produced it, for audit display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub reading_id: i64,
    pub segment_id: String,
    pub alert_class: AlertClass,
    pub instant_ratio: f64,
    pub avg_ratio: f64,
    /// Number of readings that fell inside the trailing window,
    /// including the classified reading itself. Always >= 1.
    pub window_size: usize,
}

/// Aggregate spike-vs-sustained accounting over a classified stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterSummary {
    /// Readings whose instantaneous ratio met or exceeded the threshold.
    pub total_high: usize,
    /// High readings the moving average did not corroborate (suppressed).
    pub spikes_filtered: usize,
    /// High readings confirmed by the moving average (alerted).
    pub sustained_flagged: usize,
    /// spikes_filtered / total_high, or 0.0 when there were no high
    /// readings at all.
    pub effectiveness: f64,
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Classifies one reading against its same-segment history.
///
/// `history` is the segment's other readings; members outside the
/// trailing window `[t - window, t]` are ignored, so callers may pass a
/// superset (e.g. everything the store returned). The reading itself is
/// always part of its own window whether or not it also appears in
/// `history`.
///
/// The average ratio divides every window member's pressure by the
/// *current* reading's MAOP. The limit is treated as constant per segment
/// across the window; if the segment was reconfigured mid-window the
/// average is computed against the new limit, which is a documented gap
/// rather than an attempt to average across mismatched limits.
///
/// Decision table, with `t` = threshold ratio:
///
/// | instant    | average    | verdict   |
/// |------------|------------|-----------|
/// | `< t`      | any        | Normal    |
/// | `>= t`     | `>= t`     | Sustained |
/// | `>= t`     | `< t`      | Spike     |
///
/// A lone reading (empty window history) has `avg == instant`, so it can
/// never be a Spike — a breach with no history to average against is
/// conservatively treated as Sustained, not dismissed.
pub fn classify_reading(
    reading: &Reading,
    history: &[Reading],
    config: &FilterConfig,
) -> Result<Classification, PipelineError> {
    if reading.maop_psig <= 0.0 {
        return Err(PipelineError::InvalidMaop {
            segment_id: reading.segment_id.clone(),
            maop_psig: reading.maop_psig,
        });
    }

    let window_start = reading.timestamp - config.window;

    let mut pressure_sum = reading.pressure_psig;
    let mut window_size = 1usize;
    for other in history {
        if other.id == reading.id {
            continue;
        }
        if other.segment_id == reading.segment_id
            && other.timestamp >= window_start
            && other.timestamp <= reading.timestamp
        {
            pressure_sum += other.pressure_psig;
            window_size += 1;
        }
    }

    let instant_ratio = reading.pressure_psig / reading.maop_psig;
    let avg_ratio = (pressure_sum / window_size as f64) / reading.maop_psig;

    let alert_class = if instant_ratio < config.threshold_ratio {
        AlertClass::Normal
    } else if avg_ratio >= config.threshold_ratio {
        AlertClass::Sustained
    } else {
        AlertClass::Spike
    };

    Ok(Classification {
        reading_id: reading.id,
        segment_id: reading.segment_id.clone(),
        alert_class,
        instant_ratio,
        avg_ratio,
        window_size,
    })
}

/// Classifies every reading in a stream, each against its own trailing
/// window drawn from the same stream. The stream may interleave segments;
/// windows never cross segment boundaries.
pub fn classify_stream(
    readings: &[Reading],
    config: &FilterConfig,
) -> Result<Vec<Classification>, PipelineError> {
    readings
        .iter()
        .map(|reading| classify_reading(reading, readings, config))
        .collect()
}

/// Classified readings that warrant an operator alert — Sustained only,
/// spikes suppressed.
pub fn sustained_alerts(
    readings: &[Reading],
    config: &FilterConfig,
) -> Result<Vec<Classification>, PipelineError> {
    Ok(classify_stream(readings, config)?
        .into_iter()
        .filter(|c| c.alert_class == AlertClass::Sustained)
        .collect())
}

/// Spike-vs-sustained accounting for a classified stream, including how
/// many would-be alarms the filter suppressed.
pub fn filter_summary(
    readings: &[Reading],
    config: &FilterConfig,
) -> Result<FilterSummary, PipelineError> {
    let classified = classify_stream(readings, config)?;

    let total_high = classified
        .iter()
        .filter(|c| c.instant_ratio >= config.threshold_ratio)
        .count();
    let spikes_filtered = classified
        .iter()
        .filter(|c| c.alert_class == AlertClass::Spike)
        .count();
    let sustained_flagged = classified
        .iter()
        .filter(|c| c.alert_class == AlertClass::Sustained)
        .count();

    let effectiveness = if total_high > 0 {
        spikes_filtered as f64 / total_high as f64
    } else {
        0.0
    };

    Ok(FilterSummary { total_high, spikes_filtered, sustained_flagged, effectiveness })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
