//! Transient Filter Scenario Tests
//!
//! End-to-end spike-vs-sustained behavior over realistic telemetry
//! streams, including the compliance-event timeline the filter was
//! built for: a segment ramping through WARNING and CRITICAL while
//! other segments throw momentary transients that must be suppressed.

use chrono::{DateTime, TimeZone, Utc};
use pipemon_service::alert::thresholds::{RuleSet, evaluate_pressure};
use pipemon_service::alert::transients::{
    FilterConfig, classify_reading, classify_stream, filter_summary, sustained_alerts,
};
use pipemon_service::model::{AlertClass, PipelineError, Reading, Severity};

fn ts(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 7, 10, minute, 0).unwrap()
}

fn reading(id: i64, minute: u32, segment: &str, pressure: f64, maop: f64) -> Reading {
    Reading {
        id,
        timestamp: ts(minute),
        segment_id: segment.to_string(),
        sensor_id: 1,
        pressure_psig: pressure,
        maop_psig: maop,
        recorded_by: "SCADA".to_string(),
        data_source: "SCADA".to_string(),
        data_quality: "GOOD".to_string(),
        notes: None,
        hash_signature: String::new(),
    }
}

// ---------------------------------------------------------------------------
// Single-reading classification
// ---------------------------------------------------------------------------

#[test]
fn test_spike_prior_low_reading_dilutes_the_average() {
    // One prior reading at 75%, current at 97%: avg ~86% < 95%.
    let history = vec![reading(1, 0, "SEG-01", 750.0, 1000.0)];
    let current = reading(2, 3, "SEG-01", 970.0, 1000.0);

    let c = classify_reading(&current, &history, &FilterConfig::default()).unwrap();
    assert_eq!(c.alert_class, AlertClass::Spike);
    assert!((c.avg_ratio - 0.86).abs() < 1e-9);
}

#[test]
fn test_sustained_prior_high_readings_corroborate_the_breach() {
    let history = vec![
        reading(1, 0, "SEG-02", 910.0, 950.0), // 95.8%
        reading(2, 2, "SEG-02", 915.0, 950.0), // 96.3%
    ];
    let current = reading(3, 4, "SEG-02", 920.0, 950.0); // 96.8%

    let c = classify_reading(&current, &history, &FilterConfig::default()).unwrap();
    assert_eq!(c.alert_class, AlertClass::Sustained);
}

#[test]
fn test_lone_first_reading_at_99_percent_is_sustained() {
    // Empty history: avg == instant, so a lone breach can never be
    // dismissed as a spike.
    let current = reading(1, 0, "SEG-03", 866.25, 875.0); // 99%
    let c = classify_reading(&current, &[], &FilterConfig::default()).unwrap();
    assert_eq!(c.alert_class, AlertClass::Sustained);
    assert_eq!(c.window_size, 1);
    assert_eq!(c.instant_ratio, c.avg_ratio);
}

#[test]
fn test_zero_maop_fails_classification_with_configuration_error() {
    let current = reading(1, 0, "SEG-01", 970.0, 0.0);
    let result = classify_reading(&current, &[], &FilterConfig::default());
    assert!(matches!(result, Err(PipelineError::InvalidMaop { .. })));
}

#[test]
fn test_negative_maop_fails_classification_with_configuration_error() {
    let current = reading(1, 0, "SEG-01", 970.0, -1000.0);
    let result = classify_reading(&current, &[], &FilterConfig::default());
    assert!(matches!(result, Err(PipelineError::InvalidMaop { .. })));
}

// ---------------------------------------------------------------------------
// Threshold evaluator boundaries
// ---------------------------------------------------------------------------

#[test]
fn test_ratio_exactly_on_a_threshold_matches_that_rule() {
    let rules = RuleSet::builtin();
    // 855 / 950 = 0.90 exactly.
    assert_eq!(
        evaluate_pressure(855.0, 950.0, "SEG-02", &rules).unwrap(),
        Severity::Warning
    );
    // 950 / 950 = 1.00 exactly.
    assert_eq!(
        evaluate_pressure(950.0, 950.0, "SEG-02", &rules).unwrap(),
        Severity::Violation
    );
}

#[test]
fn test_ratio_below_all_thresholds_is_ok() {
    let rules = RuleSet::builtin();
    assert_eq!(
        evaluate_pressure(800.0, 950.0, "SEG-02", &rules).unwrap(),
        Severity::Ok
    );
}

#[test]
fn test_evaluator_rejects_invalid_maop_before_computing_a_ratio() {
    let rules = RuleSet::builtin();
    assert!(matches!(
        evaluate_pressure(800.0, 0.0, "SEG-02", &rules),
        Err(PipelineError::InvalidMaop { .. })
    ));
}

// ---------------------------------------------------------------------------
// Stream scenarios
// ---------------------------------------------------------------------------

/// The compliance-event timeline: SEG-02 drifts upward into a sustained
/// breach while SEG-01 and SEG-04 each throw a single transient spike.
fn compliance_event_stream() -> Vec<Reading> {
    vec![
        // SEG-01 steady around 75%, with one transient at minute 3.
        reading(1, 0, "SEG-01", 750.0, 1000.0),
        reading(2, 3, "SEG-01", 960.0, 1000.0), // transient, avg stays low
        reading(3, 6, "SEG-01", 755.0, 1000.0),
        // SEG-02 ramping into trouble: 90% -> 95% -> 96% over 6 minutes.
        reading(4, 0, "SEG-02", 855.0, 950.0),
        reading(5, 3, "SEG-02", 903.0, 950.0),
        reading(6, 6, "SEG-02", 912.0, 950.0),
        // SEG-04 one isolated transient.
        reading(7, 9, "SEG-04", 1070.0, 1100.0), // 97.3%, lone in window
    ]
}

#[test]
fn test_compliance_event_stream_classifications() {
    let classified =
        classify_stream(&compliance_event_stream(), &FilterConfig::default()).unwrap();

    let by_id = |id: i64| classified.iter().find(|c| c.reading_id == id).unwrap();

    assert_eq!(by_id(1).alert_class, AlertClass::Normal);
    assert_eq!(by_id(2).alert_class, AlertClass::Spike, "SEG-01 transient suppressed");
    assert_eq!(by_id(3).alert_class, AlertClass::Normal);

    // SEG-02: 90% is below the filter threshold; 95% arrives with a low
    // window average (spike); by 96% the average has caught up.
    assert_eq!(by_id(4).alert_class, AlertClass::Normal);
    assert_eq!(by_id(5).alert_class, AlertClass::Spike);
    assert_eq!(by_id(6).alert_class, AlertClass::Sustained, "drift confirmed");

    // SEG-04's lone breach has no history — conservatively sustained.
    assert_eq!(by_id(7).alert_class, AlertClass::Sustained);
}

#[test]
fn test_sustained_alerts_returns_only_confirmed_breaches() {
    let alerts =
        sustained_alerts(&compliance_event_stream(), &FilterConfig::default()).unwrap();
    let ids: Vec<i64> = alerts.iter().map(|a| a.reading_id).collect();
    assert_eq!(ids, vec![6, 7], "spikes must be filtered out of the alert feed");
}

#[test]
fn test_summary_accounts_for_every_high_reading() {
    let summary =
        filter_summary(&compliance_event_stream(), &FilterConfig::default()).unwrap();

    // High readings: ids 2, 5, 6, 7. Spikes: 2 and 5. Sustained: 6 and 7.
    assert_eq!(summary.total_high, 4);
    assert_eq!(summary.spikes_filtered, 2);
    assert_eq!(summary.sustained_flagged, 2);
    assert!((summary.effectiveness - 0.5).abs() < 1e-12);
}

#[test]
fn test_summary_on_quiet_stream_reports_zero_effectiveness() {
    let stream = vec![
        reading(1, 0, "SEG-01", 700.0, 1000.0),
        reading(2, 5, "SEG-01", 710.0, 1000.0),
    ];
    let summary = filter_summary(&stream, &FilterConfig::default()).unwrap();
    assert_eq!(summary.total_high, 0);
    assert_eq!(summary.spikes_filtered, 0);
    assert_eq!(summary.sustained_flagged, 0);
    assert_eq!(summary.effectiveness, 0.0);
}

#[test]
fn test_widening_the_window_can_demote_a_sustained_to_spike() {
    // Two high readings close together look sustained under a 5-minute
    // window; a 30-minute window pulls in older low readings and reveals
    // the excursion as short-lived.
    let stream = vec![
        reading(1, 0, "SEG-01", 700.0, 1000.0),
        reading(2, 10, "SEG-01", 700.0, 1000.0),
        reading(3, 24, "SEG-01", 960.0, 1000.0),
        reading(4, 26, "SEG-01", 965.0, 1000.0),
    ];

    let narrow = FilterConfig::default();
    let wide = FilterConfig {
        window: chrono::Duration::minutes(30),
        ..FilterConfig::default()
    };

    let narrow_classified = classify_stream(&stream, &narrow).unwrap();
    assert_eq!(narrow_classified[3].alert_class, AlertClass::Sustained);

    let wide_classified = classify_stream(&stream, &wide).unwrap();
    assert_eq!(wide_classified[3].alert_class, AlertClass::Spike);
}
