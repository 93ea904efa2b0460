/// Alerting logic for MAOP compliance monitoring.
///
/// Submodules:
/// - `thresholds` — maps pressure/MAOP ratios to severity tiers using
///   externally configured threshold rules.
/// - `transients` — distinguishes momentary pressure spikes from
///   sustained drift using a trailing time window, so the alerting layer
///   only pages on breaches the moving average corroborates.

pub mod thresholds;
pub mod transients;
