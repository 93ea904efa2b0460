/// Core data types for the pipeline pressure integrity service.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no logic, no I/O, and no external dependencies beyond chrono
/// and serde — only types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Default provenance tags
// ---------------------------------------------------------------------------

/// Default recorder identity for telemetry arriving from the SCADA system.
pub const SOURCE_SCADA: &str = "SCADA";

/// Default data quality flag for readings with no known acquisition issues.
pub const QUALITY_GOOD: &str = "GOOD";

// ---------------------------------------------------------------------------
// Reading types
// ---------------------------------------------------------------------------

/// A single sealed pressure observation as stored in the `Readings` table.
///
/// `id` is assigned by the store at insertion and is never reused or
/// renumbered — the ascending id order *is* the hash chain order, across
/// all segments. `hash_signature` seals the record and its position in
/// the chain; see `chain::reading_hash` for the exact field coverage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub segment_id: String,
    pub sensor_id: i32,
    pub pressure_psig: f64,
    /// Maximum Allowable Operating Pressure configured for the segment
    /// at insertion time, in PSIG. Must be > 0.
    pub maop_psig: f64,
    pub recorded_by: String,
    pub data_source: String,
    pub data_quality: String,
    pub notes: Option<String>,
    /// 64-character lowercase hex SHA-256 digest chaining this record to
    /// its predecessor. Set by the hash engine, never by callers.
    pub hash_signature: String,
}

/// A reading as submitted for insertion — before the store assigns an id
/// and before the hash engine seals it.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReading {
    pub timestamp: DateTime<Utc>,
    pub segment_id: String,
    pub sensor_id: i32,
    pub pressure_psig: f64,
    pub maop_psig: f64,
    pub recorded_by: String,
    pub data_source: String,
    pub data_quality: String,
    pub notes: Option<String>,
}

impl NewReading {
    /// Builds a reading with the standard SCADA provenance defaults.
    /// Use struct update syntax to override individual fields:
    ///
    /// ```ignore
    /// NewReading {
    ///     recorded_by: "field-tech-7".to_string(),
    ///     ..NewReading::scada(ts, "SEG-02", 2, 820.0, 950.0)
    /// }
    /// ```
    pub fn scada(
        timestamp: DateTime<Utc>,
        segment_id: &str,
        sensor_id: i32,
        pressure_psig: f64,
        maop_psig: f64,
    ) -> Self {
        NewReading {
            timestamp,
            segment_id: segment_id.to_string(),
            sensor_id,
            pressure_psig,
            maop_psig,
            recorded_by: SOURCE_SCADA.to_string(),
            data_source: SOURCE_SCADA.to_string(),
            data_quality: QUALITY_GOOD.to_string(),
            notes: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Classification & severity types
// ---------------------------------------------------------------------------

/// Transient-filter verdict for a single reading.
///
/// `Spike` means the instantaneous ratio breached the threshold but the
/// trailing average did not — a momentary excursion the alerting layer
/// should suppress. `Sustained` means both breached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertClass {
    Normal,
    Spike,
    Sustained,
}

impl std::fmt::Display for AlertClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertClass::Normal => write!(f, "NORMAL"),
            AlertClass::Spike => write!(f, "SPIKE"),
            AlertClass::Sustained => write!(f, "SUSTAINED"),
        }
    }
}

/// MAOP compliance severity tiers, in ascending order of severity.
///
/// A closed enumeration — the rule loader maps configured status strings
/// into these variants and rejects anything else, so downstream code never
/// compares free-form strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Ok,
    Warning,
    Critical,
    Violation,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Ok => write!(f, "OK"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Critical => write!(f, "CRITICAL"),
            Severity::Violation => write!(f, "VIOLATION"),
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when sealing, verifying, or classifying readings.
///
/// Integrity violations found by `chain::HashChain::verify` are *not*
/// errors — they are the expected, reportable result of verification and
/// surface as `ChainVerification` data instead.
#[derive(Debug, PartialEq)]
pub enum PipelineError {
    /// MAOP is zero or negative. Fatal configuration error — no ratio is
    /// ever computed against an invalid limit.
    InvalidMaop { segment_id: String, maop_psig: f64 },
    /// The threshold rule set is empty or could not be read.
    EmptyRuleSet,
    /// A threshold rule failed validation (duplicate severity,
    /// non-positive ratio, unparseable file).
    MalformedRule(String),
    /// I/O failure talking to the backing store. Safe for the caller to
    /// retry from a fresh tail read; the chain is never left partially
    /// written.
    Store(String),
    /// The store detected a second insert chained to the same predecessor
    /// and rejected it. Retry from a fresh tail read.
    RaceDetected { expected_tail: String },
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::InvalidMaop { segment_id, maop_psig } => {
                write!(f, "Invalid MAOP for segment {}: {} psig", segment_id, maop_psig)
            }
            PipelineError::EmptyRuleSet => write!(f, "Threshold rule set is empty"),
            PipelineError::MalformedRule(msg) => write!(f, "Malformed threshold rule: {}", msg),
            PipelineError::Store(msg) => write!(f, "Store error: {}", msg),
            PipelineError::RaceDetected { expected_tail } => {
                write!(f, "Concurrent insert detected (tail moved past {})", expected_tail)
            }
        }
    }
}

impl std::error::Error for PipelineError {}
