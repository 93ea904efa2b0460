/// MAOP compliance threshold evaluation.
///
/// Severity is a pure function of the pressure/MAOP ratio and an ordered
/// rule set: rules are checked from the highest threshold downward, and
/// the first rule whose threshold is `<=` the ratio wins. A ratio below
/// every configured threshold is `Severity::Ok`.
///
/// Rules are external configuration, loaded once at process start from a
/// TOML file and immutable for the process lifetime.

use serde::Deserialize;
use std::path::Path;

use crate::model::{PipelineError, Severity};

// ---------------------------------------------------------------------------
// Rule types
// ---------------------------------------------------------------------------

/// One configured `(ratio, severity)` pair. A ratio of 0.90 with severity
/// `Warning` means "at or above 90% of MAOP, status is WARNING".
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ThresholdRule {
    pub threshold_ratio: f64,
    pub severity: Severity,
}

/// Validated, descending-sorted threshold rules.
///
/// Construction is the only place validation happens; once a `RuleSet`
/// exists, evaluation can assume a non-empty list sorted highest-first
/// with one rule per severity.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet {
    rules: Vec<ThresholdRule>,
}

/// On-disk shape of a rules file:
///
/// ```toml
/// [[rule]]
/// threshold_ratio = 0.90
/// severity = "WARNING"
/// ```
#[derive(Debug, Deserialize)]
struct RulesFile {
    #[serde(default)]
    rule: Vec<ThresholdRule>,
}

impl RuleSet {
    /// Validates and sorts a rule list. Rejects empty sets, non-positive
    /// ratios, `Ok` rules (OK is the default, never a configured tier),
    /// and duplicate severities.
    pub fn new(mut rules: Vec<ThresholdRule>) -> Result<Self, PipelineError> {
        if rules.is_empty() {
            return Err(PipelineError::EmptyRuleSet);
        }

        let mut seen = std::collections::HashSet::new();
        for rule in &rules {
            if !rule.threshold_ratio.is_finite() || rule.threshold_ratio <= 0.0 {
                return Err(PipelineError::MalformedRule(format!(
                    "threshold_ratio must be positive, got {}",
                    rule.threshold_ratio
                )));
            }
            if rule.severity == Severity::Ok {
                return Err(PipelineError::MalformedRule(
                    "OK is the implicit below-all-thresholds status and cannot be a rule"
                        .to_string(),
                ));
            }
            if !seen.insert(rule.severity) {
                return Err(PipelineError::MalformedRule(format!(
                    "duplicate severity {}",
                    rule.severity
                )));
            }
        }

        // Highest threshold first, so evaluation can take the first match.
        rules.sort_by(|a, b| {
            b.threshold_ratio
                .partial_cmp(&a.threshold_ratio)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(RuleSet { rules })
    }

    /// Loads rules from a TOML file. See `RulesFile` for the format.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            PipelineError::MalformedRule(format!(
                "could not read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let parsed: RulesFile = toml::from_str(&text)
            .map_err(|e| PipelineError::MalformedRule(format!("TOML parse error: {}", e)))?;
        RuleSet::new(parsed.rule)
    }

    /// The regulatory defaults shipped with the service: 90% WARNING,
    /// 95% CRITICAL, 100% VIOLATION.
    pub fn builtin() -> Self {
        RuleSet::new(vec![
            ThresholdRule { threshold_ratio: 0.90, severity: Severity::Warning },
            ThresholdRule { threshold_ratio: 0.95, severity: Severity::Critical },
            ThresholdRule { threshold_ratio: 1.00, severity: Severity::Violation },
        ])
        .expect("builtin rule set is valid")
    }

    pub fn rules(&self) -> &[ThresholdRule] {
        &self.rules
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Maps a pressure/MAOP ratio to its severity tier. The boundary is
/// inclusive: a ratio exactly equal to a rule's threshold matches it.
pub fn evaluate(ratio: f64, rules: &RuleSet) -> Severity {
    for rule in &rules.rules {
        if ratio >= rule.threshold_ratio {
            return rule.severity;
        }
    }
    Severity::Ok
}

/// Evaluates a raw pressure against its MAOP. Fails before any ratio is
/// computed when the limit is zero or negative — an invalid MAOP is a
/// configuration fault, never a classification case.
pub fn evaluate_pressure(
    pressure_psig: f64,
    maop_psig: f64,
    segment_id: &str,
    rules: &RuleSet,
) -> Result<Severity, PipelineError> {
    if maop_psig <= 0.0 {
        return Err(PipelineError::InvalidMaop {
            segment_id: segment_id.to_string(),
            maop_psig,
        });
    }
    Ok(evaluate(pressure_psig / maop_psig, rules))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
