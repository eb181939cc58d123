//! Fault detection orchestrator
//!
//! One pass over the rule tables: single-parameter checks, then
//! correlations, each run through the priority adjuster, then a stable sort
//! by escalated score and an overall verdict.
//!
//! The detector is pure. Its only input besides telemetry and context is
//! the clock value used for fault IDs and the result timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;
use tracing::{debug, info};

use crate::correlations::{CorrelationRule, CORRELATION_RULES};
use crate::models::{DiagnosisResult, Fault, OverallStatus};
use crate::priority;
use crate::rules::{ParameterRule, PARAMETER_RULES};
use crate::telemetry::{DrivingContext, TelemetrySnapshot};

/// How the top fault's score maps onto the overall status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerdictPolicy {
    /// Bucket the escalated score into 0 / (0,2) / [2,3) / [3,4) / [4,∞)
    #[default]
    Banded,
    /// Exact comparison against 0, 1, 2 and 3; anything else, including every
    /// non-integer escalated score, reads as critical
    ExactLevel,
}

impl VerdictPolicy {
    pub fn status(self, top_score: f64) -> OverallStatus {
        match self {
            VerdictPolicy::Banded => {
                if top_score <= 0.0 {
                    OverallStatus::Healthy
                } else if top_score < 2.0 {
                    OverallStatus::Good
                } else if top_score < 3.0 {
                    OverallStatus::Warning
                } else if top_score < 4.0 {
                    OverallStatus::Danger
                } else {
                    OverallStatus::Critical
                }
            }
            VerdictPolicy::ExactLevel => {
                if top_score == 0.0 {
                    OverallStatus::Healthy
                } else if top_score == 1.0 {
                    OverallStatus::Good
                } else if top_score == 2.0 {
                    OverallStatus::Warning
                } else if top_score == 3.0 {
                    OverallStatus::Danger
                } else {
                    OverallStatus::Critical
                }
            }
        }
    }
}

impl FromStr for VerdictPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "banded" => Ok(VerdictPolicy::Banded),
            "exact-level" | "exact_level" | "legacy" => Ok(VerdictPolicy::ExactLevel),
            other => Err(format!("unknown verdict policy: {}", other)),
        }
    }
}

/// Rule-based fault detector over the static rule tables
#[derive(Debug, Clone, Copy)]
pub struct FaultDetector {
    parameter_rules: &'static [ParameterRule],
    correlation_rules: &'static [CorrelationRule],
    policy: VerdictPolicy,
}

impl Default for FaultDetector {
    fn default() -> Self {
        Self::new(VerdictPolicy::default())
    }
}

impl FaultDetector {
    pub fn new(policy: VerdictPolicy) -> Self {
        Self {
            parameter_rules: PARAMETER_RULES,
            correlation_rules: CORRELATION_RULES,
            policy,
        }
    }

    pub fn policy(&self) -> VerdictPolicy {
        self.policy
    }

    /// Diagnose using the wall clock
    pub fn detect(
        &self,
        telemetry: &TelemetrySnapshot,
        context: Option<&DrivingContext>,
    ) -> DiagnosisResult {
        self.detect_at(telemetry, context, Utc::now())
    }

    /// Diagnose with an explicit clock value
    pub fn detect_at(
        &self,
        telemetry: &TelemetrySnapshot,
        context: Option<&DrivingContext>,
        now: DateTime<Utc>,
    ) -> DiagnosisResult {
        let mut faults = self.single_faults(telemetry, context, now);
        faults.extend(self.correlation_faults(telemetry, context, now));

        // Stable: equal scores keep insertion order
        faults.sort_by(|a, b| {
            b.severity_level
                .partial_cmp(&a.severity_level)
                .unwrap_or(Ordering::Equal)
        });

        let top_score = faults.first().map_or(0.0, |f| f.severity_level);
        let overall_status = self.policy.status(top_score);

        info!(
            total_faults = faults.len(),
            top_score,
            overall_status = ?overall_status,
            policy = ?self.policy,
            "Diagnosis completed"
        );

        DiagnosisResult {
            timestamp: now,
            total_faults: faults.len(),
            overall_status,
            overall_emoji: overall_status.emoji(),
            overall_message: overall_status.message(),
            faults,
            parameters_checked: telemetry.len(),
        }
    }

    fn single_faults(
        &self,
        telemetry: &TelemetrySnapshot,
        context: Option<&DrivingContext>,
        now: DateTime<Utc>,
    ) -> Vec<Fault> {
        self.parameter_rules
            .iter()
            .filter_map(|rule| {
                let value = telemetry.reading(rule.parameter)?;
                let check = rule.first_match(value)?;

                debug!(
                    parameter = %rule.parameter,
                    value,
                    severity = check.severity.label(),
                    "Parameter check matched"
                );

                Some(priority::apply(Fault::single(rule, check, value, now), context))
            })
            .collect()
    }

    fn correlation_faults(
        &self,
        telemetry: &TelemetrySnapshot,
        context: Option<&DrivingContext>,
        now: DateTime<Utc>,
    ) -> Vec<Fault> {
        let readings = telemetry.numeric();

        self.correlation_rules
            .iter()
            .filter(|rule| context.is_some() || !rule.requires_context())
            .filter(|rule| rule.triggered(&readings, context))
            .map(|rule| {
                debug!(
                    title = rule.title,
                    severity = rule.severity.label(),
                    "Correlation triggered"
                );
                priority::apply(Fault::correlation(rule, now), context)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FaultKind;
    use crate::severity::Severity;
    use crate::telemetry::{TripType, Weather};
    use chrono::TimeZone;
    use serde_json::Value;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()
    }

    fn detect(telemetry: &TelemetrySnapshot, context: Option<&DrivingContext>) -> DiagnosisResult {
        FaultDetector::default().detect_at(telemetry, context, now())
    }

    fn assert_sorted(result: &DiagnosisResult) {
        assert_eq!(result.total_faults, result.faults.len());
        for pair in result.faults.windows(2) {
            assert!(pair[0].severity_level >= pair[1].severity_level);
        }
    }

    #[test]
    fn test_engine_overheating() {
        let result = detect(&TelemetrySnapshot::new().with("engineTemp", 130), None);

        assert_eq!(result.total_faults, 1);
        assert_eq!(result.faults[0].severity, Severity::Critical);
        assert!(result.faults[0].title.contains("Engine Overheating"));
        assert_eq!(result.overall_status, OverallStatus::Critical);
        assert_eq!(result.parameters_checked, 1);
    }

    #[test]
    fn test_hot_engine_with_low_oil() {
        let telemetry = TelemetrySnapshot::new()
            .with("engineTemp", 110)
            .with("oilPressure", 20);
        let result = detect(&telemetry, Some(&DrivingContext::default()));

        let singles = result.faults.iter().filter(|f| f.kind == FaultKind::Single).count();
        let compound: Vec<&Fault> = result
            .faults
            .iter()
            .filter(|f| f.kind == FaultKind::Correlation)
            .collect();

        assert_eq!(singles, 2);
        assert_eq!(compound.len(), 1);
        assert!(compound[0].title.contains("Compound Risk: High Temp + Low Oil"));
        assert_eq!(compound[0].severity, Severity::Critical);
        // Critical correlation sorts ahead of both high single faults
        assert_eq!(result.faults[0].kind, FaultKind::Correlation);
        assert_sorted(&result);
    }

    #[test]
    fn test_empty_telemetry_is_healthy() {
        let result = detect(&TelemetrySnapshot::new(), None);

        assert_eq!(result.total_faults, 0);
        assert_eq!(result.overall_status, OverallStatus::Healthy);
        assert_eq!(result.overall_emoji, "😊");
        assert_eq!(result.parameters_checked, 0);
    }

    #[test]
    fn test_high_speed_worn_brakes() {
        let telemetry = TelemetrySnapshot::new()
            .with("speed", 130)
            .with("brakeThickness", 3);
        let result = detect(&telemetry, Some(&DrivingContext::default()));

        let compound = result
            .faults
            .iter()
            .find(|f| f.title.contains("High Speed + Worn Brakes"))
            .expect("correlation fault");
        assert_eq!(compound.severity, Severity::Critical);
        assert_eq!(compound.parameter, "speed + brakeThickness");
        assert_sorted(&result);
    }

    #[test]
    fn test_context_escalation_scenario() {
        let context = DrivingContext {
            trip_type: Some(TripType::Highway),
            weather: Some(Weather::Storm),
            ..Default::default()
        };
        let result = detect(&TelemetrySnapshot::new().with("engineTemp", 110), Some(&context));

        assert_eq!(result.total_faults, 1);
        let fault = &result.faults[0];
        assert_eq!(fault.base_severity, Severity::High);
        assert_eq!(fault.severity, Severity::Critical);
        assert!((fault.severity_level - 6.3).abs() < 1e-9);
        assert!(fault.title.contains("(Upgraded due to context)"));
        assert!(fault.description.contains("Highway speeds increase risk"));
        assert!(fault.description.contains("Extreme weather conditions"));
    }

    #[test]
    fn test_rough_idle() {
        let result = detect(&TelemetrySnapshot::new().with("rpm", 500), None);

        assert_eq!(result.total_faults, 1);
        assert_eq!(result.faults[0].title, "RPM Too Low — Rough Idle");
        assert_eq!(result.faults[0].severity, Severity::Medium);
        assert_eq!(result.overall_status, OverallStatus::Warning);
    }

    #[test]
    fn test_at_most_one_fault_per_parameter() {
        let telemetry = TelemetrySnapshot::new()
            .with("tirePressure", 20)
            .with("batteryVoltage", 11.0)
            .with("fuelLevel", 5)
            .with("brakeThickness", 1);
        let result = detect(&telemetry, None);

        for key in ["tirePressure", "batteryVoltage", "fuelLevel", "brakeThickness"] {
            let count = result.faults.iter().filter(|f| f.parameter == key).count();
            assert_eq!(count, 1, "{} should fire once", key);
        }
    }

    #[test]
    fn test_invalid_values_are_skipped_but_counted() {
        let telemetry = TelemetrySnapshot::new()
            .with("engineTemp", "")
            .with("rpm", "idle")
            .with("speed", Value::Null)
            .with("odometer", 120000);
        let result = detect(&telemetry, None);

        assert_eq!(result.total_faults, 0);
        assert_eq!(result.overall_status, OverallStatus::Healthy);
        assert_eq!(result.parameters_checked, 4);
    }

    #[test]
    fn test_numeric_strings_are_parsed() {
        let result = detect(&TelemetrySnapshot::new().with("oilPressure", "12 psi"), None);
        assert_eq!(result.total_faults, 1);
        assert_eq!(result.faults[0].value, Some(12.0));
        assert_eq!(result.faults[0].title, "Oil Pressure Critically Low!");
    }

    #[test]
    fn test_equal_scores_keep_insertion_order() {
        let telemetry = TelemetrySnapshot::new()
            .with("engineTemp", 130)
            .with("fuelLevel", 5)
            .with("brakeThickness", 1);
        let result = detect(&telemetry, None);

        let order: Vec<&str> = result.faults.iter().map(|f| f.parameter.as_str()).collect();
        assert_eq!(order, vec!["engineTemp", "fuelLevel", "brakeThickness"]);
    }

    #[test]
    fn test_ids_are_unique_within_result() {
        let telemetry = TelemetrySnapshot::new()
            .with("engineTemp", 110)
            .with("oilPressure", 20)
            .with("speed", 130)
            .with("rpm", 4500)
            .with("fuelLevel", 15)
            .with("brakeThickness", 3);
        let result = detect(&telemetry, None);

        let mut ids: Vec<&str> = result.faults.iter().map(|f| f.id.as_str()).collect();
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total);
        assert_sorted(&result);
    }

    #[test]
    fn test_banded_policy_buckets_escalated_scores() {
        let policy = VerdictPolicy::Banded;
        assert_eq!(policy.status(0.0), OverallStatus::Healthy);
        assert_eq!(policy.status(1.3), OverallStatus::Good);
        assert_eq!(policy.status(2.6), OverallStatus::Warning);
        assert_eq!(policy.status(3.12), OverallStatus::Danger);
        assert_eq!(policy.status(6.3), OverallStatus::Critical);
    }

    #[test]
    fn test_exact_level_policy_collapses_fractional_scores() {
        let policy = VerdictPolicy::ExactLevel;
        assert_eq!(policy.status(0.0), OverallStatus::Healthy);
        assert_eq!(policy.status(1.0), OverallStatus::Good);
        assert_eq!(policy.status(2.0), OverallStatus::Warning);
        assert_eq!(policy.status(3.0), OverallStatus::Danger);
        assert_eq!(policy.status(1.3), OverallStatus::Critical);
        assert_eq!(policy.status(2.6), OverallStatus::Critical);
    }

    #[test]
    fn test_policies_diverge_on_escalated_low_fault() {
        let telemetry = TelemetrySnapshot::new().with("tirePressure", 37);
        let context = DrivingContext {
            weather: Some(Weather::Rain),
            ..Default::default()
        };

        let banded = FaultDetector::new(VerdictPolicy::Banded).detect_at(&telemetry, Some(&context), now());
        let exact = FaultDetector::new(VerdictPolicy::ExactLevel).detect_at(&telemetry, Some(&context), now());

        assert_eq!(banded.overall_status, OverallStatus::Good);
        assert_eq!(exact.overall_status, OverallStatus::Critical);
        assert_eq!(banded.faults[0].severity, exact.faults[0].severity);
    }

    #[test]
    fn test_policies_agree_without_escalation() {
        let telemetry = TelemetrySnapshot::new().with("speed", 130);
        for policy in [VerdictPolicy::Banded, VerdictPolicy::ExactLevel] {
            let result = FaultDetector::new(policy).detect_at(&telemetry, None, now());
            assert_eq!(result.overall_status, OverallStatus::Warning);
        }
    }

    #[test]
    fn test_verdict_policy_from_str() {
        assert_eq!("banded".parse::<VerdictPolicy>(), Ok(VerdictPolicy::Banded));
        assert_eq!("EXACT-LEVEL".parse::<VerdictPolicy>(), Ok(VerdictPolicy::ExactLevel));
        assert_eq!("legacy".parse::<VerdictPolicy>(), Ok(VerdictPolicy::ExactLevel));
        assert!("strict".parse::<VerdictPolicy>().is_err());
    }

    #[test]
    fn test_infinite_reading_only_feeds_correlations() {
        let telemetry = TelemetrySnapshot::new()
            .with("speed", "Infinity")
            .with("brakeThickness", 3);
        let result = detect(&telemetry, None);

        assert!(result.faults.iter().all(|f| f.parameter != "speed"));
        let kinds: Vec<(FaultKind, &str)> = result
            .faults
            .iter()
            .map(|f| (f.kind, f.parameter.as_str()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (FaultKind::Correlation, "speed + brakeThickness"),
                (FaultKind::Single, "brakeThickness"),
            ]
        );
    }

    #[test]
    fn test_gear_must_be_exactly_first() {
        let telemetry = TelemetrySnapshot::new().with("speed", 45);
        let gear_fault = |raw: Value| {
            let context: DrivingContext =
                serde_json::from_value(serde_json::json!({ "gear": raw })).unwrap();
            detect(&telemetry, Some(&context))
                .faults
                .iter()
                .any(|f| f.title.contains("Over-revving for Gear"))
        };

        assert!(gear_fault(Value::from(1)));
        assert!(!gear_fault(Value::from("1")));
        assert!(!gear_fault(Value::from(1.5)));
        assert!(!gear_fault(Value::from(1.7)));
    }

    #[test]
    fn test_result_timestamp_uses_injected_clock() {
        let result = detect(&TelemetrySnapshot::new().with("speed", 170), None);
        assert_eq!(result.timestamp, now());
        assert!(result.faults[0].id.ends_with("-1700000000000"));
    }
}
