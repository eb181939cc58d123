//! Data models for diagnosis output and related structures
//!
//! Defines the records the engines produce and the HTTP layer returns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::correlations::CorrelationRule;
use crate::rules::{Check, ParameterRule};
use crate::severity::Severity;
use crate::telemetry::Parameter;

/// Whether a fault comes from one reading or from a correlation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaultKind {
    Single,
    Correlation,
}

/// A detected out-of-range or risky condition
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fault {
    /// Unique within one diagnosis
    pub id: String,

    /// Parameter key, or keys joined with `" + "` for correlations
    pub parameter: String,

    pub display_name: String,

    pub icon: String,

    /// Reading that triggered the fault (single faults only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// Label after context escalation
    pub severity: Severity,

    /// Continuous severity score after context escalation
    pub severity_level: f64,

    /// Label of the rule that fired, before escalation
    pub base_severity: Severity,

    pub color: String,

    pub title: String,

    pub description: String,

    pub fix: String,

    pub emotional_message: String,

    #[serde(rename = "type")]
    pub kind: FaultKind,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_params: Option<Vec<Parameter>>,
}

impl Fault {
    /// Fault for a single parameter check that matched `value`
    pub fn single(rule: &ParameterRule, check: &Check, value: f64, now: DateTime<Utc>) -> Self {
        Self {
            id: format!(
                "{}-{}-{}",
                rule.parameter,
                check.severity.label(),
                now.timestamp_millis()
            ),
            parameter: rule.parameter.key().to_string(),
            display_name: rule.display_name.to_string(),
            icon: rule.icon.to_string(),
            value: Some(value),
            unit: Some(rule.unit.to_string()),
            severity: check.severity,
            severity_level: f64::from(check.severity.level()),
            base_severity: check.severity,
            color: check.severity.color().to_string(),
            title: check.title.to_string(),
            description: check.description.to_string(),
            fix: check.fix.to_string(),
            emotional_message: check.emotional.to_string(),
            kind: FaultKind::Single,
            related_params: None,
        }
    }

    /// Fault for a triggered correlation rule
    pub fn correlation(rule: &CorrelationRule, now: DateTime<Utc>) -> Self {
        let keys: Vec<&str> = rule.parameters.iter().map(|p| p.key()).collect();

        Self {
            id: format!("corr-{}-{}", keys.join("-"), now.timestamp_millis()),
            parameter: keys.join(" + "),
            display_name: "Cross-Parameter Alert".to_string(),
            icon: "🔗".to_string(),
            value: None,
            unit: None,
            severity: rule.severity,
            severity_level: f64::from(rule.severity.level()),
            base_severity: rule.severity,
            color: rule.severity.color().to_string(),
            title: rule.title.to_string(),
            description: rule.description.to_string(),
            fix: rule.fix.to_string(),
            emotional_message: rule.emotional.to_string(),
            kind: FaultKind::Correlation,
            related_params: Some(rule.parameters.to_vec()),
        }
    }
}

/// Overall vehicle health band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Healthy,
    Good,
    Warning,
    Danger,
    Critical,
}

impl OverallStatus {
    pub fn emoji(self) -> &'static str {
        match self {
            OverallStatus::Healthy => "😊",
            OverallStatus::Good => "🙂",
            OverallStatus::Warning => "⚠️",
            OverallStatus::Danger => "🔶",
            OverallStatus::Critical => "🚨",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            OverallStatus::Healthy => "Your vehicle is in great shape! All parameters are within normal range. Keep up the good maintenance!",
            OverallStatus::Good => "Your vehicle is mostly fine with minor observations. Nothing urgent, but keep an eye on the noted items.",
            OverallStatus::Warning => "Some parameters need your attention. Address the warnings when possible to prevent bigger issues.",
            OverallStatus::Danger => "There are significant issues that need prompt attention. Please address the high-severity alerts soon.",
            OverallStatus::Critical => "CRITICAL issues detected! Your safety may be at risk. Please take immediate action on the red alerts.",
        }
    }
}

/// Aggregate result of one diagnosis
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisResult {
    pub timestamp: DateTime<Utc>,
    pub total_faults: usize,
    pub overall_status: OverallStatus,
    pub overall_emoji: &'static str,
    pub overall_message: &'static str,
    /// Sorted by descending severity score
    pub faults: Vec<Fault>,
    /// Number of keys in the submitted telemetry
    pub parameters_checked: usize,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub diagnoses_served: u64,
    pub last_diagnosis: Option<DateTime<Utc>>,
}
