//! Guardian alert matrix
//!
//! Multi-factor checks over a loose telemetry snapshot (readings plus a few
//! dashboard flags) and the owner's Guardian Mode limits. Produces flat
//! alert records; storing them is left to the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::telemetry::lenient;

/// Speed limit applied when Guardian Mode has none configured
pub const DEFAULT_MAX_SPEED: f64 = 120.0;

/// Alert urgency, as shown to the owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertLevel {
    Critical,
    High,
    Warning,
    Info,
}

/// Snapshot analysed by the alert matrix
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlertTelemetry {
    #[serde(deserialize_with = "lenient::optional_number")]
    pub engine_temp: Option<f64>,

    #[serde(deserialize_with = "lenient::optional_number")]
    pub speed: Option<f64>,

    #[serde(deserialize_with = "lenient::optional_number")]
    pub tire_pressure: Option<f64>,

    #[serde(deserialize_with = "lenient::optional_number")]
    pub rpm: Option<f64>,

    #[serde(deserialize_with = "lenient::optional_label")]
    pub weather: Option<String>,

    #[serde(deserialize_with = "lenient::optional_truthy")]
    pub check_engine_light: Option<bool>,

    #[serde(deserialize_with = "lenient::optional_label")]
    pub coolant_level: Option<String>,

    #[serde(deserialize_with = "lenient::optional_label")]
    pub oil_level: Option<String>,
}

/// Guardian Mode limits set by the owner
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GuardianConfig {
    #[serde(deserialize_with = "lenient::optional_number")]
    pub max_speed: Option<f64>,
}

impl GuardianConfig {
    pub fn max_speed(&self) -> f64 {
        self.max_speed.unwrap_or(DEFAULT_MAX_SPEED)
    }
}

/// Body of `POST /api/alerts/analyze`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnalyzeRequest {
    pub telemetry: Option<AlertTelemetry>,
    pub config: Option<GuardianConfig>,
}

/// One generated alert
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub severity: AlertLevel,
    pub message: String,
    pub source: &'static str,
}

/// Outcome of one analysis
#[derive(Debug, Clone, Serialize)]
pub struct AlertReport {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub alerts: Vec<Alert>,
}

/// Everything a matrix row may look at
struct Inputs<'a> {
    telemetry: &'a AlertTelemetry,
    max_speed: f64,
}

fn holds(reading: Option<f64>, test: impl Fn(f64) -> bool) -> bool {
    reading.map_or(false, test)
}

fn is_low(level: &Option<String>) -> bool {
    level.as_deref() == Some("Low")
}

/// One row of the matrix
struct AlertRule {
    severity: AlertLevel,
    source: &'static str,
    fires: fn(&Inputs<'_>) -> bool,
    /// `{max_speed}` is filled in from the Guardian limit
    message: &'static str,
}

fn overheating_at_speed(i: &Inputs<'_>) -> bool {
    holds(i.telemetry.engine_temp, |t| t >= 105.0) && holds(i.telemetry.speed, |s| s >= 120.0)
}

fn hydroplaning(i: &Inputs<'_>) -> bool {
    holds(i.telemetry.tire_pressure, |p| p <= 28.0) && i.telemetry.weather.as_deref() == Some("Rain")
}

// Only reported when the rain-specific row did not fire
fn tire_pressure_critical(i: &Inputs<'_>) -> bool {
    !hydroplaning(i) && holds(i.telemetry.tire_pressure, |p| p <= 25.0)
}

fn strained_with_check_engine(i: &Inputs<'_>) -> bool {
    i.telemetry.check_engine_light == Some(true) && holds(i.telemetry.rpm, |r| r >= 5000.0)
}

fn fluids_low(i: &Inputs<'_>) -> bool {
    is_low(&i.telemetry.coolant_level) || is_low(&i.telemetry.oil_level)
}

fn guardian_speed_breach(i: &Inputs<'_>) -> bool {
    holds(i.telemetry.speed, |s| s > i.max_speed)
}

fn warm_in_traffic(i: &Inputs<'_>) -> bool {
    holds(i.telemetry.engine_temp, |t| t > 90.0 && t < 105.0) && holds(i.telemetry.speed, |s| s < 80.0)
}

static ALERT_RULES: &[AlertRule] = &[
    AlertRule {
        severity: AlertLevel::Critical,
        source: "Engine",
        fires: overheating_at_speed,
        message: "Immediate engine failure risk. High temperature at high speed.",
    },
    AlertRule {
        severity: AlertLevel::High,
        source: "Tires",
        fires: hydroplaning,
        message: "High risk of hydroplaning. Low tire pressure detected in rainy conditions.",
    },
    AlertRule {
        severity: AlertLevel::High,
        source: "Tires",
        fires: tire_pressure_critical,
        message: "Critical tire pressure.",
    },
    AlertRule {
        severity: AlertLevel::High,
        source: "Engine",
        fires: strained_with_check_engine,
        message: "Potential transmission/engine wear. High RPM with check engine light on.",
    },
    AlertRule {
        severity: AlertLevel::Warning,
        source: "Maintenance",
        fires: fluids_low,
        message: "Check fluid levels immediately to prevent damage.",
    },
    AlertRule {
        severity: AlertLevel::High,
        source: "Geo-fence",
        fires: guardian_speed_breach,
        message: "Guardian Mode Breach: Vehicle exceeded max speed limit of {max_speed} km/h.",
    },
    AlertRule {
        severity: AlertLevel::Info,
        source: "Engine",
        fires: warm_in_traffic,
        message: "Engine running slightly warm in city traffic. Normal condition.",
    },
];

/// Run every matrix row against the snapshot, in table order
pub fn analyze_telemetry(telemetry: &AlertTelemetry, config: &GuardianConfig) -> Vec<Alert> {
    let inputs = Inputs {
        telemetry,
        max_speed: config.max_speed(),
    };

    ALERT_RULES
        .iter()
        .filter(|rule| (rule.fires)(&inputs))
        .map(|rule| {
            debug!(source = rule.source, severity = ?rule.severity, "Alert raised");
            Alert {
                severity: rule.severity,
                message: rule
                    .message
                    .replace("{max_speed}", &inputs.max_speed.to_string()),
                source: rule.source,
            }
        })
        .collect()
}

/// Analyse and wrap the alerts with a summary line
pub fn alert_report(
    telemetry: &AlertTelemetry,
    config: &GuardianConfig,
    now: DateTime<Utc>,
) -> AlertReport {
    let alerts = analyze_telemetry(telemetry, config);
    let message = if alerts.is_empty() {
        "System nominal. No alerts generated.".to_string()
    } else {
        format!("{} alerts generated.", alerts.len())
    };

    AlertReport {
        timestamp: now,
        message,
        alerts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn telemetry(value: serde_json::Value) -> AlertTelemetry {
        serde_json::from_value(value).unwrap()
    }

    fn sources(alerts: &[Alert]) -> Vec<(AlertLevel, &str)> {
        alerts.iter().map(|a| (a.severity, a.source)).collect()
    }

    #[test]
    fn test_nominal_snapshot() {
        let report = alert_report(
            &telemetry(json!({"engineTemp": 85, "speed": 60, "tirePressure": 32})),
            &GuardianConfig::default(),
            Utc::now(),
        );
        assert!(report.alerts.is_empty());
        assert_eq!(report.message, "System nominal. No alerts generated.");
    }

    #[test]
    fn test_hot_engine_at_speed_also_breaches_guardian() {
        let alerts = analyze_telemetry(
            &telemetry(json!({"engineTemp": 108, "speed": 130})),
            &GuardianConfig::default(),
        );
        assert_eq!(
            sources(&alerts),
            vec![(AlertLevel::Critical, "Engine"), (AlertLevel::High, "Geo-fence")]
        );
        assert_eq!(
            alerts[1].message,
            "Guardian Mode Breach: Vehicle exceeded max speed limit of 120 km/h."
        );
    }

    #[test]
    fn test_rain_replaces_plain_tire_alert() {
        let wet = analyze_telemetry(
            &telemetry(json!({"tirePressure": 24, "weather": "Rain"})),
            &GuardianConfig::default(),
        );
        assert_eq!(wet.len(), 1);
        assert!(wet[0].message.contains("hydroplaning"));

        let dry = analyze_telemetry(
            &telemetry(json!({"tirePressure": 24, "weather": "Clear"})),
            &GuardianConfig::default(),
        );
        assert_eq!(dry.len(), 1);
        assert_eq!(dry[0].message, "Critical tire pressure.");

        let soft = analyze_telemetry(
            &telemetry(json!({"tirePressure": 27})),
            &GuardianConfig::default(),
        );
        assert!(soft.is_empty());
    }

    #[test]
    fn test_check_engine_and_fluids() {
        let alerts = analyze_telemetry(
            &telemetry(json!({"checkEngineLight": 1, "rpm": "5200", "oilLevel": "Low"})),
            &GuardianConfig::default(),
        );
        assert_eq!(
            sources(&alerts),
            vec![(AlertLevel::High, "Engine"), (AlertLevel::Warning, "Maintenance")]
        );
    }

    #[test]
    fn test_custom_speed_limit() {
        let config: GuardianConfig = serde_json::from_value(json!({"maxSpeed": "90"})).unwrap();
        let alerts = analyze_telemetry(&telemetry(json!({"speed": 95})), &config);

        assert_eq!(alerts.len(), 1);
        assert_eq!(
            alerts[0].message,
            "Guardian Mode Breach: Vehicle exceeded max speed limit of 90 km/h."
        );
    }

    #[test]
    fn test_warm_engine_in_traffic_is_info() {
        let alerts = analyze_telemetry(
            &telemetry(json!({"engineTemp": 95, "speed": 30})),
            &GuardianConfig::default(),
        );
        assert_eq!(sources(&alerts), vec![(AlertLevel::Info, "Engine")]);

        // No speed reported, no traffic inference
        let alerts = analyze_telemetry(&telemetry(json!({"engineTemp": 95})), &GuardianConfig::default());
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_alert_level_wire_names() {
        assert_eq!(serde_json::to_value(AlertLevel::Critical).unwrap(), json!("CRITICAL"));
        assert_eq!(serde_json::to_value(AlertLevel::Info).unwrap(), json!("INFO"));
    }
}
