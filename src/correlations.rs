//! Cross-parameter correlation rules
//!
//! A correlation fires when every one of its conditions holds at once.
//! Conditions over the driving context read as false when the context (or
//! the field they need) was not supplied, so evaluation is total.

use serde::{Serialize, Serializer};
use std::fmt;

use crate::rules::Threshold;
use crate::severity::Severity;
use crate::telemetry::{DrivingContext, Parameter, Readings};

/// A single term of a correlation conjunction
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Condition {
    /// Numeric reading satisfies a threshold
    Reading(Parameter, Threshold),
    /// Air conditioning is switched on
    AcOn,
    /// Transmission is in the given gear
    Gear(i64),
}

impl Condition {
    pub fn holds(self, readings: &Readings, context: Option<&DrivingContext>) -> bool {
        match self {
            Condition::Reading(parameter, threshold) => threshold.matches(readings.get(parameter)),
            Condition::AcOn => context.and_then(|c| c.ac_on).unwrap_or(false),
            Condition::Gear(gear) => context.and_then(|c| c.gear) == Some(gear),
        }
    }

    /// Whether this condition reads the driving context
    pub fn needs_context(self) -> bool {
        !matches!(self, Condition::Reading(..))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Reading(parameter, threshold) => write!(f, "{} {}", parameter, threshold),
            Condition::AcOn => f.write_str("context.acOn"),
            Condition::Gear(gear) => write!(f, "context.gear = {}", gear),
        }
    }
}

impl Serialize for Condition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A compound risk spanning several parameters
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationRule {
    pub conditions: &'static [Condition],
    pub severity: Severity,
    pub title: &'static str,
    pub description: &'static str,
    pub fix: &'static str,
    pub emotional: &'static str,
    pub parameters: &'static [Parameter],
}

impl CorrelationRule {
    pub fn triggered(&self, readings: &Readings, context: Option<&DrivingContext>) -> bool {
        self.conditions.iter().all(|c| c.holds(readings, context))
    }

    pub fn requires_context(&self) -> bool {
        self.conditions.iter().any(|c| c.needs_context())
    }
}

use Condition::Reading;
use Parameter::*;
use Threshold::{Above, Below, Equals};

/// Correlation table in evaluation order
pub static CORRELATION_RULES: &[CorrelationRule] = &[
    CorrelationRule {
        conditions: &[Reading(EngineTemp, Above(105.0)), Reading(OilPressure, Below(25.0))],
        severity: Severity::Critical,
        title: "🔥 Compound Risk: High Temp + Low Oil",
        description: "Engine running hot with low oil pressure. Extremely high risk of engine seizure.",
        fix: "Stop immediately! This combination can destroy your engine within minutes. Call a tow truck.",
        emotional: "🚨 Two danger signs together — please take this very seriously and stop NOW.",
        parameters: &[EngineTemp, OilPressure],
    },
    CorrelationRule {
        conditions: &[Reading(Speed, Above(120.0)), Reading(BrakeThickness, Below(4.0))],
        severity: Severity::Critical,
        title: "💀 Compound Risk: High Speed + Worn Brakes",
        description: "Driving at high speed with thin brake pads. Extremely dangerous stopping conditions.",
        fix: "Reduce speed immediately. Maintain extra following distance. Get brakes replaced ASAP.",
        emotional: "🚨 Speed and bad brakes are a deadly combination — slow down right now.",
        parameters: &[Speed, BrakeThickness],
    },
    CorrelationRule {
        conditions: &[Reading(EngineTemp, Above(105.0)), Reading(Speed, Above(120.0))],
        severity: Severity::High,
        title: "⚠️ Compound Risk: Hot Engine + High Speed",
        description: "High engine temperature at high speed increases breakdown risk.",
        fix: "Slow down to reduce engine load. Turn off A/C and open windows.",
        emotional: "⚠️ Your engine is stressed and you're pushing it — ease off the gas.",
        parameters: &[EngineTemp, Speed],
    },
    CorrelationRule {
        conditions: &[Reading(BatteryVoltage, Below(12.4)), Reading(Rpm, Below(600.0))],
        severity: Severity::High,
        title: "⚠️ Compound Risk: Low Battery + Rough Idle",
        description: "Low battery voltage combined with low RPM may indicate alternator failure.",
        fix: "Have the alternator tested. The battery may not be getting recharged while driving.",
        emotional: "⚠️ Your car's electrical system needs attention — don't risk a breakdown.",
        parameters: &[BatteryVoltage, Rpm],
    },
    CorrelationRule {
        conditions: &[Reading(FuelLevel, Below(20.0)), Reading(Speed, Above(120.0))],
        severity: Severity::High,
        title: "⚠️ Compound Risk: Low Fuel + High Speed",
        description: "Low fuel at high speed makes reaching a station risky. High speed burns fuel faster.",
        fix: "Reduce speed to improve fuel economy. Locate the nearest fuel station immediately.",
        emotional: "⚠️ Slow down to stretch your fuel — you don't want to be stranded at high speed.",
        parameters: &[FuelLevel, Speed],
    },
    CorrelationRule {
        conditions: &[Reading(Speed, Equals(80.0)), Reading(Rpm, Below(1500.0))],
        severity: Severity::High,
        title: "⚠️ Compound Risk: RPM & Speed Mismatch",
        description: "Speed is 80 km/h but RPM is unusually low (<1500). Possible clutch slipping or transmission gear engagement issue.",
        fix: "Avoid rapid acceleration. Have your transmission and clutch inspected by a professional.",
        emotional: "⚠️ Your gears might be slipping. Go easy on the pedal until you get it checked.",
        parameters: &[Speed, Rpm],
    },
    CorrelationRule {
        conditions: &[Reading(Rpm, Above(4000.0)), Reading(EngineTemp, Above(100.0))],
        severity: Severity::Critical,
        title: "🔥 CRITICAL: Engine Under Extreme Stress",
        description: "High RPM combined with High Engine Temperature. This condition rapidly degrades engine components and risks catastrophic failure.",
        fix: "PULL OVER IMMEDIATELY. Let the engine idle to cool down. Do not turn it off immediately if boiling over, let the fans run.",
        emotional: "🚨 Your engine is screaming and burning up! STOP NOW before permanent damage occurs.",
        parameters: &[Rpm, EngineTemp],
    },
    CorrelationRule {
        conditions: &[
            Reading(BatteryVoltage, Below(12.4)),
            Reading(Speed, Below(20.0)),
            Condition::AcOn,
        ],
        severity: Severity::High,
        title: "⚡ Compound Risk: Electrical Stress at Low Speed",
        description: "Low battery voltage while AC is on at low speed. Alternator may not be charging sufficiently under high load at idle.",
        fix: "Turn off AC and other non-essential electronics until you reach higher speeds or get the alternator tested.",
        emotional: "⚠️ Your car is struggling to power the AC right now. Give the alternator a break by turning it off.",
        parameters: &[BatteryVoltage, Speed],
    },
    CorrelationRule {
        conditions: &[Condition::Gear(1), Reading(Speed, Above(30.0))],
        severity: Severity::High,
        title: "⚙️ Compound Risk: Engine Over-revving for Gear",
        description: "Driving over 30 km/h in 1st gear places massive stress on the engine and transmission.",
        fix: "Shift to a higher gear immediately to reduce engine stress and save fuel.",
        emotional: "⚠️ You're holding 1st gear way too long! Please upshift to let the engine breathe.",
        parameters: &[Speed],
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::TelemetrySnapshot;

    fn triggered_titles(snapshot: &TelemetrySnapshot, context: Option<&DrivingContext>) -> Vec<&'static str> {
        let readings = snapshot.numeric();
        CORRELATION_RULES
            .iter()
            .filter(|r| r.triggered(&readings, context))
            .map(|r| r.title)
            .collect()
    }

    #[test]
    fn test_high_temp_low_oil() {
        let snapshot = TelemetrySnapshot::new()
            .with("engineTemp", 110)
            .with("oilPressure", 20);
        assert_eq!(
            triggered_titles(&snapshot, None),
            vec!["🔥 Compound Risk: High Temp + Low Oil"]
        );
    }

    #[test]
    fn test_missing_parameter_never_triggers() {
        let snapshot = TelemetrySnapshot::new().with("engineTemp", 130);
        assert!(triggered_titles(&snapshot, None).is_empty());
    }

    #[test]
    fn test_speed_rpm_mismatch_requires_exact_speed() {
        let at_80 = TelemetrySnapshot::new().with("speed", 80).with("rpm", 1200);
        let at_81 = TelemetrySnapshot::new().with("speed", 81).with("rpm", 1200);

        assert_eq!(
            triggered_titles(&at_80, None),
            vec!["⚠️ Compound Risk: RPM & Speed Mismatch"]
        );
        assert!(triggered_titles(&at_81, None).is_empty());
    }

    #[test]
    fn test_context_rules_are_inert_without_context() {
        let snapshot = TelemetrySnapshot::new()
            .with("batteryVoltage", 12.0)
            .with("speed", 40);
        assert!(triggered_titles(&snapshot, None).is_empty());
        assert!(triggered_titles(&snapshot, Some(&DrivingContext::default())).is_empty());
    }

    #[test]
    fn test_gear_rule_with_context() {
        let snapshot = TelemetrySnapshot::new().with("speed", 45);
        let context = DrivingContext {
            gear: Some(1),
            ..Default::default()
        };
        assert_eq!(
            triggered_titles(&snapshot, Some(&context)),
            vec!["⚙️ Compound Risk: Engine Over-revving for Gear"]
        );
    }

    #[test]
    fn test_electrical_stress_with_ac() {
        let snapshot = TelemetrySnapshot::new()
            .with("batteryVoltage", 12.1)
            .with("speed", 10);
        let context = DrivingContext {
            ac_on: Some(true),
            ..Default::default()
        };
        assert_eq!(
            triggered_titles(&snapshot, Some(&context)),
            vec!["⚡ Compound Risk: Electrical Stress at Low Speed"]
        );
    }

    #[test]
    fn test_requires_context_flag() {
        let flagged: Vec<bool> = CORRELATION_RULES.iter().map(|r| r.requires_context()).collect();
        assert_eq!(flagged.iter().filter(|f| **f).count(), 2);
        assert!(flagged[7] && flagged[8]);
    }
}
