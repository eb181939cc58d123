//! Context-aware priority adjustment
//!
//! Scales a fault's severity by situational multipliers (road type, weather,
//! time of day, driver profile, load) and re-buckets the label. Escalation
//! only: a fault never ends up below the level of the rule that fired.

use crate::models::Fault;
use crate::severity::Severity;
use crate::telemetry::{DriverProfile, DrivingContext, Load, TimeOfDay, TripType, Weather};

/// Upper bound on the combined multiplier
pub const MAX_MULTIPLIER: f64 = 2.5;

/// Suffix appended to titles escalated to critical
pub const UPGRADE_MARKER: &str = " (Upgraded due to context)";

/// Passenger count at which the vehicle counts as heavily loaded
const HEAVY_PASSENGER_COUNT: i64 = 5;

/// Combined multiplier and the reason behind each factor
#[derive(Debug, Clone, PartialEq)]
pub struct ContextFactor {
    pub multiplier: f64,
    pub reasons: Vec<String>,
}

impl ContextFactor {
    pub fn from_context(context: &DrivingContext) -> Self {
        let mut multiplier = 1.0;
        let mut reasons = Vec::new();

        if context.trip_type == Some(TripType::Highway) {
            multiplier *= 1.4;
            reasons.push("Highway speeds increase risk".to_string());
        }

        match context.weather {
            Some(weather @ (Weather::Rain | Weather::Fog)) => {
                multiplier *= 1.3;
                reasons.push(format!("Reduced visibility/traction due to {:?}", weather));
            }
            Some(Weather::Storm) => {
                multiplier *= 1.5;
                reasons.push("Extreme weather conditions".to_string());
            }
            _ => {}
        }

        if context.time_of_day == Some(TimeOfDay::Night) {
            multiplier *= 1.3;
            reasons.push("Nighttime driving limits visibility".to_string());
        }

        if context.driver_profile == Some(DriverProfile::New) {
            multiplier *= 1.2;
            reasons.push("Inexperienced driver profile".to_string());
        }

        let crowded = context.passengers.map_or(false, |n| n >= HEAVY_PASSENGER_COUNT);
        if crowded || context.load == Some(Load::Heavy) {
            multiplier *= 1.2;
            reasons.push("Heavy vehicle load impacts handling/braking".to_string());
        }

        Self {
            multiplier: f64::min(multiplier, MAX_MULTIPLIER),
            reasons,
        }
    }

    /// Note appended to a fault description, empty when nothing applied
    pub fn note(&self) -> String {
        if self.reasons.is_empty() {
            String::new()
        } else {
            format!(
                "\n\nContext Warning: Priority increased. {}.",
                self.reasons.join(", ")
            )
        }
    }
}

/// Apply the driving context to a freshly built fault.
///
/// Without a context the fault is returned untouched.
pub fn apply(mut fault: Fault, context: Option<&DrivingContext>) -> Fault {
    let Some(context) = context else {
        return fault;
    };

    let factor = ContextFactor::from_context(context);
    let base = fault.base_severity;
    let score = f64::from(base.level()) * factor.multiplier;
    let severity = Severity::from_score(score, base);

    fault.severity_level = score;
    fault.severity = severity;
    fault.color = severity.color().to_string();
    if severity == Severity::Critical && base < Severity::Critical {
        fault.title.push_str(UPGRADE_MARKER);
    }
    fault.description.push_str(&factor.note());

    fault
}
