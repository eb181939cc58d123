//! Per-parameter fault rules
//!
//! Each parameter owns an ordered list of threshold checks. Order matters:
//! only the first matching check fires, so the narrower, more severe band
//! is always declared before the broader one.

use serde::{Serialize, Serializer};
use std::fmt;

use crate::severity::Severity;
use crate::telemetry::Parameter;

/// Declarative threshold predicate over a single reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    /// `v > limit`
    Above(f64),
    /// `v < limit`
    Below(f64),
    /// `low < v < high`
    Between(f64, f64),
    /// `v == target`
    Equals(f64),
}

impl Threshold {
    /// NaN never matches.
    pub fn matches(self, value: f64) -> bool {
        match self {
            Threshold::Above(limit) => value > limit,
            Threshold::Below(limit) => value < limit,
            Threshold::Between(low, high) => value > low && value < high,
            Threshold::Equals(target) => value == target,
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Threshold::Above(limit) => write!(f, "> {}", limit),
            Threshold::Below(limit) => write!(f, "< {}", limit),
            Threshold::Between(low, high) => write!(f, "{} < v < {}", low, high),
            Threshold::Equals(target) => write!(f, "= {}", target),
        }
    }
}

impl Serialize for Threshold {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One threshold band with its advisory text
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Check {
    pub threshold: Threshold,
    pub severity: Severity,
    pub title: &'static str,
    pub description: &'static str,
    pub fix: &'static str,
    pub emotional: &'static str,
}

/// All checks for one telemetry parameter
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterRule {
    pub parameter: Parameter,
    pub unit: &'static str,
    pub display_name: &'static str,
    pub icon: &'static str,
    pub checks: &'static [Check],
}

impl ParameterRule {
    /// First check whose threshold holds for `value`
    pub fn first_match(&self, value: f64) -> Option<&'static Check> {
        self.checks.iter().find(|c| c.threshold.matches(value))
    }
}

/// Rule lookup by parameter
#[cfg(test)]
pub fn rule_for(parameter: Parameter) -> Option<&'static ParameterRule> {
    PARAMETER_RULES.iter().find(|r| r.parameter == parameter)
}

/// Rule table in evaluation order
pub static PARAMETER_RULES: &[ParameterRule] = &[
    ParameterRule {
        parameter: Parameter::EngineTemp,
        unit: "°C",
        display_name: "Engine Temperature",
        icon: "🌡️",
        checks: &[
            Check {
                threshold: Threshold::Above(120.0),
                severity: Severity::Critical,
                title: "Engine Overheating — Critical!",
                description: "Engine temperature has exceeded 120°C. Immediate shutdown risk.",
                fix: "Pull over safely and turn off the engine immediately. Do NOT open the radiator cap. Call roadside assistance.",
                emotional: "🚨 This is serious — please stop driving right now. Your safety comes first.",
            },
            Check {
                threshold: Threshold::Above(105.0),
                severity: Severity::High,
                title: "Engine Running Hot",
                description: "Engine temperature is between 105–120°C, above normal operating range.",
                fix: "Turn off the A/C, turn on the heater to dissipate heat, and drive to the nearest service station.",
                emotional: "⚠️ Don't panic — reduce load on your engine and get checked soon.",
            },
            Check {
                threshold: Threshold::Between(0.0, 70.0),
                severity: Severity::Low,
                title: "Engine Not Warmed Up",
                description: "Engine temperature is below 70°C. May be normal during cold starts.",
                fix: "Let the engine warm up for a few minutes before driving aggressively.",
                emotional: "💡 Give your car a moment to wake up — just like us on cold mornings.",
            },
        ],
    },
    ParameterRule {
        parameter: Parameter::Rpm,
        unit: "RPM",
        display_name: "Engine RPM",
        icon: "⚙️",
        checks: &[
            Check {
                threshold: Threshold::Above(7000.0),
                severity: Severity::Critical,
                title: "RPM Dangerously High — Redline!",
                description: "Engine RPM has exceeded 7000. Risk of engine damage or failure.",
                fix: "Ease off the accelerator immediately. Shift to a higher gear if manual. If persistent, pull over.",
                emotional: "🚨 Your engine is screaming — please let it breathe. Slow down now.",
            },
            Check {
                threshold: Threshold::Above(6000.0),
                severity: Severity::High,
                title: "RPM Above Normal Range",
                description: "Engine RPM is between 6000–7000. Sustained high RPM causes wear.",
                fix: "Reduce speed, shift up, or ease off the throttle. Avoid sustained high-RPM driving.",
                emotional: "⚠️ Your engine is working hard — give it a break before it overheats.",
            },
            Check {
                threshold: Threshold::Between(0.0, 600.0),
                severity: Severity::Medium,
                title: "RPM Too Low — Rough Idle",
                description: "Engine RPM is below 600. May indicate idle issues or stalling risk.",
                fix: "Check for vacuum leaks, dirty throttle body, or failing idle air control valve.",
                emotional: "🔧 Your car seems a bit sluggish — a quick tune-up should help.",
            },
        ],
    },
    ParameterRule {
        parameter: Parameter::OilPressure,
        unit: "psi",
        display_name: "Oil Pressure",
        icon: "🛢️",
        checks: &[
            Check {
                threshold: Threshold::Below(15.0),
                severity: Severity::Critical,
                title: "Oil Pressure Critically Low!",
                description: "Oil pressure is below 15 psi. Engine seizure risk is imminent.",
                fix: "Stop driving immediately! Check oil level and top up if low. Do not restart until pressure is restored.",
                emotional: "🚨 This is an emergency — your engine needs oil NOW. Please pull over safely.",
            },
            Check {
                threshold: Threshold::Below(25.0),
                severity: Severity::High,
                title: "Oil Pressure Below Normal",
                description: "Oil pressure is between 15–25 psi, below the safe operating range.",
                fix: "Check oil level with the dipstick. Look for leaks under the car. Visit a mechanic soon.",
                emotional: "⚠️ Your engine's lifeblood is running low — don't ignore this one.",
            },
            Check {
                threshold: Threshold::Above(65.0),
                severity: Severity::Medium,
                title: "Oil Pressure Too High",
                description: "Oil pressure exceeds 65 psi. May indicate a blocked oil passage.",
                fix: "Check oil viscosity and pressure relief valve. Have a mechanic inspect.",
                emotional: "🔧 Unusual reading — worth getting checked to prevent future issues.",
            },
        ],
    },
    ParameterRule {
        parameter: Parameter::TirePressure,
        unit: "psi",
        display_name: "Tire Pressure",
        icon: "🛞",
        checks: &[
            Check {
                threshold: Threshold::Below(25.0),
                severity: Severity::Critical,
                title: "Tire Pressure Dangerously Low!",
                description: "Tire pressure is below 25 psi. Blowout risk is very high.",
                fix: "Do not drive at high speed. Inflate tires at the nearest gas station or use a spare.",
                emotional: "🚨 Your tires are in danger — please slow down and get air immediately.",
            },
            Check {
                threshold: Threshold::Above(40.0),
                severity: Severity::Critical,
                title: "Tire Pressure Dangerously High!",
                description: "Tire pressure exceeds 40 psi. Risk of blowout, especially on hot roads.",
                fix: "Release air to bring pressure to 30-35 psi. Check when tires are cold for accurate reading.",
                emotional: "🚨 Over-inflated tires are a hidden danger — please release some air now.",
            },
            Check {
                threshold: Threshold::Below(30.0),
                severity: Severity::Medium,
                title: "Tire Pressure Low",
                description: "Tire pressure is between 25–30 psi. Reduces fuel efficiency and handling.",
                fix: "Inflate tires to the manufacturer-recommended pressure (usually 30-35 psi).",
                emotional: "💡 A small top-up will improve your ride and save fuel money.",
            },
            Check {
                threshold: Threshold::Above(35.0),
                severity: Severity::Low,
                title: "Tire Pressure Slightly High",
                description: "Tire pressure is between 35–40 psi. Slightly above optimal.",
                fix: "Release a small amount of air. Recheck pressure when tires are cold.",
                emotional: "💡 Just a tiny adjustment needed — no stress.",
            },
        ],
    },
    ParameterRule {
        parameter: Parameter::BatteryVoltage,
        unit: "V",
        display_name: "Battery Voltage",
        icon: "🔋",
        checks: &[
            Check {
                threshold: Threshold::Below(11.8),
                severity: Severity::Critical,
                title: "Battery Voltage Critical — May Not Start!",
                description: "Battery voltage is below 11.8V. Car may not start or may stall.",
                fix: "Jump-start the vehicle or replace the battery. Check the alternator for charging issues.",
                emotional: "🚨 Your car's heart is fading — get a new battery before you're stranded.",
            },
            Check {
                threshold: Threshold::Below(12.4),
                severity: Severity::High,
                title: "Battery Voltage Low",
                description: "Battery voltage is between 11.8–12.4V. Battery is not fully charged.",
                fix: "Drive for 20+ minutes to let the alternator recharge. If it persists, test the battery.",
                emotional: "⚠️ Your battery needs a good charge — a short drive should help.",
            },
            Check {
                threshold: Threshold::Above(14.7),
                severity: Severity::High,
                title: "Battery Overcharging",
                description: "Battery voltage exceeds 14.7V. Alternator may be overcharging.",
                fix: "Have the voltage regulator and alternator checked immediately.",
                emotional: "⚠️ Too much power can be just as bad — get your alternator checked.",
            },
        ],
    },
    ParameterRule {
        parameter: Parameter::Speed,
        unit: "km/h",
        display_name: "Vehicle Speed",
        icon: "🏎️",
        checks: &[
            Check {
                threshold: Threshold::Above(160.0),
                severity: Severity::Critical,
                title: "Speed Dangerously High!",
                description: "Vehicle speed exceeds 160 km/h. Extreme accident risk.",
                fix: "Gradually reduce speed. Do NOT brake suddenly at high speed. Move to the slow lane.",
                emotional: "🚨 Please slow down — no destination is worth risking your life.",
            },
            Check {
                threshold: Threshold::Above(120.0),
                severity: Severity::Medium,
                title: "Speed Above Safe Limit",
                description: "Vehicle speed is between 120–160 km/h. Increased risk and fuel consumption.",
                fix: "Reduce speed to below 120 km/h for safer driving and better fuel economy.",
                emotional: "⚠️ Ease off a bit — you'll still get there on time, and much safer.",
            },
        ],
    },
    ParameterRule {
        parameter: Parameter::FuelLevel,
        unit: "%",
        display_name: "Fuel Level",
        icon: "⛽",
        checks: &[
            Check {
                threshold: Threshold::Below(10.0),
                severity: Severity::Critical,
                title: "Fuel Almost Empty!",
                description: "Fuel level is below 10%. Risk of running out and getting stranded.",
                fix: "Find the nearest fuel station immediately. Avoid highways where stations are far apart.",
                emotional: "🚨 You're running on fumes — please refuel NOW before it's too late.",
            },
            Check {
                threshold: Threshold::Below(20.0),
                severity: Severity::Medium,
                title: "Fuel Level Low",
                description: "Fuel level is between 10–20%. Time to plan a refueling stop.",
                fix: "Head to the nearest fuel station. Running on low fuel can damage the fuel pump.",
                emotional: "💡 Time for a pit stop — your car (and wallet) will thank you.",
            },
        ],
    },
    ParameterRule {
        parameter: Parameter::BrakeThickness,
        unit: "mm",
        display_name: "Brake Pad Thickness",
        icon: "🛑",
        checks: &[
            Check {
                threshold: Threshold::Below(2.0),
                severity: Severity::Critical,
                title: "Brake Pads Extremely Worn!",
                description: "Brake pad thickness is below 2mm. Braking power severely compromised.",
                fix: "Replace brake pads immediately. Avoid high-speed driving until replaced.",
                emotional: "🚨 Your brakes are almost gone — this is life-threatening. Get them replaced TODAY.",
            },
            Check {
                threshold: Threshold::Below(4.0),
                severity: Severity::High,
                title: "Brake Pads Wearing Thin",
                description: "Brake pad thickness is between 2–4mm. Replacement needed soon.",
                fix: "Schedule brake pad replacement within the next 1-2 weeks.",
                emotional: "⚠️ Your brakes have served you well — time to give them a refresh.",
            },
        ],
    },
];
