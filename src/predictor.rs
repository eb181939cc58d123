//! Predictive maintenance engine
//!
//! Linear estimates of the distance (and time) left before each routine
//! maintenance item is due, nudged by the current telemetry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::telemetry::{Parameter, Readings, TelemetrySnapshot};

/// Average distance driven per day, used to turn km into days
const KM_PER_DAY: f64 = 40.0;

/// Service history supplied with a prediction request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceHistory {
    pub last_service_mileage: Option<f64>,
    pub last_rotation_mileage: Option<f64>,
}

/// How soon an item needs attention
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Immediate,
    Soon,
    Upcoming,
    Scheduled,
}

impl Urgency {
    pub fn from_km(km_remaining: u64) -> Self {
        match km_remaining {
            0..=499 => Urgency::Immediate,
            500..=1500 => Urgency::Soon,
            1501..=3000 => Urgency::Upcoming,
            _ => Urgency::Scheduled,
        }
    }

    fn message(self, item: &str) -> String {
        match self {
            Urgency::Immediate => format!(
                "⏰ Your {} needs attention right away — let's keep you safe on the road!",
                item
            ),
            Urgency::Soon => format!(
                "📅 Your {} is coming up in the next few weeks. Plan a visit to your mechanic.",
                item
            ),
            Urgency::Upcoming => format!(
                "🗓️ Your {} is on the horizon. No rush, but keep it in mind.",
                item
            ),
            Urgency::Scheduled => format!(
                "✅ Your {} is looking good! Just routine maintenance ahead.",
                item
            ),
        }
    }
}

/// One maintenance forecast
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub id: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
    pub km_remaining: u64,
    pub days_remaining: u64,
    pub condition: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub urgency: Urgency,
    pub emotional_message: String,
}

/// Full maintenance forecast, most urgent first
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceForecast {
    pub timestamp: DateTime<Utc>,
    pub mileage: f64,
    pub predictions: Vec<Prediction>,
    pub next_action: Option<Prediction>,
}

/// Raw estimate produced by an item's formula
struct Estimate {
    km_remaining: u64,
    days_remaining: u64,
    condition: &'static str,
    note: Option<String>,
}

impl Estimate {
    fn from_km(km: f64, condition: &'static str) -> Self {
        let km_remaining = round_km(km);
        Self {
            km_remaining,
            days_remaining: round_km(km_remaining as f64 / KM_PER_DAY),
            condition,
            note: None,
        }
    }
}

struct MaintenanceItem {
    id: &'static str,
    name: &'static str,
    icon: &'static str,
    estimate: fn(&Inputs<'_>) -> Estimate,
}

/// Everything an item formula may look at
struct Inputs<'a> {
    readings: &'a Readings,
    mileage: f64,
    history: &'a ServiceHistory,
}

impl Inputs<'_> {
    /// Supplied reading; unparseable values read as 0
    fn reading(&self, parameter: Parameter) -> Option<f64> {
        self.readings
            .supplied(parameter)
            .map(|v| if v.is_nan() { 0.0 } else { v })
    }

    /// Supplied reading that is present and non-zero
    fn reading_or(&self, parameter: Parameter, fallback: f64) -> f64 {
        self.reading(parameter).filter(|v| *v != 0.0).unwrap_or(fallback)
    }

    fn below(&self, parameter: Parameter, limit: f64) -> bool {
        self.reading(parameter).map_or(false, |v| v < limit)
    }

    fn above(&self, parameter: Parameter, limit: f64) -> bool {
        self.reading(parameter).map_or(false, |v| v > limit)
    }

    /// Km left on a fixed interval since the last recorded service
    fn interval_remaining(&self, interval: f64, last: Option<f64>) -> f64 {
        let last = last
            .filter(|m| *m != 0.0)
            .unwrap_or(self.mileage - self.mileage % interval);
        interval - (self.mileage - last)
    }
}

fn round_km(km: f64) -> u64 {
    km.max(0.0).round() as u64
}

fn oil_change(inputs: &Inputs<'_>) -> Estimate {
    let remaining = inputs.interval_remaining(10_000.0, inputs.history.last_service_mileage);
    let degraded = inputs.below(Parameter::OilPressure, 30.0);
    let factor = if degraded { 0.7 } else { 1.0 };
    Estimate::from_km(remaining * factor, if degraded { "degraded" } else { "normal" })
}

fn brake_replacement(inputs: &Inputs<'_>) -> Estimate {
    // 0.3mm of pad per 1000km, 1.5mm is the replacement floor
    let thickness = inputs.reading_or(Parameter::BrakeThickness, 8.0);
    let condition = if thickness < 2.5 {
        "worn"
    } else if thickness < 5.0 {
        "moderate"
    } else {
        "good"
    };
    let mut estimate = Estimate::from_km((thickness - 1.5) / 0.0003, condition);
    estimate.note = Some(format!(
        "Calculated from {}mm pad thickness using 0.3mm/1000km standard wear.",
        thickness
    ));
    estimate
}

fn battery_replacement(inputs: &Inputs<'_>) -> Estimate {
    let voltage = inputs.reading_or(Parameter::BatteryVoltage, 12.6);
    let (condition, days): (&'static str, u64) = if voltage < 12.0 {
        ("critical", 7)
    } else if voltage < 12.4 {
        ("aging", 90)
    } else {
        ("healthy", 365)
    };
    Estimate {
        km_remaining: days * KM_PER_DAY as u64,
        days_remaining: days,
        condition,
        note: None,
    }
}

fn tire_rotation(inputs: &Inputs<'_>) -> Estimate {
    let remaining = inputs.interval_remaining(10_000.0, inputs.history.last_rotation_mileage);
    let irregular = inputs.below(Parameter::TirePressure, 28.0)
        || inputs.above(Parameter::TirePressure, 38.0);
    let factor = if irregular { 0.6 } else { 1.0 };
    let condition = if irregular { "uneven wear likely" } else { "normal" };
    Estimate::from_km(remaining * factor, condition)
}

fn coolant_flush(inputs: &Inputs<'_>) -> Estimate {
    let remaining = 50_000.0 - inputs.mileage % 50_000.0;
    let hot = inputs.above(Parameter::EngineTemp, 100.0);
    let km = remaining * if hot { 0.7 } else { 1.0 };
    Estimate {
        km_remaining: round_km(km),
        days_remaining: round_km(km / KM_PER_DAY),
        condition: if hot { "potentially degraded" } else { "normal" },
        note: None,
    }
}

fn fuel_filter(inputs: &Inputs<'_>) -> Estimate {
    let remaining = 40_000.0 - inputs.mileage % 40_000.0;
    Estimate::from_km(remaining, "scheduled")
}

static MAINTENANCE_ITEMS: &[MaintenanceItem] = &[
    MaintenanceItem {
        id: "oil_change",
        name: "Oil Change",
        icon: "🛢️",
        estimate: oil_change,
    },
    MaintenanceItem {
        id: "brake_replacement",
        name: "Brake Pad Replacement",
        icon: "🛑",
        estimate: brake_replacement,
    },
    MaintenanceItem {
        id: "battery_replacement",
        name: "Battery Replacement",
        icon: "🔋",
        estimate: battery_replacement,
    },
    MaintenanceItem {
        id: "tire_rotation",
        name: "Tire Rotation / Replacement",
        icon: "🛞",
        estimate: tire_rotation,
    },
    MaintenanceItem {
        id: "coolant_flush",
        name: "Coolant System Flush",
        icon: "🌡️",
        estimate: coolant_flush,
    },
    MaintenanceItem {
        id: "fuel_filter",
        name: "Fuel Filter Replacement",
        icon: "⛽",
        estimate: fuel_filter,
    },
];

/// Forecast every maintenance item for a vehicle at `mileage` km
pub fn predict_maintenance(
    telemetry: &TelemetrySnapshot,
    mileage: f64,
    history: &ServiceHistory,
    now: DateTime<Utc>,
) -> MaintenanceForecast {
    let readings = telemetry.numeric();
    let inputs = Inputs {
        readings: &readings,
        mileage,
        history,
    };

    let mut predictions: Vec<Prediction> = MAINTENANCE_ITEMS
        .iter()
        .map(|item| {
            let estimate = (item.estimate)(&inputs);
            let urgency = Urgency::from_km(estimate.km_remaining);

            debug!(
                item = item.id,
                km_remaining = estimate.km_remaining,
                urgency = ?urgency,
                "Maintenance item estimated"
            );

            Prediction {
                id: item.id,
                name: item.name,
                icon: item.icon,
                km_remaining: estimate.km_remaining,
                days_remaining: estimate.days_remaining,
                condition: estimate.condition,
                note: estimate.note,
                urgency,
                emotional_message: urgency.message(item.name),
            }
        })
        .collect();

    predictions.sort_by_key(|p| p.urgency);

    MaintenanceForecast {
        timestamp: now,
        mileage,
        next_action: predictions.first().cloned(),
        predictions,
    }
}
