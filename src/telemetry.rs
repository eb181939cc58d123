//! Telemetry input model
//!
//! Raw readings as submitted by clients, the numeric parsing rules shared by
//! every engine, and the optional driving context.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// The eight canonical telemetry parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Parameter {
    Speed,
    EngineTemp,
    Rpm,
    OilPressure,
    TirePressure,
    BatteryVoltage,
    FuelLevel,
    BrakeThickness,
}

impl Parameter {
    pub const ALL: [Parameter; 8] = [
        Parameter::Speed,
        Parameter::EngineTemp,
        Parameter::Rpm,
        Parameter::OilPressure,
        Parameter::TirePressure,
        Parameter::BatteryVoltage,
        Parameter::FuelLevel,
        Parameter::BrakeThickness,
    ];

    /// Wire key, e.g. `engineTemp`
    pub fn key(self) -> &'static str {
        match self {
            Parameter::Speed => "speed",
            Parameter::EngineTemp => "engineTemp",
            Parameter::Rpm => "rpm",
            Parameter::OilPressure => "oilPressure",
            Parameter::TirePressure => "tirePressure",
            Parameter::BatteryVoltage => "batteryVoltage",
            Parameter::FuelLevel => "fuelLevel",
            Parameter::BrakeThickness => "brakeThickness",
        }
    }

    /// Wire keys of all canonical parameters
    pub fn keys() -> Vec<&'static str> {
        Self::ALL.iter().map(|p| p.key()).collect()
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Raw telemetry mapping, keyed by parameter name.
///
/// Values are kept as submitted (number, numeric string, null, ...) and only
/// interpreted on demand. Unknown keys are retained.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TelemetrySnapshot(BTreeMap<String, Value>);

impl TelemetrySnapshot {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of a raw value
    #[cfg(test)]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Number of keys supplied, canonical or not
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn raw(&self, parameter: Parameter) -> Option<&Value> {
        self.0.get(parameter.key())
    }

    /// Finite numeric reading for a parameter, if one was supplied
    pub fn reading(&self, parameter: Parameter) -> Option<f64> {
        self.raw(parameter)
            .and_then(parse_number)
            .filter(|v| v.is_finite())
    }

    /// Canonical parameters present with a value other than the empty string
    pub fn provided(&self) -> Vec<Parameter> {
        Parameter::ALL
            .into_iter()
            .filter(|p| match self.raw(*p) {
                Some(Value::String(s)) => !s.is_empty(),
                Some(_) => true,
                None => false,
            })
            .collect()
    }

    /// Numeric view of every canonical parameter that was supplied.
    /// Unparseable values become NaN.
    pub fn numeric(&self) -> Readings {
        let values = Parameter::ALL
            .into_iter()
            .filter_map(|p| {
                self.raw(p)
                    .map(|raw| (p, parse_number(raw).unwrap_or(f64::NAN)))
            })
            .collect();
        Readings { values }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for TelemetrySnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Parsed numeric readings. Missing parameters read as NaN, so any
/// comparison against them is false.
#[derive(Debug, Clone, Default)]
pub struct Readings {
    values: HashMap<Parameter, f64>,
}

impl Readings {
    pub fn get(&self, parameter: Parameter) -> f64 {
        self.values.get(&parameter).copied().unwrap_or(f64::NAN)
    }

    /// Value for a supplied parameter, `None` when it was never supplied
    pub fn supplied(&self, parameter: Parameter) -> Option<f64> {
        self.values.get(&parameter).copied()
    }
}

/// Interpret a raw JSON value as a number.
///
/// Numbers pass through; strings are read up to the longest numeric prefix.
/// Anything else is not a number.
pub fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_float_prefix(s),
        _ => None,
    }
}

/// Parse the longest leading decimal literal of `input`, e.g. `"12.5psi"`.
pub fn parse_float_prefix(input: &str) -> Option<f64> {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    if s[end..].starts_with("Infinity") {
        return Some(if s.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        end = frac_end;
    }
    if digits == 0 {
        return None;
    }

    // Exponent only counts when followed by at least one digit
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    // Normalize bare-dot forms (".5", "5.") before handing off to the std parser
    let literal = s[..end].trim_end_matches('.');
    let literal = if literal[int_start..].starts_with('.') {
        literal.replacen('.', "0.", 1)
    } else {
        literal.to_string()
    };

    literal.parse().ok()
}

// ----------------------------------------------------------------------------
// Driving context
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TripType {
    City,
    Highway,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Weather {
    Clear,
    Rain,
    Fog,
    Storm,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeOfDay {
    Day,
    Night,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriverProfile {
    Experienced,
    New,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Load {
    Normal,
    Heavy,
    #[serde(other)]
    Other,
}

/// Situational context for a diagnosis. Every field is optional and an
/// absent field has no effect on prioritization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DrivingContext {
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::optional_label"
    )]
    pub trip_type: Option<TripType>,

    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::optional_label"
    )]
    pub weather: Option<Weather>,

    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::optional_label"
    )]
    pub time_of_day: Option<TimeOfDay>,

    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::optional_label"
    )]
    pub driver_profile: Option<DriverProfile>,

    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::optional_integer"
    )]
    pub passengers: Option<i64>,

    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::optional_label"
    )]
    pub load: Option<Load>,

    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::optional_truthy"
    )]
    pub ac_on: Option<bool>,

    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::optional_exact_integer"
    )]
    pub gear: Option<i64>,
}

/// Deserializers that accept the loosely typed values web clients send
pub(crate) mod lenient {
    use super::*;
    use serde::de::DeserializeOwned;

    /// Enum label from a string; any other JSON type reads as absent
    pub fn optional_label<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(label @ Value::String(_)) => serde_json::from_value(label).ok(),
            _ => None,
        })
    }

    /// Number or numeric string, parsed like any telemetry value
    pub fn optional_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(parse_number))
    }

    /// Integral JSON number only: strings and fractions read as absent
    pub fn optional_exact_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::Number(n)) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.fract() == 0.0)
                    .map(|f| f as i64)
            }),
            _ => None,
        })
    }

    /// Integer from a number or numeric string; anything else reads as absent
    pub fn optional_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value
            .as_ref()
            .and_then(parse_number)
            .filter(|v| v.is_finite())
            .map(|v| v.trunc() as i64))
    }

    /// Boolean flag using the usual truthiness of form values
    pub fn optional_truthy<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.and_then(|v| match v {
            Value::Null => None,
            Value::Bool(b) => Some(b),
            Value::Number(n) => Some(n.as_f64().map_or(false, |f| f != 0.0 && !f.is_nan())),
            Value::String(s) => Some(!s.is_empty()),
            Value::Array(_) | Value::Object(_) => Some(true),
        }))
    }
}
