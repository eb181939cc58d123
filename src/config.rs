//! Configuration management module
//!
//! Loads and validates environment-based configuration.

use serde::Deserialize;
use std::env;
use thiserror::Error;

use crate::detector::VerdictPolicy;

/// Configuration errors
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Invalid number format in environment variable {0}")]
    ParseError(&'static str),

    #[error("Invalid VERDICT_POLICY: {0}")]
    InvalidPolicy(String),
}

/// Server configuration settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Diagnosis engine settings
#[derive(Debug, Clone, Deserialize)]
pub struct DiagnosisSettings {
    /// Mapping from top fault score to overall status
    pub verdict_policy: VerdictPolicy,
    /// Odometer value assumed when a prediction request omits it
    pub default_mileage_km: f64,
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub diagnosis: DiagnosisSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "0.0.0.0".into(),
                port: 8080,
            },
            diagnosis: DiagnosisSettings {
                verdict_policy: VerdictPolicy::Banded,
                default_mileage_km: 50_000.0,
            },
        }
    }
}

impl Settings {
    /// Load settings from environment variables
    pub fn from_env() -> Result<Self, SettingsError> {
        let port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .map_err(|_| SettingsError::ParseError("SERVER_PORT"))?;

        let verdict_policy = env::var("VERDICT_POLICY")
            .unwrap_or_else(|_| "banded".into())
            .parse()
            .map_err(SettingsError::InvalidPolicy)?;

        let default_mileage_km: f64 = env::var("DEFAULT_MILEAGE_KM")
            .unwrap_or_else(|_| "50000".into())
            .parse()
            .map_err(|_| SettingsError::ParseError("DEFAULT_MILEAGE_KM"))?;

        if !default_mileage_km.is_finite() || default_mileage_km < 0.0 {
            return Err(SettingsError::ParseError("DEFAULT_MILEAGE_KM"));
        }

        Ok(Self {
            server: ServerSettings {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
                port,
            },
            diagnosis: DiagnosisSettings {
                verdict_policy,
                default_mileage_km,
            },
        })
    }
}
