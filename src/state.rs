//! Application state management
//!
//! Service statistics shared across workers. The diagnosis engine itself is
//! stateless and never reads from here.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// Central application state
#[derive(Debug)]
pub struct AppState {
    /// Application start time
    start_time: DateTime<Utc>,
    /// Total diagnoses served
    diagnoses_served: u64,
    /// Time of the most recent diagnosis
    last_diagnosis: Option<DateTime<Utc>>,
}

impl AppState {
    /// Create new application state
    pub fn new() -> Self {
        info!("Initializing application state");
        Self {
            start_time: Utc::now(),
            diagnoses_served: 0,
            last_diagnosis: None,
        }
    }

    /// Count a completed diagnosis
    pub fn record_diagnosis(&mut self, at: DateTime<Utc>) {
        self.diagnoses_served += 1;
        self.last_diagnosis = Some(at);

        debug!(total = self.diagnoses_served, "Diagnosis recorded");
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        (Utc::now() - self.start_time).num_seconds().max(0) as u64
    }

    /// Get total diagnoses served
    pub fn diagnoses_served(&self) -> u64 {
        self.diagnoses_served
    }

    /// Get the timestamp of the latest diagnosis
    pub fn last_diagnosis(&self) -> Option<DateTime<Utc>> {
        self.last_diagnosis
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
