//! Severity model
//!
//! Ordered danger ranking shared by every rule table, plus the bucketing
//! that turns a continuous (context-escalated) score back into a label.

use serde::{Serialize, Serializer};

/// Ordered severity ranking. The numeric level grows with danger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// All levels, lowest first
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    /// Integer level (1..=4)
    pub fn level(self) -> u8 {
        match self {
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
            Severity::Critical => 4,
        }
    }

    /// Wire label
    pub fn label(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    /// Display color (hex)
    pub fn color(self) -> &'static str {
        match self {
            Severity::Low => "#00e676",
            Severity::Medium => "#ffc400",
            Severity::High => "#ff6d00",
            Severity::Critical => "#ff1744",
        }
    }

    /// Re-bucket a continuous score against the 2/3/4 boundaries.
    ///
    /// Scores below the MEDIUM boundary keep `base`: bucketing only ever
    /// escalates.
    pub fn from_score(score: f64, base: Severity) -> Severity {
        let bucket = if score >= f64::from(Severity::Critical.level()) {
            Severity::Critical
        } else if score >= f64::from(Severity::High.level()) {
            Severity::High
        } else if score >= f64::from(Severity::Medium.level()) {
            Severity::Medium
        } else {
            base
        };
        bucket.max(base)
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Catalogue entry describing one severity level
#[derive(Debug, Clone, Serialize)]
pub struct SeverityInfo {
    pub level: u8,
    pub label: &'static str,
    pub color: &'static str,
}

impl From<Severity> for SeverityInfo {
    fn from(severity: Severity) -> Self {
        Self {
            level: severity.level(),
            label: severity.label(),
            color: severity.color(),
        }
    }
}
