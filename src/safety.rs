//! Drive safety scorer
//!
//! Scores a driving session from 0 to 100 by deducting points for risky
//! behavior, grades it, and awards badges for good habits.

use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::Validate;

/// Driving session summary as submitted by the client.
///
/// Fields are optional: scoring falls back to typical values, while badges
/// are only awarded for behavior that was actually reported.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct DrivingSession {
    #[validate(range(min = 0.0, max = 400.0, message = "Average speed must be between 0 and 400 km/h"))]
    pub avg_speed: Option<f64>,

    #[validate(range(min = 0.0, max = 400.0, message = "Max speed must be between 0 and 400 km/h"))]
    pub max_speed: Option<f64>,

    pub hard_brakes: Option<u32>,

    pub rapid_accelerations: Option<u32>,

    #[validate(range(min = 0.0, message = "Distance must not be negative"))]
    pub distance_km: Option<f64>,

    #[validate(range(min = 0.0, message = "Duration must not be negative"))]
    pub duration_minutes: Option<f64>,

    pub night_driving: Option<bool>,

    pub weather_condition: Option<String>,
}

/// A single point deduction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Deduction {
    pub reason: String,
    pub points: i32,
}

/// Badge earned for a good driving habit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Badge {
    pub id: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
}

/// Score report for one session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyReport {
    pub score: i32,
    pub grade: &'static str,
    pub grade_color: &'static str,
    pub grade_emoji: &'static str,
    pub deductions: Vec<Deduction>,
    pub badges: Vec<Badge>,
    pub tips: Vec<&'static str>,
    pub emotional_message: &'static str,
}

struct BadgeRule {
    badge: Badge,
    earned: fn(&DrivingSession, i32) -> bool,
}

fn avg_speed_at_most(s: &DrivingSession, limit: f64) -> bool {
    s.avg_speed.map_or(false, |v| v <= limit)
}

fn speed_saint(s: &DrivingSession, _score: i32) -> bool {
    avg_speed_at_most(s, 80.0)
}

fn smooth_operator(s: &DrivingSession, _score: i32) -> bool {
    s.hard_brakes == Some(0)
}

fn gentle_starter(s: &DrivingSession, _score: i32) -> bool {
    s.rapid_accelerations == Some(0)
}

fn night_owl(s: &DrivingSession, _score: i32) -> bool {
    s.night_driving == Some(true) && avg_speed_at_most(s, 60.0)
}

fn eco_warrior(s: &DrivingSession, _score: i32) -> bool {
    s.avg_speed.map_or(false, |v| (40.0..=80.0).contains(&v))
}

fn maintenance_hero(_s: &DrivingSession, score: i32) -> bool {
    score >= 80
}

static BADGES: &[BadgeRule] = &[
    BadgeRule {
        badge: Badge {
            id: "speed_saint",
            name: "Speed Saint",
            icon: "🏅",
            description: "Maintained safe average speed",
        },
        earned: speed_saint,
    },
    BadgeRule {
        badge: Badge {
            id: "smooth_operator",
            name: "Smooth Operator",
            icon: "🎯",
            description: "No hard braking events",
        },
        earned: smooth_operator,
    },
    BadgeRule {
        badge: Badge {
            id: "gentle_starter",
            name: "Gentle Starter",
            icon: "🌱",
            description: "No rapid acceleration events",
        },
        earned: gentle_starter,
    },
    BadgeRule {
        badge: Badge {
            id: "night_owl",
            name: "Night Owl Pro",
            icon: "🦉",
            description: "Safe speed during night driving",
        },
        earned: night_owl,
    },
    BadgeRule {
        badge: Badge {
            id: "eco_warrior",
            name: "Eco Warrior",
            icon: "🌍",
            description: "Optimal speed for fuel efficiency",
        },
        earned: eco_warrior,
    },
    BadgeRule {
        badge: Badge {
            id: "maintenance_hero",
            name: "Maintenance Hero",
            icon: "🔧",
            description: "Vehicle in good condition",
        },
        earned: maintenance_hero,
    },
];

/// Score one driving session
pub fn calculate_safety_score(session: &DrivingSession) -> SafetyReport {
    let avg_speed = session.avg_speed.unwrap_or(60.0);
    let max_speed = session.max_speed.unwrap_or(80.0);
    let hard_brakes = session.hard_brakes.unwrap_or(0);
    let rapid_accelerations = session.rapid_accelerations.unwrap_or(0);
    let night_driving = session.night_driving.unwrap_or(false);
    let weather = session.weather_condition.as_deref().unwrap_or("clear");

    let mut deductions = Vec::new();

    if max_speed > 160.0 {
        deductions.push(Deduction {
            reason: "Extreme speed detected (>160 km/h)".to_string(),
            points: -30,
        });
    } else if max_speed > 120.0 {
        let penalty = ((max_speed - 120.0) * 0.5).round() as i32;
        deductions.push(Deduction {
            reason: format!("High max speed: {} km/h", max_speed),
            points: -penalty,
        });
    }

    if avg_speed > 100.0 {
        let penalty = ((avg_speed - 100.0) * 0.3).round() as i32;
        deductions.push(Deduction {
            reason: format!("High average speed: {} km/h", avg_speed),
            points: -penalty,
        });
    }

    if hard_brakes > 0 {
        let penalty = hard_brakes.saturating_mul(5).min(20) as i32;
        deductions.push(Deduction {
            reason: format!("{} hard braking event(s)", hard_brakes),
            points: -penalty,
        });
    }

    if rapid_accelerations > 0 {
        let penalty = rapid_accelerations.saturating_mul(3).min(15) as i32;
        deductions.push(Deduction {
            reason: format!("{} rapid acceleration(s)", rapid_accelerations),
            points: -penalty,
        });
    }

    if night_driving && avg_speed > 80.0 {
        deductions.push(Deduction {
            reason: "High speed during night driving".to_string(),
            points: -10,
        });
    }

    if weather == "rain" && avg_speed > 70.0 {
        deductions.push(Deduction {
            reason: "High speed in rainy conditions".to_string(),
            points: -10,
        });
    } else if weather == "fog" && avg_speed > 50.0 {
        deductions.push(Deduction {
            reason: "High speed in foggy conditions".to_string(),
            points: -15,
        });
    }

    let total: i32 = deductions.iter().map(|d| d.points).sum();
    let score = (100 + total).clamp(0, 100);
    let (grade, grade_color, grade_emoji) = grade(score);

    let badges = BADGES
        .iter()
        .filter(|rule| (rule.earned)(session, score))
        .map(|rule| rule.badge.clone())
        .collect();

    debug!(
        score,
        grade,
        deductions = deductions.len(),
        "Safety score calculated"
    );

    SafetyReport {
        score,
        grade,
        grade_color,
        grade_emoji,
        tips: tips_for(&deductions),
        deductions,
        badges,
        emotional_message: emotional_message(score),
    }
}

fn grade(score: i32) -> (&'static str, &'static str, &'static str) {
    match score {
        90.. => ("A+", "#00e676", "🌟"),
        80..=89 => ("A", "#69f0ae", "😊"),
        70..=79 => ("B", "#ffc400", "🙂"),
        60..=69 => ("C", "#ff9100", "😐"),
        50..=59 => ("D", "#ff6d00", "😟"),
        _ => ("F", "#ff1744", "😰"),
    }
}

fn tips_for(deductions: &[Deduction]) -> Vec<&'static str> {
    const TIPS: &[(&[&str], &str)] = &[
        (&["speed"], "Try maintaining speeds under 100 km/h for safer and more fuel-efficient driving."),
        (&["braking"], "Anticipate traffic flow to reduce hard braking. Keep a safe following distance."),
        (&["acceleration"], "Accelerate gently — it's easier on your engine and passengers."),
        (&["night"], "Reduce speed at night when visibility is lower."),
        (&["rain", "fog"], "Adjust your speed to match weather conditions for maximum safety."),
    ];

    let mut tips = Vec::new();
    for deduction in deductions {
        for (keywords, tip) in TIPS {
            if keywords.iter().any(|k| deduction.reason.contains(k)) && !tips.contains(tip) {
                tips.push(*tip);
            }
        }
    }
    tips
}

fn emotional_message(score: i32) -> &'static str {
    match score {
        90.. => "🌟 Outstanding driving! You're a road safety champion. Keep it up!",
        80..=89 => "😊 Great job! You're a safe and responsible driver.",
        70..=79 => "🙂 Good driving overall! A few small tweaks and you'll be even better.",
        60..=69 => "😐 Room for improvement. Focus on the tips below for a safer drive.",
        50..=59 => "😟 Your driving needs attention. Safety should always come first.",
        _ => "😰 Please focus on driving safely. Your life and others' lives depend on it.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn badge_ids(report: &SafetyReport) -> Vec<&'static str> {
        report.badges.iter().map(|b| b.id).collect()
    }

    #[test]
    fn test_empty_session_scores_full_marks() {
        let report = calculate_safety_score(&DrivingSession::default());

        assert_eq!(report.score, 100);
        assert_eq!(report.grade, "A+");
        assert!(report.deductions.is_empty());
        assert!(report.tips.is_empty());
        // Only the score-based badge: nothing else was reported
        assert_eq!(badge_ids(&report), vec!["maintenance_hero"]);
    }

    #[test]
    fn test_careful_driver_earns_badges() {
        let session = DrivingSession {
            avg_speed: Some(55.0),
            max_speed: Some(90.0),
            hard_brakes: Some(0),
            rapid_accelerations: Some(0),
            night_driving: Some(true),
            ..Default::default()
        };
        let report = calculate_safety_score(&session);

        assert_eq!(report.score, 100);
        assert_eq!(
            badge_ids(&report),
            vec![
                "speed_saint",
                "smooth_operator",
                "gentle_starter",
                "night_owl",
                "eco_warrior",
                "maintenance_hero"
            ]
        );
    }

    #[test]
    fn test_aggressive_driver_is_penalized() {
        let session = DrivingSession {
            avg_speed: Some(110.0),
            max_speed: Some(150.0),
            hard_brakes: Some(6),
            rapid_accelerations: Some(2),
            night_driving: Some(true),
            weather_condition: Some("rain".to_string()),
            ..Default::default()
        };
        let report = calculate_safety_score(&session);

        let points: Vec<i32> = report.deductions.iter().map(|d| d.points).collect();
        // max 150 -> -15, avg 110 -> -3, brakes capped -20, accel -6, night -10, rain -10
        assert_eq!(points, vec![-15, -3, -20, -6, -10, -10]);
        assert_eq!(report.score, 36);
        assert_eq!(report.grade, "F");
        assert!(report.badges.is_empty());
        assert_eq!(report.tips.len(), 5);
    }

    #[test]
    fn test_extreme_speed_flat_penalty() {
        let session = DrivingSession {
            max_speed: Some(190.0),
            ..Default::default()
        };
        let report = calculate_safety_score(&session);

        assert_eq!(report.score, 70);
        assert_eq!(report.grade, "B");
        assert_eq!(report.deductions[0].reason, "Extreme speed detected (>160 km/h)");
    }

    #[test]
    fn test_fog_penalty() {
        let session = DrivingSession {
            avg_speed: Some(65.0),
            weather_condition: Some("fog".to_string()),
            ..Default::default()
        };
        let report = calculate_safety_score(&session);

        assert_eq!(report.score, 85);
        assert_eq!(report.grade, "A");
        assert_eq!(
            report.tips,
            vec![
                "Try maintaining speeds under 100 km/h for safer and more fuel-efficient driving.",
                "Adjust your speed to match weather conditions for maximum safety."
            ]
        );
    }

    #[test]
    fn test_score_is_clamped() {
        let session = DrivingSession {
            avg_speed: Some(300.0),
            max_speed: Some(300.0),
            hard_brakes: Some(50),
            rapid_accelerations: Some(50),
            night_driving: Some(true),
            weather_condition: Some("rain".to_string()),
            ..Default::default()
        };
        let report = calculate_safety_score(&session);
        assert_eq!(report.score, 0);
        assert_eq!(report.grade, "F");
    }

    #[test]
    fn test_session_validation() {
        let session = DrivingSession {
            avg_speed: Some(-5.0),
            ..Default::default()
        };
        assert!(session.validate().is_err());
        assert!(DrivingSession::default().validate().is_ok());
    }
}
