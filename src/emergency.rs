//! Roadside emergency assistance
//!
//! Step-by-step protocols per emergency type, the national helpline
//! numbers, and a default list of service centers. No location lookup is
//! performed; a reported position is echoed back for the dispatcher.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::telemetry::lenient;

/// Emergency type assumed when none is given
pub const DEFAULT_EMERGENCY: &str = "breakdown";

const CALMING_MESSAGE: &str = "🫂 Help is on the way. Stay calm, stay safe. You're not alone.";

/// Request body of `POST /api/emergency`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmergencyRequest {
    #[serde(deserialize_with = "lenient::optional_label")]
    pub emergency_type: Option<String>,

    #[serde(deserialize_with = "lenient::optional_number")]
    pub lat: Option<f64>,

    #[serde(deserialize_with = "lenient::optional_number")]
    pub lng: Option<f64>,
}

impl EmergencyRequest {
    /// Reported position, when both coordinates are present and non-zero
    pub fn location(&self) -> Option<Location> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) if lat != 0.0 && lng != 0.0 => Some(Location { lat, lng }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

/// What to do, in order
#[derive(Debug, Clone, Serialize)]
pub struct Protocol {
    pub title: &'static str,
    pub steps: &'static [&'static str],
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCenter {
    pub id: &'static str,
    pub name: &'static str,
    pub address: &'static str,
    pub distance: &'static str,
    pub distance_km: f64,
    pub phone: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub rating: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmergencyNumbers {
    pub police: &'static str,
    pub ambulance: &'static str,
    pub fire: &'static str,
    pub roadside: &'static str,
}

/// Full assistance package returned to the driver
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyResponse {
    pub timestamp: DateTime<Utc>,
    pub emergency_type: String,
    pub protocol: &'static Protocol,
    pub nearby_service_centers: &'static [ServiceCenter],
    pub is_real_data: bool,
    pub user_location: Option<Location>,
    pub calming_message: &'static str,
    pub emergency_numbers: &'static EmergencyNumbers,
}

static BREAKDOWN: Protocol = Protocol {
    title: "Vehicle Breakdown",
    steps: &[
        "Turn on hazard lights immediately",
        "Safely move to the shoulder or side of the road",
        "Place warning triangle 50m behind your vehicle",
        "Stay inside the vehicle if on a highway",
        "Call roadside assistance or nearest service center",
    ],
};

static ACCIDENT: Protocol = Protocol {
    title: "Accident",
    steps: &[
        "Check yourself and passengers for injuries",
        "Call emergency services (112) if anyone is hurt",
        "Turn off the engine and turn on hazard lights",
        "Do not move the vehicle unless it blocks traffic",
        "Exchange information with other parties involved",
        "Document the scene with photos",
    ],
};

static FIRE: Protocol = Protocol {
    title: "Vehicle Fire",
    steps: &[
        "Pull over immediately and turn off the engine",
        "Get everyone out of the vehicle and move 30m away",
        "Call fire services (101) immediately",
        "Do NOT open the hood if smoke is coming from engine",
        "Use a fire extinguisher only if the fire is small and contained",
    ],
};

static FLAT_TIRE: Protocol = Protocol {
    title: "Flat Tire",
    steps: &[
        "Slow down gradually and find a safe, flat spot",
        "Turn on hazard lights and apply parking brake",
        "Use the spare tire kit if available",
        "If no spare, call roadside assistance",
        "Do not drive on a flat tire — it damages the rim",
    ],
};

static PROTOCOLS: &[(&str, &Protocol)] = &[
    ("breakdown", &BREAKDOWN),
    ("accident", &ACCIDENT),
    ("fire", &FIRE),
    ("flat_tire", &FLAT_TIRE),
];

static DEFAULT_SERVICE_CENTERS: &[ServiceCenter] = &[
    ServiceCenter {
        id: "default-1",
        name: "AutoCare Express",
        address: "123 Main Road, Near City Center",
        distance: "1.2 km",
        distance_km: 1.2,
        phone: "+91 98765 43210",
        kind: "Multi-brand",
        rating: "4.5",
    },
    ServiceCenter {
        id: "default-2",
        name: "QuickFix Motors",
        address: "456 Industrial Area, Phase 2",
        distance: "2.8 km",
        distance_km: 2.8,
        phone: "+91 98765 43211",
        kind: "Authorized Service",
        rating: "4.2",
    },
    ServiceCenter {
        id: "default-3",
        name: "RoadStar Garage",
        address: "789 Highway Plaza, Exit 5",
        distance: "4.1 km",
        distance_km: 4.1,
        phone: "+91 98765 43212",
        kind: "Premium Service",
        rating: "4.7",
    },
];

static EMERGENCY_NUMBERS: EmergencyNumbers = EmergencyNumbers {
    police: "100",
    ambulance: "108",
    fire: "101",
    roadside: "1800-123-4567",
};

/// Protocol for an emergency type, falling back to breakdown
pub fn protocol_for(emergency_type: &str) -> &'static Protocol {
    PROTOCOLS
        .iter()
        .find(|(key, _)| *key == emergency_type)
        .map_or(&BREAKDOWN, |(_, protocol)| *protocol)
}

/// Assemble the assistance package for a request
pub fn emergency_assist(request: &EmergencyRequest, now: DateTime<Utc>) -> EmergencyResponse {
    let emergency_type = request
        .emergency_type
        .clone()
        .unwrap_or_else(|| DEFAULT_EMERGENCY.to_string());
    let protocol = protocol_for(&emergency_type);
    let user_location = request.location();

    info!(
        emergency_type = %emergency_type,
        protocol = protocol.title,
        located = user_location.is_some(),
        "Emergency assistance requested"
    );

    EmergencyResponse {
        timestamp: now,
        emergency_type,
        protocol,
        nearby_service_centers: DEFAULT_SERVICE_CENTERS,
        is_real_data: false,
        user_location,
        calming_message: CALMING_MESSAGE,
        emergency_numbers: &EMERGENCY_NUMBERS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: serde_json::Value) -> EmergencyRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_known_protocols() {
        assert_eq!(protocol_for("fire").title, "Vehicle Fire");
        assert_eq!(protocol_for("accident").steps.len(), 6);
        assert_eq!(protocol_for("flat_tire").title, "Flat Tire");
    }

    #[test]
    fn test_unknown_type_falls_back_to_breakdown() {
        let response = emergency_assist(&request(json!({"emergencyType": "alien"})), Utc::now());
        assert_eq!(response.emergency_type, "alien");
        assert_eq!(response.protocol.title, "Vehicle Breakdown");
    }

    #[test]
    fn test_defaults_without_location() {
        let response = emergency_assist(&EmergencyRequest::default(), Utc::now());

        assert_eq!(response.emergency_type, "breakdown");
        assert!(response.user_location.is_none());
        assert!(!response.is_real_data);
        assert_eq!(response.nearby_service_centers.len(), 3);
        assert_eq!(response.emergency_numbers.ambulance, "108");
    }

    #[test]
    fn test_location_requires_both_coordinates() {
        assert_eq!(
            request(json!({"lat": 12.97, "lng": "77.59"})).location(),
            Some(Location { lat: 12.97, lng: 77.59 })
        );
        assert_eq!(request(json!({"lat": 12.97})).location(), None);
        assert_eq!(request(json!({"lat": 0, "lng": 77.59})).location(), None);
    }

    #[test]
    fn test_response_wire_shape() {
        let response = emergency_assist(&request(json!({"emergencyType": "fire"})), Utc::now());
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["protocol"]["title"], "Vehicle Fire");
        assert_eq!(json["nearbyServiceCenters"][0]["type"], "Multi-brand");
        assert_eq!(json["nearbyServiceCenters"][0]["distanceKm"], 1.2);
        assert_eq!(json["userLocation"], serde_json::Value::Null);
        assert_eq!(json["emergencyNumbers"]["roadside"], "1800-123-4567");
    }
}
