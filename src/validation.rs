//! Input validation module
//!
//! Turns raw request bodies into engine inputs and rejects requests the
//! engine cannot say anything useful about.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use validator::{Validate, ValidationErrors};

use crate::error::{AppError, AppResult};
use crate::predictor::ServiceHistory;
use crate::safety::DrivingSession;
use crate::telemetry::{lenient, DrivingContext, TelemetrySnapshot};

/// Key under which a request body may nest its telemetry
const PARAMS_KEY: &str = "params";
/// Key carrying the driving context, nested or flat
const CONTEXT_KEY: &str = "context";

/// Telemetry and context extracted from a diagnose request
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnoseRequest {
    pub telemetry: TelemetrySnapshot,
    pub context: DrivingContext,
}

/// Body of `POST /api/predict`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct PredictRequest {
    pub params: TelemetrySnapshot,

    /// Odometer reading in km, as a number or numeric string
    #[serde(deserialize_with = "lenient::optional_number")]
    #[validate(range(min = 0.0, message = "Mileage must be a non-negative number"))]
    pub mileage: Option<f64>,

    pub context: ServiceHistory,
}

/// Flatten `validator` errors into a single client-facing message
fn collect_field_errors(validation_errors: &ValidationErrors) -> String {
    let mut error_messages: Vec<String> = validation_errors
        .field_errors()
        .iter()
        .map(|(field, errors)| {
            let msgs: Vec<&str> = errors
                .iter()
                .filter_map(|e| e.message.as_ref().map(|c| c.as_ref()))
                .collect();
            format!("{}: {}", field, msgs.join(", "))
        })
        .collect();
    error_messages.sort();
    error_messages.join("; ")
}

/// Split a diagnose body into telemetry and context.
///
/// Accepts `{params: {..}, context: {..}}` or a flat parameter map whose
/// optional `context` key is lifted out as the context.
pub fn parse_diagnose_request(body: Value) -> AppResult<DiagnoseRequest> {
    let Value::Object(mut body) = body else {
        return Err(AppError::ValidationError(
            "Request body must be a JSON object".to_string(),
        ));
    };

    let context = parse_context(body.remove(CONTEXT_KEY))?;

    let params: Map<String, Value> = match body.remove(PARAMS_KEY) {
        Some(Value::Object(params)) => params,
        None | Some(Value::Null) => body,
        Some(_) => {
            return Err(AppError::ValidationError(
                "params must be a JSON object".to_string(),
            ))
        }
    };

    Ok(DiagnoseRequest {
        telemetry: params.into_iter().collect(),
        context,
    })
}

fn parse_context(raw: Option<Value>) -> AppResult<DrivingContext> {
    match raw {
        None | Some(Value::Null) => Ok(DrivingContext::default()),
        Some(value) => serde_json::from_value(value).map_err(|e| {
            warn!(error = %e, "Driving context rejected");
            AppError::ValidationError(format!("Invalid driving context: {}", e))
        }),
    }
}

/// Reject a diagnose request with none of the canonical parameters
pub fn validate_diagnose_request(request: &DiagnoseRequest) -> AppResult<()> {
    let provided = request.telemetry.provided();
    if provided.is_empty() {
        warn!(
            keys = request.telemetry.len(),
            "Diagnose request carried no vehicle parameters"
        );
        return Err(AppError::NoParameters);
    }

    debug!(provided = ?provided, "Diagnose request validation passed");
    Ok(())
}

/// Validate a prediction request
pub fn validate_predict_request(request: &PredictRequest) -> AppResult<()> {
    if let Err(validation_errors) = request.validate() {
        let message = collect_field_errors(&validation_errors);
        warn!(errors = %message, "Predict request validation failed");
        return Err(AppError::ValidationError(message));
    }

    if request.mileage.map_or(false, |m| !m.is_finite()) {
        return Err(AppError::ValidationError(
            "Mileage must be a finite number".to_string(),
        ));
    }

    Ok(())
}

/// Validate a driving session summary
pub fn validate_driving_session(session: &DrivingSession) -> AppResult<()> {
    if let Err(validation_errors) = session.validate() {
        let message = collect_field_errors(&validation_errors);
        warn!(errors = %message, "Driving session validation failed");
        return Err(AppError::ValidationError(message));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{Parameter, TripType, Weather};
    use serde_json::json;

    #[test]
    fn test_nested_request() {
        let request = parse_diagnose_request(json!({
            "params": {"engineTemp": 110, "speed": "80"},
            "context": {"tripType": "Highway", "weather": "Storm"}
        }))
        .unwrap();

        assert_eq!(request.telemetry.len(), 2);
        assert_eq!(request.context.trip_type, Some(TripType::Highway));
        assert_eq!(request.context.weather, Some(Weather::Storm));
        assert!(validate_diagnose_request(&request).is_ok());
    }

    #[test]
    fn test_flat_request_lifts_context() {
        let request = parse_diagnose_request(json!({
            "rpm": 500,
            "note": "from the garage",
            "context": {"acOn": true, "gear": 4}
        }))
        .unwrap();

        assert_eq!(request.telemetry.len(), 2);
        assert_eq!(request.telemetry.reading(Parameter::Rpm), Some(500.0));
        assert_eq!(request.context.ac_on, Some(true));
        assert_eq!(request.context.gear, Some(4));
    }

    #[test]
    fn test_missing_context_defaults_to_empty() {
        let request = parse_diagnose_request(json!({"params": {"fuelLevel": 5}})).unwrap();
        assert_eq!(request.context, DrivingContext::default());
    }

    #[test]
    fn test_non_object_body_rejected() {
        let result = parse_diagnose_request(json!([1, 2, 3]));
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[test]
    fn test_ill_typed_context_rejected() {
        let result = parse_diagnose_request(json!({
            "params": {"speed": 50},
            "context": "highway"
        }));
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[test]
    fn test_ill_typed_context_labels_are_ignored() {
        let request = parse_diagnose_request(json!({
            "params": {"speed": 130},
            "context": {"weather": 5, "tripType": "Highway"}
        }))
        .unwrap();

        assert_eq!(request.context.weather, None);
        assert_eq!(request.context.trip_type, Some(TripType::Highway));
        assert!(validate_diagnose_request(&request).is_ok());

        let result = crate::detector::FaultDetector::default()
            .detect(&request.telemetry, Some(&request.context));
        assert_eq!(result.total_faults, 1);
    }

    #[test]
    fn test_predict_mileage_accepts_numeric_string() {
        let request: PredictRequest =
            serde_json::from_value(json!({"mileage": "60000"})).unwrap();
        assert_eq!(request.mileage, Some(60_000.0));
        assert!(validate_predict_request(&request).is_ok());

        let unreadable: PredictRequest =
            serde_json::from_value(json!({"mileage": "lots"})).unwrap();
        assert_eq!(unreadable.mileage, None);
    }

    #[test]
    fn test_no_canonical_parameters() {
        let request = parse_diagnose_request(json!({"speed": "", "coolant": 90})).unwrap();
        assert!(matches!(
            validate_diagnose_request(&request),
            Err(AppError::NoParameters)
        ));

        let empty = parse_diagnose_request(json!({})).unwrap();
        assert!(matches!(
            validate_diagnose_request(&empty),
            Err(AppError::NoParameters)
        ));
    }

    #[test]
    fn test_null_value_counts_as_provided() {
        let request = parse_diagnose_request(json!({"params": {"rpm": null}})).unwrap();
        assert!(validate_diagnose_request(&request).is_ok());
    }

    #[test]
    fn test_predict_request_validation() {
        let request: PredictRequest = serde_json::from_value(json!({
            "params": {"oilPressure": 20},
            "mileage": 42000,
            "context": {"lastServiceMileage": 40000}
        }))
        .unwrap();
        assert!(validate_predict_request(&request).is_ok());
        assert_eq!(request.context.last_service_mileage, Some(40_000.0));

        let negative: PredictRequest =
            serde_json::from_value(json!({"mileage": -1})).unwrap();
        let result = validate_predict_request(&negative);
        match result {
            Err(AppError::ValidationError(msg)) => assert!(msg.contains("mileage")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_driving_session_validation() {
        let session = DrivingSession {
            avg_speed: Some(65.0),
            max_speed: Some(500.0),
            ..Default::default()
        };
        let result = validate_driving_session(&session);
        match result {
            Err(AppError::ValidationError(msg)) => assert!(msg.contains("max_speed")),
            other => panic!("expected validation error, got {:?}", other),
        }

        assert!(validate_driving_session(&DrivingSession::default()).is_ok());
    }
}
