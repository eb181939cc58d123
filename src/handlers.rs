//! HTTP request handlers
//!
//! Implements REST API endpoints for the AutoPulse service.

use actix_web::{error::JsonPayloadError, web, HttpRequest, HttpResponse, Result};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::alerts::{alert_report, AnalyzeRequest};
use crate::config::Settings;
use crate::correlations::{CorrelationRule, CORRELATION_RULES};
use crate::detector::{FaultDetector, VerdictPolicy};
use crate::emergency::{emergency_assist, EmergencyRequest};
use crate::error::AppError;
use crate::models::HealthCheck;
use crate::predictor::predict_maintenance;
use crate::rules::{ParameterRule, PARAMETER_RULES};
use crate::safety::{calculate_safety_score, DrivingSession};
use crate::severity::{Severity, SeverityInfo};
use crate::state::AppState;
use crate::validation::{
    parse_diagnose_request, validate_diagnose_request, validate_driving_session,
    validate_predict_request, PredictRequest,
};

/// Configure all application routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // Health check
            .route("/health", web::get().to(health_check))
            // Fault detection
            .route("/diagnose", web::post().to(diagnose))
            .route("/diagnose/rules", web::get().to(get_rule_catalogue))
            // Maintenance and driving
            .route("/predict", web::post().to(predict))
            .route("/safety-score", web::post().to(safety_score))
            // Guardian alerts and roadside help
            .route("/alerts/analyze", web::post().to(analyze_alerts))
            .route("/emergency", web::post().to(emergency)),
    );
}

/// JSON extractor settings: malformed bodies become standard error responses
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, _req| {
        warn!(error = %err, "Rejected malformed JSON body");
        AppError::BadRequest(err.to_string()).into()
    })
}

/// Health check endpoint
///
/// GET /api/health
///
/// Returns service status including uptime and diagnosis counters.
pub async fn health_check(
    state: web::Data<Arc<RwLock<AppState>>>,
) -> Result<HttpResponse, AppError> {
    let state = state.read().await;

    let health = HealthCheck {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        uptime_seconds: state.uptime_seconds(),
        diagnoses_served: state.diagnoses_served(),
        last_diagnosis: state.last_diagnosis(),
    };

    Ok(HttpResponse::Ok().json(health))
}

/// Run fault detection
///
/// POST /api/diagnose
///
/// Accepts `{params, context}` or a flat parameter map.
pub async fn diagnose(
    state: web::Data<Arc<RwLock<AppState>>>,
    detector: web::Data<FaultDetector>,
    body: web::Json<Value>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let correlation_id = extract_correlation_id(&req);

    info!(
        correlation_id = %correlation_id,
        "Received diagnosis request"
    );

    let request = parse_diagnose_request(body.into_inner())?;
    validate_diagnose_request(&request)?;

    let result = detector.detect(&request.telemetry, Some(&request.context));

    {
        let mut state = state.write().await;
        state.record_diagnosis(result.timestamp);
    }

    info!(
        correlation_id = %correlation_id,
        total_faults = result.total_faults,
        overall_status = ?result.overall_status,
        "Diagnosis served"
    );

    Ok(HttpResponse::Ok().json(result))
}

/// Rule catalogue returned for auditing
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RuleCatalogue {
    verdict_policy: VerdictPolicy,
    severity_levels: Vec<SeverityInfo>,
    parameter_rules: &'static [ParameterRule],
    correlation_rules: &'static [CorrelationRule],
}

/// List the active rule tables
///
/// GET /api/diagnose/rules
pub async fn get_rule_catalogue(
    detector: web::Data<FaultDetector>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(RuleCatalogue {
        verdict_policy: detector.policy(),
        severity_levels: Severity::ALL.into_iter().map(SeverityInfo::from).collect(),
        parameter_rules: PARAMETER_RULES,
        correlation_rules: CORRELATION_RULES,
    }))
}

/// Forecast maintenance
///
/// POST /api/predict
pub async fn predict(
    settings: web::Data<Settings>,
    body: web::Json<PredictRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let correlation_id = extract_correlation_id(&req);
    let request = body.into_inner();
    validate_predict_request(&request)?;

    // Whole kilometres only
    let mileage = request
        .mileage
        .unwrap_or(settings.diagnosis.default_mileage_km)
        .trunc();

    let forecast = predict_maintenance(&request.params, mileage, &request.context, Utc::now());

    info!(
        correlation_id = %correlation_id,
        mileage,
        next_action = forecast.next_action.as_ref().map(|p| p.id),
        "Maintenance forecast served"
    );

    Ok(HttpResponse::Ok().json(forecast))
}

/// Score a driving session
///
/// POST /api/safety-score
pub async fn safety_score(
    body: web::Json<DrivingSession>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let correlation_id = extract_correlation_id(&req);
    let session = body.into_inner();
    validate_driving_session(&session)?;

    let report = calculate_safety_score(&session);

    info!(
        correlation_id = %correlation_id,
        score = report.score,
        grade = report.grade,
        "Safety score served"
    );

    Ok(HttpResponse::Ok().json(report))
}

/// Run the Guardian alert matrix
///
/// POST /api/alerts/analyze
pub async fn analyze_alerts(
    body: web::Json<AnalyzeRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let correlation_id = extract_correlation_id(&req);
    let request = body.into_inner();

    let Some(telemetry) = request.telemetry else {
        warn!(correlation_id = %correlation_id, "Alert analysis without telemetry");
        return Err(AppError::ValidationError(
            "telemetry is required".to_string(),
        ));
    };
    let config = request.config.unwrap_or_default();

    let report = alert_report(&telemetry, &config, Utc::now());

    info!(
        correlation_id = %correlation_id,
        alerts = report.alerts.len(),
        max_speed = config.max_speed(),
        "Alert analysis served"
    );

    Ok(HttpResponse::Ok().json(report))
}

/// Roadside emergency assistance
///
/// POST /api/emergency
pub async fn emergency(
    body: web::Json<EmergencyRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let correlation_id = extract_correlation_id(&req);
    let response = emergency_assist(&body.into_inner(), Utc::now());

    info!(
        correlation_id = %correlation_id,
        emergency_type = %response.emergency_type,
        "Emergency protocol served"
    );

    Ok(HttpResponse::Ok().json(response))
}

/// Extract or generate correlation ID from request headers
fn extract_correlation_id(req: &HttpRequest) -> String {
    req.headers()
        .get("X-Correlation-ID")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
