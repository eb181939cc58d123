//! AutoPulse diagnostics service
//!
//! Rule-based fault detection over vehicle telemetry, with context-aware
//! prioritization, maintenance forecasting and drive safety scoring.
//!
//! ⚠️ DISCLAIMER:
//! Advisory output only. This system does not replace a qualified mechanic.

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod alerts;
mod config;
mod correlations;
mod detector;
mod emergency;
mod error;
mod handlers;
mod models;
mod predictor;
mod priority;
mod rules;
mod safety;
mod severity;
mod state;
mod telemetry;
mod validation;

use crate::config::Settings;
use crate::detector::FaultDetector;
use crate::state::AppState;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenv::dotenv().ok();

    // Logging
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,autopulse=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().json())
        .init();

    // Load configuration
    let settings = Settings::from_env().context("Failed to load configuration")?;
    let bind_address = format!("{}:{}", settings.server.host, settings.server.port);

    info!("Starting AutoPulse backend");
    info!(
        verdict_policy = ?settings.diagnosis.verdict_policy,
        default_mileage_km = settings.diagnosis.default_mileage_km,
        "Diagnosis engine configured"
    );
    info!("Binding server to {}", bind_address);

    // Shared service statistics
    let app_state = Arc::new(RwLock::new(AppState::new()));
    let detector = web::Data::new(FaultDetector::new(settings.diagnosis.verdict_policy));
    let settings = web::Data::new(settings);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(detector.clone())
            .app_data(settings.clone())
            .app_data(handlers::json_config())
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(handlers::configure_routes)
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run()
    .await
    .context("HTTP server terminated with an error")?;

    Ok(())
}
