//! Health Risk Core - CLI host
//!
//! `health-risk-core check <request.json>` chạy health check và in JSON report.
//! `health-risk-core status` in trạng thái engine.

use std::path::Path;

use health_risk_core::api::{self, commands};
use health_risk_core::constants;
use health_risk_core::logic::bundle::{registry, ModelKind};
use health_risk_core::logic::config::{EngineConfig, SafetyConfig};
use health_risk_core::Result;

fn usage() {
    eprintln!("{} v{}", constants::APP_NAME, constants::APP_VERSION);
    eprintln!("Usage:");
    eprintln!("  health-risk-core check <request.json>");
    eprintln!("  health-risk-core status");
}

fn load_config() -> Result<EngineConfig> {
    match constants::get_config_path() {
        Some(path) => EngineConfig::load(path),
        None => Ok(EngineConfig::default()),
    }
}

/// Missing models are not fatal: inference falls back and says so.
fn load_models(config: &EngineConfig) {
    let dir = constants::get_model_dir(config.model_dir.as_ref());
    for kind in [ModelKind::Cardio, ModelKind::Ecg] {
        match commands::install_from_dir(registry::global(), kind, &dir) {
            Ok(()) => log::info!("{} model loaded from {}", kind, dir.display()),
            Err(e) => log::warn!("{} model not loaded: {} - fallback will be used", kind, e),
        }
    }
}

fn run_check(path: &Path, config: &EngineConfig) -> Result<String> {
    let json = std::fs::read_to_string(path)?;
    let request: commands::HealthCheckRequest = serde_json::from_str(&json)?;
    let report = commands::run_health_check(registry::global(), &request, config)?;
    Ok(serde_json::to_string_pretty(&report)?)
}

fn run() -> Result<bool> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let config = load_config()?;
    SafetyConfig::set_fallback(constants::is_fallback_enabled());
    load_models(&config);

    let output = match args.first().map(String::as_str) {
        Some("check") => match args.get(1) {
            Some(path) => run_check(Path::new(path), &config)?,
            None => {
                usage();
                return Ok(false);
            }
        },
        Some("status") => serde_json::to_string_pretty(&api::get_status(registry::global()))?,
        _ => {
            usage();
            return Ok(false);
        }
    };

    println!("{}", output);
    Ok(true)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting {} v{}...", constants::APP_NAME, constants::APP_VERSION);

    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    }
}
