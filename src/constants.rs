//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! Env vars override, file config (`EngineConfig`) refines.

use std::path::PathBuf;

/// Model directory used when nothing else is configured
pub const DEFAULT_MODEL_DIR: &str = "models";

/// Sub-directory under the platform data dir
pub const DATA_DIR_NAME: &str = "health-risk-core";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Health Risk Core";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get model directory from environment, config, platform data dir, or `./models`
pub fn get_model_dir(configured: Option<&PathBuf>) -> PathBuf {
    if let Ok(dir) = std::env::var("HEALTH_MODEL_DIR") {
        return PathBuf::from(dir);
    }
    if let Some(dir) = configured {
        return dir.clone();
    }

    let local = PathBuf::from(DEFAULT_MODEL_DIR);
    if local.is_dir() {
        return local;
    }
    dirs::data_dir()
        .map(|d| d.join(DATA_DIR_NAME).join(DEFAULT_MODEL_DIR))
        .unwrap_or(local)
}

/// Get engine config path from environment
pub fn get_config_path() -> Option<PathBuf> {
    std::env::var("HEALTH_ENGINE_CONFIG").ok().map(PathBuf::from)
}

/// Check if the analytic fallback is enabled
pub fn is_fallback_enabled() -> bool {
    std::env::var("HEALTH_FALLBACK_ENABLED")
        .map(|s| s.to_lowercase() != "false" && s != "0")
        .unwrap_or(true)
}
