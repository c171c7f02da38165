//! Engine Configuration
//!
//! `EngineConfig`: thresholds, calibration bands, fallback confidence (JSON, serde).
//! `SafetyConfig`: kill-switch toàn cục cho analytic fallback.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::logic::error::{InferenceError, Result};
use crate::logic::fusion::FusionResolver;
use crate::logic::model::calibration::{CalibrationConfig, CardioConfidence};
use crate::logic::risk::classifier::RiskClassifier;

// ============================================================================
// SAFETY CONFIG (Kill-switches)
// ============================================================================

// Default state: fallback enabled
static FALLBACK_ENABLED: AtomicBool = AtomicBool::new(true);

/// Serializes tests that read or flip the switch
#[cfg(test)]
pub(crate) static FALLBACK_SWITCH_GUARD: parking_lot::Mutex<()> = parking_lot::const_mutex(());

pub struct SafetyConfig;

impl SafetyConfig {
    pub fn is_fallback_enabled() -> bool {
        FALLBACK_ENABLED.load(Ordering::Relaxed)
    }

    // Setter (e.g. from host startup or a test harness)
    pub fn set_fallback(val: bool) {
        FALLBACK_ENABLED.store(val, Ordering::Relaxed);
    }
}

// ============================================================================
// ENGINE CONFIG
// ============================================================================

/// Confidence attached to analytic cardio fallback results
pub const DEFAULT_FALLBACK_CONFIDENCE: f64 = 0.6;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub classifier: RiskClassifier,
    pub calibration: CalibrationConfig,
    pub cardio_confidence: CardioConfidence,
    pub fallback_confidence: f64,
    /// Synthetic defaults for fields with no real data
    pub fusion: FusionResolver,
    /// Directory with `cardio_weights.json` / `ecg_weights.json`
    pub model_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            classifier: RiskClassifier::default(),
            calibration: CalibrationConfig::default(),
            cardio_confidence: CardioConfidence::default(),
            fallback_confidence: DEFAULT_FALLBACK_CONFIDENCE,
            fusion: FusionResolver::default(),
            model_dir: None,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Engine config loaded from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.classifier.thresholds.validate()?;

        let c = &self.calibration;
        if !(0.0 < c.min_confidence && c.min_confidence <= c.max_confidence && c.max_confidence <= 1.0) {
            return Err(InferenceError::InvalidInput(format!(
                "calibration bounds must satisfy 0 < min <= max <= 1, got {} / {}",
                c.min_confidence, c.max_confidence
            )));
        }
        // fallback results share the calibrated confidence band
        if !(c.min_confidence..=c.max_confidence).contains(&self.fallback_confidence) {
            return Err(InferenceError::InvalidInput(format!(
                "fallback_confidence must be in [{}, {}], got {}",
                c.min_confidence, c.max_confidence, self.fallback_confidence
            )));
        }
        if self.classifier.max_recommendations == 0 {
            return Err(InferenceError::InvalidInput(
                "max_recommendations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
