//! Confidence Calibrator
//!
//! Chuyển max probability thành confidence "thực tế" hơn:
//! phạt xác suất quá cao, phạt entropy cao, clamp vào [0.5, 0.95].

use serde::{Deserialize, Serialize};

// ============================================================================
// CONFIG
// ============================================================================

/// Calibration bands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Above this max probability the strongest damping applies
    pub extreme_threshold: f64,
    pub extreme_base: f64,
    pub extreme_margin_weight: f64,

    /// Above this max probability the mild damping applies
    pub high_threshold: f64,
    pub high_base: f64,
    pub high_margin_weight: f64,

    /// Multiplier on normalized entropy
    pub entropy_penalty: f64,

    pub min_confidence: f64,
    pub max_confidence: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            extreme_threshold: 0.99,
            extreme_base: 0.85,
            extreme_margin_weight: 0.15,
            high_threshold: 0.95,
            high_base: 0.90,
            high_margin_weight: 0.10,
            entropy_penalty: 0.2,
            min_confidence: 0.5,
            max_confidence: 0.95,
        }
    }
}

/// How the cardio regression output gets its confidence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardioConfidence {
    /// Constant value reported by the deployed model
    Fixed(f64),
    /// Calibrate `[p, 1 - p]` like a two-class distribution
    Binary,
}

impl Default for CardioConfidence {
    fn default() -> Self {
        CardioConfidence::Fixed(0.92)
    }
}

// ============================================================================
// RESULT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub confidence: f64,
    pub raw_max: f64,
    /// Shannon entropy, bits
    pub entropy: f64,
    /// entropy / log2(n), 0 when n <= 1
    pub normalized_entropy: f64,
    /// top1 - top2
    pub margin: f64,
    pub adjustment: f64,
}

// ============================================================================
// CALIBRATE
// ============================================================================

pub fn entropy_bits(probabilities: &[f64]) -> f64 {
    -probabilities
        .iter()
        .filter(|p| **p > 0.0)
        .map(|p| p * p.log2())
        .sum::<f64>()
}

/// Pure, deterministic confidence for a probability distribution
pub fn calibrate(probabilities: &[f64], config: &CalibrationConfig) -> Calibration {
    let n = probabilities.len();
    let entropy = entropy_bits(probabilities);
    let normalized_entropy = if n > 1 { entropy / (n as f64).log2() } else { 0.0 };

    let mut sorted = probabilities.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));
    let raw_max = sorted.first().copied().unwrap_or(0.0);
    let second = sorted.get(1).copied().unwrap_or(0.0);
    let margin = raw_max - second;

    let adjustment = if raw_max > config.extreme_threshold {
        config.extreme_base + config.extreme_margin_weight * margin
    } else if raw_max > config.high_threshold {
        config.high_base + config.high_margin_weight * margin
    } else {
        1.0
    };

    let confidence = (raw_max * adjustment * (1.0 - normalized_entropy * config.entropy_penalty))
        .clamp(config.min_confidence, config.max_confidence);

    Calibration {
        confidence,
        raw_max,
        entropy,
        normalized_entropy,
        margin,
        adjustment,
    }
}

/// Confidence for a sigmoid regression output
pub fn cardio_confidence(probability: f64, mode: CardioConfidence, config: &CalibrationConfig) -> f64 {
    match mode {
        CardioConfidence::Fixed(value) => value.clamp(config.min_confidence, config.max_confidence),
        CardioConfidence::Binary => calibrate(&[probability, 1.0 - probability], config).confidence,
    }
}
