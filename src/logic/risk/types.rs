//! Risk Types
//!
//! Core types cho risk classification.
//! KHÔNG chứa logic - chỉ data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::logic::features::ecg::SignalFeatures;

pub const METHOD_MODEL: &str = "model";
pub const METHOD_FALLBACK: &str = "fallback";

// ============================================================================
// RISK LEVEL
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            RiskLevel::Low => "#10b981",    // Green
            RiskLevel::Medium => "#f59e0b", // Yellow
            RiskLevel::High => "#ef4444",   // Red
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// RHYTHM CLASS
// ============================================================================

/// MIT-BIH heartbeat categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RhythmClass {
    Normal,
    Supraventricular,
    Ventricular,
    Fusion,
    Unknown,
}

impl RhythmClass {
    pub const ALL: [RhythmClass; 5] = [
        RhythmClass::Normal,
        RhythmClass::Supraventricular,
        RhythmClass::Ventricular,
        RhythmClass::Fusion,
        RhythmClass::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RhythmClass::Normal => "Normal",
            RhythmClass::Supraventricular => "Supraventricular",
            RhythmClass::Ventricular => "Ventricular",
            RhythmClass::Fusion => "Fusion",
            RhythmClass::Unknown => "Unknown",
        }
    }

    /// Map a bundle label. Unrecognized labels map to `Unknown`.
    pub fn from_label(label: &str) -> Self {
        let lower = label.trim().to_ascii_lowercase();
        match lower.as_str() {
            "normal" | "n" => RhythmClass::Normal,
            "supraventricular" | "s" => RhythmClass::Supraventricular,
            "ventricular" | "v" => RhythmClass::Ventricular,
            "fusion" | "f" => RhythmClass::Fusion,
            _ => RhythmClass::Unknown,
        }
    }
}

impl std::fmt::Display for RhythmClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// RESULTS
// ============================================================================

/// Cardiovascular risk output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskResult {
    pub id: Uuid,
    /// 0.0 - 1.0
    pub risk_score: f64,
    /// 0 - 100, rounded
    pub risk_percentage: u8,
    pub risk_level: RiskLevel,
    /// 0.5 - 0.95
    pub confidence: f64,
    pub risk_factors: Vec<String>,
    pub recommendations: Vec<String>,
    pub used_fallback: bool,
    /// "model" or "fallback"
    pub method: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassProbability {
    pub label: String,
    pub probability: f64,
}

/// ECG rhythm output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub id: Uuid,
    pub predicted_index: usize,
    pub predicted_class: RhythmClass,
    pub class_label: String,
    /// Class order of the bundle, sums to 1
    pub probabilities: Vec<ClassProbability>,
    pub confidence: f64,
    pub risk_level: RiskLevel,
    /// 0.0 - 1.0, from signal morphology
    pub anomaly_score: f64,
    pub recommendations: Vec<String>,
    pub signal_features: SignalFeatures,
    pub used_fallback: bool,
    pub method: String,
    pub created_at: DateTime<Utc>,
}

impl ClassificationResult {
    pub fn probability_of(&self, label: &str) -> Option<f64> {
        self.probabilities
            .iter()
            .find(|p| p.label == label)
            .map(|p| p.probability)
    }
}
