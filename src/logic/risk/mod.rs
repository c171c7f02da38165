//! Risk Module - Rule Engine
//!
//! Thresholds, risk factors, recommendations và combined assessment.
//! Không có learned weights.

pub mod assessment;
pub mod classifier;
pub mod rules;
pub mod types;

// Re-export common types
pub use assessment::{assess_health, HealthAssessment, RiskTrend, Trend};
pub use classifier::RiskClassifier;
pub use rules::{FactorThresholds, RhythmRiskRules, RiskThresholds};
pub use types::{ClassProbability, ClassificationResult, RhythmClass, RiskLevel, RiskResult};
