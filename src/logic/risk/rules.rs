//! Risk Classification Rules & Thresholds
//!
//! Định nghĩa các threshold cho phân loại risk.
//! KHÔNG chứa logic classify - chỉ constants và config.

use serde::{Deserialize, Serialize};

use super::types::{RhythmClass, RiskLevel};
use crate::logic::error::{InferenceError, Result};

// ============================================================================
// SCORE THRESHOLDS
// ============================================================================

/// Below this score = Low
pub const LOW_RISK_MAX: f64 = 0.30;

/// Below this score = Medium, at or above = High
pub const MEDIUM_RISK_MAX: f64 = 0.60;

/// Recommendation lists are cut to this length
pub const MAX_RECOMMENDATIONS: usize = 6;

/// Score bands for the cardio regression output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub low_max: f64,
    pub medium_max: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            low_max: LOW_RISK_MAX,
            medium_max: MEDIUM_RISK_MAX,
        }
    }
}

impl RiskThresholds {
    pub fn new(low_max: f64, medium_max: f64) -> Result<Self> {
        let thresholds = Self { low_max, medium_max };
        thresholds.validate()?;
        Ok(thresholds)
    }

    /// `0 <= low_max < medium_max <= 1`
    pub fn validate(&self) -> Result<()> {
        let ordered = self.low_max.is_finite()
            && self.medium_max.is_finite()
            && 0.0 <= self.low_max
            && self.low_max < self.medium_max
            && self.medium_max <= 1.0;
        if !ordered {
            return Err(InferenceError::InvalidInput(format!(
                "risk thresholds must satisfy 0 <= low_max < medium_max <= 1, got {} / {}",
                self.low_max, self.medium_max
            )));
        }
        Ok(())
    }

    /// Lower bands, more High results
    pub fn high_sensitivity() -> Self {
        Self {
            low_max: 0.2,
            medium_max: 0.5,
        }
    }

    /// Higher bands, fewer High results
    pub fn low_sensitivity() -> Self {
        Self {
            low_max: 0.4,
            medium_max: 0.7,
        }
    }

    pub fn level_for(&self, score: f64) -> RiskLevel {
        if score < self.low_max {
            RiskLevel::Low
        } else if score < self.medium_max {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }
}

// ============================================================================
// RHYTHM RULES
// ============================================================================

/// Confidence cut-offs that decide the risk of each rhythm class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RhythmRiskRules {
    /// Normal above this = Low, else Medium
    pub normal_low_min: f64,
    /// Supraventricular above this = Medium, else High
    pub supraventricular_medium_min: f64,
    /// Fusion above this = Medium, else High
    pub fusion_medium_min: f64,
}

impl Default for RhythmRiskRules {
    fn default() -> Self {
        Self {
            normal_low_min: 0.8,
            supraventricular_medium_min: 0.7,
            fusion_medium_min: 0.6,
        }
    }
}

impl RhythmRiskRules {
    pub fn level_for(&self, class: RhythmClass, confidence: f64) -> RiskLevel {
        match class {
            RhythmClass::Normal if confidence > self.normal_low_min => RiskLevel::Low,
            RhythmClass::Normal => RiskLevel::Medium,
            RhythmClass::Supraventricular if confidence > self.supraventricular_medium_min => {
                RiskLevel::Medium
            }
            RhythmClass::Supraventricular => RiskLevel::High,
            RhythmClass::Ventricular => RiskLevel::High,
            RhythmClass::Fusion if confidence > self.fusion_medium_min => RiskLevel::Medium,
            RhythmClass::Fusion => RiskLevel::High,
            RhythmClass::Unknown => RiskLevel::Medium,
        }
    }
}

// ============================================================================
// RISK FACTOR THRESHOLDS
// ============================================================================

/// Cut-offs for naming individual risk factors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorThresholds {
    /// years
    pub advanced_age: f64,
    pub obesity_bmi: f64,
    pub overweight_bmi: f64,
    /// mmHg
    pub systolic_high: f64,
    /// mmHg
    pub diastolic_high: f64,
    /// Category above this counts as elevated (1..3 scale)
    pub elevated_category: u8,
    /// Male sex counts as a factor above this age
    pub male_age: f64,
}

impl Default for FactorThresholds {
    fn default() -> Self {
        Self {
            advanced_age: 60.0,
            obesity_bmi: 30.0,
            overweight_bmi: 25.0,
            systolic_high: 140.0,
            diastolic_high: 90.0,
            elevated_category: 2,
            male_age: 45.0,
        }
    }
}

// ============================================================================
// TEXT
// ============================================================================

pub mod factor {
    pub const ADVANCED_AGE: &str = "Advanced age";
    pub const OBESITY: &str = "Obesity";
    pub const OVERWEIGHT: &str = "Overweight";
    pub const HIGH_SYSTOLIC: &str = "High systolic blood pressure";
    pub const HIGH_DIASTOLIC: &str = "High diastolic blood pressure";
    pub const SMOKING: &str = "Smoking";
    pub const ALCOHOL: &str = "Alcohol use";
    pub const SEDENTARY: &str = "Sedentary lifestyle";
    pub const HIGH_CHOLESTEROL: &str = "High cholesterol";
    pub const HIGH_GLUCOSE: &str = "High blood glucose";
    pub const MALE_WITH_AGE: &str = "Male sex with age";
}
