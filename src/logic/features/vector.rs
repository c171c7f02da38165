//! Feature Vector - Cardio model input
//!
//! **Versioned feature vector with layout validation**
//!
//! `CardioInput` là profile thô (tuổi, huyết áp, ...).
//! `FeatureVector` là 16 features đã engineer theo `layout.rs`.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::layout::{feature_index, feature_names, layout_hash, CARDIO_FEATURES, FEATURE_COUNT, FEATURE_VERSION};
use crate::logic::error::{InferenceError, Result};

pub const GENDER_FEMALE: u8 = 1;
pub const GENDER_MALE: u8 = 2;

// ============================================================================
// CARDIO INPUT (raw profile)
// ============================================================================

/// Raw cardiovascular profile before feature engineering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardioInput {
    /// Age in years
    pub age_years: f64,
    /// 1 = female, 2 = male
    pub gender: u8,
    /// cm
    pub height_cm: f64,
    /// kg
    pub weight_kg: f64,
    pub systolic_bp: f64,
    pub diastolic_bp: f64,
    /// 1 normal, 2 above normal, 3 well above normal
    pub cholesterol: u8,
    /// 1 normal, 2 above normal, 3 well above normal
    pub glucose: u8,
    pub smoking: bool,
    pub alcohol: bool,
    pub physically_active: bool,
}

impl Default for CardioInput {
    fn default() -> Self {
        Self {
            age_years: 30.0,
            gender: GENDER_MALE,
            height_cm: 170.0,
            weight_kg: 70.0,
            systolic_bp: 120.0,
            diastolic_bp: 80.0,
            cholesterol: 1,
            glucose: 1,
            smoking: false,
            alcohol: false,
            physically_active: false,
        }
    }
}

impl CardioInput {
    pub fn bmi(&self) -> f64 {
        let height_m = self.height_cm / 100.0;
        self.weight_kg / (height_m * height_m)
    }

    pub fn is_male(&self) -> bool {
        self.gender == GENDER_MALE
    }

    /// Reject values the feature engineering cannot handle
    pub fn validate(&self) -> Result<()> {
        let numeric = [
            ("age_years", self.age_years),
            ("height_cm", self.height_cm),
            ("weight_kg", self.weight_kg),
            ("systolic_bp", self.systolic_bp),
            ("diastolic_bp", self.diastolic_bp),
        ];
        for (name, value) in numeric {
            if !value.is_finite() || value < 0.0 {
                return Err(InferenceError::InvalidInput(format!(
                    "{} must be a finite non-negative number, got {}",
                    name, value
                )));
            }
        }
        if self.height_cm <= 0.0 {
            return Err(InferenceError::InvalidInput("height_cm must be > 0".to_string()));
        }
        if self.gender != GENDER_FEMALE && self.gender != GENDER_MALE {
            return Err(InferenceError::InvalidInput(format!(
                "gender code must be 1 or 2, got {}",
                self.gender
            )));
        }
        for (name, category) in [("cholesterol", self.cholesterol), ("glucose", self.glucose)] {
            if !(1..=3).contains(&category) {
                return Err(InferenceError::InvalidInput(format!(
                    "{} category must be 1..=3, got {}",
                    name, category
                )));
            }
        }
        Ok(())
    }
}

fn check_finite(values: &[f64; FEATURE_COUNT]) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(bad) => Err(InferenceError::InvalidInput(format!(
            "feature '{}' is not finite",
            CARDIO_FEATURES[bad].name
        ))),
        None => Ok(()),
    }
}

// ============================================================================
// VERSIONED FEATURE VECTOR
// ============================================================================

/// Versioned cardio feature vector. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Feature layout version
    pub version: u8,
    /// CRC32 hash of the feature layout
    pub layout_hash: u32,
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    /// Engineer the 16 model features from a raw profile
    pub fn from_input(input: &CardioInput) -> Result<Self> {
        input.validate()?;

        let smoke = if input.smoking { 1.0 } else { 0.0 };
        let alco = if input.alcohol { 1.0 } else { 0.0 };
        let active = if input.physically_active { 1.0 } else { 0.0 };
        let cholesterol = f64::from(input.cholesterol);
        let gluc = f64::from(input.glucose);

        let values = [
            input.age_years * 365.25,
            f64::from(input.gender),
            input.height_cm,
            input.weight_kg,
            input.systolic_bp,
            input.diastolic_bp,
            cholesterol,
            gluc,
            smoke,
            alco,
            active,
            input.bmi(),
            input.age_years,
            input.systolic_bp * input.diastolic_bp / 100.0,
            smoke + alco + (1.0 - active),
            cholesterol + gluc,
        ];

        // finite raw inputs can still overflow once engineered
        check_finite(&values)?;
        Ok(Self::from_values(values))
    }

    pub fn from_values(values: [f64; FEATURE_COUNT]) -> Self {
        Self {
            version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            values,
        }
    }

    /// Build from a slice. Wrong length is a shape error, never padded.
    pub fn from_slice(values: &[f64]) -> Result<Self> {
        let array: [f64; FEATURE_COUNT] = values
            .try_into()
            .map_err(|_| InferenceError::shape("cardio feature vector", FEATURE_COUNT, values.len()))?;
        check_finite(&array)?;
        Ok(Self::from_values(array))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    pub fn get_by_name(&self, name: &str) -> Option<f64> {
        feature_index(name).and_then(|i| self.get(i))
    }

    pub fn to_array(&self) -> Array1<f64> {
        Array1::from(self.values.to_vec())
    }

    /// Recover the raw profile the rule engine reads (factors, recommendations)
    pub fn to_input(&self) -> CardioInput {
        let v = &self.values;
        let category = |x: f64| x.round().clamp(0.0, u8::MAX as f64) as u8;
        CardioInput {
            age_years: v[12],
            gender: category(v[1]),
            height_cm: v[2],
            weight_kg: v[3],
            systolic_bp: v[4],
            diastolic_bp: v[5],
            cholesterol: category(v[6]),
            glucose: category(v[7]),
            smoking: v[8] >= 0.5,
            alcohol: v[9] >= 0.5,
            physically_active: v[10] >= 0.5,
        }
    }

    /// Check the vector was built against the current layout
    pub fn is_compatible(&self) -> bool {
        self.version == FEATURE_VERSION && self.layout_hash == layout_hash()
    }

    /// Convert to JSON for debug logging
    pub fn to_log_entry(&self) -> serde_json::Value {
        serde_json::json!({
            "feature_version": self.version,
            "layout_hash": self.layout_hash,
            "named_values": feature_names()
                .zip(self.values.iter())
                .map(|(name, value)| (name.to_string(), *value))
                .collect::<std::collections::BTreeMap<_, _>>(),
        })
    }
}
