//! Synthetic Fallback Data
//!
//! Giá trị mặc định khi không có dữ liệu thật, và tín hiệu ECG tổng hợp
//! (seeded, reproducible). Luôn được tag low-trust.

use std::f64::consts::TAU;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::types::HealthField;
use crate::logic::error::Result;
use crate::logic::features::vector::GENDER_MALE;
use crate::logic::features::SignalBuffer;

/// Default synthetic ECG length (samples)
pub const DEFAULT_SYNTHETIC_LENGTH: usize = 180;

// ============================================================================
// DEFAULT PROFILE VALUES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticDefaults {
    pub age: f64,
    pub gender: f64,
    pub height: f64,
    pub weight: f64,
    pub systolic_bp: f64,
    pub diastolic_bp: f64,
    pub cholesterol: f64,
    pub glucose: f64,
    pub heart_rate: f64,
    pub smoking: bool,
    pub alcohol: bool,
    pub active: bool,
}

impl Default for SyntheticDefaults {
    fn default() -> Self {
        Self {
            age: 30.0,
            gender: f64::from(GENDER_MALE),
            height: 170.0,
            weight: 70.0,
            systolic_bp: 120.0,
            diastolic_bp: 80.0,
            cholesterol: 1.0,
            glucose: 1.0,
            heart_rate: 72.0,
            smoking: false,
            alcohol: false,
            active: false,
        }
    }
}

fn flag(v: bool) -> f64 {
    if v {
        1.0
    } else {
        0.0
    }
}

impl SyntheticDefaults {
    pub fn value_for(&self, field: HealthField) -> f64 {
        match field {
            HealthField::Age => self.age,
            HealthField::Gender => self.gender,
            HealthField::Height => self.height,
            HealthField::Weight => self.weight,
            HealthField::SystolicBp => self.systolic_bp,
            HealthField::DiastolicBp => self.diastolic_bp,
            HealthField::Cholesterol => self.cholesterol,
            HealthField::Glucose => self.glucose,
            HealthField::HeartRate => self.heart_rate,
            HealthField::Smoking => flag(self.smoking),
            HealthField::Alcohol => flag(self.alcohol),
            HealthField::Active => flag(self.active),
        }
    }
}

// ============================================================================
// SYNTHETIC ECG
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyntheticPattern {
    Normal,
    Arrhythmia,
}

/// Sine-based waveform with seeded noise. Same seed, same samples.
pub fn synthetic_ecg(pattern: SyntheticPattern, length: usize, seed: u64) -> Result<SignalBuffer> {
    let mut rng = StdRng::seed_from_u64(seed);

    let samples = (0..length)
        .map(|i| {
            let t = i as f64 / length as f64 * TAU;
            let noise: f64 = rng.gen();
            match pattern {
                SyntheticPattern::Normal => t.sin() + 0.3 * (3.0 * t).sin() + 0.1 * noise,
                SyntheticPattern::Arrhythmia => 0.8 * t.sin() + 0.5 * (7.0 * t).sin() + 0.2 * noise,
            }
        })
        .collect();

    log::debug!("Synthetic ECG generated: {:?}, {} samples, seed={}", pattern, length, seed);
    SignalBuffer::new(samples)
}
