//! Feature Normalizer
//!
//! Chuẩn hoá features bằng mean/scale đã fit lúc training.
//! Pure functions, không giữ state.

use ndarray::Array1;
use serde::Serialize;

use crate::logic::error::{InferenceError, Result};

// ============================================================================
// SCALER
// ============================================================================

/// Per-feature standardization parameters exported with the weights
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl Scaler {
    /// Zero or non-finite scale entries are rejected here, never at evaluation.
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self> {
        if mean.is_empty() {
            return Err(InferenceError::ModelLoad("scaler mean is empty".to_string()));
        }
        if mean.len() != scale.len() {
            return Err(InferenceError::ModelLoad(format!(
                "scaler mean has {} entries but scale has {}",
                mean.len(),
                scale.len()
            )));
        }
        if let Some(i) = mean.iter().position(|m| !m.is_finite()) {
            return Err(InferenceError::ModelLoad(format!(
                "scaler mean[{}] is not finite",
                i
            )));
        }
        if let Some(i) = scale.iter().position(|s| !s.is_finite() || *s == 0.0) {
            return Err(InferenceError::ModelLoad(format!(
                "scaler scale[{}] = {} (must be finite and non-zero)",
                i, scale[i]
            )));
        }
        Ok(Self { mean, scale })
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }
}

// ============================================================================
// VECTOR NORMALIZATION
// ============================================================================

/// `(raw[i] - mean[i]) / scale[i]`
pub fn normalize(values: &[f64], scaler: &Scaler) -> Result<Array1<f64>> {
    if values.len() != scaler.len() {
        return Err(InferenceError::shape("scaler", scaler.len(), values.len()));
    }

    Ok(values
        .iter()
        .zip(scaler.mean.iter().zip(scaler.scale.iter()))
        .map(|(x, (m, s))| (x - m) / s)
        .collect())
}

/// Inverse of `normalize`: `x * scale[i] + mean[i]`
pub fn denormalize(values: &[f64], scaler: &Scaler) -> Result<Array1<f64>> {
    if values.len() != scaler.len() {
        return Err(InferenceError::shape("scaler", scaler.len(), values.len()));
    }

    Ok(values
        .iter()
        .zip(scaler.mean.iter().zip(scaler.scale.iter()))
        .map(|(x, (m, s))| x * s + m)
        .collect())
}

// ============================================================================
// SIGNAL NORMALIZATION
// ============================================================================

/// Below this std the buffer is treated as flat
const FLAT_SIGNAL_EPSILON: f64 = 1e-12;

/// Population z-score. Zero variance gives all zeros.
pub fn zscore_signal(samples: &[f64]) -> Array1<f64> {
    if samples.is_empty() {
        return Array1::zeros(0);
    }

    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    let std = variance.sqrt();

    if std < FLAT_SIGNAL_EPSILON {
        return Array1::zeros(samples.len());
    }

    samples.iter().map(|x| (x - mean) / std).collect()
}

/// Per-sample scaler when the bundle has one, z-score otherwise.
/// A length-1 scaler is broadcast over every sample.
pub fn normalize_signal(samples: &[f64], scaler: Option<&Scaler>) -> Result<Array1<f64>> {
    match scaler {
        None => Ok(zscore_signal(samples)),
        Some(s) if s.len() == 1 => {
            let (m, sc) = (s.mean[0], s.scale[0]);
            Ok(samples.iter().map(|x| (x - m) / sc).collect())
        }
        Some(s) => normalize(samples, s),
    }
}
