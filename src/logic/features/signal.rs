//! Signal Buffer - Raw ECG samples
//!
//! Buffer bất biến chứa samples thô, đã kiểm tra finite.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::logic::error::{InferenceError, Result};

/// Sampling rate the ECG models were trained on (MIT-BIH, Hz)
pub const ECG_SAMPLE_RATE_HZ: f64 = 360.0;

/// Ordered raw samples. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct SignalBuffer {
    samples: Vec<f64>,
}

impl SignalBuffer {
    pub fn new(samples: Vec<f64>) -> Result<Self> {
        if let Some(index) = samples.iter().position(|s| !s.is_finite()) {
            return Err(InferenceError::InvalidInput(format!(
                "signal sample {} is not finite",
                index
            )));
        }
        Ok(Self { samples })
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn to_array(&self) -> Array1<f64> {
        Array1::from(self.samples.clone())
    }
}

impl TryFrom<Vec<f64>> for SignalBuffer {
    type Error = InferenceError;

    fn try_from(samples: Vec<f64>) -> Result<Self> {
        Self::new(samples)
    }
}

impl From<SignalBuffer> for Vec<f64> {
    fn from(buffer: SignalBuffer) -> Self {
        buffer.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_finite() {
        assert!(SignalBuffer::new(vec![0.1, f64::INFINITY]).is_err());
        assert!(SignalBuffer::new(vec![0.1, f64::NAN]).is_err());
    }

    #[test]
    fn test_serde_roundtrip_validates() {
        let buffer: SignalBuffer = serde_json::from_str("[0.5, 1.0, -0.25]").unwrap();
        assert_eq!(buffer.len(), 3);
        assert_eq!(serde_json::to_string(&buffer).unwrap(), "[0.5,1.0,-0.25]");
    }
}
