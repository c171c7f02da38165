//! Model Module - Inference Engine
//!
//! Tách evaluator (dense/conv) khỏi orchestration và fallback.
//! Pure, synchronous; bundle chia sẻ read-only.

pub mod activation;
pub mod calibration;
pub mod conv;
pub mod dense;
pub mod fallback;
pub mod inference;

#[cfg(test)]
mod tests;

// Re-export common types
pub use calibration::{calibrate, Calibration, CalibrationConfig, CardioConfidence};
pub use conv::ConvNetwork;
pub use dense::DenseNetwork;
pub use inference::Inference;
