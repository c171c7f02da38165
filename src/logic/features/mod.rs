//! Features Module - Feature Extraction Engine
//!
//! Profile -> 16 cardio features, raw samples -> ECG signal features.
//! Normalizer dùng chung cho cả hai model.

pub mod ecg;
pub mod layout;
pub mod normalize;
pub mod signal;
pub mod vector;


// Re-export common types
pub use layout::{FEATURE_COUNT, FEATURE_VERSION};
pub use normalize::Scaler;
pub use signal::SignalBuffer;
pub use vector::{CardioInput, FeatureVector};
