//! Health Risk Core - on-device cardio risk scoring and ECG rhythm classification.
//!
//! Weights come from externally trained models; this crate only runs them.

pub mod api;
pub mod constants;
pub mod logic;

pub use logic::error::{InferenceError, Result};
