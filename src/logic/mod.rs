//! Logic Module - Inference Engine
//!
//! Chứa các engines xử lý: bundle loader, features, model, risk rules, fusion.
//!
//! ## Architecture
//! - `bundle/` - Weight artifacts, validation, registry
//! - `features/` - Feature layout, normalizer, ECG signal features
//! - `model/` - Dense / conv evaluators, calibration, fallback
//! - `risk/` - Thresholds, rule engine, combined assessment
//! - `fusion/` - Source-priority data fusion

pub mod bundle;
pub mod config;
pub mod error;
pub mod features;
pub mod fusion;
pub mod model;
pub mod risk;
