//! Fusion Module
//!
//! Gộp dữ liệu từ nhiều nguồn theo priority:
//! UserEntered > DeviceSynced > SyntheticFallback.
//!
//! ## Structure
//! - `types`: Core types (HealthField, DataSource, DataFusionInput, FusionDecision)
//! - `resolver`: Selection logic + decision trail
//! - `synthetic`: Low-trust defaults and seeded synthetic ECG

pub mod resolver;
pub mod synthetic;
pub mod types;

// Re-export main types for convenience
pub use resolver::{resolve_field, FusedProfile, FusionResolver};
pub use synthetic::{synthetic_ecg, SyntheticDefaults, SyntheticPattern, DEFAULT_SYNTHETIC_LENGTH};
pub use types::{
    DataFusionInput, DataSource, FieldResolution, FusionDecision, FusionOutcome, HealthField, SourceSummary,
};
