//! Fusion Types
//!
//! Core types cho data fusion.
//! KHÔNG chứa logic - chỉ data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// HEALTH FIELDS
// ============================================================================

/// Logical profile fields the engine can consume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthField {
    Age,
    Gender,
    Height,
    Weight,
    SystolicBp,
    DiastolicBp,
    Cholesterol,
    Glucose,
    HeartRate,
    Smoking,
    Alcohol,
    Active,
}

impl HealthField {
    pub const ALL: [HealthField; 12] = [
        HealthField::Age,
        HealthField::Gender,
        HealthField::Height,
        HealthField::Weight,
        HealthField::SystolicBp,
        HealthField::DiastolicBp,
        HealthField::Cholesterol,
        HealthField::Glucose,
        HealthField::HeartRate,
        HealthField::Smoking,
        HealthField::Alcohol,
        HealthField::Active,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthField::Age => "age",
            HealthField::Gender => "gender",
            HealthField::Height => "height",
            HealthField::Weight => "weight",
            HealthField::SystolicBp => "systolic_bp",
            HealthField::DiastolicBp => "diastolic_bp",
            HealthField::Cholesterol => "cholesterol",
            HealthField::Glucose => "glucose",
            HealthField::HeartRate => "heart_rate",
            HealthField::Smoking => "smoking",
            HealthField::Alcohol => "alcohol",
            HealthField::Active => "active",
        }
    }
}

impl std::fmt::Display for HealthField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// DATA SOURCES
// ============================================================================

/// Where a candidate value came from. Higher priority wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    UserEntered,
    DeviceSynced,
    SyntheticFallback,
}

impl DataSource {
    pub fn priority(&self) -> u8 {
        match self {
            DataSource::UserEntered => 3,
            DataSource::DeviceSynced => 2,
            DataSource::SyntheticFallback => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::UserEntered => "user_entered",
            DataSource::DeviceSynced => "device_synced",
            DataSource::SyntheticFallback => "synthetic_fallback",
        }
    }

    /// Synthetic values only keep the pipeline dimension-complete
    pub fn is_low_trust(&self) -> bool {
        matches!(self, DataSource::SyntheticFallback)
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// CANDIDATES & DECISIONS
// ============================================================================

/// One candidate value for one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataFusionInput {
    pub field: HealthField,
    pub value: f64,
    pub source: DataSource,
    #[serde(default = "Utc::now")]
    pub observed_at: DateTime<Utc>,
}

impl DataFusionInput {
    pub fn new(field: HealthField, value: f64, source: DataSource) -> Self {
        Self::observed(field, value, source, Utc::now())
    }

    pub fn observed(field: HealthField, value: f64, source: DataSource, observed_at: DateTime<Utc>) -> Self {
        Self {
            field,
            value,
            source,
            observed_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FusionOutcome {
    Selected,
    /// Lost to a higher-priority or newer candidate
    Overridden { disagreed: bool },
}

/// What happened to a candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FusionDecision {
    pub candidate: DataFusionInput,
    #[serde(flatten)]
    pub outcome: FusionOutcome,
}

/// Resolved value for one field plus the full decision trail
#[derive(Debug, Clone, Serialize)]
pub struct FieldResolution {
    pub field: HealthField,
    pub value: f64,
    pub source: DataSource,
    pub low_trust: bool,
    pub decisions: Vec<FusionDecision>,
}

impl FieldResolution {
    pub fn had_conflict(&self) -> bool {
        self.decisions
            .iter()
            .any(|d| matches!(d.outcome, FusionOutcome::Overridden { disagreed: true }))
    }
}

/// Count of resolved fields per source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SourceSummary {
    pub user_entered: usize,
    pub device_synced: usize,
    pub synthetic_fallback: usize,
}
