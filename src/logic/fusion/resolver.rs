//! Fusion Resolver
//!
//! CHỈ chứa logic chọn giá trị - không có types definitions.
//! Input: DataFusionInput records
//! Output: FusedProfile (đủ mọi HealthField, kèm decision trail)

use serde::{Deserialize, Serialize};

use super::synthetic::SyntheticDefaults;
use super::types::{
    DataFusionInput, DataSource, FieldResolution, FusionDecision, FusionOutcome, HealthField, SourceSummary,
};
use crate::logic::error::{InferenceError, Result};
use crate::logic::features::CardioInput;

/// Values closer than this count as agreeing
pub const DISAGREEMENT_EPSILON: f64 = 1e-9;

// ============================================================================
// SINGLE FIELD
// ============================================================================

/// Source priority first, then the most recent observation.
/// Full ties keep the earliest candidate in input order.
fn outranks(a: &DataFusionInput, b: &DataFusionInput) -> bool {
    (a.source.priority(), a.observed_at) > (b.source.priority(), b.observed_at)
}

/// Resolve one field from every candidate recorded for it
pub fn resolve_field(
    field: HealthField,
    candidates: &[DataFusionInput],
    defaults: &SyntheticDefaults,
) -> FieldResolution {
    let relevant: Vec<&DataFusionInput> = candidates.iter().filter(|c| c.field == field).collect();

    let winner = relevant
        .iter()
        .copied()
        .fold(None::<&DataFusionInput>, |best, c| match best {
            Some(b) if !outranks(c, b) => Some(b),
            _ => Some(c),
        });

    let Some(winner) = winner else {
        let synthetic = DataFusionInput::new(field, defaults.value_for(field), DataSource::SyntheticFallback);
        log::debug!("Fusion: no data for {}, synthetic {} used", field, synthetic.value);
        return FieldResolution {
            field,
            value: synthetic.value,
            source: DataSource::SyntheticFallback,
            low_trust: true,
            decisions: vec![FusionDecision {
                candidate: synthetic,
                outcome: FusionOutcome::Selected,
            }],
        };
    };

    let decisions = relevant
        .iter()
        .map(|&c| {
            let outcome = if std::ptr::eq(c, winner) {
                FusionOutcome::Selected
            } else {
                let disagreed = (c.value - winner.value).abs() > DISAGREEMENT_EPSILON;
                if disagreed {
                    log::debug!(
                        "Fusion: {} {} ({}) overridden by {} ({})",
                        field,
                        c.value,
                        c.source,
                        winner.value,
                        winner.source
                    );
                }
                FusionOutcome::Overridden { disagreed }
            };
            FusionDecision {
                candidate: c.clone(),
                outcome,
            }
        })
        .collect();

    FieldResolution {
        field,
        value: winner.value,
        source: winner.source,
        low_trust: winner.source.is_low_trust(),
        decisions,
    }
}

// ============================================================================
// FULL PROFILE
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionResolver {
    pub defaults: SyntheticDefaults,
}

impl FusionResolver {
    pub fn new(defaults: SyntheticDefaults) -> Self {
        Self { defaults }
    }

    /// Resolve every `HealthField`. Non-finite candidates are rejected, not skipped.
    pub fn resolve(&self, candidates: &[DataFusionInput]) -> Result<FusedProfile> {
        if let Some(bad) = candidates.iter().find(|c| !c.value.is_finite()) {
            return Err(InferenceError::InvalidInput(format!(
                "{} value from {} is not finite",
                bad.field, bad.source
            )));
        }

        let fields: Vec<FieldResolution> = HealthField::ALL
            .iter()
            .map(|&field| resolve_field(field, candidates, &self.defaults))
            .collect();
        let profile = FusedProfile { fields };

        let summary = profile.source_summary();
        log::info!(
            "Fusion resolved {} candidates: user={}, device={}, synthetic={}",
            candidates.len(),
            summary.user_entered,
            summary.device_synced,
            summary.synthetic_fallback
        );
        Ok(profile)
    }
}

/// One resolution per `HealthField`, in `HealthField::ALL` order
#[derive(Debug, Clone, Serialize)]
pub struct FusedProfile {
    fields: Vec<FieldResolution>,
}

impl FusedProfile {
    pub fn fields(&self) -> &[FieldResolution] {
        &self.fields
    }

    pub fn get(&self, field: HealthField) -> Option<&FieldResolution> {
        self.fields.iter().find(|r| r.field == field)
    }

    pub fn value(&self, field: HealthField) -> Option<f64> {
        self.get(field).map(|r| r.value)
    }

    pub fn source_summary(&self) -> SourceSummary {
        let mut summary = SourceSummary::default();
        for r in &self.fields {
            match r.source {
                DataSource::UserEntered => summary.user_entered += 1,
                DataSource::DeviceSynced => summary.device_synced += 1,
                DataSource::SyntheticFallback => summary.synthetic_fallback += 1,
            }
        }
        summary
    }

    pub fn low_trust_fields(&self) -> Vec<HealthField> {
        self.fields.iter().filter(|r| r.low_trust).map(|r| r.field).collect()
    }

    /// Raw profile for the cardio pipeline. Validation happens in `FeatureVector::from_input`.
    pub fn to_cardio_input(&self) -> CardioInput {
        let v = |field: HealthField| self.value(field).unwrap_or_default();
        let category = |field: HealthField| v(field).round().clamp(0.0, u8::MAX as f64) as u8;
        let flag = |field: HealthField| v(field) >= 0.5;

        CardioInput {
            age_years: v(HealthField::Age),
            gender: category(HealthField::Gender),
            height_cm: v(HealthField::Height),
            weight_kg: v(HealthField::Weight),
            systolic_bp: v(HealthField::SystolicBp),
            diastolic_bp: v(HealthField::DiastolicBp),
            cholesterol: category(HealthField::Cholesterol),
            glucose: category(HealthField::Glucose),
            smoking: flag(HealthField::Smoking),
            alcohol: flag(HealthField::Alcohol),
            physically_active: flag(HealthField::Active),
        }
    }
}
