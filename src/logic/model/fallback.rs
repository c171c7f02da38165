//! Analytic Fallbacks
//!
//! Dùng khi model không load được: heuristic cộng dồn cho cardio,
//! rule-based theo morphology cho ECG. Deterministic, không random.

use crate::logic::features::ecg::{Morphology, Rhythm, SignalFeatures};
use crate::logic::features::CardioInput;
use crate::logic::risk::types::RhythmClass;

// ============================================================================
// CARDIO HEURISTIC
// ============================================================================

pub const FALLBACK_BASE_RISK: f64 = 0.1;
pub const FALLBACK_MAX_RISK: f64 = 0.95;

/// Additive domain-knowledge risk in [0.1, 0.95]
pub fn cardio_fallback_score(input: &CardioInput) -> f64 {
    let mut risk = FALLBACK_BASE_RISK;
    let age = input.age_years;
    let bmi = input.bmi();

    // Age
    if age > 60.0 {
        risk += 0.3;
    } else if age > 45.0 {
        risk += 0.2;
    } else if age > 35.0 {
        risk += 0.1;
    }

    // BMI
    if bmi > 30.0 {
        risk += 0.2;
    } else if bmi > 25.0 {
        risk += 0.1;
    }

    // Blood pressure
    if input.systolic_bp > 140.0 || input.diastolic_bp > 90.0 {
        risk += 0.25;
    } else if input.systolic_bp > 130.0 || input.diastolic_bp > 85.0 {
        risk += 0.15;
    }

    // Lifestyle
    if input.smoking {
        risk += 0.2;
    }
    if input.alcohol {
        risk += 0.1;
    }
    if !input.physically_active {
        risk += 0.15;
    }

    // Metabolic
    if input.cholesterol > 2 {
        risk += 0.15;
    }
    if input.glucose > 2 {
        risk += 0.15;
    }

    if input.is_male() && age > 45.0 {
        risk += 0.1;
    }

    risk.min(FALLBACK_MAX_RISK)
}

// ============================================================================
// ECG RULES
// ============================================================================

/// Rule class + raw confidence before damping
pub fn ecg_rule_class(features: &SignalFeatures) -> (RhythmClass, f64) {
    let hr = features.heart_rate;
    let regular = features.rhythm == Rhythm::Regular;

    if (60.0..=100.0).contains(&hr) && regular && features.morphology == Morphology::Normal {
        (RhythmClass::Normal, 0.9)
    } else if hr > 100.0 && regular && features.morphology == Morphology::Narrow {
        (RhythmClass::Supraventricular, 0.8)
    } else if features.morphology == Morphology::Wide || features.std > 0.3 {
        (RhythmClass::Ventricular, 0.85)
    } else if features.rhythm == Rhythm::Irregular && features.morphology == Morphology::Normal {
        (RhythmClass::Fusion, 0.7)
    } else {
        (RhythmClass::Unknown, 0.6)
    }
}

/// Rule systems are over-confident; damp by band midpoints.
pub fn rule_confidence(raw: f64, class: RhythmClass) -> f64 {
    let mut adjustment = if raw > 0.9 {
        0.86
    } else if raw > 0.8 {
        0.80
    } else if raw > 0.7 {
        0.74
    } else {
        1.0
    };

    if class == RhythmClass::Ventricular && raw > 0.7 {
        adjustment = (adjustment + 0.05_f64).min(0.9);
    }

    (raw * adjustment).clamp(0.5, 0.95)
}

/// Distribution in `labels` order: predicted class gets `confidence`,
/// the rest share the remainder evenly.
pub fn rule_distribution(labels: &[String], predicted: RhythmClass, confidence: f64) -> Vec<f64> {
    let n = labels.len();
    if n == 0 {
        return Vec::new();
    }
    let index = labels
        .iter()
        .position(|l| RhythmClass::from_label(l) == predicted)
        .unwrap_or(n - 1);
    if n == 1 {
        return vec![1.0];
    }

    let rest = (1.0 - confidence) / (n - 1) as f64;
    (0..n).map(|i| if i == index { confidence } else { rest }).collect()
}
