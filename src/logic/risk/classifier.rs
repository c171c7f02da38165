//! Risk Classifier & Rule Engine
//!
//! Map model output + profile thành risk level, risk factors và recommendations.
//! Không có learned weights - chỉ rules.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::rules::{factor, FactorThresholds, RhythmRiskRules, RiskThresholds, MAX_RECOMMENDATIONS};
use super::types::{
    ClassProbability, ClassificationResult, RhythmClass, RiskLevel, RiskResult, METHOD_FALLBACK,
    METHOD_MODEL,
};
use crate::logic::error::{InferenceError, Result};
use crate::logic::features::ecg::{anomaly_score, SignalFeatures};
use crate::logic::features::CardioInput;
use crate::logic::model::activation::argmax;

/// Anomaly score above which an extra ECG recommendation is added
pub const HIGH_ANOMALY_SCORE: f64 = 0.7;

fn push_unique(list: &mut Vec<String>, item: &str) {
    if !list.iter().any(|existing| existing == item) {
        list.push(item.to_string());
    }
}

fn method_name(used_fallback: bool) -> String {
    let method = if used_fallback { METHOD_FALLBACK } else { METHOD_MODEL };
    method.to_string()
}

// ============================================================================
// RISK FACTORS
// ============================================================================

/// Ordered, deduplicated risk factors for a profile
pub fn identify_risk_factors(input: &CardioInput, t: &FactorThresholds) -> Vec<String> {
    let mut factors = Vec::new();
    let bmi = input.bmi();

    if input.age_years > t.advanced_age {
        push_unique(&mut factors, factor::ADVANCED_AGE);
    }
    if bmi > t.obesity_bmi {
        push_unique(&mut factors, factor::OBESITY);
    }
    if bmi > t.overweight_bmi {
        push_unique(&mut factors, factor::OVERWEIGHT);
    }
    if input.systolic_bp > t.systolic_high {
        push_unique(&mut factors, factor::HIGH_SYSTOLIC);
    }
    if input.diastolic_bp > t.diastolic_high {
        push_unique(&mut factors, factor::HIGH_DIASTOLIC);
    }
    if input.smoking {
        push_unique(&mut factors, factor::SMOKING);
    }
    if input.alcohol {
        push_unique(&mut factors, factor::ALCOHOL);
    }
    if !input.physically_active {
        push_unique(&mut factors, factor::SEDENTARY);
    }
    if input.cholesterol > t.elevated_category {
        push_unique(&mut factors, factor::HIGH_CHOLESTEROL);
    }
    if input.glucose > t.elevated_category {
        push_unique(&mut factors, factor::HIGH_GLUCOSE);
    }
    if input.is_male() && input.age_years > t.male_age {
        push_unique(&mut factors, factor::MALE_WITH_AGE);
    }

    factors
}

// ============================================================================
// RECOMMENDATIONS
// ============================================================================

/// Ordered, deduplicated, capped cardio recommendations
pub fn cardio_recommendations(
    input: &CardioInput,
    level: RiskLevel,
    t: &FactorThresholds,
    cap: usize,
) -> Vec<String> {
    let mut recs = Vec::new();

    if level == RiskLevel::High {
        push_unique(&mut recs, "Consult a cardiologist promptly");
        push_unique(&mut recs, "Have your medication reviewed regularly");
    }
    if input.systolic_bp > t.systolic_high || input.diastolic_bp > t.diastolic_high {
        push_unique(&mut recs, "Measure your blood pressure regularly");
        push_unique(&mut recs, "Reduce your salt intake");
    }
    if input.bmi() > t.overweight_bmi {
        push_unique(&mut recs, "Exercise regularly");
        push_unique(&mut recs, "Follow a healthy eating plan");
    }
    if input.smoking {
        push_unique(&mut recs, "Quit smoking");
    }
    if !input.physically_active {
        push_unique(&mut recs, "Walk at least 30 minutes a day");
        push_unique(&mut recs, "Be physically active at least 3 days a week");
    }
    if input.cholesterol > t.elevated_category {
        push_unique(&mut recs, "Cut down on saturated fat");
        push_unique(&mut recs, "Eat foods rich in omega-3");
    }
    push_unique(&mut recs, "Get quality sleep (7-8 hours)");
    push_unique(&mut recs, "Learn to manage stress");

    recs.truncate(cap);
    recs
}

/// Ordered, capped recommendations for a rhythm class
pub fn rhythm_recommendations(class: RhythmClass, anomaly: f64, cap: usize) -> Vec<String> {
    let mut recs = Vec::new();

    let per_class: &[&str] = match class {
        RhythmClass::Normal => &[
            "Your ECG looks normal",
            "Keep up regular heart health check-ups",
            "Keep your active lifestyle",
        ],
        RhythmClass::Supraventricular => &[
            "Supraventricular arrhythmia detected",
            "We recommend seeing a cardiologist",
            "Reduce caffeine and stress",
        ],
        RhythmClass::Ventricular => &[
            "Ventricular arrhythmia detected",
            "Urgent cardiology consultation needed",
            "Limit physical exertion",
        ],
        RhythmClass::Fusion => &[
            "Fusion rhythm detected",
            "Detailed cardiology evaluation needed",
        ],
        RhythmClass::Unknown => &[
            "ECG signal is inconclusive",
            "Repeat the measurement",
            "See a doctor if needed",
        ],
    };
    for rec in per_class {
        push_unique(&mut recs, rec);
    }
    if anomaly > HIGH_ANOMALY_SCORE {
        push_unique(&mut recs, "High anomaly score - seek urgent medical evaluation");
    }

    recs.truncate(cap);
    recs
}

// ============================================================================
// CLASSIFIER
// ============================================================================

/// Rule engine configuration bundled together
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskClassifier {
    pub thresholds: RiskThresholds,
    pub rhythm_rules: RhythmRiskRules,
    pub factor_thresholds: FactorThresholds,
    pub max_recommendations: usize,
}

impl Default for RiskClassifier {
    fn default() -> Self {
        Self {
            thresholds: RiskThresholds::default(),
            rhythm_rules: RhythmRiskRules::default(),
            factor_thresholds: FactorThresholds::default(),
            max_recommendations: MAX_RECOMMENDATIONS,
        }
    }
}

impl RiskClassifier {
    pub fn new(thresholds: RiskThresholds) -> Result<Self> {
        thresholds.validate()?;
        Ok(Self {
            thresholds,
            ..Default::default()
        })
    }

    /// Build the cardio result for a score in [0, 1]
    pub fn classify_cardio(
        &self,
        score: f64,
        confidence: f64,
        input: &CardioInput,
        used_fallback: bool,
    ) -> RiskResult {
        let score = score.clamp(0.0, 1.0);
        let level = self.thresholds.level_for(score);

        RiskResult {
            id: Uuid::new_v4(),
            risk_score: score,
            risk_percentage: (score * 100.0).round() as u8,
            risk_level: level,
            confidence,
            risk_factors: identify_risk_factors(input, &self.factor_thresholds),
            recommendations: cardio_recommendations(
                input,
                level,
                &self.factor_thresholds,
                self.max_recommendations,
            ),
            used_fallback,
            method: method_name(used_fallback),
            created_at: Utc::now(),
        }
    }

    /// Build the ECG result from a distribution in bundle class order
    pub fn classify_rhythm(
        &self,
        probabilities: &[f64],
        labels: &[String],
        confidence: f64,
        signal_features: SignalFeatures,
        used_fallback: bool,
    ) -> Result<ClassificationResult> {
        if probabilities.len() != labels.len() {
            return Err(InferenceError::shape("class probabilities", labels.len(), probabilities.len()));
        }
        let predicted_index = argmax(probabilities)
            .ok_or_else(|| InferenceError::InvalidInput("empty probability distribution".to_string()))?;

        let class_label = labels[predicted_index].clone();
        let predicted_class = RhythmClass::from_label(&class_label);
        let anomaly = anomaly_score(&signal_features);

        Ok(ClassificationResult {
            id: Uuid::new_v4(),
            predicted_index,
            predicted_class,
            class_label,
            probabilities: labels
                .iter()
                .zip(probabilities)
                .map(|(label, p)| ClassProbability {
                    label: label.clone(),
                    probability: *p,
                })
                .collect(),
            confidence,
            risk_level: self.rhythm_rules.level_for(predicted_class, confidence),
            anomaly_score: anomaly,
            recommendations: rhythm_recommendations(predicted_class, anomaly, self.max_recommendations),
            signal_features,
            used_fallback,
            method: method_name(used_fallback),
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::features::ecg::extract_signal_features;
    use crate::logic::features::vector::GENDER_MALE;

    fn risky_profile() -> CardioInput {
        CardioInput {
            age_years: 67.0,
            gender: GENDER_MALE,
            height_cm: 170.0,
            weight_kg: 95.0,
            systolic_bp: 155.0,
            diastolic_bp: 95.0,
            cholesterol: 3,
            glucose: 3,
            smoking: true,
            alcohol: true,
            physically_active: false,
        }
    }

    #[test]
    fn test_risk_factors_order() {
        let factors = identify_risk_factors(&risky_profile(), &FactorThresholds::default());
        assert_eq!(
            factors,
            vec![
                factor::ADVANCED_AGE,
                factor::OBESITY,
                factor::OVERWEIGHT,
                factor::HIGH_SYSTOLIC,
                factor::HIGH_DIASTOLIC,
                factor::SMOKING,
                factor::ALCOHOL,
                factor::SEDENTARY,
                factor::HIGH_CHOLESTEROL,
                factor::HIGH_GLUCOSE,
                factor::MALE_WITH_AGE,
            ]
        );
    }

    #[test]
    fn test_healthy_profile_has_no_factors() {
        let input = CardioInput {
            physically_active: true,
            ..CardioInput::default()
        };
        assert!(identify_risk_factors(&input, &FactorThresholds::default()).is_empty());
    }

    #[test]
    fn test_recommendations_capped() {
        let recs = cardio_recommendations(
            &risky_profile(),
            RiskLevel::High,
            &FactorThresholds::default(),
            MAX_RECOMMENDATIONS,
        );
        assert_eq!(recs.len(), MAX_RECOMMENDATIONS);
        assert_eq!(recs[0], "Consult a cardiologist promptly");
        assert_eq!(recs[2], "Measure your blood pressure regularly");
    }

    #[test]
    fn test_low_risk_recommendations() {
        let input = CardioInput {
            physically_active: true,
            ..CardioInput::default()
        };
        let recs = cardio_recommendations(&input, RiskLevel::Low, &FactorThresholds::default(), 6);
        assert_eq!(recs, vec!["Get quality sleep (7-8 hours)", "Learn to manage stress"]);
    }

    #[test]
    fn test_rhythm_recommendations() {
        let recs = rhythm_recommendations(RhythmClass::Ventricular, 0.9, 6);
        assert_eq!(recs.len(), 4);
        assert!(recs[3].starts_with("High anomaly score"));
        assert_eq!(rhythm_recommendations(RhythmClass::Normal, 0.7, 6).len(), 3);
    }

    #[test]
    fn test_overweight_band_alone() {
        // 80 kg / 1.75 m = 26.1
        let input = CardioInput {
            weight_kg: 80.0,
            height_cm: 175.0,
            physically_active: true,
            ..CardioInput::default()
        };
        assert_eq!(
            identify_risk_factors(&input, &FactorThresholds::default()),
            vec![factor::OVERWEIGHT]
        );
    }

    #[test]
    fn test_classify_cardio() {
        let classifier = RiskClassifier::default();
        let result = classifier.classify_cardio(0.6, 0.92, &risky_profile(), false);
        assert_eq!(result.risk_level, RiskLevel::High);
        assert_eq!(result.risk_percentage, 60);
        assert_eq!(result.method, METHOD_MODEL);
        assert!(!result.used_fallback);
    }

    #[test]
    fn test_classify_rhythm() {
        let classifier = RiskClassifier::default();
        let labels: Vec<String> = RhythmClass::ALL.iter().map(|c| c.as_str().to_string()).collect();
        let features = extract_signal_features(&[0.0; 30]);

        let result = classifier
            .classify_rhythm(&[0.05, 0.1, 0.7, 0.1, 0.05], &labels, 0.7, features, true)
            .unwrap();
        assert_eq!(result.predicted_index, 2);
        assert_eq!(result.predicted_class, RhythmClass::Ventricular);
        assert_eq!(result.risk_level, RiskLevel::High);
        assert_eq!(result.method, METHOD_FALLBACK);
        assert_eq!(result.probability_of("Fusion"), Some(0.1));
    }

    #[test]
    fn test_classify_rhythm_length_mismatch() {
        let classifier = RiskClassifier::default();
        let labels = vec!["Normal".to_string()];
        let features = extract_signal_features(&[0.0; 30]);
        assert!(classifier
            .classify_rhythm(&[0.5, 0.5], &labels, 0.5, features, false)
            .is_err());
    }
}
