//! Integration Tests for the inference pipeline
//!
//! Golden vector, determinism và fallback tagging.

#[cfg(test)]
mod integration_tests {
    use ndarray::Array1;

    use crate::logic::bundle::{fixtures, load_bundle, ModelKind, WeightBundle};
    use crate::logic::config::{EngineConfig, SafetyConfig, FALLBACK_SWITCH_GUARD};
    use crate::logic::error::InferenceError;
    use crate::logic::features::vector::GENDER_MALE;
    use crate::logic::features::{CardioInput, FeatureVector, SignalBuffer};
    use crate::logic::model::dense::DenseNetwork;
    use crate::logic::model::inference::{
        classify_ecg, classify_ecg_or_fallback, score_cardio, score_cardio_or_fallback, Inference,
    };
    use crate::logic::risk::types::{RhythmClass, RiskLevel, METHOD_FALLBACK, METHOD_MODEL};

    fn cardio() -> WeightBundle {
        load_bundle(&fixtures::cardio_artifact(), ModelKind::Cardio).unwrap()
    }

    fn ecg() -> WeightBundle {
        load_bundle(&fixtures::ecg_artifact(fixtures::ECG_INPUT_LEN), ModelKind::Ecg).unwrap()
    }

    fn golden_input() -> CardioInput {
        CardioInput {
            age_years: 45.0,
            gender: GENDER_MALE,
            height_cm: 175.0,
            weight_kg: 80.0,
            systolic_bp: 130.0,
            diastolic_bp: 85.0,
            cholesterol: 1,
            glucose: 1,
            smoking: false,
            alcohol: false,
            physically_active: true,
        }
    }

    fn sine_signal(len: usize) -> SignalBuffer {
        let samples = (0..len)
            .map(|i| {
                let t = i as f64 / len as f64 * std::f64::consts::TAU;
                t.sin() + 0.3 * (3.0 * t).sin()
            })
            .collect();
        SignalBuffer::new(samples).unwrap()
    }

    /// Pre-normalized input straight into the evaluator
    #[test]
    fn test_golden_vector_raw() {
        let bundle = cardio();
        let net = DenseNetwork::from_bundle(&bundle).unwrap();
        let input: Array1<f64> = (0..16).map(|j| (j as f64 - 7.5) / 4.0).collect();

        let p = net.evaluate(&input).unwrap();
        assert!((p - 7.031184266914956e-05).abs() < 1e-12, "{}", p);
    }

    /// Profile -> features -> scaler -> dense stack
    #[test]
    fn test_golden_vector_end_to_end() {
        let bundle = cardio();
        let features = FeatureVector::from_input(&golden_input()).unwrap();
        let result = score_cardio(&bundle, &features, &EngineConfig::default()).unwrap();

        assert!((result.risk_score - 0.1404239455862153).abs() < 1e-12);
        assert_eq!(result.risk_level, RiskLevel::Low);
        assert_eq!(result.risk_percentage, 14);
        assert_eq!(result.confidence, 0.92);
        assert_eq!(result.method, METHOD_MODEL);
    }

    #[test]
    fn test_risky_profile_scores_high() {
        let bundle = cardio();
        let input = CardioInput {
            age_years: 67.0,
            height_cm: 170.0,
            weight_kg: 95.0,
            systolic_bp: 155.0,
            diastolic_bp: 95.0,
            cholesterol: 3,
            glucose: 3,
            smoking: true,
            alcohol: true,
            physically_active: false,
            ..golden_input()
        };
        let features = FeatureVector::from_input(&input).unwrap();
        let result = score_cardio(&bundle, &features, &EngineConfig::default()).unwrap();

        assert!((result.risk_score - 0.9997166464987229).abs() < 1e-12);
        assert_eq!(result.risk_level, RiskLevel::High);
        assert!(result.recommendations.len() <= 6);
        assert!(!result.risk_factors.is_empty());
    }

    #[test]
    fn test_bit_identical_repeats() {
        let bundle = cardio();
        let features = FeatureVector::from_input(&golden_input()).unwrap();
        let net = DenseNetwork::from_bundle(&bundle).unwrap();

        let first = net.predict(&features).unwrap();
        for _ in 0..10 {
            assert_eq!(net.predict(&features).unwrap().to_bits(), first.to_bits());
        }
    }

    #[test]
    fn test_ecg_model_path() {
        let bundle = ecg();
        let result = classify_ecg(&bundle, &sine_signal(187), &EngineConfig::default()).unwrap();

        let sum: f64 = result.probabilities.iter().map(|p| p.probability).sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert_eq!(result.probabilities.len(), 5);
        assert!((0.5..=0.95).contains(&result.confidence));
        assert!(!result.used_fallback);
    }

    #[test]
    fn test_ecg_argmax_tie() {
        let bundle = load_bundle(&fixtures::ecg_tied_artifact(), ModelKind::Ecg).unwrap();
        let result = classify_ecg(&bundle, &sine_signal(22), &EngineConfig::default()).unwrap();

        assert_eq!(result.probabilities[0].probability, result.probabilities[1].probability);
        assert_eq!(result.predicted_index, 0);
        assert_eq!(result.predicted_class, RhythmClass::Normal);
    }

    #[test]
    fn test_short_signal_is_not_masked_by_fallback() {
        let _guard = FALLBACK_SWITCH_GUARD.lock();
        let bundle = ecg();
        let err = classify_ecg_or_fallback(Ok(&bundle), &sine_signal(100), &EngineConfig::default())
            .unwrap_err();
        assert!(matches!(err, InferenceError::InsufficientSignal { required: 187, actual: 100 }));
    }

    #[test]
    fn test_loaded_bundle_errors_are_not_masked() {
        let _guard = FALLBACK_SWITCH_GUARD.lock();
        let ecg_bundle = ecg();
        let features = FeatureVector::from_input(&golden_input()).unwrap();
        // the bundle did load; a wrong kind surfaces instead of silently degrading
        let result = score_cardio_or_fallback(Ok(&ecg_bundle), &features, &EngineConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_cardio_fallback_is_tagged() {
        let _guard = FALLBACK_SWITCH_GUARD.lock();
        let features = FeatureVector::from_input(&golden_input()).unwrap();
        let missing = Err(InferenceError::ModelLoad("not found".to_string()));

        let inference = score_cardio_or_fallback(missing, &features, &EngineConfig::default()).unwrap();
        assert!(inference.used_fallback());
        assert!(matches!(inference.cause(), Some(InferenceError::ModelLoad(_))));

        let result = inference.into_result();
        assert!(result.used_fallback);
        assert_eq!(result.method, METHOD_FALLBACK);
        // 0.1 base, age 45 (+0.1), bmi 26.1 (+0.1), bp 130/85 not above
        assert!((result.risk_score - 0.3).abs() < 1e-12);
        assert_eq!(result.confidence, 0.6);
    }

    #[test]
    fn test_cardio_fallback_confidence_stays_in_band() {
        let _guard = FALLBACK_SWITCH_GUARD.lock();
        let features = FeatureVector::from_input(&golden_input()).unwrap();
        // built directly, so validate() never ran
        let config = EngineConfig {
            fallback_confidence: 0.2,
            ..EngineConfig::default()
        };
        let missing = Err(InferenceError::ModelLoad("not found".to_string()));

        let result = score_cardio_or_fallback(missing, &features, &config).unwrap().into_result();
        assert_eq!(result.confidence, config.calibration.min_confidence);
        assert!(result.confidence >= 0.5);
    }

    #[test]
    fn test_ecg_fallback_is_tagged() {
        let _guard = FALLBACK_SWITCH_GUARD.lock();
        let missing = Err(InferenceError::ModelLoad("not found".to_string()));
        let inference = classify_ecg_or_fallback(missing, &sine_signal(187), &EngineConfig::default()).unwrap();

        match &inference {
            Inference::FallbackUsed { result, .. } => {
                assert!(result.used_fallback);
                assert_eq!(result.method, METHOD_FALLBACK);
                let sum: f64 = result.probabilities.iter().map(|p| p.probability).sum();
                assert!((sum - 1.0).abs() < 1e-6);
            }
            Inference::Model(_) => panic!("expected fallback"),
        }
    }

    #[test]
    fn test_kill_switch_propagates_error() {
        let _guard = FALLBACK_SWITCH_GUARD.lock();
        SafetyConfig::set_fallback(false);

        let features = FeatureVector::from_input(&golden_input()).unwrap();
        let missing = Err(InferenceError::ModelLoad("not found".to_string()));
        let result = score_cardio_or_fallback(missing, &features, &EngineConfig::default());

        SafetyConfig::set_fallback(true);
        assert!(matches!(result, Err(InferenceError::ModelLoad(_))));
    }

    #[test]
    fn test_model_result_is_untagged() {
        let bundle = cardio();
        let features = FeatureVector::from_input(&golden_input()).unwrap();
        let inference = score_cardio_or_fallback(Ok(&bundle), &features, &EngineConfig::default()).unwrap();
        assert!(!inference.used_fallback());
        assert!(inference.cause().is_none());
    }
}
