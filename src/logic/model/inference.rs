//! Inference Engine - Model orchestration
//!
//! Ghép normalizer -> evaluator -> calibrator -> risk classifier.
//! Fallback analytic chỉ dùng khi model lỗi load, luôn được tag rõ.

use std::time::Instant;

use serde::Serialize;

use super::calibration::{calibrate, cardio_confidence};
use super::conv::ConvNetwork;
use super::dense::DenseNetwork;
use super::fallback::{cardio_fallback_score, ecg_rule_class, rule_confidence, rule_distribution};
use crate::logic::bundle::WeightBundle;
use crate::logic::config::{EngineConfig, SafetyConfig};
use crate::logic::error::{InferenceError, Result};
use crate::logic::features::ecg::extract_signal_features;
use crate::logic::features::{FeatureVector, SignalBuffer};
use crate::logic::risk::types::{ClassificationResult, RhythmClass, RiskResult};

// ============================================================================
// TAGGED RESULT
// ============================================================================

/// Model output, or an analytic substitute with the load error that caused it
#[derive(Debug, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Inference<T> {
    Model(T),
    FallbackUsed {
        result: T,
        #[serde(serialize_with = "serialize_cause")]
        cause: InferenceError,
    },
}

fn serialize_cause<S: serde::Serializer>(cause: &InferenceError, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&cause.to_string())
}

impl<T> Inference<T> {
    pub fn used_fallback(&self) -> bool {
        matches!(self, Inference::FallbackUsed { .. })
    }

    pub fn result(&self) -> &T {
        match self {
            Inference::Model(result) | Inference::FallbackUsed { result, .. } => result,
        }
    }

    pub fn into_result(self) -> T {
        match self {
            Inference::Model(result) | Inference::FallbackUsed { result, .. } => result,
        }
    }

    pub fn cause(&self) -> Option<&InferenceError> {
        match self {
            Inference::Model(_) => None,
            Inference::FallbackUsed { cause, .. } => Some(cause),
        }
    }
}

/// Only load failures may be replaced, and only while the switch is on
fn fallback_allowed(cause: &InferenceError) -> bool {
    cause.is_load_failure() && SafetyConfig::is_fallback_enabled()
}

// ============================================================================
// CARDIO
// ============================================================================

/// Dense model path
pub fn score_cardio(bundle: &WeightBundle, features: &FeatureVector, config: &EngineConfig) -> Result<RiskResult> {
    let start = Instant::now();

    let network = DenseNetwork::from_bundle(bundle)?;
    let score = network.predict(features)?;
    let confidence = cardio_confidence(score, config.cardio_confidence, &config.calibration);
    let result = config
        .classifier
        .classify_cardio(score, confidence, &features.to_input(), false);

    log::debug!(
        "Cardio inference: score={:.4}, level={}, {}us",
        score,
        result.risk_level,
        start.elapsed().as_micros()
    );
    Ok(result)
}

/// Analytic heuristic path
pub fn score_cardio_fallback(features: &FeatureVector, config: &EngineConfig) -> RiskResult {
    let input = features.to_input();
    let score = cardio_fallback_score(&input);
    let confidence = config
        .fallback_confidence
        .clamp(config.calibration.min_confidence, config.calibration.max_confidence);
    config.classifier.classify_cardio(score, confidence, &input, true)
}

/// Model if the bundle loaded, heuristic if it did not
pub fn score_cardio_or_fallback(
    bundle: Result<&WeightBundle>,
    features: &FeatureVector,
    config: &EngineConfig,
) -> Result<Inference<RiskResult>> {
    let cause = match bundle {
        Ok(bundle) => return score_cardio(bundle, features, config).map(Inference::Model),
        Err(cause) => cause,
    };

    if !fallback_allowed(&cause) {
        return Err(cause);
    }
    log::warn!("Cardio model unavailable ({}), using fallback heuristic", cause);
    Ok(Inference::FallbackUsed {
        result: score_cardio_fallback(features, config),
        cause,
    })
}

// ============================================================================
// ECG
// ============================================================================

/// Conv model path
pub fn classify_ecg(bundle: &WeightBundle, signal: &SignalBuffer, config: &EngineConfig) -> Result<ClassificationResult> {
    let start = Instant::now();

    let network = ConvNetwork::from_bundle(bundle)?;
    let probabilities = network.predict(signal)?;
    let calibration = calibrate(&probabilities, &config.calibration);
    let features = extract_signal_features(signal.samples());

    let result = config.classifier.classify_rhythm(
        &probabilities,
        network.class_labels(),
        calibration.confidence,
        features,
        false,
    )?;

    log::debug!(
        "ECG inference: class={}, raw_max={:.4}, confidence={:.4}, {}us",
        result.class_label,
        calibration.raw_max,
        calibration.confidence,
        start.elapsed().as_micros()
    );
    Ok(result)
}

/// Rule-based morphology path
pub fn classify_ecg_fallback(signal: &SignalBuffer, config: &EngineConfig) -> Result<ClassificationResult> {
    if signal.is_empty() {
        return Err(InferenceError::InsufficientSignal { required: 1, actual: 0 });
    }

    let features = extract_signal_features(signal.samples());
    let (class, raw) = ecg_rule_class(&features);
    let confidence = rule_confidence(raw, class);

    let labels: Vec<String> = RhythmClass::ALL.iter().map(|c| c.as_str().to_string()).collect();
    let probabilities = rule_distribution(&labels, class, confidence);

    config
        .classifier
        .classify_rhythm(&probabilities, &labels, confidence, features, true)
}

/// Model if the bundle loaded, morphology rules if it did not
pub fn classify_ecg_or_fallback(
    bundle: Result<&WeightBundle>,
    signal: &SignalBuffer,
    config: &EngineConfig,
) -> Result<Inference<ClassificationResult>> {
    let cause = match bundle {
        Ok(bundle) => return classify_ecg(bundle, signal, config).map(Inference::Model),
        Err(cause) => cause,
    };

    if !fallback_allowed(&cause) {
        return Err(cause);
    }
    log::warn!("ECG model unavailable ({}), using rule-based classification", cause);
    Ok(Inference::FallbackUsed {
        result: classify_ecg_fallback(signal, config)?,
        cause,
    })
}
