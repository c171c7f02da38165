//! Inference Commands - Public API cho host application
//!
//! Load bundle, chấm điểm cardio, phân loại ECG, fallback có tag,
//! và health check đầy đủ từ fusion records.

use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::logic::bundle::{load_bundle, load_bundle_file, ModelKind, ModelRegistry, WeightBundle};
use crate::logic::config::EngineConfig;
use crate::logic::error::{InferenceError, Result};
use crate::logic::features::{FeatureVector, SignalBuffer};
use crate::logic::fusion::{synthetic_ecg, DataFusionInput, FusedProfile, SyntheticPattern, DEFAULT_SYNTHETIC_LENGTH};
use crate::logic::model::inference;
use crate::logic::model::Inference;
use crate::logic::risk::assessment::{self, HealthAssessment};
use crate::logic::risk::{ClassificationResult, RiskResult};

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// One health check: fusion records plus an optional ECG capture
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthCheckRequest {
    pub records: Vec<DataFusionInput>,
    pub signal: Option<SignalBuffer>,
    /// Generate a low-trust signal when no capture exists
    pub synthetic_signal: Option<SyntheticPattern>,
    pub seed: u64,
}

#[derive(Debug, Serialize)]
pub struct HealthCheckReport {
    pub profile: FusedProfile,
    pub cardio: Inference<RiskResult>,
    pub ecg: Option<Inference<ClassificationResult>>,
    pub synthetic_signal: bool,
    pub assessment: HealthAssessment,
}

fn not_loaded(kind: ModelKind) -> InferenceError {
    InferenceError::ModelLoad(format!("{} model not loaded", kind))
}

// ============================================================================
// MODEL LOADING
// ============================================================================

pub fn load_cardio_model(artifact: &str) -> Result<WeightBundle> {
    load_bundle(artifact, ModelKind::Cardio)
}

pub fn load_ecg_model(artifact: &str) -> Result<WeightBundle> {
    load_bundle(artifact, ModelKind::Ecg)
}

pub fn load_cardio_model_file(path: impl AsRef<Path>) -> Result<WeightBundle> {
    load_bundle_file(path, ModelKind::Cardio)
}

pub fn load_ecg_model_file(path: impl AsRef<Path>) -> Result<WeightBundle> {
    load_bundle_file(path, ModelKind::Ecg)
}

/// Load `<dir>/<kind artifact>` into the registry. Failure leaves the slot as it was.
pub fn install_from_dir(registry: &ModelRegistry, kind: ModelKind, dir: impl AsRef<Path>) -> Result<()> {
    let path = dir.as_ref().join(kind.artifact_file_name());
    registry.reload_from_file(kind, &path)?;
    Ok(())
}

// ============================================================================
// MODEL INFERENCE (no fallback)
// ============================================================================

pub fn score_cardio_risk(bundle: &WeightBundle, features: &FeatureVector) -> Result<RiskResult> {
    inference::score_cardio(bundle, features, &EngineConfig::default())
}

pub fn score_cardio_risk_with_config(
    bundle: &WeightBundle,
    features: &FeatureVector,
    config: &EngineConfig,
) -> Result<RiskResult> {
    inference::score_cardio(bundle, features, config)
}

pub fn classify_ecg(bundle: &WeightBundle, signal: &SignalBuffer) -> Result<ClassificationResult> {
    inference::classify_ecg(bundle, signal, &EngineConfig::default())
}

pub fn classify_ecg_with_config(
    bundle: &WeightBundle,
    signal: &SignalBuffer,
    config: &EngineConfig,
) -> Result<ClassificationResult> {
    inference::classify_ecg(bundle, signal, config)
}

// ============================================================================
// REGISTRY INFERENCE (tagged fallback + stats)
// ============================================================================

/// Cardio score from the registry's bundle, heuristic if none is loaded
pub fn score_cardio_or_fallback(
    registry: &ModelRegistry,
    features: &FeatureVector,
    config: &EngineConfig,
) -> Result<Inference<RiskResult>> {
    let start = Instant::now();
    let bundle = registry.get(ModelKind::Cardio);
    let bundle = bundle.as_deref().ok_or_else(|| not_loaded(ModelKind::Cardio));

    let result = inference::score_cardio_or_fallback(bundle, features, config)?;
    registry.record_inference(start.elapsed().as_micros() as u64, result.used_fallback());
    Ok(result)
}

/// ECG class from the registry's bundle, morphology rules if none is loaded
pub fn classify_ecg_or_fallback(
    registry: &ModelRegistry,
    signal: &SignalBuffer,
    config: &EngineConfig,
) -> Result<Inference<ClassificationResult>> {
    let start = Instant::now();
    let bundle = registry.get(ModelKind::Ecg);
    let bundle = bundle.as_deref().ok_or_else(|| not_loaded(ModelKind::Ecg));

    let result = inference::classify_ecg_or_fallback(bundle, signal, config)?;
    registry.record_inference(start.elapsed().as_micros() as u64, result.used_fallback());
    Ok(result)
}

pub fn assess_health(
    cardio: Option<&RiskResult>,
    ecg: Option<&ClassificationResult>,
    config: &EngineConfig,
) -> HealthAssessment {
    assessment::assess_health(cardio, ecg, &config.classifier.thresholds)
}

// ============================================================================
// FULL HEALTH CHECK
// ============================================================================

/// Fusion -> features -> cardio (+ ECG) -> combined assessment
pub fn run_health_check(
    registry: &ModelRegistry,
    request: &HealthCheckRequest,
    config: &EngineConfig,
) -> Result<HealthCheckReport> {
    let profile = config.fusion.resolve(&request.records)?;
    let low_trust = profile.low_trust_fields();
    if !low_trust.is_empty() {
        log::warn!("Health check uses synthetic values for {} field(s): {:?}", low_trust.len(), low_trust);
    }

    let features = FeatureVector::from_input(&profile.to_cardio_input())?;
    let cardio = score_cardio_or_fallback(registry, &features, config)?;

    let synthetic = match (&request.signal, request.synthetic_signal) {
        (None, Some(pattern)) => Some(synthetic_ecg(pattern, signal_length(registry), request.seed)?),
        _ => None,
    };
    let signal = request.signal.as_ref().or(synthetic.as_ref());
    let ecg = signal
        .map(|s| classify_ecg_or_fallback(registry, s, config))
        .transpose()?;

    let assessment = assess_health(Some(cardio.result()), ecg.as_ref().map(|e| e.result()), config);

    Ok(HealthCheckReport {
        profile,
        cardio,
        ecg,
        synthetic_signal: synthetic.is_some(),
        assessment,
    })
}

/// Loaded ECG input length, or the default synthetic length
fn signal_length(registry: &ModelRegistry) -> usize {
    registry
        .get(ModelKind::Ecg)
        .map(|b| b.metadata.input_length())
        .filter(|&n| n > 0)
        .unwrap_or(DEFAULT_SYNTHETIC_LENGTH)
}
