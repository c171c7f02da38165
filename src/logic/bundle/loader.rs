//! Weight Bundle Loader
//!
//! Parse artifact JSON (weights + scaler + metadata) thành `WeightBundle`.
//! Mọi kiểm tra shape làm ở đây, một lần duy nhất lúc load.

use std::collections::BTreeMap;
use std::path::Path;

use ndarray::{Array1, Array2, Array3};
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use super::types::{LayerWeights, Metadata, ModelKind, NamedLayer, WeightBundle};
use crate::logic::error::{InferenceError, Result};
use crate::logic::features::layout::FEATURE_COUNT;
use crate::logic::features::normalize::Scaler;

// ============================================================================
// ARCHITECTURE CONSTANTS
// ============================================================================

pub const CARDIO_DENSE_LAYERS: usize = 5;
pub const ECG_CONV_LAYERS: usize = 3;
pub const ECG_DENSE_LAYERS: usize = 2;

/// Max-pool window and stride after every conv layer
pub const POOL_SIZE: usize = 2;

// ============================================================================
// RAW ARTIFACT (serde)
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawArtifact {
    weights: BTreeMap<String, RawLayer>,
    #[serde(default)]
    scaler: Option<RawScaler>,
    #[serde(default)]
    metadata: Option<RawMetadata>,
}

#[derive(Debug, Deserialize)]
struct RawLayer {
    kernel: Value,
    bias: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct RawScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawMetadata {
    #[serde(default)]
    input_shape: Vec<usize>,
    #[serde(default)]
    output_classes: Option<usize>,
    #[serde(default)]
    class_labels: Option<Vec<String>>,
    /// Keras export style: `{"0": "Normal", ...}`
    #[serde(default)]
    classes: Option<BTreeMap<String, String>>,
    #[serde(default)]
    model_type: Option<String>,
    #[serde(default)]
    layer_order: Option<Vec<String>>,
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Parse and validate an artifact
pub fn load_bundle(artifact: &str, kind: ModelKind) -> Result<WeightBundle> {
    let raw: RawArtifact = serde_json::from_str(artifact)
        .map_err(|e| InferenceError::ModelLoad(format!("malformed {} artifact: {}", kind, e)))?;

    let fingerprint = hex::encode(Sha256::digest(artifact.as_bytes()));
    let metadata_raw = raw.metadata.unwrap_or_default();

    let layers = order_layers(raw.weights, metadata_raw.layer_order.as_deref())?;
    let scaler = match raw.scaler {
        Some(s) => Some(Scaler::new(s.mean, s.scale)?),
        None => None,
    };

    let metadata = match kind {
        ModelKind::Cardio => validate_cardio(&layers, scaler.as_ref(), metadata_raw)?,
        ModelKind::Ecg => validate_ecg(&layers, scaler.as_ref(), metadata_raw)?,
    };

    let bundle = WeightBundle {
        kind,
        layers,
        scaler,
        metadata,
        fingerprint,
        loaded_at: chrono::Utc::now(),
    };

    log::info!(
        "Loaded {} bundle: layers={:?}, params={}, sha256={}",
        kind,
        bundle.layer_names(),
        bundle.parameter_count(),
        &bundle.fingerprint[..12]
    );

    Ok(bundle)
}

/// Read and parse an artifact from disk
pub fn load_bundle_file(path: impl AsRef<Path>, kind: ModelKind) -> Result<WeightBundle> {
    let path = path.as_ref();
    log::info!("Loading {} model from: {}", kind, path.display());

    if !path.exists() {
        return Err(InferenceError::ModelLoad(format!(
            "Model not found: {}",
            path.display()
        )));
    }

    let artifact = std::fs::read_to_string(path)?;
    load_bundle(&artifact, kind)
}

// ============================================================================
// LAYER PARSING & ORDERING
// ============================================================================

/// Split a Keras layer name into (base, numeric suffix). No suffix sorts as 0.
fn keras_sort_key(name: &str) -> (String, u64) {
    if let Some((base, suffix)) = name.rsplit_once('_') {
        if !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(n) = suffix.parse::<u64>() {
                return (base.to_string(), n);
            }
        }
    }
    (name.to_string(), 0)
}

fn order_layers(
    weights: BTreeMap<String, RawLayer>,
    explicit_order: Option<&[String]>,
) -> Result<Vec<NamedLayer>> {
    if weights.is_empty() {
        return Err(InferenceError::ModelLoad("artifact has no layers".to_string()));
    }

    let mut parsed: Vec<NamedLayer> = weights
        .into_iter()
        .map(|(name, raw)| {
            let weights = parse_layer(&name, raw)?;
            Ok(NamedLayer { name, weights })
        })
        .collect::<Result<_>>()?;

    match explicit_order {
        Some(order) => {
            if order.len() != parsed.len() {
                return Err(InferenceError::ModelLoad(format!(
                    "layer_order lists {} layers but artifact has {}",
                    order.len(),
                    parsed.len()
                )));
            }
            let mut ordered = Vec::with_capacity(parsed.len());
            for name in order {
                let pos = parsed.iter().position(|l| &l.name == name).ok_or_else(|| {
                    InferenceError::ModelLoad(format!("layer_order names unknown layer '{}'", name))
                })?;
                ordered.push(parsed.swap_remove(pos));
            }
            Ok(ordered)
        }
        None => {
            // conv block first, then dense head
            parsed.sort_by(|a, b| {
                b.weights
                    .is_conv()
                    .cmp(&a.weights.is_conv())
                    .then_with(|| keras_sort_key(&a.name).cmp(&keras_sort_key(&b.name)))
            });
            Ok(parsed)
        }
    }
}

fn as_number(name: &str, value: &Value) -> Result<f64> {
    let n = value.as_f64().ok_or_else(|| {
        InferenceError::ModelLoad(format!("layer '{}' kernel has non-numeric entry {}", name, value))
    })?;
    if !n.is_finite() {
        return Err(InferenceError::ModelLoad(format!(
            "layer '{}' kernel has non-finite entry",
            name
        )));
    }
    Ok(n)
}

fn as_rows<'a>(name: &str, value: &'a Value) -> Result<&'a Vec<Value>> {
    value.as_array().ok_or_else(|| {
        InferenceError::ModelLoad(format!("layer '{}' kernel is not a nested array", name))
    })
}

fn parse_layer(name: &str, raw: RawLayer) -> Result<LayerWeights> {
    if let Some(i) = raw.bias.iter().position(|b| !b.is_finite()) {
        return Err(InferenceError::ModelLoad(format!(
            "layer '{}' bias[{}] is not finite",
            name, i
        )));
    }
    let bias = Array1::from(raw.bias);

    let rows = as_rows(name, &raw.kernel)?;
    let first = rows.first().ok_or_else(|| {
        InferenceError::ModelLoad(format!("layer '{}' kernel is empty", name))
    })?;
    let depth3 = first.as_array().and_then(|r| r.first()).is_some_and(Value::is_array);

    let weights = if depth3 {
        // [k][c_in][c_out]
        let k = rows.len();
        let c_in = as_rows(name, first)?.len();
        let c_out = as_rows(name, &as_rows(name, first)?[0])?.len();
        let mut flat = Vec::with_capacity(k * c_in * c_out);
        for tap in rows {
            let tap = as_rows(name, tap)?;
            if tap.len() != c_in {
                return Err(InferenceError::shape(format!("{} kernel channels", name), c_in, tap.len()));
            }
            for channel in tap {
                let channel = as_rows(name, channel)?;
                if channel.len() != c_out {
                    return Err(InferenceError::shape(format!("{} kernel filters", name), c_out, channel.len()));
                }
                for v in channel {
                    flat.push(as_number(name, v)?);
                }
            }
        }
        let kernel = Array3::from_shape_vec((k, c_in, c_out), flat)
            .map_err(|e| InferenceError::ModelLoad(format!("layer '{}': {}", name, e)))?;
        LayerWeights::Conv1d { kernel, bias }
    } else {
        // [in][out]
        let n_in = rows.len();
        let n_out = as_rows(name, first)?.len();
        let mut flat = Vec::with_capacity(n_in * n_out);
        for row in rows {
            let row = as_rows(name, row)?;
            if row.len() != n_out {
                return Err(InferenceError::shape(format!("{} kernel row", name), n_out, row.len()));
            }
            for v in row {
                flat.push(as_number(name, v)?);
            }
        }
        let kernel = Array2::from_shape_vec((n_in, n_out), flat)
            .map_err(|e| InferenceError::ModelLoad(format!("layer '{}': {}", name, e)))?;
        LayerWeights::Dense { kernel, bias }
    };

    if weights.bias().len() != weights.out_width() {
        return Err(InferenceError::shape(
            format!("{} bias", name),
            weights.out_width(),
            weights.bias().len(),
        ));
    }
    if weights.out_width() == 0 {
        return Err(InferenceError::ModelLoad(format!("layer '{}' has zero outputs", name)));
    }

    Ok(weights)
}

// ============================================================================
// ARCHITECTURE VALIDATION
// ============================================================================

fn check_dense_chain(dense: &[&NamedLayer], first_in: usize) -> Result<()> {
    let mut width = first_in;
    for layer in dense {
        if layer.weights.in_width() != width {
            return Err(InferenceError::shape(
                format!("{} input width", layer.name),
                width,
                layer.weights.in_width(),
            ));
        }
        width = layer.weights.out_width();
    }
    Ok(())
}

fn validate_cardio(
    layers: &[NamedLayer],
    scaler: Option<&Scaler>,
    raw: RawMetadata,
) -> Result<Metadata> {
    let dense: Vec<&NamedLayer> = layers.iter().filter(|l| l.weights.is_dense()).collect();
    if dense.len() != layers.len() {
        return Err(InferenceError::ModelLoad(
            "cardio model must contain only dense layers".to_string(),
        ));
    }
    if dense.len() != CARDIO_DENSE_LAYERS {
        return Err(InferenceError::shape("cardio dense layer count", CARDIO_DENSE_LAYERS, dense.len()));
    }

    check_dense_chain(&dense, FEATURE_COUNT)?;

    let out = dense[dense.len() - 1].weights.out_width();
    if out != 1 {
        return Err(InferenceError::shape("cardio output width", 1, out));
    }

    let scaler = scaler.ok_or_else(|| {
        InferenceError::ModelLoad("cardio artifact is missing its scaler".to_string())
    })?;
    if scaler.len() != FEATURE_COUNT {
        return Err(InferenceError::shape("cardio scaler", FEATURE_COUNT, scaler.len()));
    }

    if !raw.input_shape.is_empty() && raw.input_shape != [FEATURE_COUNT] {
        return Err(InferenceError::shape(
            "cardio metadata input_shape",
            FEATURE_COUNT,
            raw.input_shape.first().copied().unwrap_or(0),
        ));
    }

    Ok(Metadata {
        input_shape: vec![FEATURE_COUNT],
        output_classes: 1,
        class_labels: Vec::new(),
        model_type: raw.model_type.unwrap_or_else(|| "dense_regression".to_string()),
    })
}

/// Sequence length after `valid conv(k) -> pool(2)`. `None` when it collapses.
pub fn conv_block_output_len(input_len: usize, kernel_size: usize) -> Option<usize> {
    if input_len < kernel_size {
        return None;
    }
    let pooled = (input_len - kernel_size + 1) / POOL_SIZE;
    (pooled > 0).then_some(pooled)
}

fn class_labels(raw: &RawMetadata) -> Result<Vec<String>> {
    if let Some(labels) = &raw.class_labels {
        return Ok(labels.clone());
    }
    let classes = raw.classes.as_ref().ok_or_else(|| {
        InferenceError::ModelLoad("ECG metadata has no class_labels".to_string())
    })?;

    let mut indexed = Vec::with_capacity(classes.len());
    for (key, label) in classes {
        let index: usize = key.parse().map_err(|_| {
            InferenceError::ModelLoad(format!("class index '{}' is not a number", key))
        })?;
        indexed.push((index, label.clone()));
    }
    indexed.sort_by_key(|(i, _)| *i);

    for (expected, (index, _)) in indexed.iter().enumerate() {
        if *index != expected {
            return Err(InferenceError::ModelLoad(format!(
                "class indices must be contiguous from 0, missing {}",
                expected
            )));
        }
    }
    Ok(indexed.into_iter().map(|(_, label)| label).collect())
}

fn validate_ecg(layers: &[NamedLayer], scaler: Option<&Scaler>, raw: RawMetadata) -> Result<Metadata> {
    let conv: Vec<&NamedLayer> = layers.iter().filter(|l| l.weights.is_conv()).collect();
    let dense: Vec<&NamedLayer> = layers.iter().filter(|l| l.weights.is_dense()).collect();

    if conv.len() != ECG_CONV_LAYERS {
        return Err(InferenceError::shape("ECG conv layer count", ECG_CONV_LAYERS, conv.len()));
    }
    if dense.len() != ECG_DENSE_LAYERS {
        return Err(InferenceError::shape("ECG dense layer count", ECG_DENSE_LAYERS, dense.len()));
    }
    // evaluation order must be conv block then dense head
    if layers.iter().take(ECG_CONV_LAYERS).any(|l| !l.weights.is_conv()) {
        return Err(InferenceError::ModelLoad(
            "ECG layer order must list conv layers before dense layers".to_string(),
        ));
    }

    let input_len = raw.input_shape.first().copied().ok_or_else(|| {
        InferenceError::ModelLoad("ECG metadata is missing input_shape".to_string())
    })?;
    if let Some(&channels) = raw.input_shape.get(1) {
        if channels != 1 {
            return Err(InferenceError::shape("ECG input channels", 1, channels));
        }
    }

    let mut channels = 1;
    let mut length = input_len;
    for layer in &conv {
        if layer.weights.in_width() != channels {
            return Err(InferenceError::shape(
                format!("{} input channels", layer.name),
                channels,
                layer.weights.in_width(),
            ));
        }
        let kernel_size = match &layer.weights {
            LayerWeights::Conv1d { kernel, .. } => kernel.dim().0,
            LayerWeights::Dense { .. } => 0,
        };
        length = conv_block_output_len(length, kernel_size).ok_or_else(|| {
            InferenceError::ModelLoad(format!(
                "input length {} collapses to zero at layer {}",
                input_len, layer.name
            ))
        })?;
        channels = layer.weights.out_width();
    }

    check_dense_chain(&dense, length * channels)?;

    let labels = class_labels(&raw)?;
    let logits = dense[dense.len() - 1].weights.out_width();
    let output_classes = raw.output_classes.unwrap_or(labels.len());
    if output_classes != labels.len() {
        return Err(InferenceError::shape("ECG class labels", output_classes, labels.len()));
    }
    if logits != output_classes {
        return Err(InferenceError::shape("ECG output width", output_classes, logits));
    }

    if let Some(s) = scaler {
        if s.len() != input_len && s.len() != 1 {
            return Err(InferenceError::shape("ECG scaler", input_len, s.len()));
        }
    }

    Ok(Metadata {
        input_shape: if raw.input_shape.len() > 1 { raw.input_shape } else { vec![input_len, 1] },
        output_classes,
        class_labels: labels,
        model_type: raw.model_type.unwrap_or_else(|| "conv1d_classifier".to_string()),
    })
}
