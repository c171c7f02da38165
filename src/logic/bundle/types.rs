//! Weight Bundle Types
//!
//! Data structures cho weight bundle đã load.
//! KHÔNG chứa logic parse - xem `loader.rs`.

use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2, Array3};
use serde::{Deserialize, Serialize};

use crate::logic::features::normalize::Scaler;

// ============================================================================
// MODEL KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// 5-layer dense regression
    Cardio,
    /// 3x conv block + 2 dense classifier
    Ecg,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Cardio => "cardio",
            ModelKind::Ecg => "ecg",
        }
    }

    /// Artifact file name inside the model directory
    pub fn artifact_file_name(&self) -> &'static str {
        match self {
            ModelKind::Cardio => "cardio_weights.json",
            ModelKind::Ecg => "ecg_weights.json",
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// LAYERS
// ============================================================================

/// Weights of one layer
#[derive(Debug, Clone, PartialEq)]
pub enum LayerWeights {
    /// kernel `[in, out]`
    Dense { kernel: Array2<f64>, bias: Array1<f64> },
    /// kernel `[k, c_in, c_out]`
    Conv1d { kernel: Array3<f64>, bias: Array1<f64> },
}

impl LayerWeights {
    pub fn is_dense(&self) -> bool {
        matches!(self, LayerWeights::Dense { .. })
    }

    pub fn is_conv(&self) -> bool {
        matches!(self, LayerWeights::Conv1d { .. })
    }

    /// Input features (dense) or input channels (conv)
    pub fn in_width(&self) -> usize {
        match self {
            LayerWeights::Dense { kernel, .. } => kernel.nrows(),
            LayerWeights::Conv1d { kernel, .. } => kernel.dim().1,
        }
    }

    /// Output features (dense) or output channels (conv)
    pub fn out_width(&self) -> usize {
        match self {
            LayerWeights::Dense { kernel, .. } => kernel.ncols(),
            LayerWeights::Conv1d { kernel, .. } => kernel.dim().2,
        }
    }

    pub fn bias(&self) -> &Array1<f64> {
        match self {
            LayerWeights::Dense { bias, .. } | LayerWeights::Conv1d { bias, .. } => bias,
        }
    }

    pub fn parameter_count(&self) -> usize {
        match self {
            LayerWeights::Dense { kernel, bias } => kernel.len() + bias.len(),
            LayerWeights::Conv1d { kernel, bias } => kernel.len() + bias.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamedLayer {
    pub name: String,
    pub weights: LayerWeights,
}

// ============================================================================
// METADATA
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub input_shape: Vec<usize>,
    pub output_classes: usize,
    /// Index-ordered labels. Empty for regression models.
    pub class_labels: Vec<String>,
    pub model_type: String,
}

impl Metadata {
    /// Sample count (ECG) or feature count (cardio)
    pub fn input_length(&self) -> usize {
        self.input_shape.first().copied().unwrap_or(0)
    }
}

// ============================================================================
// WEIGHT BUNDLE
// ============================================================================

/// Immutable set of exported weights. Shared read-only through `Arc`.
///
/// Only `load_bundle` builds one, so every bundle has passed shape validation:
///
/// ```compile_fail
/// use health_risk_core::logic::bundle::{Metadata, ModelKind, WeightBundle};
///
/// let _ = WeightBundle {
///     kind: ModelKind::Cardio,
///     layers: Vec::new(),
///     scaler: None,
///     metadata: Metadata {
///         input_shape: vec![16],
///         output_classes: 1,
///         class_labels: Vec::new(),
///         model_type: String::new(),
///     },
///     fingerprint: String::new(),
///     loaded_at: chrono::Utc::now(),
/// };
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct WeightBundle {
    pub(crate) kind: ModelKind,
    /// Evaluation order
    pub(crate) layers: Vec<NamedLayer>,
    pub(crate) scaler: Option<Scaler>,
    pub(crate) metadata: Metadata,
    /// SHA-256 of the artifact bytes (hex)
    pub(crate) fingerprint: String,
    pub(crate) loaded_at: DateTime<Utc>,
}

impl WeightBundle {
    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn layers(&self) -> &[NamedLayer] {
        &self.layers
    }

    pub fn scaler(&self) -> Option<&Scaler> {
        self.scaler.as_ref()
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn conv_layers(&self) -> impl Iterator<Item = &NamedLayer> {
        self.layers.iter().filter(|l| l.weights.is_conv())
    }

    pub fn dense_layers(&self) -> impl Iterator<Item = &NamedLayer> {
        self.layers.iter().filter(|l| l.weights.is_dense())
    }

    pub fn layer(&self, name: &str) -> Option<&NamedLayer> {
        self.layers.iter().find(|l| l.name == name)
    }

    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.name.as_str()).collect()
    }

    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(|l| l.weights.parameter_count()).sum()
    }

    pub fn info(&self) -> BundleInfo {
        BundleInfo {
            kind: self.kind,
            model_type: self.metadata.model_type.clone(),
            layer_names: self.layer_names().into_iter().map(String::from).collect(),
            parameter_count: self.parameter_count(),
            input_shape: self.metadata.input_shape.clone(),
            output_classes: self.metadata.output_classes,
            has_scaler: self.scaler.is_some(),
            fingerprint: self.fingerprint.clone(),
            loaded_at: self.loaded_at,
        }
    }
}

/// Serializable summary for status and logs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleInfo {
    pub kind: ModelKind,
    pub model_type: String,
    pub layer_names: Vec<String>,
    pub parameter_count: usize,
    pub input_shape: Vec<usize>,
    pub output_classes: usize,
    pub has_scaler: bool,
    pub fingerprint: String,
    pub loaded_at: DateTime<Utc>,
}
