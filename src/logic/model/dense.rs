//! Dense Network Evaluator
//!
//! Forward pass 16 -> ... -> 1 cho cardio model.
//! Vòng lặp tuần tự, thứ tự cộng cố định => kết quả bit-reproducible.

use ndarray::{Array1, Array2};

use super::activation::{relu, sigmoid};
use crate::logic::bundle::{LayerWeights, ModelKind, WeightBundle};
use crate::logic::error::{InferenceError, Result};
use crate::logic::features::normalize::normalize;
use crate::logic::features::FeatureVector;

/// `out[i] = bias[i] + sum_j x[j] * W[j][i]`, j ascending
pub fn dense_forward(kernel: &Array2<f64>, bias: &Array1<f64>, input: &[f64]) -> Vec<f64> {
    let (n_in, n_out) = kernel.dim();
    debug_assert_eq!(input.len(), n_in);

    let mut out = Vec::with_capacity(n_out);
    for i in 0..n_out {
        let mut sum = bias[i];
        for j in 0..n_in {
            sum += input[j] * kernel[[j, i]];
        }
        out.push(sum);
    }
    out
}

/// Borrowed view over the dense layers of a bundle
#[derive(Debug)]
pub struct DenseNetwork<'a> {
    layers: Vec<(&'a str, &'a Array2<f64>, &'a Array1<f64>)>,
    bundle: &'a WeightBundle,
}

impl<'a> DenseNetwork<'a> {
    pub fn from_bundle(bundle: &'a WeightBundle) -> Result<Self> {
        if bundle.kind != ModelKind::Cardio {
            return Err(InferenceError::ModelLoad(format!(
                "dense evaluator needs a cardio bundle, got {}",
                bundle.kind
            )));
        }

        let layers = bundle
            .dense_layers()
            .filter_map(|l| match &l.weights {
                LayerWeights::Dense { kernel, bias } => Some((l.name.as_str(), kernel, bias)),
                LayerWeights::Conv1d { .. } => None,
            })
            .collect::<Vec<_>>();

        if layers.is_empty() {
            return Err(InferenceError::ModelLoad("bundle has no dense layers".to_string()));
        }
        Ok(Self { layers, bundle })
    }

    pub fn input_width(&self) -> usize {
        self.layers[0].1.nrows()
    }

    /// Hidden layers use ReLU, the last one sigmoid. Input must already be normalized.
    pub fn evaluate(&self, input: &Array1<f64>) -> Result<f64> {
        let expected = self.input_width();
        if input.len() != expected {
            return Err(InferenceError::shape(
                format!("{} input", self.layers[0].0),
                expected,
                input.len(),
            ));
        }

        let mut activations: Vec<f64> = input.iter().copied().collect();
        let last = self.layers.len() - 1;

        for (index, (name, kernel, bias)) in self.layers.iter().enumerate() {
            if activations.len() != kernel.nrows() {
                return Err(InferenceError::shape(format!("{} input", name), kernel.nrows(), activations.len()));
            }
            let mut out = dense_forward(kernel, bias, &activations);
            if index == last {
                out.iter_mut().for_each(|v| *v = sigmoid(*v));
            } else {
                out.iter_mut().for_each(|v| *v = relu(*v));
            }
            activations = out;
        }

        activations.first().copied().ok_or_else(|| {
            InferenceError::shape("cardio output", 1, 0)
        })
    }

    /// Normalize with the bundle scaler, then evaluate
    pub fn predict(&self, features: &FeatureVector) -> Result<f64> {
        let normalized = match &self.bundle.scaler {
            Some(scaler) => normalize(features.as_slice(), scaler)?,
            None => features.to_array(),
        };
        self.evaluate(&normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::bundle::{fixtures, load_bundle};

    fn bundle() -> WeightBundle {
        load_bundle(&fixtures::cardio_artifact(), ModelKind::Cardio).unwrap()
    }

    #[test]
    fn test_dense_forward() {
        let kernel = Array2::from_shape_vec((2, 3), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let bias = Array1::from(vec![0.5, -0.5, 0.0]);
        assert_eq!(dense_forward(&kernel, &bias, &[1.0, -1.0]), vec![-2.5, -3.5, -3.0]);
    }

    #[test]
    fn test_rejects_short_input() {
        let bundle = bundle();
        let net = DenseNetwork::from_bundle(&bundle).unwrap();
        let err = net.evaluate(&Array1::zeros(15)).unwrap_err();
        assert!(matches!(
            err,
            InferenceError::ShapeMismatch { expected: 16, actual: 15, .. }
        ));
    }

    #[test]
    fn test_output_in_unit_interval() {
        let bundle = bundle();
        let net = DenseNetwork::from_bundle(&bundle).unwrap();
        for scale in [-1000.0, -1.0, 0.0, 0.5, 1000.0] {
            let p = net.evaluate(&Array1::from_elem(16, scale)).unwrap();
            assert!((0.0..=1.0).contains(&p), "{}", p);
        }
    }

    #[test]
    fn test_wrong_kind() {
        let ecg = load_bundle(&fixtures::ecg_artifact(fixtures::ECG_MIN_INPUT_LEN), ModelKind::Ecg).unwrap();
        assert!(DenseNetwork::from_bundle(&ecg).is_err());
    }
}
