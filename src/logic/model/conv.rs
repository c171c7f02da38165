//! Convolutional Network Evaluator
//!
//! ECG classifier: 3 x (conv1d -> ReLU -> maxpool(2)) -> flatten -> dense -> dense -> softmax.
//! Tensor layout trong pass là `[time, channel]`.

use ndarray::{Array1, Array2, Array3};

use super::activation::{relu, softmax};
use super::dense::dense_forward;
use crate::logic::bundle::loader::POOL_SIZE;
use crate::logic::bundle::{LayerWeights, ModelKind, WeightBundle};
use crate::logic::error::{InferenceError, Result};
use crate::logic::features::normalize::normalize_signal;
use crate::logic::features::SignalBuffer;

// ============================================================================
// PRIMITIVES
// ============================================================================

/// Valid, stride-1 conv. `out[t][f] = bias[f] + sum_k sum_c x[t+k][c] * K[k][c][f]`
pub fn conv1d_valid(input: &Array2<f64>, kernel: &Array3<f64>, bias: &Array1<f64>) -> Option<Array2<f64>> {
    let (len, _) = input.dim();
    let (k, c_in, c_out) = kernel.dim();
    if len < k {
        return None;
    }
    let out_len = len - k + 1;

    let mut out = Array2::zeros((out_len, c_out));
    for t in 0..out_len {
        for f in 0..c_out {
            let mut sum = bias[f];
            for tap in 0..k {
                for c in 0..c_in {
                    sum += input[[t + tap, c]] * kernel[[tap, c, f]];
                }
            }
            out[[t, f]] = sum;
        }
    }
    Some(out)
}

/// Window 2, stride 2. A trailing partial window is dropped.
pub fn max_pool1d(input: &Array2<f64>) -> Array2<f64> {
    let (len, channels) = input.dim();
    let out_len = len / POOL_SIZE;

    let mut out = Array2::zeros((out_len, channels));
    for t in 0..out_len {
        for c in 0..channels {
            let start = t * POOL_SIZE;
            let mut m = input[[start, c]];
            for offset in 1..POOL_SIZE {
                m = m.max(input[[start + offset, c]]);
            }
            out[[t, c]] = m;
        }
    }
    out
}

// ============================================================================
// NETWORK
// ============================================================================

type ConvLayer<'a> = (&'a str, &'a Array3<f64>, &'a Array1<f64>);
type DenseLayer<'a> = (&'a str, &'a Array2<f64>, &'a Array1<f64>);

/// Borrowed view over an ECG bundle
#[derive(Debug)]
pub struct ConvNetwork<'a> {
    convs: Vec<ConvLayer<'a>>,
    head: Vec<DenseLayer<'a>>,
    bundle: &'a WeightBundle,
}

impl<'a> ConvNetwork<'a> {
    pub fn from_bundle(bundle: &'a WeightBundle) -> Result<Self> {
        if bundle.kind != ModelKind::Ecg {
            return Err(InferenceError::ModelLoad(format!(
                "conv evaluator needs an ECG bundle, got {}",
                bundle.kind
            )));
        }

        let mut convs = Vec::new();
        let mut head = Vec::new();
        for layer in &bundle.layers {
            match &layer.weights {
                LayerWeights::Conv1d { kernel, bias } => convs.push((layer.name.as_str(), kernel, bias)),
                LayerWeights::Dense { kernel, bias } => head.push((layer.name.as_str(), kernel, bias)),
            }
        }

        if convs.is_empty() || head.is_empty() {
            return Err(InferenceError::ModelLoad(
                "ECG bundle needs conv and dense layers".to_string(),
            ));
        }
        Ok(Self { convs, head, bundle })
    }

    /// Window length the bundle was exported for
    pub fn input_length(&self) -> usize {
        self.bundle.metadata.input_length()
    }

    /// Smallest input whose final pooled stage is non-empty
    pub fn min_signal_length(&self) -> usize {
        self.convs
            .iter()
            .rev()
            .fold(1, |m, (_, kernel, _)| POOL_SIZE * m + kernel.dim().0 - 1)
    }

    pub fn class_labels(&self) -> &[String] {
        &self.bundle.metadata.class_labels
    }

    fn check_length(&self, actual: usize) -> Result<()> {
        let expected = self.input_length();
        if actual < expected {
            return Err(InferenceError::InsufficientSignal { required: expected, actual });
        }
        if actual > expected {
            return Err(InferenceError::shape("ECG input length", expected, actual));
        }
        Ok(())
    }

    /// Conv blocks + flatten (row-major over time x channel)
    pub(crate) fn conv_features(&self, samples: &[f64]) -> Result<Vec<f64>> {
        let insufficient = || InferenceError::InsufficientSignal {
            required: self.min_signal_length(),
            actual: samples.len(),
        };

        let mut x = Array2::from_shape_vec((samples.len(), 1), samples.to_vec())
            .map_err(|e| InferenceError::InvalidInput(e.to_string()))?;

        for (name, kernel, bias) in &self.convs {
            if x.ncols() != kernel.dim().1 {
                return Err(InferenceError::shape(format!("{} channels", name), kernel.dim().1, x.ncols()));
            }
            let mut conv = conv1d_valid(&x, kernel, bias).ok_or_else(insufficient)?;
            conv.mapv_inplace(relu);
            x = max_pool1d(&conv);
            if x.nrows() == 0 {
                return Err(insufficient());
            }
        }

        Ok(x.iter().copied().collect())
    }

    /// Raw logits for a normalized window
    pub fn logits(&self, input: &Array1<f64>) -> Result<Vec<f64>> {
        self.check_length(input.len())?;
        let samples: Vec<f64> = input.iter().copied().collect();
        let mut activations = self.conv_features(&samples)?;

        let last = self.head.len() - 1;
        for (index, (name, kernel, bias)) in self.head.iter().enumerate() {
            if activations.len() != kernel.nrows() {
                return Err(InferenceError::shape(format!("{} input", name), kernel.nrows(), activations.len()));
            }
            activations = dense_forward(kernel, bias, &activations);
            if index != last {
                activations.iter_mut().for_each(|v| *v = relu(*v));
            }
        }
        Ok(activations)
    }

    /// Class probabilities for a normalized window
    pub fn forward(&self, input: &Array1<f64>) -> Result<Vec<f64>> {
        Ok(softmax(&self.logits(input)?))
    }

    /// Normalize a raw signal with the bundle scaler (or z-score) and classify
    pub fn predict(&self, signal: &SignalBuffer) -> Result<Vec<f64>> {
        self.check_length(signal.len())?;
        let normalized = normalize_signal(signal.samples(), self.bundle.scaler.as_ref())?;
        self.forward(&normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::bundle::{fixtures, load_bundle};

    fn bundle(len: usize) -> WeightBundle {
        load_bundle(&fixtures::ecg_artifact(len), ModelKind::Ecg).unwrap()
    }

    #[test]
    fn test_conv1d_valid() {
        let x = Array2::from_shape_vec((4, 1), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let k = Array3::from_shape_vec((2, 1, 1), vec![1.0, -1.0]).unwrap();
        let b = Array1::from(vec![0.5]);
        let out = conv1d_valid(&x, &k, &b).unwrap();
        assert_eq!(out.column(0).to_vec(), vec![-0.5, -0.5, -0.5]);
        assert!(conv1d_valid(&x, &Array3::zeros((5, 1, 1)), &b).is_none());
    }

    #[test]
    fn test_max_pool_drops_partial_window() {
        let x = Array2::from_shape_vec((5, 1), vec![1.0, 3.0, 2.0, 0.0, 9.0]).unwrap();
        assert_eq!(max_pool1d(&x).column(0).to_vec(), vec![3.0, 2.0]);
    }

    #[test]
    fn test_min_signal_length() {
        let b = bundle(fixtures::ECG_MIN_INPUT_LEN);
        let net = ConvNetwork::from_bundle(&b).unwrap();
        assert_eq!(net.min_signal_length(), 22);

        let b = bundle(fixtures::ECG_INPUT_LEN);
        assert_eq!(ConvNetwork::from_bundle(&b).unwrap().min_signal_length(), 22);
    }

    #[test]
    fn test_minimum_length_boundary() {
        let b = bundle(fixtures::ECG_MIN_INPUT_LEN);
        let net = ConvNetwork::from_bundle(&b).unwrap();

        let ok = net.forward(&Array1::linspace(-1.0, 1.0, 22)).unwrap();
        assert_eq!(ok.len(), 5);

        let err = net.forward(&Array1::linspace(-1.0, 1.0, 21)).unwrap_err();
        assert!(matches!(
            err,
            InferenceError::InsufficientSignal { required: 22, actual: 21 }
        ));

        // the stack itself collapses one sample below the minimum
        let samples: Vec<f64> = (0..21).map(|i| i as f64 / 21.0).collect();
        assert!(matches!(
            net.conv_features(&samples).unwrap_err(),
            InferenceError::InsufficientSignal { required: 22, actual: 21 }
        ));
        assert_eq!(net.conv_features(&[0.0; 22]).unwrap().len(), 2);
    }

    #[test]
    fn test_too_long_is_shape_mismatch() {
        let b = bundle(fixtures::ECG_MIN_INPUT_LEN);
        let net = ConvNetwork::from_bundle(&b).unwrap();
        let err = net.forward(&Array1::zeros(23)).unwrap_err();
        assert!(matches!(err, InferenceError::ShapeMismatch { expected: 22, actual: 23, .. }));
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let b = bundle(fixtures::ECG_INPUT_LEN);
        let net = ConvNetwork::from_bundle(&b).unwrap();
        let samples: Vec<f64> = (0..187).map(|i| (i as f64 * 0.21).sin()).collect();
        let signal = SignalBuffer::new(samples).unwrap();

        let p = net.predict(&signal).unwrap();
        assert_eq!(p.len(), 5);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_deterministic() {
        let b = bundle(fixtures::ECG_INPUT_LEN);
        let net = ConvNetwork::from_bundle(&b).unwrap();
        let signal = SignalBuffer::new((0..187).map(|i| ((i * 7) % 13) as f64).collect()).unwrap();

        let first = net.predict(&signal).unwrap();
        for _ in 0..5 {
            let again = net.predict(&signal).unwrap();
            let same = first.iter().zip(&again).all(|(a, b)| a.to_bits() == b.to_bits());
            assert!(same);
        }
    }
}
