//! Small hand-checkable artifacts shared by unit tests.
//!
//! Every weight is a multiple of 1/16 so JSON text parses back to the
//! exact same f64 values. Expected outputs were computed offline with the
//! same summation order as `dense_forward`.

use serde_json::{json, Value};

/// Cardio widths: 16 -> 4 -> 3 -> 2 -> 2 -> 1
pub const CARDIO_WIDTHS: [usize; 6] = [16, 4, 3, 2, 2, 1];

/// Production ECG window length
pub const ECG_INPUT_LEN: usize = 187;

/// Smallest window the fixture conv stack (k = 3, 3, 3) accepts
pub const ECG_MIN_INPUT_LEN: usize = 22;

pub const ECG_CLASSES: [&str; 5] = ["Normal", "Supraventricular", "Ventricular", "Fusion", "Unknown"];

pub const CARDIO_SCALER_MEAN: [f64; 16] = [
    18000.0, 1.5, 168.0, 74.0, 128.0, 96.0, 1.5, 1.25, 0.125, 0.0625, 0.75, 27.0, 50.0, 120.0, 0.5,
    2.75,
];
pub const CARDIO_SCALER_SCALE: [f64; 16] = [
    2500.0, 0.5, 8.0, 14.0, 16.0, 16.0, 0.75, 0.5, 0.25, 0.25, 0.5, 5.0, 7.0, 32.0, 0.5, 1.0,
];

pub fn cardio_weight(layer: usize, j: usize, i: usize) -> f64 {
    (((j * 3 + i * 3 + layer) % 7) as f64 - 3.0) / 2.0
}

pub fn cardio_bias(layer: usize, i: usize) -> f64 {
    ((i + layer) % 3) as f64 / 16.0 - 0.0625
}

fn dense_json(n_in: usize, n_out: usize, w: impl Fn(usize, usize) -> f64, b: impl Fn(usize) -> f64) -> Value {
    let kernel: Vec<Vec<f64>> = (0..n_in).map(|j| (0..n_out).map(|i| w(j, i)).collect()).collect();
    let bias: Vec<f64> = (0..n_out).map(b).collect();
    json!({ "kernel": kernel, "bias": bias })
}

pub fn cardio_artifact() -> String {
    let mut weights = serde_json::Map::new();
    for layer in 0..5 {
        weights.insert(
            format!("dense_{}", layer + 5),
            dense_json(
                CARDIO_WIDTHS[layer],
                CARDIO_WIDTHS[layer + 1],
                |j, i| cardio_weight(layer, j, i),
                |i| cardio_bias(layer, i),
            ),
        );
    }

    json!({
        "weights": weights,
        "scaler": { "mean": CARDIO_SCALER_MEAN, "scale": CARDIO_SCALER_SCALE },
    })
    .to_string()
}

pub fn conv_weight(layer: usize, t: usize, c: usize, f: usize) -> f64 {
    (((t * 3 + c * 5 + f * 7 + layer) % 9) as f64 - 4.0) / 8.0
}

/// conv(k=3): 1 -> 2 -> 2 -> 2 channels, dense flatten -> 4 -> 5
pub fn ecg_artifact(input_len: usize) -> String {
    let channels = [1usize, 2, 2, 2];
    let mut weights = serde_json::Map::new();
    let mut length = input_len;

    for layer in 0..3 {
        let kernel: Vec<Vec<Vec<f64>>> = (0..3)
            .map(|t| {
                (0..channels[layer])
                    .map(|c| (0..channels[layer + 1]).map(|f| conv_weight(layer, t, c, f)).collect())
                    .collect()
            })
            .collect();
        let bias: Vec<f64> = (0..channels[layer + 1]).map(|f| ((f % 3) as f64 - 1.0) / 16.0).collect();
        let name = if layer == 0 { "conv1d".to_string() } else { format!("conv1d_{}", layer) };
        weights.insert(name, json!({ "kernel": kernel, "bias": bias }));
        length = length.saturating_sub(2) / 2;
    }

    let flat = length * channels[3];
    weights.insert(
        "dense".to_string(),
        dense_json(flat, 4, |j, i| (((j + 2 * i) % 5) as f64 - 2.0) / 16.0, |i| i as f64 / 16.0),
    );
    weights.insert(
        "dense_1".to_string(),
        dense_json(4, 5, |j, i| (((3 * j + i) % 4) as f64 - 1.5) / 4.0, |_| 0.0),
    );

    let classes: serde_json::Map<String, Value> = ECG_CLASSES
        .iter()
        .enumerate()
        .map(|(i, label)| (i.to_string(), json!(label)))
        .collect();

    json!({
        "weights": weights,
        "metadata": {
            "input_shape": [input_len, 1],
            "output_classes": 5,
            "model_type": "cnn_mitbih",
            "classes": classes,
        },
    })
    .to_string()
}

/// Two-class variant whose head produces identical logits
pub fn ecg_tied_artifact() -> String {
    let mut artifact: Value = match serde_json::from_str(&ecg_artifact(ECG_MIN_INPUT_LEN)) {
        Ok(v) => v,
        Err(e) => panic!("fixture: {}", e),
    };
    artifact["weights"]["dense_1"] = dense_json(4, 2, |_, _| 0.25, |_| 0.0);
    artifact["metadata"]["output_classes"] = json!(2);
    artifact["metadata"]["classes"] = json!({ "0": "Normal", "1": "Ventricular" });
    artifact.to_string()
}
