//! ECG Signal Features - Morphology & statistics
//!
//! Trích xuất heart rate, rhythm, QRS morphology từ tín hiệu ECG.
//! Dùng cho rule-based fallback và anomaly score.

use serde::{Deserialize, Serialize};

use super::signal::ECG_SAMPLE_RATE_HZ;

// ============================================================================
// CONSTANTS
// ============================================================================

/// R-peak amplitude threshold on the min-max normalized signal
pub const R_PEAK_THRESHOLD: f64 = 0.6;

/// Peaks closer than this (samples) are merged into the earlier one
pub const R_PEAK_MIN_DISTANCE: usize = 50;

/// Search radius around a peak when measuring QRS width
pub const QRS_SEARCH_RADIUS: usize = 20;

/// QRS boundary level on the normalized signal
pub const QRS_BOUNDARY_LEVEL: f64 = 0.3;

/// Heart rate reported when fewer than 2 peaks are found
pub const DEFAULT_HEART_RATE: f64 = 60.0;

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rhythm {
    Regular,
    SlightlyIrregular,
    Irregular,
    /// Fewer than 3 R-peaks
    InsufficientData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Morphology {
    Narrow,
    Normal,
    Wide,
    NoPeaks,
}

/// Features computed from one ECG window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalFeatures {
    /// Beats per minute, rounded
    pub heart_rate: f64,
    pub rhythm: Rhythm,
    pub morphology: Morphology,
    pub peak_count: usize,
    pub mean: f64,
    pub std: f64,
    pub variance: f64,
    pub min: f64,
    pub max: f64,
}

// ============================================================================
// EXTRACTION
// ============================================================================

/// Min-max scale into [0, 1]. A flat signal is returned unchanged.
pub fn min_max_scale(samples: &[f64]) -> Vec<f64> {
    let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
    let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if samples.is_empty() || range == 0.0 {
        return samples.to_vec();
    }
    samples.iter().map(|v| (v - min) / range).collect()
}

/// Local maxima above the threshold, at least `R_PEAK_MIN_DISTANCE` apart
pub fn detect_r_peaks(signal: &[f64]) -> Vec<usize> {
    let mut peaks: Vec<usize> = Vec::new();

    for i in 1..signal.len().saturating_sub(1) {
        let is_peak = signal[i] > R_PEAK_THRESHOLD
            && signal[i] > signal[i - 1]
            && signal[i] > signal[i + 1];
        if !is_peak {
            continue;
        }
        match peaks.last() {
            Some(&last) if i - last <= R_PEAK_MIN_DISTANCE => {}
            _ => peaks.push(i),
        }
    }

    peaks
}

fn rr_intervals(peaks: &[usize]) -> Vec<f64> {
    peaks.windows(2).map(|w| (w[1] - w[0]) as f64).collect()
}

pub fn heart_rate(peaks: &[usize]) -> f64 {
    if peaks.len() < 2 {
        return DEFAULT_HEART_RATE;
    }
    let intervals = rr_intervals(peaks);
    let avg = intervals.iter().sum::<f64>() / intervals.len() as f64;
    (60.0 * ECG_SAMPLE_RATE_HZ / avg).round()
}

/// Coefficient of variation of the R-R intervals
pub fn analyze_rhythm(peaks: &[usize]) -> Rhythm {
    if peaks.len() < 3 {
        return Rhythm::InsufficientData;
    }
    let intervals = rr_intervals(peaks);
    let n = intervals.len() as f64;
    let avg = intervals.iter().sum::<f64>() / n;
    let variance = intervals.iter().map(|i| (i - avg).powi(2)).sum::<f64>() / n;
    let cv = variance.sqrt() / avg;

    if cv < 0.1 {
        Rhythm::Regular
    } else if cv < 0.2 {
        Rhythm::SlightlyIrregular
    } else {
        Rhythm::Irregular
    }
}

/// Average QRS width around each peak
pub fn analyze_morphology(signal: &[f64], peaks: &[usize]) -> Morphology {
    if peaks.is_empty() || signal.is_empty() {
        return Morphology::NoPeaks;
    }

    let last = signal.len() - 1;
    let total: usize = peaks
        .iter()
        .map(|&peak| {
            let start = peak.saturating_sub(QRS_SEARCH_RADIUS);
            let end = (peak + QRS_SEARCH_RADIUS).min(last);

            let qrs_start = (start..=peak)
                .rev()
                .find(|&i| signal[i] < QRS_BOUNDARY_LEVEL)
                .unwrap_or(peak);
            let qrs_end = (peak..=end)
                .find(|&i| signal[i] < QRS_BOUNDARY_LEVEL)
                .unwrap_or(peak);

            qrs_end - qrs_start
        })
        .sum();
    let avg_width = total as f64 / peaks.len() as f64;

    if avg_width < 25.0 {
        Morphology::Narrow
    } else if avg_width < 35.0 {
        Morphology::Normal
    } else {
        Morphology::Wide
    }
}

/// Full feature extraction. Operates on the min-max scaled signal.
pub fn extract_signal_features(samples: &[f64]) -> SignalFeatures {
    let signal = min_max_scale(samples);
    let peaks = detect_r_peaks(&signal);

    let (mean, variance, min, max) = if signal.is_empty() {
        (0.0, 0.0, 0.0, 0.0)
    } else {
        let n = signal.len() as f64;
        let mean = signal.iter().sum::<f64>() / n;
        let variance = signal.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        (
            mean,
            variance,
            signal.iter().copied().fold(f64::INFINITY, f64::min),
            signal.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        )
    };

    SignalFeatures {
        heart_rate: heart_rate(&peaks),
        rhythm: analyze_rhythm(&peaks),
        morphology: analyze_morphology(&signal, &peaks),
        peak_count: peaks.len(),
        mean,
        std: variance.sqrt(),
        variance,
        min,
        max,
    }
}

/// Additive anomaly score in [0, 1]
pub fn anomaly_score(features: &SignalFeatures) -> f64 {
    let mut score: f64 = 0.0;

    if features.heart_rate < 50.0 || features.heart_rate > 150.0 {
        score += 0.3;
    }
    if features.rhythm == Rhythm::Irregular {
        score += 0.3;
    }
    if features.morphology == Morphology::Wide {
        score += 0.2;
    }
    if features.std > 0.4 {
        score += 0.2;
    }

    score.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Spikes to 1.0 every `period` samples over a zero baseline
    fn spike_train(len: usize, period: usize, offset: usize) -> Vec<f64> {
        (0..len)
            .map(|i| if i >= offset && (i - offset) % period == 0 { 1.0 } else { 0.0 })
            .collect()
    }

    #[test]
    fn test_detect_peaks_and_heart_rate() {
        let signal = spike_train(400, 90, 10);
        let peaks = detect_r_peaks(&signal);
        assert_eq!(peaks, vec![10, 100, 190, 280, 370]);
        // 60 * 360 / 90
        assert_eq!(heart_rate(&peaks), 240.0);
        assert_eq!(analyze_rhythm(&peaks), Rhythm::Regular);
    }

    #[test]
    fn test_close_peaks_filtered() {
        let mut signal = vec![0.0; 100];
        signal[10] = 1.0;
        signal[40] = 0.9;
        signal[70] = 0.8;
        assert_eq!(detect_r_peaks(&signal), vec![10, 70]);
    }

    #[test]
    fn test_default_heart_rate() {
        assert_eq!(heart_rate(&[5]), DEFAULT_HEART_RATE);
        assert_eq!(analyze_rhythm(&[5, 60]), Rhythm::InsufficientData);
    }

    #[test]
    fn test_irregular_rhythm() {
        assert_eq!(analyze_rhythm(&[0, 60, 200, 260]), Rhythm::Irregular);
    }

    #[test]
    fn test_narrow_morphology() {
        let signal = spike_train(200, 80, 20);
        let peaks = detect_r_peaks(&signal);
        // Single-sample spikes: width 2 around each peak
        assert_eq!(analyze_morphology(&signal, &peaks), Morphology::Narrow);
        assert_eq!(analyze_morphology(&signal, &[]), Morphology::NoPeaks);
    }

    #[test]
    fn test_wide_morphology() {
        // Complex spans 43..=77, boundaries found at 42 and 78
        let mut signal = vec![0.0; 120];
        for (i, v) in signal.iter_mut().enumerate().take(78).skip(43) {
            *v = if i == 60 { 1.0 } else { 0.8 };
        }
        assert_eq!(analyze_morphology(&signal, &[60]), Morphology::Wide);

        // No boundary inside the search window counts as zero width
        let plateau = vec![0.8; 120];
        assert_eq!(analyze_morphology(&plateau, &[60]), Morphology::Narrow);
    }

    #[test]
    fn test_flat_signal() {
        let features = extract_signal_features(&[0.5; 50]);
        assert_eq!(features.peak_count, 0);
        assert_eq!(features.morphology, Morphology::NoPeaks);
        assert_eq!(features.heart_rate, DEFAULT_HEART_RATE);
        assert_eq!(features.std, 0.0);
        assert_eq!(anomaly_score(&features), 0.0);
    }

    #[test]
    fn test_anomaly_score_capped() {
        let features = SignalFeatures {
            heart_rate: 180.0,
            rhythm: Rhythm::Irregular,
            morphology: Morphology::Wide,
            peak_count: 4,
            mean: 0.5,
            std: 0.45,
            variance: 0.2025,
            min: 0.0,
            max: 1.0,
        };
        assert_eq!(anomaly_score(&features), 1.0);
    }
}
