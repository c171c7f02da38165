//! Combined Health Assessment
//!
//! Gộp cardio risk (60%) và ECG anomaly (40%) thành một overall score,
//! kèm alerts, action items và lịch đánh giá lại.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::rules::RiskThresholds;
use super::types::{ClassificationResult, RhythmClass, RiskLevel, RiskResult};

// ============================================================================
// CONSTANTS
// ============================================================================

pub const CARDIO_WEIGHT: f64 = 0.6;
pub const ECG_WEIGHT: f64 = 0.4;

/// Overall risk when neither result is available
pub const DEFAULT_OVERALL_RISK: f64 = 0.1;

/// Anomaly score that raises its own alert
pub const ALERT_ANOMALY_SCORE: f64 = 0.8;

/// Trend change below this magnitude is "stable"
pub const TREND_THRESHOLD: f64 = 0.1;

const GENERAL_ACTIONS: [&str; 3] = [
    "Track your daily health data",
    "Do light exercise regularly",
    "Follow a heart-healthy diet plan",
];

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct HealthAssessment {
    pub overall_risk: f64,
    pub overall_level: RiskLevel,
    pub alerts: Vec<String>,
    pub actions: Vec<String>,
    pub next_assessment_days: u32,
    pub next_assessment_at: DateTime<Utc>,
    pub used_fallback: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Stable,
    Worsening,
    InsufficientData,
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskTrend {
    pub trend: Trend,
    pub change: f64,
    pub samples: usize,
}

// ============================================================================
// ASSESSMENT
// ============================================================================

/// Weighted mix of whichever results are present
pub fn overall_risk(cardio: Option<&RiskResult>, ecg: Option<&ClassificationResult>) -> f64 {
    let mut total = 0.0;
    let mut weight = 0.0;

    if let Some(c) = cardio {
        total += c.risk_score * CARDIO_WEIGHT;
        weight += CARDIO_WEIGHT;
    }
    if let Some(e) = ecg {
        total += e.anomaly_score * ECG_WEIGHT;
        weight += ECG_WEIGHT;
    }

    if weight > 0.0 {
        total / weight
    } else {
        DEFAULT_OVERALL_RISK
    }
}

pub fn priority_alerts(cardio: Option<&RiskResult>, ecg: Option<&ClassificationResult>) -> Vec<String> {
    let mut alerts = Vec::new();

    if let Some(c) = cardio {
        if c.risk_level == RiskLevel::High {
            alerts.push("High cardiovascular risk detected".to_string());
        }
    }

    if let Some(e) = ecg {
        match e.predicted_class {
            RhythmClass::Ventricular => alerts.push("Ventricular arrhythmia detected - urgent".to_string()),
            RhythmClass::Supraventricular => alerts.push("Supraventricular arrhythmia detected".to_string()),
            _ => {}
        }
        if e.anomaly_score > ALERT_ANOMALY_SCORE {
            alerts.push("High ECG anomaly score".to_string());
        }
    }

    alerts
}

pub fn action_items(cardio: Option<&RiskResult>, ecg: Option<&ClassificationResult>, overall: f64) -> Vec<String> {
    let mut actions: Vec<String> = Vec::new();
    let mut push = |item: &str| {
        if !actions.iter().any(|a| a == item) {
            actions.push(item.to_string());
        }
    };

    if overall > 0.8 {
        push("Go to the emergency department");
        push("Contact a cardiologist immediately");
    } else if overall > 0.6 {
        push("Book a cardiology appointment this week");
        push("Review your current medications");
    }

    for rec in cardio.iter().flat_map(|c| c.recommendations.iter()) {
        push(rec.as_str());
    }
    for rec in ecg.iter().flat_map(|e| e.recommendations.iter()) {
        push(rec.as_str());
    }

    if overall > 0.3 {
        for action in GENERAL_ACTIONS {
            push(action);
        }
    }

    actions
}

/// Days until the next check, shorter for higher risk
pub fn next_assessment_days(overall: f64) -> u32 {
    if overall > 0.8 {
        3
    } else if overall > 0.6 {
        7
    } else if overall > 0.4 {
        14
    } else {
        30
    }
}

pub fn assess_health(
    cardio: Option<&RiskResult>,
    ecg: Option<&ClassificationResult>,
    thresholds: &RiskThresholds,
) -> HealthAssessment {
    let overall = overall_risk(cardio, ecg);
    let days = next_assessment_days(overall);
    let used_fallback =
        cardio.map_or(false, |c| c.used_fallback) || ecg.map_or(false, |e| e.used_fallback);

    log::debug!(
        "Health assessment: overall={:.3}, cardio={}, ecg={}",
        overall,
        cardio.is_some(),
        ecg.is_some()
    );

    HealthAssessment {
        overall_risk: overall,
        overall_level: thresholds.level_for(overall),
        alerts: priority_alerts(cardio, ecg),
        actions: action_items(cardio, ecg, overall),
        next_assessment_days: days,
        next_assessment_at: Utc::now() + Duration::days(i64::from(days)),
        used_fallback,
    }
}

/// Compare the 3 most recent overall scores against the 3 before them.
/// `history` is most-recent-first.
pub fn risk_trend(history: &[f64]) -> RiskTrend {
    if history.len() < 2 {
        return RiskTrend {
            trend: Trend::InsufficientData,
            change: 0.0,
            samples: history.len(),
        };
    }

    let mean = |xs: &[f64]| xs.iter().sum::<f64>() / xs.len() as f64;
    let recent = &history[..history.len().min(3)];
    let older = &history[recent.len()..history.len().min(6)];

    let recent_avg = mean(recent);
    let older_avg = if older.is_empty() { recent_avg } else { mean(older) };
    let change = recent_avg - older_avg;

    let trend = if change < -TREND_THRESHOLD {
        Trend::Improving
    } else if change > TREND_THRESHOLD {
        Trend::Worsening
    } else {
        Trend::Stable
    };

    RiskTrend {
        trend,
        change: change.abs(),
        samples: history.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::features::ecg::extract_signal_features;
    use crate::logic::features::CardioInput;
    use crate::logic::risk::classifier::RiskClassifier;

    fn cardio(score: f64) -> RiskResult {
        RiskClassifier::default().classify_cardio(score, 0.92, &CardioInput::default(), false)
    }

    fn ecg(class_index: usize, fallback: bool) -> ClassificationResult {
        let labels: Vec<String> = RhythmClass::ALL.iter().map(|c| c.as_str().to_string()).collect();
        let mut probs = vec![0.025; 5];
        probs[class_index] = 0.9;
        RiskClassifier::default()
            .classify_rhythm(&probs, &labels, 0.85, extract_signal_features(&[0.0; 50]), fallback)
            .unwrap()
    }

    #[test]
    fn test_overall_defaults_without_inputs() {
        assert_eq!(overall_risk(None, None), DEFAULT_OVERALL_RISK);
        let a = assess_health(None, None, &RiskThresholds::default());
        assert_eq!(a.next_assessment_days, 30);
        assert!(a.alerts.is_empty());
        assert!(a.actions.is_empty());
    }

    #[test]
    fn test_overall_weighting() {
        let c = cardio(0.9);
        let mut e = ecg(0, false);
        e.anomaly_score = 0.4;
        // (0.9*0.6 + 0.4*0.4) / 1.0
        assert!((overall_risk(Some(&c), Some(&e)) - 0.7).abs() < 1e-12);
        // cardio alone is not diluted
        assert!((overall_risk(Some(&c), None) - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_high_risk_alerts_and_actions() {
        let c = cardio(0.95);
        let mut e = ecg(2, false);
        e.anomaly_score = 0.5;
        // 0.95*0.6 + 0.5*0.4 = 0.77
        let a = assess_health(Some(&c), Some(&e), &RiskThresholds::default());

        assert!(a.alerts.iter().any(|x| x.contains("cardiovascular")));
        assert!(a.alerts.iter().any(|x| x.contains("Ventricular")));
        assert_eq!(a.actions[0], "Book a cardiology appointment this week");
        assert!(a.actions.iter().any(|x| x == GENERAL_ACTIONS[0]));
        assert_eq!(a.next_assessment_days, 7);
    }

    #[test]
    fn test_actions_deduplicated() {
        let c = cardio(0.95);
        let e = ecg(0, false);
        let actions = action_items(Some(&c), Some(&e), 0.9);
        let mut seen = actions.clone();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), actions.len());
        assert_eq!(actions[0], "Go to the emergency department");
    }

    #[test]
    fn test_fallback_propagates() {
        let e = ecg(0, true);
        assert!(assess_health(None, Some(&e), &RiskThresholds::default()).used_fallback);
    }

    #[test]
    fn test_schedule_bands() {
        assert_eq!(next_assessment_days(0.81), 3);
        assert_eq!(next_assessment_days(0.8), 7);
        assert_eq!(next_assessment_days(0.5), 14);
        assert_eq!(next_assessment_days(0.4), 30);
    }

    #[test]
    fn test_trend() {
        assert_eq!(risk_trend(&[0.5]).trend, Trend::InsufficientData);
        assert_eq!(risk_trend(&[0.8, 0.8, 0.8, 0.4, 0.4, 0.4]).trend, Trend::Worsening);
        assert_eq!(risk_trend(&[0.2, 0.2, 0.2, 0.6, 0.6]).trend, Trend::Improving);
        assert_eq!(risk_trend(&[0.3, 0.35]).trend, Trend::Stable);
    }
}
