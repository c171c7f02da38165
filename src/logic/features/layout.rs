//! Feature Layout - Cardio model input schema
//!
//! Thứ tự ở đây phải khớp với cột mà scaler và dense kernel đầu tiên
//! được fit. Đổi thêm/bớt/thứ tự => tăng FEATURE_VERSION.

use std::sync::OnceLock;

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

/// Bump on any change to `CARDIO_FEATURES`
pub const FEATURE_VERSION: u8 = 1;

pub const FEATURE_COUNT: usize = 16;

// ============================================================================
// FEATURE TABLE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    /// Taken from the profile as-is
    Raw,
    /// 0 / 1 lifestyle flag
    Flag,
    /// Computed from other features
    Derived,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct FeatureSpec {
    pub name: &'static str,
    pub kind: FeatureKind,
    pub unit: &'static str,
}

const fn spec(name: &'static str, kind: FeatureKind, unit: &'static str) -> FeatureSpec {
    FeatureSpec { name, kind, unit }
}

/// Cardio features in vector order
pub const CARDIO_FEATURES: [FeatureSpec; FEATURE_COUNT] = [
    spec("age", FeatureKind::Raw, "days"),
    spec("gender", FeatureKind::Raw, "1=female 2=male"),
    spec("height", FeatureKind::Raw, "cm"),
    spec("weight", FeatureKind::Raw, "kg"),
    spec("ap_hi", FeatureKind::Raw, "mmHg"),
    spec("ap_lo", FeatureKind::Raw, "mmHg"),
    spec("cholesterol", FeatureKind::Raw, "category 1-3"),
    spec("gluc", FeatureKind::Raw, "category 1-3"),
    spec("smoke", FeatureKind::Flag, ""),
    spec("alco", FeatureKind::Flag, ""),
    spec("active", FeatureKind::Flag, ""),
    spec("bmi", FeatureKind::Derived, "kg/m^2"),
    spec("age_years", FeatureKind::Derived, "years"),
    spec("pressure_risk", FeatureKind::Derived, "ap_hi*ap_lo/100"),
    spec("lifestyle_risk", FeatureKind::Derived, "smoke+alco+(1-active)"),
    spec("metabolic_risk", FeatureKind::Derived, "cholesterol+gluc"),
];

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// CRC32 over version + NUL-separated names
pub fn compute_layout_hash() -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&[FEATURE_VERSION]);
    for feature in &CARDIO_FEATURES {
        hasher.update(feature.name.as_bytes());
        hasher.update(&[0]);
    }
    hasher.finalize()
}

/// Cached `compute_layout_hash`
pub fn layout_hash() -> u32 {
    static HASH: OnceLock<u32> = OnceLock::new();
    *HASH.get_or_init(compute_layout_hash)
}

// ============================================================================
// LOOKUP
// ============================================================================

pub fn feature_index(name: &str) -> Option<usize> {
    CARDIO_FEATURES.iter().position(|f| f.name == name)
}

pub fn feature_name(index: usize) -> Option<&'static str> {
    CARDIO_FEATURES.get(index).map(|f| f.name)
}

pub fn feature_names() -> impl Iterator<Item = &'static str> {
    CARDIO_FEATURES.iter().map(|f| f.name)
}

/// Layout summary for status output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
}

impl LayoutInfo {
    pub fn current() -> Self {
        Self {
            version: FEATURE_VERSION,
            hash: layout_hash(),
            feature_count: FEATURE_COUNT,
            feature_names: feature_names().map(String::from).collect(),
        }
    }
}

impl Default for LayoutInfo {
    fn default() -> Self {
        Self::current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_unique() {
        let mut names: Vec<&str> = feature_names().collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), FEATURE_COUNT);
    }

    #[test]
    fn test_layout_hash_cached() {
        assert_eq!(layout_hash(), compute_layout_hash());
        assert_ne!(layout_hash(), 0);
    }

    #[test]
    fn test_lookup() {
        assert_eq!(feature_index("age"), Some(0));
        assert_eq!(feature_index("bmi"), Some(11));
        assert_eq!(feature_index("metabolic_risk"), Some(15));
        assert_eq!(feature_index("heart_rate"), None);
        assert_eq!(feature_name(4), Some("ap_hi"));
        assert_eq!(feature_name(16), None);
    }

    #[test]
    fn test_flags_grouped() {
        let flags: Vec<&str> = CARDIO_FEATURES
            .iter()
            .filter(|f| f.kind == FeatureKind::Flag)
            .map(|f| f.name)
            .collect();
        assert_eq!(flags, ["smoke", "alco", "active"]);
    }

    #[test]
    fn test_layout_info() {
        let info = LayoutInfo::current();
        assert_eq!(info.version, FEATURE_VERSION);
        assert_eq!(info.feature_names.len(), FEATURE_COUNT);
        assert_eq!(info.hash, layout_hash());
    }
}
