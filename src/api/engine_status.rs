use serde::{Deserialize, Serialize};

use crate::logic::bundle::{BundleInfo, ModelKind, ModelRegistry, RegistryStats};
use crate::logic::config::SafetyConfig;
use crate::logic::features::layout::LayoutInfo;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    pub layout: LayoutInfo,

    pub cardio: ModelStatus,
    pub ecg: ModelStatus,
    pub stats: RegistryStats,
    pub fallback_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelStatus {
    pub engine: String, // "model" | "fallback"
    pub loaded: bool,
    pub bundle: Option<BundleInfo>,
}

impl ModelStatus {
    fn from_registry(registry: &ModelRegistry, kind: ModelKind) -> Self {
        let bundle = registry.info(kind);
        Self {
            engine: if bundle.is_some() { "model" } else { "fallback" }.to_string(),
            loaded: bundle.is_some(),
            bundle,
        }
    }
}

pub fn get_status(registry: &ModelRegistry) -> EngineStatus {
    EngineStatus {
        layout: LayoutInfo::current(),
        cardio: ModelStatus::from_registry(registry, ModelKind::Cardio),
        ecg: ModelStatus::from_registry(registry, ModelKind::Ecg),
        stats: registry.stats(),
        fallback_enabled: SafetyConfig::is_fallback_enabled(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::bundle::{fixtures, load_bundle};

    #[test]
    fn test_status_reflects_registry() {
        let registry = ModelRegistry::new();
        let status = get_status(&registry);
        assert!(!status.cardio.loaded);
        assert_eq!(status.cardio.engine, "fallback");
        assert_eq!(status.layout.feature_count, 16);

        registry.install(load_bundle(&fixtures::cardio_artifact(), ModelKind::Cardio).unwrap());
        let status = get_status(&registry);
        assert!(status.cardio.loaded);
        assert_eq!(status.cardio.engine, "model");
        assert_eq!(status.cardio.bundle.as_ref().map(|b| b.layer_names.len()), Some(5));
        assert!(!status.ecg.loaded);
    }
}
