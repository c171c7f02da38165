//! Model Registry - Loaded bundles & inference stats
//!
//! Giữ bundle hiện tại cho mỗi loại model.
//! Reload = build bundle mới rồi swap `Arc`; reader cũ giữ bundle cũ.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::loader::load_bundle_file;
use super::types::{BundleInfo, ModelKind, WeightBundle};
use crate::logic::error::Result;

// ============================================================================
// GLOBAL INSTANCE
// ============================================================================

static GLOBAL: ModelRegistry = ModelRegistry::new();

/// Process-wide registry used by the CLI host
pub fn global() -> &'static ModelRegistry {
    &GLOBAL
}

// ============================================================================
// REGISTRY
// ============================================================================

pub struct ModelRegistry {
    cardio: RwLock<Option<Arc<WeightBundle>>>,
    ecg: RwLock<Option<Arc<WeightBundle>>>,

    // Stats
    inference_count: AtomicU64,
    fallback_count: AtomicU64,
    latency_sum_us: AtomicU64,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub inference_count: u64,
    pub fallback_count: u64,
    pub avg_latency_ms: f64,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelRegistry {
    pub const fn new() -> Self {
        Self {
            cardio: parking_lot::const_rwlock(None),
            ecg: parking_lot::const_rwlock(None),
            inference_count: AtomicU64::new(0),
            fallback_count: AtomicU64::new(0),
            latency_sum_us: AtomicU64::new(0),
        }
    }

    fn slot(&self, kind: ModelKind) -> &RwLock<Option<Arc<WeightBundle>>> {
        match kind {
            ModelKind::Cardio => &self.cardio,
            ModelKind::Ecg => &self.ecg,
        }
    }

    /// Install a bundle, returning the one it replaced
    pub fn install(&self, bundle: WeightBundle) -> Option<Arc<WeightBundle>> {
        let kind = bundle.kind;
        let new = Arc::new(bundle);
        let previous = self.slot(kind).write().replace(new);
        log::info!(
            "Registry: {} model {}",
            kind,
            if previous.is_some() { "replaced" } else { "installed" }
        );
        previous
    }

    /// Load from disk and swap in. On error the current bundle stays.
    pub fn reload_from_file(&self, kind: ModelKind, path: impl AsRef<Path>) -> Result<Arc<WeightBundle>> {
        let bundle = load_bundle_file(path, kind)?;
        self.install(bundle);
        self.get(kind).ok_or_else(|| {
            crate::logic::error::InferenceError::ModelLoad(format!("{} model vanished after install", kind))
        })
    }

    pub fn get(&self, kind: ModelKind) -> Option<Arc<WeightBundle>> {
        self.slot(kind).read().clone()
    }

    pub fn is_loaded(&self, kind: ModelKind) -> bool {
        self.slot(kind).read().is_some()
    }

    pub fn unload(&self, kind: ModelKind) -> Option<Arc<WeightBundle>> {
        log::info!("Registry: {} model unloaded", kind);
        self.slot(kind).write().take()
    }

    pub fn info(&self, kind: ModelKind) -> Option<BundleInfo> {
        self.slot(kind).read().as_ref().map(|b| b.info())
    }

    // ------------------------------------------------------------------------
    // Stats
    // ------------------------------------------------------------------------

    pub fn record_inference(&self, latency_us: u64, used_fallback: bool) {
        self.latency_sum_us.fetch_add(latency_us, Ordering::Relaxed);
        self.inference_count.fetch_add(1, Ordering::Relaxed);
        if used_fallback {
            self.fallback_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn stats(&self) -> RegistryStats {
        let sum = self.latency_sum_us.load(Ordering::Relaxed);
        let count = self.inference_count.load(Ordering::Relaxed);
        let avg = if count > 0 { (sum as f64 / count as f64) / 1000.0 } else { 0.0 };

        RegistryStats {
            inference_count: count,
            fallback_count: self.fallback_count.load(Ordering::Relaxed),
            avg_latency_ms: avg,
        }
    }

    pub fn reset_stats(&self) {
        self.inference_count.store(0, Ordering::Relaxed);
        self.fallback_count.store(0, Ordering::Relaxed);
        self.latency_sum_us.store(0, Ordering::Relaxed);
    }
}
