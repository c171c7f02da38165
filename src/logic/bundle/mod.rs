//! Bundle Module - Exported weights
//!
//! Load, validate và chia sẻ weight bundles.

pub mod loader;
pub mod registry;
pub mod types;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-export common types
pub use loader::{load_bundle, load_bundle_file};
pub use registry::{ModelRegistry, RegistryStats};
pub use types::{BundleInfo, LayerWeights, Metadata, ModelKind, NamedLayer, WeightBundle};
