//! API Module
//!
//! Structure:
//! - commands.rs: load / score / classify / health check
//! - engine_status.rs: layout, loaded bundles, counters
//!
//! Usage:
//! - `api::commands::run_health_check(&registry, &request, &config)`
//! - `api::engine_status::get_status(&registry)`

pub mod commands;
pub mod engine_status;

// Re-export current version as default
pub use commands::*;
pub use engine_status::{get_status, EngineStatus};
