//! # sc-protocol
//!
//! Core protocol definitions and data models for stagechain.
//!
//! This crate defines all shared data structures used for:
//! - Configuration file parsing (YAML slots, TOML config)
//! - Pipeline descriptions handed to the supervisor
//! - Runtime handle state reported back to a front end
//! - The Op/Event control protocol between a front end and the console
//!
//! ## Modules
//!
//! - [`pipeline_models`]: Stage descriptors and pipeline specs
//! - [`slot_models`]: Slot kinds and per-slot configuration
//! - [`config_models`]: Global configuration from config.toml
//! - [`process_models`]: Handle lifecycle state and slot summaries
//! - [`ipc`]: Operations and Events for front end / console communication
//!
//! ## Design Principles
//!
//! - Minimal dependencies: Only serde, ts-rs, and chrono
//! - TypeScript generation: All types derive `TS` for front end compatibility
//! - Independent compilation: No dependencies on other stagechain crates

pub mod config_models;
pub mod ipc;
pub mod pipeline_models;
pub mod process_models;
pub mod slot_models;

// Re-export all public types for convenience
pub use config_models::*;
pub use ipc::*;
pub use pipeline_models::*;
pub use process_models::*;
pub use slot_models::*;
