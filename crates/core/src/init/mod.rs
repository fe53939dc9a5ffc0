//! Initialization module for creating `.stagechain` directory structures.
//!
//! This module provides functionality to initialize a new project by
//! generating a `.stagechain/` directory with pre-configured templates for:
//! - Global configuration (`config.toml`)
//! - Slot definitions (`slots/*.yaml`)
//!
//! # Example
//!
//! ```no_run
//! use sc_core::init::{InitOptions, generate_stagechain_structure};
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = InitOptions {
//!     target_dir: PathBuf::from("."),
//!     force: false,
//!     minimal: false,
//! };
//!
//! generate_stagechain_structure(options).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod generator;
pub mod templates;

pub use error::{InitError, InitResult};
pub use generator::{generate_stagechain_structure, InitOptions};
pub use templates::{get_template, list_templates};
