//! Common test utilities for the integration tests.
//!
//! - Fixtures: handles, stage lists and `.stagechain` projects
//! - Assertions: reap-driven waits and event checks

pub mod assertions;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
