//! Configuration models that aggregate all settings.
//!
//! This module provides the unified `AppConfig` structure that combines
//! global settings and slot definitions into a single configuration object.

use sc_protocol::config_models::GlobalConfig;
use sc_protocol::slot_models::{SlotConfig, SlotRole};

/// Unified application configuration loaded from `.stagechain/`.
///
/// - `config.toml`: Global settings
/// - `slots/*.yaml`: Slot definitions, in file name order
///
/// # Example
///
/// ```rust,no_run
/// use sc_core::config::loader::load_config;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new(".")).await?;
/// println!("Loaded {} slots", config.slots.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Global settings from `config.toml`.
    pub global: GlobalConfig,

    /// Slot definitions from `slots/*.yaml`.
    pub slots: Vec<SlotConfig>,
}

impl AppConfig {
    /// Look up a slot by name.
    pub fn slot(&self, name: &str) -> Option<&SlotConfig> {
        self.slots.iter().find(|s| s.name == name)
    }

    /// Slots that write a buffer file.
    pub fn captures(&self) -> impl Iterator<Item = &SlotConfig> {
        self.slots
            .iter()
            .filter(|s| s.kind.role() == SlotRole::Capture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sc_protocol::slot_models::SlotKind;

    #[test]
    fn test_captures_filter() {
        let config = AppConfig {
            global: GlobalConfig::default(),
            slots: vec![
                SlotConfig::new("cam", SlotKind::LocalFile),
                SlotConfig::new("gui", SlotKind::SdlGui),
                SlotConfig::new("remote", SlotKind::SshFile),
            ],
        };
        let names: Vec<_> = config.captures().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["cam", "remote"]);
        assert!(config.slot("gui").is_some());
        assert!(config.slot("missing").is_none());
    }
}
