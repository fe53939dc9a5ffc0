//! Configuration file loader for the `.stagechain/` directory structure.
//!
//! This module loads and validates:
//! - `config.toml`: Global settings and tool paths
//! - `slots/*.yaml` / `slots/*.yml`: One slot definition per file

use crate::config::error::ConfigError;
use crate::config::error::ConfigResult;
use crate::config::models::AppConfig;
use sc_protocol::config_models::GlobalConfig;
use sc_protocol::slot_models::{SlotConfig, SlotKind, SlotRole};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Name of the configuration directory under the project root.
pub const CONFIG_DIR: &str = ".stagechain";

/// Loads all configuration from the `.stagechain/` directory.
///
/// # Arguments
///
/// * `root` - Root directory containing the `.stagechain/` folder
///
/// # Returns
///
/// An `AppConfig` containing all loaded configuration. If the directory or
/// individual files are missing, defaults are used rather than an error.
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - Files exist but cannot be read
/// - Files have invalid TOML or YAML syntax
/// - Slot names are duplicated, there are more capture slots than
///   `max-captures`, or a `command` slot lists no stages
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
pub async fn load_config(root: &Path) -> ConfigResult<AppConfig> {
    let sc_dir = root.join(CONFIG_DIR);

    if !sc_dir.exists() {
        return Ok(AppConfig::default());
    }

    let global = load_global_config(&sc_dir)?;
    let slots = load_slots(&sc_dir)?;
    validate(&sc_dir, &global, &slots)?;

    debug!(dir = %sc_dir.display(), slots = slots.len(), "configuration loaded");
    Ok(AppConfig { global, slots })
}

/// Loads global configuration from `config.toml`.
fn load_global_config(sc_dir: &Path) -> ConfigResult<GlobalConfig> {
    let config_path = sc_dir.join("config.toml");

    if !config_path.exists() {
        return Ok(GlobalConfig::default());
    }

    let content =
        std::fs::read_to_string(&config_path).map_err(|source| ConfigError::FileRead {
            path: config_path.clone(),
            source,
        })?;

    let config: GlobalConfig =
        toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
            path: config_path,
            source,
        })?;

    Ok(config)
}

/// Loads every slot definition from `slots/`, sorted by file name.
fn load_slots(sc_dir: &Path) -> ConfigResult<Vec<SlotConfig>> {
    let slots_dir = sc_dir.join("slots");

    if !slots_dir.exists() {
        return Ok(Vec::new());
    }

    let mut slots = Vec::new();

    for entry in WalkDir::new(&slots_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| ConfigError::DirectoryWalk {
            path: slots_dir.clone(),
            source,
        })?;

        let path = entry.path();

        let ext = path.extension().and_then(|s| s.to_str());
        if ext != Some("yaml") && ext != Some("yml") {
            continue;
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

        let slot: SlotConfig =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::YamlParse {
                path: path.to_path_buf(),
                source,
            })?;

        slots.push(slot);
    }

    Ok(slots)
}

/// Checks the cross-file rules no single slot file can enforce.
fn validate(sc_dir: &Path, global: &GlobalConfig, slots: &[SlotConfig]) -> ConfigResult<()> {
    let invalid = |reason: String| ConfigError::InvalidConfig {
        path: sc_dir.join("slots"),
        reason,
    };

    let mut seen = HashSet::new();
    for slot in slots {
        if !seen.insert(slot.name.as_str()) {
            return Err(invalid(format!("duplicate slot name '{}'", slot.name)));
        }
        if slot.kind == SlotKind::Command && slot.stages.is_empty() {
            return Err(invalid(format!("command slot '{}' has no stages", slot.name)));
        }
    }

    let captures = slots
        .iter()
        .filter(|s| s.kind.role() == SlotRole::Capture)
        .count();
    if captures > global.max_captures {
        return Err(invalid(format!(
            "{} capture slots configured, at most {} allowed",
            captures, global.max_captures
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn write_slot(sc_dir: &Path, file: &str, content: &str) {
        fs::create_dir_all(sc_dir.join("slots")).expect("Failed to create slots dir");
        fs::write(sc_dir.join("slots").join(file), content).expect("Failed to write slot file");
    }

    #[tokio::test]
    async fn test_load_config_acceptance() {
        let dir = tempdir().expect("Failed to create temp dir");
        let root = dir.path();
        let sc_dir = root.join(CONFIG_DIR);

        fs::create_dir_all(&sc_dir).expect("Failed to create .stagechain");
        fs::write(
            sc_dir.join("config.toml"),
            "max-captures = 2\npoll-interval-ms = 250\n\n[tools]\nffmpeg = \"/usr/bin/ffmpeg\"\n",
        )
        .expect("Failed to write config.toml");

        write_slot(
            &sc_dir,
            "10-camera.yaml",
            "name: camera-1\nkind: local-file\ninput: /media/game.mov\nbuffer: /tmp/cam1.buf\n",
        );
        write_slot(&sc_dir, "90-gui.yaml", "name: gui\nkind: sdl-gui\n");
        write_slot(
            &sc_dir,
            "50-count.yml",
            r#"name: count
kind: command
stdout: /tmp/count.txt
stages:
  - executable: echo
    args: ["hello"]
  - executable: wc
    args: ["-c"]
"#,
        );

        let config = load_config(root).await.expect("Failed to load config");

        assert_eq!(config.global.max_captures, 2);
        assert_eq!(config.global.poll_interval_ms, 250);
        assert_eq!(config.global.tools.ffmpeg, PathBuf::from("/usr/bin/ffmpeg"));
        assert_eq!(config.global.tools.mplayer, PathBuf::from("/usr/local/bin/mplayer"));

        let names: Vec<_> = config.slots.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["camera-1", "count", "gui"], "Slots sorted by file name");

        let count = config.slot("count").expect("count slot");
        assert_eq!(count.stages.len(), 2);
        assert_eq!(count.stdout, Some(PathBuf::from("/tmp/count.txt")));
    }

    #[tokio::test]
    async fn test_load_config_empty_directory() {
        let dir = tempdir().expect("Failed to create temp dir");

        let config = load_config(dir.path())
            .await
            .expect("Should handle missing .stagechain");

        assert_eq!(config.global, GlobalConfig::default());
        assert!(config.slots.is_empty());
    }

    #[tokio::test]
    async fn test_load_config_invalid_toml() {
        let dir = tempdir().expect("Failed to create temp dir");
        let sc_dir = dir.path().join(CONFIG_DIR);
        fs::create_dir_all(&sc_dir).expect("Failed to create .stagechain");
        fs::write(sc_dir.join("config.toml"), "max-captures = [invalid")
            .expect("Failed to write config.toml");

        let result = load_config(dir.path()).await;
        if let Err(ConfigError::TomlParse { path, .. }) = result {
            assert!(path.ends_with("config.toml"));
        } else {
            panic!("Expected TomlParse error");
        }
    }

    #[tokio::test]
    async fn test_load_config_invalid_yaml() {
        let dir = tempdir().expect("Failed to create temp dir");
        let sc_dir = dir.path().join(CONFIG_DIR);
        write_slot(&sc_dir, "bad.yaml", "name: test\n  invalid: [yaml");

        let result = load_config(dir.path()).await;
        if let Err(ConfigError::YamlParse { path, .. }) = result {
            assert!(path.ends_with("bad.yaml"));
        } else {
            panic!("Expected YamlParse error");
        }
    }

    #[tokio::test]
    async fn test_load_config_rejects_duplicate_names() {
        let dir = tempdir().expect("Failed to create temp dir");
        let sc_dir = dir.path().join(CONFIG_DIR);
        write_slot(&sc_dir, "a.yaml", "name: gui\nkind: sdl-gui\n");
        write_slot(&sc_dir, "b.yaml", "name: gui\nkind: mplayer-playout\n");

        let result = load_config(dir.path()).await;
        match result {
            Err(ConfigError::InvalidConfig { reason, .. }) => {
                assert!(reason.contains("duplicate slot name 'gui'"))
            }
            other => panic!("Expected InvalidConfig, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_load_config_rejects_too_many_captures() {
        let dir = tempdir().expect("Failed to create temp dir");
        let sc_dir = dir.path().join(CONFIG_DIR);
        fs::create_dir_all(&sc_dir).expect("Failed to create .stagechain");
        fs::write(sc_dir.join("config.toml"), "max-captures = 1\n")
            .expect("Failed to write config.toml");
        write_slot(&sc_dir, "a.yaml", "name: a\nkind: local-file\n");
        write_slot(&sc_dir, "b.yaml", "name: b\nkind: ssh-file\n");

        let result = load_config(dir.path()).await;
        assert!(matches!(result, Err(ConfigError::InvalidConfig { .. })));
    }

    #[tokio::test]
    async fn test_load_config_rejects_empty_command() {
        let dir = tempdir().expect("Failed to create temp dir");
        let sc_dir = dir.path().join(CONFIG_DIR);
        write_slot(&sc_dir, "cmd.yaml", "name: cmd\nkind: command\n");

        let result = load_config(dir.path()).await;
        match result {
            Err(ConfigError::InvalidConfig { reason, .. }) => {
                assert!(reason.contains("has no stages"))
            }
            other => panic!("Expected InvalidConfig, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_load_config_ignores_non_matching_files() {
        let dir = tempdir().expect("Failed to create temp dir");
        let sc_dir = dir.path().join(CONFIG_DIR);
        write_slot(&sc_dir, "notes.txt", "Not a yaml file");
        write_slot(&sc_dir, "gui.yaml", "name: gui\nkind: sdl-gui\n");

        let config = load_config(dir.path())
            .await
            .expect("Should ignore non-matching files");
        assert_eq!(config.slots.len(), 1);
    }
}
