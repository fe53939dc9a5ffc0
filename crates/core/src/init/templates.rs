//! Embedded template files for `.stagechain` initialization.
//!
//! Files under the workspace `templates/` directory are embedded with
//! `rust-embed`, so `init` needs nothing on disk at runtime. With the
//! `debug-embed` feature they are embedded in debug builds too.

use rust_embed::RustEmbed;

/// Embedded template files from the workspace `templates/` directory.
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/../../templates"]
pub struct TemplateAssets;

/// Get template file content by path, e.g. `"slots/gui.yaml"`.
///
/// # Example
/// ```
/// use sc_core::init::templates::get_template;
///
/// let config = get_template("config.toml").expect("config.toml should exist");
/// assert!(config.contains("max-captures ="));
/// ```
pub fn get_template(path: &str) -> Option<String> {
    TemplateAssets::get(path).map(|file| String::from_utf8_lossy(file.data.as_ref()).to_string())
}

/// List all template files whose path starts with `prefix`, sorted.
pub fn list_templates(prefix: &str) -> Vec<String> {
    let mut paths: Vec<String> = TemplateAssets::iter()
        .filter(|path| path.starts_with(prefix))
        .map(|path| path.to_string())
        .collect();
    paths.sort();
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_config_template() {
        let content = get_template("config.toml").expect("config.toml should be embedded");
        assert!(content.contains("max-captures ="));
        assert!(content.contains("[tools]"));
    }

    #[test]
    fn test_get_slot_templates() {
        let hello = get_template("slots/hello.yaml").expect("hello.yaml should be embedded");
        assert!(hello.contains("kind: command"));

        let camera = get_template("slots/camera-1.yaml").expect("camera-1.yaml should be embedded");
        assert!(camera.contains("kind: local-file"));
    }

    #[test]
    fn test_get_nonexistent_template() {
        assert!(get_template("nonexistent.txt").is_none());
    }

    #[test]
    fn test_list_slot_templates() {
        let slots = list_templates("slots/");
        assert_eq!(
            slots,
            vec![
                "slots/camera-1.yaml",
                "slots/camera-2.yaml",
                "slots/gui.yaml",
                "slots/hello.yaml",
                "slots/playout.yaml",
            ]
        );
    }
}
