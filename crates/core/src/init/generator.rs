//! Directory structure and file generation for `.stagechain` initialization.

use super::error::{InitError, InitResult};
use super::templates::{get_template, list_templates};
use crate::config::loader::CONFIG_DIR;
use std::fs;
use std::path::{Path, PathBuf};

/// Slot template written in minimal mode.
const MINIMAL_SLOT: &str = "slots/hello.yaml";

/// Options for initializing a `.stagechain` directory.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// Target directory where `.stagechain` will be created.
    pub target_dir: PathBuf,

    /// Overwrite an existing `.stagechain` directory.
    pub force: bool,

    /// Only write the command slot template.
    pub minimal: bool,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            target_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            force: false,
            minimal: false,
        }
    }
}

/// Generate a `.stagechain` directory structure from the embedded templates.
///
/// ```text
/// .stagechain/
/// ├── config.toml
/// └── slots/
///     ├── camera-1.yaml   (unless minimal)
///     ├── camera-2.yaml   (unless minimal)
///     ├── gui.yaml        (unless minimal)
///     ├── hello.yaml
///     └── playout.yaml    (unless minimal)
/// ```
///
/// # Errors
///
/// - [`InitError::DirectoryExists`] if `.stagechain` exists and `force` is unset
/// - [`InitError::TemplateNotFound`] if an embedded template is missing
/// - [`InitError::DirectoryCreate`] / [`InitError::FileWrite`] on I/O failure
///
/// # Example
/// ```no_run
/// use sc_core::init::{InitOptions, generate_stagechain_structure};
/// use std::path::PathBuf;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let options = InitOptions {
///     target_dir: PathBuf::from("."),
///     force: false,
///     minimal: true,
/// };
///
/// generate_stagechain_structure(options).await?;
/// # Ok(())
/// # }
/// ```
pub async fn generate_stagechain_structure(options: InitOptions) -> InitResult<()> {
    let sc_dir = options.target_dir.join(CONFIG_DIR);

    if sc_dir.exists() && !options.force {
        return Err(InitError::DirectoryExists(sc_dir));
    }

    let slots_dir = sc_dir.join("slots");
    fs::create_dir_all(&slots_dir).map_err(|source| InitError::DirectoryCreate {
        path: slots_dir.clone(),
        source,
    })?;

    write_template_file(&sc_dir, "config.toml")?;

    if options.minimal {
        write_template_file(&sc_dir, MINIMAL_SLOT)?;
    } else {
        for slot_path in list_templates("slots/") {
            write_template_file(&sc_dir, &slot_path)?;
        }
    }

    Ok(())
}

/// Write one embedded template below `sc_dir`, creating parents as needed.
fn write_template_file(sc_dir: &Path, template_path: &str) -> InitResult<()> {
    let content = get_template(template_path)
        .ok_or_else(|| InitError::TemplateNotFound(template_path.to_string()))?;

    let target_path = sc_dir.join(template_path);

    if let Some(parent) = target_path.parent() {
        fs::create_dir_all(parent).map_err(|source| InitError::DirectoryCreate {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(&target_path, content).map_err(|source| InitError::FileWrite {
        path: target_path,
        source,
    })?;

    Ok(())
}
