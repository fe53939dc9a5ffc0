//! Source factory for creating pipeline variants from slot kinds.

use super::base::PipelineSource;
use super::capture::{LocalFileCapture, SshFileCapture};
use super::command::CommandPipeline;
use super::consumer::{MplayerPlayout, SdlGui};
use sc_protocol::config_models::ToolPaths;
use sc_protocol::slot_models::SlotKind;

/// Creates the [`PipelineSource`] behind each [`SlotKind`].
///
/// This is the only place the concrete variants are named; everything
/// downstream holds a `Box<dyn PipelineSource>`.
pub struct SourceFactory;

impl SourceFactory {
    /// Create an unconfigured source of the given kind.
    ///
    /// `tools` supplies the executable paths the built-in kinds invoke.
    ///
    /// # Examples
    ///
    /// ```
    /// use sc_core::sources::SourceFactory;
    /// use sc_protocol::config_models::ToolPaths;
    /// use sc_protocol::slot_models::SlotKind;
    ///
    /// let source = SourceFactory::create(SlotKind::SdlGui, &ToolPaths::default());
    /// assert!(!source.config_complete());
    /// ```
    pub fn create(kind: SlotKind, tools: &ToolPaths) -> Box<dyn PipelineSource> {
        match kind {
            SlotKind::LocalFile => Box::new(LocalFileCapture::new(tools.clone())),
            SlotKind::SshFile => Box::new(SshFileCapture::new(tools.clone())),
            SlotKind::SdlGui => Box::new(SdlGui::new(tools.clone())),
            SlotKind::MplayerPlayout => Box::new(MplayerPlayout::new(tools.clone())),
            SlotKind::Command => Box::new(CommandPipeline::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_returns_requested_kind() {
        let tools = ToolPaths::default();
        for kind in [
            SlotKind::LocalFile,
            SlotKind::SshFile,
            SlotKind::SdlGui,
            SlotKind::MplayerPlayout,
            SlotKind::Command,
        ] {
            let source = SourceFactory::create(kind, &tools);
            assert_eq!(source.kind(), kind);
            assert_eq!(source.name(), kind.display_name());
            assert!(!source.config_complete());
        }
    }

    #[test]
    fn test_factory_uses_tool_paths() {
        use super::super::base::{CaptureLink, ConfigureContext};
        use std::path::PathBuf;

        let tools = ToolPaths {
            sdl_gui: PathBuf::from("/opt/replay/sdl_gui"),
            ..ToolPaths::default()
        };
        let mut gui = SourceFactory::create(SlotKind::SdlGui, &tools);
        gui.bind_captures(&[CaptureLink {
            buffer: Some(PathBuf::from("/tmp/a.buf")),
            complete: true,
        }]);
        assert!(gui.configure(&ConfigureContext::new()));
        assert_eq!(gui.pipeline().stages[0].executable, "/opt/replay/sdl_gui");
    }
}
