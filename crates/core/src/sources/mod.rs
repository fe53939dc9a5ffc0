//! Pipeline source variants.
//!
//! Every slot is backed by one [`PipelineSource`]: it knows how to turn the
//! operator's settings into a [`PipelineSpec`](sc_protocol::pipeline_models::PipelineSpec)
//! and whether those settings are complete enough to start.

pub mod base;
pub mod capture;
pub mod command;
pub mod consumer;
pub mod factory;

pub use base::{CaptureLink, ConfigureContext, PipelineSource, INCOMPLETE_REPORT};
pub use capture::{LocalFileCapture, SshFileCapture};
pub use command::CommandPipeline;
pub use consumer::{MplayerPlayout, SdlGui};
pub use factory::SourceFactory;
