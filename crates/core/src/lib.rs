//! # sc-core
//!
//! Process-pipeline supervision for stagechain.
//!
//! This crate provides:
//! - Configuration loading from the `.stagechain/` directory
//! - Pipeline sources: capture, consumer and command variants behind one
//!   capability trait
//! - The launcher that forks a leader per pipeline and wires its stages
//!   with pipes inside one process group
//! - Per-slot handles, the leader registry and SIGCHLD / SIGINT routing
//! - A console that drives all of the above from `Op`s and reports `Event`s
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and validation
//! - [`sources`]: Pipeline source variants and their factory
//! - [`launcher`]: Leader and stage process construction
//! - [`supervisor`]: Handle state machine, registry, reaper, signal router
//! - [`console`]: Controlling-process event loop
//! - [`init`]: `.stagechain/` scaffolding from embedded templates

#[cfg(not(unix))]
compile_error!("sc-core supervises Unix process groups and only builds on Unix");

pub mod config;
pub mod console;
pub mod init;
pub mod launcher;
pub mod sources;
pub mod supervisor;
