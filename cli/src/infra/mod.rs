//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, filesystem
//! access, archive extraction, the provisioning tool, SSH sessions and the
//! classifier client.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod archive;
pub mod classifier;
pub mod command_runner;
pub mod config;
pub mod environment;
pub mod fs;
pub mod git;
pub mod pause;
pub mod ssh;
pub mod terraform;
