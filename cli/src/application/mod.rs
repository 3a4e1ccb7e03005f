//! Application layer: port trait definitions and use-case orchestration.
//!
//! This module depends only on `crate::domain`; never on `crate::infra`,
//! `crate::commands`, or `crate::output`.

pub mod context;
pub mod ports;
pub mod services;

#[allow(unused_imports)]
pub use context::RunContext;
#[allow(unused_imports)]
pub use ports::{
    ArchiveExtractor, CommandRunner, ConfigStore, ConnectTarget, DeployEnvironment,
    IntentClassifier, LocalFs, Pause, ProgressReporter, ProvisioningTool, RemoteSession,
    ScratchSpace, ShellConnector, StructureClassifier, VersionControl,
};
