//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`
//! sockets. All functions are synchronous and take data in, returning data out.

pub mod analysis;
pub mod classify;
pub mod config;
pub mod deploy;
pub mod error;
pub mod framework;
pub mod source;
pub mod terraform;
pub mod tree;

#[allow(unused_imports)]
pub use analysis::RepoAnalysis;
#[allow(unused_imports)]
pub use config::{
    AutoshipConfig, config_value, set_config_value, validate_config_key, validate_config_value,
};
#[allow(unused_imports)]
pub use error::{
    AcquisitionError, ConfigError, DeploymentAdvisoryError, DeploymentFatalError,
    ProvisioningError, Stage, StageFailure,
};
#[allow(unused_imports)]
pub use framework::Framework;
