//! Execution protocol spoken between a controller and an external provider
//! binary.
//!
//! The controller runs the provider as a subprocess. The command and its
//! parameters arrive through `HOSTWIRE_*` environment variables (plus a JSON
//! [`BootstrapInstance`](hostwire_core::BootstrapInstance) on stdin for
//! `CreateInstance`); the provider answers with a JSON payload on stdout and
//! an exit code classifying any failure.

pub mod command;
pub mod common;
pub mod dispatch;
pub mod environment;
pub mod error;
pub mod exit;
pub mod provider;
pub mod runner;
pub mod v010;
pub mod v011;
pub mod version;

#[cfg(test)]
mod test_support;

pub use command::Command;
pub use dispatch::Operation;
pub use environment::{Descriptor, Environment};
pub use error::{BootstrapError, ExecutionError, ExecutionResult, ValidationError};
pub use exit::{
    exit_code_for, resolve_error_to_exit_code, EXIT_CODE_DUPLICATE, EXIT_CODE_FAILURE,
    EXIT_CODE_NOT_FOUND, EXIT_CODE_SUCCESS,
};
pub use provider::ExternalProvider;
pub use runner::{init_tracing, run_provider, RunnerConfig};
pub use v010::EnvironmentV010;
pub use v011::EnvironmentV011;
pub use version::InterfaceVersion;
