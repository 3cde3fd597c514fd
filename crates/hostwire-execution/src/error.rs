use crate::dispatch::Operation;
use hostwire_core::ProviderError;
use std::error::Error as StdError;
use std::path::PathBuf;
use thiserror::Error;

/// Required-field failures found while validating a descriptor.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing command (HOSTWIRE_COMMAND)")]
    MissingCommand,
    #[error("Missing provider config file (HOSTWIRE_PROVIDER_CONFIG_FILE)")]
    MissingConfigFile,
    #[error("Error accessing config file {}", .path.display())]
    ConfigFileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Missing controller ID (HOSTWIRE_CONTROLLER_ID)")]
    MissingControllerId,
    #[error("Missing pool ID (HOSTWIRE_POOL_ID)")]
    MissingPoolId,
    #[error("Missing instance ID (HOSTWIRE_INSTANCE_ID)")]
    MissingInstanceId,
    #[error("Missing bootstrap params name")]
    MissingBootstrapParams,
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
}

/// Failures reading the create-instance payload from stdin.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Failed to read bootstrap params from stdin")]
    Read(#[source] std::io::Error),
    #[error("Failed to decode bootstrap params")]
    Decode(#[source] serde_json::Error),
}

/// Any failure of a single provider invocation.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Unsupported interface version: {0}")]
    UnsupportedInterfaceVersion(String),
    #[error("Failed to get bootstrap params")]
    Bootstrap(#[from] BootstrapError),
    #[error("Failed to validate execution environment")]
    Validation(#[from] ValidationError),
    #[error("Failed to {operation}")]
    Provider {
        operation: Operation,
        #[source]
        source: ProviderError,
    },
    #[error("Cancelled while waiting to {operation}")]
    Cancelled { operation: Operation },
    #[error("Cancelled while reading the execution environment")]
    ResolveCancelled,
    #[error("Execution environment reader stopped unexpectedly")]
    ResolveTask(#[source] tokio::task::JoinError),
    #[error("Failed to marshal response")]
    Serialize(#[from] serde_json::Error),
    #[error("Invalid command: {0}")]
    InvalidCommand(String),
}

pub type ExecutionResult<T> = std::result::Result<T, ExecutionError>;

/// Renders an error followed by each of its sources, separated by `: `.
pub fn render_error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut current = err.source();
    while let Some(cause) = current {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        current = cause.source();
    }
    rendered
}
