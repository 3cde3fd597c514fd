use crate::command::Command;
use crate::error::{BootstrapError, ValidationError};
use hostwire_core::BootstrapInstance;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Environment variable names read by every protocol revision.
pub mod vars {
    pub const COMMAND: &str = "HOSTWIRE_COMMAND";
    pub const CONTROLLER_ID: &str = "HOSTWIRE_CONTROLLER_ID";
    pub const POOL_ID: &str = "HOSTWIRE_POOL_ID";
    pub const PROVIDER_CONFIG_FILE: &str = "HOSTWIRE_PROVIDER_CONFIG_FILE";
    pub const INSTANCE_ID: &str = "HOSTWIRE_INSTANCE_ID";
    /// Read since v0.1.1.
    pub const INTERFACE_VERSION: &str = "HOSTWIRE_INTERFACE_VERSION";
    /// Read since v0.1.1.
    pub const POOL_EXTRASPECS: &str = "HOSTWIRE_POOL_EXTRASPECS";
}

/// Process environment captured once at start-up.
pub type EnvVars = HashMap<String, String>;

/// Missing variables read as empty strings, like an unset env var.
pub(crate) fn lookup(env: &EnvVars, key: &str) -> String {
    env.get(key).cloned().unwrap_or_default()
}

/// Reads the bootstrap payload from `stdin`, but only for `CreateInstance`.
///
/// Every other command gets empty params and leaves `stdin` untouched.
pub fn bootstrap_params_from_stdin<R: Read>(
    command: &Command,
    mut stdin: R,
) -> Result<BootstrapInstance, BootstrapError> {
    if *command != Command::CreateInstance {
        return Ok(BootstrapInstance::default());
    }

    let mut raw = Vec::new();
    stdin.read_to_end(&mut raw).map_err(BootstrapError::Read)?;
    debug!(bytes = raw.len(), "Read bootstrap params from stdin");

    serde_json::from_slice(&raw).map_err(BootstrapError::Decode)
}

/// Checks shared by every command, in the order they must fail.
pub(crate) fn validate_common(
    command: &Command,
    provider_config_file: &str,
    controller_id: &str,
) -> Result<(), ValidationError> {
    if command.is_empty() {
        return Err(ValidationError::MissingCommand);
    }

    if provider_config_file.is_empty() {
        return Err(ValidationError::MissingConfigFile);
    }

    let path = Path::new(provider_config_file);
    std::fs::symlink_metadata(path).map_err(|source| ValidationError::ConfigFileAccess {
        path: path.to_path_buf(),
        source,
    })?;

    if controller_id.is_empty() {
        return Err(ValidationError::MissingControllerId);
    }

    Ok(())
}

/// Fields the per-command table inspects.
pub(crate) struct CommandFields<'a> {
    pub controller_id: &'a str,
    pub pool_id: &'a str,
    pub instance_id: &'a str,
    pub bootstrap_name: &'a str,
}

/// Required fields of each command, shared by every revision. Runs after
/// [`validate_common`].
pub(crate) fn validate_command_fields(
    command: &Command,
    fields: &CommandFields<'_>,
) -> Result<(), ValidationError> {
    match command {
        Command::CreateInstance => {
            if fields.bootstrap_name.is_empty() {
                return Err(ValidationError::MissingBootstrapParams);
            }
            if fields.controller_id.is_empty() {
                return Err(ValidationError::MissingControllerId);
            }
            if fields.pool_id.is_empty() {
                return Err(ValidationError::MissingPoolId);
            }
        }
        Command::DeleteInstance
        | Command::GetInstance
        | Command::StartInstance
        | Command::StopInstance => {
            if fields.instance_id.is_empty() {
                return Err(ValidationError::MissingInstanceId);
            }
            if fields.pool_id.is_empty() {
                return Err(ValidationError::MissingPoolId);
            }
        }
        Command::ListInstances => {
            if fields.pool_id.is_empty() {
                return Err(ValidationError::MissingPoolId);
            }
        }
        Command::RemoveAllInstances => {
            if fields.controller_id.is_empty() {
                return Err(ValidationError::MissingControllerId);
            }
        }
        Command::GetVersion => {}
        Command::Other(raw) => return Err(ValidationError::UnknownCommand(raw.clone())),
    }
    Ok(())
}
