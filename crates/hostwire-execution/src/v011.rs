use crate::command::Command;
use crate::common::{
    bootstrap_params_from_stdin, lookup, validate_command_fields, validate_common, vars,
    CommandFields, EnvVars,
};
use crate::dispatch::{call, encode, Operation};
use crate::error::{BootstrapError, ExecutionError, ExecutionResult, ValidationError};
use crate::provider::ExternalProvider;
use crate::version::InterfaceVersion;
use hostwire_core::BootstrapInstance;
use std::io::Read;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Execution environment of protocol revision v0.1.1.
///
/// Adds the negotiated interface version and the pool extra specs to the
/// v0.1.0 field set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvironmentV011 {
    pub command: Command,
    pub controller_id: String,
    pub pool_id: String,
    pub provider_config_file: String,
    pub instance_id: String,
    /// Raw `HOSTWIRE_INTERFACE_VERSION`, kept exactly as received.
    pub interface_version: String,
    /// Pool-level JSON blob, interpreted only by the provider.
    pub extra_specs: String,
    pub bootstrap_params: BootstrapInstance,
}

impl EnvironmentV011 {
    /// Populates the descriptor from `env`, reading `stdin` only for
    /// `CreateInstance`. The result is not validated.
    pub fn from_env<R: Read>(env: &EnvVars, stdin: R) -> Result<Self, BootstrapError> {
        let command = Command::from(lookup(env, vars::COMMAND));
        let bootstrap_params = bootstrap_params_from_stdin(&command, stdin)?;

        Ok(Self {
            command,
            controller_id: lookup(env, vars::CONTROLLER_ID),
            pool_id: lookup(env, vars::POOL_ID),
            provider_config_file: lookup(env, vars::PROVIDER_CONFIG_FILE),
            instance_id: lookup(env, vars::INSTANCE_ID),
            interface_version: lookup(env, vars::INTERFACE_VERSION),
            extra_specs: lookup(env, vars::POOL_EXTRASPECS),
            bootstrap_params,
        })
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_common(
            &self.command,
            &self.provider_config_file,
            &self.controller_id,
        )?;
        validate_command_fields(
            &self.command,
            &CommandFields {
                controller_id: &self.controller_id,
                pool_id: &self.pool_id,
                instance_id: &self.instance_id,
                bootstrap_name: &self.bootstrap_params.name,
            },
        )
    }

    /// Version answered to `GetVersion`. An empty negotiated version means a
    /// controller that predates negotiation, so the oldest revision is
    /// reported. No other command applies this fallback.
    pub fn reported_version(&self) -> &str {
        if self.interface_version.is_empty() {
            InterfaceVersion::OLDEST.as_str()
        } else {
            &self.interface_version
        }
    }

    pub(crate) async fn run<P>(
        &self,
        provider: &P,
        cancel: &CancellationToken,
    ) -> ExecutionResult<String>
    where
        P: ExternalProvider + ?Sized,
    {
        info!(
            command = %self.command,
            pool_id = %self.pool_id,
            instance_id = %self.instance_id,
            "Dispatching v0.1.1 command"
        );

        let payload = match &self.command {
            Command::CreateInstance => {
                let instance = call(
                    Operation::CreateInstance,
                    cancel,
                    provider.create_instance(cancel, self.bootstrap_params.clone()),
                )
                .await?;
                encode(&instance)?
            }
            Command::GetInstance => {
                let instance = call(
                    Operation::GetInstance,
                    cancel,
                    provider.get_instance(cancel, &self.instance_id),
                )
                .await?;
                encode(&instance)?
            }
            Command::ListInstances => {
                let instances = call(
                    Operation::ListInstances,
                    cancel,
                    provider.list_instances(cancel, &self.pool_id),
                )
                .await?;
                encode(&instances)?
            }
            Command::DeleteInstance => {
                call(
                    Operation::DeleteInstance,
                    cancel,
                    provider.delete_instance(cancel, &self.instance_id),
                )
                .await?;
                String::new()
            }
            Command::RemoveAllInstances => {
                call(
                    Operation::RemoveAllInstances,
                    cancel,
                    provider.remove_all_instances(cancel),
                )
                .await?;
                String::new()
            }
            Command::StartInstance => {
                call(
                    Operation::StartInstance,
                    cancel,
                    provider.start(cancel, &self.instance_id),
                )
                .await?;
                String::new()
            }
            Command::StopInstance => {
                call(
                    Operation::StopInstance,
                    cancel,
                    provider.stop(cancel, &self.instance_id, true),
                )
                .await?;
                String::new()
            }
            Command::GetVersion => self.reported_version().to_string(),
            Command::Other(raw) => return Err(ExecutionError::InvalidCommand(raw.clone())),
        };

        Ok(payload)
    }
}
