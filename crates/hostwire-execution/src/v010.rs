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

/// Execution environment of protocol revision v0.1.0.
///
/// This revision has no version negotiation and no pool extra specs; pool
/// settings only reach the provider inside the bootstrap params.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvironmentV010 {
    pub command: Command,
    pub controller_id: String,
    pub pool_id: String,
    pub provider_config_file: String,
    pub instance_id: String,
    pub bootstrap_params: BootstrapInstance,
}

impl EnvironmentV010 {
    pub fn from_env<R: Read>(env: &EnvVars, stdin: R) -> Result<Self, BootstrapError> {
        let command = Command::from(lookup(env, vars::COMMAND));
        let bootstrap_params = bootstrap_params_from_stdin(&command, stdin)?;

        Ok(Self {
            command,
            controller_id: lookup(env, vars::CONTROLLER_ID),
            pool_id: lookup(env, vars::POOL_ID),
            provider_config_file: lookup(env, vars::PROVIDER_CONFIG_FILE),
            instance_id: lookup(env, vars::INSTANCE_ID),
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
            "Dispatching v0.1.0 command"
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
            Command::GetVersion => InterfaceVersion::V010.as_str().to_string(),
            Command::Other(raw) => return Err(ExecutionError::InvalidCommand(raw.clone())),
        };

        Ok(payload)
    }
}
