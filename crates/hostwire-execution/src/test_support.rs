use crate::common::{vars, EnvVars};
use crate::provider::ExternalProvider;
use async_trait::async_trait;
use hostwire_core::{
    BootstrapInstance, InstanceStatus, ProviderError, ProviderInstance, ProviderResult,
};
use std::io::{self, Read};
use std::sync::Mutex;
use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;

/// Stdin that fails every read.
pub(crate) struct UnreadableStdin;

impl Read for UnreadableStdin {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "stdin closed"))
    }
}

pub(crate) fn instance(provider_id: &str, name: &str) -> ProviderInstance {
    ProviderInstance {
        provider_id: provider_id.to_string(),
        name: name.to_string(),
        status: InstanceStatus::Running,
        ..ProviderInstance::default()
    }
}

pub(crate) fn config_file() -> NamedTempFile {
    NamedTempFile::new().expect("create temp config file")
}

/// Environment with every variable set for `command`.
pub(crate) fn full_env(command: &str, config: &NamedTempFile) -> EnvVars {
    let mut env = EnvVars::new();
    env.insert(vars::COMMAND.to_string(), command.to_string());
    env.insert(vars::CONTROLLER_ID.to_string(), "ctrl-1".to_string());
    env.insert(vars::POOL_ID.to_string(), "pool-1".to_string());
    env.insert(
        vars::PROVIDER_CONFIG_FILE.to_string(),
        config.path().to_string_lossy().into_owned(),
    );
    env.insert(vars::INSTANCE_ID.to_string(), "vm-1".to_string());
    env
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Create(String),
    Get(String),
    List(String),
    Delete(String),
    RemoveAll,
    Start(String),
    Stop(String, bool),
}

/// Provider stub that records every call and replies with canned results.
#[derive(Default)]
pub(crate) struct RecordingProvider {
    calls: Mutex<Vec<Call>>,
    instances: Vec<ProviderInstance>,
    failure: Mutex<Option<ProviderError>>,
}

impl RecordingProvider {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_instances(instances: Vec<ProviderInstance>) -> Self {
        Self {
            instances,
            ..Self::default()
        }
    }

    /// The next call fails with `err`.
    pub(crate) fn failing(err: ProviderError) -> Self {
        Self {
            failure: Mutex::new(Some(err)),
            ..Self::default()
        }
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) -> ProviderResult<()> {
        self.calls.lock().unwrap().push(call);
        match self.failure.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ExternalProvider for RecordingProvider {
    async fn create_instance(
        &self,
        _cancel: &CancellationToken,
        bootstrap: BootstrapInstance,
    ) -> ProviderResult<ProviderInstance> {
        self.record(Call::Create(bootstrap.name.clone()))?;
        Ok(instance("vm-new", &bootstrap.name))
    }

    async fn get_instance(
        &self,
        _cancel: &CancellationToken,
        instance_id: &str,
    ) -> ProviderResult<ProviderInstance> {
        self.record(Call::Get(instance_id.to_string()))?;
        Ok(instance(instance_id, "runner-1"))
    }

    async fn list_instances(
        &self,
        _cancel: &CancellationToken,
        pool_id: &str,
    ) -> ProviderResult<Vec<ProviderInstance>> {
        self.record(Call::List(pool_id.to_string()))?;
        Ok(self.instances.clone())
    }

    async fn delete_instance(
        &self,
        _cancel: &CancellationToken,
        instance_id: &str,
    ) -> ProviderResult<()> {
        self.record(Call::Delete(instance_id.to_string()))
    }

    async fn remove_all_instances(&self, _cancel: &CancellationToken) -> ProviderResult<()> {
        self.record(Call::RemoveAll)
    }

    async fn start(&self, _cancel: &CancellationToken, instance_id: &str) -> ProviderResult<()> {
        self.record(Call::Start(instance_id.to_string()))
    }

    async fn stop(
        &self,
        _cancel: &CancellationToken,
        instance_id: &str,
        force: bool,
    ) -> ProviderResult<()> {
        self.record(Call::Stop(instance_id.to_string(), force))
    }
}
