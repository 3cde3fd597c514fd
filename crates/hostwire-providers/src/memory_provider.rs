use async_trait::async_trait;
use hostwire_core::{
    BootstrapInstance, InstanceStatus, ProviderError, ProviderInstance, ProviderResult,
};
use hostwire_execution::ExternalProvider;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct StoredInstance {
    pool_id: String,
    instance: ProviderInstance,
}

impl StoredInstance {
    fn matches(&self, instance_id: &str) -> bool {
        self.instance.provider_id == instance_id || self.instance.name == instance_id
    }
}

/// Thread-safe provider keeping instances in memory, in creation order.
///
/// Useful as a stand-in backend for controllers under test; nothing survives
/// the process.
#[derive(Clone, Default)]
pub struct InMemoryProvider {
    instances: Arc<RwLock<Vec<StoredInstance>>>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> ProviderResult<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> ProviderResult<bool> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> ProviderResult<RwLockReadGuard<'_, Vec<StoredInstance>>> {
        self.instances
            .read()
            .map_err(|_| ProviderError::backend("Instance storage lock poisoned"))
    }

    fn write(&self) -> ProviderResult<RwLockWriteGuard<'_, Vec<StoredInstance>>> {
        self.instances
            .write()
            .map_err(|_| ProviderError::backend("Instance storage lock poisoned"))
    }

    fn ensure_active(cancel: &CancellationToken) -> ProviderResult<()> {
        if cancel.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }
        Ok(())
    }

    fn set_status(&self, instance_id: &str, status: InstanceStatus) -> ProviderResult<()> {
        let mut instances = self.write()?;
        let stored = instances
            .iter_mut()
            .find(|stored| stored.matches(instance_id))
            .ok_or_else(|| ProviderError::not_found(instance_id))?;
        stored.instance.status = status;
        Ok(())
    }
}

#[async_trait]
impl ExternalProvider for InMemoryProvider {
    async fn create_instance(
        &self,
        cancel: &CancellationToken,
        bootstrap: BootstrapInstance,
    ) -> ProviderResult<ProviderInstance> {
        Self::ensure_active(cancel)?;

        let mut instances = self.write()?;
        if instances
            .iter()
            .any(|stored| stored.instance.name == bootstrap.name)
        {
            return Err(ProviderError::duplicate(bootstrap.name));
        }

        let instance = ProviderInstance {
            provider_id: Uuid::new_v4().to_string(),
            name: bootstrap.name,
            os_type: bootstrap.os_type,
            os_arch: bootstrap.os_arch,
            status: InstanceStatus::Running,
            ..ProviderInstance::default()
        };
        instances.push(StoredInstance {
            pool_id: bootstrap.pool_id,
            instance: instance.clone(),
        });

        info!(provider_id = %instance.provider_id, name = %instance.name, "Instance created");
        Ok(instance)
    }

    async fn get_instance(
        &self,
        cancel: &CancellationToken,
        instance_id: &str,
    ) -> ProviderResult<ProviderInstance> {
        Self::ensure_active(cancel)?;

        self.read()?
            .iter()
            .find(|stored| stored.matches(instance_id))
            .map(|stored| stored.instance.clone())
            .ok_or_else(|| ProviderError::not_found(instance_id))
    }

    async fn list_instances(
        &self,
        cancel: &CancellationToken,
        pool_id: &str,
    ) -> ProviderResult<Vec<ProviderInstance>> {
        Self::ensure_active(cancel)?;

        Ok(self
            .read()?
            .iter()
            .filter(|stored| stored.pool_id == pool_id)
            .map(|stored| stored.instance.clone())
            .collect())
    }

    async fn delete_instance(
        &self,
        cancel: &CancellationToken,
        instance_id: &str,
    ) -> ProviderResult<()> {
        Self::ensure_active(cancel)?;

        let mut instances = self.write()?;
        let before = instances.len();
        instances.retain(|stored| !stored.matches(instance_id));
        if instances.len() == before {
            debug!(%instance_id, "Instance already gone");
        }
        Ok(())
    }

    async fn remove_all_instances(&self, cancel: &CancellationToken) -> ProviderResult<()> {
        Self::ensure_active(cancel)?;

        let mut instances = self.write()?;
        info!(count = instances.len(), "Removing all instances");
        instances.clear();
        Ok(())
    }

    async fn start(&self, cancel: &CancellationToken, instance_id: &str) -> ProviderResult<()> {
        Self::ensure_active(cancel)?;
        self.set_status(instance_id, InstanceStatus::Running)
    }

    async fn stop(
        &self,
        cancel: &CancellationToken,
        instance_id: &str,
        _force: bool,
    ) -> ProviderResult<()> {
        Self::ensure_active(cancel)?;
        self.set_status(instance_id, InstanceStatus::Stopped)
    }
}
