use async_trait::async_trait;
use hostwire_core::{BootstrapInstance, ProviderInstance, ProviderResult};
use tokio_util::sync::CancellationToken;

/// Capability surface of a backend provider.
///
/// Implementations talk to the real backend. The dispatcher borrows one for
/// a single invocation and races every call against `cancel`, so long
/// running operations should also observe the token themselves.
#[async_trait]
pub trait ExternalProvider: Send + Sync {
    /// Create a new instance from the bootstrap parameters.
    async fn create_instance(
        &self,
        cancel: &CancellationToken,
        bootstrap: BootstrapInstance,
    ) -> ProviderResult<ProviderInstance>;

    /// Look up an instance by provider ID or name.
    async fn get_instance(
        &self,
        cancel: &CancellationToken,
        instance_id: &str,
    ) -> ProviderResult<ProviderInstance>;

    /// List every instance belonging to a pool.
    async fn list_instances(
        &self,
        cancel: &CancellationToken,
        pool_id: &str,
    ) -> ProviderResult<Vec<ProviderInstance>>;

    /// Delete an instance.
    async fn delete_instance(&self, cancel: &CancellationToken, instance_id: &str)
        -> ProviderResult<()>;

    /// Remove every instance created by this controller.
    async fn remove_all_instances(&self, cancel: &CancellationToken) -> ProviderResult<()>;

    async fn start(&self, cancel: &CancellationToken, instance_id: &str) -> ProviderResult<()>;

    async fn stop(
        &self,
        cancel: &CancellationToken,
        instance_id: &str,
        force: bool,
    ) -> ProviderResult<()>;
}
