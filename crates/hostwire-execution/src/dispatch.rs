use crate::error::{ExecutionError, ExecutionResult};
use hostwire_core::ProviderResult;
use serde::Serialize;
use std::fmt;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Provider operation a command maps to; used to label failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateInstance,
    GetInstance,
    ListInstances,
    DeleteInstance,
    RemoveAllInstances,
    StartInstance,
    StopInstance,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Operation::CreateInstance => "create instance in provider",
            Operation::GetInstance => "get instance from provider",
            Operation::ListInstances => "list instances from provider",
            Operation::DeleteInstance => "delete instance from provider",
            Operation::RemoveAllInstances => "remove all instances",
            Operation::StartInstance => "start instance",
            Operation::StopInstance => "stop instance",
        };
        f.write_str(text)
    }
}

/// Awaits one provider call, giving up as soon as `cancel` fires.
pub(crate) async fn call<T, F>(
    operation: Operation,
    cancel: &CancellationToken,
    fut: F,
) -> ExecutionResult<T>
where
    F: Future<Output = ProviderResult<T>>,
{
    debug!(%operation, "Calling provider");
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ExecutionError::Cancelled { operation }),
        result = fut => result.map_err(|source| ExecutionError::Provider { operation, source }),
    }
}

pub(crate) fn encode<T: Serialize + ?Sized>(value: &T) -> ExecutionResult<String> {
    Ok(serde_json::to_string(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostwire_core::{classify, ErrorClass, ProviderError};
    use std::time::Duration;

    #[tokio::test]
    async fn test_call_passes_through_success() {
        let cancel = CancellationToken::new();
        let value = call(Operation::GetInstance, &cancel, async { Ok(7u32) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_call_wraps_failure_with_operation() {
        let cancel = CancellationToken::new();
        let err = call::<(), _>(Operation::StartInstance, &cancel, async {
            Err(ProviderError::not_found("vm-3"))
        })
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            ExecutionError::Provider {
                operation: Operation::StartInstance,
                ..
            }
        ));
        assert_eq!(err.to_string(), "Failed to start instance");
        assert_eq!(classify(&err), ErrorClass::NotFound);
    }

    #[tokio::test]
    async fn test_call_returns_cancelled_when_token_already_fired() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = call(Operation::ListInstances, &cancel, async {
            Ok(Vec::<String>::new())
        })
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            ExecutionError::Cancelled {
                operation: Operation::ListInstances
            }
        ));
    }

    #[tokio::test]
    async fn test_call_interrupts_pending_operation() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let err = call::<(), _>(Operation::DeleteInstance, &cancel, async {
            std::future::pending::<ProviderResult<()>>().await
        })
        .await
        .unwrap_err();
        assert!(matches!(err, ExecutionError::Cancelled { .. }));
    }

    #[test]
    fn test_encode_list_preserves_order() {
        let payload = encode(&vec!["b", "a"]).unwrap();
        assert_eq!(payload, r#"["b","a"]"#);
    }
}
