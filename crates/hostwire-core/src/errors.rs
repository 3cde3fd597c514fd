use std::error::Error as StdError;
use thiserror::Error;

/// Errors a provider backend reports back through the execution protocol.
///
/// `NotFound` and `Duplicate` are sentinels: they keep their meaning however
/// many layers of context wrap them, see [`classify`].
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Duplicate entity: {0}")]
    Duplicate(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Operation cancelled")]
    Cancelled,
    #[error("{message}")]
    Backend {
        message: String,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    },
}

impl ProviderError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn duplicate(what: impl Into<String>) -> Self {
        Self::Duplicate(what.into())
    }

    /// Backend failure without an underlying cause.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
            source: None,
        }
    }

    /// Adds context on top of an existing error, keeping it as the source.
    pub fn wrap(
        message: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
    ) -> Self {
        Self::Backend {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Semantic class of an error, as seen by the exit-code translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    NotFound,
    Duplicate,
    Other,
}

/// Walks the source chain of `err` and reports the first sentinel found.
pub fn classify(err: &(dyn StdError + 'static)) -> ErrorClass {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(link) = current {
        if let Some(provider_err) = link.downcast_ref::<ProviderError>() {
            match provider_err {
                ProviderError::NotFound(_) => return ErrorClass::NotFound,
                ProviderError::Duplicate(_) => return ErrorClass::Duplicate,
                _ => {}
            }
        }
        current = link.source();
    }
    ErrorClass::Other
}
