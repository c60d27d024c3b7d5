use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Invalid input for [{operation}]: {reason}")]
    InvalidInput {
        operation: &'static str,
        reason: String
    },
    #[error("Storage failure in [{operation}] ({context}): {source}")]
    Storage {
        operation: &'static str,
        context: String,
        #[source]
        source: StorageError
    }
}

impl ServiceError {
    pub fn invalid_input(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            operation,
            reason: reason.into()
        }
    }

    /// Wraps a store failure with the operation name and its key inputs.
    pub fn storage(operation: &'static str, context: impl Into<String>, source: StorageError) -> Self {
        Self::Storage {
            operation,
            context: context.into(),
            source
        }
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }
}
