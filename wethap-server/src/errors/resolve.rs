use wethap_api::ErrorCode;

use crate::errors::RegistryError;

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("No free room label found after {0} attempts")]
    Exhausted(u32),

    #[error("Identifier {0} belongs to a device that is still connected")]
    IdentifierInUse(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl ResolveError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ResolveError::Storage(_) | ResolveError::Exhausted(_) => ErrorCode::StorageError,
            ResolveError::IdentifierInUse(_) | ResolveError::Registry(_) => ErrorCode::ProtocolError,
        }
    }

    /// Whether the failure is on the server side rather than the device's.
    pub fn is_internal(&self) -> bool {
        self.code() == ErrorCode::StorageError
    }
}
