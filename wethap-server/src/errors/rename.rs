use axum::http::StatusCode;
use wethap_api::ErrorCode;

#[derive(Debug, thiserror::Error)]
pub enum RenameError {
    #[error("Exactly one of id, identifier or before must be given")]
    AmbiguousTarget,

    #[error("Room label {0} already belongs to another sender")]
    LabelCollision(String),

    #[error("No sender matches the rename target")]
    UnknownDevice,

    #[error("Room label must not be empty")]
    InvalidLabel,

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl RenameError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RenameError::AmbiguousTarget => StatusCode::BAD_REQUEST,
            RenameError::LabelCollision(_) => StatusCode::CONFLICT,
            RenameError::UnknownDevice => StatusCode::NOT_FOUND,
            RenameError::InvalidLabel => StatusCode::BAD_REQUEST,
            RenameError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            RenameError::AmbiguousTarget => ErrorCode::AmbiguousTarget,
            RenameError::LabelCollision(_) => ErrorCode::LabelCollision,
            RenameError::UnknownDevice => ErrorCode::UnknownDevice,
            RenameError::InvalidLabel => ErrorCode::InvalidLabel,
            RenameError::Storage(_) => ErrorCode::StorageError,
        }
    }
}
