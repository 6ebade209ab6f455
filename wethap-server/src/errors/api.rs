use super::{InfoError, RenameError, RoomError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Rename error: {0}")]
    RenameError(#[from] RenameError),

    #[error("Room error: {0}")]
    RoomError(#[from] RoomError),

    #[error("Info error: {0}")]
    InfoError(#[from] InfoError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}
