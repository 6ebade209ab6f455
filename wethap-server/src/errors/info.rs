use axum::http::StatusCode;
use wethap_api::ErrorCode;

#[derive(Debug, thiserror::Error)]
pub enum InfoError {
    #[error("Missing query parameter {0}")]
    MissingParameter(&'static str),

    #[error("Invalid date {0}, expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Room label must not be empty")]
    InvalidLabel,

    #[error("Reading {num_gen} of {date} is already recorded for {lab_id}")]
    DuplicateReading {
        lab_id: String,
        date: String,
        num_gen: i64,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl InfoError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            InfoError::MissingParameter(_) => StatusCode::BAD_REQUEST,
            InfoError::InvalidDate(_) => StatusCode::BAD_REQUEST,
            InfoError::InvalidLabel => StatusCode::BAD_REQUEST,
            InfoError::DuplicateReading { .. } => StatusCode::CONFLICT,
            InfoError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            InfoError::MissingParameter(_) => ErrorCode::InvalidRequest,
            InfoError::InvalidDate(_) => ErrorCode::InvalidRequest,
            InfoError::InvalidLabel => ErrorCode::InvalidLabel,
            InfoError::DuplicateReading { .. } => ErrorCode::InvalidRequest,
            InfoError::Storage(_) => ErrorCode::StorageError,
        }
    }
}
