use axum::http::StatusCode;
use wethap_api::ErrorCode;

#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    #[error("Room {0} is not connected")]
    RoomNotConnected(String),

    #[error("Room label must not be empty")]
    InvalidLabel,
}

impl RoomError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RoomError::RoomNotConnected(_) => StatusCode::NOT_FOUND,
            RoomError::InvalidLabel => StatusCode::BAD_REQUEST,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            RoomError::RoomNotConnected(_) => ErrorCode::RoomNotConnected,
            RoomError::InvalidLabel => ErrorCode::InvalidLabel,
        }
    }
}
