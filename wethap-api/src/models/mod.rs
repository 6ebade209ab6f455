mod info;
mod sender;

pub use info::*;
pub use sender::*;

use alloc::string::String;

use serde::{Deserialize, Serialize};

use crate::message::ErrorCode;

pub type Id = i64;

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Outcome string, e.g. `online` or `added`
    pub status: String,
}

impl StatusResponse {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
        }
    }
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// HTTP status code
    pub code: u16,
    /// Stable failure string
    pub status: ErrorCode,
    /// Human readable description
    pub message: String,
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}
