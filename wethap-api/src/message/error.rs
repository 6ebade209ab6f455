use core::fmt;

use serde::{Deserialize, Serialize};

/// Stable status strings reported to operators on failed calls.
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorCode {
    /// Target label already belongs to a different sender.
    LabelCollision,
    /// Rename target given by zero or several selectors.
    AmbiguousTarget,
    /// No sender matches the rename target.
    UnknownDevice,
    /// Empty or otherwise unusable room label.
    InvalidLabel,
    /// No live session holds the requested room.
    RoomNotConnected,
    /// Malformed request parameters.
    InvalidRequest,
    /// Malformed or out-of-order sender handshake.
    ProtocolError,
    /// Persistence layer failure.
    StorageError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::LabelCollision => "LabelCollision",
            ErrorCode::AmbiguousTarget => "AmbiguousTarget",
            ErrorCode::UnknownDevice => "UnknownDevice",
            ErrorCode::InvalidLabel => "InvalidLabel",
            ErrorCode::RoomNotConnected => "RoomNotConnected",
            ErrorCode::InvalidRequest => "InvalidRequest",
            ErrorCode::ProtocolError => "ProtocolError",
            ErrorCode::StorageError => "StorageError",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
