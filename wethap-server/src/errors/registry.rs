use wethap_api::ErrorCode;

use crate::services::connection_registry::SessionToken;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Session {0} is not registered")]
    UnknownSession(SessionToken),

    #[error("Session {0} already completed its handshake")]
    HandshakeRepeated(SessionToken),

    #[error("Room label {0} is held by another live session")]
    LabelInUse(String),
}

impl RegistryError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::ProtocolError
    }
}
