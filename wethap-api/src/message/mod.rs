mod error;
mod handshake;
mod push;
mod report;

pub use error::ErrorCode;
pub use handshake::{Handshake, HandshakeAck};
pub use push::ServerPush;
pub use report::{Info, ReadingReport};

/// Close code sent when a sender violates the handshake protocol.
pub const CLOSE_POLICY_VIOLATION: u16 = 1008;

/// Close code sent when the server cannot persist the sender identity.
pub const CLOSE_INTERNAL_ERROR: u16 = 1011;

/// Close code sent to an older session when the same device reconnects.
pub const CLOSE_SUPERSEDED: u16 = 4001;
