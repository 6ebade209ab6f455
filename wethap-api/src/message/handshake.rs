use alloc::string::String;

use serde::{Deserialize, Serialize};

/// First frame a sender writes after the link opens.
///
/// Every field defaults to empty so that a frame missing `uuid` or `labID`
/// still parses and can be rejected with a policy-violation close instead of
/// a decode failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Handshake {
    /// Persistent device key.
    #[serde(default)]
    pub uuid: String,
    /// Stable hardware identifier, used as a secondary lookup key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    /// Room label the sender has cached locally.
    #[serde(rename = "labID", default)]
    pub lab_id: String,
}

impl Handshake {
    pub fn new(uuid: impl Into<String>, identifier: Option<String>, lab_id: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            identifier,
            lab_id: lab_id.into(),
        }
    }

    /// Both the device key and the candidate label are present.
    pub fn is_complete(&self) -> bool {
        !self.uuid.trim().is_empty() && !self.lab_id.trim().is_empty()
    }
}

/// Server reply carrying the authoritative room label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeAck {
    #[serde(rename = "labID")]
    pub lab_id: String,
}
