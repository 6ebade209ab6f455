use alloc::string::String;
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use super::Id;

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SenderResponse {
    /// Sequence identifier
    pub id: Id,
    /// Device key
    pub uuid: String,
    /// Secondary hardware identifier
    pub identifier: Option<String>,
    /// Room label
    #[serde(rename = "labID")]
    pub lab_id: String,
    /// Whether a session currently holds this label
    pub connected: bool,
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomsResponse {
    /// Room labels, sorted
    #[serde(rename = "labIDs")]
    pub lab_ids: Vec<String>,
}

/// Rename body. Exactly one of `id`, `identifier`, `before` selects the sender.
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenameSenderRequest {
    /// Sequence identifier of the sender
    #[serde(default)]
    pub id: Option<Id>,
    /// Secondary hardware identifier of the sender
    #[serde(default)]
    pub identifier: Option<String>,
    /// Current room label of the sender
    #[serde(default)]
    pub before: Option<String>,
    /// New room label
    pub after: String,
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameSenderResponse {
    /// Sequence identifier of the renamed sender
    pub id: Id,
    /// Label before the rename
    pub before: String,
    /// Label after the rename
    pub after: String,
    /// Whether a live session received the change in-band
    pub notified: bool,
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestInfoResponse {
    /// Room the request was pushed to
    #[serde(rename = "labID")]
    pub lab_id: String,
    /// Always `requested`
    pub status: String,
}
