use alloc::string::String;

use serde::{Deserialize, Serialize};

/// Events the server pushes to a connected sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "message")]
pub enum ServerPush {
    /// Take a reading now. `numGen` is present for scheduled readings and
    /// absent for operator-requested ones.
    #[serde(rename = "request info")]
    RequestInfo {
        #[serde(rename = "numGen", default, skip_serializing_if = "Option::is_none")]
        num_gen: Option<u32>,
    },
    /// The operator renamed the room this sender reports as.
    #[serde(rename = "change labID")]
    ChangeLabId {
        #[serde(rename = "new labID")]
        new_lab_id: String,
    },
    /// No-op traffic that keeps idle links from being torn down.
    #[serde(rename = "keep alive")]
    KeepAlive,
}
