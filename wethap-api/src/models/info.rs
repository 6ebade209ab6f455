use alloc::string::String;

use serde::{Deserialize, Serialize};

use super::Id;

/// Stored reading as returned by the read endpoints.
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoResponse {
    /// Record identifier
    pub id: Id,
    /// Room label
    #[serde(rename = "labID")]
    pub lab_id: String,
    /// Local date, `YYYY-MM-DD`
    pub date: String,
    /// Local time, `HH:MM:SS`
    pub time: Option<String>,
    /// Schedule position, absent for manual readings
    #[serde(rename = "numGen")]
    pub num_gen: Option<u32>,
    /// Temperature in Celsius
    pub temperature: f64,
    /// Relative humidity percentage
    pub humidity: f64,
    /// Pressure in hPa
    pub pressure: f64,
    /// Weather at the time of the reading
    pub weather: String,
}
