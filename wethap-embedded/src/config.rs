use alloc::string::{String, ToString};

use crate::error::FatalDeviceError;

/// Everything a sender needs to know, built into the firmware image.
#[derive(Debug, Clone, PartialEq)]
pub struct SenderConfig {
    /// Room label to ask for when nothing is cached yet
    pub lab_id: String,
    /// Secondary, stable hardware identifier sent with the handshake
    pub identifier: Option<String>,
    pub wifi_ssid: String,
    pub wifi_password: String,
    pub wifi_attempts: u8,
    pub wifi_delay_ms: u64,
    /// WebSocket endpoint, e.g. `wss://host/ws`
    pub server_url: String,
    pub ntp_host: String,
    pub time_api_url: String,
    /// Wait before reopening the link after it dropped
    pub socket_delay_ms: u64,
    pub handshake_timeout_ms: u64,
    /// Longest silence tolerated on an open link; the server sends keep alives well inside it
    pub idle_timeout_ms: u64,
    pub timezone_hours: i8,
    /// Full knob travel maps to `-range..=range` degrees
    pub adjust_temp_range: f64,
    /// Full knob travel maps to `-range..=range` percent
    pub adjust_humid_range: f64,
    pub health_check_ms: u64,
    pub display_refresh_ms: u64,
}

impl SenderConfig {
    pub fn new(
        lab_id: impl Into<String>,
        wifi_ssid: impl Into<String>,
        wifi_password: impl Into<String>,
        server_url: impl Into<String>,
    ) -> Self {
        Self {
            lab_id: lab_id.into(),
            identifier: None,
            wifi_ssid: wifi_ssid.into(),
            wifi_password: wifi_password.into(),
            wifi_attempts: 10,
            wifi_delay_ms: 1000,
            server_url: server_url.into(),
            ntp_host: "ntp.nict.jp".to_string(),
            time_api_url: "https://worldtimeapi.org/api/ip".to_string(),
            socket_delay_ms: 5000,
            handshake_timeout_ms: 10_000,
            idle_timeout_ms: 90_000,
            timezone_hours: 9,
            adjust_temp_range: 15.0,
            adjust_humid_range: 30.0,
            health_check_ms: 10_000,
            display_refresh_ms: 1000,
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn validate(&self) -> Result<(), FatalDeviceError> {
        if wethap_api::label::normalize(&self.lab_id).is_none() {
            return Err(FatalDeviceError::InvalidConfig("lab_id"));
        }
        if self.server_url.is_empty() {
            return Err(FatalDeviceError::InvalidConfig("server_url"));
        }
        if self.wifi_attempts == 0 {
            return Err(FatalDeviceError::InvalidConfig("wifi_attempts"));
        }
        if !(-12..=14).contains(&self.timezone_hours) {
            return Err(FatalDeviceError::InvalidConfig("timezone_hours"));
        }
        Ok(())
    }
}
