mod json;

pub use json::JsonProtocol;

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Serialization error
    Serialization(String),
    /// Deserialization error
    Deserialization(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Serialization(e) => write!(f, "Serialization error: {}", e),
            Error::Deserialization(e) => write!(f, "Deserialization error: {}", e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

pub type Result<T> = core::result::Result<T, Error>;

pub trait Protocol: Send + Sync {
    /// Serialize data into bytes
    fn serialize<T: serde::Serialize>(&self, data: &T) -> Result<Vec<u8>>;

    /// Deserialize bytes into data
    fn deserialize<T: for<'de> serde::Deserialize<'de>>(&self, bytes: &[u8]) -> Result<T>;

    /// Serialize into a text frame
    fn encode_text<T: serde::Serialize>(&self, data: &T) -> Result<String> {
        let bytes = self.serialize(data)?;
        String::from_utf8(bytes).map_err(|e| Error::Serialization(alloc::format!("{}", e)))
    }

    /// Deserialize a text frame
    fn decode_text<T: for<'de> serde::Deserialize<'de>>(&self, text: &str) -> Result<T> {
        self.deserialize(text.as_bytes())
    }

    /// Get protocol name
    fn name(&self) -> &'static str;
}
