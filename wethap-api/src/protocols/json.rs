use alloc::vec::Vec;

use super::{Error, Protocol, Result};

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonProtocol;

impl Protocol for JsonProtocol {
    fn serialize<T: serde::Serialize>(&self, data: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(data).map_err(|e| Error::Serialization(alloc::format!("{}", e)))
    }

    fn deserialize<T: for<'de> serde::Deserialize<'de>>(&self, bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).map_err(|e| Error::Deserialization(alloc::format!("{}", e)))
    }

    fn name(&self) -> &'static str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{HandshakeAck, ServerPush};

    #[test]
    fn test_encode_text_push() {
        let text = JsonProtocol
            .encode_text(&ServerPush::KeepAlive)
            .unwrap();
        assert_eq!(text, r#"{"message":"keep alive"}"#);
    }

    #[test]
    fn test_decode_text_error_kind() {
        let result = JsonProtocol.decode_text::<HandshakeAck>("{not json");
        assert!(matches!(result, Err(Error::Deserialization(_))));
    }
}
