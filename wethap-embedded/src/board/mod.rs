use alloc::string::String;
use core::fmt::Write;

/// Chip-level services of the sender board.
pub trait Board {
    /// Factory-programmed identifier of the flash or MCU
    fn unique_id(&self) -> [u8; 8];

    /// Cold restart; never returns
    fn reset(&mut self) -> !;
}

/// Lower-case hex of the unique id, used as the device key in the handshake.
pub fn device_key<B: Board>(board: &B) -> String {
    let mut key = String::with_capacity(16);
    for byte in board.unique_id() {
        let _ = write!(key, "{:02x}", byte);
    }
    key
}
