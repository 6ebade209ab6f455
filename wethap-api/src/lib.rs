#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod label;
pub mod message;
pub mod models;
pub mod protocols;

pub use message::{
    ErrorCode, Handshake, HandshakeAck, Info, ReadingReport, ServerPush,
};
pub use protocols::{Error, JsonProtocol, Protocol};
