#![cfg_attr(not(any(test, feature = "std")), no_std)]

extern crate alloc;

pub mod board;
pub mod client;
pub mod config;
pub mod display;
pub mod error;
pub mod network;
pub mod sensor;
pub mod storage;
pub mod time;

pub use client::{ClientState, Hardware, Platform, SenderClient};
pub use config::SenderConfig;
pub use error::*;
