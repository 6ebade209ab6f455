use alloc::string::String;
use core::fmt::Debug;

/// What a read from the server link produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    Text(String),
    Closed,
}

/// A text-framed, bidirectional connection to the collection server.
#[allow(async_fn_in_trait)]
pub trait SenderLink {
    type Error: Debug;

    async fn open(&mut self, url: &str) -> Result<(), Self::Error>;

    async fn send_text(&mut self, text: &str) -> Result<(), Self::Error>;

    /// Waits for the next frame; control frames are answered by the implementation
    async fn recv(&mut self) -> Result<LinkEvent, Self::Error>;

    async fn close(&mut self) -> Result<(), Self::Error>;
}
