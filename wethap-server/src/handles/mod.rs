mod info_handle;
mod sender_handle;
mod sender_ws_handle;

pub use info_handle::*;
pub use sender_handle::*;
pub use sender_ws_handle::*;
