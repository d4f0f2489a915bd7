//! Chat UI controller, independent of how messages are drawn.
//!
//! The browser page in `public/` and the `chat-client` terminal binary both
//! follow the same contract: trimmed input, one pending attachment cleared
//! after every send attempt, and a fixed apology on any failure.

pub mod controller;
pub mod sanitize;
pub mod transport;

pub use controller::{
    ChatController, ChatView, FALLBACK_REPLY, Key, KeyOutcome, KeyPress, SendOutcome, Sender,
};
pub use sanitize::escape_angle_brackets;
pub use transport::{ChatTransport, HttpTransport, TransportError};
