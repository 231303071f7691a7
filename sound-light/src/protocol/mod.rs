//! Inter-unit serial protocol.
//!
//! The same codec serves the inter-unit link and the USB console.
//!
//! | Shape | Example | Module |
//! |-------|---------|--------|
//! | Command byte | `p` | [`command`] |
//! | Framed message | `:play;` `:vol0.8\n` | [`message`] |
//! | Status reply | `:STATUS\|1\|23.5\|1\|0\|1200\|60000\n` | [`status`] |
//!
//! [`framing`] assembles inbound bytes into these shapes without blocking;
//! [`transmit`] writes them out.

pub mod command;
pub mod framing;
pub mod message;
pub mod status;
pub mod transmit;

pub use command::{Command, UnknownCommand};
pub use framing::{Frame, Inbound, LinkReceiver, Receiver, MESSAGE_BUFFER_SIZE};
pub use message::{Message, ParseError};
pub use status::{StatusError, StatusReport};
pub use transmit::{send_command, send_frame, send_message, SerialWriter};
