//! Inbound framing on a half-duplex byte stream.
//!
//! Two shapes share one stream:
//!
//! ```text
//!   'p'                      command byte, rest of the pending input dropped
//!   ':' body ('\n'|'\r'|';') framed message
//!   ':' body <250 ms idle>   framed message closed by timeout
//! ```
//!
//! [`Receiver::poll`] never blocks: it consumes whatever the port has ready
//! and returns at most one [`Inbound`] item per call.

use embedded_hal_nb::serial::Read;
use heapless::Vec;

use crate::Millis;

/// Byte that opens a framed message.
pub const FRAME_START: u8 = b':';

/// Bytes that close a framed message.
pub const FRAME_TERMINATORS: [u8; 3] = [b'\n', b'\r', b';'];

/// Frame buffer size. One slot is kept for the terminator when the frame is
/// re-transmitted, so bodies hold at most `MESSAGE_BUFFER_SIZE - 1` bytes.
pub const MESSAGE_BUFFER_SIZE: usize = 512;

/// Receiver with the default buffer size.
pub type LinkReceiver = Receiver<MESSAGE_BUFFER_SIZE>;

/// Body of a framed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame<const N: usize> {
    body: Vec<u8, N>,
    truncated: bool,
}

impl<const N: usize> Frame<N> {
    pub fn as_bytes(&self) -> &[u8] {
        &self.body
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Input was longer than the buffer and the tail was dropped.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

/// One unit of inbound traffic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound<const N: usize> {
    /// A raw command byte, not yet decoded.
    Command(u8),
    /// A complete (possibly truncated) framed message.
    Message(Frame<N>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RxState {
    Idle,
    /// Inside a frame; time of the last received byte.
    Framing { last_byte: Millis },
}

/// Non-blocking frame assembler for one serial port.
pub struct Receiver<const N: usize> {
    state: RxState,
    body: Vec<u8, N>,
    truncated: bool,
    timeout_ms: Millis,
}

impl<const N: usize> Receiver<N> {
    /// Longest body kept; further bytes are dropped.
    pub const MAX_BODY: usize = N - 1;

    pub const fn new(timeout_ms: Millis) -> Self {
        Self {
            state: RxState::Idle,
            body: Vec::new(),
            truncated: false,
            timeout_ms,
        }
    }

    /// A frame is partially received.
    pub fn in_frame(&self) -> bool {
        matches!(self.state, RxState::Framing { .. })
    }

    /// Abandon any partial frame.
    pub fn reset(&mut self) {
        self.state = RxState::Idle;
        self.body.clear();
        self.truncated = false;
    }

    /// Read everything pending on `port` and throw it away.
    pub fn discard<R: Read<u8>>(&mut self, port: &mut R) -> usize {
        self.reset();
        drain(port)
    }

    /// Consume ready bytes and return the next complete item, if any.
    pub fn poll<R: Read<u8>>(&mut self, port: &mut R, now: Millis) -> Option<Inbound<N>> {
        loop {
            let byte = match port.read() {
                Ok(byte) => byte,
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(_)) => {
                    warn!("serial read error");
                    break;
                }
            };

            match self.state {
                RxState::Idle => {
                    if byte == FRAME_START {
                        self.body.clear();
                        self.truncated = false;
                        self.state = RxState::Framing { last_byte: now };
                    } else if byte <= b' ' || byte == 0x7f {
                        // Line endings and padding between frames.
                        trace!("skipping control byte {}", byte);
                    } else {
                        let dropped = drain(port);
                        if dropped > 0 {
                            debug!("dropped {} bytes after command byte", dropped);
                        }
                        return Some(Inbound::Command(byte));
                    }
                }
                RxState::Framing { .. } => {
                    if FRAME_TERMINATORS.contains(&byte) {
                        return Some(self.finish());
                    }
                    self.state = RxState::Framing { last_byte: now };
                    if self.body.len() < Self::MAX_BODY {
                        // Capacity is N, the length check keeps one slot free.
                        let _ = self.body.push(byte);
                    } else if !self.truncated {
                        warn!("message exceeds {} bytes, truncating", Self::MAX_BODY);
                        self.truncated = true;
                    }
                }
            }
        }

        if let RxState::Framing { last_byte } = self.state {
            if now.wrapping_sub(last_byte) >= self.timeout_ms {
                debug!("frame closed by timeout");
                return Some(self.finish());
            }
        }
        None
    }

    fn finish(&mut self) -> Inbound<N> {
        let frame = Frame {
            body: core::mem::take(&mut self.body),
            truncated: self.truncated,
        };
        self.reset();
        Inbound::Message(frame)
    }
}

/// Read until the port reports no more data.
fn drain<R: Read<u8>>(port: &mut R) -> usize {
    let mut count = 0;
    while port.read().is_ok() {
        count += 1;
    }
    count
}
