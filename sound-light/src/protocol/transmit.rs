//! Outbound encoding.
//!
//! Writes are fire-and-forget: there is no acknowledgment on the link, and a
//! lost frame is corrected by the leader re-asserting state later.

use core::fmt;

use embedded_hal_nb::serial::Write;

use super::command::Command;
use super::framing::FRAME_START;
use super::message::Message;

/// Terminator appended to outbound frames.
pub const FRAME_END: u8 = b'\n';

/// Blocking byte writer usable with `write!`.
pub struct SerialWriter<'a, W> {
    port: &'a mut W,
}

impl<'a, W: Write<u8>> SerialWriter<'a, W> {
    pub fn new(port: &'a mut W) -> Self {
        Self { port }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), W::Error> {
        for &byte in bytes {
            nb::block!(self.port.write(byte))?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), W::Error> {
        nb::block!(self.port.flush())
    }
}

impl<W: Write<u8>> fmt::Write for SerialWriter<'_, W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write_bytes(s.as_bytes()).map_err(|_| fmt::Error)
    }
}

/// Send a single command byte.
pub fn send_command<W: Write<u8>>(port: &mut W, command: Command) -> Result<(), W::Error> {
    SerialWriter::new(port).write_bytes(&[command.code()])
}

/// Send a raw body as a framed message.
pub fn send_frame<W: Write<u8>>(port: &mut W, body: &[u8]) -> Result<(), W::Error> {
    let mut out = SerialWriter::new(port);
    out.write_bytes(&[FRAME_START])?;
    out.write_bytes(body)?;
    out.write_bytes(&[FRAME_END])
}

/// Send a message in its canonical framed form.
pub fn send_message<W: Write<u8>>(port: &mut W, message: &Message) -> fmt::Result {
    use fmt::Write as _;

    let mut out = SerialWriter::new(port);
    out.write_bytes(&[FRAME_START]).map_err(|_| fmt::Error)?;
    write!(out, "{}", message)?;
    out.write_bytes(&[FRAME_END]).map_err(|_| fmt::Error)
}
