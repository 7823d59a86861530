//! Request/response message buffer.
//!
//! One buffer carries the request in and the response out. Byte 0 holds the
//! command code in both directions; a response starts with the status at
//! byte 1 and grows from there.

use super::{ProtocolError, Result};
use crate::config::MESSAGE_CAPACITY;

pub struct Message {
    buffer: [u8; MESSAGE_CAPACITY],
    request_len: usize,
    response_len: usize,
}

impl Message {
    pub const fn new() -> Self {
        Self {
            buffer: [0; MESSAGE_CAPACITY],
            request_len: 0,
            response_len: 0,
        }
    }

    pub const fn capacity(&self) -> usize {
        MESSAGE_CAPACITY
    }

    /// Forget the previous exchange before a new frame is received.
    pub fn clear(&mut self) {
        self.request_len = 0;
        self.response_len = 0;
    }

    /// Append one payload byte of an incoming frame.
    pub fn receive(&mut self, byte: u8) -> Result<()> {
        if self.request_len >= MESSAGE_CAPACITY {
            return Err(ProtocolError::BufferOverflow);
        }
        self.buffer[self.request_len] = byte;
        self.request_len += 1;
        Ok(())
    }

    pub fn request(&self) -> &[u8] {
        &self.buffer[..self.request_len]
    }

    pub fn command(&self) -> u8 {
        self.buffer[0]
    }

    /// Request byte at `index`, `None` past the received payload.
    pub fn arg(&self, index: usize) -> Option<u8> {
        self.request().get(index).copied()
    }

    /// Big-endian 16-bit request field starting at `index`.
    pub fn arg_u16(&self, index: usize) -> Option<u16> {
        Some(u16::from_be_bytes([self.arg(index)?, self.arg(index + 1)?]))
    }

    pub fn args(&self, start: usize, len: usize) -> Option<&[u8]> {
        self.request().get(start..start.checked_add(len)?)
    }

    /// Start the response. The command byte stays in place, the request is
    /// gone afterwards.
    pub fn reply(&mut self, status: u8) -> Reply<'_> {
        self.buffer[1] = status;
        self.response_len = 2;
        self.request_len = 0;
        Reply { message: self }
    }

    pub fn response(&self) -> &[u8] {
        &self.buffer[..self.response_len]
    }
}

impl Default for Message {
    fn default() -> Self {
        Self::new()
    }
}

/// Write cursor over the response part of a [`Message`].
pub struct Reply<'a> {
    message: &'a mut Message,
}

impl Reply<'_> {
    pub fn push(&mut self, byte: u8) -> Result<()> {
        self.reserve(1)?[0] = byte;
        Ok(())
    }

    pub fn extend(&mut self, bytes: &[u8]) -> Result<()> {
        self.reserve(bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    /// Hand out the next `len` response bytes for in-place filling.
    pub fn reserve(&mut self, len: usize) -> Result<&mut [u8]> {
        let start = self.message.response_len;
        let end = start + len;
        if end > MESSAGE_CAPACITY {
            return Err(ProtocolError::BufferOverflow);
        }
        self.message.response_len = end;
        Ok(&mut self.message.buffer[start..end])
    }
}
