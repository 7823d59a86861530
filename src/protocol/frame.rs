//! Frame layer: `[START][SEQ][LEN_HI][LEN_LO][TOKEN][payload][CHECKSUM]`
//!
//! The checksum is the XOR of every byte from START through the last payload
//! byte. Incoming frames are assembled one byte per state transition and
//! nothing reaches the dispatcher before the checksum has matched.

use super::{Message, ProtocolError, Result, MESSAGE_START, TOKEN};
use crate::config::MESSAGE_CAPACITY;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    Idle,
    SeqNum,
    LenHigh,
    LenLow,
    Token,
    Data,
    Check,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Echoed verbatim in the response
    pub sequence: u8,
    pub length: u16,
}

pub struct FrameParser {
    state: ParseState,
    checksum: u8,
    sequence: u8,
    length: u16,
}

impl FrameParser {
    pub const fn new() -> Self {
        Self {
            state: ParseState::Idle,
            checksum: 0,
            sequence: 0,
            length: 0,
        }
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    /// Drop any partial frame and hunt for the next start marker.
    pub fn resync(&mut self) {
        self.state = ParseState::Idle;
    }

    /// Consume one byte. Returns the header once a frame has been accepted
    /// into `message`, and an error whenever a partial frame is thrown away.
    pub fn feed(&mut self, byte: u8, message: &mut Message) -> Result<Option<FrameHeader>> {
        match self.state {
            // A delivered frame has been consumed by the time the next byte arrives
            ParseState::Idle | ParseState::Ready => {
                if byte == MESSAGE_START {
                    self.checksum = MESSAGE_START;
                    message.clear();
                    self.state = ParseState::SeqNum;
                } else {
                    self.state = ParseState::Idle;
                }
            }
            ParseState::SeqNum => {
                self.sequence = byte;
                self.checksum ^= byte;
                self.state = ParseState::LenHigh;
            }
            ParseState::LenHigh => {
                self.length = u16::from(byte) << 8;
                self.checksum ^= byte;
                self.state = ParseState::LenLow;
            }
            ParseState::LenLow => {
                self.length |= u16::from(byte);
                self.checksum ^= byte;
                if self.length == 0 {
                    return self.reject(ProtocolError::EmptyFrame);
                }
                if usize::from(self.length) > MESSAGE_CAPACITY {
                    return self.reject(ProtocolError::BufferOverflow);
                }
                self.state = ParseState::Token;
            }
            ParseState::Token => {
                if byte != TOKEN {
                    return self.reject(ProtocolError::BadToken);
                }
                self.checksum ^= byte;
                self.state = ParseState::Data;
            }
            ParseState::Data => {
                if let Err(err) = message.receive(byte) {
                    return self.reject(err);
                }
                self.checksum ^= byte;
                if message.request().len() == usize::from(self.length) {
                    self.state = ParseState::Check;
                }
            }
            ParseState::Check => {
                if byte != self.checksum {
                    return self.reject(ProtocolError::InvalidChecksum);
                }
                self.state = ParseState::Ready;
                return Ok(Some(FrameHeader {
                    sequence: self.sequence,
                    length: self.length,
                }));
            }
        }
        Ok(None)
    }

    fn reject(&mut self, err: ProtocolError) -> Result<Option<FrameHeader>> {
        self.state = ParseState::Idle;
        Err(err)
    }
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialize one frame around `payload`, handing each byte to `emit`.
pub fn encode<F>(sequence: u8, payload: &[u8], mut emit: F) -> Result<()>
where
    F: FnMut(u8) -> Result<()>,
{
    if payload.len() > MESSAGE_CAPACITY {
        return Err(ProtocolError::BufferOverflow);
    }
    let [len_hi, len_lo] = (payload.len() as u16).to_be_bytes();

    let mut checksum = 0u8;
    for &byte in [MESSAGE_START, sequence, len_hi, len_lo, TOKEN]
        .iter()
        .chain(payload)
    {
        checksum ^= byte;
        emit(byte)?;
    }
    emit(checksum)
}
