//! STK500v2 wire protocol (Atmel AVR068)

pub mod frame;
pub mod packet;
pub mod transport;

use ufmt::derive::uDebug;

pub use frame::{FrameHeader, FrameParser};
pub use packet::Message;
pub use transport::Transport;

pub const MESSAGE_START: u8 = 0x1B;
pub const TOKEN: u8 = 0x0E;

pub const STATUS_CMD_OK: u8 = 0x00;
pub const STATUS_CMD_FAILED: u8 = 0xC0;

/// GET_PARAMETER identifiers
pub const PARAM_BUILD_NUMBER_LOW: u8 = 0x80;
pub const PARAM_BUILD_NUMBER_HIGH: u8 = 0x81;
pub const PARAM_HW_VER: u8 = 0x90;
pub const PARAM_SW_MAJOR: u8 = 0x91;
pub const PARAM_SW_MINOR: u8 = 0x92;

#[derive(Debug, uDebug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// Declared length does not fit the message buffer
    BufferOverflow,
    /// Declared length of zero, no command byte
    EmptyFrame,
    BadToken,
    InvalidChecksum,
    TransportError,
}

pub type Result<T> = core::result::Result<T, ProtocolError>;

#[derive(Debug, uDebug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SignOn = 0x01,
    SetParameter = 0x02,
    GetParameter = 0x03,
    LoadAddress = 0x06,
    EnterProgmodeIsp = 0x10,
    LeaveProgmodeIsp = 0x11,
    ChipEraseIsp = 0x12,
    ProgramFlashIsp = 0x13,
    ReadFlashIsp = 0x14,
    ReadFuseIsp = 0x18,
    ReadLockIsp = 0x1A,
    ReadSignatureIsp = 0x1B,
    SpiMulti = 0x1D,
}

impl Command {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Command::SignOn),
            0x02 => Some(Command::SetParameter),
            0x03 => Some(Command::GetParameter),
            0x06 => Some(Command::LoadAddress),
            0x10 => Some(Command::EnterProgmodeIsp),
            0x11 => Some(Command::LeaveProgmodeIsp),
            0x12 => Some(Command::ChipEraseIsp),
            0x13 => Some(Command::ProgramFlashIsp),
            0x14 => Some(Command::ReadFlashIsp),
            0x18 => Some(Command::ReadFuseIsp),
            0x1A => Some(Command::ReadLockIsp),
            0x1B => Some(Command::ReadSignatureIsp),
            #[cfg(feature = "spi-multi")]
            0x1D => Some(Command::SpiMulti),
            _ => None,
        }
    }
}
