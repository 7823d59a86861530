//! STK500v2 command dispatcher.
//!
//! Every handler answers in place: byte 0 keeps the command code, byte 1 is
//! the status, results follow. A request that cannot be served is answered
//! with `[cmd, STATUS_CMD_FAILED]` and leaves flash untouched.

use ufmt::derive::uDebug;

use super::Session;
use crate::config::{
    BUILD_NUMBER_HIGH, BUILD_NUMBER_LOW, HW_VERSION, MESSAGE_CAPACITY, SIGN_ON_ID, SW_MAJOR,
    SW_MINOR,
};
use crate::drivers::flash::{FlashError, FlashProgrammer};
use crate::hal::{FlashMemory, Fuse};
use crate::protocol::{
    Command, Message, ProtocolError, PARAM_BUILD_NUMBER_HIGH, PARAM_BUILD_NUMBER_LOW, PARAM_HW_VER,
    PARAM_SW_MAJOR, PARAM_SW_MINOR, STATUS_CMD_FAILED, STATUS_CMD_OK,
};

/// Offset of the data block in a PROGRAM_FLASH_ISP request
const PROGRAM_DATA_OFFSET: usize = 10;

#[derive(Debug, uDebug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    UnknownCommand(u8),
    /// Request shorter than the command's fixed layout
    Truncated,
    /// Data block or answer would not fit the message buffer
    SizeExceedsBuffer,
    InvalidSize,
    AddressOutOfRange,
}

impl From<FlashError> for DispatchError {
    fn from(err: FlashError) -> Self {
        match err {
            FlashError::AddressOutOfRange => DispatchError::AddressOutOfRange,
            FlashError::InvalidSize => DispatchError::InvalidSize,
        }
    }
}

impl From<ProtocolError> for DispatchError {
    fn from(_: ProtocolError) -> Self {
        DispatchError::SizeExceedsBuffer
    }
}

type Result<T> = core::result::Result<T, DispatchError>;

/// Answer the request held in `message`. On error the FAILED response has
/// already been written.
pub fn dispatch<F: FlashMemory>(
    message: &mut Message,
    session: &mut Session,
    programmer: &mut FlashProgrammer<F>,
) -> Result<Command> {
    let outcome = match Command::from_byte(message.command()) {
        Some(command) => handle(command, message, session, programmer).map(|_| command),
        None => Err(DispatchError::UnknownCommand(message.command())),
    };
    if outcome.is_err() {
        message.reply(STATUS_CMD_FAILED);
    }
    outcome
}

fn handle<F: FlashMemory>(
    command: Command,
    message: &mut Message,
    session: &mut Session,
    programmer: &mut FlashProgrammer<F>,
) -> Result<()> {
    match command {
        Command::SignOn => {
            let mut reply = message.reply(STATUS_CMD_OK);
            reply.push(SIGN_ON_ID.len() as u8)?;
            reply.extend(SIGN_ON_ID)?;
        }
        Command::GetParameter => {
            let value = parameter(message.arg(1).ok_or(DispatchError::Truncated)?);
            message.reply(STATUS_CMD_OK).push(value)?;
        }
        Command::SetParameter | Command::EnterProgmodeIsp => {
            message.reply(STATUS_CMD_OK);
        }
        Command::LeaveProgmodeIsp => {
            session.serving = false;
            message.reply(STATUS_CMD_OK);
        }
        Command::LoadAddress => {
            let b = message.args(1, 4).ok_or(DispatchError::Truncated)?;
            let word_address = if programmer.device().extended_addressing {
                u32::from_be_bytes([b[0], b[1], b[2], b[3]])
            } else {
                u32::from(u16::from_be_bytes([b[2], b[3]]))
            };
            // Bit 31 is avrdude's "load extended address" flag and falls off here
            session.current_address = word_address << 1;
            message.reply(STATUS_CMD_OK);
        }
        Command::ChipEraseIsp => {
            // Pages are erased as the next download reaches them, so nothing
            // has been erased yet and the status says so.
            session.erase_frontier = 0;
            message.reply(STATUS_CMD_FAILED);
        }
        Command::ProgramFlashIsp => {
            let size = usize::from(message.arg_u16(1).ok_or(DispatchError::Truncated)?);
            if PROGRAM_DATA_OFFSET + size > MESSAGE_CAPACITY {
                return Err(DispatchError::SizeExceedsBuffer);
            }
            let data = message
                .args(PROGRAM_DATA_OFFSET, size)
                .ok_or(DispatchError::Truncated)?;
            programmer.write(
                &mut session.current_address,
                &mut session.erase_frontier,
                data,
            )?;
            message.reply(STATUS_CMD_OK);
        }
        Command::ReadFlashIsp => {
            let size = usize::from(message.arg_u16(1).ok_or(DispatchError::Truncated)?);
            if size + 3 > MESSAGE_CAPACITY {
                return Err(DispatchError::SizeExceedsBuffer);
            }
            let mut reply = message.reply(STATUS_CMD_OK);
            programmer.read(&mut session.current_address, reply.reserve(size)?)?;
            reply.push(STATUS_CMD_OK)?;
        }
        Command::ReadSignatureIsp => {
            let index = message.arg(4).ok_or(DispatchError::Truncated)?;
            let signature = signature_byte(programmer, index);
            read_back(message, signature)?;
        }
        Command::ReadLockIsp => {
            let lock = programmer.read_fuse(Fuse::Lock);
            read_back(message, lock)?;
        }
        Command::ReadFuseIsp => {
            let select = message.args(2, 2).ok_or(DispatchError::Truncated)?;
            let fuse = match (select[0], select[1]) {
                (0x50, 0x08) => Fuse::Extended,
                (0x50, _) => Fuse::Low,
                _ => Fuse::High,
            };
            let value = programmer.read_fuse(fuse);
            read_back(message, value)?;
        }
        Command::SpiMulti => spi_multi(message, programmer)?,
    }
    Ok(())
}

/// `[cmd, OK, value, OK]`, the shape of every ISP read-back command.
fn read_back(message: &mut Message, value: u8) -> Result<()> {
    let mut reply = message.reply(STATUS_CMD_OK);
    reply.push(value)?;
    reply.push(STATUS_CMD_OK)?;
    Ok(())
}

fn parameter(id: u8) -> u8 {
    match id {
        PARAM_BUILD_NUMBER_LOW => BUILD_NUMBER_LOW,
        PARAM_BUILD_NUMBER_HIGH => BUILD_NUMBER_HIGH,
        PARAM_HW_VER => HW_VERSION,
        PARAM_SW_MAJOR => SW_MAJOR,
        PARAM_SW_MINOR => SW_MINOR,
        _ => 0,
    }
}

fn signature_byte<F: FlashMemory>(programmer: &FlashProgrammer<F>, index: u8) -> u8 {
    let signature = programmer.device().signature;
    match index {
        0 => signature[0],
        1 => signature[1],
        _ => signature[2],
    }
}

/// Answers the raw ISP instructions avrdude uses for signature and fuse reads;
/// anything else gets a zero so the host carries on.
#[cfg(feature = "spi-multi")]
fn spi_multi<F: FlashMemory>(
    message: &mut Message,
    programmer: &mut FlashProgrammer<F>,
) -> Result<()> {
    let instruction = message.arg(4).ok_or(DispatchError::Truncated)?;
    let answer = match instruction {
        0x30 => {
            let index = message.arg(6).ok_or(DispatchError::Truncated)?;
            signature_byte(programmer, index)
        }
        0x50 => programmer.read_fuse(Fuse::Low),
        0x58 => programmer.read_fuse(Fuse::High),
        _ => 0,
    };
    let mut reply = message.reply(STATUS_CMD_OK);
    reply.extend(&[0, instruction, 0, answer, STATUS_CMD_OK])?;
    Ok(())
}

#[cfg(not(feature = "spi-multi"))]
fn spi_multi<F: FlashMemory>(
    message: &mut Message,
    _programmer: &mut FlashProgrammer<F>,
) -> Result<()> {
    Err(DispatchError::UnknownCommand(message.command()))
}
