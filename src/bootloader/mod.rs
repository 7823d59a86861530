//! Boot decision engine.
//!
//! ```text
//! PowerOn -> (WatchdogBypass | AwaitHost) -> [ProtocolLoop] -> TransferControl
//! ```
//!
//! Only the wait for the host's first byte is bounded. Once a session has
//! started, frame reception and flash operations block for as long as they
//! take; a host that stops mid-frame leaves the device waiting.

pub mod commands;
pub mod session;

use ufmt::derive::uDebug;
use ufmt::uWrite;

pub use commands::{dispatch, DispatchError};
pub use session::Session;

use crate::config::BootConfig;
use crate::drivers::flash::FlashProgrammer;
use crate::hal::{FlashMemory, HostLink, ResetCause, SystemControl};
use crate::protocol::{FrameHeader, FrameParser, Message, Transport};
use crate::trace;

/// Why the protocol was skipped or ended
#[derive(Debug, uDebug, Clone, Copy, PartialEq, Eq)]
pub enum BootPath {
    /// The application restarted itself through the watchdog
    WatchdogBypass,
    /// Nothing arrived within the entry window
    NoHost,
    /// The host sent LEAVE_PROGMODE_ISP
    SessionEnded,
}

#[derive(Debug, uDebug, Clone, Copy, PartialEq, Eq)]
pub enum BootOutcome {
    /// Control was handed to the application. Only observable off-target.
    Started(BootPath),
    /// Reset vector is erased; the caller must halt.
    NoApplication(BootPath),
}

pub struct Bootloader<S, F, C, L> {
    transport: Transport<S>,
    programmer: FlashProgrammer<F>,
    system: C,
    log: L,
    parser: FrameParser,
    message: Message,
    entry_window: u32,
}

impl<S, F, C, L> Bootloader<S, F, C, L>
where
    S: HostLink,
    F: FlashMemory,
    C: SystemControl,
    L: uWrite,
{
    pub fn new(serial: S, flash: F, system: C, log: L, config: BootConfig) -> Self {
        Self {
            transport: Transport::new(serial),
            programmer: FlashProgrammer::new(flash, config.device),
            system,
            log,
            parser: FrameParser::new(),
            message: Message::new(),
            entry_window: config.entry_window,
        }
    }

    pub fn run(&mut self) -> BootOutcome {
        let cause = self.system.reset_cause();
        self.system.disable_watchdog();
        trace!(self.log, "reset cause {}", cause.bits());

        let path = if cause.is_watchdog() {
            BootPath::WatchdogBypass
        } else {
            self.transport.open();
            if self.transport.wait_for_activity(self.entry_window) {
                let mut session = Session::new();
                self.serve(&mut session);
                BootPath::SessionEnded
            } else {
                BootPath::NoHost
            }
        };

        self.transfer_control(cause, path)
    }

    /// Answer requests until the host leaves programming mode.
    pub fn serve(&mut self, session: &mut Session) {
        while session.serving {
            let header = self.receive_frame();
            session.sequence = header.sequence;

            match dispatch(&mut self.message, session, &mut self.programmer) {
                Ok(command) => trace!(self.log, "seq {}: {:?}", header.sequence, command),
                Err(err) => trace!(self.log, "seq {}: failed {:?}", header.sequence, err),
            }

            if let Err(err) = self
                .transport
                .send_frame(session.sequence, self.message.response())
            {
                trace!(self.log, "response lost: {:?}", err);
            }
        }
    }

    /// Block until one checksum-valid frame sits in the message buffer.
    fn receive_frame(&mut self) -> FrameHeader {
        loop {
            let fed = match self.transport.read_byte() {
                Ok(byte) => self.parser.feed(byte, &mut self.message),
                Err(err) => {
                    self.parser.resync();
                    Err(err)
                }
            };
            match fed {
                Ok(Some(header)) => return header,
                Ok(None) => {}
                Err(err) => trace!(self.log, "frame dropped: {:?}", err),
            }
        }
    }

    fn transfer_control(&mut self, cause: ResetCause, path: BootPath) -> BootOutcome {
        if !self.programmer.application_present() {
            trace!(self.log, "{:?}: no application", path);
            return BootOutcome::NoApplication(path);
        }
        trace!(self.log, "{:?}: starting application", path);
        self.system.start_application(cause);
        BootOutcome::Started(path)
    }

    pub fn release(self) -> (S, F, C, L) {
        (
            self.transport.release(),
            self.programmer.into_inner(),
            self.system,
            self.log,
        )
    }
}
