//! Simulated serial link, program memory and system control used by the
//! unit tests. They model the parts of the hardware the bootloader relies on:
//! a page buffer, program-only-clears-bits flash, an RWW section that stays
//! unreadable until re-enabled, and a host that can go silent.

use std::collections::VecDeque;
use std::convert::Infallible;
use std::string::String;
use std::vec::Vec;

use embedded_hal::serial;

use crate::config::DeviceProfile;
use crate::hal::{FlashMemory, Fuse, HostLink, ResetCause, SystemControl, ERASED_WORD};
use crate::protocol::{frame, FrameParser, Message};

/// Polls of an empty receive queue tolerated before the host counts as gone.
const STARVATION_LIMIT: u32 = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostGone;

pub struct SimSerial {
    rx: VecDeque<u8>,
    pub tx: Vec<u8>,
    /// Set once the bootloader brings the link up
    pub enabled: bool,
    idle_polls: u32,
    /// Empty polls reported before the queued bytes become visible
    delay: u32,
}

impl SimSerial {
    pub fn new() -> Self {
        Self {
            rx: VecDeque::new(),
            tx: Vec::new(),
            enabled: false,
            idle_polls: 0,
            delay: 0,
        }
    }

    /// Host stays quiet for `polls` receive checks before its bytes arrive.
    pub fn delayed(mut self, polls: u32) -> Self {
        self.delay = polls;
        self
    }

    pub fn queue(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }

    /// Queue one request frame as the host would send it.
    pub fn send_request(&mut self, sequence: u8, payload: &[u8]) {
        let rx = &mut self.rx;
        frame::encode(sequence, payload, |byte| {
            rx.push_back(byte);
            Ok(())
        })
        .unwrap();
    }

    pub fn unread(&self) -> usize {
        self.rx.len()
    }
}

impl serial::Read<u8> for SimSerial {
    type Error = HostGone;

    fn read(&mut self) -> nb::Result<u8, HostGone> {
        assert!(self.enabled, "read from a link that was never enabled");
        if self.delay > 0 {
            self.delay -= 1;
            return Err(nb::Error::WouldBlock);
        }
        match self.rx.pop_front() {
            Some(byte) => {
                self.idle_polls = 0;
                Ok(byte)
            }
            None => {
                self.idle_polls += 1;
                if self.idle_polls > STARVATION_LIMIT {
                    panic!("bootloader kept waiting on a silent host");
                }
                Err(nb::Error::WouldBlock)
            }
        }
    }
}

impl serial::Write<u8> for SimSerial {
    type Error = HostGone;

    fn write(&mut self, byte: u8) -> nb::Result<(), HostGone> {
        assert!(self.enabled, "write to a link that was never enabled");
        self.tx.push(byte);
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), HostGone> {
        Ok(())
    }
}

impl HostLink for SimSerial {
    fn enable(&mut self) {
        assert!(!self.enabled, "link enabled twice");
        self.enabled = true;
    }
}

/// Split the bootloader's output into `(sequence, payload)` responses.
pub fn decode_responses(wire: &[u8]) -> Vec<(u8, Vec<u8>)> {
    let mut parser = FrameParser::new();
    let mut message = Message::new();
    let mut responses = Vec::new();
    for &byte in wire {
        if let Ok(Some(header)) = parser.feed(byte, &mut message) {
            responses.push((header.sequence, message.request().to_vec()));
        }
    }
    responses
}

pub struct SimFlash {
    pub memory: Vec<u8>,
    page_size: u32,
    page_buffer: Vec<u16>,
    pub erased_pages: Vec<u32>,
    pub written_pages: Vec<u32>,
    rww_busy: bool,
    pub fuses: [u8; 4],
}

impl SimFlash {
    /// Blank part: every byte erased.
    pub fn new(device: &DeviceProfile) -> Self {
        Self {
            memory: std::vec![0xFF; device.flash_size() as usize],
            page_size: device.page_size,
            page_buffer: std::vec![ERASED_WORD; (device.page_size / 2) as usize],
            erased_pages: Vec::new(),
            written_pages: Vec::new(),
            rww_busy: false,
            fuses: [0xE1, 0x99, 0xFF, 0x3F],
        }
    }

    /// Part with `bytes` already programmed at `address`.
    pub fn with_contents(device: &DeviceProfile, address: u32, bytes: &[u8]) -> Self {
        let mut flash = Self::new(device);
        let start = address as usize;
        flash.memory[start..start + bytes.len()].copy_from_slice(bytes);
        flash
    }

    pub fn bytes(&self, address: u32, len: usize) -> &[u8] {
        &self.memory[address as usize..address as usize + len]
    }

    pub fn rww_busy(&self) -> bool {
        self.rww_busy
    }

    fn page_base(&self, address: u32) -> usize {
        (address & !(self.page_size - 1)) as usize
    }
}

impl FlashMemory for SimFlash {
    fn erase_page(&mut self, address: u32) {
        let base = self.page_base(address);
        let end = base + self.page_size as usize;
        self.memory[base..end].fill(0xFF);
        self.erased_pages.push(base as u32);
        self.rww_busy = true;
    }

    fn fill_page_buffer(&mut self, address: u32, word: u16) {
        let index = ((address % self.page_size) / 2) as usize;
        self.page_buffer[index] = word;
    }

    fn write_page(&mut self, address: u32) {
        let base = self.page_base(address);
        for (index, word) in self.page_buffer.iter_mut().enumerate() {
            let [low, high] = word.to_le_bytes();
            // Programming can only clear bits
            self.memory[base + 2 * index] &= low;
            self.memory[base + 2 * index + 1] &= high;
            *word = ERASED_WORD;
        }
        self.written_pages.push(base as u32);
        self.rww_busy = true;
    }

    fn enable_rww_section(&mut self) {
        self.rww_busy = false;
    }

    fn read_word(&mut self, address: u32) -> u16 {
        if self.rww_busy {
            return ERASED_WORD;
        }
        let at = address as usize;
        u16::from_le_bytes([self.memory[at], self.memory[at + 1]])
    }

    fn read_fuse(&mut self, fuse: Fuse) -> u8 {
        match fuse {
            Fuse::Low => self.fuses[0],
            Fuse::High => self.fuses[1],
            Fuse::Extended => self.fuses[2],
            Fuse::Lock => self.fuses[3],
        }
    }
}

pub struct SimSystem {
    cause: ResetCause,
    pub watchdog_disabled: bool,
    pub started: Option<ResetCause>,
}

impl SimSystem {
    pub fn new(cause: u8) -> Self {
        Self {
            cause: ResetCause::from_bits(cause),
            watchdog_disabled: false,
            started: None,
        }
    }
}

impl SystemControl for SimSystem {
    fn reset_cause(&mut self) -> ResetCause {
        core::mem::take(&mut self.cause)
    }

    fn disable_watchdog(&mut self) {
        self.watchdog_disabled = true;
    }

    fn start_application(&mut self, cause: ResetCause) {
        assert!(self.started.is_none(), "application started twice");
        self.started = Some(cause);
    }
}

/// Trace sink collecting everything the bootloader logs.
#[derive(Default)]
pub struct CaptureLog(pub String);

impl ufmt::uWrite for CaptureLog {
    type Error = Infallible;

    fn write_str(&mut self, s: &str) -> Result<(), Infallible> {
        self.0.push_str(s);
        Ok(())
    }
}
