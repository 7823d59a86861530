//! Narrow hardware interface the bootloader core is written against.
//!
//! Every call blocks until the hardware reports completion. The AVR
//! implementations live in the submodules and are only built for AVR targets;
//! host builds run the core against simulated backends.

#[cfg(target_arch = "avr")]
pub mod cpu;
#[cfg(target_arch = "avr")]
pub mod spm;
#[cfg(target_arch = "avr")]
pub mod uart;
#[cfg(target_arch = "avr")]
pub mod watchdog;

#[cfg(target_arch = "avr")]
pub use cpu::AvrSystem;
#[cfg(target_arch = "avr")]
pub use spm::SelfProgramming;
#[cfg(target_arch = "avr")]
pub use uart::Usart0;

use embedded_hal::serial;

/// Word stored in erased program memory
pub const ERASED_WORD: u16 = 0xFFFF;

/// Fuse and lock bytes readable from the device configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fuse {
    Low,
    High,
    Extended,
    Lock,
}

/// Reset flags as latched by the MCU status register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResetCause(u8);

impl ResetCause {
    pub const POWER_ON: u8 = 1 << 0;
    pub const EXTERNAL: u8 = 1 << 1;
    pub const BROWN_OUT: u8 = 1 << 2;
    pub const WATCHDOG: u8 = 1 << 3;
    pub const JTAG: u8 = 1 << 4;

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// The application restarted itself through the watchdog
    pub const fn is_watchdog(self) -> bool {
        self.0 & Self::WATCHDOG != 0
    }
}

/// Serial port to the host. Nothing is configured until [`enable`] so a
/// watchdog restart hands the application the port in its reset state.
///
/// [`enable`]: HostLink::enable
pub trait HostLink: serial::Read<u8> + serial::Write<u8> {
    fn enable(&mut self);
}

/// Self-programming access to program memory. Addresses are byte addresses.
pub trait FlashMemory {
    /// Erase the page containing `address`.
    fn erase_page(&mut self, address: u32);

    /// Load one word into the temporary page buffer at the offset of `address`.
    fn fill_page_buffer(&mut self, address: u32, word: u16);

    /// Commit the page buffer to the page containing `address`.
    fn write_page(&mut self, address: u32);

    /// Make the read-while-write section readable again after erase/write.
    fn enable_rww_section(&mut self);

    fn read_word(&mut self, address: u32) -> u16;

    fn read_fuse(&mut self, fuse: Fuse) -> u8;
}

/// Reset, watchdog and control transfer.
pub trait SystemControl {
    /// Read and clear the reset flags.
    fn reset_cause(&mut self) -> ResetCause;

    fn disable_watchdog(&mut self);

    /// Jump to address 0, handing `cause` to the application. Does not return
    /// on hardware.
    fn start_application(&mut self, cause: ResetCause);
}
