use avr_device::atmega128a::{CPU, WDT};

use super::ResetCause;

// WDTCR
const WDCE: u8 = 1 << 4;
const WDE: u8 = 1 << 3;

pub struct Watchdog {
    _private: (),
}

impl Watchdog {
    #[inline]
    pub fn new() -> Self {
        Self { _private: () }
    }

    #[inline]
    pub fn feed(&mut self) {
        avr_device::asm::wdr();
    }

    /// Timed sequence, must complete within four cycles of setting WDCE.
    #[inline]
    pub fn disable(&mut self) {
        self.feed();
        unsafe {
            let p = WDT::ptr();
            (*p).wdtcr.modify(|r, w| w.bits(r.bits() | WDCE | WDE));
            (*p).wdtcr.write(|w| w.bits(0x00));
        }
    }

    /// Latched reset flags. They are cleared so a watchdog left running by
    /// the application cannot trap us in a reset loop.
    pub fn take_reset_cause(&mut self) -> ResetCause {
        unsafe {
            let p = CPU::ptr();
            let bits = (*p).mcucsr.read().bits();
            (*p).mcucsr.write(|w| w.bits(0x00));
            ResetCause::from_bits(bits)
        }
    }
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new()
    }
}
