use core::arch::asm;

use super::watchdog::Watchdog;
use super::{ResetCause, SystemControl};

pub struct AvrSystem {
    watchdog: Watchdog,
}

impl AvrSystem {
    pub fn new() -> Self {
        Self {
            watchdog: Watchdog::new(),
        }
    }
}

impl Default for AvrSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemControl for AvrSystem {
    fn reset_cause(&mut self) -> ResetCause {
        self.watchdog.take_reset_cause()
    }

    fn disable_watchdog(&mut self) {
        self.watchdog.disable();
    }

    /// The application finds the original reset flags in r2 and USART0 back
    /// at normal speed.
    fn start_application(&mut self, cause: ResetCause) {
        unsafe {
            asm!(
                "cli",
                "cbi 0x0B, 1",
                "out 0x3B, r1",
                "mov r2, {cause}",
                "jmp 0",
                cause = in(reg) cause.bits(),
                options(noreturn)
            );
        }
    }
}
