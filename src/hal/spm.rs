//! Self-programming (SPM/ELPM) on ATmega128.
//!
//! SPMCSR sits in extended I/O space, so it is written with `sts` inside the
//! same asm block as the `spm` that must follow within four cycles.

use core::arch::asm;
use core::ptr::read_volatile;

use super::{FlashMemory, Fuse};

const SPMCSR: *const u8 = 0x68 as *const u8;

// SPMCSR
const SPMEN: u8 = 1 << 0;
const PGERS: u8 = 1 << 1;
const PGWRT: u8 = 1 << 2;
const BLBSET: u8 = 1 << 3;
const RWWSRE: u8 = 1 << 4;

pub struct SelfProgramming {
    _private: (),
}

impl SelfProgramming {
    pub fn new() -> Self {
        Self { _private: () }
    }

    fn wait_ready(&self) {
        while unsafe { read_volatile(SPMCSR) } & SPMEN != 0 {}
    }

    fn spm(&mut self, address: u32, command: u8) {
        self.wait_ready();
        unsafe {
            asm!(
                "out 0x3B, {rampz}",
                "sts 0x0068, {cmd}",
                "spm",
                rampz = in(reg) (address >> 16) as u8,
                cmd = in(reg) command,
                in("Z") address as u16,
            );
        }
    }
}

impl Default for SelfProgramming {
    fn default() -> Self {
        Self::new()
    }
}

impl FlashMemory for SelfProgramming {
    fn erase_page(&mut self, address: u32) {
        self.spm(address, PGERS | SPMEN);
        self.wait_ready();
    }

    fn fill_page_buffer(&mut self, address: u32, word: u16) {
        self.wait_ready();
        // r0:r1 carry the word; r1 is the zero register and must be restored
        unsafe {
            asm!(
                "mov r0, {word:l}",
                "mov r1, {word:h}",
                "out 0x3B, {rampz}",
                "sts 0x0068, {cmd}",
                "spm",
                "clr r1",
                word = in(reg_pair) word,
                rampz = in(reg) (address >> 16) as u8,
                cmd = in(reg) SPMEN,
                in("Z") address as u16,
            );
        }
    }

    fn write_page(&mut self, address: u32) {
        self.spm(address, PGWRT | SPMEN);
        self.wait_ready();
    }

    fn enable_rww_section(&mut self) {
        self.spm(0, RWWSRE | SPMEN);
        self.wait_ready();
    }

    fn read_word(&mut self, address: u32) -> u16 {
        let low: u8;
        let high: u8;
        unsafe {
            asm!(
                "out 0x3B, {rampz}",
                "elpm {low}, Z+",
                "elpm {high}, Z",
                rampz = in(reg) (address >> 16) as u8,
                low = out(reg) low,
                high = out(reg) high,
                inout("Z") address as u16 => _,
            );
        }
        u16::from_le_bytes([low, high])
    }

    fn read_fuse(&mut self, fuse: Fuse) -> u8 {
        let pointer: u16 = match fuse {
            Fuse::Low => 0x0000,
            Fuse::Lock => 0x0001,
            Fuse::Extended => 0x0002,
            Fuse::High => 0x0003,
        };
        let value: u8;
        self.wait_ready();
        unsafe {
            asm!(
                "sts 0x0068, {cmd}",
                "lpm {value}, Z",
                cmd = in(reg) BLBSET | SPMEN,
                value = out(reg) value,
                in("Z") pointer,
            );
        }
        value
    }
}
