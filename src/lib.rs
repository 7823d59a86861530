//! STK500v2 serial bootloader for AVR parts with a boot section.
//!
//! The core is written against the traits in [`hal`] and `embedded-hal`
//! serial, so everything except the register-level backends also builds and
//! tests on the host.

#![cfg_attr(not(test), no_std)]
#![cfg_attr(target_arch = "avr", feature(asm_experimental_arch))]

pub mod logger;

pub mod bootloader;
pub mod config;
pub mod drivers;
pub mod hal;
pub mod protocol;

#[cfg(test)]
mod testing;

pub use bootloader::{BootOutcome, BootPath, Bootloader};
pub use config::BootConfig;
