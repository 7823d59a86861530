pub mod flash;
#[cfg(target_arch = "avr")]
pub mod serial_console;

pub use flash::{FlashError, FlashProgrammer};
#[cfg(target_arch = "avr")]
pub use serial_console::SerialConsole;
