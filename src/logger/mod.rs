//! Bootloader trace output.
//!
//! Traces go to any `ufmt::uWrite` sink. USART0 carries the protocol, so on
//! hardware the sink is either the USART1 console (`debug` feature) or
//! [`NullConsole`].

use core::convert::Infallible;

use ufmt::uWrite;

/// Write one trace line, ignoring sink errors.
#[macro_export]
macro_rules! trace {
    ($log:expr, $($arg:tt)*) => {{
        let _ = ufmt::uwriteln!($log, $($arg)*);
    }};
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullConsole;

impl uWrite for NullConsole {
    type Error = Infallible;

    #[inline]
    fn write_str(&mut self, _: &str) -> Result<(), Infallible> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::protocol::ProtocolError;
    use crate::testing::CaptureLog;

    #[test]
    fn trace_formats_numbers_and_errors() {
        let mut log = CaptureLog::default();
        crate::trace!(log, "frame {} dropped: {:?}", 7u8, ProtocolError::BadToken);
        assert_eq!(log.0, "frame 7 dropped: BadToken\n");
    }

    #[test]
    fn null_console_swallows_output() {
        let mut log = super::NullConsole;
        crate::trace!(log, "address {}", 0x1F000u32);
    }
}
