//! Transport layer: blocking byte I/O over an `embedded-hal` serial port.
//!
//! No buffering beyond a single byte of look-ahead, which is what the entry
//! window needs to notice the host without losing its first byte.

use embedded_hal::serial;

use super::{frame, ProtocolError, Result};
use crate::hal::HostLink;

pub struct Transport<S> {
    serial: S,
    pending: Option<u8>,
}

impl<S> Transport<S>
where
    S: serial::Read<u8> + serial::Write<u8>,
{
    pub fn new(serial: S) -> Self {
        Self {
            serial,
            pending: None,
        }
    }

    /// Check once for incoming data without blocking. A received byte is
    /// kept for the next [`read_byte`](Self::read_byte); a line error still
    /// counts as activity.
    pub fn poll(&mut self) -> bool {
        if self.pending.is_some() {
            return true;
        }
        match self.serial.read() {
            Ok(byte) => {
                self.pending = Some(byte);
                true
            }
            Err(nb::Error::WouldBlock) => false,
            Err(nb::Error::Other(_)) => true,
        }
    }

    /// Poll up to `polls` times; the only bounded wait in the bootloader.
    pub fn wait_for_activity(&mut self, polls: u32) -> bool {
        (0..polls).any(|_| self.poll())
    }

    /// Spin until a byte arrives.
    pub fn read_byte(&mut self) -> Result<u8> {
        if let Some(byte) = self.pending.take() {
            return Ok(byte);
        }
        nb::block!(self.serial.read()).map_err(|_| ProtocolError::TransportError)
    }

    /// Spin until the byte has been shifted out completely.
    pub fn write_byte(&mut self, byte: u8) -> Result<()> {
        nb::block!(self.serial.write(byte)).map_err(|_| ProtocolError::TransportError)?;
        nb::block!(self.serial.flush()).map_err(|_| ProtocolError::TransportError)
    }

    pub fn send_frame(&mut self, sequence: u8, payload: &[u8]) -> Result<()> {
        frame::encode(sequence, payload, |byte| self.write_byte(byte))
    }

    pub fn release(self) -> S {
        self.serial
    }
}

impl<S: HostLink> Transport<S> {
    /// Bring the link up. Called once, only when the host is to be waited for.
    pub fn open(&mut self) {
        self.serial.enable();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::serial::{Mock, Transaction};
    use embedded_hal_mock::MockError;
    use std::io::ErrorKind;
    use std::vec::Vec;

    fn write_with_flush(bytes: &[u8]) -> Vec<Transaction<u8>> {
        bytes
            .iter()
            .flat_map(|&b| [Transaction::write(b), Transaction::flush()])
            .collect()
    }

    #[test]
    fn poll_keeps_first_byte_for_reader() {
        let expectations = [
            Transaction::read_error(nb::Error::WouldBlock),
            Transaction::read_error(nb::Error::WouldBlock),
            Transaction::read(0x1B),
            Transaction::read(0x01),
        ];
        let mut serial = Mock::new(&expectations);
        let mut transport = Transport::new(serial.clone());

        assert!(transport.wait_for_activity(5));
        assert_eq!(transport.read_byte(), Ok(0x1B));
        assert_eq!(transport.read_byte(), Ok(0x01));
        serial.done();
    }

    #[test]
    fn entry_window_expires_without_data() {
        let expectations = [
            Transaction::read_error(nb::Error::WouldBlock),
            Transaction::read_error(nb::Error::WouldBlock),
            Transaction::read_error(nb::Error::WouldBlock),
        ];
        let mut serial = Mock::new(&expectations);
        let mut transport = Transport::new(serial.clone());

        assert!(!transport.wait_for_activity(3));
        serial.done();
    }

    #[test]
    fn line_error_counts_as_activity_and_surfaces_on_read() {
        let expectations = [
            Transaction::read_error(nb::Error::Other(MockError::Io(ErrorKind::InvalidData))),
            Transaction::read_error(nb::Error::Other(MockError::Io(ErrorKind::InvalidData))),
        ];
        let mut serial = Mock::new(&expectations);
        let mut transport = Transport::new(serial.clone());

        assert!(transport.poll());
        assert_eq!(transport.read_byte(), Err(ProtocolError::TransportError));
        serial.done();
    }

    #[test]
    fn read_byte_spins_through_would_block() {
        let expectations = [
            Transaction::read_error(nb::Error::WouldBlock),
            Transaction::read(0x0E),
        ];
        let mut serial = Mock::new(&expectations);
        let mut transport = Transport::new(serial.clone());

        assert_eq!(transport.read_byte(), Ok(0x0E));
        serial.done();
    }

    #[test]
    fn send_frame_waits_for_each_byte() {
        // GET_PARAMETER(SW_MAJOR) answer: [0x03, OK, 0x02]
        let wire = [0x1B, 0x05, 0x00, 0x03, 0x0E, 0x03, 0x00, 0x02, 0x12];
        let expectations = write_with_flush(&wire);
        let mut serial = Mock::new(&expectations);
        let mut transport = Transport::new(serial.clone());

        assert_eq!(transport.send_frame(0x05, &[0x03, 0x00, 0x02]), Ok(()));
        serial.done();
    }
}
