//! Polled USART0 driver. The bootloader runs with interrupts unused, so
//! every access spins on the status flags.

use avr_device::atmega128a::USART0;
use embedded_hal::serial;

use super::HostLink;
use crate::config::UART_UBRR;

// UCSR0A
const RXC0: u8 = 1 << 7;
const TXC0: u8 = 1 << 6;
const UDRE0: u8 = 1 << 5;
const FE0: u8 = 1 << 4;
const DOR0: u8 = 1 << 3;
const U2X0: u8 = 1 << 1;

// UCSR0B
const RXEN0: u8 = 1 << 4;
const TXEN0: u8 = 1 << 3;

// UCSR0C: asynchronous, 8N1
const UCSZ_8BIT: u8 = 0x06;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UartError {
    Framing,
    Overrun,
}

pub struct Usart0 {
    usart: USART0,
}

impl Usart0 {
    /// Takes the port without touching its registers.
    pub fn new(usart: USART0) -> Self {
        Self { usart }
    }
}

impl HostLink for Usart0 {
    /// Enable receiver and transmitter in double speed mode without interrupts.
    fn enable(&mut self) {
        let usart = &self.usart;
        usart.ucsr0a.write(|w| unsafe { w.bits(U2X0) });
        usart.ubrr0h.write(|w| unsafe { w.bits((UART_UBRR >> 8) as u8) });
        usart.ubrr0l.write(|w| unsafe { w.bits(UART_UBRR as u8) });
        usart.ucsr0c.write(|w| unsafe { w.bits(UCSZ_8BIT) });
        usart.ucsr0b.write(|w| unsafe { w.bits(RXEN0 | TXEN0) });
    }
}

impl serial::Read<u8> for Usart0 {
    type Error = UartError;

    fn read(&mut self) -> nb::Result<u8, UartError> {
        let status = self.usart.ucsr0a.read().bits();
        if status & RXC0 == 0 {
            return Err(nb::Error::WouldBlock);
        }
        // UDR must be read to clear the error flags
        let byte = self.usart.udr0.read().bits();
        if status & FE0 != 0 {
            Err(nb::Error::Other(UartError::Framing))
        } else if status & DOR0 != 0 {
            Err(nb::Error::Other(UartError::Overrun))
        } else {
            Ok(byte)
        }
    }
}

impl serial::Write<u8> for Usart0 {
    type Error = UartError;

    fn write(&mut self, byte: u8) -> nb::Result<(), UartError> {
        if self.usart.ucsr0a.read().bits() & UDRE0 == 0 {
            return Err(nb::Error::WouldBlock);
        }
        self.usart.udr0.write(|w| unsafe { w.bits(byte) });
        Ok(())
    }

    /// Completes once the last written byte has left the shift register.
    fn flush(&mut self) -> nb::Result<(), UartError> {
        let status = self.usart.ucsr0a.read().bits();
        if status & TXC0 == 0 {
            return Err(nb::Error::WouldBlock);
        }
        // TXC is cleared by writing a one; keep U2X set
        self.usart
            .ucsr0a
            .write(|w| unsafe { w.bits((status & U2X0) | TXC0) });
        Ok(())
    }
}
