//! Debug console on USART1, write-only and polled.

use avr_device::atmega128a::USART1;
use core::convert::Infallible;
use ufmt::uWrite;

use crate::config::UART_UBRR;

// UCSR1A
const UDRE1: u8 = 1 << 5;
const U2X1: u8 = 1 << 1;
// UCSR1B
const TXEN1: u8 = 1 << 3;
// UCSR1C: 8N1
const UCSZ_8BIT: u8 = 0x06;

pub struct SerialConsole {
    usart: USART1,
}

impl SerialConsole {
    pub fn new(usart: USART1) -> Self {
        usart.ucsr1a.write(|w| unsafe { w.bits(U2X1) });
        usart.ubrr1h.write(|w| unsafe { w.bits((UART_UBRR >> 8) as u8) });
        usart.ubrr1l.write(|w| unsafe { w.bits(UART_UBRR as u8) });
        usart.ucsr1c.write(|w| unsafe { w.bits(UCSZ_8BIT) });
        usart.ucsr1b.write(|w| unsafe { w.bits(TXEN1) });
        Self { usart }
    }

    pub fn write_byte(&mut self, byte: u8) {
        while self.usart.ucsr1a.read().bits() & UDRE1 == 0 {}
        self.usart.udr1.write(|w| unsafe { w.bits(byte) });
    }
}

impl uWrite for SerialConsole {
    type Error = Infallible;

    fn write_str(&mut self, s: &str) -> Result<(), Infallible> {
        for byte in s.bytes() {
            if byte == b'\n' {
                self.write_byte(b'\r');
            }
            self.write_byte(byte);
        }
        Ok(())
    }
}
