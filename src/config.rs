//! Configuration constants for the STK500v2 bootloader

include!(concat!(env!("OUT_DIR"), "/board.rs"));

/// Polls of the receive flag before giving up on the host (about 1 second at 16MHz)
pub const BOOT_TIMEOUT: u32 = 500_000;

/// Shared request/response buffer size in bytes
pub const MESSAGE_CAPACITY: usize = 285;

/// Values reported through GET_PARAMETER, must match what AVR Studio expects
pub const BUILD_NUMBER_LOW: u8 = 0;
pub const BUILD_NUMBER_HIGH: u8 = 0;
pub const HW_VERSION: u8 = 0x0F;
pub const SW_MAJOR: u8 = 2;
pub const SW_MINOR: u8 = 0x0A;

/// Identity string returned by SIGN_ON
pub const SIGN_ON_ID: &[u8; 8] = b"AVRISP_2";

/// UBRR value for double speed (U2X) mode, rounded to nearest
pub const fn ubrr_double_speed(f_cpu: u32, baud: u32) -> u16 {
    ((f_cpu + 4 * baud) / (8 * baud) - 1) as u16
}

pub const UART_UBRR: u16 = ubrr_double_speed(CPU_FREQ_HZ, UART_BAUD);

/// Flash geometry and identity of a supported part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceProfile {
    pub signature: [u8; 3],
    /// Last byte address of program memory
    pub flash_end: u32,
    /// SPM page size in bytes
    pub page_size: u32,
    /// Boot section size in words
    pub boot_size: u32,
    /// Part has RAMPZ and takes all four LOAD_ADDRESS bytes
    pub extended_addressing: bool,
}

impl DeviceProfile {
    pub const fn flash_size(&self) -> u32 {
        self.flash_end + 1
    }

    /// First byte address the bootloader refuses to program.
    pub const fn application_end(&self) -> u32 {
        self.flash_end - 2 * self.boot_size + 1
    }

    /// Base address of the page holding `address`
    pub const fn page_base(&self, address: u32) -> u32 {
        address & !(self.page_size - 1)
    }
}

pub const ATMEGA128: DeviceProfile = DeviceProfile {
    signature: [0x1E, 0x97, 0x02],
    flash_end: 0x1FFFF,
    page_size: 256,
    boot_size: 2048,
    extended_addressing: true,
};

/// The part this image is linked for
pub const TARGET_DEVICE: DeviceProfile = ATMEGA128;

/// Runtime knobs of the boot decision engine
#[derive(Debug, Clone, Copy)]
pub struct BootConfig {
    /// Receive polls allowed before booting the application
    pub entry_window: u32,
    pub device: DeviceProfile,
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            entry_window: BOOT_TIMEOUT,
            device: TARGET_DEVICE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn application_end_leaves_room_for_bootloader() {
        assert_eq!(ATMEGA128.application_end(), 0x1F000);
        let large = DeviceProfile {
            flash_end: 0x3FFFF,
            ..ATMEGA128
        };
        assert_eq!(large.application_end(), 0x3F000);
        assert_eq!(ATMEGA128.flash_size(), 128 * 1024);
    }

    #[test]
    fn boot_size_counts_words() {
        let boot_bytes = ATMEGA128.flash_size() - ATMEGA128.application_end();
        assert_eq!(boot_bytes, 2 * ATMEGA128.boot_size);
        assert_eq!(boot_bytes, 4096);
    }

    #[test]
    fn default_config_targets_linked_part() {
        let config = BootConfig::default();
        assert_eq!(config.device, ATMEGA128);
        assert_eq!(config.device.signature, [0x1E, 0x97, 0x02]);
        assert_eq!(config.entry_window, BOOT_TIMEOUT);
    }

    #[test]
    fn page_base_masks_offset() {
        assert_eq!(ATMEGA128.page_base(0x0000), 0x0000);
        assert_eq!(ATMEGA128.page_base(0x01FE), 0x0100);
        assert_eq!(ATMEGA128.page_base(0x1EFFF), 0x1EF00);
    }

    #[test]
    fn ubrr_rounds_to_nearest() {
        assert_eq!(ubrr_double_speed(16_000_000, 115_200), 16);
        assert_eq!(ubrr_double_speed(16_000_000, 57_600), 34);
        assert_eq!(ubrr_double_speed(8_000_000, 9_600), 103);
    }
}
