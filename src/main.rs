#![cfg_attr(target_arch = "avr", no_std)]
#![cfg_attr(target_arch = "avr", no_main)]

#[cfg(target_arch = "avr")]
mod firmware {
    use panic_halt as _;

    use avr_device::atmega128a::Peripherals;
    use stk500v2_bootloader::hal::{AvrSystem, SelfProgramming, Usart0};
    use stk500v2_bootloader::{BootConfig, Bootloader};

    #[cfg(feature = "debug")]
    use stk500v2_bootloader::drivers::SerialConsole;
    #[cfg(not(feature = "debug"))]
    use stk500v2_bootloader::logger::NullConsole;

    #[avr_device::entry]
    fn main() -> ! {
        // First and only take after reset
        let dp = match Peripherals::take() {
            Some(dp) => dp,
            None => halt(),
        };

        #[cfg(feature = "debug")]
        let console = SerialConsole::new(dp.USART1);
        #[cfg(not(feature = "debug"))]
        let console = NullConsole;

        let mut bootloader = Bootloader::new(
            Usart0::new(dp.USART0),
            SelfProgramming::new(),
            AvrSystem::new(),
            console,
            BootConfig::default(),
        );

        // Only an erased reset vector returns here
        bootloader.run();
        halt()
    }

    fn halt() -> ! {
        #[allow(clippy::empty_loop)]
        loop {}
    }
}

#[cfg(not(target_arch = "avr"))]
fn main() {}
