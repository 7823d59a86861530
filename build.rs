use std::env;
use std::fs;
use std::path::PathBuf;

const DEFAULT_F_CPU: u32 = 16_000_000;
const DEFAULT_BAUDRATE: u32 = 115_200;

// Byte address of the boot section on ATmega128 with BOOTSZ = 2048 words.
const BOOT_SECTION_START: u32 = 0x1F000;

fn env_u32(name: &str, default: u32) -> u32 {
    println!("cargo:rerun-if-env-changed={}", name);
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("{} must be an unsigned integer, got {:?}", name, value)),
        Err(_) => default,
    }
}

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let f_cpu = env_u32("BOOT_F_CPU", DEFAULT_F_CPU);
    let baudrate = env_u32("BOOT_BAUDRATE", DEFAULT_BAUDRATE);

    let board = format!(
        "/// CPU frequency in Hz\n\
         pub const CPU_FREQ_HZ: u32 = {};\n\
         /// Host link baud rate\n\
         pub const UART_BAUD: u32 = {};\n",
        f_cpu, baudrate
    );
    fs::write(out_dir.join("board.rs"), board).unwrap();
    println!("cargo:rerun-if-changed=build.rs");

    // Host builds only run the protocol tests
    let target = env::var("TARGET").unwrap();
    if target.contains("avr") {
        println!("cargo:rustc-link-arg=-mmcu=atmega128");
        println!(
            "cargo:rustc-link-arg=-Wl,--section-start=.text=0x{:X}",
            BOOT_SECTION_START
        );
        println!(
            "cargo:warning=Building bootloader for ATmega128 at {}Hz, {} baud",
            f_cpu, baudrate
        );
    }
}
