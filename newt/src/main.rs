// Copyright (C) 2026 newt contributors
//
// MIT License

//! newt - default firmware
//!
//! A serial-console SWD debugger for ARM Cortex-M targets, running on an
//! ESP32-C3.  Wire SWDIO to GPIO0 and SWCLK to GPIO1 (plus common ground),
//! attach a serial terminal, press the button, and type `help`.
//!
//! The SWD engine itself lives in `newt-swd` and the command surface in
//! `newt-console`; this binary only provides the platform pieces: pins,
//! heap, logging, and the UART line reader.

#![no_std]
#![no_main]

extern crate alloc;

use core::fmt::Write;
use esp_alloc as _;
use esp_backtrace as _;
use esp_hal::Blocking;
use esp_hal::clock::CpuClock;
use esp_hal::uart::{Config as UartConfig, Uart};
use esp_println::Printer;
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

use newt_console::Console;

mod device;

use device::{Device, EspSwdBus};

// Creates the app descriptor required by the esp-idf bootloader
esp_bootloader_esp_idf::esp_app_desc!();

// Heap for the alloc-using library crates
const HEAP_SIZE: usize = 64 * 1024;

// The CPU clock is pinned so the cycle-counted microsecond delay in
// device.rs stays honest
pub const CPU_CLOCK_MHZ: u32 = 160;

// Longest accepted command line
const LINE_BUF_LEN: usize = 80;

#[esp_hal::main]
fn main() -> ! {
    esp_alloc::heap_allocator!(size: HEAP_SIZE);
    esp_println::logger::init_logger_from_env();

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::_160MHz);
    let peripherals = esp_hal::init(config);

    info!("newt v{} starting", env!("CARGO_PKG_VERSION"));

    let mut device = Device::new(peripherals.GPIO8, peripherals.GPIO9);
    let swd_bus = EspSwdBus::new(peripherals.GPIO0, peripherals.GPIO1);
    let mut console = Console::from_bus(swd_bus);

    let mut uart = Uart::new(peripherals.UART0, UartConfig::default())
        .expect("Failed to initialize UART0")
        .with_rx(peripherals.GPIO20)
        .with_tx(peripherals.GPIO21);

    let mut out = Printer;
    let _ = writeln!(out, "Press the button to start entering commands...");
    device.wait_for_start();

    let _ = writeln!(out, "Enter help or h to get available commands");

    let mut buf = [0u8; LINE_BUF_LEN];
    loop {
        let len = get_line(&mut uart, &mut device, &mut buf);
        let Ok(line) = core::str::from_utf8(&buf[..len]) else {
            warn!("Ignoring non-UTF8 input");
            continue;
        };

        let _ = console.handle_line(line, &mut out);
    }
}

/// Read one line from the UART, echoing input and handling backspace.
/// The LED is lit while waiting for the line.
fn get_line(uart: &mut Uart<'_, Blocking>, device: &mut Device<'_>, buf: &mut [u8]) -> usize {
    use embedded_io::Read;

    let mut out = Printer;
    device.led_on();
    let _ = out.write_str("> ");

    let mut len = 0;
    loop {
        let mut byte = [0u8; 1];
        match uart.read(&mut byte) {
            Ok(0) | Err(_) => continue,
            Ok(_) => (),
        }

        match byte[0] {
            b'\r' | b'\n' => break,
            // Backspace / delete
            0x08 | 0x7F => {
                if len > 0 {
                    len -= 1;
                    let _ = out.write_str("\x08 \x08");
                }
            }
            c if len < buf.len() && !c.is_ascii_control() => {
                buf[len] = c;
                len += 1;
                let _ = out.write_char(c as char);
            }
            _ => (),
        }
    }

    let _ = out.write_str("\r\n");
    device.led_off();
    len
}
