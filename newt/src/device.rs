// Copyright (C) 2026 newt contributors
//
// MIT License

//! newt - board bring-up: the SWD pins, the button and the LED.

use esp_hal::gpio::{
    DriveMode, DriveStrength, Flex, Input, InputConfig, InputPin, Level, Output, OutputConfig,
    OutputPin, Pull,
};
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

use newt_swd::bus::{BusDir, SwdBus};

// riscv::asm::delay counts cycles; the CPU clock is pinned to max in main
const CYCLES_PER_US: u32 = crate::CPU_CLOCK_MHZ;

/// The two SWD pins, driven as plain GPIOs.
///
/// Implements [`SwdBus`] for the protocol engine.  SWCLK is a push-pull
/// output; SWDIO is a `Flex` pin flipped between output and input at the
/// protocol's turnaround points.
pub struct EspSwdBus<'a> {
    swclk: Output<'a>,
    swdio: Flex<'a>,
}

impl<'a> EspSwdBus<'a> {
    pub fn new(swdio_pin: impl InputPin + OutputPin + 'a, swclk_pin: impl OutputPin + 'a) -> Self {
        // Start SWDIO as input.  We do not set a pull - it is the target's
        // responsibility to pull SWDIO high, and it only does so once the
        // JTAG-to-SWD sequence has been sent.
        let mut swdio = Flex::new(swdio_pin);
        let input_config = InputConfig::default().with_pull(Pull::None);
        swdio.apply_input_config(&input_config);
        swdio.set_input_enable(true);

        // SWCLK idles high
        let output_config = OutputConfig::default()
            .with_drive_strength(DriveStrength::_20mA)
            .with_drive_mode(DriveMode::PushPull);
        let swclk = Output::new(swclk_pin, Level::High, output_config);

        debug!("SWD pins created, SWDIO input without pull, SWCLK output high");

        Self { swclk, swdio }
    }
}

impl SwdBus for EspSwdBus<'_> {
    #[inline]
    fn set_swclk(&mut self, high: bool) {
        if high {
            self.swclk.set_high();
        } else {
            self.swclk.set_low();
        }
    }

    #[inline]
    fn set_swdio(&mut self, high: bool) {
        if high {
            self.swdio.set_high();
        } else {
            self.swdio.set_low();
        }
    }

    #[inline]
    fn set_swdio_dir(&mut self, dir: BusDir) {
        match dir {
            BusDir::Host => {
                self.swdio.set_input_enable(false);
                self.swdio.set_output_enable(true);
            }
            BusDir::Target => {
                self.swdio.set_output_enable(false);
                self.swdio.set_input_enable(true);
            }
        }
    }

    #[inline]
    fn swdio_is_high(&mut self) -> bool {
        self.swdio.is_high()
    }

    #[inline]
    fn delay_us(&mut self, us: u32) {
        riscv::asm::delay(us.saturating_mul(CYCLES_PER_US));
    }
}

/// The board's button (start trigger) and LED (activity indicator).
pub struct Device<'a> {
    led: Output<'a>,
    button: Input<'a>,
}

impl<'a> Device<'a> {
    pub fn new(led_pin: impl OutputPin + 'a, button_pin: impl InputPin + 'a) -> Self {
        let led = Output::new(led_pin, Level::Low, OutputConfig::default());
        let button = Input::new(button_pin, InputConfig::default().with_pull(Pull::Up));

        Self { led, button }
    }

    /// Blocks until the button is pressed.  The LED is lit while waiting.
    pub fn wait_for_start(&mut self) {
        self.led.set_high();
        while self.button.is_high() {}
        self.led.set_low();
    }

    pub fn led_on(&mut self) {
        self.led.set_high();
    }

    pub fn led_off(&mut self) {
        self.led.set_low();
    }
}
