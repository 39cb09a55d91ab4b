// Copyright (C) 2026 newt contributors
//
// MIT License

//! The platform contract for the SWD engine
//!
//! Everything above this trait is hardware-agnostic.  The firmware crate
//! implements [`SwdBus`] over real GPIO; the test suite implements it over a
//! wire-level target simulator.

/// Who is driving SWDIO.
///
/// The two-wire SWD protocol shares the data line between host and target,
/// with single-cycle turnaround slots where ownership changes.  The protocol
/// layer keeps a shadow of this state and schedules every transition; the
/// bus implementation just has to flip the pin between output and input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusDir {
    /// SWDIO is a host output
    Host,
    /// SWDIO is a host input, driven (or released) by the target
    Target,
}

/// Two-pin bit-banged SWD I/O, plus the sleep primitive.
///
/// Contract:
/// - Level changes take effect before the next `delay_us` returns.
/// - `set_swdio` is only meaningful while the direction is [`BusDir::Host`];
///   `swdio_is_high` is only meaningful while it is [`BusDir::Target`].
/// - No timing guarantee is required beyond "each half-cycle is at least one
///   `delay_us` sleep".
pub trait SwdBus {
    /// Drive SWCLK high or low
    fn set_swclk(&mut self, high: bool);

    /// Drive SWDIO high or low
    fn set_swdio(&mut self, high: bool);

    /// Flip SWDIO between host output and host input
    fn set_swdio_dir(&mut self, dir: BusDir);

    /// Sample SWDIO
    fn swdio_is_high(&mut self) -> bool;

    /// Block for at least `us` microseconds
    fn delay_us(&mut self, us: u32);

    /// Block for at least `ms` milliseconds
    fn delay_ms(&mut self, ms: u32) {
        for _ in 0..ms {
            self.delay_us(1000);
        }
    }
}
