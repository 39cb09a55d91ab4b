// Copyright (C) 2026 newt contributors
//
// MIT License

//! Cortex-M debug controller
//!
//! This module implements the high-level target control surface: halting,
//! continuing, resetting and single-stepping the core, reading and writing
//! core registers through the DCRSR/DCRDR protocol, and loading a code
//! image into target SRAM.
//!
//! If this module does not give you the control you need, use the
//! [`SwdInterface`] object directly (via [`DebugInterface::swd_if`]) for
//! lower-level SWD access.

use alloc::string::ToString;
use alloc::vec;
use alloc::vec::Vec;
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

use newt_core::arm::dp::IdCode;
use newt_core::arm::scs::{
    Aircr, CoreReg, CoreStatus, DCRDR_ADDR, Dcrsr, Demcr, Dhcsr, VTOR_ADDR,
};

use crate::SwdError;
use crate::bus::SwdBus;
use crate::interface::SwdInterface;

// How many times to re-read DHCSR while waiting for a state change
const STATUS_POLL_ATTEMPTS: u32 = 5;

/// ARM debug interface object
///
/// This is used by applications to control the target over SWD: power up
/// the link, halt and resume the core, inspect registers and memory, and
/// load code into SRAM and run it.
#[derive(Debug)]
pub struct DebugInterface<B: SwdBus> {
    swd: SwdInterface<B>,
}

impl<B: SwdBus> DebugInterface<B> {
    /// Creates a new `DebugInterface` with the given [`SwdInterface`].
    pub fn new(swd: SwdInterface<B>) -> Self {
        Self { swd }
    }

    /// Creates a new `DebugInterface` directly over a bus.
    pub fn from_bus(bus: B) -> Self {
        Self::new(SwdInterface::from_bus(bus))
    }

    /// Returns a mutable reference to the underlying [`SwdInterface`],
    /// for lower-level SWD operations.
    pub fn swd_if(&mut self) -> &mut SwdInterface<B> {
        &mut self.swd
    }

    /// Initializes the SWD link and brings up the DP and MEM-AP.
    ///
    /// Must be run before any other operation on the target, and again to
    /// recover from permanent failures.
    pub fn initialize_target(&mut self) -> Result<IdCode, SwdError> {
        self.swd.initialize_swd();
        self.swd.setup_dp_and_mem_ap()
    }

    /// Reads DHCSR.
    pub fn read_dhcsr(&mut self) -> Result<Dhcsr, SwdError> {
        Ok(Dhcsr::from(self.swd.mem_read(Dhcsr::ADDRESS)?))
    }

    /// Reports the core's execution state.
    pub fn status(&mut self) -> Result<CoreStatus, SwdError> {
        let status = self.read_dhcsr()?.status();
        debug!("Value: Core status: {status:?}");
        Ok(status)
    }

    /// Halts the core and confirms it entered debug state.
    pub fn halt(&mut self) -> Result<(), SwdError> {
        trace!("Exec:  Halt");
        self.swd.mem_write(Dhcsr::ADDRESS, Dhcsr::HALT)?;
        self.poll_halt_state(true, "halt")
    }

    /// Leaves debug state, if halted.
    pub fn run(&mut self) -> Result<(), SwdError> {
        trace!("Exec:  Continue");
        self.swd.mem_write(Dhcsr::ADDRESS, Dhcsr::RUN)?;
        self.poll_halt_state(false, "continue")
    }

    /// Resets the core and halts it at the reset vector.
    ///
    /// Arms vector catch on core reset in DEMCR, then requests a system
    /// reset through AIRCR.
    pub fn reset_halt(&mut self) -> Result<(), SwdError> {
        trace!("Exec:  Reset halt");

        // Enable halt on reset
        let mut demcr = Demcr::from(self.swd.mem_read(Demcr::ADDRESS)?);
        demcr.set_vc_corereset(true);
        self.swd.mem_write(Demcr::ADDRESS, demcr.into())?;

        // Reset the core
        self.swd.mem_write(Aircr::ADDRESS, Aircr::SYSRESET_REQUEST)?;

        self.poll_halt_state(true, "reset halt")
    }

    /// Steps one instruction.  The core must already be halted.
    ///
    /// Returns the new program counter.
    pub fn step(&mut self) -> Result<u32, SwdError> {
        trace!("Exec:  Step");
        if !self.read_dhcsr()?.s_halt() {
            return Err(SwdError::OperationFailed("core is not halted".to_string()));
        }

        self.swd.mem_write(Dhcsr::ADDRESS, Dhcsr::STEP)?;
        self.poll_halt_state(true, "step")?;

        self.read_core_register(CoreReg::Pc)
    }

    /// Reads a core register through the DCRSR/DCRDR protocol.
    pub fn read_core_register(&mut self, reg: CoreReg) -> Result<u32, SwdError> {
        self.swd
            .mem_write(Dcrsr::ADDRESS, Dcrsr::read_request(reg.regsel()))?;
        self.wait_regrdy()?;
        self.swd.mem_read(DCRDR_ADDR)
    }

    /// Writes a core register through the DCRSR/DCRDR protocol.
    pub fn write_core_register(&mut self, reg: CoreReg, value: u32) -> Result<(), SwdError> {
        self.swd.mem_write(DCRDR_ADDR, value)?;
        self.swd
            .mem_write(Dcrsr::ADDRESS, Dcrsr::write_request(reg.regsel()))?;
        self.wait_regrdy()
    }

    /// Sets up execution of a loaded image: PC, main stack pointer, and the
    /// vector table relocation.
    pub fn init_execution(&mut self, pc: u32, msp: u32, vector_base: u32) -> Result<(), SwdError> {
        debug!("Exec:  Init execution pc=0x{pc:08X} msp=0x{msp:08X}");
        self.write_core_register(CoreReg::Pc, pc)?;
        self.write_core_register(CoreReg::Msp, msp)?;

        // Relocate the vector table to the loaded image
        self.swd.mem_write(VTOR_ADDR, vector_base)
    }

    /// Loads a little-endian byte image into target SRAM, verifies it by
    /// reading it back, then sets the core up to run it.
    ///
    /// The image must be word-aligned and carry a vector table header: the
    /// initial stack pointer in word 0 and the reset vector (with the Thumb
    /// bit set) in word 1.  PC and MSP are taken from that header.
    pub fn load_image(&mut self, image: &[u8], ram_base: u32) -> Result<(), SwdError> {
        if image.len() % 4 != 0 {
            warn!("Image length {} is not word aligned", image.len());
            return Err(SwdError::Api);
        }
        if image.len() < 8 {
            warn!("Image too short to carry a vector table header");
            return Err(SwdError::Api);
        }

        let words: Vec<u32> = image
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        self.halt()?;

        info!("Loading {} words at 0x{ram_base:08X}", words.len());
        self.swd.mem_write_bulk(ram_base, &words).map_err(|(e, done)| {
            warn!("Image write failed after {done} words");
            e
        })?;

        self.verify_image(&words, ram_base)?;

        self.reset_halt()?;

        // Initial SP and entry point come from the image's vector table
        let msp = words[0];
        let pc = words[1];
        self.init_execution(pc, msp, ram_base)
    }

    /// Reads back `words.len()` words from `ram_base` and compares them
    /// elementwise against `words`.
    pub fn verify_image(&mut self, words: &[u32], ram_base: u32) -> Result<(), SwdError> {
        let mut readback = vec![0u32; words.len()];
        self.swd
            .mem_read_bulk(ram_base, &mut readback)
            .map_err(|(e, _)| e)?;

        for (index, (&expected, &found)) in words.iter().zip(readback.iter()).enumerate() {
            if expected != found {
                error!("Verification failed at word {index}: 0x{expected:08X} != 0x{found:08X}");
                return Err(SwdError::VerifyFailed {
                    index,
                    expected,
                    found,
                });
            }
        }

        debug!("Verification success, {} words", words.len());
        Ok(())
    }

    fn poll_halt_state(&mut self, want_halted: bool, what: &str) -> Result<(), SwdError> {
        for _ in 0..STATUS_POLL_ATTEMPTS {
            if self.read_dhcsr()?.s_halt() == want_halted {
                return Ok(());
            }
            self.swd.settle();
        }

        warn!("Core did not reach the expected state after {what}");
        Err(SwdError::OperationFailed(what.to_string()))
    }

    fn wait_regrdy(&mut self) -> Result<(), SwdError> {
        for _ in 0..STATUS_POLL_ATTEMPTS {
            if self.read_dhcsr()?.s_regrdy() {
                return Ok(());
            }
            self.swd.settle();
        }

        Err(SwdError::OperationFailed(
            "core register transfer did not complete".to_string(),
        ))
    }
}
