// Copyright (C) 2026 newt contributors
//
// MIT License

//! newt-swd library
//!
//! ARM Serial Wire Debug (SWD) implementation for the newt probe.
//!
//! The probe drives two bit-banged GPIO lines (SWCLK/SWDIO) to control an
//! attached ARM Cortex-M target: halting, resetting, single-stepping,
//! inspecting registers and memory, and loading code into SRAM.
//!
//! The crate is layered bottom-up:
//!
//! ```text
//!      DebugInterface      halt/step/reset, core registers, SRAM loader
//!   ----------------------
//!      SwdInterface        link bring-up, MEM-AP memory port
//!   ----------------------
//!      SwdProtocol         bit pipe, request framing, transactions
//!   ----------------------
//!      SwdBus (trait)      two GPIO pins + microsecond sleep
//! ```
//!
//! * [`DebugInterface`] provides the highest-level and most abstracted
//!   interface to control the target.
//! * [`SwdInterface`] provides the link initializer and MEM-AP memory port.
//! * [`SwdProtocol`] implements the SWD wire protocol through bit-banging.
//! * [`SwdBus`] is the contract the platform must provide; anything that can
//!   flip two pins and sleep for a microsecond can host the probe.
//!
//! The crate is `no_std` and platform-agnostic - the firmware crate supplies
//! the pins.  It requires an `alloc` implementation.

#![no_std]

pub mod bus;
pub mod debug;
pub mod interface;
pub mod protocol;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

#[doc(inline)]
pub use crate::bus::SwdBus;
#[doc(inline)]
pub use crate::debug::DebugInterface;
#[doc(inline)]
pub use crate::interface::SwdInterface;
#[doc(inline)]
pub use crate::protocol::SwdProtocol;

extern crate alloc;
use alloc::string::String;
use core::fmt;

/// Core error type used by all newt-swd objects
///
/// Methods are provided to make it easier to handle errors, by checking if
/// either a retry or reset is required:
///
/// - [`SwdError::requires_retry()`]
/// - [`SwdError::requires_reset()`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwdError {
    /// Transient error that can likely be retried successfully.  The MEM-AP
    /// port retries WAITs automatically; this error is returned when too
    /// many waits have occurred.
    WaitAck,

    /// Represents a fault condition on the target.  The fault is sticky in
    /// DP CTRL/STAT; the target needs a fresh
    /// [`SwdInterface::initialize_swd()`] or a hard reset.
    FaultAck,

    /// The ACK bits decoded to something other than OK/WAIT/FAULT.  The
    /// value received is included - 7 means SWDIO was high for the entire
    /// acknowledge cycle, which is the most common case when no target is
    /// attached.
    NoAck(u8),

    /// A parity error was detected while reading from the target, so the
    /// data read cannot be trusted.  Persistent parity errors suggest noise
    /// on the SWD lines or a half-period too short for the wiring.
    ReadParity,

    /// A Debug Port error was detected via the DP CTRL/STAT register.  A
    /// re-initialization of the target is usually required.
    DpError,

    /// The loader's read-back verification found a word that differs from
    /// the source image.
    VerifyFailed {
        /// Word index of the first mismatch
        index: usize,
        /// What the image holds at that index
        expected: u32,
        /// What the target returned
        found: u32,
    },

    /// While there wasn't an SWD protocol level error, the requested
    /// operation failed.  Often occurs when a DP/AP register write doesn't
    /// "take".
    OperationFailed(String),

    /// The target is not ready to receive the requested operation.  This
    /// normally means the link has not been brought up with
    /// [`SwdInterface::initialize_swd()`] and
    /// [`SwdInterface::setup_dp_and_mem_ap()`].
    NotReady,

    /// The API was called incorrectly - for example a memory operation on an
    /// unaligned address, or an image whose length is not a multiple of 4.
    Api,

    /// The requested operation is not supported by `newt-swd`.
    Unsupported,
}

impl SwdError {
    /// Decode a 3-bit ACK into a result
    pub(crate) fn from_ack(ack: u8) -> Result<(), SwdError> {
        match ack {
            0b001 => Ok(()),
            0b010 => Err(SwdError::WaitAck),
            0b100 => Err(SwdError::FaultAck),
            _ => Err(SwdError::NoAck(ack)),
        }
    }

    /// Returns true if the error requires a target re-initialization to
    /// recover.  If the error persists, the target may require a hard reset.
    pub fn requires_reset(&self) -> bool {
        matches!(
            self,
            SwdError::NoAck(_) | SwdError::FaultAck | SwdError::ReadParity | SwdError::DpError
        )
    }

    /// Returns true if the error is a transient error that can be retried.
    /// This is typically just the WAIT ACK from the SWD target.
    pub fn requires_retry(&self) -> bool {
        matches!(self, SwdError::WaitAck)
    }
}

impl SwdError {
    /// Returns a string representation of the error.
    pub fn as_str(&self) -> &'static str {
        match self {
            SwdError::WaitAck => "Wait ACK",
            SwdError::FaultAck => "Fault ACK",
            SwdError::NoAck(_) => "No ACK",
            SwdError::ReadParity => "Read Parity Error",
            SwdError::DpError => "Debug Port Error",
            SwdError::VerifyFailed { .. } => "Verification Failed",
            SwdError::OperationFailed(_) => "Operation Failed",
            SwdError::NotReady => "Not Ready",
            SwdError::Api => "API Error",
            SwdError::Unsupported => "Unsupported Operation",
        }
    }
}

impl fmt::Display for SwdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwdError::NoAck(ack) => write!(f, "{}: {ack}", self.as_str()),
            SwdError::OperationFailed(str) => write!(f, "{}: {str}", self.as_str()),
            SwdError::VerifyFailed {
                index,
                expected,
                found,
            } => write!(
                f,
                "{} at word {index}: 0x{expected:08X} != 0x{found:08X}",
                self.as_str()
            ),
            _ => write!(f, "{}", self.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ack_decode() {
        assert_eq!(SwdError::from_ack(0b001), Ok(()));
        assert_eq!(SwdError::from_ack(0b010), Err(SwdError::WaitAck));
        assert_eq!(SwdError::from_ack(0b100), Err(SwdError::FaultAck));
        assert_eq!(SwdError::from_ack(0b111), Err(SwdError::NoAck(0b111)));
        assert_eq!(SwdError::from_ack(0b000), Err(SwdError::NoAck(0)));
    }

    #[test]
    fn error_classification() {
        assert!(SwdError::WaitAck.requires_retry());
        assert!(!SwdError::WaitAck.requires_reset());
        assert!(SwdError::FaultAck.requires_reset());
        assert!(SwdError::NoAck(7).requires_reset());
        assert!(!SwdError::Api.requires_reset());
        assert!(!SwdError::Api.requires_retry());
    }
}
