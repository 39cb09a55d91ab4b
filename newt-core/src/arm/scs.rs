// Copyright (C) 2026 newt contributors
//
// MIT License

//! Cortex-M core debug registers
//!
//! These live in the System Control Space and are reached through MEM-AP
//! memory transactions, not DP/AP register operations - so, unlike the
//! registers in [`crate::arm::dp`] and [`crate::arm::map`], each carries a
//! full 32-bit memory address.

use core::fmt;
use static_assertions::const_assert_eq;

use crate::wire_register;

/// Vector Table Offset Register address
pub const VTOR_ADDR: u32 = 0xE000_ED08;

/// Debug Core Register Data Register address
pub const DCRDR_ADDR: u32 = 0xE000_EDF8;

/// Debug Halting Control and Status Register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dhcsr(u32);

wire_register!(rw Dhcsr);

impl Dhcsr {
    pub const ADDRESS: u32 = 0xE000_EDF0;

    /// Writes without this key in bits [31:16] are silently dropped by the
    /// target, so every write value is built through [`Self::write_value`].
    const DBGKEY: u32 = 0xA05F << 16;

    const C_DEBUGEN: u32 = 1 << 0;
    const C_HALT: u32 = 1 << 1;
    const C_STEP: u32 = 1 << 2;

    const S_REGRDY: u32 = 1 << 16;
    const S_HALT: u32 = 1 << 17;
    const S_SLEEP: u32 = 1 << 18;
    const S_LOCKUP: u32 = 1 << 19;
    const S_RETIRE_ST: u32 = 1 << 24;
    const S_RESET_ST: u32 = 1 << 25;

    /// Build a DHCSR write value: control bits plus the debug key
    pub const fn write_value(control: u32) -> u32 {
        Self::DBGKEY | (control & 0xFFFF)
    }

    /// Halt the core (C_DEBUGEN | C_HALT)
    pub const HALT: u32 = Self::write_value(Self::C_DEBUGEN | Self::C_HALT);

    /// Leave debug state (C_DEBUGEN only)
    pub const RUN: u32 = Self::write_value(Self::C_DEBUGEN);

    /// Step one instruction (C_DEBUGEN | C_STEP)
    pub const STEP: u32 = Self::write_value(Self::C_DEBUGEN | Self::C_STEP);

    pub fn value(&self) -> u32 {
        self.0
    }

    pub fn c_debugen(&self) -> bool {
        self.0 & Self::C_DEBUGEN != 0
    }

    pub fn s_regrdy(&self) -> bool {
        self.0 & Self::S_REGRDY != 0
    }

    pub fn s_halt(&self) -> bool {
        self.0 & Self::S_HALT != 0
    }

    pub fn s_sleep(&self) -> bool {
        self.0 & Self::S_SLEEP != 0
    }

    pub fn s_lockup(&self) -> bool {
        self.0 & Self::S_LOCKUP != 0
    }

    pub fn s_retire_st(&self) -> bool {
        self.0 & Self::S_RETIRE_ST != 0
    }

    pub fn s_reset_st(&self) -> bool {
        self.0 & Self::S_RESET_ST != 0
    }

    /// Derive the core state from the status bits.  Lockup wins over
    /// sleeping, sleeping over halted.
    pub fn status(&self) -> CoreStatus {
        if self.s_lockup() {
            CoreStatus::LockedUp
        } else if self.s_sleep() {
            CoreStatus::Sleeping
        } else if self.s_halt() {
            CoreStatus::Halted
        } else {
            CoreStatus::Running
        }
    }
}

// The halt/run/step values this probe puts on the wire
const_assert_eq!(Dhcsr::HALT, 0xA05F_0003);
const_assert_eq!(Dhcsr::RUN, 0xA05F_0000);
const_assert_eq!(Dhcsr::STEP, 0xA05F_0005);

/// Debug Core Register Selector Register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dcrsr(u32);

wire_register!(rw Dcrsr);

impl Dcrsr {
    pub const ADDRESS: u32 = 0xE000_EDF4;

    const REGSEL_MASK: u32 = 0x7F;
    const REGWNR: u32 = 1 << 16;

    /// DCRSR value that transfers core register `regsel` into DCRDR
    pub const fn read_request(regsel: u8) -> u32 {
        regsel as u32 & Self::REGSEL_MASK
    }

    /// DCRSR value that transfers DCRDR into core register `regsel`
    pub const fn write_request(regsel: u8) -> u32 {
        Self::REGWNR | (regsel as u32 & Self::REGSEL_MASK)
    }
}

/// Debug Exception and Monitor Control Register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Demcr(u32);

wire_register!(rw Demcr);

impl Demcr {
    pub const ADDRESS: u32 = 0xE000_EDFC;

    const VC_CORERESET: u32 = 1 << 0;

    pub fn value(&self) -> u32 {
        self.0
    }

    pub fn vc_corereset(&self) -> bool {
        self.0 & Self::VC_CORERESET != 0
    }

    /// Set vector-catch on core reset, so the core halts at the reset vector
    pub fn set_vc_corereset(&mut self, enable: bool) {
        if enable {
            self.0 |= Self::VC_CORERESET;
        } else {
            self.0 &= !Self::VC_CORERESET;
        }
    }
}

/// Application Interrupt and Reset Control Register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Aircr(u32);

wire_register!(rw Aircr);

impl Aircr {
    pub const ADDRESS: u32 = 0xE000_ED0C;

    /// The write value this probe uses to request a system reset
    /// (SYSRESETREQ plus the vector key)
    pub const SYSRESET_REQUEST: u32 = 0x0AFA_0004;

    const SYSRESETREQ: u32 = 1 << 2;

    pub fn sysresetreq(&self) -> bool {
        self.0 & Self::SYSRESETREQ != 0
    }
}

/// Observable core execution state, derived from DHCSR
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreStatus {
    Running,
    Halted,
    Sleeping,
    LockedUp,
}

impl CoreStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoreStatus::Running => "Core currently running",
            CoreStatus::Halted => "In Debug Mode",
            CoreStatus::Sleeping => "Processor sleeping",
            CoreStatus::LockedUp => "Processor locked up because of an unrecoverable exception",
        }
    }
}

impl fmt::Display for CoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A core register reachable through the DCRSR/DCRDR protocol
///
/// Covers the general purpose registers, the FP registers, and the named
/// special registers.  CONTROL, FAULTMASK, BASEPRI and PRIMASK share one
/// packed 32-bit selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreReg {
    /// r0-r15
    Gp(u8),
    /// s0-s31, through the FP access class
    Fp(u8),
    Sp,
    Lr,
    Pc,
    Xpsr,
    Msp,
    Psp,
    Control,
    Faultmask,
    Basepri,
    Primask,
    Fpcsr,
}

impl CoreReg {
    /// The DCRSR REGSEL value for this register
    pub fn regsel(&self) -> u8 {
        match self {
            CoreReg::Gp(n) => *n,
            CoreReg::Fp(n) => *n,
            CoreReg::Sp => 0x0D,
            CoreReg::Lr => 0x0E,
            CoreReg::Pc => 0x0F,
            CoreReg::Xpsr => 0x10,
            CoreReg::Msp => 0x11,
            CoreReg::Psp => 0x12,
            CoreReg::Control => 0x14,
            CoreReg::Faultmask => 0x14,
            CoreReg::Basepri => 0x14,
            CoreReg::Primask => 0x14,
            CoreReg::Fpcsr => 0x21,
        }
    }

    /// Parse a register name (without any leading `$`), case-insensitively.
    ///
    /// Accepts `r0`-`r15`, `s0`-`s31`, and the named special registers.
    pub fn parse(name: &str) -> Option<CoreReg> {
        let rest = name.get(1..)?;
        match name.chars().next()? {
            'r' | 'R' if rest.bytes().all(|b| b.is_ascii_digit()) => {
                let n: u8 = rest.parse().ok()?;
                (n <= 15).then_some(CoreReg::Gp(n))
            }
            's' | 'S' if rest.bytes().all(|b| b.is_ascii_digit()) => {
                let n: u8 = rest.parse().ok()?;
                (n <= 31).then_some(CoreReg::Fp(n))
            }
            _ => {
                if name.eq_ignore_ascii_case("sp") {
                    Some(CoreReg::Sp)
                } else if name.eq_ignore_ascii_case("lr") {
                    Some(CoreReg::Lr)
                } else if name.eq_ignore_ascii_case("pc") {
                    Some(CoreReg::Pc)
                } else if name.eq_ignore_ascii_case("xpsr") {
                    Some(CoreReg::Xpsr)
                } else if name.eq_ignore_ascii_case("msp") {
                    Some(CoreReg::Msp)
                } else if name.eq_ignore_ascii_case("psp") {
                    Some(CoreReg::Psp)
                } else if name.eq_ignore_ascii_case("control") {
                    Some(CoreReg::Control)
                } else if name.eq_ignore_ascii_case("faultmask") {
                    Some(CoreReg::Faultmask)
                } else if name.eq_ignore_ascii_case("basepri") {
                    Some(CoreReg::Basepri)
                } else if name.eq_ignore_ascii_case("primask") {
                    Some(CoreReg::Primask)
                } else if name.eq_ignore_ascii_case("fpcsr") {
                    Some(CoreReg::Fpcsr)
                } else {
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dhcsr_status_precedence() {
        assert_eq!(Dhcsr::from(0).status(), CoreStatus::Running);
        assert_eq!(Dhcsr::from(1 << 17).status(), CoreStatus::Halted);
        assert_eq!(Dhcsr::from(1 << 18 | 1 << 17).status(), CoreStatus::Sleeping);
        assert_eq!(
            Dhcsr::from(1 << 19 | 1 << 18 | 1 << 17).status(),
            CoreStatus::LockedUp
        );
    }

    #[test]
    fn dhcsr_write_values_carry_key() {
        assert_eq!(Dhcsr::HALT >> 16, 0xA05F);
        assert_eq!(Dhcsr::RUN & 0xFFFF, 0);
        assert_eq!(Dhcsr::STEP & 0xFFFF, 0b101);
    }

    #[test]
    fn dcrsr_requests() {
        assert_eq!(Dcrsr::read_request(0x0F), 0x0000_000F);
        assert_eq!(Dcrsr::write_request(0x0F), 0x0001_000F);
        assert_eq!(Dcrsr::write_request(0x0D), 0x0001_000D);
    }

    #[test]
    fn core_reg_parse() {
        assert_eq!(CoreReg::parse("r0"), Some(CoreReg::Gp(0)));
        assert_eq!(CoreReg::parse("R15"), Some(CoreReg::Gp(15)));
        assert_eq!(CoreReg::parse("r16"), None);
        assert_eq!(CoreReg::parse("s31"), Some(CoreReg::Fp(31)));
        assert_eq!(CoreReg::parse("s32"), None);
        assert_eq!(CoreReg::parse("PC"), Some(CoreReg::Pc));
        assert_eq!(CoreReg::parse("Msp"), Some(CoreReg::Msp));
        assert_eq!(CoreReg::parse("faultmask"), Some(CoreReg::Faultmask));
        assert_eq!(CoreReg::parse("bogus"), None);
        assert_eq!(CoreReg::parse(""), None);
    }

    #[test]
    fn core_reg_regsel() {
        assert_eq!(CoreReg::Pc.regsel(), 0x0F);
        assert_eq!(CoreReg::parse("sp").unwrap().regsel(), 0x0D);
        assert_eq!(CoreReg::parse("r13").unwrap().regsel(), 0x0D);
        assert_eq!(CoreReg::Control.regsel(), CoreReg::Primask.regsel());
        assert_eq!(CoreReg::Fpcsr.regsel(), 0x21);
    }
}
