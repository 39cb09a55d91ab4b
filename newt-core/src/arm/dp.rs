// Copyright (C) 2026 newt contributors
//
// MIT License

//! ARM Debug Port registers

use crate::arm::register::DpRegister;
use crate::wire_register;
use alloc::format;
use alloc::string::String;
use core::fmt;

/// ARM Debug Port IDCODE register data (read-only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IdCode(u32);

impl DpRegister for IdCode {
    const ADDRESS: u8 = 0x00;
}

impl IdCode {
    pub const fn from_u32(value: u32) -> Self {
        IdCode(value)
    }

    pub fn data(&self) -> u32 {
        self.0
    }

    /// Get revision field (bits 31:28)
    pub fn revision(&self) -> u8 {
        ((self.0 >> 28) & 0xF) as u8
    }

    /// Get part number (bits 27:20)
    pub fn part_number(&self) -> u8 {
        ((self.0 >> 20) & 0xFF) as u8
    }

    /// Get version (bits 15:12)
    pub fn version(&self) -> u8 {
        ((self.0 >> 12) & 0xF) as u8
    }

    /// Get JEDEC designer ID (bits 11:1)
    pub fn designer_id(&self) -> u16 {
        ((self.0 >> 1) & 0x7FF) as u16
    }

    /// Check if LSB is set (should always be 1 for a valid IDCODE)
    pub fn is_valid(&self) -> bool {
        (self.0 & 1) == 1
    }

    /// Check if this is an ARM Debug Port
    pub fn is_arm_debug_port(&self) -> bool {
        self.designer_id() == 0x23B
    }
}

impl From<u32> for IdCode {
    fn from(value: u32) -> Self {
        Self::from_u32(value)
    }
}

impl From<IdCode> for u32 {
    fn from(value: IdCode) -> u32 {
        value.0
    }
}

impl fmt::Display for IdCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            if !self.is_valid() {
                return write!(f, "Invalid IDCODE: 0x{:08X} (LSB not set)", self.0);
            }

            write!(
                f,
                "0x{:08X} ({})",
                self.0,
                if self.is_arm_debug_port() {
                    "ARM Ltd"
                } else {
                    "Unknown designer"
                }
            )
        } else {
            write!(f, "0x{:08X}", self.0)
        }
    }
}

/// ARM Debug Port ABORT register data (write-only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Abort(u32);

impl DpRegister for Abort {
    const ADDRESS: u8 = 0x00;
}

wire_register!(w Abort);

impl Abort {
    const STKCMPCLR: u32 = 1 << 1;
    const STKERRCLR: u32 = 1 << 2;
    const WDERRCLR: u32 = 1 << 3;
    const ORUNERRCLR: u32 = 1 << 4;

    /// An ABORT value that clears every sticky error flag
    pub fn clear_all() -> Self {
        Abort(Self::STKCMPCLR | Self::STKERRCLR | Self::WDERRCLR | Self::ORUNERRCLR)
    }

    /// Set sticky compare clear flag
    pub fn set_stkcmpclr(&mut self, enable: bool) {
        if enable {
            self.0 |= Self::STKCMPCLR;
        } else {
            self.0 &= !Self::STKCMPCLR;
        }
    }

    /// Set sticky error clear flag
    pub fn set_stkerrclr(&mut self, enable: bool) {
        if enable {
            self.0 |= Self::STKERRCLR;
        } else {
            self.0 &= !Self::STKERRCLR;
        }
    }
}

/// ARM Debug Port CTRL/STAT register data (read-write)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CtrlStat(u32);

impl DpRegister for CtrlStat {
    const ADDRESS: u8 = 0x04;
}

wire_register!(rw CtrlStat);

impl CtrlStat {
    const STICKYORUN: u32 = 1 << 1;
    const STICKYCMP: u32 = 1 << 4;
    const STICKYERR: u32 = 1 << 5;
    const READOK: u32 = 1 << 6;
    const WDATAERR: u32 = 1 << 7;

    const CDBGPWRUPREQ: u32 = 1 << 28;
    const CDBGPWRUPACK: u32 = 1 << 29;
    const CSYSPWRUPREQ: u32 = 1 << 30;
    const CSYSPWRUPACK: u32 = 1 << 31;

    /// Get raw register value
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Get sticky overrun flag
    pub fn stickyorun(&self) -> bool {
        self.0 & Self::STICKYORUN != 0
    }

    /// Get sticky compare flag
    pub fn stickycmp(&self) -> bool {
        self.0 & Self::STICKYCMP != 0
    }

    /// Get sticky error flag
    pub fn stickyerr(&self) -> bool {
        self.0 & Self::STICKYERR != 0
    }

    /// Get read OK flag
    pub fn readok(&self) -> bool {
        self.0 & Self::READOK != 0
    }

    /// Get write data error flag
    pub fn wdataerr(&self) -> bool {
        self.0 & Self::WDATAERR != 0
    }

    /// Get debug power-up acknowledge
    pub fn cdbgpwrupack(&self) -> bool {
        self.0 & Self::CDBGPWRUPACK != 0
    }

    /// Get system power-up acknowledge
    pub fn csyspwrupack(&self) -> bool {
        self.0 & Self::CSYSPWRUPACK != 0
    }

    pub fn has_errors(&self) -> bool {
        self.stickyorun() || self.stickycmp() || self.stickyerr() || self.wdataerr()
    }

    /// Set debug power-up request
    pub fn set_cdbgpwrupreq(&mut self, enable: bool) {
        if enable {
            self.0 |= Self::CDBGPWRUPREQ;
        } else {
            self.0 &= !Self::CDBGPWRUPREQ;
        }
    }

    /// Set system power-up request
    pub fn set_csyspwrupreq(&mut self, enable: bool) {
        if enable {
            self.0 |= Self::CSYSPWRUPREQ;
        } else {
            self.0 &= !Self::CSYSPWRUPREQ;
        }
    }

    /// Get error state description
    pub fn error_states(&self) -> String {
        let mut errors = [""; 4];
        let mut count = 0;

        if self.stickyorun() {
            errors[count] = "STICKYORUN";
            count += 1;
        }
        if self.stickycmp() {
            errors[count] = "STICKYCMP";
            count += 1;
        }
        if self.stickyerr() {
            errors[count] = "STICKYERR";
            count += 1;
        }
        if self.wdataerr() {
            errors[count] = "WDATAERR";
            count += 1;
        }

        if count == 0 {
            format!("No errors{}", if self.readok() { " (READOK)" } else { "" })
        } else {
            format!("Errors: {}", errors[..count].join(", "))
        }
    }

    /// Get power state description
    pub fn power_states(&self) -> String {
        format!(
            "Debug: {}, System: {}",
            if self.cdbgpwrupack() { "ACK" } else { "nak" },
            if self.csyspwrupack() { "ACK" } else { "nak" }
        )
    }
}

/// ARM Debug Port SELECT register data (write-only on an SW-DP; reads of
/// this address are RESEND)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Select(u32);

impl DpRegister for Select {
    const ADDRESS: u8 = 0x08;
}

wire_register!(w Select);

impl Select {
    const APSEL_MASK: u32 = 0xFF;
    const APSEL_SHIFT: u32 = 24;

    const APBANKSEL_MASK: u32 = 0xF;
    const APBANKSEL_SHIFT: u32 = 4;

    const DPBANKSEL_MASK: u32 = 0xF;
    const DPBANKSEL_SHIFT: u32 = 0;

    /// Get raw register value
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Get access port select
    pub fn apsel(&self) -> u32 {
        (self.0 >> Self::APSEL_SHIFT) & Self::APSEL_MASK
    }

    /// Get AP bank select
    pub fn apbanksel(&self) -> u32 {
        (self.0 >> Self::APBANKSEL_SHIFT) & Self::APBANKSEL_MASK
    }

    /// Get DP bank select
    pub fn dpbanksel(&self) -> u32 {
        (self.0 >> Self::DPBANKSEL_SHIFT) & Self::DPBANKSEL_MASK
    }

    /// Set access port select
    pub fn set_apsel(&mut self, apsel: u32) {
        self.0 = (self.0 & !(Self::APSEL_MASK << Self::APSEL_SHIFT))
            | ((apsel & Self::APSEL_MASK) << Self::APSEL_SHIFT);
    }

    /// Set AP bank select from a register byte address
    pub fn set_apbanksel_from_addr(&mut self, addr: u8) {
        let banksel = ((addr >> 4) & 0xF) as u32;
        self.0 = (self.0 & !(Self::APBANKSEL_MASK << Self::APBANKSEL_SHIFT))
            | (banksel << Self::APBANKSEL_SHIFT);
    }
}

/// ARM Debug Port RDBUFF register data (read-only)
///
/// Holds the result of the previous AP read - see the posted read handling
/// in `newt-swd`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RdBuff(u32);

impl DpRegister for RdBuff {
    const ADDRESS: u8 = 0x0C;
}

wire_register!(r RdBuff);

impl RdBuff {
    /// Get the buffered data
    pub fn data(&self) -> u32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idcode_fields() {
        // Cortex-M4 SW-DP
        let id = IdCode::from_u32(0x2BA01477);
        assert!(id.is_valid());
        assert!(id.is_arm_debug_port());
        assert_eq!(id.revision(), 0x2);
        assert_eq!(id.part_number(), 0xBA);
        assert_eq!(id.designer_id(), 0x23B);
    }

    #[test]
    fn ctrl_stat_power_up() {
        let mut cs = CtrlStat::default();
        cs.set_cdbgpwrupreq(true);
        cs.set_csyspwrupreq(true);
        assert_eq!(cs.value(), 0x5000_0000);

        let acked = CtrlStat::from(0xF000_0000);
        assert!(acked.cdbgpwrupack());
        assert!(acked.csyspwrupack());
        assert!(!acked.has_errors());
    }

    #[test]
    fn ctrl_stat_errors() {
        let cs = CtrlStat::from(1 << 5);
        assert!(cs.stickyerr());
        assert!(cs.has_errors());
        assert_eq!(cs.error_states(), "Errors: STICKYERR");
    }

    #[test]
    fn select_fields() {
        let mut sel = Select::default();
        assert_eq!(sel.value(), 0);
        sel.set_apsel(1);
        sel.set_apbanksel_from_addr(0x0C);
        assert_eq!(sel.apsel(), 1);
        assert_eq!(sel.apbanksel(), 0);
        sel.set_apbanksel_from_addr(0xF8);
        assert_eq!(sel.apbanksel(), 0xF);
    }

    #[test]
    fn abort_clear_all() {
        assert_eq!(u32::from(Abort::clear_all()), 0b11110);
    }

    #[test]
    fn rdbuff_data() {
        assert_eq!(RdBuff::from(0xCAFE_F00D).data(), 0xCAFE_F00D);
    }
}
