// Copyright (C) 2026 newt contributors
//
// MIT License

//! ARM debug register access traits
//!
//! SWD reaches two register files: the Debug Port's own registers and the
//! registers of the currently selected Access Port bank.  A register's data
//! newtype carries its request byte address (0x0, 0x4, 0x8, 0xC - bits
//! [3:2] go on the wire) directly, via [`DpRegister`] or [`ApRegister`].
//!
//! Whether a register can be read or written is not a separate marker
//! trait: it falls out of which raw-word conversions the type declares.  A
//! write-only register like SELECT simply has no `From<u32>`, so the typed
//! read path in `newt-swd` refuses it at compile time.  The conversions are
//! declared with [`wire_register!`].

/// A Debug Port register, identified by its request byte address.
///
/// Two registers may share an address when one is read-only and the other
/// write-only (IDCODE and ABORT both live at 0x0).
pub trait DpRegister {
    const ADDRESS: u8;
}

/// A register of the selected Access Port bank.
pub trait ApRegister {
    const ADDRESS: u8;
}

/// Declare a register data newtype's raw-word conversions and hex
/// formatting.
///
/// `r` registers convert from the wire, `w` registers convert to it, `rw`
/// registers both.  Registers with a bespoke `Display` (such as IDCODE)
/// write their impls by hand instead.
#[macro_export]
macro_rules! wire_register {
    (r $name:ident) => {
        impl ::core::convert::From<u32> for $name {
            fn from(raw: u32) -> Self {
                $name(raw)
            }
        }

        $crate::wire_register!(@display $name);
    };
    (w $name:ident) => {
        impl ::core::convert::From<$name> for u32 {
            fn from(reg: $name) -> u32 {
                reg.0
            }
        }

        $crate::wire_register!(@display $name);
    };
    (rw $name:ident) => {
        $crate::wire_register!(r $name);

        impl ::core::convert::From<$name> for u32 {
            fn from(reg: $name) -> u32 {
                reg.0
            }
        }
    };
    (@display $name:ident) => {
        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::write!(f, "0x{:08X}", self.0)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arm::dp::{Abort, CtrlStat, IdCode, RdBuff, Select};
    use crate::arm::map::{Csw, Drw, Tar};

    #[test]
    fn dp_register_addresses() {
        assert_eq!(<IdCode as DpRegister>::ADDRESS, 0x00);
        assert_eq!(<Abort as DpRegister>::ADDRESS, 0x00);
        assert_eq!(<CtrlStat as DpRegister>::ADDRESS, 0x04);
        assert_eq!(<Select as DpRegister>::ADDRESS, 0x08);
        assert_eq!(<RdBuff as DpRegister>::ADDRESS, 0x0C);
    }

    #[test]
    fn ap_register_addresses() {
        assert_eq!(<Csw as ApRegister>::ADDRESS, 0x00);
        assert_eq!(<Tar as ApRegister>::ADDRESS, 0x04);
        assert_eq!(<Drw as ApRegister>::ADDRESS, 0x0C);
    }

    #[test]
    fn wire_conversions() {
        let cs = CtrlStat::from(0x5000_0000);
        assert_eq!(u32::from(cs), 0x5000_0000);

        // Write-only SELECT still converts to the wire
        assert_eq!(u32::from(Select::default()), 0);
    }
}
