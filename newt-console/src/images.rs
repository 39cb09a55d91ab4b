// Copyright (C) 2026 newt contributors
//
// MIT License

//! Built-in target images
//!
//! Small pre-baked Cortex-M SRAM payloads, position-fixed at
//! [`RAM_BASE`].  Each image starts with a 16-entry vector table: the
//! initial main stack pointer in word 0, the reset vector (entry point at
//! offset 0x40, Thumb bit set) in word 1.  The loader takes PC and MSP from
//! that header.

/// Where images are loaded and run from
pub const RAM_BASE: u32 = 0x2000_0000;

/// A named built-in image
#[derive(Debug, Clone, Copy)]
pub struct Image {
    pub name: &'static str,
    pub bytes: &'static [u8],
}

/// `simple` - a pair of NOPs and a branch-to-self
pub static SIMPLE: Image = Image {
    name: "simple",
    bytes: &[
        // Vector table: MSP = 0x20004000, reset = 0x20000041
        0x00, 0x40, 0x00, 0x20, 0x41, 0x00, 0x00, 0x20, //
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
        // 0x40: nop; nop; b . ; nop
        0x00, 0xBF, 0x00, 0xBF, 0xFE, 0xE7, 0x00, 0xBF, //
    ],
};

/// `blink` - toggles GPIOA pin 5 (the usual dev-board LED) in a tight loop
pub static BLINK: Image = Image {
    name: "blink",
    bytes: &[
        // Vector table: MSP = 0x20004000, reset = 0x20000041
        0x00, 0x40, 0x00, 0x20, 0x41, 0x00, 0x00, 0x20, //
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
        // 0x40: ldr r0, =GPIOA_ODR; ldr r1, =(1 << 5)
        0x03, 0x48, 0x04, 0x49, //
        // 0x44: ldr r2, [r0]; eors r2, r1; str r2, [r0]; b 0x44
        0x02, 0x68, 0x4A, 0x40, 0x02, 0x60, 0xFB, 0xE7, //
        // 0x4C: padding to align the literal pool
        0x00, 0xBF, 0x00, 0xBF, //
        // 0x50: literals - GPIOA ODR, pin mask
        0x14, 0x00, 0x02, 0x40, 0x20, 0x00, 0x00, 0x00, //
    ],
};

/// Resolve an image by name.  Unknown names fall back to `simple`.
pub fn by_name(name: &str) -> &'static Image {
    match name {
        "blink" => &BLINK,
        "simple" => &SIMPLE,
        _ => &SIMPLE,
    }
}
