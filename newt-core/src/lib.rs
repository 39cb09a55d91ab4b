// Copyright (C) 2026 newt contributors
//
// MIT License

//! newt-core - ARM debug concepts used by the newt SWD probe.
//!
//! Models the registers a Serial Wire Debug host talks to: the Debug Port,
//! the MEM-AP, and the Cortex-M core debug block in the System Control
//! Space.  Wire-level SWD lives in the `newt-swd` crate; this crate knows
//! nothing about pins or timing.
//!
//! This library is `no_std` compatible, and requires an `alloc`
//! implementation.

#![no_std]

pub mod arm;

extern crate alloc;
