// Copyright (C) 2026 newt contributors
//
// MIT License

//! ARM SWD wire protocol implementation
//!
//! This module implements the SWD line coding for communicating with
//! ARM-based MCUs: the clocked bit pipe, the 8-bit request framing, the
//! turnaround discipline, and single register transactions with ACK
//! decoding.  It provides the [`SwdProtocol`] struct for low-level SWD
//! operations.
//!
//! Applications should use [`crate::DebugInterface`] (preferred) or
//! [`crate::SwdInterface`] instead.

use core::fmt;
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

use crate::SwdError;
use crate::bus::{BusDir, SwdBus};

// JTAG-to-SWD sequence as documented: 0111100111100111
const JTAG_TO_SWD_DOCUMENTED: u16 = 0b0111100111100111; // 0x79E7

// Reversed for SWD LSB-first transmission
const JTAG_TO_SWD_SEQUENCE: u16 = JTAG_TO_SWD_DOCUMENTED.reverse_bits(); // 0xE79E

// 50+ clock cycles with SWDIO high resets the DP
const RESET_DP_SWDIO_HIGH_CYCLES: u32 = 51;

// 12 clock cycles with SWDIO low clears any leftover JTAG state
const LINE_RESET_SWDIO_LOW_CYCLES: u32 = 12;

/// SWD protocol speed setting.
///
/// Selects the half-cycle delay used between clock edges.  [`Speed::Slow`]
/// is the conservative default for long jumper wires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Speed {
    /// 100us half-cycle, roughly 5kHz clock
    #[default]
    Slow,

    /// 10us half-cycle, roughly 50kHz clock
    Medium,

    /// 1us half-cycle, as fast as the bit-bang loop allows
    Fast,
}

impl Speed {
    /// The half-cycle delay, in microseconds
    pub fn half_cycle_us(&self) -> u32 {
        match self {
            Speed::Slow => 100,
            Speed::Medium => 10,
            Speed::Fast => 1,
        }
    }
}

/// Bit transmission order for a run of up to 32 bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOrder {
    /// Most significant bit first - used for the request header
    Msb,
    /// Least significant bit first - used for everything else on the wire
    Lsb,
}

/// SWD operations
///
/// Each operation contains the register byte address (0x0, 0x4, 0x8, 0xC);
/// address bits [3:2] go on the wire.
///
/// SWD request format, in wire transmission order:
///
/// ```text
/// start=1 | APnDP | RnW | A[2] | A[3] | parity | stop=0 | park=1
/// ```
///
/// where `parity = APnDP ^ RnW ^ A[2] ^ A[3]`.  [`SwdOp::header`] packs the
/// request with `start` at bit 7, so emitting the byte MSB-first puts
/// `start` first and `park` last on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwdOp {
    DpRead(u8),
    DpWrite(u8),
    ApRead(u8),
    ApWrite(u8),
}

impl SwdOp {
    /// Whether this operation targets an AP register
    pub fn is_ap(&self) -> bool {
        matches!(self, SwdOp::ApRead(_) | SwdOp::ApWrite(_))
    }

    /// Whether this operation is a read
    pub fn is_read(&self) -> bool {
        matches!(self, SwdOp::DpRead(_) | SwdOp::ApRead(_))
    }

    /// The register byte address
    pub fn addr(&self) -> u8 {
        match self {
            SwdOp::DpRead(a) | SwdOp::DpWrite(a) | SwdOp::ApRead(a) | SwdOp::ApWrite(a) => *a,
        }
    }

    /// Build the 8-bit request header for this operation
    pub fn header(&self) -> u8 {
        let apndp = self.is_ap() as u8;
        let rnw = self.is_read() as u8;
        let a2 = (self.addr() >> 2) & 1;
        let a3 = (self.addr() >> 3) & 1;
        let parity = apndp ^ rnw ^ a2 ^ a3;

        // start=1 at bit 7, park=1 at bit 0, stop=0 at bit 1
        (1 << 7) | (apndp << 6) | (rnw << 5) | (a2 << 4) | (a3 << 3) | (parity << 2) | 1
    }

    /// Decode a request header back into an operation.
    ///
    /// Returns `None` if the framing bits or the parity are wrong.
    pub fn decode(header: u8) -> Option<SwdOp> {
        let start = (header >> 7) & 1;
        let apndp = (header >> 6) & 1;
        let rnw = (header >> 5) & 1;
        let a2 = (header >> 4) & 1;
        let a3 = (header >> 3) & 1;
        let parity = (header >> 2) & 1;
        let stop = (header >> 1) & 1;
        let park = header & 1;

        if start != 1 || stop != 0 || park != 1 {
            return None;
        }
        if parity != apndp ^ rnw ^ a2 ^ a3 {
            return None;
        }

        let addr = (a2 << 2) | (a3 << 3);
        Some(match (apndp, rnw) {
            (0, 1) => SwdOp::DpRead(addr),
            (0, 0) => SwdOp::DpWrite(addr),
            (1, 1) => SwdOp::ApRead(addr),
            (1, 0) => SwdOp::ApWrite(addr),
            _ => unreachable!(),
        })
    }
}

impl fmt::Display for SwdOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwdOp::DpRead(a) => write!(f, "DP Read 0x{a:02X}"),
            SwdOp::DpWrite(a) => write!(f, "DP Write 0x{a:02X}"),
            SwdOp::ApRead(a) => write!(f, "AP Read 0x{a:02X}"),
            SwdOp::ApWrite(a) => write!(f, "AP Write 0x{a:02X}"),
        }
    }
}

/// SWD protocol object
///
/// Owns the bus and the SWDIO direction state machine.  All direction flips
/// go through [`SwdProtocol::set_dir`], so the turnaround discipline lives
/// in exactly one place.
///
/// Single transactions are attempted once; WAIT retry policy belongs to the
/// layer above (see [`crate::SwdInterface`]).
#[derive(Debug)]
pub struct SwdProtocol<B: SwdBus> {
    bus: B,
    dir: BusDir,
    speed: Speed,
    half_cycle_us: u32,
}

impl<B: SwdBus> SwdProtocol<B> {
    /// Create a new SWD protocol instance over the given bus.
    ///
    /// Leaves the bus idle: host driving, SWDIO high, SWCLK high.
    pub fn new(bus: B) -> Self {
        let speed = Speed::default();
        let mut protocol = Self {
            bus,
            dir: BusDir::Host,
            speed,
            half_cycle_us: speed.half_cycle_us(),
        };

        protocol.bus.set_swdio_dir(BusDir::Host);
        protocol.bus.set_swdio(true);
        protocol.bus.set_swclk(true);
        debug!("SWD protocol created, SWDIO output high, SWCLK high");

        protocol
    }

    pub fn speed(&self) -> Speed {
        self.speed
    }

    pub fn set_speed(&mut self, speed: Speed) {
        self.speed = speed;
        self.half_cycle_us = speed.half_cycle_us();
        debug!("SWD speed set to {speed:?}");
    }

    /// Access the underlying bus
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Mutable access to the underlying bus
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Block for one half-cycle
    #[inline]
    fn half_cycle(&mut self) {
        self.bus.delay_us(self.half_cycle_us);
    }

    /// Block while the target settles between link bring-up steps
    pub(crate) fn settle(&mut self) {
        self.bus.delay_ms(3);
    }

    /// Flip the SWDIO direction, if it isn't already there
    fn set_dir(&mut self, dir: BusDir) {
        if self.dir != dir {
            self.bus.set_swdio_dir(dir);
            self.dir = dir;
        }
    }

    /// Emit `n` clock cycles without touching SWDIO.  Leaves SWCLK high.
    pub fn clocks(&mut self, n: u32) {
        for _ in 0..n {
            self.bus.set_swclk(false);
            self.half_cycle();
            self.bus.set_swclk(true);
            self.half_cycle();
        }
    }

    /// Clock out the low `count` bits of `value` in the requested order.
    ///
    /// Each bit is presented while SWCLK is low and is valid for the target
    /// on the rising edge.
    pub fn write_bits(&mut self, value: u32, count: u8, order: BitOrder) {
        debug_assert!(count <= 32);
        debug_assert_eq!(self.dir, BusDir::Host);
        trace!("Info:  Writing {count} bits: 0x{value:0X} {order:?}");

        for i in 0..count {
            let bit = match order {
                BitOrder::Lsb => (value >> i) & 1,
                BitOrder::Msb => (value >> (count - 1 - i)) & 1,
            };
            self.bus.set_swclk(false);
            self.bus.set_swdio(bit == 1);
            self.half_cycle();
            self.bus.set_swclk(true);
            self.half_cycle();
        }
    }

    /// Clock in `count` bits, LSB-first into the returned word.
    ///
    /// Each bit is sampled just before the rising edge.
    pub fn read_bits(&mut self, count: u8) -> u32 {
        debug_assert!(count <= 32);
        debug_assert_eq!(self.dir, BusDir::Target);

        let mut value = 0u32;
        for i in 0..count {
            self.bus.set_swclk(false);
            self.half_cycle();
            if self.bus.swdio_is_high() {
                value |= 1 << i;
            }
            self.bus.set_swclk(true);
            self.half_cycle();
        }
        value
    }

    /// Return the line to host-driven idle: SWDIO output, high
    fn idle(&mut self) {
        self.set_dir(BusDir::Host);
        self.bus.set_swdio(true);
    }

    /// Read the 3-bit ACK, LSB-first
    fn read_ack(&mut self) -> Result<(), SwdError> {
        let ack = self.read_bits(3) as u8;
        SwdError::from_ack(ack)
    }

    /// Execute one read transaction: header, turnaround, ACK, then on OK the
    /// 32 data bits, parity, and the trailing turnaround cycle.
    ///
    /// Exits with the host driving SWDIO high.  On WAIT one extra clock is
    /// emitted so host and target stay aligned; on FAULT or a protocol error
    /// the ACK is surfaced immediately.
    pub fn read_transaction(&mut self, op: SwdOp) -> Result<u32, SwdError> {
        debug_assert!(op.is_read());
        debug_assert_eq!(self.dir, BusDir::Host);

        self.write_bits(op.header() as u32, 8, BitOrder::Msb);

        // Turnaround cycle while passing control to the target
        self.set_dir(BusDir::Target);
        self.clocks(1);

        match self.read_ack() {
            Ok(()) => (),
            Err(e @ SwdError::WaitAck) => {
                // The target releases the line after the ACK on a failed
                // read; one extra clock keeps the stream byte-aligned
                self.clocks(1);
                self.idle();
                return Err(e);
            }
            Err(e) => {
                self.idle();
                return Err(e);
            }
        }

        let data = self.read_bits(32);
        let parity = self.read_bits(1) == 1;

        // Unused parity-pulse slot doubling as the turnaround back to host
        self.clocks(1);
        self.idle();

        if calculate_parity(data) != parity {
            debug!("SWD read parity error: data=0x{data:08X}, parity={parity}");
            return Err(SwdError::ReadParity);
        }

        Ok(data)
    }

    /// Execute one write transaction: header, turnaround, ACK, then on OK a
    /// turnaround back to the host followed by 32 data bits and parity.
    ///
    /// Exits with the host driving SWDIO high.  On any non-OK ACK the
    /// turnaround back to the host is still clocked; no data is emitted.
    pub fn write_transaction(&mut self, op: SwdOp, data: u32) -> Result<(), SwdError> {
        debug_assert!(!op.is_read());
        debug_assert_eq!(self.dir, BusDir::Host);

        self.write_bits(op.header() as u32, 8, BitOrder::Msb);

        // Turnaround cycle while passing control to the target
        self.set_dir(BusDir::Target);
        self.clocks(1);

        match self.read_ack() {
            Ok(()) => (),
            Err(e) => {
                // Turnaround back to the host is still required
                self.clocks(1);
                self.idle();
                return Err(e);
            }
        }

        // Turnaround cycle for control to return to the host
        self.clocks(1);
        self.set_dir(BusDir::Host);

        self.write_bits(data, 32, BitOrder::Lsb);
        self.write_bits(calculate_parity(data) as u32, 1, BitOrder::Lsb);
        self.idle();

        Ok(())
    }

    /// Reset the DP: 50+ clock cycles with SWDIO held high
    pub fn reset_dp(&mut self) {
        self.set_dir(BusDir::Host);
        self.bus.set_swdio(true);
        self.clocks(RESET_DP_SWDIO_HIGH_CYCLES);
    }

    /// Send the JTAG-to-SWD select sequence, LSB-first.
    ///
    /// Must be sent between two DP resets to take effect.
    pub fn jtag_to_swd_sequence(&mut self) {
        self.write_bits(JTAG_TO_SWD_SEQUENCE as u32, 16, BitOrder::Lsb);
        self.bus.set_swdio(true);
    }

    /// Clear leftover JTAG state: 12 clocks with SWDIO low
    pub fn line_reset(&mut self) {
        self.set_dir(BusDir::Host);
        self.bus.set_swdio(false);
        self.clocks(LINE_RESET_SWDIO_LOW_CYCLES);
        self.bus.set_swdio(true);
    }
}

/// Calculate SWD parity - true for an odd number of bits set
pub fn calculate_parity(value: u32) -> bool {
    (value.count_ones() % 2) == 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimOp, SimTarget};

    #[test]
    fn header_encoding_round_trips() {
        // All 16 (APnDP, RnW, A) combinations
        for addr in [0x0u8, 0x4, 0x8, 0xC] {
            for op in [
                SwdOp::DpRead(addr),
                SwdOp::DpWrite(addr),
                SwdOp::ApRead(addr),
                SwdOp::ApWrite(addr),
            ] {
                let header = op.header();
                assert_eq!(header >> 7, 1, "start bit for {op}");
                assert_eq!(header & 1, 1, "park bit for {op}");
                assert_eq!((header >> 1) & 1, 0, "stop bit for {op}");

                let payload = (header >> 3) & 0xF;
                let parity = (header >> 2) & 1;
                assert_eq!(
                    parity,
                    (payload.count_ones() % 2) as u8,
                    "parity for {op}"
                );

                assert_eq!(SwdOp::decode(header), Some(op));
            }
        }
    }

    #[test]
    fn header_known_values() {
        // IDCODE read: start|RnW|parity|park = 0b10100101
        assert_eq!(SwdOp::DpRead(0x0).header(), 0xA5);
        // CTRL/STAT write: start|A2|parity|park
        assert_eq!(SwdOp::DpWrite(0x4).header(), 0x95);
        // DRW read: start|APnDP|RnW|A2|A3|park (even parity)
        assert_eq!(SwdOp::ApRead(0x0C).header(), 0xF9);
    }

    #[test]
    fn header_decode_rejects_bad_framing() {
        assert_eq!(SwdOp::decode(0x00), None); // no start/park
        assert_eq!(SwdOp::decode(0xA4), None); // park clear
        assert_eq!(SwdOp::decode(0xA7), None); // stop set
        assert_eq!(SwdOp::decode(0xA5 ^ 0x04), None); // parity flipped
    }

    #[test]
    fn data_parity() {
        assert!(!calculate_parity(0));
        assert!(!calculate_parity(0xFFFFFFFF));
        assert!(calculate_parity(0x80000000));
        assert!(calculate_parity(0xA05F0003));
        assert!(!calculate_parity(0x50000000));
    }

    #[test]
    fn successful_read_leaves_bus_idle() {
        let mut protocol = SwdProtocol::new(SimTarget::new());

        let data = protocol.read_transaction(SwdOp::DpRead(0x0)).unwrap();
        assert_eq!(data, 0x2BA01477);

        let sim = protocol.bus();
        assert_eq!(sim.dir(), BusDir::Host);
        assert!(sim.swdio_host_level());
        assert_eq!(sim.ops(), &[SimOp::DpRead(0x0)]);
    }

    #[test]
    fn successful_write_leaves_bus_idle() {
        let mut protocol = SwdProtocol::new(SimTarget::new());

        protocol
            .write_transaction(SwdOp::DpWrite(0x4), 0x50000000)
            .unwrap();

        let sim = protocol.bus();
        assert_eq!(sim.dir(), BusDir::Host);
        assert!(sim.swdio_host_level());
        assert_eq!(sim.ops(), &[SimOp::DpWrite(0x4, 0x50000000)]);
    }

    #[test]
    fn transaction_clock_counts() {
        let mut protocol = SwdProtocol::new(SimTarget::new());

        // Successful read: 8 header + 1 turnaround + 3 ack + 32 data +
        // 1 parity + 1 trailing
        let before = protocol.bus().total_clocks();
        protocol.read_transaction(SwdOp::DpRead(0x0)).unwrap();
        assert_eq!(protocol.bus().total_clocks() - before, 46);

        // Read WAIT: 8 + 1 + 3 + 1 extra
        protocol.bus_mut().queue_wait(false, true, 0x0, 1);
        let before = protocol.bus().total_clocks();
        assert_eq!(
            protocol.read_transaction(SwdOp::DpRead(0x0)),
            Err(SwdError::WaitAck)
        );
        assert_eq!(protocol.bus().total_clocks() - before, 13);

        // Read FAULT: 8 + 1 + 3, no extra
        protocol.bus_mut().fault_once(false, true, 0x0);
        let before = protocol.bus().total_clocks();
        assert_eq!(
            protocol.read_transaction(SwdOp::DpRead(0x0)),
            Err(SwdError::FaultAck)
        );
        assert_eq!(protocol.bus().total_clocks() - before, 12);

        // Write WAIT: 8 + 1 + 3 + 1 turnaround, no data
        protocol.bus_mut().queue_wait(false, false, 0x8, 1);
        let before = protocol.bus().total_clocks();
        assert_eq!(
            protocol.write_transaction(SwdOp::DpWrite(0x8), 0),
            Err(SwdError::WaitAck)
        );
        assert_eq!(protocol.bus().total_clocks() - before, 13);

        // Write with garbled ACK bits: the turnaround is still clocked
        protocol.bus_mut().force_ack(0b110);
        let before = protocol.bus().total_clocks();
        assert_eq!(
            protocol.write_transaction(SwdOp::DpWrite(0x8), 0),
            Err(SwdError::NoAck(0b110))
        );
        assert_eq!(protocol.bus().total_clocks() - before, 13);
    }

    #[test]
    fn invalid_ack_surfaced() {
        let mut protocol = SwdProtocol::new(SimTarget::new());

        protocol.bus_mut().force_ack(0b111);
        assert_eq!(
            protocol.read_transaction(SwdOp::DpRead(0x0)),
            Err(SwdError::NoAck(0b111))
        );
        assert_eq!(protocol.bus().dir(), BusDir::Host);
    }

    #[test]
    fn read_parity_checked() {
        let mut protocol = SwdProtocol::new(SimTarget::new());

        protocol.bus_mut().corrupt_next_read_parity();
        assert_eq!(
            protocol.read_transaction(SwdOp::DpRead(0x0)),
            Err(SwdError::ReadParity)
        );
        // The full transaction was clocked, so the bus is back to idle
        assert_eq!(protocol.bus().dir(), BusDir::Host);
    }

    #[test]
    fn jtag_to_swd_sequence_observed() {
        let mut protocol = SwdProtocol::new(SimTarget::new());

        protocol.reset_dp();
        protocol.jtag_to_swd_sequence();
        protocol.reset_dp();
        protocol.line_reset();

        let ops = protocol.bus().ops();
        assert_eq!(
            ops,
            &[
                SimOp::ResetHigh,
                SimOp::JtagToSwd,
                SimOp::ResetHigh,
                SimOp::ResetLow,
            ]
        );
    }
}
