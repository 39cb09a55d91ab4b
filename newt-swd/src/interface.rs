// Copyright (C) 2026 newt contributors
//
// MIT License

//! ARM SWD interface
//!
//! This module implements the link initializer and the MEM-AP memory port.
//! It provides [`SwdInterface`] for performing individual SWD register and
//! memory operations, on top of [`SwdProtocol`].
//!
//! Most applications will prefer [`crate::DebugInterface`], which provides a
//! higher-level interface for controlling the target core.
//!
//! Posted reads are handled here and only here: callers never talk to DRW
//! directly, so the "discard one read, fetch the result from RDBUFF" dance
//! lives in one place.

use alloc::string::ToString;
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

use newt_core::arm::Cortex;
use newt_core::arm::dp::{CtrlStat, IdCode, RdBuff, Select};
use newt_core::arm::map::{Csw, Drw, Tar};
use newt_core::arm::register::{ApRegister, DpRegister};

use crate::SwdError;
use crate::bus::SwdBus;
use crate::protocol::{Speed, SwdOp, SwdProtocol};

// The MEM-AP auto-increments TAR within a 1KiB window only; streams must
// re-issue TAR at each boundary.
const SWD_MEMORY_BOUNDARY: u32 = 0x400;

// Default retries after a Wait ACK
const DEFAULT_WAIT_RETRIES: u32 = 4;

/// SWD interface object
///
/// Owns the link state: whether the debug domain is powered up, and the
/// host-side shadow of the MEM-AP CSW and TAR registers.  The shadow lets
/// the memory port skip redundant register writes; it is invalidated by
/// every [`SwdInterface::initialize_swd`].
///
/// Single AP/DP operations retry automatically on a WAIT ACK, up to a small
/// cap (see [`SwdInterface::set_wait_retries`]), after which
/// [`SwdError::WaitAck`] is surfaced to the caller.
#[derive(Debug)]
pub struct SwdInterface<B: SwdBus> {
    protocol: SwdProtocol<B>,
    idcode: Option<IdCode>,
    powered_up: bool,
    csw_shadow: Option<Csw>,
    tar_shadow: Option<u32>,
    wait_retries: u32,
}

impl<B: SwdBus> SwdInterface<B> {
    /// Creates a new SWD interface using the given [`SwdProtocol`] instance.
    pub fn new(protocol: SwdProtocol<B>) -> Self {
        Self {
            protocol,
            idcode: None,
            powered_up: false,
            csw_shadow: None,
            tar_shadow: None,
            wait_retries: DEFAULT_WAIT_RETRIES,
        }
    }

    /// Creates a new SWD interface directly over a bus.
    pub fn from_bus(bus: B) -> Self {
        Self::new(SwdProtocol::new(bus))
    }

    // Resets internal state of the SWD interface.  The MEM-AP shadows
    // become unknown, so the first memory operation rewrites them.
    fn reset_internal_state(&mut self) {
        self.idcode = None;
        self.powered_up = false;
        self.csw_shadow = None;
        self.tar_shadow = None;
    }

    /// Sets the SWD speed for this interface.  Can be changed at any time.
    pub fn set_swd_speed(&mut self, speed: Speed) {
        self.protocol.set_speed(speed);
    }

    /// Gets the SWD speed for this interface.
    pub fn swd_speed(&self) -> Speed {
        self.protocol.speed()
    }

    /// Sets the number of automatic retries when an SWD operation gets a
    /// WAIT ACK.
    pub fn set_wait_retries(&mut self, retries: u32) {
        self.wait_retries = retries;
    }

    /// Returns whether the link has been brought up.
    pub fn is_connected(&self) -> bool {
        self.idcode.is_some()
    }

    /// Retrieves the IDCODE of the target device, if available.
    pub fn idcode(&self) -> Option<IdCode> {
        self.idcode
    }

    /// Access the underlying bus
    pub fn bus(&self) -> &B {
        self.protocol.bus()
    }

    /// Mutable access to the underlying bus
    pub fn bus_mut(&mut self) -> &mut B {
        self.protocol.bus_mut()
    }

    pub(crate) fn settle(&mut self) {
        self.protocol.settle();
    }

    /// Drive the JTAG-to-SWD switch and leave the target's SWD-DP reset and
    /// silent.
    ///
    /// Must be called before [`SwdInterface::setup_dp_and_mem_ap`], and
    /// again whenever the link needs recovering from a fault.  Each step is
    /// separated by a short settle delay so the target observes stable
    /// idle.
    pub fn initialize_swd(&mut self) {
        trace!("Exec:  Initialize SWD");
        self.reset_internal_state();

        // Reset the current DP (possibly still a JTAG-DP)
        self.protocol.reset_dp();
        self.protocol.settle();

        // Send the JTAG-to-SWD select sequence
        self.protocol.jtag_to_swd_sequence();
        self.protocol.settle();

        // Reset the DP again - now an SWD-DP
        self.protocol.reset_dp();
        self.protocol.settle();

        // Clear any leftover JTAG state
        self.protocol.line_reset();
        self.protocol.settle();
    }

    /// Bring up the DP and the MEM-AP.
    ///
    /// Reads the IDCODE, powers up the debug domain via CTRL/STAT (and
    /// confirms the ACK bits), selects AP 0 bank 0, and configures the CSW
    /// for 32-bit transfers with auto-increment off.
    ///
    /// Any non-OK ACK is fatal to link bring-up: the failing step is logged
    /// and the error returned, and the link needs a fresh
    /// [`SwdInterface::initialize_swd`].
    pub fn setup_dp_and_mem_ap(&mut self) -> Result<IdCode, SwdError> {
        let idcode = self
            .read_idcode()
            .inspect_err(|e| error!("Failed to read IDCODE: {e}"))?;
        match Cortex::from_idcode(idcode) {
            Some(core) => info!("IDCODE: {idcode} ({core})"),
            None => info!("IDCODE: {idcode}"),
        }
        self.protocol.settle();

        // Set CSYSPWRUPREQ and CDBGPWRUPREQ to bring the rest of the system
        // online
        let mut ctrl_stat = CtrlStat::default();
        ctrl_stat.set_cdbgpwrupreq(true);
        ctrl_stat.set_csyspwrupreq(true);
        self.write_dp_register(ctrl_stat)
            .inspect_err(|e| error!("Failed to write CTRL/STAT: {e}"))?;
        self.protocol.settle();

        // Verify power up
        let status: CtrlStat = self
            .read_dp_register()
            .inspect_err(|e| error!("Failed to read CTRL/STAT: {e}"))?;
        if !status.cdbgpwrupack() || !status.csyspwrupack() {
            error!("Debug domain power up not acknowledged: {status}");
            return Err(SwdError::OperationFailed(
                "debug domain power up failed".to_string(),
            ));
        }
        debug!("OK:    Debug domain powered up ({})", status.power_states());
        self.powered_up = true;
        self.protocol.settle();

        // Select AP 0, bank 0.  0x00 is the MEM-AP on most targets but is
        // implementation defined.
        self.write_dp_register(Select::default())
            .inspect_err(|e| error!("Failed to write SELECT: {e}"))?;
        self.protocol.settle();

        // Configure the MEM-AP for 32-bit transfers, auto-increment off
        self.write_ap_register(Csw::default())
            .inspect_err(|e| error!("Failed to write CSW: {e}"))?;
        self.protocol.settle();

        self.idcode = Some(idcode);
        Ok(idcode)
    }

    /// Performs an SWD operation to read the IDCODE register.
    pub fn read_idcode(&mut self) -> Result<IdCode, SwdError> {
        self.read_dp_register()
    }

    /// Write a Debug Port register
    pub fn write_dp_register<R>(&mut self, value: R) -> Result<(), SwdError>
    where
        R: DpRegister + Into<u32>,
    {
        self.transact_write(SwdOp::DpWrite(R::ADDRESS), value.into())
    }

    /// Read a Debug Port register
    pub fn read_dp_register<R>(&mut self) -> Result<R, SwdError>
    where
        R: DpRegister + From<u32>,
    {
        let raw = self.transact_read(SwdOp::DpRead(R::ADDRESS))?;
        Ok(R::from(raw))
    }

    /// Write an Access Port register
    ///
    /// Requires the debug domain to be powered up.  Keeps the MEM-AP
    /// shadows coherent when CSW or TAR are written this way.
    pub fn write_ap_register<R>(&mut self, value: R) -> Result<(), SwdError>
    where
        R: ApRegister + Into<u32>,
    {
        self.check_powered()?;

        let raw: u32 = value.into();
        self.transact_write(SwdOp::ApWrite(R::ADDRESS), raw)?;

        if R::ADDRESS == Csw::ADDRESS {
            self.csw_shadow = Some(Csw::from(raw));
        } else if R::ADDRESS == Tar::ADDRESS {
            self.tar_shadow = Some(raw);
        }

        Ok(())
    }

    /// Read an Access Port register
    ///
    /// AP reads are posted: the read is issued, its value discarded, and
    /// the actual result fetched from DP RDBUFF.
    pub fn read_ap_register<R>(&mut self) -> Result<R, SwdError>
    where
        R: ApRegister + From<u32>,
    {
        self.check_powered()?;

        let _ = self.transact_read(SwdOp::ApRead(R::ADDRESS))?;
        let raw = self.transact_read(SwdOp::DpRead(RdBuff::ADDRESS))?;
        Ok(R::from(raw))
    }

    /// Reads a 32-bit value from the target's memory at the specified
    /// address.
    ///
    /// The address can be RAM, flash, or any other memory-mapped location
    /// in the target's address space, such as the core debug registers.
    pub fn mem_read(&mut self, addr: u32) -> Result<u32, SwdError> {
        self.check_powered()?;

        self.ensure_csw(Csw::ADDRINC_OFF)?;
        self.ensure_tar(addr)?;

        // The DRW read is posted: it initiates the fetch, and returns the
        // result of the previous AP read.  Discard it and collect the
        // value from RDBUFF.
        let _ = self.ap_read(Drw::ADDRESS)?;
        self.dp_read(RdBuff::ADDRESS)
    }

    /// Writes a 32-bit value to the target's memory at the specified
    /// address.
    pub fn mem_write(&mut self, addr: u32, data: u32) -> Result<(), SwdError> {
        self.check_powered()?;

        self.ensure_csw(Csw::ADDRINC_OFF)?;
        self.ensure_tar(addr)?;

        self.ap_write(Drw::ADDRESS, data)
    }

    /// Reads a block of words from the target device using auto-increment,
    /// re-issuing TAR at every 1KiB boundary.
    ///
    /// On failure the `usize` is the number of words read successfully, so
    /// the number of valid values in `buf`.
    pub fn mem_read_bulk(&mut self, addr: u32, buf: &mut [u32]) -> Result<(), (SwdError, usize)> {
        self.check_powered().map_err(|e| (e, 0))?;
        if addr & 0x3 != 0 {
            info!("Error: Attempt to read on non-4 byte boundary");
            return Err((SwdError::Api, 0));
        }
        if buf.is_empty() {
            return Ok(());
        }

        self.ensure_csw(Csw::ADDRINC_SINGLE).map_err(|e| (e, 0))?;

        let mut remaining = buf;
        let mut current_addr = addr;
        let mut total_read = 0;

        while !remaining.is_empty() {
            // Words before the 1KiB boundary
            let boundary_offset = SWD_MEMORY_BOUNDARY - (current_addr & (SWD_MEMORY_BOUNDARY - 1));
            let max_words = (boundary_offset / 4) as usize;
            let chunk_size = remaining.len().min(max_words);

            // Auto-increment advances TAR behind our back
            self.tar_shadow = None;
            self.ap_write(Tar::ADDRESS, current_addr)
                .map_err(|e| (e, total_read))?;

            let (chunk, rest) = remaining.split_at_mut(chunk_size);

            // The first DRW read returns the previous fetch - discard it
            let _ = self
                .ap_read(Drw::ADDRESS)
                .map_err(|e| (e, total_read))?;

            // Each subsequent read returns the value for the previous
            // address
            let count = chunk.len();
            for item in chunk.iter_mut().take(count - 1) {
                *item = self
                    .ap_read(Drw::ADDRESS)
                    .map_err(|e| (e, total_read))?;
                total_read += 1;
            }

            // The final value is sitting in RDBUFF
            chunk[count - 1] = self
                .dp_read(RdBuff::ADDRESS)
                .map_err(|e| (e, total_read))?;
            total_read += 1;

            remaining = rest;
            current_addr += (chunk_size * 4) as u32;
        }

        Ok(())
    }

    /// Writes a block of words to the target device using auto-increment,
    /// re-issuing TAR at every 1KiB boundary.
    ///
    /// On failure the `usize` is the number of words written successfully.
    pub fn mem_write_bulk(&mut self, addr: u32, buf: &[u32]) -> Result<(), (SwdError, usize)> {
        self.check_powered().map_err(|e| (e, 0))?;
        if addr & 0x3 != 0 {
            info!("Error: Attempt to write on non-4 byte boundary");
            return Err((SwdError::Api, 0));
        }

        self.ensure_csw(Csw::ADDRINC_SINGLE).map_err(|e| (e, 0))?;

        let mut remaining = buf;
        let mut current_addr = addr;
        let mut total_written = 0;

        while !remaining.is_empty() {
            // Words before the 1KiB boundary
            let boundary_offset = SWD_MEMORY_BOUNDARY - (current_addr & (SWD_MEMORY_BOUNDARY - 1));
            let max_words = (boundary_offset / 4) as usize;
            let chunk_size = remaining.len().min(max_words);

            // Auto-increment advances TAR behind our back
            self.tar_shadow = None;
            self.ap_write(Tar::ADDRESS, current_addr)
                .map_err(|e| (e, total_written))?;

            let (chunk, rest) = remaining.split_at(chunk_size);
            for &word in chunk {
                self.ap_write(Drw::ADDRESS, word)
                    .map_err(|e| (e, total_written))?;
                total_written += 1;
            }

            remaining = rest;
            current_addr += (chunk_size * 4) as u32;
        }

        Ok(())
    }
}

// Internal functions
impl<B: SwdBus> SwdInterface<B> {
    fn check_powered(&self) -> Result<(), SwdError> {
        if !self.powered_up {
            debug!("Attempt to perform SWD action before initialization");
            return Err(SwdError::NotReady);
        }
        Ok(())
    }

    /// Rewrite CSW if the shadow doesn't match the wanted increment mode
    fn ensure_csw(&mut self, addrinc: u32) -> Result<(), SwdError> {
        let mut csw = Csw::default();
        csw.set_addrinc(addrinc);

        if self.csw_shadow != Some(csw) {
            trace!("Exec:  Update CSW {csw}");
            self.ap_write(Csw::ADDRESS, csw.into())?;
            self.csw_shadow = Some(csw);
        }
        Ok(())
    }

    /// Rewrite TAR if the shadow doesn't match the wanted address
    fn ensure_tar(&mut self, addr: u32) -> Result<(), SwdError> {
        if self.tar_shadow != Some(addr) {
            self.ap_write(Tar::ADDRESS, addr)?;
            self.tar_shadow = Some(addr);
        }
        Ok(())
    }

    fn dp_read(&mut self, addr: u8) -> Result<u32, SwdError> {
        self.transact_read(SwdOp::DpRead(addr))
    }

    fn ap_read(&mut self, addr: u8) -> Result<u32, SwdError> {
        self.transact_read(SwdOp::ApRead(addr))
    }

    fn ap_write(&mut self, addr: u8, data: u32) -> Result<(), SwdError> {
        self.transact_write(SwdOp::ApWrite(addr), data)
    }

    // Lowest level read operation, with the WAIT retry loop
    fn transact_read(&mut self, op: SwdOp) -> Result<u32, SwdError> {
        trace!("Exec:  {op}");

        let mut attempt = 0;
        let result = loop {
            match self.protocol.read_transaction(op) {
                Err(SwdError::WaitAck) => trace!("Wait:  {op}"),
                other => break other,
            }

            attempt += 1;
            if attempt > self.wait_retries {
                break Err(SwdError::WaitAck);
            } else {
                trace!("Retry: {op} {attempt}");
            }
        };

        match &result {
            Ok(data) => trace!("OK:    {op} {data:#010X}"),
            Err(e) => debug!("Error: {op} {e:?}"),
        }

        result
    }

    // Lowest level write operation, with the WAIT retry loop
    fn transact_write(&mut self, op: SwdOp, data: u32) -> Result<(), SwdError> {
        trace!("Exec:  {op} {data:#010X}");

        let mut attempt = 0;
        let result = loop {
            match self.protocol.write_transaction(op, data) {
                Err(SwdError::WaitAck) => trace!("Wait:  {op}"),
                other => break other,
            }

            attempt += 1;
            if attempt > self.wait_retries {
                break Err(SwdError::WaitAck);
            } else {
                trace!("Retry: {op} {attempt}");
            }
        };

        match &result {
            Ok(()) => trace!("OK:    {op}"),
            Err(e) => debug!("Error: {op} {data:#010X}: {e:?}"),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimOp, SimTarget};

    fn connected() -> SwdInterface<SimTarget> {
        let mut swd = SwdInterface::from_bus(SimTarget::new());
        swd.initialize_swd();
        swd.setup_dp_and_mem_ap().unwrap();
        swd.bus_mut().clear_ops();
        swd
    }

    #[test]
    fn link_bring_up_sequence() {
        let mut swd = SwdInterface::from_bus(SimTarget::new());
        swd.initialize_swd();
        let idcode = swd.setup_dp_and_mem_ap().unwrap();

        assert_eq!(idcode.data(), 0x2BA01477);
        assert!(swd.is_connected());
        assert_eq!(
            swd.bus().ops(),
            &[
                SimOp::ResetHigh,
                SimOp::JtagToSwd,
                SimOp::ResetHigh,
                SimOp::ResetLow,
                SimOp::DpRead(0x0),
                SimOp::DpWrite(0x4, 0x50000000),
                SimOp::DpRead(0x4),
                SimOp::DpWrite(0x8, 0x00000000),
                SimOp::ApWrite(0x0, 0x22000002),
            ]
        );
        assert_eq!(swd.bus().csw(), 0x22000002);
    }

    #[test]
    fn fault_during_bring_up_stops_immediately() {
        let mut swd = SwdInterface::from_bus(SimTarget::new());
        swd.bus_mut().fault_once(false, false, 0x4);

        swd.initialize_swd();
        assert_eq!(swd.setup_dp_and_mem_ap(), Err(SwdError::FaultAck));
        assert!(!swd.is_connected());

        // Nothing was attempted after the faulting CTRL/STAT write
        assert_eq!(swd.bus().ops().last(), Some(&SimOp::FaultAcked));
        assert!(
            !swd.bus()
                .ops()
                .iter()
                .any(|op| matches!(op, SimOp::ApWrite(..)))
        );
    }

    #[test]
    fn not_ready_before_bring_up() {
        let mut swd = SwdInterface::from_bus(SimTarget::new());
        assert_eq!(swd.mem_read(0x2000_0000), Err(SwdError::NotReady));
        assert_eq!(swd.mem_write(0x2000_0000, 0), Err(SwdError::NotReady));
    }

    #[test]
    fn mem_write_then_read_round_trip() {
        let mut swd = connected();

        swd.mem_write(0x2000_0000, 0xDEADBEEF).unwrap();
        assert_eq!(swd.bus().peek(0x2000_0000), 0xDEADBEEF);
        assert_eq!(swd.mem_read(0x2000_0000).unwrap(), 0xDEADBEEF);
    }

    #[test]
    fn posted_read_law() {
        let mut swd = connected();
        swd.bus_mut().poke(0x2000_0000, 0x11111111);
        swd.bus_mut().poke(0x2000_0004, 0x22222222);

        assert_eq!(swd.mem_read(0x2000_0000).unwrap(), 0x11111111);
        assert_eq!(swd.mem_read(0x2000_0004).unwrap(), 0x22222222);

        // CSW already matched the shadow, so: TAR, DRW (discard), RDBUFF,
        // then the same again for the second address
        assert_eq!(
            swd.bus().ops(),
            &[
                SimOp::ApWrite(0x4, 0x2000_0000),
                SimOp::ApRead(0xC),
                SimOp::DpRead(0xC),
                SimOp::ApWrite(0x4, 0x2000_0004),
                SimOp::ApRead(0xC),
                SimOp::DpRead(0xC),
            ]
        );
    }

    #[test]
    fn repeated_read_elides_tar_write() {
        let mut swd = connected();
        swd.bus_mut().poke(0x2000_0000, 7);

        swd.mem_read(0x2000_0000).unwrap();
        swd.bus_mut().clear_ops();
        swd.mem_read(0x2000_0000).unwrap();

        // Same address again: no CSW write, no TAR write
        assert_eq!(swd.bus().ops(), &[SimOp::ApRead(0xC), SimOp::DpRead(0xC)]);
    }

    #[test]
    fn write_stream_op_sequence() {
        let mut swd = connected();

        swd.mem_write_bulk(0x2000_0000, &[0x10, 0x20, 0x30, 0x40])
            .unwrap();

        // One CSW write (shadow differed), one TAR write, four DRW writes
        assert_eq!(
            swd.bus().ops(),
            &[
                SimOp::ApWrite(0x0, 0x22000012),
                SimOp::ApWrite(0x4, 0x2000_0000),
                SimOp::ApWrite(0xC, 0x10),
                SimOp::ApWrite(0xC, 0x20),
                SimOp::ApWrite(0xC, 0x30),
                SimOp::ApWrite(0xC, 0x40),
            ]
        );
        for (i, value) in [0x10u32, 0x20, 0x30, 0x40].iter().enumerate() {
            assert_eq!(swd.bus().peek(0x2000_0000 + 4 * i as u32), *value);
        }
    }

    #[test]
    fn write_stream_reissues_tar_at_1k_boundary() {
        let mut swd = connected();

        swd.mem_write_bulk(0x2000_03F8, &[1, 2, 3, 4, 5]).unwrap();

        assert_eq!(
            swd.bus().ops(),
            &[
                SimOp::ApWrite(0x0, 0x22000012),
                SimOp::ApWrite(0x4, 0x2000_03F8),
                SimOp::ApWrite(0xC, 1),
                SimOp::ApWrite(0xC, 2),
                SimOp::ApWrite(0x4, 0x2000_0400),
                SimOp::ApWrite(0xC, 3),
                SimOp::ApWrite(0xC, 4),
                SimOp::ApWrite(0xC, 5),
            ]
        );
        assert_eq!(swd.bus().peek(0x2000_03F8), 1);
        assert_eq!(swd.bus().peek(0x2000_03FC), 2);
        assert_eq!(swd.bus().peek(0x2000_0400), 3);
        assert_eq!(swd.bus().peek(0x2000_0404), 4);
        assert_eq!(swd.bus().peek(0x2000_0408), 5);
    }

    #[test]
    fn read_stream_round_trip() {
        let mut swd = connected();
        let words = [0xAAu32, 0xBB, 0xCC, 0xDD, 0xEE];
        for (i, w) in words.iter().enumerate() {
            swd.bus_mut().poke(0x2000_0100 + 4 * i as u32, *w);
        }

        let mut buf = [0u32; 5];
        swd.mem_read_bulk(0x2000_0100, &mut buf).unwrap();
        assert_eq!(buf, words);
    }

    #[test]
    fn read_stream_crosses_1k_boundary() {
        let mut swd = connected();
        for i in 0..8u32 {
            swd.bus_mut().poke(0x2000_03F0 + 4 * i, i + 1);
        }

        let mut buf = [0u32; 8];
        swd.mem_read_bulk(0x2000_03F0, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn unaligned_bulk_rejected() {
        let mut swd = connected();
        assert_eq!(
            swd.mem_write_bulk(0x2000_0001, &[1]),
            Err((SwdError::Api, 0))
        );
        let mut buf = [0u32; 1];
        assert_eq!(
            swd.mem_read_bulk(0x2000_0002, &mut buf),
            Err((SwdError::Api, 0))
        );
    }

    #[test]
    fn wait_retried_then_succeeds() {
        let mut swd = connected();
        swd.bus_mut().poke(0x2000_0000, 0xCAFED00D);

        // WAIT on the first two DRW reads, OK on the third
        swd.bus_mut().queue_wait(true, true, 0xC, 2);
        assert_eq!(swd.mem_read(0x2000_0000).unwrap(), 0xCAFED00D);
    }

    #[test]
    fn wait_surfaced_after_retry_cap() {
        let mut swd = connected();
        swd.set_wait_retries(3);

        swd.bus_mut().queue_wait(true, true, 0xC, 10);
        assert_eq!(swd.mem_read(0x2000_0000), Err(SwdError::WaitAck));
    }

    #[test]
    fn reinit_invalidates_shadows() {
        let mut swd = connected();
        swd.mem_write(0x2000_0000, 1).unwrap();

        swd.initialize_swd();
        swd.setup_dp_and_mem_ap().unwrap();
        swd.bus_mut().clear_ops();

        // CSW shadow was reset by setup (ADDRINC_OFF), TAR is unknown, so
        // the next read rewrites TAR but not CSW
        swd.mem_read(0x2000_0000).unwrap();
        assert_eq!(
            swd.bus().ops(),
            &[
                SimOp::ApWrite(0x4, 0x2000_0000),
                SimOp::ApRead(0xC),
                SimOp::DpRead(0xC),
            ]
        );
    }
}
