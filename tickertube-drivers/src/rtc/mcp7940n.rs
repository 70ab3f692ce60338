//! MCP7940N real-time clock (I2C)
//!
//! The sequencer never blocks. Every public operation stages the transmit
//! buffer, records what has to happen once the bus transaction finishes,
//! submits exactly one transfer and returns. [`Mcp7940n::poll`] is called
//! from the periodic tick; it checks the transfer and, for multi-step
//! operations, issues the follow-up transfer.
//!
//! # Sequences
//!
//! | Operation                 | Transfers                                   |
//! |---------------------------|---------------------------------------------|
//! | oscillator on/off         | read RTCSEC, write RTCSEC with ST changed   |
//! | battery backup on/off     | read RTCWKDAY, write RTCWKDAY with VBATEN   |
//! | status query              | read one register                           |
//! | read date-time            | read 7 registers from RTCSEC                |
//! | write date-time           | read 7 registers, write 7 registers         |
//! | register / burst access   | one read or one write                       |
//!
//! Read-modify-write keeps every bit the operation does not own.

use tickertube_hal::i2c::{BusError, I2cTransport, TransferHandle, TransferStatus};

use super::datetime::{DateTime, DATE_TIME_REGISTERS};

/// Fixed 7-bit bus address of the RTCC block
pub const ADDRESS: u8 = 0x6F;

/// Bytes the register cache holds; one burst transfer moves at most this many
///
/// Covers the whole RTCC register map (timekeeping, control, alarms and
/// power-fail stamps).
pub const REGISTER_CACHE_SIZE: usize = 32;

/// MCP7940N register addresses
pub mod reg {
    /// Seconds + oscillator start bit
    pub const RTCSEC: u8 = 0x00;
    /// Minutes
    pub const RTCMIN: u8 = 0x01;
    /// Hours + 12/24 select
    pub const RTCHOUR: u8 = 0x02;
    /// Day of week + OSCRUN, PWRFAIL, VBATEN
    pub const RTCWKDAY: u8 = 0x03;
    /// Day of month
    pub const RTCDATE: u8 = 0x04;
    /// Month + leap year flag
    pub const RTCMTH: u8 = 0x05;
    /// Year
    pub const RTCYEAR: u8 = 0x06;
    /// Control (MFP, square wave, alarm enables)
    pub const CONTROL: u8 = 0x07;
    /// Digital trim
    pub const OSCTRIM: u8 = 0x08;
}

/// Register bit flags
pub mod bits {
    /// RTCSEC: start oscillator
    pub const ST: u8 = 1 << 7;
    /// RTCWKDAY: oscillator running (read-only)
    pub const OSCRUN: u8 = 1 << 5;
    /// RTCWKDAY: primary power lost
    pub const PWRFAIL: u8 = 1 << 4;
    /// RTCWKDAY: external battery switchover enabled
    pub const VBATEN: u8 = 1 << 3;
    /// RTCMTH: leap year (read-only)
    pub const LPYR: u8 = 1 << 5;
}

/// Sequencer state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RtcState {
    /// Nothing in flight
    Idle,
    /// Last transfer failed; any new operation clears this
    Error,
    /// A transfer has been submitted and is being polled
    AwaitingTransfer,
}

/// Work to do once the in-flight transfer completes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RtcTask {
    /// Set ST in the fetched RTCSEC and write it back
    EnableOscillator,
    /// Clear ST in the fetched RTCSEC and write it back
    DisableOscillator,
    /// Report ST from the fetched RTCSEC
    QueryOscillatorStatus,
    /// Set VBATEN in the fetched RTCWKDAY and write it back
    EnableBatteryBackup,
    /// Clear VBATEN in the fetched RTCWKDAY and write it back
    DisableBatteryBackup,
    /// Report VBATEN from the fetched RTCWKDAY
    QueryBatteryStatus,
    /// Decode the fetched timekeeping registers
    ConvertDateTimeFromBcd,
    /// Merge the staged date-time into the fetched registers and write them
    ConvertDateTimeToBcdAndTransmit,
}

/// RTC operation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RtcError {
    /// A sequence is still in flight
    Busy,
    /// The transport refused the transfer
    Bus(BusError),
    /// Burst length is zero or larger than [`REGISTER_CACHE_SIZE`]
    InvalidLength,
    /// Date-time field outside its calendar range
    InvalidDateTime,
    /// The requested result has not been produced (yet)
    NoResult,
}

impl From<BusError> for RtcError {
    fn from(e: BusError) -> Self {
        RtcError::Bus(e)
    }
}

/// MCP7940N register-access sequencer
pub struct Mcp7940n<T> {
    transport: T,
    state: RtcState,
    pending_task: Option<RtcTask>,
    /// Register address followed by payload
    transmit_buffer: [u8; REGISTER_CACHE_SIZE + 1],
    register_cache: [u8; REGISTER_CACHE_SIZE],
    /// Bytes of `register_cache` filled by the last receive
    received: usize,
    active_transfer: Option<TransferHandle>,
    date_time_scratch: DateTime,
    date_time: Option<DateTime>,
    oscillator_enabled: Option<bool>,
    battery_backup_enabled: Option<bool>,
}

impl<T: I2cTransport> Mcp7940n<T> {
    /// Create a sequencer on an opened transport
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            state: RtcState::Idle,
            pending_task: None,
            transmit_buffer: [0; REGISTER_CACHE_SIZE + 1],
            register_cache: [0; REGISTER_CACHE_SIZE],
            received: 0,
            active_transfer: None,
            date_time_scratch: DateTime::default(),
            date_time: None,
            oscillator_enabled: None,
            battery_backup_enabled: None,
        }
    }

    /// Current state
    pub fn state(&self) -> RtcState {
        self.state
    }

    /// Follow-up work recorded for the in-flight transfer
    pub fn pending_task(&self) -> Option<RtcTask> {
        self.pending_task
    }

    /// True while a transfer is in flight
    ///
    /// `Error` does not count as busy.
    pub fn is_busy(&self) -> bool {
        self.state == RtcState::AwaitingTransfer
    }

    /// Bytes delivered by the most recent receive
    pub fn registers(&self) -> &[u8] {
        &self.register_cache[..self.received]
    }

    /// Date and time decoded by the last completed [`Mcp7940n::read_date_time`]
    pub fn date_time(&self) -> Result<DateTime, RtcError> {
        self.date_time.ok_or(RtcError::NoResult)
    }

    /// ST bit reported by the last completed [`Mcp7940n::oscillator_status`]
    pub fn oscillator_enabled(&self) -> Result<bool, RtcError> {
        self.oscillator_enabled.ok_or(RtcError::NoResult)
    }

    /// VBATEN bit reported by the last completed [`Mcp7940n::battery_backup_status`]
    pub fn battery_backup_enabled(&self) -> Result<bool, RtcError> {
        self.battery_backup_enabled.ok_or(RtcError::NoResult)
    }

    /// Get access to the transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get mutable access to the transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Start reading the timekeeping registers
    ///
    /// The decoded value is available from [`Mcp7940n::date_time`] once the
    /// sequencer is idle again.
    pub fn read_date_time(&mut self) -> Result<(), RtcError> {
        self.ensure_ready()?;
        debug!("begin reading date and time");
        self.date_time = None;
        self.transmit_buffer[0] = reg::RTCSEC;
        self.pending_task = Some(RtcTask::ConvertDateTimeFromBcd);
        self.issue_read(DATE_TIME_REGISTERS)
    }

    /// Start writing a new date and time
    ///
    /// The timekeeping registers are read first so the flag bits sharing
    /// them (ST, VBATEN, ...) are written back unchanged. Out-of-range
    /// fields are rejected before anything is sent.
    pub fn write_date_time(&mut self, date_time: &DateTime) -> Result<(), RtcError> {
        self.ensure_ready()?;
        if !date_time.is_valid() {
            warn!("rejected invalid date and time {}", date_time);
            return Err(RtcError::InvalidDateTime);
        }
        debug!("begin writing date and time");
        self.date_time_scratch = *date_time;
        self.transmit_buffer[0] = reg::RTCSEC;
        self.pending_task = Some(RtcTask::ConvertDateTimeToBcdAndTransmit);
        self.issue_read(DATE_TIME_REGISTERS)
    }

    /// Start or stop the oscillator
    pub fn enable_oscillator(&mut self, enable: bool) -> Result<(), RtcError> {
        self.ensure_ready()?;
        debug!("begin setting oscillator enabled={}", enable);
        self.transmit_buffer[0] = reg::RTCSEC;
        self.pending_task = Some(if enable {
            RtcTask::EnableOscillator
        } else {
            RtcTask::DisableOscillator
        });
        self.issue_read(1)
    }

    /// Start querying whether the oscillator is enabled
    pub fn oscillator_status(&mut self) -> Result<(), RtcError> {
        self.ensure_ready()?;
        debug!("begin querying oscillator status");
        self.oscillator_enabled = None;
        self.transmit_buffer[0] = reg::RTCSEC;
        self.pending_task = Some(RtcTask::QueryOscillatorStatus);
        self.issue_read(1)
    }

    /// Enable or disable switchover to the backup battery
    pub fn enable_battery_backup(&mut self, enable: bool) -> Result<(), RtcError> {
        self.ensure_ready()?;
        debug!("begin setting battery backup enabled={}", enable);
        self.transmit_buffer[0] = reg::RTCWKDAY;
        self.pending_task = Some(if enable {
            RtcTask::EnableBatteryBackup
        } else {
            RtcTask::DisableBatteryBackup
        });
        self.issue_read(1)
    }

    /// Start querying whether battery backup is enabled
    pub fn battery_backup_status(&mut self) -> Result<(), RtcError> {
        self.ensure_ready()?;
        debug!("begin querying battery backup status");
        self.battery_backup_enabled = None;
        self.transmit_buffer[0] = reg::RTCWKDAY;
        self.pending_task = Some(RtcTask::QueryBatteryStatus);
        self.issue_read(1)
    }

    /// Start reading one register into the cache
    pub fn read_register(&mut self, address: u8) -> Result<(), RtcError> {
        self.read_registers(address, 1)
    }

    /// Start writing one register
    pub fn write_register(&mut self, address: u8, value: u8) -> Result<(), RtcError> {
        self.write_registers(address, &[value])
    }

    /// Start reading `count` consecutive registers from `start`
    pub fn read_registers(&mut self, start: u8, count: usize) -> Result<(), RtcError> {
        self.ensure_ready()?;
        if count == 0 || count > REGISTER_CACHE_SIZE {
            return Err(RtcError::InvalidLength);
        }
        debug!("begin reading {} registers from {=u8:#x}", count, start);
        self.transmit_buffer[0] = start;
        self.pending_task = None;
        self.issue_read(count)
    }

    /// Start writing `values` to consecutive registers from `start`
    pub fn write_registers(&mut self, start: u8, values: &[u8]) -> Result<(), RtcError> {
        self.ensure_ready()?;
        if values.is_empty() || values.len() > REGISTER_CACHE_SIZE {
            return Err(RtcError::InvalidLength);
        }
        debug!("begin writing {} registers from {=u8:#x}", values.len(), start);
        self.transmit_buffer[0] = start;
        self.transmit_buffer[1..=values.len()].copy_from_slice(values);
        self.pending_task = None;
        self.issue_write(values.len() + 1)
    }

    /// Advance the in-flight sequence
    ///
    /// Does nothing unless a transfer is outstanding.
    pub fn poll(&mut self) {
        if self.state != RtcState::AwaitingTransfer {
            return;
        }

        let Some(handle) = self.active_transfer else {
            // Result already delivered on the previous poll
            self.state = RtcState::Idle;
            return;
        };

        let status = self
            .transport
            .status(handle, &mut self.register_cache[..self.received]);

        match status {
            TransferStatus::Pending => {}
            TransferStatus::Error(e) => {
                error!("transfer failed: {}", e);
                self.active_transfer = None;
                self.state = RtcState::Error;
            }
            TransferStatus::Complete => {
                trace!("transfer complete");
                self.active_transfer = None;
                self.on_transfer_complete();
            }
        }
    }

    fn on_transfer_complete(&mut self) {
        match self.pending_task {
            None => {
                self.state = RtcState::Idle;
            }
            Some(task @ (RtcTask::EnableOscillator | RtcTask::DisableOscillator)) => {
                let value = self.register_cache[0];
                debug!("RTCSEC before update: {=u8:#x}", value);
                self.transmit_buffer[0] = reg::RTCSEC;
                self.transmit_buffer[1] = if task == RtcTask::EnableOscillator {
                    value | bits::ST
                } else {
                    value & !bits::ST
                };
                if let Err(e) = self.issue_write(2) {
                    warn!("RTCSEC update not sent: {}", e);
                }
                self.pending_task = None;
            }
            Some(RtcTask::QueryOscillatorStatus) => {
                self.pending_task = None;
                let value = self.register_cache[0];
                debug!("RTCSEC: {=u8:#x}", value);
                self.oscillator_enabled = Some(value & bits::ST != 0);
            }
            Some(task @ (RtcTask::EnableBatteryBackup | RtcTask::DisableBatteryBackup)) => {
                let value = self.register_cache[0];
                debug!("RTCWKDAY before update: {=u8:#x}", value);
                self.transmit_buffer[0] = reg::RTCWKDAY;
                self.transmit_buffer[1] = if task == RtcTask::EnableBatteryBackup {
                    value | bits::VBATEN
                } else {
                    value & !bits::VBATEN
                };
                if let Err(e) = self.issue_write(2) {
                    warn!("RTCWKDAY update not sent: {}", e);
                }
                self.pending_task = None;
            }
            Some(RtcTask::QueryBatteryStatus) => {
                self.pending_task = None;
                let value = self.register_cache[0];
                debug!("RTCWKDAY: {=u8:#x}", value);
                self.battery_backup_enabled = Some(value & bits::VBATEN != 0);
            }
            Some(RtcTask::ConvertDateTimeFromBcd) => {
                self.pending_task = None;
                self.state = RtcState::Idle;
                let registers = self.timekeeping_registers();
                let date_time = DateTime::unpack(&registers);
                debug!("date and time read: {}", date_time);
                self.date_time = Some(date_time);
            }
            Some(RtcTask::ConvertDateTimeToBcdAndTransmit) => {
                self.pending_task = None;
                let mut registers = self.timekeeping_registers();
                debug!("timekeeping registers before update: {:#x}", registers);
                self.date_time_scratch.pack_into(&mut registers);
                self.register_cache[..DATE_TIME_REGISTERS].copy_from_slice(&registers);
                self.transmit_buffer[0] = reg::RTCSEC;
                self.transmit_buffer[1..=DATE_TIME_REGISTERS].copy_from_slice(&registers);
                if let Err(e) = self.issue_write(DATE_TIME_REGISTERS + 1) {
                    warn!("date and time not sent: {}", e);
                }
            }
        }
    }

    fn timekeeping_registers(&self) -> [u8; DATE_TIME_REGISTERS] {
        let mut registers = [0u8; DATE_TIME_REGISTERS];
        registers.copy_from_slice(&self.register_cache[..DATE_TIME_REGISTERS]);
        registers
    }

    fn ensure_ready(&self) -> Result<(), RtcError> {
        if self.is_busy() {
            warn!("operation rejected, transfer in flight");
            return Err(RtcError::Busy);
        }
        Ok(())
    }

    /// Submit a write of `len` bytes from the transmit buffer
    fn issue_write(&mut self, len: usize) -> Result<(), RtcError> {
        let result = self
            .transport
            .transmit(ADDRESS, &self.transmit_buffer[..len]);
        self.received = 0;
        self.track(result)
    }

    /// Submit the register address in the transmit buffer, then read `count` bytes
    fn issue_read(&mut self, count: usize) -> Result<(), RtcError> {
        let result = self
            .transport
            .transmit_then_receive(ADDRESS, &self.transmit_buffer[..1], count);
        self.received = count;
        self.track(result)
    }

    fn track(&mut self, result: Result<TransferHandle, BusError>) -> Result<(), RtcError> {
        match result {
            Ok(handle) => {
                self.active_transfer = Some(handle);
                self.state = RtcState::AwaitingTransfer;
                Ok(())
            }
            Err(e) => {
                error!("transport refused transfer: {}", e);
                self.active_transfer = None;
                self.state = RtcState::Error;
                Err(RtcError::Bus(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::Vec;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Transmit(Vec<u8, 40>),
        TransmitThenReceive(u8, usize),
    }

    /// Scripted transport backed by a simulated register file
    struct MockTransport {
        registers: [u8; 64],
        calls: Vec<Call, 16>,
        status_queries: usize,
        /// Answer `Pending` this many times before completing
        pending_polls: usize,
        fail_next_status: Option<BusError>,
        refuse_next: Option<BusError>,
        next_handle: u16,
        last_read: Option<(u8, usize)>,
    }

    impl MockTransport {
        fn new() -> Self {
            Self {
                registers: [0; 64],
                calls: Vec::new(),
                status_queries: 0,
                pending_polls: 0,
                fail_next_status: None,
                refuse_next: None,
                next_handle: 1,
                last_read: None,
            }
        }

        fn handle(&mut self) -> Result<TransferHandle, BusError> {
            if let Some(e) = self.refuse_next.take() {
                return Err(e);
            }
            let handle = TransferHandle::new(self.next_handle);
            self.next_handle += 1;
            Ok(handle)
        }
    }

    impl I2cTransport for MockTransport {
        fn transmit(&mut self, address: u8, data: &[u8]) -> Result<TransferHandle, BusError> {
            assert_eq!(address, ADDRESS);
            let handle = self.handle()?;
            let start = data[0] as usize;
            for (i, &byte) in data[1..].iter().enumerate() {
                self.registers[start + i] = byte;
            }
            self.calls
                .push(Call::Transmit(Vec::from_slice(data).unwrap()))
                .unwrap();
            self.last_read = None;
            Ok(handle)
        }

        fn transmit_then_receive(
            &mut self,
            address: u8,
            data: &[u8],
            rx_len: usize,
        ) -> Result<TransferHandle, BusError> {
            assert_eq!(address, ADDRESS);
            let handle = self.handle()?;
            self.calls
                .push(Call::TransmitThenReceive(data[0], rx_len))
                .unwrap();
            self.last_read = Some((data[0], rx_len));
            Ok(handle)
        }

        fn status(&mut self, _handle: TransferHandle, rx: &mut [u8]) -> TransferStatus {
            self.status_queries += 1;
            if self.pending_polls > 0 {
                self.pending_polls -= 1;
                return TransferStatus::Pending;
            }
            if let Some(e) = self.fail_next_status.take() {
                return TransferStatus::Error(e);
            }
            if let Some((start, len)) = self.last_read {
                let start = start as usize;
                rx[..len].copy_from_slice(&self.registers[start..start + len]);
            }
            TransferStatus::Complete
        }
    }

    fn rtc() -> Mcp7940n<MockTransport> {
        Mcp7940n::new(MockTransport::new())
    }

    fn run_to_idle(rtc: &mut Mcp7940n<MockTransport>) {
        for _ in 0..8 {
            if !rtc.is_busy() {
                return;
            }
            rtc.poll();
        }
        panic!("sequencer did not settle");
    }

    #[test]
    fn test_initial_state() {
        let rtc = rtc();
        assert_eq!(rtc.state(), RtcState::Idle);
        assert!(!rtc.is_busy());
        assert_eq!(rtc.date_time(), Err(RtcError::NoResult));
    }

    #[test]
    fn test_idle_poll_does_nothing() {
        let mut rtc = rtc();
        rtc.poll();
        rtc.poll();
        assert_eq!(rtc.state(), RtcState::Idle);
        assert!(rtc.transport().calls.is_empty());
        assert_eq!(rtc.transport().status_queries, 0);
    }

    #[test]
    fn test_enable_oscillator_sets_st_and_keeps_seconds() {
        let mut rtc = rtc();
        rtc.transport_mut().registers[reg::RTCSEC as usize] = 0x42;

        rtc.enable_oscillator(true).unwrap();
        assert_eq!(rtc.state(), RtcState::AwaitingTransfer);
        assert_eq!(rtc.pending_task(), Some(RtcTask::EnableOscillator));

        // Read completes, follow-up write issued
        rtc.poll();
        assert_eq!(rtc.pending_task(), None);
        assert_eq!(rtc.state(), RtcState::AwaitingTransfer);

        // Write completes
        rtc.poll();
        assert_eq!(rtc.state(), RtcState::Idle);

        let calls = &rtc.transport().calls;
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], Call::TransmitThenReceive(reg::RTCSEC, 1));
        assert_eq!(
            calls[1],
            Call::Transmit(Vec::from_slice(&[reg::RTCSEC, 0xC2]).unwrap())
        );
    }

    #[test]
    fn test_disable_oscillator_clears_st() {
        let mut rtc = rtc();
        rtc.transport_mut().registers[reg::RTCSEC as usize] = 0x80 | 0x15;

        rtc.enable_oscillator(false).unwrap();
        run_to_idle(&mut rtc);

        assert_eq!(rtc.transport().registers[reg::RTCSEC as usize], 0x15);
    }

    #[test]
    fn test_battery_backup_toggles_vbaten_only() {
        let mut rtc = rtc();
        rtc.transport_mut().registers[reg::RTCWKDAY as usize] = bits::OSCRUN | 0x05;

        rtc.enable_battery_backup(true).unwrap();
        run_to_idle(&mut rtc);
        assert_eq!(
            rtc.transport().registers[reg::RTCWKDAY as usize],
            bits::OSCRUN | bits::VBATEN | 0x05
        );

        rtc.enable_battery_backup(false).unwrap();
        run_to_idle(&mut rtc);
        assert_eq!(
            rtc.transport().registers[reg::RTCWKDAY as usize],
            bits::OSCRUN | 0x05
        );
    }

    #[test]
    fn test_status_query_settles_next_poll() {
        let mut rtc = rtc();
        rtc.transport_mut().registers[reg::RTCSEC as usize] = bits::ST;

        rtc.oscillator_status().unwrap();
        rtc.poll();
        assert_eq!(rtc.oscillator_enabled(), Ok(true));
        assert_eq!(rtc.pending_task(), None);
        assert_eq!(rtc.state(), RtcState::AwaitingTransfer);

        rtc.poll();
        assert_eq!(rtc.state(), RtcState::Idle);
        assert_eq!(rtc.transport().calls.len(), 1);
    }

    #[test]
    fn test_battery_status_query() {
        let mut rtc = rtc();
        rtc.transport_mut().registers[reg::RTCWKDAY as usize] = 0x02;

        rtc.battery_backup_status().unwrap();
        run_to_idle(&mut rtc);
        assert_eq!(rtc.battery_backup_enabled(), Ok(false));
    }

    #[test]
    fn test_read_date_time_decodes_immediately() {
        let mut rtc = rtc();
        rtc.transport_mut().registers[..7]
            .copy_from_slice(&[0xC5, 0x30, 0x21, 0x2B, 0x17, 0x29, 0x24]);

        rtc.read_date_time().unwrap();
        rtc.poll();

        assert_eq!(rtc.state(), RtcState::Idle);
        assert_eq!(
            rtc.date_time(),
            Ok(DateTime {
                seconds: 45,
                minutes: 30,
                hours: 21,
                day_of_week: 3,
                day: 17,
                month: 9,
                year: 24,
            })
        );
    }

    #[test]
    fn test_write_date_time_preserves_flags() {
        let mut rtc = rtc();
        // ST running, VBATEN set, LPYR set, stale time
        rtc.transport_mut().registers[..7]
            .copy_from_slice(&[0x80 | 0x11, 0x22, 0x03, 0x08 | 0x01, 0x01, 0x20 | 0x01, 0x00]);

        let dt = DateTime {
            seconds: 0,
            minutes: 59,
            hours: 23,
            day_of_week: 7,
            day: 31,
            month: 12,
            year: 99,
        };
        rtc.write_date_time(&dt).unwrap();
        assert_eq!(
            rtc.pending_task(),
            Some(RtcTask::ConvertDateTimeToBcdAndTransmit)
        );
        run_to_idle(&mut rtc);

        assert_eq!(
            &rtc.transport().registers[..7],
            &[0x80, 0x59, 0x23, 0x08 | 0x07, 0x31, 0x20 | 0x12, 0x99]
        );

        rtc.read_date_time().unwrap();
        run_to_idle(&mut rtc);
        assert_eq!(rtc.date_time(), Ok(dt));
    }

    #[test]
    fn test_write_date_time_rejects_out_of_range() {
        let mut rtc = rtc();
        let registers = [0x80 | 0x11, 0x22, 0x03, 0x08 | 0x01, 0x01, 0x01, 0x26];
        rtc.transport_mut().registers[..7].copy_from_slice(&registers);

        let bad = DateTime {
            seconds: 75,
            minutes: 0,
            hours: 45,
            day_of_week: 9,
            day: 40,
            month: 13,
            year: 99,
        };
        assert_eq!(rtc.write_date_time(&bad), Err(RtcError::InvalidDateTime));
        assert_eq!(
            rtc.write_date_time(&DateTime::default()),
            Err(RtcError::InvalidDateTime)
        );

        assert_eq!(rtc.state(), RtcState::Idle);
        assert_eq!(rtc.pending_task(), None);
        assert!(rtc.transport().calls.is_empty());
        assert_eq!(&rtc.transport().registers[..7], &registers);
    }

    #[test]
    fn test_refused_follow_up_write_enters_error() {
        let mut rtc = rtc();
        rtc.transport_mut().registers[0] = 0x42;

        rtc.enable_oscillator(true).unwrap();
        rtc.transport_mut().refuse_next = Some(BusError::ArbitrationLost);
        rtc.poll();

        assert_eq!(rtc.state(), RtcState::Error);
        assert_eq!(rtc.pending_task(), None);
        assert_eq!(rtc.transport().calls.len(), 1);
        assert_eq!(rtc.transport().registers[0], 0x42);
    }

    #[test]
    fn test_pending_transfer_keeps_waiting() {
        let mut rtc = rtc();
        rtc.transport_mut().pending_polls = 3;

        rtc.read_register(reg::CONTROL).unwrap();
        for _ in 0..3 {
            rtc.poll();
            assert!(rtc.is_busy());
        }
        rtc.poll();
        assert_eq!(rtc.state(), RtcState::Idle);
    }

    #[test]
    fn test_busy_rejects_every_operation() {
        let mut rtc = rtc();
        rtc.read_date_time().unwrap();
        let calls_before = rtc.transport().calls.len();

        assert_eq!(rtc.read_date_time(), Err(RtcError::Busy));
        assert_eq!(rtc.write_date_time(&DateTime::default()), Err(RtcError::Busy));
        assert_eq!(rtc.enable_oscillator(true), Err(RtcError::Busy));
        assert_eq!(rtc.oscillator_status(), Err(RtcError::Busy));
        assert_eq!(rtc.enable_battery_backup(true), Err(RtcError::Busy));
        assert_eq!(rtc.battery_backup_status(), Err(RtcError::Busy));
        assert_eq!(rtc.read_register(0), Err(RtcError::Busy));
        assert_eq!(rtc.write_register(0, 1), Err(RtcError::Busy));
        assert_eq!(rtc.read_registers(0, 2), Err(RtcError::Busy));
        assert_eq!(rtc.write_registers(0, &[1, 2]), Err(RtcError::Busy));

        assert_eq!(rtc.transport().calls.len(), calls_before);
        assert_eq!(rtc.pending_task(), Some(RtcTask::ConvertDateTimeFromBcd));
        assert_eq!(rtc.transmit_buffer[0], reg::RTCSEC);
    }

    #[test]
    fn test_bus_error_leaves_task_unconsumed() {
        let mut rtc = rtc();
        rtc.transport_mut().fail_next_status = Some(BusError::Nack);

        rtc.enable_battery_backup(true).unwrap();
        rtc.poll();

        assert_eq!(rtc.state(), RtcState::Error);
        assert!(!rtc.is_busy());
        assert_eq!(rtc.pending_task(), Some(RtcTask::EnableBatteryBackup));
        assert_eq!(rtc.transport().calls.len(), 1);

        // Error is sticky until a new operation is issued
        rtc.poll();
        assert_eq!(rtc.state(), RtcState::Error);

        rtc.oscillator_status().unwrap();
        assert_eq!(rtc.state(), RtcState::AwaitingTransfer);
        assert_eq!(rtc.pending_task(), Some(RtcTask::QueryOscillatorStatus));
    }

    #[test]
    fn test_refused_transfer_reports_bus_error() {
        let mut rtc = rtc();
        rtc.transport_mut().refuse_next = Some(BusError::Timeout);

        assert_eq!(
            rtc.read_date_time(),
            Err(RtcError::Bus(BusError::Timeout))
        );
        assert_eq!(rtc.state(), RtcState::Error);
    }

    #[test]
    fn test_burst_register_access() {
        let mut rtc = rtc();

        rtc.write_registers(0x20, &[1, 2, 3, 4]).unwrap();
        run_to_idle(&mut rtc);
        assert_eq!(&rtc.transport().registers[0x20..0x24], &[1, 2, 3, 4]);

        rtc.read_registers(0x21, 3).unwrap();
        run_to_idle(&mut rtc);
        assert_eq!(rtc.registers(), &[2, 3, 4]);
    }

    #[test]
    fn test_single_register_access() {
        let mut rtc = rtc();

        rtc.write_register(reg::OSCTRIM, 0x7A).unwrap();
        run_to_idle(&mut rtc);

        rtc.read_register(reg::OSCTRIM).unwrap();
        run_to_idle(&mut rtc);
        assert_eq!(rtc.registers(), &[0x7A]);
    }

    #[test]
    fn test_burst_length_bounds() {
        let mut rtc = rtc();
        let too_many = [0u8; REGISTER_CACHE_SIZE + 1];

        assert_eq!(rtc.read_registers(0, 0), Err(RtcError::InvalidLength));
        assert_eq!(
            rtc.read_registers(0, REGISTER_CACHE_SIZE + 1),
            Err(RtcError::InvalidLength)
        );
        assert_eq!(rtc.write_registers(0, &[]), Err(RtcError::InvalidLength));
        assert_eq!(rtc.write_registers(0, &too_many), Err(RtcError::InvalidLength));
        assert_eq!(rtc.state(), RtcState::Idle);
        assert!(rtc.transport().calls.is_empty());
    }
}
