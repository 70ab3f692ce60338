//! Application root
//!
//! [`App`] owns the RTC sequencer and the display pipeline and is driven
//! by one periodic tick. Transports are injected at construction, so the
//! same type runs on the board and against mocks on the host.
//!
//! On the first ticks the app brings the RTC up as configured: start the
//! oscillator, enable battery switchover, then read the time once.

use tickertube_drivers::rtc::{DateTime, Mcp7940n, RtcError};
use tickertube_hal::fetch::FetchTransport;
use tickertube_hal::i2c::I2cTransport;
use tickertube_hal::shift_register::ShiftRegisterTransport;

use crate::config::types::{AppConfig, RtcConfig};
use crate::config::wiring::WiringError;
use crate::display::DisplayPipeline;

/// RTC bring-up progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootStep {
    /// Set ST if configured
    StartOscillator,
    /// Set VBATEN if configured
    EnableBatteryBackup,
    /// Issue the first date-time read
    ReadDateTime,
    /// Log the result of the first read
    ReportDateTime,
    /// Bring-up finished
    Done,
}

/// Tickertube application
pub struct App<T, F, S> {
    rtc: Mcp7940n<T>,
    display: DisplayPipeline<F, S>,
    rtc_config: RtcConfig,
    boot: BootStep,
}

impl<T, F, S> App<T, F, S>
where
    T: I2cTransport,
    F: FetchTransport,
    S: ShiftRegisterTransport,
{
    /// Build the application from configuration and opened transports
    pub fn new(config: &AppConfig, i2c: T, fetch: F, shift: S) -> Result<Self, WiringError> {
        Ok(Self {
            rtc: Mcp7940n::new(i2c),
            display: DisplayPipeline::from_config(&config.display, fetch, shift)?,
            rtc_config: config.rtc,
            boot: BootStep::StartOscillator,
        })
    }

    /// Run one scheduler tick
    ///
    /// Polls the RTC, continues bring-up while it is idle, then polls the
    /// display. Never blocks.
    pub fn tick(&mut self) {
        self.rtc.poll();
        self.advance_boot();
        self.display.poll();
    }

    /// RTC bring-up progress
    pub fn boot_step(&self) -> BootStep {
        self.boot
    }

    /// RTC sequencer
    pub fn rtc(&self) -> &Mcp7940n<T> {
        &self.rtc
    }

    /// RTC sequencer, for issuing operations
    pub fn rtc_mut(&mut self) -> &mut Mcp7940n<T> {
        &mut self.rtc
    }

    /// Display pipeline
    pub fn display(&self) -> &DisplayPipeline<F, S> {
        &self.display
    }

    /// Display pipeline, for starting cycles
    pub fn display_mut(&mut self) -> &mut DisplayPipeline<F, S> {
        &mut self.display
    }

    /// Last date and time read from the RTC
    pub fn date_time(&self) -> Result<DateTime, RtcError> {
        self.rtc.date_time()
    }

    fn advance_boot(&mut self) {
        // Skipped steps fall through to the next one in the same tick
        while !self.rtc.is_busy() {
            let (next, result) = match self.boot {
                BootStep::StartOscillator => (
                    BootStep::EnableBatteryBackup,
                    self.rtc_config
                        .start_oscillator
                        .then(|| self.rtc.enable_oscillator(true)),
                ),
                BootStep::EnableBatteryBackup => (
                    BootStep::ReadDateTime,
                    self.rtc_config
                        .enable_battery_backup
                        .then(|| self.rtc.enable_battery_backup(true)),
                ),
                BootStep::ReadDateTime => {
                    (BootStep::ReportDateTime, Some(self.rtc.read_date_time()))
                }
                BootStep::ReportDateTime => {
                    match self.rtc.date_time() {
                        Ok(now) => info!("RTC time {}", now),
                        Err(e) => warn!("RTC time unavailable: {}", e),
                    }
                    self.boot = BootStep::Done;
                    return;
                }
                BootStep::Done => return,
            };

            self.boot = next;
            match result {
                None => continue,
                Some(Ok(())) => return,
                Some(Err(e)) => {
                    warn!("RTC bring-up step failed: {}", e);
                    return;
                }
            }
        }
    }
}
