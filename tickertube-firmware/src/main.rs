//! Tickertube - Nixie Tube Ticker Firmware
//!
//! Main firmware binary for the Raspberry Pi Pico W. Fetches a number over
//! HTTP and shows it on a row of IN-12 nixie tubes through a 74HC595 chain,
//! while keeping wall-clock time in an MCP7940N RTC.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::i2c::{self, I2c};
use embassy_rp::peripherals::PIO0;
use embassy_rp::pio::InterruptHandler as PioInterruptHandler;
use embassy_rp::spi::{self, Spi};
use {defmt_rtt as _, panic_probe as _};

use tickertube_core::App;
use tickertube_drivers::bus::{HalI2c, HalOutputPin, HalSpi};
use tickertube_drivers::shift_register::Hc595Chain;
use tickertube_hal::i2c::BlockingI2c;

use crate::board::SHIFT_REGISTER_SPI_HZ;
use crate::fetch::ChannelFetch;
use crate::tasks::wifi::{self, WifiPins};

mod board;
mod channels;
mod config;
mod fetch;
mod tasks;

bind_interrupts!(pub struct Irqs {
    PIO0_IRQ_0 => PioInterruptHandler<PIO0>;
});

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Tickertube firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = config::load_config();

    // RTC on I2C0 (SDA GP4, SCL GP5)
    let mut i2c_config = i2c::Config::default();
    i2c_config.frequency = config.rtc.i2c_frequency;
    let i2c = I2c::new_blocking(p.I2C0, p.PIN_5, p.PIN_4, i2c_config);
    let rtc_bus = BlockingI2c::new(HalI2c::new(i2c));
    info!("I2C initialized for RTC at {} Hz", config.rtc.i2c_frequency);

    // 74HC595 chain on SPI0 (SRCLK GP18, SER GP19, RCLK GP17)
    let mut spi_config = spi::Config::default();
    spi_config.frequency = SHIFT_REGISTER_SPI_HZ;
    let spi = Spi::new_blocking_txonly(p.SPI0, p.PIN_18, p.PIN_19, spi_config);
    let latch = Output::new(p.PIN_17, Level::Low);
    let tubes = Hc595Chain::new(HalSpi::new(spi), HalOutputPin::new(latch));
    info!("SPI initialized for shift registers");

    let app = match App::new(&config, rtc_bus, ChannelFetch, tubes) {
        Ok(app) => app,
        // Only reachable with a configuration build.rs did not vet
        Err(e) => defmt::panic!("Invalid wiring: {}", e),
    };

    // Start the tick loop before the network so the RTC comes up right away
    unwrap!(spawner.spawn(tasks::app_task(app, config.display.fetch_interval_s)));

    let pins = WifiPins {
        pwr: p.PIN_23,
        cs: p.PIN_25,
        dio: p.PIN_24,
        clk: p.PIN_29,
        pio: p.PIO0,
        dma: p.DMA_CH0,
    };
    let stack = wifi::bring_up(spawner, pins, &config.network).await;

    unwrap!(spawner.spawn(tasks::http_task(stack)));
    info!("All tasks spawned");
}
