//! Raspberry Pi Pico W board wiring
//!
//! | Function            | Pin            |
//! |---------------------|----------------|
//! | RTC SDA / SCL       | GP4 / GP5 (I2C0) |
//! | 74HC595 SER / SRCLK | GP19 / GP18 (SPI0) |
//! | 74HC595 RCLK        | GP17           |
//! | CYW43 PWR / CS      | GP23 / GP25    |
//! | CYW43 DIO / CLK     | GP24 / GP29 (PIO0) |

use embassy_rp::gpio::Output;
use embassy_rp::i2c::{self, I2c};
use embassy_rp::peripherals::{I2C0, SPI0};
use embassy_rp::spi::{self, Spi};

use tickertube_core::App;
use tickertube_drivers::bus::{HalI2c, HalOutputPin, HalSpi};
use tickertube_drivers::shift_register::Hc595Chain;
use tickertube_hal::i2c::BlockingI2c;

use crate::fetch::ChannelFetch;

/// 74HC595 shift clock
pub const SHIFT_REGISTER_SPI_HZ: u32 = 1_000_000;

/// RTC bus: blocking I2C0 behind the submit-then-poll adapter
pub type RtcBus = BlockingI2c<HalI2c<I2c<'static, I2C0, i2c::Blocking>>>;

/// Tube driver chain on SPI0 with a GPIO latch
pub type TubeChain = Hc595Chain<HalSpi<Spi<'static, SPI0, spi::Blocking>>, HalOutputPin<Output<'static>>>;

/// The application as wired on this board
pub type TickertubeApp = App<RtcBus, ChannelFetch, TubeChain>;
