//! Application tick loop
//!
//! Owns the [`TickertubeApp`] and drives it:
//! - one [`tickertube_core::App::tick`] per tick period
//! - a fetch cycle every `fetch_interval_s`, starting immediately

use defmt::*;
use embassy_time::{Duration, Instant, Ticker};

use tickertube_core::display::PipelineFault;

use crate::board::TickertubeApp;

/// Tick interval in milliseconds
pub const TICK_INTERVAL_MS: u64 = 20;

/// Tick task - polls both state machines and schedules fetches
#[embassy_executor::task]
pub async fn app_task(mut app: TickertubeApp, fetch_interval_s: u32) {
    info!("App task started");

    let mut ticker = Ticker::every(Duration::from_millis(TICK_INTERVAL_MS));
    let interval = Duration::from_secs(u64::from(fetch_interval_s.max(1)));
    let mut next_fetch = Instant::now();
    let mut reported: Option<PipelineFault> = None;

    loop {
        ticker.next().await;

        if Instant::now() >= next_fetch {
            // A cycle still running just pushes the fetch to a later tick
            if app.display_mut().begin_fetch().is_ok() {
                next_fetch = Instant::now() + interval;
            }
        }

        app.tick();

        let fault = app.display().last_fault();
        if fault != reported {
            if let Some(fault) = fault {
                warn!("Display cycle failed: {}", fault);
            }
            reported = fault;
        }
    }
}
