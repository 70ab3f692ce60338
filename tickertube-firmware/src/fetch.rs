//! Fetch transport backed by the HTTP task

use heapless::String;
use portable_atomic::Ordering;

use tickertube_hal::fetch::{FetchError, FetchEvent, FetchTransport};

use crate::channels::{FETCH_BUSY, FETCH_EVENTS, FETCH_REQUEST};

/// Hands requests to [`crate::tasks::http_task`] and reads back its events
pub struct ChannelFetch;

impl FetchTransport for ChannelFetch {
    fn is_busy(&self) -> bool {
        FETCH_BUSY.load(Ordering::Acquire)
    }

    fn request(&mut self, url: &str) -> Result<(), FetchError> {
        if self.is_busy() {
            return Err(FetchError::Busy);
        }
        let url = String::try_from(url).map_err(|_| FetchError::InvalidUrl)?;

        FETCH_BUSY.store(true, Ordering::Release);
        FETCH_REQUEST.try_send(url).map_err(|_| {
            FETCH_BUSY.store(false, Ordering::Release);
            FetchError::Busy
        })
    }

    fn poll_event(&mut self) -> Option<FetchEvent> {
        FETCH_EVENTS.try_receive().ok()
    }
}
