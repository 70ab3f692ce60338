//! Inter-task communication channels
//!
//! The display pipeline never sees the network task directly. Requests go
//! out through [`FETCH_REQUEST`]; response progress comes back as
//! [`FetchEvent`]s on [`FETCH_EVENTS`], which the pipeline drains on its
//! own tick.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::String;
use portable_atomic::AtomicBool;

use tickertube_core::config::MAX_URL_LEN;
use tickertube_hal::fetch::FetchEvent;

/// Channel capacity for response events
pub const FETCH_EVENT_CAPACITY: usize = 4;

/// URL of the request to run; one outstanding at a time
pub static FETCH_REQUEST: Channel<CriticalSectionRawMutex, String<MAX_URL_LEN>, 1> =
    Channel::new();

/// Response chunks and the terminal event of the current request
pub static FETCH_EVENTS: Channel<CriticalSectionRawMutex, FetchEvent, FETCH_EVENT_CAPACITY> =
    Channel::new();

/// Set when a request is queued, cleared after its terminal event is sent
pub static FETCH_BUSY: AtomicBool = AtomicBool::new(false);
