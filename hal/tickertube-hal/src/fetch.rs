//! Remote fetch transport
//!
//! The transport performs one request at a time. Response progress is not
//! delivered through callbacks; the transport queues [`FetchEvent`]s and
//! the consumer drains them with [`FetchTransport::poll_event`] from its
//! own tick, so nothing outside the consumer ever mutates its state.
//!
//! Ordering contract for one request:
//!
//! ```text
//! Chunk* (Complete | Error)
//! ```
//!
//! `Complete` is delivered at most once, after the last chunk. `Error`
//! replaces `Complete`; the two never both occur.

use heapless::Vec;

/// Largest response fragment carried by one [`FetchEvent::Chunk`]
pub const CHUNK_SIZE: usize = 256;

/// Fetch failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FetchError {
    /// A request is already in flight
    Busy,
    /// URL could not be parsed
    InvalidUrl,
    /// DNS lookup or TCP connect failed
    Connect,
    /// Response was not valid HTTP
    Protocol,
    /// Scheme or feature not available on this transport (e.g. TLS)
    Unsupported,
    /// Connection dropped mid-transfer
    Transport,
}

/// Progress notification for the request in flight
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchEvent {
    /// Next fragment of the response body
    Chunk(Vec<u8, CHUNK_SIZE>),
    /// Response finished
    Complete,
    /// Request failed
    Error(FetchError),
}

impl FetchEvent {
    /// Build a chunk event, truncating `data` to [`CHUNK_SIZE`]
    pub fn chunk(data: &[u8]) -> Self {
        let len = data.len().min(CHUNK_SIZE);
        let mut buf = Vec::new();
        // len <= capacity
        let _ = buf.extend_from_slice(&data[..len]);
        FetchEvent::Chunk(buf)
    }

    /// True for the event that ends a request
    pub fn is_terminal(&self) -> bool {
        matches!(self, FetchEvent::Complete | FetchEvent::Error(_))
    }
}

/// Remote fetch transport
pub trait FetchTransport {
    /// True while a previous request has not finished
    fn is_busy(&self) -> bool;

    /// Submit a GET request for `url`
    ///
    /// Returns once the request has been handed off; the response arrives
    /// as queued events.
    fn request(&mut self, url: &str) -> Result<(), FetchError>;

    /// Take the next queued event, if any
    fn poll_event(&mut self) -> Option<FetchEvent>;
}
