//! Minimal HTTP/1.0 client pieces
//!
//! Just enough HTTP to fetch one page over a plain TCP socket: split an
//! `http://` URL, format the GET request and find where the body starts in
//! a response that arrives in arbitrary fragments. Socket handling is left
//! to the caller.

use core::fmt::Write;

use heapless::String;
use tickertube_hal::fetch::FetchError;

/// Largest request head [`request_head`] produces
pub const MAX_REQUEST_LEN: usize = 256;

const HEAD_END: &[u8; 4] = b"\r\n\r\n";

/// Length of `HTTP/1.x NNN`
const STATUS_LINE_LEN: usize = 12;

/// Parts of an `http://` URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Url<'a> {
    /// Host name or dotted IPv4 address
    pub host: &'a str,
    /// TCP port, 80 unless given
    pub port: u16,
    /// Path and query, always starting with `/`
    pub path: &'a str,
}

/// Split an `http://host[:port][/path]` URL
///
/// `https://` is reported as [`FetchError::Unsupported`]; anything else that
/// does not fit the pattern is [`FetchError::InvalidUrl`].
pub fn parse_url(url: &str) -> Result<Url<'_>, FetchError> {
    if url.starts_with("https://") {
        return Err(FetchError::Unsupported);
    }
    let rest = url.strip_prefix("http://").ok_or(FetchError::InvalidUrl)?;

    let (authority, path) = match rest.find('/') {
        Some(slash) => (&rest[..slash], &rest[slash..]),
        None => (rest, "/"),
    };

    let (host, port) = match authority.split_once(':') {
        Some((host, port)) => (
            host,
            port.parse::<u16>().map_err(|_| FetchError::InvalidUrl)?,
        ),
        None => (authority, 80),
    };

    if host.is_empty() || port == 0 {
        return Err(FetchError::InvalidUrl);
    }

    Ok(Url { host, port, path })
}

/// Format the GET request for `url`
pub fn request_head(url: &Url<'_>) -> Result<String<MAX_REQUEST_LEN>, FetchError> {
    let mut head = String::new();
    write!(
        head,
        "GET {} HTTP/1.0\r\nHost: {}\r\nUser-Agent: tickertube\r\nConnection: close\r\n\r\n",
        url.path, url.host
    )
    .map_err(|_| FetchError::InvalidUrl)?;
    Ok(head)
}

/// Incremental response head parser
///
/// Feed every received fragment until [`ResponseHead::feed`] reports the
/// body offset; everything after that offset, and every later fragment, is
/// body.
#[derive(Debug, Default)]
pub struct ResponseHead {
    status_line: heapless::Vec<u8, STATUS_LINE_LEN>,
    /// Bytes of [`HEAD_END`] matched so far
    matched: usize,
    done: bool,
}

impl ResponseHead {
    /// Start parsing a new response
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the blank line after the headers was seen
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Consume one fragment
    ///
    /// Returns the offset of the first body byte within `data` once the
    /// head ends in this fragment. A status other than 2xx, or a status line
    /// that is not HTTP, is [`FetchError::Protocol`].
    pub fn feed(&mut self, data: &[u8]) -> Result<Option<usize>, FetchError> {
        if self.done {
            return Ok(Some(0));
        }

        for (i, &byte) in data.iter().enumerate() {
            // Full once the status code has been captured
            let _ = self.status_line.push(byte);

            self.matched = if byte == HEAD_END[self.matched] {
                self.matched + 1
            } else if byte == b'\r' {
                1
            } else {
                0
            };

            if self.matched == HEAD_END.len() {
                self.check_status()?;
                self.done = true;
                return Ok(Some(i + 1));
            }
        }
        Ok(None)
    }

    /// HTTP status code, once enough of the status line arrived
    pub fn status(&self) -> Option<u16> {
        let line = self.status_line.as_slice();
        if line.len() < STATUS_LINE_LEN || !line.starts_with(b"HTTP/1.") || line[8] != b' ' {
            return None;
        }
        line[9..12].iter().try_fold(0u16, |code, b| {
            b.is_ascii_digit().then(|| code * 10 + u16::from(b - b'0'))
        })
    }

    fn check_status(&self) -> Result<(), FetchError> {
        match self.status() {
            Some(200..=299) => Ok(()),
            Some(code) => {
                warn!("HTTP status {}", code);
                Err(FetchError::Protocol)
            }
            None => Err(FetchError::Protocol),
        }
    }
}
