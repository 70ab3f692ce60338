//! HTTP fetch task
//!
//! Waits for a URL on [`FETCH_REQUEST`], runs one plain HTTP/1.0 GET over
//! embassy-net and streams the body back as [`FetchEvent`]s. Every request
//! ends with exactly one `Complete` or `Error` event, after which the
//! transport is marked free again.

use defmt::*;
use embassy_net::dns::DnsQueryType;
use embassy_net::tcp::TcpSocket;
use embassy_net::{IpAddress, Ipv4Address, Stack};
use embassy_time::Duration;
use embedded_io_async::Write;
use portable_atomic::Ordering;

use tickertube_drivers::http::{parse_url, request_head, ResponseHead};
use tickertube_hal::fetch::{FetchError, FetchEvent, CHUNK_SIZE};

use crate::channels::{FETCH_BUSY, FETCH_EVENTS, FETCH_REQUEST};

/// Give up on a silent server after this long
const SOCKET_TIMEOUT_S: u64 = 15;

/// HTTP task - serves fetch requests one at a time
#[embassy_executor::task]
pub async fn http_task(stack: Stack<'static>) {
    info!("HTTP task started");

    let mut rx_buffer = [0u8; 2048];
    let mut tx_buffer = [0u8; 512];

    loop {
        let url = FETCH_REQUEST.receive().await;
        debug!("GET {}", url.as_str());

        let last = match fetch(stack, &url, &mut rx_buffer, &mut tx_buffer).await {
            Ok(()) => FetchEvent::Complete,
            Err(e) => {
                warn!("Fetch failed: {}", e);
                FetchEvent::Error(e)
            }
        };
        FETCH_EVENTS.send(last).await;
        FETCH_BUSY.store(false, Ordering::Release);
    }
}

async fn fetch(
    stack: Stack<'static>,
    url: &str,
    rx_buffer: &mut [u8],
    tx_buffer: &mut [u8],
) -> Result<(), FetchError> {
    let url = parse_url(url)?;

    let address = match url.host.parse::<Ipv4Address>() {
        Ok(ip) => IpAddress::Ipv4(ip),
        Err(_) => {
            let addresses = stack
                .dns_query(url.host, DnsQueryType::A)
                .await
                .map_err(|_| FetchError::Connect)?;
            *addresses.first().ok_or(FetchError::Connect)?
        }
    };

    let mut socket = TcpSocket::new(stack, rx_buffer, tx_buffer);
    socket.set_timeout(Some(Duration::from_secs(SOCKET_TIMEOUT_S)));
    socket
        .connect((address, url.port))
        .await
        .map_err(|_| FetchError::Connect)?;

    let head = request_head(&url)?;
    socket
        .write_all(head.as_bytes())
        .await
        .map_err(|_| FetchError::Transport)?;

    let mut response = ResponseHead::new();
    let mut buf = [0u8; CHUNK_SIZE];
    let result = loop {
        let n = match socket.read(&mut buf).await {
            Ok(0) => break Ok(()),
            Ok(n) => n,
            Err(_) => break Err(FetchError::Transport),
        };

        let body = match response.feed(&buf[..n]) {
            Ok(Some(offset)) => &buf[offset..n],
            Ok(None) => continue,
            Err(e) => break Err(e),
        };
        if !body.is_empty() {
            FETCH_EVENTS.send(FetchEvent::chunk(body)).await;
        }
    };
    socket.close();

    match result {
        Ok(()) if !response.is_done() => Err(FetchError::Protocol),
        other => other,
    }
}
