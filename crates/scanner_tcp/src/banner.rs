//! Bounded reads from an open stream

use std::future::Future;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, instrument};

use portsage_common::{ScanError, ScanResult};

/// Await `fut` until `deadline`; `None` when the deadline passes first.
async fn before<F: Future>(deadline: Option<Instant>, fut: F) -> Option<F::Output> {
    match deadline {
        Some(at) => timeout_at(at, fut).await.ok(),
        None => Some(fut.await),
    }
}

/// Reads under a deadline. A zero timeout waits indefinitely.
pub struct BannerGrabber {
    timeout: Duration,
}

impl BannerGrabber {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn deadline(&self) -> Option<Instant> {
        if self.timeout.is_zero() {
            None
        } else {
            Some(Instant::now() + self.timeout)
        }
    }

    /// Read exactly `len` bytes before the deadline.
    ///
    /// Fewer bytes followed by a stall or EOF is an error; the content is not
    /// inspected.
    #[instrument(skip(self, stream))]
    pub async fn read_window(&self, stream: &mut TcpStream, len: usize) -> ScanResult<Vec<u8>> {
        let mut buf = vec![0u8; len];
        match before(self.deadline(), stream.read_exact(&mut buf)).await {
            Some(Ok(_)) => {
                debug!("Read {} byte window", len);
                Ok(buf)
            }
            Some(Err(e)) => {
                debug!("Window read error: {}", e);
                Err(ScanError::Io(e))
            }
            None => {
                debug!("Window read timeout");
                Err(ScanError::Timeout(format!("reading {} bytes", len)))
            }
        }
    }

    /// Send `request` and collect the response until EOF, `max` bytes or the
    /// deadline. A deadline hit after some data arrived returns what was read.
    #[instrument(skip(self, stream, request))]
    pub async fn exchange(
        &self,
        stream: &mut TcpStream,
        request: &[u8],
        max: usize,
    ) -> ScanResult<Vec<u8>> {
        let deadline = self.deadline();

        match before(deadline, stream.write_all(request)).await {
            Some(Ok(())) => {}
            Some(Err(e)) => return Err(ScanError::Io(e)),
            None => return Err(ScanError::Timeout("sending probe".to_string())),
        }

        let mut response = Vec::with_capacity(max.min(4096));
        let mut chunk = [0u8; 1024];
        loop {
            match before(deadline, stream.read(&mut chunk)).await {
                Some(Ok(0)) => break,
                Some(Ok(n)) => {
                    response.extend_from_slice(&chunk[..n]);
                    if response.len() >= max {
                        response.truncate(max);
                        break;
                    }
                }
                Some(Err(e)) if response.is_empty() => return Err(ScanError::Io(e)),
                None if response.is_empty() => {
                    return Err(ScanError::Timeout("waiting for response".to_string()))
                }
                _ => break,
            }
        }

        debug!("Exchange read {} bytes", response.len());
        Ok(response)
    }
}
