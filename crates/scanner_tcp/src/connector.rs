// crates/scanner_tcp/src/connector.rs
//! TCP connect implementation of `Connector`

use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{lookup_host, TcpStream};
use tokio::time::timeout;
use tracing::{instrument, trace};

use portsage_common::{Connector, ScanError, ScanResult};

/// Resolve `host_port`, preferring an IPv4 address.
pub async fn resolve(host_port: &str) -> ScanResult<SocketAddr> {
    let addrs: Vec<SocketAddr> = lookup_host(host_port)
        .await
        .map_err(|e| ScanError::Resolve {
            host: host_port.to_string(),
            source: e,
        })?
        .collect();

    pick_address(&addrs).ok_or_else(|| ScanError::NoAddress(host_port.to_string()))
}

/// First IPv4 address, else the first address of any family.
fn pick_address(addrs: &[SocketAddr]) -> Option<SocketAddr> {
    addrs
        .iter()
        .find(|a| a.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
}

/// Plain OS-socket connector. One attempt per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl TcpConnector {
    pub fn new() -> Self {
        Self
    }

    async fn dial(host_port: &str) -> ScanResult<TcpStream> {
        let addr = resolve(host_port).await?;
        TcpStream::connect(addr)
            .await
            .map_err(|e| ScanError::Connect {
                addr: addr.to_string(),
                source: e,
            })
    }
}

#[async_trait]
impl Connector for TcpConnector {
    /// Resolution and the handshake share one deadline.
    #[instrument(level = "trace", skip(self))]
    async fn connect(&self, host_port: &str, timeout_after: Duration) -> ScanResult<TcpStream> {
        let result = if timeout_after.is_zero() {
            Self::dial(host_port).await
        } else {
            match timeout(timeout_after, Self::dial(host_port)).await {
                Ok(r) => r,
                Err(_) => Err(ScanError::Timeout(format!(
                    "connect to {} after {:?}",
                    host_port, timeout_after
                ))),
            }
        };

        if let Err(ref e) = result {
            trace!("connect failed: {}", e);
        }
        result
    }
}
