//! Core traits for portsage components
//!
//! - `Connector` is the only way anything in the workspace opens a socket.
//! - `Predictor` is an active fingerprinting strategy for one service family.

use async_trait::async_trait;
use std::time::Duration;
use tokio::net::TcpStream;

use crate::error::ScanResult;

/// Dial TCP with a timeout.
///
/// Implementations resolve `host_port` and connect within `timeout`; a zero
/// timeout means no deadline. No retries. The returned stream is closed when
/// dropped.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, host_port: &str, timeout: Duration) -> ScanResult<TcpStream>;
}

/// Everything a predictor needs to probe one port.
pub struct ProbeContext<'a> {
    pub host_port: &'a str,
    pub connector: &'a dyn Connector,
    pub timeout: Duration,
}

impl<'a> ProbeContext<'a> {
    pub fn new(host_port: &'a str, connector: &'a dyn Connector, timeout: Duration) -> Self {
        Self {
            host_port,
            connector,
            timeout,
        }
    }

    /// Open a fresh connection to the probed port.
    pub async fn open(&self) -> ScanResult<TcpStream> {
        self.connector.connect(self.host_port, self.timeout).await
    }
}

/// Service fingerprinting strategy.
///
/// `predict` returns `None` (or an empty string) when the service is not
/// recognized, including when the port cannot be reached.
#[async_trait]
pub trait Predictor: Send + Sync {
    /// Predictor name/identifier, used in logs
    fn name(&self) -> &str;

    async fn predict(&self, ctx: &ProbeContext<'_>) -> Option<String>;
}
