//! Service identification policy
//!
//! Order of evaluation for one port:
//! 1. predictors disabled: table lookup only, no network I/O
//! 2. port 80 or 8080: predictor chain
//! 3. otherwise the table guess, falling through to the predictor chain when
//!    the port is not in the table, and reading a greeting window when the
//!    guess is MySQL

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, trace};

use portsage_common::{Connector, Predictor, ProbeContext, ScannerConfig, UNKNOWN};
use portsage_scanner_tcp::BannerGrabber;

use crate::known_ports::predict_port;

/// Bytes read from a MySQL server greeting.
pub const MYSQL_WINDOW: usize = 20;

/// Read deadline for the MySQL greeting, independent of the connect timeout.
pub const MYSQL_READ_TIMEOUT: Duration = Duration::from_secs(3);

const MYSQL_LABEL: &str = "MySQL";

/// Ports that always go to the predictor chain.
///
/// Kept separate from the known-port table; adding HTTP ports to the table
/// does not change this check.
#[inline]
pub fn is_http_port(port: u16) -> bool {
    port == 80 || port == 8080
}

/// Borrowed view of a scanner's identification inputs.
pub struct Identifier<'a> {
    config: &'a ScannerConfig,
    predictors: &'a [Arc<dyn Predictor>],
    connector: &'a dyn Connector,
}

impl<'a> Identifier<'a> {
    pub fn new(
        config: &'a ScannerConfig,
        predictors: &'a [Arc<dyn Predictor>],
        connector: &'a dyn Connector,
    ) -> Self {
        Self {
            config,
            predictors,
            connector,
        }
    }

    /// Human-readable service description for `port`. Never fails.
    #[instrument(skip(self), fields(host = %self.config.host))]
    pub async fn describe(&self, port: u16) -> String {
        if !self.config.use_predictor {
            return predict_port(port);
        }

        if is_http_port(port) {
            return self.predict_using_predictors(port).await;
        }

        let assumed = predict_port(port);
        if assumed == UNKNOWN {
            return self.predict_using_predictors(port).await;
        }
        if assumed == MYSQL_LABEL {
            return self.mysql_version(port, assumed).await;
        }
        assumed
    }

    /// Run predictors in registration order; the first non-empty label wins.
    pub async fn predict_using_predictors(&self, port: u16) -> String {
        let host_port = self.config.host_port(port);
        let ctx = ProbeContext::new(&host_port, self.connector, self.config.timeout);

        for predictor in self.predictors {
            match predictor.predict(&ctx).await {
                Some(label) if !label.is_empty() => {
                    debug!("{} matched {}: {}", predictor.name(), host_port, label);
                    return label;
                }
                _ => trace!("{} did not match {}", predictor.name(), host_port),
            }
        }
        UNKNOWN.to_string()
    }

    /// Append the first greeting bytes to the label. The bytes are not
    /// validated; any failure returns the label unchanged.
    async fn mysql_version(&self, port: u16, assumed: String) -> String {
        let host_port = self.config.host_port(port);
        let mut stream = match self.connector.connect(&host_port, self.config.timeout).await {
            Ok(s) => s,
            Err(e) => {
                debug!("MySQL follow-up could not connect: {}", e);
                return assumed;
            }
        };

        match BannerGrabber::new(MYSQL_READ_TIMEOUT)
            .read_window(&mut stream, MYSQL_WINDOW)
            .await
        {
            Ok(bytes) => format!("{} version: {}", assumed, String::from_utf8_lossy(&bytes)),
            Err(e) => {
                debug!("MySQL greeting read failed: {}", e);
                assumed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use portsage_common::{ScanError, ScanResult};
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// Sends every dial to one local address, whatever port was asked for.
    struct RedirectConnector {
        addr: SocketAddr,
        calls: AtomicUsize,
    }

    impl RedirectConnector {
        fn new(addr: SocketAddr) -> Self {
            Self {
                addr,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Connector for RedirectConnector {
        async fn connect(&self, _host_port: &str, _timeout: Duration) -> ScanResult<TcpStream> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(TcpStream::connect(self.addr).await?)
        }
    }

    struct RefusingConnector;

    #[async_trait]
    impl Connector for RefusingConnector {
        async fn connect(&self, host_port: &str, _timeout: Duration) -> ScanResult<TcpStream> {
            Err(ScanError::Connect {
                addr: host_port.to_string(),
                source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
            })
        }
    }

    struct FixedPredictor {
        label: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl FixedPredictor {
        fn new(label: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                label,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Predictor for FixedPredictor {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn predict(&self, _ctx: &ProbeContext<'_>) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.label.map(str::to_string)
        }
    }

    /// Accepts connections, writes `payload` to each, then holds them open.
    async fn greeting_server(payload: &'static [u8]) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let _ = socket.write_all(payload).await;
                    tokio::time::sleep(Duration::from_secs(5)).await;
                });
            }
        });
        addr
    }

    /// Answers each request once with `response`, then closes.
    async fn http_server(response: &'static [u8]) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut request = [0u8; 1024];
                    let _ = socket.read(&mut request).await;
                    let _ = socket.write_all(response).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        addr
    }

    fn config() -> ScannerConfig {
        ScannerConfig::new("127.0.0.1", Duration::from_secs(1), 4)
    }

    #[test]
    fn test_http_ports() {
        assert!(is_http_port(80));
        assert!(is_http_port(8080));
        assert!(!is_http_port(443));
        assert!(!is_http_port(8000));
    }

    #[tokio::test]
    async fn test_disabled_predictor_uses_table_only() {
        let connector = RedirectConnector::new("127.0.0.1:1".parse().unwrap());
        let predictor = FixedPredictor::new(Some("should not run"));
        let predictors: Vec<Arc<dyn Predictor>> = vec![predictor.clone()];
        let cfg = config().with_predictor(false);
        let identifier = Identifier::new(&cfg, &predictors, &connector);

        assert_eq!(identifier.describe(80).await, "HTTP");
        assert_eq!(identifier.describe(3306).await, "MySQL");
        assert_eq!(identifier.describe(4444).await, UNKNOWN);
        assert_eq!(connector.calls.load(Ordering::SeqCst), 0);
        assert_eq!(predictor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_http_port_overrides_table() {
        let predictors: Vec<Arc<dyn Predictor>> = vec![FixedPredictor::new(None)];
        let cfg = config();
        let identifier = Identifier::new(&cfg, &predictors, &RefusingConnector);

        // Table says "HTTP" and "HTTP Alternate"; predictors found nothing.
        assert_eq!(identifier.describe(80).await, UNKNOWN);
        assert_eq!(identifier.describe(8080).await, UNKNOWN);
    }

    #[tokio::test]
    async fn test_unknown_port_falls_through_to_predictors() {
        let predictors: Vec<Arc<dyn Predictor>> = vec![FixedPredictor::new(Some("custom"))];
        let cfg = config();
        let identifier = Identifier::new(&cfg, &predictors, &RefusingConnector);

        assert_eq!(identifier.describe(4444).await, "custom");
        // Known, non-MySQL ports keep the table guess.
        assert_eq!(identifier.describe(22).await, "SSH");
    }

    #[tokio::test]
    async fn test_first_match_short_circuits() {
        let empty = FixedPredictor::new(Some(""));
        let first = FixedPredictor::new(Some("first"));
        let second = FixedPredictor::new(Some("second"));
        let predictors: Vec<Arc<dyn Predictor>> = vec![empty.clone(), first.clone(), second.clone()];
        let cfg = config();
        let identifier = Identifier::new(&cfg, &predictors, &RefusingConnector);

        assert_eq!(identifier.describe(8080).await, "first");
        assert_eq!(empty.calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_mysql_full_window_is_appended() {
        let addr = greeting_server(b"J\0\0\0\n5.7.33-log\0abcdefgh").await;
        let connector = RedirectConnector::new(addr);
        let predictors = crate::default_predictors();
        let cfg = config();
        let identifier = Identifier::new(&cfg, &predictors, &connector);

        let label = identifier.describe(3306).await;
        assert_eq!(
            label,
            format!("MySQL version: {}", String::from_utf8_lossy(b"J\0\0\0\n5.7.33-log\0abcd"))
        );
        assert_eq!(connector.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_mysql_short_greeting_returns_base_label() {
        let addr = greeting_server(b"J\0\0\0\n5.7").await;
        let connector = RedirectConnector::new(addr);
        let predictors = crate::default_predictors();
        let cfg = config();
        let identifier = Identifier::new(&cfg, &predictors, &connector);

        let start = Instant::now();
        assert_eq!(identifier.describe(3306).await, "MySQL");
        assert!(start.elapsed() >= Duration::from_millis(2900));
    }

    #[tokio::test]
    async fn test_mysql_unreachable_returns_base_label() {
        let predictors = crate::default_predictors();
        let cfg = config();
        let identifier = Identifier::new(&cfg, &predictors, &RefusingConnector);

        assert_eq!(identifier.describe(3306).await, "MySQL");
    }

    #[tokio::test]
    async fn test_default_predictors_identify_nginx() {
        let addr = http_server(b"HTTP/1.1 200 OK\r\nServer: nginx/1.18.0\r\n\r\n").await;
        let connector = RedirectConnector::new(addr);
        let predictors = crate::default_predictors();
        let cfg = config();
        let identifier = Identifier::new(&cfg, &predictors, &connector);

        assert_eq!(identifier.describe(80).await, "nginx/1.18.0");
        // Apache probed first and missed, then nginx matched.
        assert_eq!(connector.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_default_predictors_identify_apache() {
        let addr = http_server(b"HTTP/1.1 200 OK\r\nServer: Apache/2.4.57 (Debian)\r\n\r\n").await;
        let connector = RedirectConnector::new(addr);
        let predictors = crate::default_predictors();
        let cfg = config();
        let identifier = Identifier::new(&cfg, &predictors, &connector);

        assert_eq!(identifier.describe(8080).await, "Apache/2.4.57 (Debian)");
        assert_eq!(connector.calls.load(Ordering::SeqCst), 1);
    }
}
