// crates/orchestrator/src/scanner.rs
//! PortScanner - bounded-concurrency sweep and per-port identification

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, trace, warn};

use portsage_common::{
    Connector, OpenPortSet, PortRange, PortReport, Predictor, ScanStats, ScannerConfig,
};
use portsage_fingerprint::{default_predictors, Identifier};
use portsage_scanner_tcp::TcpConnector;

use crate::progress::ProgressTracker;

/// Result of one sweep.
#[derive(Debug, Clone)]
pub struct Sweep {
    pub open: OpenPortSet,
    pub stats: ScanStats,
}

/// Scans one host. Owns its configuration, predictor registry and connector.
pub struct PortScanner {
    config: ScannerConfig,
    predictors: Vec<Arc<dyn Predictor>>,
    connector: Arc<dyn Connector>,
}

impl PortScanner {
    /// Create a scanner with the default predictors and the TCP connector.
    pub fn new<S: Into<String>>(host: S, timeout: Duration, threads: usize) -> Self {
        Self::with_config(ScannerConfig::new(host, timeout, threads))
    }

    pub fn with_config(config: ScannerConfig) -> Self {
        Self {
            config,
            predictors: default_predictors(),
            connector: Arc::new(TcpConnector::new()),
        }
    }

    /// Replace the connector used by every probe, predictor and follow-up.
    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = connector;
        self
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    pub fn predictors(&self) -> &[Arc<dyn Predictor>] {
        &self.predictors
    }

    pub fn toggle_predictor(&mut self, use_predictor: bool) {
        self.config.use_predictor = use_predictor;
    }

    /// Set the number of probes allowed in flight. Zero is raised to one.
    pub fn set_threads(&mut self, threads: usize) {
        if threads == 0 {
            warn!("Concurrency of 0 requested, using 1");
        }
        self.config.threads = threads.max(1);
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.config.timeout = timeout;
    }

    /// Append a predictor. Registering the same instance again is a no-op;
    /// returns whether it was added.
    pub fn register_predictor(&mut self, predictor: Arc<dyn Predictor>) -> bool {
        let candidate = Arc::as_ptr(&predictor) as *const ();
        if self
            .predictors
            .iter()
            .any(|p| Arc::as_ptr(p) as *const () == candidate)
        {
            debug!("Predictor {} already registered", predictor.name());
            return false;
        }
        self.predictors.push(predictor);
        true
    }

    /// Whether `port` accepts a connection within the timeout.
    pub async fn is_open(&self, port: u16) -> bool {
        probe(
            self.connector.as_ref(),
            &self.config.host_port(port),
            self.config.timeout,
        )
        .await
    }

    /// Open ports in `range`. Blocks until every port has been probed.
    pub async fn scan_range(&self, range: PortRange) -> OpenPortSet {
        self.sweep(range).await.open
    }

    /// Sweep `range` with at most `threads` probes in flight.
    ///
    /// Ports are submitted in ascending order; each submission waits for a
    /// permit, which its task releases as soon as the probe completes.
    #[instrument(skip(self), fields(host = %self.config.host, threads = self.config.threads))]
    pub async fn sweep(&self, range: PortRange) -> Sweep {
        info!("Sweeping {} port(s) {}", range.len(), range);

        let permits = self.config.threads.clamp(1, Semaphore::MAX_PERMITS);
        let semaphore = Arc::new(Semaphore::new(permits));
        let open = Arc::new(Mutex::new(OpenPortSet::new()));
        let progress = Arc::new(ProgressTracker::new(range.len()));
        let started = Instant::now();

        let mut tasks = JoinSet::new();
        for port in range.ports() {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(p) => p,
                Err(_) => break,
            };
            let connector = self.connector.clone();
            let host_port = self.config.host_port(port);
            let timeout = self.config.timeout;
            let open = open.clone();
            let progress = progress.clone();

            tasks.spawn(async move {
                let is_open = probe(connector.as_ref(), &host_port, timeout).await;
                drop(permit);

                progress.record(is_open);
                if is_open {
                    debug!("Port {} open", port);
                    open.lock().await.insert(port);
                }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                warn!("Probe task failed: {}", e);
            }
        }

        let elapsed = started.elapsed();
        progress.print_summary(elapsed);

        let open = std::mem::take(&mut *open.lock().await);
        Sweep {
            open,
            stats: progress.snapshot(elapsed),
        }
    }

    /// Human-readable service description for one port.
    pub async fn describe_port(&self, port: u16) -> String {
        Identifier::new(&self.config, &self.predictors, self.connector.as_ref())
            .describe(port)
            .await
    }

    /// Describe each port in turn, in the given order.
    pub async fn describe_ports(&self, ports: &[u16]) -> Vec<PortReport> {
        let identifier = Identifier::new(&self.config, &self.predictors, self.connector.as_ref());
        let mut reports = Vec::with_capacity(ports.len());
        for &port in ports {
            reports.push(PortReport::open(port, identifier.describe(port).await));
        }
        reports
    }
}

/// One connection attempt; the stream is closed immediately.
async fn probe(connector: &dyn Connector, host_port: &str, timeout: Duration) -> bool {
    match connector.connect(host_port, timeout).await {
        Ok(stream) => {
            drop(stream);
            true
        }
        Err(e) => {
            trace!("{} closed: {}", host_port, e);
            false
        }
    }
}
