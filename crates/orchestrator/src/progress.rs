//! Progress tracking

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::info;

use portsage_common::ScanStats;

pub struct ProgressTracker {
    total: AtomicUsize,
    open: AtomicUsize,
    closed: AtomicUsize,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self {
            total: AtomicUsize::new(total),
            open: AtomicUsize::new(0),
            closed: AtomicUsize::new(0),
        }
    }

    pub fn record(&self, open: bool) {
        if open {
            self.open.fetch_add(1, Ordering::Relaxed);
        } else {
            self.closed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self, elapsed: Duration) -> ScanStats {
        let open_ports = self.open.load(Ordering::Relaxed);
        let closed_ports = self.closed.load(Ordering::Relaxed);
        ScanStats {
            total_ports: self.total.load(Ordering::Relaxed),
            scanned: open_ports + closed_ports,
            open_ports,
            closed_ports,
            elapsed,
        }
    }

    pub fn print_summary(&self, elapsed: Duration) {
        let stats = self.snapshot(elapsed);

        info!("Scan Summary:");
        info!("  Total ports: {}", stats.total_ports);
        info!("  Probed: {}", stats.scanned);
        info!("  Open: {}", stats.open_ports);
        info!("  Closed: {}", stats.closed_ports);
        info!("  Rate: {:.1} ports/s", stats.rate());
    }
}
