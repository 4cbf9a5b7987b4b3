// runner.rs
use anyhow::{Context, Result};
use std::time::{Duration, Instant};
use tracing::info;

use portsage_common::{PortRange, PortReport, ScanError, ScanResult, ScanStats, ScannerConfig};
use portsage_orchestrator::PortScanner;

use crate::args::ScanArgs;
use crate::output::{print_results, ScanSummary};

/// Apply the preset, then any explicit overrides.
pub fn build_config(opts: &ScanArgs) -> ScanResult<ScannerConfig> {
    let target = opts.target.trim();
    if target.is_empty() {
        return Err(ScanError::InvalidTarget("target host is empty".to_string()));
    }

    let mut config = match opts.preset.as_str() {
        "fast" => ScannerConfig::fast(target),
        "accurate" => ScannerConfig::accurate(target),
        _ => ScannerConfig::balanced(target),
    };

    if let Some(threads) = opts.concurrency {
        config.threads = threads.max(1);
    }
    if let Some(ms) = opts.timeout {
        config.timeout = Duration::from_millis(ms);
    }
    if opts.no_predict {
        config.use_predictor = false;
    }
    Ok(config)
}

pub async fn run_scan(opts: ScanArgs, ports: &str) -> Result<()> {
    let range: PortRange = ports
        .parse()
        .with_context(|| format!("Invalid port specification '{}'", ports))?;
    let config = build_config(&opts).context("Invalid scan options")?;

    info!("Starting scan...");
    info!("Target: {}", config.host);
    info!("Ports: {}", range);
    info!("Concurrency: {}", config.threads);
    info!("Timeout: {:?}", config.timeout);

    let scanner = PortScanner::with_config(config);
    let started = Instant::now();
    let sweep = scanner.sweep(range).await;

    let open_ports = sweep.open.into_sorted();
    info!("Identifying {} open port(s)", open_ports.len());
    let reports = scanner.describe_ports(&open_ports).await;

    let summary = ScanSummary {
        host: &scanner.config().host,
        ports: range,
        config: scanner.config(),
        stats: &sweep.stats,
        duration: started.elapsed(),
    };
    print_results(&reports, &summary, &opts.output_format)
}

pub async fn run_describe(opts: ScanArgs, port: u16) -> Result<()> {
    let config = build_config(&opts).context("Invalid scan options")?;
    let scanner = PortScanner::with_config(config);
    let started = Instant::now();

    let report = if scanner.is_open(port).await {
        PortReport::open(port, scanner.describe_port(port).await)
    } else {
        PortReport::closed(port)
    };

    let mut stats = ScanStats::new(1);
    stats.scanned = 1;
    if report.is_open() {
        stats.open_ports = 1;
    } else {
        stats.closed_ports = 1;
    }
    stats.elapsed = started.elapsed();

    let summary = ScanSummary {
        host: &scanner.config().host,
        ports: PortRange::single(port),
        config: scanner.config(),
        stats: &stats,
        duration: stats.elapsed,
    };
    print_results(&[report], &summary, &opts.output_format)
}
