//! Core data types for the portsage scanner
//!
//! Small, serde-friendly value types shared by the engine, the fingerprint
//! crate and the CLI. Builder-style methods consume `self`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::net::Ipv6Addr;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ScanError;

/// Label returned when no identification method succeeds.
pub const UNKNOWN: &str = "<unknown>";

/// Build the dial string for `host` and `port`, bracketing IPv6 literals.
#[inline]
#[must_use]
pub fn host_port(host: &str, port: u16) -> String {
    if host.parse::<Ipv6Addr>().is_ok() {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

/// Port states returned by probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortState {
    Open,
    Closed,
}

impl fmt::Display for PortState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PortState::Open => "open",
            PortState::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Scanner configuration.
///
/// Keep fields `pub` so the engine can read them directly; mutation goes
/// through the `PortScanner` setters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    pub host: String,
    /// Per-connection timeout. `Duration::ZERO` disables the deadline.
    pub timeout: Duration,
    /// Maximum probes in flight. Never below 1.
    pub threads: usize,
    pub use_predictor: bool,
}

impl ScannerConfig {
    #[inline]
    #[must_use]
    pub fn new<S: Into<String>>(host: S, timeout: Duration, threads: usize) -> Self {
        Self {
            host: host.into(),
            timeout,
            threads: threads.max(1),
            use_predictor: true,
        }
    }

    /// Balanced preset: 1s timeout, 500 probes in flight.
    #[inline]
    #[must_use]
    pub fn balanced<S: Into<String>>(host: S) -> Self {
        Self::new(host, Duration::from_millis(1000), 500)
    }

    /// Fast preset: short timeout and high concurrency, table lookups only.
    #[inline]
    #[must_use]
    pub fn fast<S: Into<String>>(host: S) -> Self {
        Self::new(host, Duration::from_millis(300), 2_000).with_predictor(false)
    }

    /// Accurate preset: generous timeout and modest concurrency.
    #[inline]
    #[must_use]
    pub fn accurate<S: Into<String>>(host: S) -> Self {
        Self::new(host, Duration::from_secs(3), 100)
    }

    #[inline]
    #[must_use]
    pub fn with_predictor(mut self, use_predictor: bool) -> Self {
        self.use_predictor = use_predictor;
        self
    }

    #[inline]
    #[must_use]
    pub fn host_port(&self, port: u16) -> String {
        host_port(&self.host, port)
    }
}

/// Inclusive port range. An inverted range is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRange {
    pub start: u16,
    pub end: u16,
}

impl PortRange {
    #[inline]
    #[must_use]
    pub const fn new(start: u16, end: u16) -> Self {
        Self { start, end }
    }

    #[inline]
    #[must_use]
    pub const fn single(port: u16) -> Self {
        Self {
            start: port,
            end: port,
        }
    }

    /// Ports in ascending order.
    #[inline]
    pub fn ports(&self) -> std::ops::RangeInclusive<u16> {
        self.start..=self.end
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, port: u16) -> bool {
        self.start <= port && port <= self.end
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        if self.start > self.end {
            0
        } else {
            usize::from(self.end - self.start) + 1
        }
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl FromStr for PortRange {
    type Err = ScanError;

    /// Parses `"80"` or `"1-1024"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parse = |p: &str| {
            p.trim()
                .parse::<u16>()
                .map_err(|_| ScanError::InvalidPortRange(format!("invalid port '{}'", p)))
        };

        match s.split_once('-') {
            Some((start, end)) => {
                let range = PortRange::new(parse(start)?, parse(end)?);
                if range.is_empty() {
                    return Err(ScanError::InvalidPortRange(format!("{}: start > end", s)));
                }
                Ok(range)
            }
            None => Ok(PortRange::single(parse(s)?)),
        }
    }
}

/// Ports found open during one sweep.
///
/// Iteration order is not meaningful; use `into_sorted` for ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenPortSet {
    ports: HashSet<u16>,
}

impl OpenPortSet {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an open port. Duplicates are ignored.
    pub fn insert(&mut self, port: u16) -> bool {
        self.ports.insert(port)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, port: u16) -> bool {
        self.ports.contains(&port)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.ports.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.ports.iter().copied()
    }

    #[must_use]
    pub fn into_sorted(self) -> Vec<u16> {
        let mut ports: Vec<u16> = self.ports.into_iter().collect();
        ports.sort_unstable();
        ports
    }
}

impl FromIterator<u16> for OpenPortSet {
    fn from_iter<I: IntoIterator<Item = u16>>(iter: I) -> Self {
        let mut set = OpenPortSet::new();
        for port in iter {
            set.insert(port);
        }
        set
    }
}

/// One described port, as rendered by the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortReport {
    pub port: u16,
    pub state: PortState,
    pub service: String,
}

impl PortReport {
    #[inline]
    #[must_use]
    pub fn open<S: Into<String>>(port: u16, service: S) -> Self {
        Self {
            port,
            state: PortState::Open,
            service: service.into(),
        }
    }

    #[inline]
    #[must_use]
    pub fn closed(port: u16) -> Self {
        Self {
            port,
            state: PortState::Closed,
            service: UNKNOWN.to_string(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self.state, PortState::Open)
    }
}

/// Counters for one sweep.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanStats {
    pub total_ports: usize,
    pub scanned: usize,
    pub open_ports: usize,
    pub closed_ports: usize,
    pub elapsed: Duration,
}

impl ScanStats {
    #[inline]
    #[must_use]
    pub fn new(total_ports: usize) -> Self {
        Self {
            total_ports,
            ..Default::default()
        }
    }

    /// Progress percentage in [0.0, 100.0].
    #[inline]
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.total_ports == 0 {
            0.0
        } else {
            (self.scanned as f32 / self.total_ports as f32) * 100.0
        }
    }

    /// Scanning rate (ports per second).
    #[inline]
    #[must_use]
    pub fn rate(&self) -> f32 {
        if self.elapsed.as_secs_f32() == 0.0 {
            0.0
        } else {
            self.scanned as f32 / self.elapsed.as_secs_f32()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_port_brackets_ipv6() {
        assert_eq!(host_port("127.0.0.1", 80), "127.0.0.1:80");
        assert_eq!(host_port("example.com", 443), "example.com:443");
        assert_eq!(host_port("::1", 22), "[::1]:22");
    }

    #[test]
    fn config_clamps_threads() {
        let cfg = ScannerConfig::new("localhost", Duration::from_secs(1), 0);
        assert_eq!(cfg.threads, 1);
        assert!(cfg.use_predictor);
        assert!(!ScannerConfig::fast("localhost").use_predictor);
    }

    #[test]
    fn port_range_parsing() {
        assert_eq!("1-1024".parse::<PortRange>().unwrap(), PortRange::new(1, 1024));
        assert_eq!(" 80 ".parse::<PortRange>().unwrap(), PortRange::single(80));
        assert!("90-80".parse::<PortRange>().is_err());
        assert!("abc".parse::<PortRange>().is_err());
        assert!("80-".parse::<PortRange>().is_err());
        assert!("70000".parse::<PortRange>().is_err());
    }

    #[test]
    fn port_range_bounds() {
        let range = PortRange::new(20, 25);
        assert_eq!(range.len(), 6);
        assert!(range.contains(20) && range.contains(25));
        assert!(!range.contains(26));
        assert!(PortRange::new(10, 9).is_empty());
        assert_eq!(PortRange::new(65535, 65535).ports().count(), 1);
    }

    #[test]
    fn open_port_set_dedups() {
        let mut set = OpenPortSet::new();
        assert!(set.insert(443));
        assert!(set.insert(22));
        assert!(!set.insert(443));
        assert_eq!(set.len(), 2);
        assert_eq!(set.into_sorted(), vec![22, 443]);
    }

    #[test]
    fn open_port_set_full_range() {
        let set: OpenPortSet = (0..=u16::MAX).rev().chain([80, 443]).collect();
        assert_eq!(set.len(), 65_536);
        assert!(set.contains(0) && set.contains(u16::MAX));

        let sorted = set.into_sorted();
        assert_eq!(sorted.first(), Some(&0));
        assert!(sorted.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn scan_stats_rates() {
        let mut stats = ScanStats::new(4);
        stats.scanned = 2;
        stats.elapsed = Duration::from_secs(1);
        assert_eq!(stats.progress(), 50.0);
        assert_eq!(stats.rate(), 2.0);
        assert_eq!(ScanStats::new(0).progress(), 0.0);
    }
}
