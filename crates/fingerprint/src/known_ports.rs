//! Well-known port to service name table

use once_cell::sync::Lazy;
use std::collections::HashMap;

use portsage_common::UNKNOWN;

const KNOWN_PORTS: &[(u16, &str)] = &[
    (21, "FTP"),
    (22, "SSH"),
    (23, "Telnet"),
    (25, "SMTP"),
    (53, "DNS"),
    (66, "Oracle SQL*NET?"),
    (69, "TFTP"),
    (80, "HTTP"),
    (88, "Kerberos"),
    (109, "POP2"),
    (110, "POP3"),
    (118, "SQL Service?"),
    (123, "NTP"),
    (137, "NetBIOS"),
    (139, "NetBIOS"),
    (143, "IMAP"),
    (150, "SQL-Net?"),
    (194, "IRC"),
    (443, "HTTPS"),
    (445, "Samba"),
    (465, "SMTP over SSL"),
    (554, "RTSP"),
    (5800, "VNC Remote Desktop"),
    (631, "CUPS"),
    (993, "IMAP over SSL"),
    (995, "POP3 over SSL"),
    (1433, "Microsoft SQL Server"),
    (1434, "Microsoft SQL Monitor"),
    (3306, "MySQL"),
    (3389, "Remote Desktop Protocol (RDP)"),
    (3396, "Novell NDPS Printer Agent"),
    (3535, "SMTP (Alternate)"),
    (5432, "PostgreSQL"),
    (6379, "Redis"),
    (8080, "HTTP Alternate"),
    (9160, "Cassandra"),
    (9200, "Elasticsearch"),
    (11211, "Memcached"),
    (27017, "MongoDB"),
    (28017, "MongoDB Web Admin"),
];

static PORT_TABLE: Lazy<HashMap<u16, &'static str>> =
    Lazy::new(|| KNOWN_PORTS.iter().copied().collect());

/// Service name for a well-known port.
#[inline]
pub fn lookup(port: u16) -> Option<&'static str> {
    PORT_TABLE.get(&port).copied()
}

/// Table guess for `port`, or the unknown sentinel.
pub fn predict_port(port: u16) -> String {
    lookup(port).unwrap_or(UNKNOWN).to_string()
}

/// The whole table, sorted by port.
pub fn entries() -> Vec<(u16, &'static str)> {
    let mut all = KNOWN_PORTS.to_vec();
    all.sort_unstable_by_key(|(port, _)| *port);
    all
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_lookup() {
        assert_eq!(lookup(22), Some("SSH"));
        assert_eq!(lookup(66), Some("Oracle SQL*NET?"));
        assert_eq!(lookup(8080), Some("HTTP Alternate"));
        assert_eq!(lookup(28017), Some("MongoDB Web Admin"));
        assert_eq!(lookup(4444), None);
    }

    #[test]
    fn test_predict_port_is_pure() {
        for _ in 0..3 {
            assert_eq!(predict_port(3306), "MySQL");
        }
        assert_eq!(predict_port(1), UNKNOWN);
        assert_eq!(predict_port(65535), UNKNOWN);
    }

    #[test]
    fn test_entries_sorted_and_complete() {
        let all = entries();
        assert_eq!(all.len(), 40);
        assert!(all.windows(2).all(|w| w[0].0 < w[1].0));
        assert_eq!(all.first(), Some(&(21, "FTP")));
    }
}
