//! Output formatting for scan results

use anyhow::Result;
use serde::Serialize;
use std::time::Duration;

use portsage_common::{PortRange, PortReport, ScanStats, ScannerConfig};
use portsage_fingerprint::known_port_entries;

/// Context printed alongside the port rows.
#[derive(Serialize)]
pub struct ScanSummary<'a> {
    pub host: &'a str,
    pub ports: PortRange,
    pub config: &'a ScannerConfig,
    pub stats: &'a ScanStats,
    #[serde(skip)]
    pub duration: Duration,
}

/// Print scan results in the specified format
pub fn print_results(reports: &[PortReport], summary: &ScanSummary<'_>, format: &str) -> Result<()> {
    // Normalize format string
    let format = format.trim().to_lowercase();
    match format.as_str() {
        "json" | "j" => println!("{}", render_json(reports, summary)?),
        "csv" | "c" => print!("{}", render_csv(reports)),
        "table" | "text" | "t" | "" => print!("{}", render_table(reports, summary)),
        _ => {
            eprintln!("Warning: Unknown format '{}', using default table format", format);
            print!("{}", render_table(reports, summary));
        }
    }
    Ok(())
}

/// ASCII table sorted by port, followed by a summary
fn render_table(reports: &[PortReport], summary: &ScanSummary<'_>) -> String {
    let mut out = String::new();
    if reports.is_empty() {
        out.push_str(&format!(
            "\nNo open ports on {} ({}).\n\n",
            summary.host, summary.ports
        ));
        return out;
    }

    let mut sorted = reports.to_vec();
    sorted.sort_by_key(|r| r.port);

    out.push_str(&format!("\n{:-<72}\n", ""));
    out.push_str(&format!("{:<8} {:<8} {:<54}\n", "PORT", "STATE", "SERVICE"));
    out.push_str(&format!("{:-<72}\n", ""));
    for report in &sorted {
        out.push_str(&format!(
            "{:<8} {:<8} {:<54}\n",
            report.port,
            report.state.to_string(),
            display_service(&report.service)
        ));
    }
    out.push_str(&format!("{:-<72}\n", ""));

    out.push_str("\nSummary:\n");
    out.push_str(&format!("  Host: {}\n", summary.host));
    out.push_str(&format!("  Ports probed: {}\n", summary.stats.scanned));
    out.push_str(&format!("  Open ports: {}\n", summary.stats.open_ports));
    out.push_str(&format!("  Closed ports: {}\n", summary.stats.closed_ports));
    out.push_str(&format!("  Scan duration: {}\n\n", format_duration(summary.duration)));
    out
}

fn render_json(reports: &[PortReport], summary: &ScanSummary<'_>) -> Result<String> {
    use serde_json::json;

    let output = json!({
        "scan_info": summary,
        "duration_seconds": summary.duration.as_secs_f64(),
        "duration_formatted": format_duration(summary.duration),
        "ports": reports,
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

fn render_csv(reports: &[PortReport]) -> String {
    let mut out = String::from("port,state,service\n");
    for report in reports {
        out.push_str(&format!(
            "{},{},\"{}\"\n",
            report.port,
            report.state,
            report.service.replace('"', "\"\"")
        ));
    }
    out
}

/// Printable form of a label: control bytes from raw greetings become '.',
/// and long labels are cut.
fn display_service(service: &str) -> String {
    let clean: String = service
        .chars()
        .map(|c| if c.is_control() { '.' } else { c })
        .collect();
    if clean.chars().count() > 52 {
        format!("{}...", clean.chars().take(49).collect::<String>())
    } else {
        clean
    }
}

pub fn print_known_ports() {
    println!("{:<8} {}", "PORT", "SERVICE");
    for (port, service) in known_port_entries() {
        println!("{:<8} {}", port, service);
    }
}

/// Format duration in a human-readable way
fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if total_secs == 0 {
        format!("{}ms", millis)
    } else if total_secs < 60 {
        if millis > 0 {
            format!("{}.{:03}s", total_secs, millis)
        } else {
            format!("{}s", total_secs)
        }
    } else {
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        if secs > 0 {
            format!("{}m {}s", mins, secs)
        } else {
            format!("{}m", mins)
        }
    }
}
