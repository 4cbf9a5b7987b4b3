use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "portsage")]
#[command(version = "0.1.0")]
#[command(about = "TCP port scanner with service identification", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sweep a port range and describe every open port
    Scan {
        #[command(flatten)]
        opts: ScanArgs,

        /// Ports to scan. Examples: 1-1024 or 22
        #[arg(short, long, default_value = "1-1024")]
        ports: String,
    },

    /// Check and describe a single port
    Describe {
        #[command(flatten)]
        opts: ScanArgs,

        /// Port to describe
        #[arg(short, long)]
        port: u16,
    },

    /// Print the well-known port table
    KnownPorts,
}

#[derive(Args, Clone)]
pub struct ScanArgs {
    /// Target host (IP or hostname). Example: 127.0.0.1 or example.com
    #[arg(short = 't', long, required = true)]
    pub target: String,

    /// Max concurrent connection attempts (overrides the preset)
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// Connect timeout in milliseconds, 0 for none (overrides the preset)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Preset: fast, balanced, accurate
    #[arg(long, default_value = "balanced", value_parser = ["fast", "balanced", "accurate"])]
    pub preset: String,

    /// Identify services from the port table only, without active probes
    #[arg(long)]
    pub no_predict: bool,

    /// Output format: text, json, csv
    #[arg(short, long, default_value = "text")]
    pub output_format: String,
}
