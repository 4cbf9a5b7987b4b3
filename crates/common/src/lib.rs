//! Portsage Common - Shared types and traits
//!
//! This crate provides the core types, traits, and errors used across
//! the portsage scanner crates:
//! - `Connector`, the single network primitive (dial with timeout)
//! - `Predictor`, the active service fingerprinting capability
//! - scanner configuration, port ranges and scan results

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{ScanError, ScanResult};
pub use traits::{Connector, Predictor, ProbeContext};
pub use types::{
    host_port, OpenPortSet, PortRange, PortReport, PortState, ScanStats, ScannerConfig, UNKNOWN,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
