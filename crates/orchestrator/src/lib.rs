//! Orchestrator - scan engine and progress reporting

mod progress;
mod scanner;

pub use progress::ProgressTracker;
pub use scanner::{PortScanner, Sweep};
