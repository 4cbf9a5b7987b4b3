//! Fingerprint Engine - Service identification
//!
//! This crate provides:
//! - the static known-port table
//! - active predictors for common web servers
//! - the identification policy that combines both per port

mod identify;
mod known_ports;
pub mod predictors;

pub use identify::{is_http_port, Identifier, MYSQL_READ_TIMEOUT, MYSQL_WINDOW};
pub use known_ports::{entries as known_port_entries, lookup, predict_port};
pub use predictors::{default_predictors, ApachePredictor, NginxPredictor};
