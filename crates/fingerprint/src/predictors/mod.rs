//! Active fingerprinting strategies

mod apache;
pub mod http;
mod nginx;

use portsage_common::Predictor;
use std::sync::Arc;

pub use apache::ApachePredictor;
pub use nginx::NginxPredictor;

/// Predictors every new scanner starts with, in evaluation order.
pub fn default_predictors() -> Vec<Arc<dyn Predictor>> {
    vec![Arc::new(ApachePredictor::new()), Arc::new(NginxPredictor::new())]
}
