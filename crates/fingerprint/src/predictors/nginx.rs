//! nginx predictor

use async_trait::async_trait;
use once_cell::sync::Lazy;
use portsage_common::{Predictor, ProbeContext};
use regex::Regex;
use tracing::{debug, instrument};

use super::http::{fetch, HttpResponse};

/// Footer of nginx's built-in error pages, e.g. `<center>nginx/1.18.0</center>`.
static FOOTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<center>\s*(nginx(?:/[\d.]+)?)\s*</center>").unwrap());

/// Identifies nginx from a `GET /` reply: the `Server` header first, then
/// the stock error-page footer when the header is hidden or rewritten.
#[derive(Debug, Default)]
pub struct NginxPredictor;

impl NginxPredictor {
    pub fn new() -> Self {
        Self
    }

    fn identify(response: &HttpResponse) -> Option<String> {
        if let Some(server) = response.server() {
            if server.to_ascii_lowercase().contains("nginx") {
                return Some(server.to_string());
            }
        }

        FOOTER_RE
            .captures(&response.body)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    }
}

#[async_trait]
impl Predictor for NginxPredictor {
    fn name(&self) -> &str {
        "nginx"
    }

    #[instrument(skip(self, ctx), fields(addr = %ctx.host_port))]
    async fn predict(&self, ctx: &ProbeContext<'_>) -> Option<String> {
        let response = fetch(ctx, "GET").await?;
        let label = Self::identify(&response);
        debug!("nginx predictor result: {:?}", label);
        label
    }
}
