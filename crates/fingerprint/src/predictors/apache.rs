//! Apache httpd predictor

use async_trait::async_trait;
use portsage_common::{Predictor, ProbeContext};
use tracing::{debug, instrument};

use super::http::{fetch, HttpResponse};

/// Identifies Apache httpd from the `Server` header of a `HEAD /` reply.
#[derive(Debug, Default)]
pub struct ApachePredictor;

impl ApachePredictor {
    pub fn new() -> Self {
        Self
    }

    fn identify(response: &HttpResponse) -> Option<String> {
        let server = response.server()?;
        if server.to_ascii_lowercase().contains("apache") {
            Some(server.to_string())
        } else {
            None
        }
    }
}

#[async_trait]
impl Predictor for ApachePredictor {
    fn name(&self) -> &str {
        "apache"
    }

    #[instrument(skip(self, ctx), fields(addr = %ctx.host_port))]
    async fn predict(&self, ctx: &ProbeContext<'_>) -> Option<String> {
        let response = fetch(ctx, "HEAD").await?;
        let label = Self::identify(&response);
        debug!("Apache predictor result: {:?}", label);
        label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(raw: &str) -> HttpResponse {
        HttpResponse::parse(raw.as_bytes()).unwrap()
    }

    #[test]
    fn test_matches_apache_server_header() {
        let r = response("HTTP/1.1 200 OK\r\nServer: Apache/2.4.41 (Ubuntu)\r\n\r\n");
        assert_eq!(
            ApachePredictor::identify(&r).as_deref(),
            Some("Apache/2.4.41 (Ubuntu)")
        );
    }

    #[test]
    fn test_ignores_other_servers() {
        let r = response("HTTP/1.1 200 OK\r\nServer: nginx/1.18.0\r\n\r\n");
        assert_eq!(ApachePredictor::identify(&r), None);

        let r = response("HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n");
        assert_eq!(ApachePredictor::identify(&r), None);
    }
}
