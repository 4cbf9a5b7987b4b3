//! Minimal HTTP/1.0 exchange shared by the web server predictors

use portsage_common::ProbeContext;
use portsage_scanner_tcp::BannerGrabber;
use tracing::debug;

/// Response bytes kept for matching.
const MAX_RESPONSE: usize = 8 * 1024;

/// Parsed status line, headers and (possibly truncated) body.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: Option<u16>,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// Parse raw response bytes. Returns `None` unless the first line looks
    /// like an HTTP status line.
    pub fn parse(raw: &[u8]) -> Option<Self> {
        let text = String::from_utf8_lossy(raw);
        let (head, body) = match text.find("\r\n\r\n") {
            Some(idx) => (&text[..idx], &text[idx + 4..]),
            None => match text.find("\n\n") {
                Some(idx) => (&text[..idx], &text[idx + 2..]),
                None => (&text[..], ""),
            },
        };

        let mut lines = head.lines();
        let status_line = lines.next()?.trim();
        if !status_line.starts_with("HTTP/") {
            return None;
        }
        let status = status_line
            .split_whitespace()
            .nth(1)
            .and_then(|code| code.parse().ok());

        let headers = lines
            .filter_map(|line| line.split_once(':'))
            .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
            .collect();

        Some(Self {
            status,
            headers,
            body: body.to_string(),
        })
    }

    /// First header named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn server(&self) -> Option<&str> {
        self.header("server").filter(|s| !s.is_empty())
    }
}

/// Send `METHOD / HTTP/1.0` and parse the reply. Any failure is `None`.
pub async fn fetch(ctx: &ProbeContext<'_>, method: &str) -> Option<HttpResponse> {
    let mut stream = match ctx.open().await {
        Ok(s) => s,
        Err(e) => {
            debug!("HTTP probe could not connect to {}: {}", ctx.host_port, e);
            return None;
        }
    };

    let request = format!(
        "{} / HTTP/1.0\r\nHost: {}\r\nUser-Agent: portsage\r\nConnection: close\r\n\r\n",
        method, ctx.host_port
    );
    let raw = BannerGrabber::new(ctx.timeout)
        .exchange(&mut stream, request.as_bytes(), MAX_RESPONSE)
        .await
        .map_err(|e| debug!("HTTP probe to {} failed: {}", ctx.host_port, e))
        .ok()?;

    HttpResponse::parse(&raw)
}
