use async_trait::async_trait;
use tracing::debug;

use crate::error::{Error, Result};
use crate::protocol::UPDATE_PATH;
use crate::protocol::request::Request;
use crate::protocol::response::{Response, parse_response};

/// One synchronous request/response exchange with the update server. No retry
/// here; an agent's next cycle is the retry.
#[async_trait]
pub trait UpdateTransport: Send + Sync {
    async fn exchange(&self, agent_id: &str, request: &Request) -> Result<Response>;
}

pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: server.into(),
        }
    }

    fn update_url(&self) -> String {
        format!("{}{}", self.endpoint.trim_end_matches('/'), UPDATE_PATH)
    }
}

#[async_trait]
impl UpdateTransport for HttpTransport {
    async fn exchange(&self, agent_id: &str, request: &Request) -> Result<Response> {
        let raw = request.to_xml()?;
        debug!("{}: request: {}", agent_id, raw);

        let reply = self
            .client
            .post(self.update_url())
            .header(reqwest::header::CONTENT_TYPE, "text/xml")
            .body(raw)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let body = reply.text().await.map_err(|e| Error::Network(e.to_string()))?;
        debug!("{}: response: {}", agent_id, body);

        parse_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_url_normalizes_trailing_slash() {
        let plain = HttpTransport::new("http://updates.test");
        let slashed = HttpTransport::new("http://updates.test/");
        assert_eq!(plain.update_url(), "http://updates.test/v1/update/");
        assert_eq!(slashed.update_url(), "http://updates.test/v1/update/");
    }
}
