use anyhow::{Context, Result};
use reqwest::Client;
use url::Url;

/// Handle to an MCP server reachable over SSE. The protocol itself is the
/// research manager's business; this type only validates the endpoint and
/// answers reachability questions.
#[derive(Debug, Clone)]
pub struct McpSseClient {
    name: String,
    url: Url,
    client: Client,
}

impl McpSseClient {
    pub fn new(name: impl Into<String>, url: &str) -> Result<Self> {
        let url = Url::parse(url).with_context(|| format!("invalid MCP server URL: {url}"))?;
        Ok(Self {
            name: name.into(),
            url,
            client: Client::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoint(&self) -> &Url {
        &self.url
    }

    /// One GET against the SSE endpoint to see whether anything is listening.
    pub async fn probe(&self) -> Result<()> {
        let response = self
            .client
            .get(self.url.clone())
            .header("Accept", "text/event-stream")
            .send()
            .await
            .with_context(|| format!("MCP server {} unreachable at {}", self.name, self.url))?;

        if !response.status().is_success() {
            anyhow::bail!(
                "MCP server {} answered {} at {}",
                self.name,
                response.status(),
                self.url
            );
        }
        Ok(())
    }
}
