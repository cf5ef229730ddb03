use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

use crate::configuration::Settings;
use crate::mcp::McpSseClient;

const ANALYST_INSTRUCTIONS: &str = r#"You are a senior financial analyst.
Research the requested company or market question and write a concise report
with sections for overview, recent performance, risks, and outlook.
Cite concrete figures where you can."#;

/// Extra guidance appended to stringified errors that look like a billing
/// problem rather than a bug.
pub const BILLING_HINT: &str =
    "This looks like an OpenAI quota issue. Check your billing at \
     https://platform.openai.com/account/billing";

/// Single classification the UI layer applies to failures: a
/// case-insensitive "quota" substring gets the billing hint, nothing else is
/// distinguished.
pub fn is_quota_error(message: &str) -> bool {
    message.to_lowercase().contains("quota")
}

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("OPENAI_API_KEY not configured")]
    MissingCredential,
    #[error("request to the model API failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("model API returned {status}: {body}")]
    Api { status: StatusCode, body: String },
    #[error("model API returned no report content")]
    EmptyResponse,
    #[error("failed to write report to {path}: {source}")]
    Report {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// The research pipeline as the dashboard sees it: one call that leaves the
/// report artifact on disk. The trait keeps the pipeline swappable — the
/// full multi-step agent lives elsewhere.
#[async_trait]
pub trait ResearchManager: Send + Sync {
    async fn run(&self, query: &str, mcp: &McpSseClient) -> Result<(), ManagerError>;
}

pub struct OpenAiManager {
    settings: Settings,
    client: Client,
}

impl OpenAiManager {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            client: Client::new(),
        }
    }

    async fn generate(&self, api_key: &str, query: &str) -> Result<String, ManagerError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.settings.api_base))
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&json!({
                "model": self.settings.model,
                "messages": [
                    { "role": "system", "content": ANALYST_INSTRUCTIONS },
                    { "role": "user", "content": query }
                ],
                "temperature": 0.3,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ManagerError::Api { status, body });
        }

        let data = response.json::<serde_json::Value>().await?;
        let content = data["choices"][0]["message"]["content"]
            .as_str()
            .ok_or(ManagerError::EmptyResponse)?;
        Ok(content.to_string())
    }

    async fn persist(&self, report: &str) -> Result<(), ManagerError> {
        let path = &self.settings.report_file;
        tokio::fs::write(path, report)
            .await
            .map_err(|source| ManagerError::Report {
                path: path.clone(),
                source,
            })?;

        // Archive a copy so the dashboard sidebar can recall prior runs.
        // Archive failures are not worth failing the run over.
        let archive = self.settings.reports_dir.join(archive_name());
        if let Err(e) = tokio::fs::create_dir_all(&self.settings.reports_dir).await {
            tracing::warn!("could not create reports dir: {e}");
        } else if let Err(e) = tokio::fs::write(&archive, report).await {
            tracing::warn!("could not archive report to {}: {e}", archive.display());
        }
        Ok(())
    }
}

fn archive_name() -> String {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("financial_report_{stamp}.txt")
}

#[async_trait]
impl ResearchManager for OpenAiManager {
    async fn run(&self, query: &str, mcp: &McpSseClient) -> Result<(), ManagerError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or(ManagerError::MissingCredential)?;

        tracing::info!(
            query,
            mcp = %mcp.endpoint(),
            model = %self.settings.model,
            "starting financial analysis"
        );

        let report = self.generate(api_key, query).await?;
        self.persist(&report).await?;

        tracing::info!(
            report = %self.settings.report_file.display(),
            "analysis complete"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_match_is_case_insensitive() {
        assert!(is_quota_error("insufficient_quota"));
        assert!(is_quota_error("You exceeded your current QUOTA"));
        assert!(!is_quota_error("rate limit reached"));
        assert!(!is_quota_error("connection refused"));
    }

    #[test]
    fn api_error_mentions_status_and_body() {
        let err = ManagerError::Api {
            status: StatusCode::TOO_MANY_REQUESTS,
            body: "insufficient_quota".into(),
        };
        let text = err.to_string();
        assert!(text.contains("429"));
        assert!(text.contains("insufficient_quota"));
        assert!(is_quota_error(&text));
    }

    #[test]
    fn archive_names_are_report_txt_files() {
        let name = archive_name();
        assert!(name.starts_with("financial_report_"));
        assert!(name.ends_with(".txt"));
    }
}
