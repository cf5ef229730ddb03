use std::env;
use std::path::PathBuf;

use anyhow::Result;

#[derive(Debug, Clone)]
pub struct Settings {
    /// Presence-checked only, never validated against the API.
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub mcp_url: String,
    pub reports_dir: PathBuf,
    pub report_file: PathBuf,
    pub port: u16,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_mcp_url() -> String {
    "http://localhost:8000/sse".to_string()
}

fn default_reports_dir() -> PathBuf {
    PathBuf::from("/tmp/financial-agent-reports")
}

fn default_report_file() -> PathBuf {
    PathBuf::from("financial_report.txt")
}

fn default_port() -> u16 {
    3000
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings through a lookup closure so tests can feed their own
    /// environment instead of mutating the process one.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup("OPENAI_API_KEY").filter(|v| !v.is_empty());
        if api_key.is_none() {
            tracing::warn!("OPENAI_API_KEY not set; analysis runs will be rejected");
        }

        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT is not a valid port number: {raw}"))?,
            None => default_port(),
        };

        let settings = Settings {
            api_key,
            model: lookup("OPENAI_MODEL").unwrap_or_else(default_model),
            api_base: lookup("OPENAI_API_BASE").unwrap_or_else(default_api_base),
            mcp_url: lookup("MCP_SERVER_URL").unwrap_or_else(default_mcp_url),
            reports_dir: lookup("REPORTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(default_reports_dir),
            report_file: lookup("REPORT_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(default_report_file),
            port,
        };

        tracing::debug!(
            model = %settings.model,
            mcp_url = %settings.mcp_url,
            reports_dir = %settings.reports_dir.display(),
            "loaded configuration"
        );

        Ok(settings)
    }

    pub fn api_key_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_env_is_empty() {
        let settings = Settings::from_lookup(|_| None).unwrap();
        assert!(settings.api_key.is_none());
        assert_eq!(settings.model, "gpt-4o-mini");
        assert_eq!(settings.mcp_url, "http://localhost:8000/sse");
        assert_eq!(
            settings.reports_dir,
            PathBuf::from("/tmp/financial-agent-reports")
        );
        assert_eq!(settings.report_file, PathBuf::from("financial_report.txt"));
        assert_eq!(settings.port, 3000);
    }

    #[test]
    fn env_overrides_are_picked_up() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_MODEL", "gpt-4o"),
            ("MCP_SERVER_URL", "http://localhost:9000/sse"),
            ("REPORTS_DIR", "/var/reports"),
            ("PORT", "8080"),
        ]))
        .unwrap();
        assert!(settings.api_key_configured());
        assert_eq!(settings.model, "gpt-4o");
        assert_eq!(settings.mcp_url, "http://localhost:9000/sse");
        assert_eq!(settings.reports_dir, PathBuf::from("/var/reports"));
        assert_eq!(settings.port, 8080);
    }

    #[test]
    fn empty_api_key_counts_as_missing() {
        let settings = Settings::from_lookup(lookup_from(&[("OPENAI_API_KEY", "")])).unwrap();
        assert!(!settings.api_key_configured());
    }

    #[test]
    fn bad_port_is_an_error() {
        let result = Settings::from_lookup(lookup_from(&[("PORT", "not-a-port")]));
        assert!(result.is_err());
    }
}
