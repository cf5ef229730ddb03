use crate::configuration::Settings;
use crate::manager::OpenAiManager;
use crate::mcp::McpSseClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Fail,
}

#[derive(Debug)]
pub struct CheckResult {
    pub name: &'static str,
    pub status: CheckStatus,
    pub detail: String,
}

impl CheckResult {
    fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: CheckStatus::Pass,
            detail: detail.into(),
        }
    }

    fn fail(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: CheckStatus::Fail,
            detail: detail.into(),
        }
    }
}

/// Ordered capability checks. The sequence stops at the first failure, so a
/// failed credential check never reaches the client probes.
pub fn run_checks(lookup: impl Fn(&str) -> Option<String>) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let api_key = lookup("OPENAI_API_KEY").filter(|v| !v.is_empty());
    match api_key {
        Some(key) => {
            let prefix: String = key.chars().take(10).collect();
            results.push(CheckResult::pass(
                "credential",
                format!("OpenAI API key found: {prefix}..."),
            ));
        }
        None => {
            results.push(CheckResult::fail(
                "credential",
                "OPENAI_API_KEY environment variable not set!",
            ));
            return results;
        }
    }

    let settings = match Settings::from_lookup(&lookup) {
        Ok(settings) => {
            let _manager = OpenAiManager::new(settings.clone());
            results.push(CheckResult::pass(
                "agent core",
                format!("agent core ready (model: {})", settings.model),
            ));
            settings
        }
        Err(e) => {
            results.push(CheckResult::fail("agent core", format!("agent core failed: {e}")));
            return results;
        }
    };

    match McpSseClient::new("smoke-test", &settings.mcp_url) {
        Ok(client) => results.push(CheckResult::pass(
            "mcp client",
            format!("MCP client ready ({})", client.endpoint()),
        )),
        Err(e) => results.push(CheckResult::fail(
            "mcp client",
            format!("MCP client failed: {e:#}"),
        )),
    }

    results
}

pub fn exit_code(results: &[CheckResult]) -> i32 {
    if results.iter().any(|r| r.status == CheckStatus::Fail) {
        1
    } else {
        0
    }
}
