use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::configuration::Settings;
use crate::manager::{is_quota_error, ManagerError, OpenAiManager, ResearchManager, BILLING_HINT};
use crate::mcp::McpSseClient;
use crate::reports::{self, ReportEntry, RECENT_LIMIT};

pub struct AppState {
    settings: Settings,
    manager: Arc<dyn ResearchManager>,
    // One fixed report file on disk, so runs take turns.
    run_lock: tokio::sync::Mutex<()>,
}

impl AppState {
    pub fn new(settings: Settings, manager: Arc<dyn ResearchManager>) -> Self {
        Self {
            settings,
            manager,
            run_lock: tokio::sync::Mutex::new(()),
        }
    }
}

#[derive(serde::Deserialize)]
pub struct AnalyzeRequest {
    query: String,
}

#[derive(serde::Serialize, serde::Deserialize)]
pub struct AnalyzeResponse {
    pub report: String,
    pub status: String,
    pub hint: Option<String>,
}

#[derive(serde::Serialize, serde::Deserialize)]
pub struct StatusResponse {
    pub api_key_configured: bool,
    pub model: String,
    pub mcp_url: String,
    /// None when the configured URL does not even parse.
    pub mcp_reachable: Option<bool>,
}

/// Failures surface as a stringified message in the report pane; a quota
/// mention also carries the billing hint.
struct ApiError(anyhow::Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let report = format!("Error: {:#}", self.0);
        let hint = is_quota_error(&report).then(|| BILLING_HINT.to_string());
        tracing::error!("analysis request failed: {:#}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(AnalyzeResponse {
                report,
                status: "error".to_string(),
                hint,
            }),
        )
            .into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError(err)
    }
}

impl From<ManagerError> for ApiError {
    fn from(err: ManagerError) -> Self {
        ApiError(err.into())
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(serve_index))
        .route("/api/analyze", post(handle_analyze))
        .route("/api/status", get(handle_status))
        .route("/api/reports", get(handle_reports))
        .route("/api/reports/:name", get(handle_report))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run_server(settings: Settings) -> anyhow::Result<()> {
    let port = settings.port;
    let manager = Arc::new(OpenAiManager::new(settings.clone()));
    let state = Arc::new(AppState::new(settings, manager));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("dashboard listening on http://localhost:{port}");

    axum::serve(
        tokio::net::TcpListener::bind(&addr).await?,
        app(state).into_make_service(),
    )
    .await?;
    Ok(())
}

async fn handle_analyze(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let query = request.query.trim();
    if query.is_empty() {
        return Err(anyhow::anyhow!("query must not be empty").into());
    }
    if !state.settings.api_key_configured() {
        return Err(anyhow::anyhow!("OPENAI_API_KEY not configured").into());
    }

    // Fresh handle per run, pointed at the configured local server.
    let mcp = McpSseClient::new("Web Interface Server", &state.settings.mcp_url)?;

    let _running = state.run_lock.lock().await;
    state.manager.run(query, &mcp).await?;

    let report = reports::read_latest(&state.settings.report_file).await;
    Ok(Json(AnalyzeResponse {
        report,
        status: "complete".to_string(),
        hint: None,
    }))
}

async fn handle_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let mcp_reachable = match McpSseClient::new("status", &state.settings.mcp_url) {
        Ok(client) => Some(client.probe().await.is_ok()),
        Err(_) => None,
    };
    Json(StatusResponse {
        api_key_configured: state.settings.api_key_configured(),
        model: state.settings.model.clone(),
        mcp_url: state.settings.mcp_url.clone(),
        mcp_reachable,
    })
}

async fn handle_reports(State(state): State<Arc<AppState>>) -> Json<Vec<ReportEntry>> {
    Json(reports::list_recent(&state.settings.reports_dir, RECENT_LIMIT))
}

async fn handle_report(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Response {
    match reports::read_report(&state.settings.reports_dir, &name) {
        Ok(contents) => (StatusCode::OK, contents).into_response(),
        Err(e) => (StatusCode::NOT_FOUND, e.to_string()).into_response(),
    }
}

async fn serve_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>Financial Research Agent</title>
    <style>
        body {
            font-family: Arial, sans-serif;
            max-width: 1100px;
            margin: 0 auto;
            padding: 20px;
        }
        .layout {
            display: flex;
            gap: 24px;
        }
        .sidebar {
            width: 260px;
            flex-shrink: 0;
        }
        .main {
            flex-grow: 1;
            display: flex;
            flex-direction: column;
            gap: 12px;
        }
        textarea {
            width: 100%;
            height: 100px;
            padding: 10px;
            box-sizing: border-box;
        }
        button {
            padding: 8px 16px;
            background-color: #007bff;
            color: white;
            border: none;
            border-radius: 4px;
            cursor: pointer;
        }
        button:disabled {
            background-color: #9fc3e8;
            cursor: wait;
        }
        .example {
            display: block;
            width: 100%;
            margin: 4px 0;
            background-color: #e9ecef;
            color: #212529;
            text-align: left;
        }
        #status {
            padding: 10px;
            background-color: #f8f9fa;
            border-radius: 4px;
        }
        #hint {
            padding: 10px;
            background-color: #fff3cd;
            border-radius: 4px;
            display: none;
        }
        #report {
            white-space: pre-wrap;
            padding: 20px;
            border: 1px solid #ddd;
            border-radius: 4px;
            min-height: 200px;
        }
        .report-link {
            display: block;
            margin: 4px 0;
            background-color: #f8f9fa;
            color: #212529;
            text-align: left;
        }
        .muted {
            color: #6c757d;
        }
    </style>
</head>
<body>
    <h1>&#128202; Financial Research Agent</h1>
    <div class="layout">
        <div class="sidebar">
            <h3>Configuration</h3>
            <div id="key-status" class="muted">checking...</div>
            <div id="mcp-status" class="muted">checking...</div>
            <h3>Recent Reports</h3>
            <div id="recent" class="muted">No reports found yet</div>
            <p>
                <label>
                    <input type="checkbox" id="auto-refresh">
                    Auto-refresh every 30 seconds
                </label>
            </p>
        </div>
        <div class="main">
            <label for="query">Enter your financial research query:</label>
            <textarea id="query" placeholder="e.g., Analyze Apple's most recent quarter"></textarea>
            <div id="examples">
                <strong>Example Queries:</strong>
            </div>
            <button id="run" onclick="runAnalysis()">&#128640; Run Analysis</button>
            <div id="status">Enter a query and click Run Analysis to generate a financial report.</div>
            <div id="hint"></div>
            <h3>Generated Report</h3>
            <div id="report"></div>
        </div>
    </div>

    <script>
    const EXAMPLES = [
        "Analyze Apple's most recent quarter",
        "Write a report on Tesla's financial performance",
        "Research Microsoft's competitive position in cloud services",
        "Evaluate Amazon's e-commerce growth trends",
        "Analyze NVIDIA's AI chip market position",
    ];

    const examplesEl = document.getElementById('examples');
    for (const example of EXAMPLES) {
        const btn = document.createElement('button');
        btn.className = 'example';
        btn.textContent = example;
        btn.onclick = () => { document.getElementById('query').value = example; };
        examplesEl.appendChild(btn);
    }

    async function refreshStatus() {
        const data = await (await fetch('/api/status')).json();
        document.getElementById('key-status').textContent =
            'OpenAI API Key: ' + (data.api_key_configured ? 'configured' : 'missing');
        document.getElementById('mcp-status').textContent =
            'MCP Server: ' + (data.mcp_reachable ? 'reachable' : 'unreachable');
    }

    async function refreshReports() {
        const reports = await (await fetch('/api/reports')).json();
        const recent = document.getElementById('recent');
        recent.textContent = '';
        if (reports.length === 0) {
            recent.textContent = 'No reports found yet';
            return;
        }
        for (const report of reports) {
            const btn = document.createElement('button');
            btn.className = 'report-link';
            btn.textContent = report.stem;
            btn.onclick = async () => {
                const resp = await fetch('/api/reports/' + encodeURIComponent(report.name));
                document.getElementById('report').textContent = await resp.text();
            };
            recent.appendChild(btn);
        }
    }

    async function runAnalysis() {
        const query = document.getElementById('query').value.trim();
        const status = document.getElementById('status');
        const hint = document.getElementById('hint');
        const run = document.getElementById('run');
        if (!query) {
            status.textContent = 'Please enter a query first.';
            return;
        }

        run.disabled = true;
        hint.style.display = 'none';
        status.textContent = 'Running financial analysis...';
        try {
            const resp = await fetch('/api/analyze', {
                method: 'POST',
                headers: { 'Content-Type': 'application/json' },
                body: JSON.stringify({ query }),
            });
            const data = await resp.json();
            document.getElementById('report').textContent = data.report;
            status.textContent = data.status === 'complete'
                ? 'Analysis complete!'
                : 'Analysis failed.';
            if (data.hint) {
                hint.textContent = data.hint;
                hint.style.display = 'block';
            }
            refreshReports();
        } catch (error) {
            status.textContent = 'Error: ' + error.message;
        } finally {
            run.disabled = false;
        }
    }

    let refreshTimer = null;
    document.getElementById('auto-refresh').onchange = (event) => {
        if (event.target.checked) {
            refreshTimer = setInterval(() => {
                refreshStatus();
                refreshReports();
            }, 30000);
        } else {
            clearInterval(refreshTimer);
        }
    };

    refreshStatus();
    refreshReports();
    </script>
</body>
</html>
"#;
