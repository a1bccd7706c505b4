#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Collects uploaded score reports into a JSON-lines file.

use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{ConnectInfo, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::{io::AsyncWriteExt, net::TcpListener, sync::Mutex};

/// Server version reported by `/version` and stamped into stored reports.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Address variable, e.g. `0.0.0.0:8888`.
pub const HTTP_ENV: &str = "GRADEGATE_HTTP";
/// Semester variable stamped into stored reports.
pub const SEMESTER_ENV: &str = "GRADEGATE_SEMESTER";
/// Store file variable.
pub const STORE_ENV: &str = "GRADEGATE_STORE";

/// Server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address
    pub http:     String,
    /// Semester stamped into every stored report
    pub semester: Option<String>,
    /// JSON-lines file reports are appended to
    pub store:    PathBuf,
}

impl ServerConfig {
    /// Reads the settings from the environment.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            http:     var(HTTP_ENV).unwrap_or_else(|| "0.0.0.0:8888".to_string()),
            semester: var(SEMESTER_ENV),
            store:    var(STORE_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("reports.jsonl")),
        }
    }
}

/// Counters shown on the status page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    /// Always `gradegate-server`
    pub name:          String,
    /// Server version
    pub version:       String,
    /// Start time
    pub up_since:      DateTime<Utc>,
    /// Status page hits
    pub status_count:  u64,
    /// Reports stored
    pub upload_count:  u64,
    /// Reports that could not be stored
    pub failure_count: u64,
    /// Time of the last stored report
    pub last_upload:   Option<DateTime<Utc>>,
}

/// Shared server state. The lock also serializes appends to the store.
struct AppState {
    /// Settings
    config: ServerConfig,
    /// Counters
    status: Mutex<Status>,
}

/// Builds the router.
pub fn router(config: ServerConfig) -> Router {
    let state = Arc::new(AppState {
        config,
        status: Mutex::new(Status {
            name:          "gradegate-server".to_string(),
            version:       VERSION.to_string(),
            up_since:      Utc::now(),
            status_count:  0,
            upload_count:  0,
            failure_count: 0,
            last_upload:   None,
        }),
    });

    Router::new()
        .route("/", get(status).post(upload))
        .route("/version", get(|| async { VERSION }))
        .fallback(|| async { StatusCode::NOT_FOUND })
        .with_state(state)
}

/// Serves `config` on an already bound listener.
pub async fn serve(listener: TcpListener, config: ServerConfig) -> Result<()> {
    let addr = listener.local_addr().context("Listener has no local address")?;
    tracing::info!("Listening on {addr}, storing reports in {}", config.store.display());
    axum::serve(
        listener,
        router(config).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server stopped")
}

/// `GET /`
async fn status(State(state): State<Arc<AppState>>) -> Json<Status> {
    let mut status = state.status.lock().await;
    status.status_count += 1;
    Json(status.clone())
}

/// `POST /`
async fn upload(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    body: String,
) -> impl IntoResponse {
    let Ok(Value::Object(mut report)) = serde_json::from_str::<Value>(&body) else {
        tracing::debug!("Rejected upload from {peer}: not a JSON object");
        return StatusCode::BAD_REQUEST;
    };

    let now = Utc::now();
    report.insert("receivedVersion".into(), VERSION.into());
    report.insert(
        "receivedTime".into(),
        now.to_rfc3339_opts(SecondsFormat::Millis, true).into(),
    );
    report.insert("receivedIP".into(), peer.ip().to_string().into());
    report.insert(
        "receivedSemester".into(),
        state.config.semester.clone().map_or(Value::Null, Value::from),
    );

    let mut status = state.status.lock().await;
    match append(&state.config.store, &Value::Object(report)).await {
        Ok(()) => {
            status.upload_count += 1;
            status.last_upload = Some(now);
            StatusCode::OK
        }
        Err(e) => {
            tracing::warn!("Could not store upload from {peer}: {e:#}");
            status.failure_count += 1;
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Appends `report` as one line.
async fn append(store: &Path, report: &Value) -> Result<()> {
    let mut line = serde_json::to_string(report)?;
    line.push('\n');
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(store)
        .await
        .with_context(|| format!("Could not open {}", store.display()))?;
    file.write_all(line.as_bytes())
        .await
        .with_context(|| format!("Could not write {}", store.display()))?;
    file.flush()
        .await
        .with_context(|| format!("Could not flush {}", store.display()))?;
    Ok(())
}
