use std::path::PathBuf;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use url::Url;

const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(5);
const USER_AGENT: &str = "Mozilla/5.0";
const OCTET_STREAM: &str = "application/octet-stream";

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("missing url parameter")]
    MissingTarget,
    #[error("unsupported target: {0}")]
    UnsupportedScheme(String),
    #[error("not a file: {}", .0.display())]
    NotAFile(PathBuf),
    #[error("upstream request to {url} failed")]
    Upstream {
        url: String,
        #[source]
        source: ureq::Error,
    },
    #[error("reading target failed")]
    Io(#[from] std::io::Error),
    #[error("relay task failed")]
    Task(#[from] tokio::task::JoinError),
    #[error("building response failed")]
    Response(#[from] axum::http::Error),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MissingTarget | RelayError::UnsupportedScheme(_) => StatusCode::BAD_REQUEST,
            RelayError::NotAFile(_) => StatusCode::NOT_FOUND,
            RelayError::Upstream { .. } | RelayError::Io(_) | RelayError::Task(_) => {
                StatusCode::BAD_GATEWAY
            }
            RelayError::Response(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        debug!(error = %self, "relay request failed");
        (self.status(), self.to_string()).into_response()
    }
}

#[derive(Clone)]
pub struct RelayState {
    agent: ureq::Agent,
}

impl RelayState {
    pub fn new() -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(UPSTREAM_TIMEOUT))
            .build()
            .into();
        Self { agent }
    }
}

impl Default for RelayState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RelayQuery {
    pub url: Option<String>,
}

pub fn router(state: RelayState) -> Router {
    Router::new().route("/relay", get(relay)).with_state(state)
}

// GET /relay?url=<target>
pub async fn relay(
    State(state): State<RelayState>,
    Query(query): Query<RelayQuery>,
) -> Result<Response<Body>, RelayError> {
    // Overlays often encode the target twice; decode once more.
    let raw = query.url.unwrap_or_default();
    let target = match urlencoding::decode(&raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw,
    };
    let target = target.trim();
    if target.is_empty() {
        return Err(RelayError::MissingTarget);
    }

    let (data, content_type) = fetch_target(&state, target).await?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, data.len().to_string())
        .header(header::CACHE_CONTROL, "max-age=30")
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .body(Body::from(data))?;

    Ok(response)
}

async fn fetch_target(state: &RelayState, target: &str) -> Result<(Vec<u8>, String), RelayError> {
    let url = Url::parse(target).map_err(|_| RelayError::UnsupportedScheme(target.to_string()))?;

    match url.scheme() {
        "http" | "https" => {
            let agent = state.agent.clone();
            let target = target.to_string();
            tokio::task::spawn_blocking(move || fetch_remote(&agent, &target)).await?
        }
        "file" => {
            let path = url
                .to_file_path()
                .map_err(|_| RelayError::NotAFile(PathBuf::from(url.path())))?;
            let is_file = tokio::fs::metadata(&path)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false);
            if !is_file {
                return Err(RelayError::NotAFile(path));
            }
            let data = tokio::fs::read(&path).await?;
            let content_type = mime_guess::from_path(&path).first_or_octet_stream().to_string();
            Ok((data, content_type))
        }
        _ => Err(RelayError::UnsupportedScheme(target.to_string())),
    }
}

fn fetch_remote(agent: &ureq::Agent, url: &str) -> Result<(Vec<u8>, String), RelayError> {
    let upstream = |source| RelayError::Upstream {
        url: url.to_string(),
        source,
    };

    let mut response = agent
        .get(url)
        .header("User-Agent", USER_AGENT)
        .call()
        .map_err(upstream)?;

    // Drop parameters such as `; charset=binary`.
    let declared = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    let data = response.body_mut().read_to_vec().map_err(upstream)?;

    let content_type = declared.unwrap_or_else(|| {
        Url::parse(url)
            .ok()
            .and_then(|u| mime_guess::from_path(u.path()).first())
            .map(|m| m.to_string())
            .unwrap_or_else(|| OCTET_STREAM.to_string())
    });
    Ok((data, content_type))
}
