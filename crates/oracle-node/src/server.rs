use crate::presenter::{render_failure, render_quote, PriceFormat};
use crate::race::PriceRace;
use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use spot_oracle_common::ServerConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// State shared by every handler
pub struct AppState {
    pub race: PriceRace,
    pub title: String,
}

/// Query string of a spot request; a repeated key keeps its first value
#[derive(Debug, Default)]
pub struct SpotQuery {
    details: Option<String>,
}

impl SpotQuery {
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let details = pairs
            .into_iter()
            .find(|(key, _)| key == "details")
            .map(|(_, value)| value);
        Self { details }
    }

    fn format(&self) -> PriceFormat {
        if self.details.as_deref() == Some("true") {
            PriceFormat::Detailed
        } else {
            PriceFormat::Plain
        }
    }
}

/// HTTP front end owning its own route table
pub struct SpotServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl SpotServer {
    pub fn new(config: ServerConfig, race: PriceRace) -> Self {
        let state = Arc::new(AppState {
            race,
            title: config.title.clone(),
        });
        Self { config, state }
    }

    pub fn router(&self) -> Router {
        create_router(Arc::clone(&self.state), self.config.handler_timeout())
    }

    /// Binds `listen_addr` and serves until Ctrl-C.
    pub async fn serve(self) -> Result<()> {
        let addr = self.config.socket_addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind to {}", addr))?;
        self.serve_on(listener).await
    }

    pub async fn serve_on(self, listener: TcpListener) -> Result<()> {
        let addr = listener.local_addr().context("Listener has no local address")?;
        info!("Spot price API listening on http://{}", addr);
        info!("  GET /api/v1/spot/{{pair}} - first price from {} exchanges", self.state.race.exchanges().len());

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP server failed")
    }
}

pub fn create_router(state: Arc<AppState>, handler_timeout: Duration) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/v1/spot", get(missing_pair).fallback(method_not_allowed))
        .route("/api/v1/spot/", get(missing_pair).fallback(method_not_allowed))
        .route("/api/v1/spot/:pair", get(spot).fallback(method_not_allowed))
        .layer(TimeoutLayer::new(handler_timeout))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn spot(
    State(state): State<Arc<AppState>>,
    Path(pair): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let query = SpotQuery::from_pairs(params);
    let pair = pair.trim().to_uppercase();
    if pair.is_empty() {
        return missing_pair().await.into_response();
    }

    match state.race.race(&pair).await {
        Ok(quote) => render_quote(&pair, &quote, query.format()),
        Err(err) => render_failure(&err),
    }
}

async fn missing_pair() -> (StatusCode, &'static str) {
    (StatusCode::BAD_REQUEST, "Missing trading pair\n")
}

async fn method_not_allowed() -> (StatusCode, &'static str) {
    (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed\n")
}

async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let exchanges: Vec<&str> = state
        .race
        .exchanges()
        .iter()
        .map(|exchange| exchange.id.as_str())
        .collect();

    (
        [
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
            (header::X_FRAME_OPTIONS, "DENY"),
            (header::X_XSS_PROTECTION, "1; mode=block"),
        ],
        Html(landing_page(&state.title, &exchanges)),
    )
}

fn landing_page(title: &str, exchanges: &[&str]) -> String {
    let title = escape_html(title);
    let sources = exchanges
        .iter()
        .map(|name| format!("<li>{}</li>", escape_html(name)))
        .collect::<Vec<_>>()
        .join("");

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
</head>
<body>
<h1>{title}</h1>
<p>Current spot price of a trading pair, answered by the fastest exchange.</p>
<h2>Endpoints</h2>
<ul>
<li><code>GET /api/v1/spot/BTCUSDT</code> - price as plain text</li>
<li><code>GET /api/v1/spot/BTCUSDT?details=true</code> - <code>{{"pair","price","source"}}</code> as JSON</li>
</ul>
<h2>Sources</h2>
<ul>{sources}</ul>
</body>
</html>
"#
    )
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
