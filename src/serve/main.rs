//! HTTP front end for the geocoding tools.
//!
//! Exposes the tool registry as JSON endpoints, one shared geocoder (and so
//! one rate limiter and cache) across all requests.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use clap::Parser;
use serde::Serialize;
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use nominatim_gateway::config::GeocoderConfig;
use nominatim_gateway::error::{ErrorDescriptor, ErrorKind};
use nominatim_gateway::geocoder::Geocoder;
use nominatim_gateway::tools::{CallError, ToolInfo, ToolRegistry};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "serve")]
#[command(about = "Rate-limited Nominatim geocoding gateway")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:3000")]
    listen: String,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Nominatim base URL
    #[arg(long, env = "NOMINATIM_BASE_URL")]
    base_url: Option<String>,

    /// Contact email sent with every request
    #[arg(long, env = "NOMINATIM_EMAIL")]
    email: Option<String>,

    /// User-Agent header identifying this deployment
    #[arg(long, env = "NOMINATIM_USER_AGENT")]
    user_agent: Option<String>,
}

impl Args {
    fn load_config(&self) -> Result<GeocoderConfig> {
        let mut config = match &self.config {
            Some(path) => GeocoderConfig::load_from_file(path)?,
            None => GeocoderConfig::default(),
        };
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(email) = &self.email {
            config.email = Some(email.clone());
        }
        if let Some(user_agent) = &self.user_agent {
            config.user_agent = user_agent.clone();
        }
        Ok(config)
    }
}

struct AppState {
    registry: ToolRegistry,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = args.load_config()?;

    info!("Nominatim gateway v{}", env!("CARGO_PKG_VERSION"));
    info!("Upstream {} (min interval {:?})", config.base_url, config.min_interval());
    if config.email.is_none() {
        warn!("No contact email configured; the public instance may block anonymous clients");
    }

    let geocoder = Geocoder::new(&config)
        .map_err(|e| anyhow::anyhow!("Failed to create geocoder: {}", e))?;
    let state = Arc::new(AppState {
        registry: ToolRegistry::new(Arc::new(geocoder)),
    });

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/v1/tools", get(list_tools_handler))
        .route("/v1/tools/{name}", post(call_tool_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("Starting server on {}", args.listen);

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

#[derive(Serialize)]
struct ToolsResponse {
    tools: Vec<ToolInfo>,
}

async fn list_tools_handler(State(state): State<Arc<AppState>>) -> Json<ToolsResponse> {
    Json(ToolsResponse {
        tools: state.registry.tools(),
    })
}

/// Run one tool. The body is the tool's JSON arguments; an empty body
/// means no arguments.
async fn call_tool_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Bytes,
) -> Response {
    let args = if body.is_empty() {
        Value::Null
    } else {
        match serde_json::from_slice::<Value>(&body) {
            Ok(args) => args,
            Err(e) => {
                let error = ErrorDescriptor {
                    kind: ErrorKind::Validation,
                    message: format!("Invalid JSON body: {}", e),
                };
                return (StatusCode::BAD_REQUEST, Json(error)).into_response();
            }
        }
    };

    match state.registry.call(&name, args).await {
        Ok(value) => Json(value).into_response(),
        Err(CallError::UnknownTool(name)) => (
            StatusCode::NOT_FOUND,
            Json(ErrorDescriptor {
                kind: ErrorKind::NotFound,
                message: format!("Unknown tool '{}'", name),
            }),
        )
            .into_response(),
        Err(CallError::Failed(error)) => {
            if matches!(
                error.kind,
                ErrorKind::ServiceUnavailable | ErrorKind::Upstream
            ) {
                tracing::error!("Tool {} failed: {}", name, error.message);
            }
            (status_for(error.kind), Json(error)).into_response()
        }
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::ServiceBusy => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Upstream => StatusCode::BAD_GATEWAY,
    }
}
