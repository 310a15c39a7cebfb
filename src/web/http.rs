use crate::error::{RelinkError, Result};
use crate::workspace::Workspace;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// JSON front end over a [`Workspace`]
pub struct HttpServer {
    workspace: Arc<Workspace>,
    allowed_origins: Vec<String>,
}

impl HttpServer {
    pub fn new(workspace: Workspace) -> Self {
        let allowed_origins = workspace.config().http_server.allowed_origins.clone();
        Self {
            workspace: Arc::new(workspace),
            allowed_origins,
        }
    }

    /// Run the HTTP server
    pub async fn run(&self, port: u16) -> Result<()> {
        let app = self.create_router();

        let addr = format!("127.0.0.1:{}", port);
        log::info!("Starting Relink HTTP server on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
            RelinkError::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to bind to {}: {}. Set http_server.port in config.toml to use another port.",
                    addr, e
                ),
            ))
        })?;

        axum::serve(listener, app).await.map_err(|e| {
            RelinkError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("HTTP server error: {}", e),
            ))
        })?;

        Ok(())
    }

    /// Create the axum router
    pub fn create_router(&self) -> Router {
        // No origins configured: allow any (local use)
        let cors = if self.allowed_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<axum::http::HeaderValue> = self
                .allowed_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            .route("/health", get(handle_health))
            .route("/files", get(handle_files))
            .route("/upload", post(handle_upload))
            .route("/table", get(handle_table))
            .route(
                "/descriptions",
                get(handle_table).post(handle_update_descriptions),
            )
            .route("/links", get(handle_links).post(handle_update_links))
            .route("/links/create", post(handle_create_links))
            .route("/connections/:element", get(handle_connections))
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(cors),
            )
            .with_state(AppState {
                workspace: Arc::clone(&self.workspace),
            })
    }
}

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    workspace: Arc<Workspace>,
}

#[derive(Debug, Deserialize)]
struct UploadParams {
    #[serde(default)]
    filename: String,
}

impl IntoResponse for RelinkError {
    fn into_response(self) -> Response {
        let status = match &self {
            RelinkError::Parse(_)
            | RelinkError::EmptyUpload
            | RelinkError::UnsupportedFile(_)
            | RelinkError::Index { .. } => StatusCode::BAD_REQUEST,
            RelinkError::NotFound(_) => StatusCode::NOT_FOUND,
            RelinkError::NoData => StatusCode::CONFLICT,
            RelinkError::Resolution(_) | RelinkError::Io(_) | RelinkError::Csv(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            log::error!("Request failed: {}", self);
        } else {
            log::warn!("Request rejected: {}", self);
        }

        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Run a workspace operation on the blocking pool; the table lock and the
/// CSV writes are synchronous.
async fn with_workspace<F, T>(state: &AppState, f: F) -> Result<T>
where
    F: FnOnce(&Workspace) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let workspace = Arc::clone(&state.workspace);
    task::spawn_blocking(move || f(&workspace))
        .await
        .map_err(|e| {
            RelinkError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Workspace task failed: {}", e),
            ))
        })?
}

/// Handle health check endpoint
async fn handle_health(State(state): State<AppState>) -> Result<Response> {
    let table_loaded = with_workspace(&state, |ws| Ok(ws.has_table())).await?;
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "service": "relink",
            "version": env!("CARGO_PKG_VERSION"),
            "table_loaded": table_loaded,
        })),
    )
        .into_response())
}

async fn handle_files(State(state): State<AppState>) -> Result<Response> {
    let files = with_workspace(&state, |ws| ws.files()).await?;
    Ok(Json(serde_json::json!({ "files": files })).into_response())
}

/// Upload a document: `POST /upload?filename=<name>` with the raw file as body
async fn handle_upload(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    body: axum::body::Bytes,
) -> Result<Response> {
    let (summary, files) = with_workspace(&state, move |ws| {
        let summary = ws.upload(&params.filename, &body)?;
        Ok((summary, ws.files()?))
    })
    .await?;

    Ok(Json(serde_json::json!({
        "message": summary.message,
        "filename": summary.filename,
        "records": summary.records,
        "files": files,
    }))
    .into_response())
}

async fn handle_table(State(state): State<AppState>) -> Result<Response> {
    let table = with_workspace(&state, |ws| ws.table()).await?;
    Ok(Json(serde_json::json!({ "records": table })).into_response())
}

async fn handle_update_descriptions(
    State(state): State<AppState>,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Response> {
    let table = with_workspace(&state, move |ws| ws.update_annotations(form)).await?;
    Ok(Json(serde_json::json!({ "records": table })).into_response())
}

async fn handle_links(State(state): State<AppState>) -> Result<Response> {
    let links = with_workspace(&state, |ws| ws.links()).await?;
    Ok(Json(serde_json::json!({ "links": links })).into_response())
}

async fn handle_update_links(
    State(state): State<AppState>,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Response> {
    let links = with_workspace(&state, move |ws| ws.update_link_values(form)).await?;
    Ok(Json(serde_json::json!({ "links": links })).into_response())
}

async fn handle_create_links(State(state): State<AppState>) -> Result<Response> {
    let links = with_workspace(&state, |ws| ws.links()).await?;
    log::info!("Created {} links", links.len());
    Ok(Json(serde_json::json!({
        "message": "Links created successfully!",
        "links": links.len(),
    }))
    .into_response())
}

async fn handle_connections(
    State(state): State<AppState>,
    Path(element): Path<String>,
) -> Result<Response> {
    let report = with_workspace(&state, move |ws| ws.connections(&element)).await?;
    Ok(Json(report).into_response())
}
