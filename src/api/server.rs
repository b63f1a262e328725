//! HTTP server exposing one session over REST.
//!
//! # API Endpoints
//!
//! | Method | Path                  | Description                              |
//! |--------|-----------------------|------------------------------------------|
//! | GET    | `/health`             | Health check                             |
//! | POST   | `/api/upload`         | Upload an XML/ZIP document               |
//! | POST   | `/api/fetch`          | Download a document from a URL           |
//! | GET    | `/api/collections`    | Discovered collections, largest first    |
//! | POST   | `/api/select`         | Load a collection as the working table   |
//! | GET    | `/api/table`          | Rendered table view, optional search     |
//! | POST   | `/api/explode`        | Expand a nested column into rows         |
//! | POST   | `/api/extract`        | Decompose a column into URL columns      |
//! | POST   | `/api/undo`           | Restore the previous table snapshot      |
//! | POST   | `/api/export`         | Build and download the CSV artifact      |
//! | POST   | `/api/reset`          | Tear the session down                    |
//! | GET    | `/api/logs`           | SSE stream of pipeline progress          |
//!
//! The session model is single-user by design: one working table, one
//! undo history, guarded by a mutex so structural operators never overlap.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::{
    extract::{Multipart, Query, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::LOG_BROADCASTER;
use super::types::{
    error_response, AnalyzeResponse, ColumnRequest, ExportRequest, FetchRequest, SelectRequest,
    TableQuery, TableResponse,
};
use crate::acquire;
use crate::session::Session;

/// Rows returned by table views unless the client asks otherwise.
const DEFAULT_PREVIEW_ROWS: usize = 100;

type SharedSession = Arc<Mutex<Session>>;
type ApiError = (StatusCode, Json<Value>);

/// Start the HTTP server.
pub async fn start_server(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let session: SharedSession = Arc::new(Mutex::new(Session::new()));

    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    let app = Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/upload", post(upload))
        .route("/api/fetch", post(fetch))
        .route("/api/collections", get(collections))
        .route("/api/select", post(select))
        .route("/api/table", get(table_view))
        .route("/api/explode", post(explode))
        .route("/api/extract", post(extract))
        .route("/api/undo", post(undo))
        .route("/api/export", post(export))
        .route("/api/reset", post(reset))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(session);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("xmlmaster server running on http://localhost:{}", port);
    println!("   POST /api/upload - Upload XML/ZIP document");
    println!("   POST /api/fetch  - Fetch document from URL");
    println!("   GET  /api/logs   - SSE progress stream");
    println!("   GET  /health     - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "xmlmaster",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// SSE endpoint streaming pipeline progress.
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Upload an XML or zipped-XML document.
async fn upload(
    State(session): State<SharedSession>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name = String::from("upload.xml");

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(&format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("file") {
            if let Some(name) = field.file_name() {
                file_name = name.to_string();
            }
            let bytes = field
                .bytes()
                .await
                .map_err(|e| bad_request(&format!("Read error: {}", e)))?;
            file_data = Some(bytes.to_vec());
        }
    }

    let bytes = file_data.ok_or_else(|| bad_request("No file provided"))?;

    let mut session = lock(&session)?;
    session
        .analyze(&bytes, &file_name)
        .map_err(pipeline_error)?;

    Ok(Json(AnalyzeResponse {
        source: session.source_name().to_string(),
        collections: session.collections(),
    }))
}

/// Download a document from a URL and analyze it.
async fn fetch(
    State(session): State<SharedSession>,
    Json(request): Json<FetchRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    // Download outside the lock; only the analysis needs the session.
    let bytes = acquire::fetch_url(&request.url)
        .await
        .map_err(|e| bad_request(&e.to_string()))?;

    let mut session = lock(&session)?;
    session
        .analyze(&bytes, &request.url)
        .map_err(pipeline_error)?;

    Ok(Json(AnalyzeResponse {
        source: session.source_name().to_string(),
        collections: session.collections(),
    }))
}

/// Discovered collections of the current document.
async fn collections(
    State(session): State<SharedSession>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let session = lock(&session)?;
    Ok(Json(AnalyzeResponse {
        source: session.source_name().to_string(),
        collections: session.collections(),
    }))
}

/// Load a collection as the working table.
async fn select(
    State(session): State<SharedSession>,
    Json(request): Json<SelectRequest>,
) -> Result<Json<TableResponse>, ApiError> {
    let mut session = lock(&session)?;
    session.select(&request.label).map_err(pipeline_error)?;
    render_table(&session, &TableQuery::default())
}

/// Rendered table view with optional search.
async fn table_view(
    State(session): State<SharedSession>,
    Query(query): Query<TableQuery>,
) -> Result<Json<TableResponse>, ApiError> {
    let session = lock(&session)?;
    render_table(&session, &query)
}

/// Expand a nested-collection column into rows.
async fn explode(
    State(session): State<SharedSession>,
    Json(request): Json<ColumnRequest>,
) -> Result<Json<TableResponse>, ApiError> {
    let mut session = lock(&session)?;
    session.explode(&request.column).map_err(pipeline_error)?;
    render_table(&session, &TableQuery::default())
}

/// Decompose a column into numbered URL columns.
async fn extract(
    State(session): State<SharedSession>,
    Json(request): Json<ColumnRequest>,
) -> Result<Json<TableResponse>, ApiError> {
    let mut session = lock(&session)?;
    session
        .extract_urls(&request.column)
        .map_err(pipeline_error)?;
    render_table(&session, &TableQuery::default())
}

/// Restore the previous snapshot; a no-op when history is empty.
async fn undo(State(session): State<SharedSession>) -> Result<Json<Value>, ApiError> {
    let mut session = lock(&session)?;
    let undone = session.undo();
    Ok(Json(json!({
        "undone": undone,
        "history_len": session.history_len(),
    })))
}

/// Build the CSV artifact and send it as a download.
async fn export(
    State(session): State<SharedSession>,
    Json(request): Json<ExportRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut session = lock(&session)?;

    let view = match &request.query {
        Some(query) => Some(
            session
                .search(request.search_column.as_deref(), query)
                .map_err(pipeline_error)?,
        ),
        None => None,
    };

    let artifact = session
        .export(&request.columns, view.as_ref())
        .map_err(pipeline_error)?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"export.csv\"",
            ),
        ],
        artifact,
    ))
}

/// Tear the session down.
async fn reset(State(session): State<SharedSession>) -> Result<Json<Value>, ApiError> {
    let mut session = lock(&session)?;
    session.reset();
    Ok(Json(json!({"success": true})))
}

// =============================================================================
// Helpers
// =============================================================================

fn lock(session: &SharedSession) -> Result<MutexGuard<'_, Session>, ApiError> {
    session
        .lock()
        .map_err(|_| internal("Session lock poisoned"))
}

fn render_table(session: &Session, query: &TableQuery) -> Result<Json<TableResponse>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_PREVIEW_ROWS);
    let view = match &query.query {
        Some(q) => session
            .search(query.column.as_deref(), q)
            .map_err(pipeline_error)?,
        None => session
            .table()
            .cloned()
            .ok_or_else(|| bad_request("No table loaded"))?,
    };

    Ok(Json(TableResponse::render(session, &view, limit)))
}

fn bad_request(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(error_response(message)))
}

fn internal(message: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(error_response(message)),
    )
}

fn pipeline_error(error: crate::error::PipelineError) -> ApiError {
    bad_request(&error.to_string())
}
