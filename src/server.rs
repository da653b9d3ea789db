use crate::catalogue::Catalogue;
use crate::config::Config;
use crate::data::{CourseSummary, SolveRequest};
use crate::error::SolveError;
use crate::selection::SelectionPlan;
use crate::worker::{SearchOutcome, spawn_search};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::Stream;
use log::{info, warn};
use serde::Serialize;
use std::sync::Arc;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub catalogue: Arc<Catalogue>,
    pub report_interval: u64,
}

/// Error body returned by every endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
        };
        (status, Json(ApiError { code, message })).into_response()
    }
}

impl From<SolveError> for AppError {
    fn from(err: SolveError) -> Self {
        match err {
            SolveError::Worker(_) => AppError::Internal(err.to_string()),
            _ => AppError::BadRequest(err.to_string()),
        }
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn list_semesters(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.catalogue.semester_ids().map(str::to_string).collect())
}

async fn list_courses(
    State(state): State<AppState>,
    Path(semester): Path<String>,
) -> Result<Json<Vec<CourseSummary>>, AppError> {
    let semester = state
        .catalogue
        .semester(&semester)
        .ok_or_else(|| AppError::NotFound(format!("unknown semester {}", semester)))?;
    Ok(Json(semester.summaries()))
}

// Rejects unknown semesters and courses before any work is spawned.
fn check_request(catalogue: &Catalogue, request: &SolveRequest) -> Result<(), SolveError> {
    let semester = catalogue
        .semester(&request.semester)
        .ok_or_else(|| SolveError::UnknownSemester(request.semester.clone()))?;
    SelectionPlan::build(semester, request).map(|_| ())
}

async fn solve_handler(
    State(state): State<AppState>,
    Json(request): Json<SolveRequest>,
) -> Result<Json<SearchOutcome>, AppError> {
    check_request(&state.catalogue, &request)?;
    let outcome = spawn_search(state.catalogue.clone(), request, state.report_interval)
        .outcome()
        .await?;
    Ok(Json(outcome))
}

async fn solve_stream_handler(
    State(state): State<AppState>,
    Json(request): Json<SolveRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, AppError> {
    check_request(&state.catalogue, &request)?;
    let mut handle = spawn_search(state.catalogue.clone(), request, state.report_interval);

    let stream = async_stream::stream! {
        while let Some(message) = handle.messages.recv().await {
            yield Event::default().event(message.kind()).json_data(&message);
        }
        match handle.task.await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                warn!("Streamed search failed: {}", e);
                let body = ApiError { code: "BAD_REQUEST", message: e.to_string() };
                yield Event::default().event("error").json_data(body);
            }
            Err(e) => {
                warn!("Search worker panicked: {}", e);
                let body = ApiError { code: "INTERNAL_ERROR", message: e.to_string() };
                yield Event::default().event("error").json_data(body);
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/semesters", get(list_semesters))
        .route("/v1/semesters/:semester/courses", get(list_courses))
        .route("/v1/schedule/solve", post(solve_handler))
        .route("/v1/schedule/solve/stream", post(solve_stream_handler))
        .with_state(state)
}

pub async fn run_server(config: Config, catalogue: Catalogue) -> std::io::Result<()> {
    let state = AppState {
        catalogue: Arc::new(catalogue),
        report_interval: config.report_interval,
    };
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await
}
