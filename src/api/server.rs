//! API Server module
//!
//! This module exposes the store over HTTP. Every response uses the
//! [`ApiResponse`] envelope; mutations carry the snapshot they produced.

use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post, put},
    Json, Router,
};
use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::models::{
    Language, ProjectId, PromptId, PromptUpdate, StoreResponse, TaskId, Theme, ViewMode,
};
use crate::{Core, StoreError};

/// Request carrying a project or task name
#[derive(Debug, Serialize, Deserialize)]
pub struct NameRequest {
    pub name: String,
}

/// Request to create a prompt
#[derive(Debug, Serialize, Deserialize)]
pub struct CreatePromptRequest {
    pub title: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TitleRequest {
    pub title: String,
}

/// Request carrying the new order of the active entities of one level
#[derive(Debug, Serialize, Deserialize)]
pub struct OrderRequest<T> {
    pub ids: Vec<T>,
}

/// Request to change the current project or task; `null` clears it
#[derive(Debug, Serialize, Deserialize)]
pub struct SelectRequest<T> {
    pub id: Option<T>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SettingsRequest {
    #[serde(default)]
    pub language: Option<Language>,
    #[serde(default)]
    pub theme: Option<Theme>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ViewModeRequest {
    pub mode: ViewMode,
}

/// API responses
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

fn ok<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
}

/// Helper function to map store results to Axum responses
fn map_store_result<T: Serialize>(result: Result<StoreResponse<T>, StoreError>) -> Response {
    match result {
        Ok(store_response) => ok(store_response),
        Err(e) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<StoreResponse<T>>::error(e.to_string())),
        )
            .into_response(),
    }
}

/// Builds the application router around a store handle
pub fn router(core: Core) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // --- Read surface --- //
        .route("/api/snapshot", get(get_snapshot))
        .route("/api/trash", get(get_trash))
        .route("/api/events", get(events_handler))
        // --- Projects --- //
        .route(
            "/api/projects",
            post(create_project).put(reorder_projects),
        )
        .route(
            "/api/projects/:project_id",
            put(rename_project).delete(soft_delete_project),
        )
        .route("/api/projects/:project_id/restore", post(restore_project))
        .route(
            "/api/projects/:project_id/permanent",
            axum::routing::delete(permanently_delete_project),
        )
        // --- Tasks --- //
        .route(
            "/api/projects/:project_id/tasks",
            post(create_task).put(reorder_tasks),
        )
        .route(
            "/api/projects/:project_id/tasks/:task_id",
            put(rename_task).delete(soft_delete_task),
        )
        .route(
            "/api/projects/:project_id/tasks/:task_id/restore",
            post(restore_task),
        )
        .route(
            "/api/projects/:project_id/tasks/:task_id/permanent",
            axum::routing::delete(permanently_delete_task),
        )
        // --- Prompts --- //
        .route(
            "/api/projects/:project_id/tasks/:task_id/prompts",
            post(create_prompt).put(reorder_prompts),
        )
        .route(
            "/api/projects/:project_id/tasks/:task_id/prompts/:prompt_id",
            put(rename_prompt)
                .patch(update_prompt)
                .delete(soft_delete_prompt),
        )
        .route(
            "/api/projects/:project_id/tasks/:task_id/prompts/:prompt_id/restore",
            post(restore_prompt),
        )
        .route(
            "/api/projects/:project_id/tasks/:task_id/prompts/:prompt_id/permanent",
            axum::routing::delete(permanently_delete_prompt),
        )
        // --- Selection, settings, maintenance --- //
        .route("/api/selection/project", put(select_project))
        .route("/api/selection/task", put(select_task))
        .route("/api/settings", put(update_settings))
        .route("/api/view-mode", put(set_view_mode))
        .route("/api/sweep", post(sweep))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(core)
}

/// Starts the API server
pub async fn serve(core: Core, config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(core);

    tracing::info!("Starting server on {}", config.address);
    let listener = TcpListener::bind(config.address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Read handlers --- //

async fn get_snapshot(State(core): State<Core>) -> impl IntoResponse {
    ok(core.snapshot())
}

async fn get_trash(State(core): State<Core>) -> impl IntoResponse {
    ok(core.trash())
}

// --- Project handlers --- //

async fn create_project(
    State(core): State<Core>,
    Json(payload): Json<NameRequest>,
) -> impl IntoResponse {
    ok(core.create_project(payload.name))
}

async fn reorder_projects(
    State(core): State<Core>,
    Json(payload): Json<OrderRequest<ProjectId>>,
) -> impl IntoResponse {
    ok(core.reorder_projects(payload.ids))
}

async fn rename_project(
    State(core): State<Core>,
    Path(project_id): Path<ProjectId>,
    Json(payload): Json<NameRequest>,
) -> impl IntoResponse {
    map_store_result(core.rename_project(project_id, payload.name))
}

async fn soft_delete_project(
    State(core): State<Core>,
    Path(project_id): Path<ProjectId>,
) -> impl IntoResponse {
    map_store_result(core.soft_delete_project(project_id))
}

async fn restore_project(
    State(core): State<Core>,
    Path(project_id): Path<ProjectId>,
) -> impl IntoResponse {
    map_store_result(core.restore_project(project_id))
}

async fn permanently_delete_project(
    State(core): State<Core>,
    Path(project_id): Path<ProjectId>,
) -> impl IntoResponse {
    map_store_result(core.permanently_delete_project(project_id))
}

// --- Task handlers --- //

async fn create_task(
    State(core): State<Core>,
    Path(project_id): Path<ProjectId>,
    Json(payload): Json<NameRequest>,
) -> impl IntoResponse {
    map_store_result(core.create_task(project_id, payload.name))
}

async fn reorder_tasks(
    State(core): State<Core>,
    Path(project_id): Path<ProjectId>,
    Json(payload): Json<OrderRequest<TaskId>>,
) -> impl IntoResponse {
    map_store_result(core.reorder_tasks(project_id, payload.ids))
}

async fn rename_task(
    State(core): State<Core>,
    Path((project_id, task_id)): Path<(ProjectId, TaskId)>,
    Json(payload): Json<NameRequest>,
) -> impl IntoResponse {
    map_store_result(core.rename_task(project_id, task_id, payload.name))
}

async fn soft_delete_task(
    State(core): State<Core>,
    Path((project_id, task_id)): Path<(ProjectId, TaskId)>,
) -> impl IntoResponse {
    map_store_result(core.soft_delete_task(project_id, task_id))
}

async fn restore_task(
    State(core): State<Core>,
    Path((project_id, task_id)): Path<(ProjectId, TaskId)>,
) -> impl IntoResponse {
    map_store_result(core.restore_task(project_id, task_id))
}

async fn permanently_delete_task(
    State(core): State<Core>,
    Path((project_id, task_id)): Path<(ProjectId, TaskId)>,
) -> impl IntoResponse {
    map_store_result(core.permanently_delete_task(project_id, task_id))
}

// --- Prompt handlers --- //

async fn create_prompt(
    State(core): State<Core>,
    Path((project_id, task_id)): Path<(ProjectId, TaskId)>,
    Json(payload): Json<CreatePromptRequest>,
) -> impl IntoResponse {
    map_store_result(core.create_prompt(project_id, task_id, payload.title, payload.content))
}

async fn reorder_prompts(
    State(core): State<Core>,
    Path((project_id, task_id)): Path<(ProjectId, TaskId)>,
    Json(payload): Json<OrderRequest<PromptId>>,
) -> impl IntoResponse {
    map_store_result(core.reorder_prompts(project_id, task_id, payload.ids))
}

async fn rename_prompt(
    State(core): State<Core>,
    Path((project_id, task_id, prompt_id)): Path<(ProjectId, TaskId, PromptId)>,
    Json(payload): Json<TitleRequest>,
) -> impl IntoResponse {
    map_store_result(core.rename_prompt(project_id, task_id, prompt_id, payload.title))
}

async fn update_prompt(
    State(core): State<Core>,
    Path((project_id, task_id, prompt_id)): Path<(ProjectId, TaskId, PromptId)>,
    Json(payload): Json<PromptUpdate>,
) -> impl IntoResponse {
    map_store_result(core.update_prompt_fields(project_id, task_id, prompt_id, payload))
}

async fn soft_delete_prompt(
    State(core): State<Core>,
    Path((project_id, task_id, prompt_id)): Path<(ProjectId, TaskId, PromptId)>,
) -> impl IntoResponse {
    map_store_result(core.soft_delete_prompt(project_id, task_id, prompt_id))
}

async fn restore_prompt(
    State(core): State<Core>,
    Path((project_id, task_id, prompt_id)): Path<(ProjectId, TaskId, PromptId)>,
) -> impl IntoResponse {
    map_store_result(core.restore_prompt(project_id, task_id, prompt_id))
}

async fn permanently_delete_prompt(
    State(core): State<Core>,
    Path((project_id, task_id, prompt_id)): Path<(ProjectId, TaskId, PromptId)>,
) -> impl IntoResponse {
    map_store_result(core.permanently_delete_prompt(project_id, task_id, prompt_id))
}

// --- Selection, settings and maintenance handlers --- //

async fn select_project(
    State(core): State<Core>,
    Json(payload): Json<SelectRequest<ProjectId>>,
) -> impl IntoResponse {
    ok(core.set_current_project(payload.id))
}

async fn select_task(
    State(core): State<Core>,
    Json(payload): Json<SelectRequest<TaskId>>,
) -> impl IntoResponse {
    ok(core.set_current_task(payload.id))
}

async fn update_settings(
    State(core): State<Core>,
    Json(payload): Json<SettingsRequest>,
) -> impl IntoResponse {
    ok(core.update_settings(payload.language, payload.theme))
}

async fn set_view_mode(
    State(core): State<Core>,
    Json(payload): Json<ViewModeRequest>,
) -> impl IntoResponse {
    ok(core.set_view_mode(payload.mode))
}

async fn sweep(State(core): State<Core>) -> impl IntoResponse {
    ok(core.sweep())
}

// --- Event stream --- //

/// Streams `update` events carrying the new revision after each mutation
async fn events_handler(
    State(core): State<Core>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = core.subscribe();

    let stream = futures::stream::unfold((core, receiver), |(core, mut receiver)| async move {
        let revision = match receiver.recv().await {
            Ok(revision) => revision,
            Err(RecvError::Lagged(skipped)) => {
                // Some notifications were missed; the latest revision covers them
                tracing::debug!(skipped, "event stream lagged");
                core.snapshot().revision
            }
            Err(RecvError::Closed) => return None,
        };
        let event = Event::default().event("update").data(revision.to_string());
        Some((Ok::<_, Infallible>(event), (core, receiver)))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
