/// Board endpoints
///
/// # Endpoints
///
/// - `GET /api/boards/:project_id` - Columns, tasks and members of a project
/// - `POST /api/boards/:project_id/tasks` - Create a task
/// - `PUT /api/boards/:project_id/tasks/:task_id` - Partially update a task
/// - `DELETE /api/boards/:project_id/tasks/:task_id` - Delete a task
/// - `PUT /api/boards/:project_id/tasks/:task_id/move` - Move a task to a column
/// - `POST /api/boards/:project_id/tasks/:task_id/comments` - Comment on a task
/// - `DELETE /api/boards/:project_id/tasks/:task_id/comments/:comment_id` - Delete own comment

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{double_option, ApiJson, MessageResponse},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use taskboard_shared::{
    auth::middleware::AuthContext,
    models::task::{Task, TaskPriority},
    services::board::{self, BoardView, TaskInput, TaskPatch},
};
use uuid::Uuid;
use validator::Validate;

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(max = 300, message = "Title must be at most 300 characters"))]
    #[serde(default)]
    pub title: String,

    pub description: Option<String>,

    /// User ID, or empty / "none" / "unassigned" for nobody
    #[serde(default, alias = "assignedTo")]
    pub assigned_to: Option<String>,

    pub priority: Option<TaskPriority>,

    #[serde(default, alias = "dueDate")]
    pub due_date: Option<DateTime<Utc>>,
}

/// Update task request
///
/// Absent fields are left untouched; `null` clears description, assignee
/// and due date.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(max = 300, message = "Title must be at most 300 characters"))]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,

    #[serde(default, alias = "assignedTo", deserialize_with = "double_option")]
    pub assigned_to: Option<Option<String>>,

    pub priority: Option<TaskPriority>,

    #[serde(default, alias = "dueDate", deserialize_with = "double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

/// Move request
#[derive(Debug, Deserialize)]
pub struct MoveTaskRequest {
    /// Target column key
    #[serde(alias = "newStatus")]
    pub status: String,
}

/// Comment request
#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub text: String,
}

pub async fn get_board(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<BoardView>> {
    Ok(Json(board::get_board(&state.stores, &auth, project_id).await?))
}

/// Create a task in the first column
///
/// ```text
/// POST /api/boards/:project_id/tasks
/// { "title": "Draft outline", "priority": "High", "assigned_to": "none" }
/// ```
pub async fn create_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(project_id): Path<Uuid>,
    ApiJson(req): ApiJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    req.validate().map_err(|e| ApiError::from_validation(&e))?;

    let task = board::create_task(
        &state.stores,
        &auth,
        project_id,
        TaskInput {
            title: req.title,
            description: req.description,
            assigned_to: req.assigned_to,
            priority: req.priority,
            due_date: req.due_date,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((project_id, task_id)): Path<(Uuid, Uuid)>,
    ApiJson(req): ApiJson<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    req.validate().map_err(|e| ApiError::from_validation(&e))?;

    let task = board::update_task(
        &state.stores,
        &auth,
        project_id,
        task_id,
        TaskPatch {
            title: req.title,
            description: req.description,
            assigned_to: req.assigned_to,
            priority: req.priority,
            due_date: req.due_date,
        },
    )
    .await?;

    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((project_id, task_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<MessageResponse>> {
    board::delete_task(&state.stores, &auth, project_id, task_id).await?;
    Ok(Json(MessageResponse::new("Task removed")))
}

pub async fn move_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((project_id, task_id)): Path<(Uuid, Uuid)>,
    ApiJson(req): ApiJson<MoveTaskRequest>,
) -> ApiResult<Json<Task>> {
    let task = board::move_task(
        &state.stores,
        &auth,
        project_id,
        task_id,
        &req.status,
        state.config.board.strict_status,
    )
    .await?;

    Ok(Json(task))
}

pub async fn add_comment(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((project_id, task_id)): Path<(Uuid, Uuid)>,
    ApiJson(req): ApiJson<CommentRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let task = board::add_comment(&state.stores, &auth, project_id, task_id, &req.text).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((project_id, task_id, comment_id)): Path<(Uuid, Uuid, Uuid)>,
) -> ApiResult<Json<Task>> {
    let task =
        board::delete_comment(&state.stores, &auth, project_id, task_id, comment_id).await?;
    Ok(Json(task))
}
