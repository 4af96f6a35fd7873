/// Project endpoints
///
/// # Endpoints
///
/// - `GET /api/projects` - Projects the caller owns or belongs to
/// - `POST /api/projects` - Create a project
/// - `GET /api/projects/:id` - Project detail
/// - `PUT /api/projects/:id` - Rename or re-describe (owner or system admin)
/// - `DELETE /api/projects/:id` - Delete with its board (owner or system admin)
/// - `PUT /api/projects/:id/generate-invite` - Issue a single-use invite token
/// - `POST /api/projects/join/:token` - Join through an invite token
/// - `PUT /api/projects/:id/kick/:member_id` - Remove a member

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
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    auth::middleware::AuthContext,
    models::project::Project,
    services::projects::{self, JoinedProject, NewProjectInput, ProjectPatch},
};
use uuid::Uuid;
use validator::Validate;

/// Create project request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    /// Display name
    #[validate(length(min = 1, max = 200, message = "Name must be 1 to 200 characters"))]
    pub name: String,

    /// Optional description
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
}

/// Update project request
///
/// Absent fields are left untouched; `"description": null` clears it.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1 to 200 characters"))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
}

/// Invite token response
#[derive(Debug, Serialize, Deserialize)]
pub struct InviteResponse {
    pub invite_token: String,
}

/// Join response
#[derive(Debug, Serialize, Deserialize)]
pub struct JoinResponse {
    pub message: String,
    pub project_id: Uuid,
    pub project_name: String,
}

impl From<JoinedProject> for JoinResponse {
    fn from(joined: JoinedProject) -> Self {
        Self {
            message: format!("Joined {}", joined.name),
            project_id: joined.id,
            project_name: joined.name,
        }
    }
}

pub async fn list_projects(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<Vec<Project>>> {
    Ok(Json(projects::list_projects(&state.stores, &auth).await?))
}

/// Create a project owned by the caller
///
/// ```text
/// POST /api/projects
/// { "name": "Launch", "description": "Q3 release" }
/// ```
pub async fn create_project(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiJson(req): ApiJson<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    req.validate().map_err(|e| ApiError::from_validation(&e))?;

    let project = projects::create_project(
        &state.stores,
        &auth,
        NewProjectInput {
            name: req.name,
            description: req.description,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn get_project(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Project>> {
    Ok(Json(projects::project_detail(&state.stores, &auth, id).await?))
}

pub async fn update_project(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateProjectRequest>,
) -> ApiResult<Json<Project>> {
    req.validate().map_err(|e| ApiError::from_validation(&e))?;

    let project = projects::update_project(
        &state.stores,
        &auth,
        id,
        ProjectPatch {
            name: req.name,
            description: req.description,
        },
    )
    .await?;

    Ok(Json(project))
}

pub async fn delete_project(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    projects::delete_project(&state.stores, &auth, id).await?;
    Ok(Json(MessageResponse::new("Project removed")))
}

/// Issue a new invite token, invalidating the previous one
pub async fn generate_invite(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<InviteResponse>> {
    let invite_token = projects::generate_invite(&state.stores, &auth, id).await?;
    Ok(Json(InviteResponse { invite_token }))
}

pub async fn join_project(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(token): Path<String>,
) -> ApiResult<Json<JoinResponse>> {
    let joined = projects::join_by_token(&state.stores, &auth, &token).await?;
    Ok(Json(joined.into()))
}

pub async fn kick_member(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((id, member_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Project>> {
    Ok(Json(
        projects::kick_member(&state.stores, &auth, id, member_id).await?,
    ))
}
