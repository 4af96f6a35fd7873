/// Member endpoints
///
/// # Endpoints
///
/// - `GET /api/members?search=` - Find users by name or email
/// - `POST /api/members/add` - Add a user to a project directly (owner only)

use crate::{app::AppState, error::ApiResult, routes::ApiJson};
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use taskboard_shared::{
    auth::middleware::AuthContext,
    models::{project::Project, user::UserSummary},
    services::projects,
};
use uuid::Uuid;

/// Search query
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    /// Substring of a name or email; empty lists everyone
    #[serde(default)]
    pub search: Option<String>,
}

/// Direct add request
#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    #[serde(alias = "projectId")]
    pub project_id: Uuid,

    #[serde(alias = "userId")]
    pub user_id: Uuid,
}

/// Search users, excluding the caller
pub async fn search_users(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<UserSummary>>> {
    let term = query.search.unwrap_or_default();
    Ok(Json(projects::search_users(&state.stores, &auth, &term).await?))
}

/// Add a user to a project as an editor
pub async fn add_member(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiJson(req): ApiJson<AddMemberRequest>,
) -> ApiResult<Json<Project>> {
    let project =
        projects::add_member_direct(&state.stores, &auth, req.project_id, req.user_id).await?;
    Ok(Json(project))
}
