/// Projects, invites and membership
///
/// Project views returned from here have owner and member references
/// resolved to user summaries. The active invite token is only included for
/// callers allowed to manage invites.

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    load_project, optional_text, required_text, resolve_project, user_lookup, ServiceError,
    ServiceResult,
};
use crate::auth::authorization::{authorize, authorize_kick, can_see_invite, Capability};
use crate::auth::invite::{generate_invite_token, is_well_formed};
use crate::auth::middleware::AuthContext;
use crate::models::project::{NewProject, Project, ProjectChanges, DEFAULT_MEMBER_ROLE};
use crate::models::user::UserSummary;
use crate::store::Stores;

/// Attempts at drawing an unused invite token before giving up
const INVITE_ATTEMPTS: usize = 3;

/// Input for creating a project
#[derive(Debug, Clone)]
pub struct NewProjectInput {
    pub name: String,
    pub description: Option<String>,
}

/// Input for updating a project
///
/// `description: Some(None)` clears the description.
#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}

/// Result of joining a project through an invite
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinedProject {
    pub id: Uuid,
    pub name: String,
}

/// Resolves references and hides the token from callers who can't manage it
async fn present(stores: &Stores, auth: &AuthContext, project: Project) -> ServiceResult<Project> {
    let lookup = user_lookup(stores, &project.user_ids()).await?;
    Ok(present_with(auth, project, &lookup))
}

fn present_with(
    auth: &AuthContext,
    mut project: Project,
    lookup: &std::collections::HashMap<Uuid, UserSummary>,
) -> Project {
    if !can_see_invite(&project, auth.user_id) {
        project.invite_token = None;
    }
    resolve_project(project, lookup)
}

/// Creates a project owned by the caller
///
/// # Errors
///
/// `Validation` if the name is blank.
pub async fn create_project(
    stores: &Stores,
    auth: &AuthContext,
    input: NewProjectInput,
) -> ServiceResult<Project> {
    let name = required_text(&input.name, "Project name")?;

    let project = stores
        .projects
        .create_project(NewProject {
            owner_id: auth.user_id,
            name,
            description: optional_text(input.description),
        })
        .await?;

    info!(project_id = %project.id, owner_id = %auth.user_id, "Project created");

    present(stores, auth, project).await
}

/// Projects the caller owns or is a member of
pub async fn list_projects(stores: &Stores, auth: &AuthContext) -> ServiceResult<Vec<Project>> {
    let projects = stores.projects.list_projects_for(auth.user_id).await?;

    let mut ids: Vec<Uuid> = Vec::new();
    for project in &projects {
        for id in project.user_ids() {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    let lookup = user_lookup(stores, &ids).await?;

    debug!(user_id = %auth.user_id, count = projects.len(), "Listed projects");

    Ok(projects
        .into_iter()
        .map(|p| present_with(auth, p, &lookup))
        .collect())
}

/// A single project with owner and members resolved
///
/// # Errors
///
/// `NotFound` for an unknown project, `Forbidden` if the caller may not view it.
pub async fn project_detail(
    stores: &Stores,
    auth: &AuthContext,
    project_id: Uuid,
) -> ServiceResult<Project> {
    let project = load_project(stores, project_id).await?;
    authorize(&project, auth.user_id, auth.role, Capability::ViewProject)?;

    present(stores, auth, project).await
}

/// Renames or re-describes a project
///
/// Restricted to the owner and system admins.
pub async fn update_project(
    stores: &Stores,
    auth: &AuthContext,
    project_id: Uuid,
    patch: ProjectPatch,
) -> ServiceResult<Project> {
    let name = match patch.name {
        Some(name) => Some(required_text(&name, "Project name")?),
        None => None,
    };
    let changes = ProjectChanges {
        name,
        description: patch.description.map(optional_text),
    };

    let project = load_project(stores, project_id).await?;
    authorize(&project, auth.user_id, auth.role, Capability::ManageProject)?;

    if changes.is_empty() {
        return present(stores, auth, project).await;
    }

    let updated = stores
        .projects
        .update_project(project_id, changes)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Project not found".to_string()))?;

    info!(project_id = %project_id, "Project updated");

    present(stores, auth, updated).await
}

/// Deletes a project together with its board
///
/// Restricted to the owner and system admins.
pub async fn delete_project(stores: &Stores, auth: &AuthContext, project_id: Uuid) -> ServiceResult<()> {
    let project = load_project(stores, project_id).await?;
    authorize(&project, auth.user_id, auth.role, Capability::ManageProject)?;

    if !stores.projects.delete_project(project_id).await? {
        return Err(ServiceError::NotFound("Project not found".to_string()));
    }

    info!(project_id = %project_id, user_id = %auth.user_id, "Project deleted");
    Ok(())
}

/// Issues a new invite token, invalidating any previous one
///
/// # Errors
///
/// `Forbidden` unless the caller is the owner or a project admin.
pub async fn generate_invite(
    stores: &Stores,
    auth: &AuthContext,
    project_id: Uuid,
) -> ServiceResult<String> {
    let project = load_project(stores, project_id).await?;
    authorize(&project, auth.user_id, auth.role, Capability::ManageInvites)?;

    for attempt in 1..=INVITE_ATTEMPTS {
        let token = generate_invite_token();

        match stores.projects.set_invite_token(project_id, &token).await {
            Ok(true) => {
                info!(project_id = %project_id, "Invite token generated");
                return Ok(token);
            }
            Ok(false) => return Err(ServiceError::NotFound("Project not found".to_string())),
            Err(crate::store::StoreError::Conflict(_)) => {
                warn!(project_id = %project_id, attempt, "Invite token collision, retrying");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(ServiceError::Internal(
        "Could not generate a unique invite token".to_string(),
    ))
}

/// Redeems an invite token, adding the caller as an editor
///
/// The token is single-use: a successful join clears it.
///
/// # Errors
///
/// - `NotFound` if no project carries the token, including when a concurrent
///   join consumed it first
/// - `Conflict` if the caller already belongs to the project
pub async fn join_by_token(
    stores: &Stores,
    auth: &AuthContext,
    token: &str,
) -> ServiceResult<JoinedProject> {
    let invalid = || ServiceError::NotFound("Invalid or expired invite link".to_string());

    let token = token.trim();
    if !is_well_formed(token) {
        return Err(invalid());
    }

    let project = stores
        .projects
        .find_project_by_invite(token)
        .await?
        .ok_or_else(invalid)?;

    if project.involves(auth.user_id) {
        return Err(ServiceError::Conflict(
            "You are already a member of this project".to_string(),
        ));
    }

    let redeemed = stores
        .projects
        .redeem_invite(project.id, token, auth.user_id, DEFAULT_MEMBER_ROLE)
        .await?;
    if !redeemed {
        return Err(invalid());
    }

    info!(project_id = %project.id, user_id = %auth.user_id, "Joined project by invite");

    Ok(JoinedProject {
        id: project.id,
        name: project.name,
    })
}

/// Adds a user to a project without an invite
///
/// # Errors
///
/// - `Forbidden` unless the caller owns the project
/// - `NotFound` if the target user doesn't exist
/// - `Conflict` if the target already belongs to the project
pub async fn add_member_direct(
    stores: &Stores,
    auth: &AuthContext,
    project_id: Uuid,
    target_user_id: Uuid,
) -> ServiceResult<Project> {
    let project = load_project(stores, project_id).await?;
    authorize(&project, auth.user_id, auth.role, Capability::AddMembers)?;

    if stores.users.find_user(target_user_id).await?.is_none() {
        return Err(ServiceError::NotFound("User not found".to_string()));
    }

    if project.involves(target_user_id) {
        return Err(ServiceError::Conflict(
            "User is already a member of this project".to_string(),
        ));
    }

    stores
        .projects
        .add_member(project_id, target_user_id, DEFAULT_MEMBER_ROLE)
        .await?;

    info!(project_id = %project_id, user_id = %target_user_id, "Member added");

    let project = load_project(stores, project_id).await?;
    present(stores, auth, project).await
}

/// Removes a member from a project
///
/// # Errors
///
/// - `Forbidden` unless the caller is the owner or a project admin, or if the
///   target is the owner
/// - `NotFound` if the target isn't a member
pub async fn kick_member(
    stores: &Stores,
    auth: &AuthContext,
    project_id: Uuid,
    target_user_id: Uuid,
) -> ServiceResult<Project> {
    let project = load_project(stores, project_id).await?;
    authorize_kick(&project, auth.user_id, auth.role, target_user_id)?;

    if !stores.projects.remove_member(project_id, target_user_id).await? {
        return Err(ServiceError::NotFound(
            "User is not a member of this project".to_string(),
        ));
    }

    info!(project_id = %project_id, user_id = %target_user_id, "Member removed");

    let project = load_project(stores, project_id).await?;
    present(stores, auth, project).await
}

/// Finds users by name or email, for adding to a project
pub async fn search_users(
    stores: &Stores,
    auth: &AuthContext,
    term: &str,
) -> ServiceResult<Vec<UserSummary>> {
    let users = stores.users.search_users(term.trim(), auth.user_id).await?;
    debug!(count = users.len(), "User search");
    Ok(users)
}
