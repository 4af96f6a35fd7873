/// Access-controlled operations
///
/// Every operation takes the [`Stores`] registry and, where a user is
/// involved, the caller's `AuthContext`. Each one validates its input
/// before touching a store, loads what it needs, asks the authorization
/// policy, then reads or writes.
///
/// # Modules
///
/// - `accounts`: Registration, login and bearer token resolution
/// - `projects`: Projects, invites and membership
/// - `board`: Columns, tasks and comments
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::middleware::AuthContext;
/// use taskboard_shared::models::user::{CreateUser, UserRole};
/// use taskboard_shared::services::projects::{self, NewProjectInput};
/// use taskboard_shared::store::Stores;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let stores = Stores::in_memory();
/// let user = stores.users.create_user(CreateUser {
///     name: "Ada".to_string(),
///     email: "ada@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     role: UserRole::Member,
/// }).await?;
/// let auth = AuthContext::from_user(&user);
///
/// let project = projects::create_project(&stores, &auth, NewProjectInput {
///     name: "Launch".to_string(),
///     description: None,
/// }).await?;
/// assert_eq!(project.members.len(), 1);
/// # Ok(())
/// # }
/// ```

pub mod accounts;
pub mod board;
pub mod projects;

use std::collections::HashMap;
use uuid::Uuid;

use crate::auth::authorization::AuthzError;
use crate::auth::jwt::JwtError;
use crate::auth::password::PasswordError;
use crate::models::project::Project;
use crate::models::task::Task;
use crate::models::user::UserSummary;
use crate::store::{StoreError, Stores};

/// Error type for service operations
///
/// Every failure carries a human-readable message for the caller.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Malformed or missing input
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Missing or invalid credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not entitled
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Referenced record doesn't exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// State already satisfies or contradicts the request
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Unexpected store or infrastructure failure
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => ServiceError::Conflict(msg),
            StoreError::MissingReference(msg) => {
                ServiceError::NotFound(format!("Referenced record no longer exists ({})", msg))
            }
            StoreError::Database(e) => ServiceError::Internal(format!("Database error: {}", e)),
        }
    }
}

impl From<AuthzError> for ServiceError {
    fn from(err: AuthzError) -> Self {
        ServiceError::Forbidden(err.to_string())
    }
}

impl From<PasswordError> for ServiceError {
    fn from(err: PasswordError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

impl From<JwtError> for ServiceError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => ServiceError::Internal(msg),
            JwtError::Expired => ServiceError::Unauthorized("Token expired".to_string()),
            JwtError::InvalidIssuer => ServiceError::Unauthorized("Invalid issuer".to_string()),
            JwtError::ValidationError(_) => ServiceError::Unauthorized("Invalid token".to_string()),
        }
    }
}

/// Trims a required text field, failing when nothing is left
pub(crate) fn required_text(value: &str, field: &str) -> ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// Trims optional text, treating blank as absent
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Loads a project or fails with NotFound
pub(crate) async fn load_project(stores: &Stores, project_id: Uuid) -> ServiceResult<Project> {
    stores
        .projects
        .find_project(project_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Project not found".to_string()))
}

/// Display summaries for a set of users, keyed by ID
pub(crate) async fn user_lookup(
    stores: &Stores,
    ids: &[Uuid],
) -> ServiceResult<HashMap<Uuid, UserSummary>> {
    let summaries = stores.users.user_summaries(ids).await?;
    Ok(summaries.into_iter().map(|s| (s.id, s)).collect())
}

/// Resolves owner and member references of a project
pub(crate) fn resolve_project(mut project: Project, lookup: &HashMap<Uuid, UserSummary>) -> Project {
    project.owner = project.owner.resolve(lookup);
    for member in &mut project.members {
        member.user = member.user.clone().resolve(lookup);
    }
    project
}

/// Resolves assignee and comment author references of a task
pub(crate) fn resolve_task(mut task: Task, lookup: &HashMap<Uuid, UserSummary>) -> Task {
    task.assigned_to = task.assigned_to.map(|a| a.resolve(lookup));
    for comment in &mut task.comments {
        comment.user = comment.user.clone().resolve(lookup);
    }
    task
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::authorization::Capability;
    use crate::models::project::ProjectRole;

    #[test]
    fn test_required_text() {
        assert_eq!(required_text("  Launch ", "Name").unwrap(), "Launch");
        assert!(matches!(
            required_text("   ", "Title"),
            Err(ServiceError::Validation(msg)) if msg == "Title is required"
        ));
    }

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text(Some("  ".to_string())), None);
        assert_eq!(optional_text(Some(" notes ".to_string())), Some("notes".to_string()));
        assert_eq!(optional_text(None), None);
    }

    #[test]
    fn test_error_conversions() {
        let err: ServiceError = StoreError::Conflict("taken".to_string()).into();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let err: ServiceError = AuthzError::InsufficientRole {
            role: ProjectRole::Editor,
            capability: Capability::ManageInvites,
        }
        .into();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let err: ServiceError = JwtError::Expired.into();
        assert!(matches!(err, ServiceError::Unauthorized(_)));

        let err: ServiceError = StoreError::Database(sqlx::Error::PoolTimedOut).into();
        assert!(matches!(err, ServiceError::Internal(_)));
    }
}
