/// Columns, tasks and comments
///
/// Every operation is scoped to a project: a task ID that belongs to another
/// project is reported as not found. Boards get the default columns (To Do,
/// In Progress, Done) the first time they are read or written, inserted
/// idempotently so concurrent first loads can't duplicate them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    load_project, optional_text, required_text, resolve_project, resolve_task, user_lookup,
    ServiceError, ServiceResult,
};
use crate::auth::authorization::{authorize, Capability};
use crate::auth::middleware::AuthContext;
use crate::models::column::{Column, NewColumn};
use crate::models::project::{Project, ProjectMember};
use crate::models::reference::Ref;
use crate::models::task::{NewTask, Task, TaskChanges, TaskPriority};
use crate::models::user::UserSummary;
use crate::store::Stores;

/// Assignee values that mean "nobody"
const UNASSIGNED: [&str; 4] = ["", "null", "none", "unassigned"];

/// Everything needed to render a board
#[derive(Debug, Clone, Serialize)]
pub struct BoardView {
    pub project_id: Uuid,
    pub project_name: String,
    pub owner: Ref<UserSummary>,
    pub members: Vec<ProjectMember>,

    /// Columns in display order
    pub columns: Vec<Column>,

    /// Tasks, oldest first
    pub tasks: Vec<Task>,
}

/// Input for creating a task
#[derive(Debug, Clone, Default)]
pub struct TaskInput {
    pub title: String,
    pub description: Option<String>,

    /// Raw assignee as sent by the client: a user ID or an "unassigned" marker
    pub assigned_to: Option<String>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Partial update of a task
///
/// `None` leaves a field untouched; `Some(None)` clears a nullable field.
/// Status only changes through [`move_task`].
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub assigned_to: Option<Option<String>>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<Option<DateTime<Utc>>>,
}

/// Interprets a raw assignee value
///
/// Absent values and the markers in [`UNASSIGNED`] mean no assignee; anything
/// else must be a UUID.
pub fn parse_assignee(raw: Option<&str>) -> ServiceResult<Option<Uuid>> {
    let Some(raw) = raw.map(str::trim) else {
        return Ok(None);
    };

    if UNASSIGNED.iter().any(|marker| raw.eq_ignore_ascii_case(marker)) {
        return Ok(None);
    }

    Uuid::parse_str(raw)
        .map(Some)
        .map_err(|_| ServiceError::Validation(format!("Invalid assignee: {}", raw)))
}

/// Checks that an assignee, if any, is a known user
async fn check_assignee(stores: &Stores, assignee: Option<Uuid>) -> ServiceResult<()> {
    if let Some(user_id) = assignee {
        if stores.users.find_user(user_id).await?.is_none() {
            return Err(ServiceError::Validation(format!(
                "Assignee {} does not exist",
                user_id
            )));
        }
    }
    Ok(())
}

/// Columns of a project, creating the defaults if there are none
pub async fn ensure_columns(stores: &Stores, project_id: Uuid) -> ServiceResult<Vec<Column>> {
    let columns = stores.boards.list_columns(project_id).await?;
    if !columns.is_empty() {
        return Ok(columns);
    }

    let inserted = stores
        .boards
        .insert_columns(&NewColumn::defaults_for(project_id))
        .await?;
    if inserted > 0 {
        info!(project_id = %project_id, inserted, "Default columns created");
    }

    Ok(stores.boards.list_columns(project_id).await?)
}

async fn resolve_tasks(stores: &Stores, tasks: Vec<Task>) -> ServiceResult<Vec<Task>> {
    let mut ids: Vec<Uuid> = Vec::new();
    for task in &tasks {
        for id in task.user_ids() {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    let lookup = user_lookup(stores, &ids).await?;

    Ok(tasks.into_iter().map(|t| resolve_task(t, &lookup)).collect())
}

async fn resolved_task(stores: &Stores, task: Task) -> ServiceResult<Task> {
    let mut tasks = resolve_tasks(stores, vec![task]).await?;
    tasks
        .pop()
        .ok_or_else(|| ServiceError::Internal("Task vanished during resolution".to_string()))
}

async fn load_task(stores: &Stores, project_id: Uuid, task_id: Uuid) -> ServiceResult<Task> {
    stores
        .boards
        .find_task(project_id, task_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Task not found".to_string()))
}

/// Loads the project and checks the caller may exercise `capability` on it
async fn guarded_project(
    stores: &Stores,
    auth: &AuthContext,
    project_id: Uuid,
    capability: Capability,
) -> ServiceResult<Project> {
    let project = load_project(stores, project_id).await?;
    authorize(&project, auth.user_id, auth.role, capability)?;
    Ok(project)
}

/// The full board of a project
///
/// # Errors
///
/// `NotFound` for an unknown project, `Forbidden` unless the caller is the
/// owner or a member.
pub async fn get_board(stores: &Stores, auth: &AuthContext, project_id: Uuid) -> ServiceResult<BoardView> {
    let project = guarded_project(stores, auth, project_id, Capability::ViewBoard).await?;

    let columns = ensure_columns(stores, project_id).await?;
    let tasks = stores.boards.list_tasks(project_id).await?;

    let mut ids = project.user_ids();
    for task in &tasks {
        for id in task.user_ids() {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    let lookup: HashMap<Uuid, UserSummary> = user_lookup(stores, &ids).await?;

    let project = resolve_project(project, &lookup);
    let tasks: Vec<Task> = tasks.into_iter().map(|t| resolve_task(t, &lookup)).collect();

    debug!(
        project_id = %project_id,
        columns = columns.len(),
        tasks = tasks.len(),
        "Board loaded"
    );

    Ok(BoardView {
        project_id: project.id,
        project_name: project.name,
        owner: project.owner,
        members: project.members,
        columns,
        tasks,
    })
}

/// Creates a task in the first column of the board
///
/// # Errors
///
/// - `Validation` for a blank title or an unknown assignee
/// - `NotFound` for an unknown project
/// - `Forbidden` unless the caller may edit the board
pub async fn create_task(
    stores: &Stores,
    auth: &AuthContext,
    project_id: Uuid,
    input: TaskInput,
) -> ServiceResult<Task> {
    let title = required_text(&input.title, "Task title")?;
    let assignee = parse_assignee(input.assigned_to.as_deref())?;

    guarded_project(stores, auth, project_id, Capability::EditBoard).await?;

    check_assignee(stores, assignee).await?;

    let columns = ensure_columns(stores, project_id).await?;
    let status = columns
        .iter()
        .min_by_key(|c| c.position)
        .map(|c| c.column_key.clone())
        .ok_or_else(|| ServiceError::Internal("Board has no columns".to_string()))?;

    let task = stores
        .boards
        .create_task(NewTask {
            project_id,
            title,
            description: optional_text(input.description),
            status,
            assigned_to: assignee,
            priority: input.priority.unwrap_or_default(),
            due_date: input.due_date,
        })
        .await?;

    info!(project_id = %project_id, task_id = %task.id, "Task created");

    resolved_task(stores, task).await
}

/// Moves a task to another column
///
/// Without `strict_status` any non-empty status is accepted; with it the
/// status must be a column of the project.
///
/// # Errors
///
/// - `Validation` for a blank status, or an unknown column in strict mode
/// - `NotFound` for an unknown project or task
/// - `Forbidden` unless the caller may edit the board
pub async fn move_task(
    stores: &Stores,
    auth: &AuthContext,
    project_id: Uuid,
    task_id: Uuid,
    status: &str,
    strict_status: bool,
) -> ServiceResult<Task> {
    let status = required_text(status, "Status")?;

    guarded_project(stores, auth, project_id, Capability::EditBoard).await?;

    if strict_status {
        let columns = ensure_columns(stores, project_id).await?;
        if !columns.iter().any(|c| c.column_key == status) {
            return Err(ServiceError::Validation(format!(
                "Unknown column: {}",
                status
            )));
        }
    }

    let task = stores
        .boards
        .update_task(
            project_id,
            task_id,
            TaskChanges {
                status: Some(status.clone()),
                ..Default::default()
            },
        )
        .await?
        .ok_or_else(|| ServiceError::NotFound("Task not found".to_string()))?;

    info!(project_id = %project_id, task_id = %task_id, status = %status, "Task moved");

    resolved_task(stores, task).await
}

/// Applies a partial update to a task
///
/// # Errors
///
/// - `Validation` for a blank title or an unknown assignee
/// - `NotFound` for an unknown project or task
/// - `Forbidden` unless the caller may edit the board
pub async fn update_task(
    stores: &Stores,
    auth: &AuthContext,
    project_id: Uuid,
    task_id: Uuid,
    patch: TaskPatch,
) -> ServiceResult<Task> {
    let title = match patch.title {
        Some(title) => Some(required_text(&title, "Task title")?),
        None => None,
    };
    let assignee = match &patch.assigned_to {
        Some(raw) => Some(parse_assignee(raw.as_deref())?),
        None => None,
    };

    guarded_project(stores, auth, project_id, Capability::EditBoard).await?;

    check_assignee(stores, assignee.flatten()).await?;

    let changes = TaskChanges {
        title,
        description: patch.description.map(optional_text),
        status: None,
        assigned_to: assignee,
        priority: patch.priority,
        due_date: patch.due_date,
    };

    let task = stores
        .boards
        .update_task(project_id, task_id, changes)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Task not found".to_string()))?;

    info!(project_id = %project_id, task_id = %task_id, "Task updated");

    resolved_task(stores, task).await
}

/// Deletes a task and its comments
pub async fn delete_task(
    stores: &Stores,
    auth: &AuthContext,
    project_id: Uuid,
    task_id: Uuid,
) -> ServiceResult<()> {
    guarded_project(stores, auth, project_id, Capability::EditBoard).await?;

    if !stores.boards.delete_task(project_id, task_id).await? {
        return Err(ServiceError::NotFound("Task not found".to_string()));
    }

    info!(project_id = %project_id, task_id = %task_id, "Task deleted");
    Ok(())
}

/// Appends a comment by the caller
///
/// Returns the task with every comment author resolved.
pub async fn add_comment(
    stores: &Stores,
    auth: &AuthContext,
    project_id: Uuid,
    task_id: Uuid,
    text: &str,
) -> ServiceResult<Task> {
    let text = required_text(text, "Comment text")?;

    guarded_project(stores, auth, project_id, Capability::EditBoard).await?;
    load_task(stores, project_id, task_id).await?;

    let comment = stores.boards.add_comment(task_id, auth.user_id, &text).await?;
    debug!(task_id = %task_id, comment_id = %comment.id, "Comment added");

    let task = load_task(stores, project_id, task_id).await?;
    resolved_task(stores, task).await
}

/// Deletes one of the caller's own comments
///
/// # Errors
///
/// - `NotFound` for an unknown project, task or comment
/// - `Forbidden` unless the caller wrote the comment, project owner included
pub async fn delete_comment(
    stores: &Stores,
    auth: &AuthContext,
    project_id: Uuid,
    task_id: Uuid,
    comment_id: Uuid,
) -> ServiceResult<Task> {
    guarded_project(stores, auth, project_id, Capability::EditBoard).await?;
    let task = load_task(stores, project_id, task_id).await?;

    let comment = task
        .comment(comment_id)
        .ok_or_else(|| ServiceError::NotFound("Comment not found".to_string()))?;

    if !comment.user.refers_to(auth.user_id) {
        return Err(ServiceError::Forbidden(
            "Only the author can delete this comment".to_string(),
        ));
    }

    if !stores.boards.delete_comment(task_id, comment_id).await? {
        return Err(ServiceError::NotFound("Comment not found".to_string()));
    }

    debug!(task_id = %task_id, comment_id = %comment_id, "Comment deleted");

    let task = load_task(stores, project_id, task_id).await?;
    resolved_task(stores, task).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignee_markers() {
        for raw in [None, Some(""), Some("null"), Some("None"), Some(" unassigned ")] {
            assert_eq!(parse_assignee(raw).unwrap(), None, "{:?}", raw);
        }
    }

    #[test]
    fn test_parse_assignee_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(parse_assignee(Some(&id.to_string())).unwrap(), Some(id));
        assert!(matches!(
            parse_assignee(Some("bob")),
            Err(ServiceError::Validation(_))
        ));
    }
}
