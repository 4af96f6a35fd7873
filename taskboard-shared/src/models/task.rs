/// Task and comment models and database operations
///
/// Tasks live on a project's board. Their `status` is the `column_key` of a
/// column in the same project. Comments hang off a task in creation order.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high', 'critical');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     title VARCHAR(500) NOT NULL,
///     description TEXT,
///     status VARCHAR(64) NOT NULL,
///     assigned_to UUID REFERENCES users(id) ON DELETE SET NULL,
///     priority task_priority NOT NULL DEFAULT 'medium',
///     due_date TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE task_comments (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     text TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::task::{TaskRecord, NewTask, TaskChanges, TaskPriority};
/// use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let project_id = Uuid::new_v4();
/// let task = TaskRecord::create(&pool, NewTask {
///     project_id,
///     title: "Write announcement".to_string(),
///     description: None,
///     status: "todo".to_string(),
///     assigned_to: None,
///     priority: TaskPriority::High,
///     due_date: None,
/// }).await?;
///
/// // Move it across the board
/// TaskRecord::update(&pool, project_id, task.id, TaskChanges {
///     status: Some("done".to_string()),
///     ..Default::default()
/// }).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::reference::Ref;
use super::user::UserSummary;

/// Task priority
///
/// Serialized capitalized (`"Medium"`), stored lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
pub enum TaskPriority {
    #[serde(alias = "low")]
    Low,

    #[default]
    #[serde(alias = "medium")]
    Medium,

    #[serde(alias = "high")]
    High,

    #[serde(alias = "critical")]
    Critical,
}

/// A comment on a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment ID
    pub id: Uuid,

    /// Comment body
    pub text: String,

    /// Author
    pub user: Ref<UserSummary>,

    /// When the comment was posted
    pub created_at: DateTime<Utc>,
}

/// A task on a project's board, with its comments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Task ID
    pub id: Uuid,

    /// Owning project
    pub project_id: Uuid,

    /// Title, never empty
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// `column_key` of the column holding the task
    pub status: String,

    /// Assignee, if any
    pub assigned_to: Option<Ref<UserSummary>>,

    /// Priority
    pub priority: TaskPriority,

    /// Optional due date
    pub due_date: Option<DateTime<Utc>>,

    /// Comments, oldest first
    pub comments: Vec<Comment>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Assembles a task from its row and the comment rows that belong to it
    pub fn from_parts(record: TaskRecord, comments: &[CommentRecord]) -> Self {
        let comments = comments
            .iter()
            .filter(|c| c.task_id == record.id)
            .map(Comment::from)
            .collect();

        Task {
            id: record.id,
            project_id: record.project_id,
            title: record.title,
            description: record.description,
            status: record.status,
            assigned_to: record.assigned_to.map(Ref::Id),
            priority: record.priority,
            due_date: record.due_date,
            comments,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }

    /// Looks up an embedded comment
    pub fn comment(&self, comment_id: Uuid) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == comment_id)
    }

    /// IDs of every user referenced by this task
    pub fn user_ids(&self) -> Vec<Uuid> {
        let mut ids = Vec::new();
        if let Some(assignee) = &self.assigned_to {
            ids.push(assignee.id());
        }
        for comment in &self.comments {
            let id = comment.user.id();
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }
}

/// Row of the `tasks` table
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskRecord {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub assigned_to: Option<Uuid>,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row of the `task_comments` table
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommentRecord {
    pub id: Uuid,
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl From<&CommentRecord> for Comment {
    fn from(record: &CommentRecord) -> Self {
        Comment {
            id: record.id,
            text: record.text.clone(),
            user: Ref::Id(record.user_id),
            created_at: record.created_at,
        }
    }
}

/// Input for creating a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    /// Owning project
    pub project_id: Uuid,

    /// Title
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Initial column key
    pub status: String,

    /// Assignee
    pub assigned_to: Option<Uuid>,

    /// Priority
    pub priority: TaskPriority,

    /// Due date
    pub due_date: Option<DateTime<Utc>>,
}

/// Partial update of a task
///
/// `None` leaves a field untouched. For nullable fields `Some(None)` clears
/// the value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<String>,
    pub assigned_to: Option<Option<Uuid>>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl TaskChanges {
    /// Applies the changes to an in-memory row
    pub fn apply_to(self, record: &mut TaskRecord) {
        if let Some(title) = self.title {
            record.title = title;
        }
        if let Some(description) = self.description {
            record.description = description;
        }
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(assigned_to) = self.assigned_to {
            record.assigned_to = assigned_to;
        }
        if let Some(priority) = self.priority {
            record.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            record.due_date = due_date;
        }
    }
}

const TASK_COLUMNS: &str = "id, project_id, title, description, status, assigned_to, priority, due_date, created_at, updated_at";

impl TaskRecord {
    /// Creates a task
    ///
    /// # Errors
    ///
    /// Returns an error if the project or assignee doesn't exist (foreign key
    /// violation) or the database connection fails.
    pub async fn create(pool: &PgPool, data: NewTask) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, TaskRecord>(&format!(
            r#"
            INSERT INTO tasks (project_id, title, description, status, assigned_to, priority, due_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            TASK_COLUMNS
        ))
        .bind(data.project_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .bind(data.assigned_to)
        .bind(data.priority)
        .bind(data.due_date)
        .fetch_one(pool)
        .await
    }

    /// Finds a task within a project
    ///
    /// A task belonging to another project is reported as absent.
    pub async fn find_in_project(
        pool: &PgPool,
        project_id: Uuid,
        task_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskRecord>(&format!(
            "SELECT {} FROM tasks WHERE id = $1 AND project_id = $2",
            TASK_COLUMNS
        ))
        .bind(task_id)
        .bind(project_id)
        .fetch_optional(pool)
        .await
    }

    /// Lists a project's tasks, oldest first
    pub async fn list_by_project(pool: &PgPool, project_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskRecord>(&format!(
            "SELECT {} FROM tasks WHERE project_id = $1 ORDER BY created_at ASC, id ASC",
            TASK_COLUMNS
        ))
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    /// Applies a partial update to a task within a project
    ///
    /// # Returns
    ///
    /// The updated task, or None if no such task exists in the project
    pub async fn update(
        pool: &PgPool,
        project_id: Uuid,
        task_id: Uuid,
        data: TaskChanges,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build dynamic update query based on which fields are present
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 2;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if data.assigned_to.is_some() {
            bind_count += 1;
            query.push_str(&format!(", assigned_to = ${}", bind_count));
        }
        if data.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(", priority = ${}", bind_count));
        }
        if data.due_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", due_date = ${}", bind_count));
        }

        query.push_str(&format!(
            " WHERE id = $1 AND project_id = $2 RETURNING {}",
            TASK_COLUMNS
        ));

        let mut q = sqlx::query_as::<_, TaskRecord>(&query)
            .bind(task_id)
            .bind(project_id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(assigned_to) = data.assigned_to {
            q = q.bind(assigned_to);
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a task within a project; its comments cascade
    ///
    /// # Returns
    ///
    /// True if the task was deleted
    pub async fn delete(pool: &PgPool, project_id: Uuid, task_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND project_id = $2")
            .bind(task_id)
            .bind(project_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl CommentRecord {
    /// Appends a comment to a task
    pub async fn create(
        pool: &PgPool,
        task_id: Uuid,
        user_id: Uuid,
        text: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, CommentRecord>(
            r#"
            INSERT INTO task_comments (task_id, user_id, text)
            VALUES ($1, $2, $3)
            RETURNING id, task_id, user_id, text, created_at
            "#,
        )
        .bind(task_id)
        .bind(user_id)
        .bind(text)
        .fetch_one(pool)
        .await
    }

    /// Loads the comments of a batch of tasks, oldest first
    pub async fn list_for_tasks(pool: &PgPool, task_ids: &[Uuid]) -> Result<Vec<Self>, sqlx::Error> {
        if task_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, CommentRecord>(
            r#"
            SELECT id, task_id, user_id, text, created_at
            FROM task_comments
            WHERE task_id = ANY($1)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(task_ids)
        .fetch_all(pool)
        .await
    }

    /// Removes a comment from a task
    ///
    /// # Returns
    ///
    /// True if the comment was removed
    pub async fn delete(pool: &PgPool, task_id: Uuid, comment_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM task_comments WHERE id = $1 AND task_id = $2")
            .bind(comment_id)
            .bind(task_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
