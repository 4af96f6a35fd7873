/// Storage layer
///
/// The services never talk to a database directly. They go through the store
/// traits below, bundled in a cloneable [`Stores`] registry. Two backends
/// implement every trait:
///
/// - [`postgres::PgStore`]: production backend over a `PgPool`
/// - [`memory::MemoryStore`]: in-process backend with the same uniqueness
///   rules, used by tests and for local experiments
///
/// Stores return references in their bare form; resolving them for display
/// is the services' job.
///
/// # Example
///
/// ```
/// use taskboard_shared::store::Stores;
/// use taskboard_shared::models::user::{CreateUser, UserRole};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let stores = Stores::in_memory();
///
/// let user = stores.users.create_user(CreateUser {
///     name: "Ada".to_string(),
///     email: "ada@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     role: UserRole::Member,
/// }).await?;
///
/// assert!(stores.users.find_user(user.id).await?.is_some());
/// # Ok(())
/// # }
/// ```

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::column::{Column, NewColumn};
use crate::models::project::{NewProject, Project, ProjectChanges, ProjectRole};
use crate::models::task::{Comment, NewTask, Task, TaskChanges};
use crate::models::user::{CreateUser, User, UserSummary};

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness rule was violated
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A referenced record doesn't exist
    #[error("Missing reference: {0}")]
    MissingReference(String),

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::Conflict(db_err.message().to_string());
            }
            if db_err.is_foreign_key_violation() {
                return StoreError::MissingReference(db_err.message().to_string());
            }
        }
        StoreError::Database(err)
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Identity store
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Creates a user; `Conflict` if the email is taken
    async fn create_user(&self, data: CreateUser) -> StoreResult<User>;

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Case-insensitive lookup by email
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Case-insensitive substring search on name or email, excluding one user
    async fn search_users(&self, term: &str, exclude: Uuid) -> StoreResult<Vec<UserSummary>>;

    /// Display summaries for the given IDs; unknown IDs are skipped
    async fn user_summaries(&self, ids: &[Uuid]) -> StoreResult<Vec<UserSummary>>;
}

/// Project and membership store
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Creates a project with its owner as the sole member
    async fn create_project(&self, data: NewProject) -> StoreResult<Project>;

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>>;

    /// Projects the user owns or is a member of, newest first
    async fn list_projects_for(&self, user_id: Uuid) -> StoreResult<Vec<Project>>;

    async fn update_project(&self, id: Uuid, changes: ProjectChanges) -> StoreResult<Option<Project>>;

    /// Deletes a project with its members, columns, tasks and comments
    async fn delete_project(&self, id: Uuid) -> StoreResult<bool>;

    /// Overwrites the invite token; `Conflict` if another project carries it
    async fn set_invite_token(&self, id: Uuid, token: &str) -> StoreResult<bool>;

    async fn find_project_by_invite(&self, token: &str) -> StoreResult<Option<Project>>;

    /// Adds the user and clears the token, only if the project still carries
    /// `token`. Returns false when the token no longer matched.
    async fn redeem_invite(
        &self,
        project_id: Uuid,
        token: &str,
        user_id: Uuid,
        role: ProjectRole,
    ) -> StoreResult<bool>;

    /// Adds a member; `Conflict` if the user is already in the project
    async fn add_member(&self, project_id: Uuid, user_id: Uuid, role: ProjectRole) -> StoreResult<()>;

    /// Removes a member; false if there was no such entry
    async fn remove_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool>;
}

/// Board store: columns, tasks and comments
#[async_trait]
pub trait BoardStore: Send + Sync {
    /// Inserts each column unless its key already exists in the project.
    /// Returns the number of columns inserted.
    async fn insert_columns(&self, columns: &[NewColumn]) -> StoreResult<usize>;

    /// Columns of a project in display order
    async fn list_columns(&self, project_id: Uuid) -> StoreResult<Vec<Column>>;

    async fn create_task(&self, data: NewTask) -> StoreResult<Task>;

    /// Finds a task within a project
    async fn find_task(&self, project_id: Uuid, task_id: Uuid) -> StoreResult<Option<Task>>;

    /// Tasks of a project, oldest first
    async fn list_tasks(&self, project_id: Uuid) -> StoreResult<Vec<Task>>;

    async fn update_task(
        &self,
        project_id: Uuid,
        task_id: Uuid,
        changes: TaskChanges,
    ) -> StoreResult<Option<Task>>;

    async fn delete_task(&self, project_id: Uuid, task_id: Uuid) -> StoreResult<bool>;

    /// Appends a comment to a task
    async fn add_comment(&self, task_id: Uuid, user_id: Uuid, text: &str) -> StoreResult<Comment>;

    async fn delete_comment(&self, task_id: Uuid, comment_id: Uuid) -> StoreResult<bool>;
}

/// Backend liveness probe
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn check(&self) -> bool;
}

/// Registry of store handles shared by the services
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub projects: Arc<dyn ProjectStore>,
    pub boards: Arc<dyn BoardStore>,
    pub health: Arc<dyn HealthCheck>,
}

impl Stores {
    /// Registry backed by PostgreSQL
    pub fn postgres(pool: PgPool) -> Self {
        Self::from_backend(Arc::new(postgres::PgStore::new(pool)))
    }

    /// Registry backed by a fresh in-memory store
    pub fn in_memory() -> Self {
        Self::from_backend(Arc::new(memory::MemoryStore::new()))
    }

    /// Registry where one backend serves every trait
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: UserStore + ProjectStore + BoardStore + HealthCheck + 'static,
    {
        Self {
            users: backend.clone(),
            projects: backend.clone(),
            boards: backend.clone(),
            health: backend,
        }
    }
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}
