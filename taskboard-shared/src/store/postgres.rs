/// PostgreSQL store backend
///
/// Thin adapter from the store traits to the model queries. Multi-row reads
/// load the child rows (members, comments) for the whole batch in one query.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{BoardStore, HealthCheck, ProjectStore, StoreError, StoreResult, UserStore};
use crate::db::pool::health_check;
use crate::models::column::{Column, NewColumn};
use crate::models::project::{NewProject, Project, ProjectChanges, ProjectRecord, ProjectRole};
use crate::models::task::{Comment, CommentRecord, NewTask, Task, TaskChanges, TaskRecord};
use crate::models::user::{CreateUser, User, UserSummary};

/// Store backend over a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn assemble_projects(&self, records: Vec<ProjectRecord>) -> StoreResult<Vec<Project>> {
        let ids: Vec<Uuid> = records.iter().map(|r| r.id).collect();
        let members = ProjectRecord::members_of(&self.pool, &ids).await?;

        Ok(records
            .into_iter()
            .map(|record| Project::from_parts(record, &members))
            .collect())
    }

    async fn assemble_project(&self, record: Option<ProjectRecord>) -> StoreResult<Option<Project>> {
        match record {
            Some(record) => Ok(self.assemble_projects(vec![record]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn assemble_tasks(&self, records: Vec<TaskRecord>) -> StoreResult<Vec<Task>> {
        let ids: Vec<Uuid> = records.iter().map(|r| r.id).collect();
        let comments = CommentRecord::list_for_tasks(&self.pool, &ids).await?;

        Ok(records
            .into_iter()
            .map(|record| Task::from_parts(record, &comments))
            .collect())
    }

    async fn assemble_task(&self, record: Option<TaskRecord>) -> StoreResult<Option<Task>> {
        match record {
            Some(record) => Ok(self.assemble_tasks(vec![record]).await?.pop()),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        User::create(&self.pool, data).await.map_err(|e| match StoreError::from(e) {
            StoreError::Conflict(_) => StoreError::Conflict("Email is already registered".to_string()),
            other => other,
        })
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn search_users(&self, term: &str, exclude: Uuid) -> StoreResult<Vec<UserSummary>> {
        Ok(User::search(&self.pool, term, exclude).await?)
    }

    async fn user_summaries(&self, ids: &[Uuid]) -> StoreResult<Vec<UserSummary>> {
        Ok(User::find_summaries(&self.pool, ids).await?)
    }
}

#[async_trait]
impl ProjectStore for PgStore {
    async fn create_project(&self, data: NewProject) -> StoreResult<Project> {
        let record = ProjectRecord::create(&self.pool, data).await?;
        self.assemble_project(Some(record))
            .await?
            .ok_or_else(|| StoreError::Database(sqlx::Error::RowNotFound))
    }

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        let record = ProjectRecord::find_by_id(&self.pool, id).await?;
        self.assemble_project(record).await
    }

    async fn list_projects_for(&self, user_id: Uuid) -> StoreResult<Vec<Project>> {
        let records = ProjectRecord::list_for_user(&self.pool, user_id).await?;
        self.assemble_projects(records).await
    }

    async fn update_project(&self, id: Uuid, changes: ProjectChanges) -> StoreResult<Option<Project>> {
        let record = ProjectRecord::update(&self.pool, id, changes).await?;
        self.assemble_project(record).await
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<bool> {
        Ok(ProjectRecord::delete(&self.pool, id).await?)
    }

    async fn set_invite_token(&self, id: Uuid, token: &str) -> StoreResult<bool> {
        Ok(ProjectRecord::set_invite_token(&self.pool, id, token).await?)
    }

    async fn find_project_by_invite(&self, token: &str) -> StoreResult<Option<Project>> {
        let record = ProjectRecord::find_by_invite_token(&self.pool, token).await?;
        self.assemble_project(record).await
    }

    async fn redeem_invite(
        &self,
        project_id: Uuid,
        token: &str,
        user_id: Uuid,
        role: ProjectRole,
    ) -> StoreResult<bool> {
        Ok(ProjectRecord::redeem_invite(&self.pool, project_id, token, user_id, role).await?)
    }

    async fn add_member(&self, project_id: Uuid, user_id: Uuid, role: ProjectRole) -> StoreResult<()> {
        ProjectRecord::add_member(&self.pool, project_id, user_id, role)
            .await
            .map_err(|e| match StoreError::from(e) {
                StoreError::Conflict(_) => {
                    StoreError::Conflict("User is already a member of this project".to_string())
                }
                other => other,
            })
    }

    async fn remove_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        Ok(ProjectRecord::remove_member(&self.pool, project_id, user_id).await?)
    }
}

#[async_trait]
impl BoardStore for PgStore {
    async fn insert_columns(&self, columns: &[NewColumn]) -> StoreResult<usize> {
        let mut inserted = 0;
        for column in columns {
            if Column::insert_if_absent(&self.pool, column).await? {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn list_columns(&self, project_id: Uuid) -> StoreResult<Vec<Column>> {
        Ok(Column::list_by_project(&self.pool, project_id).await?)
    }

    async fn create_task(&self, data: NewTask) -> StoreResult<Task> {
        let record = TaskRecord::create(&self.pool, data).await?;
        Ok(Task::from_parts(record, &[]))
    }

    async fn find_task(&self, project_id: Uuid, task_id: Uuid) -> StoreResult<Option<Task>> {
        let record = TaskRecord::find_in_project(&self.pool, project_id, task_id).await?;
        self.assemble_task(record).await
    }

    async fn list_tasks(&self, project_id: Uuid) -> StoreResult<Vec<Task>> {
        let records = TaskRecord::list_by_project(&self.pool, project_id).await?;
        self.assemble_tasks(records).await
    }

    async fn update_task(
        &self,
        project_id: Uuid,
        task_id: Uuid,
        changes: TaskChanges,
    ) -> StoreResult<Option<Task>> {
        let record = TaskRecord::update(&self.pool, project_id, task_id, changes).await?;
        self.assemble_task(record).await
    }

    async fn delete_task(&self, project_id: Uuid, task_id: Uuid) -> StoreResult<bool> {
        Ok(TaskRecord::delete(&self.pool, project_id, task_id).await?)
    }

    async fn add_comment(&self, task_id: Uuid, user_id: Uuid, text: &str) -> StoreResult<Comment> {
        let record = CommentRecord::create(&self.pool, task_id, user_id, text).await?;
        Ok(Comment::from(&record))
    }

    async fn delete_comment(&self, task_id: Uuid, comment_id: Uuid) -> StoreResult<bool> {
        Ok(CommentRecord::delete(&self.pool, task_id, comment_id).await?)
    }
}

#[async_trait]
impl HealthCheck for PgStore {
    async fn check(&self) -> bool {
        health_check(&self.pool).await.is_ok()
    }
}
