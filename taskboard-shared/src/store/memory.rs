/// In-memory store backend
///
/// Keeps every table in a single `RwLock`-guarded state and enforces the same
/// rules as the PostgreSQL schema: unique emails, unique invite tokens, one
/// membership row per (project, user), unique column keys per project,
/// foreign keys and cascading deletes. Rows keep insertion order, which
/// stands in for the `created_at` ordering of the SQL queries.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{BoardStore, HealthCheck, ProjectStore, StoreError, StoreResult, UserStore};
use crate::models::column::{Column, NewColumn};
use crate::models::project::{
    MemberRecord, NewProject, Project, ProjectChanges, ProjectRecord, ProjectRole,
};
use crate::models::task::{Comment, CommentRecord, NewTask, Task, TaskChanges, TaskRecord};
use crate::models::user::{normalize_email, CreateUser, User, UserSummary, SEARCH_LIMIT};

#[derive(Debug, Default)]
struct State {
    users: Vec<User>,
    projects: Vec<ProjectRecord>,
    members: Vec<MemberRecord>,
    columns: Vec<Column>,
    tasks: Vec<TaskRecord>,
    comments: Vec<CommentRecord>,
}

impl State {
    fn user_exists(&self, id: Uuid) -> bool {
        self.users.iter().any(|u| u.id == id)
    }

    fn project_exists(&self, id: Uuid) -> bool {
        self.projects.iter().any(|p| p.id == id)
    }

    fn project(&self, id: Uuid) -> Option<Project> {
        self.projects
            .iter()
            .find(|p| p.id == id)
            .map(|record| Project::from_parts(record.clone(), &self.members))
    }

    fn task(&self, project_id: Uuid, task_id: Uuid) -> Option<Task> {
        self.tasks
            .iter()
            .find(|t| t.id == task_id && t.project_id == project_id)
            .map(|record| Task::from_parts(record.clone(), &self.comments))
    }

    fn insert_member(&mut self, project_id: Uuid, user_id: Uuid, role: ProjectRole) -> StoreResult<()> {
        if !self.user_exists(user_id) {
            return Err(StoreError::MissingReference(format!("user {}", user_id)));
        }
        if self
            .members
            .iter()
            .any(|m| m.project_id == project_id && m.user_id == user_id)
        {
            return Err(StoreError::Conflict(
                "User is already a member of this project".to_string(),
            ));
        }

        self.members.push(MemberRecord {
            project_id,
            user_id,
            role,
            joined_at: Utc::now(),
        });
        Ok(())
    }

    fn delete_task_rows(&mut self, task_ids: &[Uuid]) {
        self.comments.retain(|c| !task_ids.contains(&c.task_id));
        self.tasks.retain(|t| !task_ids.contains(&t.id));
    }
}

/// Store backend holding everything in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut state = self.state.write().await;
        let email = normalize_email(&data.email);

        if state.users.iter().any(|u| u.email == email) {
            return Err(StoreError::Conflict("Email is already registered".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: data.name,
            email,
            password_hash: data.password_hash,
            role: data.role,
            created_at: now,
            updated_at: now,
        };
        state.users.push(user.clone());

        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let state = self.state.read().await;
        let email = normalize_email(email);
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn search_users(&self, term: &str, exclude: Uuid) -> StoreResult<Vec<UserSummary>> {
        let state = self.state.read().await;
        let needle = term.trim().to_lowercase();

        let mut found: Vec<UserSummary> = state
            .users
            .iter()
            .filter(|u| u.id != exclude)
            .filter(|u| {
                u.name.to_lowercase().contains(&needle) || u.email.to_lowercase().contains(&needle)
            })
            .map(User::summary)
            .collect();

        found.sort_by(|a, b| a.name.cmp(&b.name));
        found.truncate(SEARCH_LIMIT as usize);

        Ok(found)
    }

    async fn user_summaries(&self, ids: &[Uuid]) -> StoreResult<Vec<UserSummary>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .map(User::summary)
            .collect())
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn create_project(&self, data: NewProject) -> StoreResult<Project> {
        let mut state = self.state.write().await;

        if !state.user_exists(data.owner_id) {
            return Err(StoreError::MissingReference(format!("user {}", data.owner_id)));
        }

        let now = Utc::now();
        let record = ProjectRecord {
            id: Uuid::new_v4(),
            name: data.name,
            description: data.description,
            owner_id: data.owner_id,
            invite_token: None,
            created_at: now,
            updated_at: now,
        };
        let id = record.id;
        state.projects.push(record);
        state.insert_member(id, data.owner_id, ProjectRole::Owner)?;

        state
            .project(id)
            .ok_or_else(|| StoreError::MissingReference(format!("project {}", id)))
    }

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        Ok(self.state.read().await.project(id))
    }

    async fn list_projects_for(&self, user_id: Uuid) -> StoreResult<Vec<Project>> {
        let state = self.state.read().await;

        Ok(state
            .projects
            .iter()
            .rev()
            .filter(|p| {
                p.owner_id == user_id
                    || state
                        .members
                        .iter()
                        .any(|m| m.project_id == p.id && m.user_id == user_id)
            })
            .map(|record| Project::from_parts(record.clone(), &state.members))
            .collect())
    }

    async fn update_project(&self, id: Uuid, changes: ProjectChanges) -> StoreResult<Option<Project>> {
        let mut state = self.state.write().await;

        let Some(record) = state.projects.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            record.name = name;
        }
        if let Some(description) = changes.description {
            record.description = description;
        }
        record.updated_at = Utc::now();

        Ok(state.project(id))
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;

        if !state.project_exists(id) {
            return Ok(false);
        }

        let task_ids: Vec<Uuid> = state
            .tasks
            .iter()
            .filter(|t| t.project_id == id)
            .map(|t| t.id)
            .collect();
        state.delete_task_rows(&task_ids);
        state.columns.retain(|c| c.project_id != id);
        state.members.retain(|m| m.project_id != id);
        state.projects.retain(|p| p.id != id);

        Ok(true)
    }

    async fn set_invite_token(&self, id: Uuid, token: &str) -> StoreResult<bool> {
        let mut state = self.state.write().await;

        if state
            .projects
            .iter()
            .any(|p| p.id != id && p.invite_token.as_deref() == Some(token))
        {
            return Err(StoreError::Conflict("Invite token already in use".to_string()));
        }

        match state.projects.iter_mut().find(|p| p.id == id) {
            Some(record) => {
                record.invite_token = Some(token.to_string());
                record.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_project_by_invite(&self, token: &str) -> StoreResult<Option<Project>> {
        let state = self.state.read().await;

        Ok(state
            .projects
            .iter()
            .find(|p| p.invite_token.as_deref() == Some(token))
            .and_then(|p| state.project(p.id)))
    }

    async fn redeem_invite(
        &self,
        project_id: Uuid,
        token: &str,
        user_id: Uuid,
        role: ProjectRole,
    ) -> StoreResult<bool> {
        let mut state = self.state.write().await;

        let matches = state
            .projects
            .iter()
            .any(|p| p.id == project_id && p.invite_token.as_deref() == Some(token));
        if !matches {
            return Ok(false);
        }

        // Insert first so a conflict leaves the token in place
        state.insert_member(project_id, user_id, role)?;

        if let Some(record) = state.projects.iter_mut().find(|p| p.id == project_id) {
            record.invite_token = None;
            record.updated_at = Utc::now();
        }

        Ok(true)
    }

    async fn add_member(&self, project_id: Uuid, user_id: Uuid, role: ProjectRole) -> StoreResult<()> {
        let mut state = self.state.write().await;

        if !state.project_exists(project_id) {
            return Err(StoreError::MissingReference(format!("project {}", project_id)));
        }
        state.insert_member(project_id, user_id, role)
    }

    async fn remove_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;

        let before = state.members.len();
        state
            .members
            .retain(|m| !(m.project_id == project_id && m.user_id == user_id));

        Ok(state.members.len() < before)
    }
}

#[async_trait]
impl BoardStore for MemoryStore {
    async fn insert_columns(&self, columns: &[NewColumn]) -> StoreResult<usize> {
        let mut state = self.state.write().await;
        let mut inserted = 0;

        for column in columns {
            if !state.project_exists(column.project_id) {
                return Err(StoreError::MissingReference(format!(
                    "project {}",
                    column.project_id
                )));
            }
            let exists = state
                .columns
                .iter()
                .any(|c| c.project_id == column.project_id && c.column_key == column.column_key);
            if exists {
                continue;
            }

            state.columns.push(Column {
                id: Uuid::new_v4(),
                project_id: column.project_id,
                column_key: column.column_key.clone(),
                title: column.title.clone(),
                position: column.position,
                created_at: Utc::now(),
            });
            inserted += 1;
        }

        Ok(inserted)
    }

    async fn list_columns(&self, project_id: Uuid) -> StoreResult<Vec<Column>> {
        let state = self.state.read().await;

        let mut columns: Vec<Column> = state
            .columns
            .iter()
            .filter(|c| c.project_id == project_id)
            .cloned()
            .collect();
        // Stable sort keeps insertion order between equal positions
        columns.sort_by_key(|c| c.position);

        Ok(columns)
    }

    async fn create_task(&self, data: NewTask) -> StoreResult<Task> {
        let mut state = self.state.write().await;

        if !state.project_exists(data.project_id) {
            return Err(StoreError::MissingReference(format!("project {}", data.project_id)));
        }
        if let Some(assignee) = data.assigned_to {
            if !state.user_exists(assignee) {
                return Err(StoreError::MissingReference(format!("user {}", assignee)));
            }
        }

        let now = Utc::now();
        let record = TaskRecord {
            id: Uuid::new_v4(),
            project_id: data.project_id,
            title: data.title,
            description: data.description,
            status: data.status,
            assigned_to: data.assigned_to,
            priority: data.priority,
            due_date: data.due_date,
            created_at: now,
            updated_at: now,
        };
        state.tasks.push(record.clone());

        Ok(Task::from_parts(record, &[]))
    }

    async fn find_task(&self, project_id: Uuid, task_id: Uuid) -> StoreResult<Option<Task>> {
        Ok(self.state.read().await.task(project_id, task_id))
    }

    async fn list_tasks(&self, project_id: Uuid) -> StoreResult<Vec<Task>> {
        let state = self.state.read().await;

        Ok(state
            .tasks
            .iter()
            .filter(|t| t.project_id == project_id)
            .map(|record| Task::from_parts(record.clone(), &state.comments))
            .collect())
    }

    async fn update_task(
        &self,
        project_id: Uuid,
        task_id: Uuid,
        changes: TaskChanges,
    ) -> StoreResult<Option<Task>> {
        let mut state = self.state.write().await;

        if let Some(Some(assignee)) = changes.assigned_to {
            if !state.user_exists(assignee) {
                return Err(StoreError::MissingReference(format!("user {}", assignee)));
            }
        }

        let Some(record) = state
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id && t.project_id == project_id)
        else {
            return Ok(None);
        };
        changes.apply_to(record);
        record.updated_at = Utc::now();

        Ok(state.task(project_id, task_id))
    }

    async fn delete_task(&self, project_id: Uuid, task_id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;

        if state.task(project_id, task_id).is_none() {
            return Ok(false);
        }
        state.delete_task_rows(&[task_id]);

        Ok(true)
    }

    async fn add_comment(&self, task_id: Uuid, user_id: Uuid, text: &str) -> StoreResult<Comment> {
        let mut state = self.state.write().await;

        if !state.tasks.iter().any(|t| t.id == task_id) {
            return Err(StoreError::MissingReference(format!("task {}", task_id)));
        }
        if !state.user_exists(user_id) {
            return Err(StoreError::MissingReference(format!("user {}", user_id)));
        }

        let record = CommentRecord {
            id: Uuid::new_v4(),
            task_id,
            user_id,
            text: text.to_string(),
            created_at: Utc::now(),
        };
        let comment = Comment::from(&record);
        state.comments.push(record);

        Ok(comment)
    }

    async fn delete_comment(&self, task_id: Uuid, comment_id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;

        let before = state.comments.len();
        state
            .comments
            .retain(|c| !(c.id == comment_id && c.task_id == task_id));

        Ok(state.comments.len() < before)
    }
}

#[async_trait]
impl HealthCheck for MemoryStore {
    async fn check(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::UserRole;

    async fn user(store: &MemoryStore, email: &str) -> User {
        store
            .create_user(CreateUser {
                name: email.split('@').next().unwrap_or("user").to_string(),
                email: email.to_string(),
                password_hash: "hash".to_string(),
                role: UserRole::Member,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let store = MemoryStore::new();
        user(&store, "ada@example.com").await;

        let result = store
            .create_user(CreateUser {
                name: "Other".to_string(),
                email: "ADA@example.com".to_string(),
                password_hash: "hash".to_string(),
                role: UserRole::Member,
            })
            .await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_invite_token_is_globally_unique() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner@example.com").await;
        let first = store
            .create_project(NewProject {
                owner_id: owner.id,
                name: "One".to_string(),
                description: None,
            })
            .await
            .unwrap();
        let second = store
            .create_project(NewProject {
                owner_id: owner.id,
                name: "Two".to_string(),
                description: None,
            })
            .await
            .unwrap();

        assert!(store.set_invite_token(first.id, "tok").await.unwrap());
        assert!(matches!(
            store.set_invite_token(second.id, "tok").await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_redeem_conflict_keeps_token() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner@example.com").await;
        let project = store
            .create_project(NewProject {
                owner_id: owner.id,
                name: "Launch".to_string(),
                description: None,
            })
            .await
            .unwrap();
        store.set_invite_token(project.id, "tok").await.unwrap();

        let result = store
            .redeem_invite(project.id, "tok", owner.id, ProjectRole::Editor)
            .await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));

        let reloaded = store.find_project(project.id).await.unwrap().unwrap();
        assert_eq!(reloaded.invite_token.as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn test_delete_project_cascades() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner@example.com").await;
        let project = store
            .create_project(NewProject {
                owner_id: owner.id,
                name: "Launch".to_string(),
                description: None,
            })
            .await
            .unwrap();
        store
            .insert_columns(&NewColumn::defaults_for(project.id))
            .await
            .unwrap();
        let task = store
            .create_task(NewTask {
                project_id: project.id,
                title: "Task".to_string(),
                description: None,
                status: "todo".to_string(),
                assigned_to: None,
                priority: Default::default(),
                due_date: None,
            })
            .await
            .unwrap();
        store.add_comment(task.id, owner.id, "hi").await.unwrap();

        assert!(store.delete_project(project.id).await.unwrap());

        assert!(store.list_columns(project.id).await.unwrap().is_empty());
        assert!(store.list_tasks(project.id).await.unwrap().is_empty());
        assert!(store.list_projects_for(owner.id).await.unwrap().is_empty());
        assert!(store.state.read().await.comments.is_empty());
    }

    #[tokio::test]
    async fn test_search_excludes_requester_and_caps_results() {
        let store = MemoryStore::new();
        let me = user(&store, "me@example.com").await;
        for i in 0..25 {
            user(&store, &format!("dev{:02}@example.com", i)).await;
        }

        let found = store.search_users("EXAMPLE", me.id).await.unwrap();
        assert_eq!(found.len(), SEARCH_LIMIT as usize);
        assert!(found.iter().all(|u| u.id != me.id));

        let found = store.search_users("dev07", me.id).await.unwrap();
        assert_eq!(found.len(), 1);
    }
}
