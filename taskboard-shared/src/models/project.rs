/// Project model, memberships and database operations
///
/// A project is owned by exactly one user and shared with members, each
/// carrying a project-scoped role. The owner is stored as a member row with
/// role `owner`; the `(project_id, user_id)` primary key keeps every user,
/// owner included, present at most once.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE project_role AS ENUM ('owner', 'admin', 'editor', 'viewer');
///
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(200) NOT NULL,
///     description TEXT,
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     invite_token VARCHAR(128) UNIQUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE project_members (
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role project_role NOT NULL DEFAULT 'editor',
///     joined_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (project_id, user_id)
/// );
/// ```
///
/// # Roles
///
/// - **owner**: Full control, the only role allowed to add members directly
/// - **admin**: Can issue invite links and kick members
/// - **editor**: Can read and write the board
/// - **viewer**: Same board access as editor
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::project::{ProjectRecord, NewProject};
/// use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let owner_id = Uuid::new_v4();
/// let project = ProjectRecord::create(&pool, NewProject {
///     owner_id,
///     name: "Launch".to_string(),
///     description: None,
/// }).await?;
///
/// let members = ProjectRecord::members_of(&pool, &[project.id]).await?;
/// assert_eq!(members.len(), 1);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::reference::Ref;
use super::user::UserSummary;

/// Project-scoped membership roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProjectRole {
    /// Creator of the project
    Owner,

    /// Can manage invites and remove members
    Admin,

    /// Can read and write the board
    Editor,

    /// Can read and write the board
    Viewer,
}

impl ProjectRole {
    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectRole::Owner => "owner",
            ProjectRole::Admin => "admin",
            ProjectRole::Editor => "editor",
            ProjectRole::Viewer => "viewer",
        }
    }
}

/// Role given to users joining through an invite link or a direct add
pub const DEFAULT_MEMBER_ROLE: ProjectRole = ProjectRole::Editor;

/// One entry in a project's member list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMember {
    /// The member
    pub user: Ref<UserSummary>,

    /// Role within the project
    pub role: ProjectRole,

    /// When the user joined
    pub joined_at: DateTime<Utc>,
}

/// A project together with its member list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Unique project ID
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// Owning user, immutable after creation
    pub owner: Ref<UserSummary>,

    /// Members including the owner
    pub members: Vec<ProjectMember>,

    /// Active single-use invite token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite_token: Option<String>,

    /// When the project was created
    pub created_at: DateTime<Utc>,

    /// When the project was last updated
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Assembles a project from its row and the member rows that belong to it
    ///
    /// Member rows for other projects are ignored, so the full result of
    /// [`ProjectRecord::members_of`] can be passed for a batch of projects.
    pub fn from_parts(record: ProjectRecord, members: &[MemberRecord]) -> Self {
        let members = members
            .iter()
            .filter(|m| m.project_id == record.id)
            .map(|m| ProjectMember {
                user: Ref::Id(m.user_id),
                role: m.role,
                joined_at: m.joined_at,
            })
            .collect();

        Project {
            id: record.id,
            name: record.name,
            description: record.description,
            owner: Ref::Id(record.owner_id),
            members,
            invite_token: record.invite_token,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }

    /// Checks whether the user is the owner or appears in the member list
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.owner.refers_to(user_id) || self.members.iter().any(|m| m.user.refers_to(user_id))
    }

    /// IDs of every user referenced by this project
    pub fn user_ids(&self) -> Vec<Uuid> {
        let mut ids = vec![self.owner.id()];
        for member in &self.members {
            let id = member.user.id();
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }
}

/// Row of the `projects` table
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectRecord {
    /// Project ID
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// Owning user
    pub owner_id: Uuid,

    /// Active invite token
    pub invite_token: Option<String>,

    /// When the project was created
    pub created_at: DateTime<Utc>,

    /// When the project was last updated
    pub updated_at: DateTime<Utc>,
}

/// Row of the `project_members` table
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MemberRecord {
    /// Project ID
    pub project_id: Uuid,

    /// Member user ID
    pub user_id: Uuid,

    /// Role within the project
    pub role: ProjectRole,

    /// When the user joined
    pub joined_at: DateTime<Utc>,
}

/// Input for creating a new project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProject {
    /// Creator, who becomes owner
    pub owner_id: Uuid,

    /// Display name
    pub name: String,

    /// Optional description
    pub description: Option<String>,
}

/// Partial update of a project
///
/// `None` leaves a field untouched; `Some(None)` clears the description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectChanges {
    /// New name
    pub name: Option<String>,

    /// New description
    pub description: Option<Option<String>>,
}

impl ProjectChanges {
    /// Whether the update touches no field
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

const PROJECT_COLUMNS: &str =
    "id, name, description, owner_id, invite_token, created_at, updated_at";

impl ProjectRecord {
    /// Creates a project and inserts its owner as a member with role `owner`
    ///
    /// Both rows are written in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the owner doesn't exist (foreign key violation) or
    /// the database connection fails.
    pub async fn create(pool: &PgPool, data: NewProject) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let project = sqlx::query_as::<_, ProjectRecord>(&format!(
            "INSERT INTO projects (name, description, owner_id) VALUES ($1, $2, $3) RETURNING {}",
            PROJECT_COLUMNS
        ))
        .bind(data.name)
        .bind(data.description)
        .bind(data.owner_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO project_members (project_id, user_id, role) VALUES ($1, $2, $3)")
            .bind(project.id)
            .bind(data.owner_id)
            .bind(ProjectRole::Owner)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(project)
    }

    /// Finds a project by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProjectRecord>(&format!(
            "SELECT {} FROM projects WHERE id = $1",
            PROJECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds the project currently carrying an invite token
    pub async fn find_by_invite_token(
        pool: &PgPool,
        token: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProjectRecord>(&format!(
            "SELECT {} FROM projects WHERE invite_token = $1",
            PROJECT_COLUMNS
        ))
        .bind(token)
        .fetch_optional(pool)
        .await
    }

    /// Lists projects the user owns or is a member of, newest first
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProjectRecord>(&format!(
            r#"
            SELECT {}
            FROM projects
            WHERE owner_id = $1
               OR id IN (SELECT project_id FROM project_members WHERE user_id = $1)
            ORDER BY created_at DESC
            "#,
            PROJECT_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Loads the member rows of a batch of projects, oldest membership first
    pub async fn members_of(
        pool: &PgPool,
        project_ids: &[Uuid],
    ) -> Result<Vec<MemberRecord>, sqlx::Error> {
        if project_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, MemberRecord>(
            r#"
            SELECT project_id, user_id, role, joined_at
            FROM project_members
            WHERE project_id = ANY($1)
            ORDER BY joined_at ASC, user_id ASC
            "#,
        )
        .bind(project_ids)
        .fetch_all(pool)
        .await
    }

    /// Applies a partial update
    ///
    /// # Returns
    ///
    /// The updated project, or None if it doesn't exist
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: ProjectChanges,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE projects SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {}", PROJECT_COLUMNS));

        let mut q = sqlx::query_as::<_, ProjectRecord>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a project; members, columns, tasks and comments cascade
    ///
    /// # Returns
    ///
    /// True if the project was deleted, false if it didn't exist
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Replaces the project's invite token, invalidating any previous one
    ///
    /// # Errors
    ///
    /// Returns a unique constraint violation if another project already
    /// carries the same token.
    pub async fn set_invite_token(
        pool: &PgPool,
        id: Uuid,
        token: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE projects SET invite_token = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(token)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Consumes an invite token and adds the user as a member
    ///
    /// The token is cleared with a guard on its current value, so of two
    /// concurrent redeemers only one succeeds. Both writes happen in a single
    /// transaction.
    ///
    /// # Returns
    ///
    /// True if the user joined, false if the token no longer matched
    ///
    /// # Errors
    ///
    /// Returns a unique constraint violation if the user is already a member.
    pub async fn redeem_invite(
        pool: &PgPool,
        project_id: Uuid,
        token: &str,
        user_id: Uuid,
        role: ProjectRole,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let cleared = sqlx::query(
            r#"
            UPDATE projects
            SET invite_token = NULL, updated_at = NOW()
            WHERE id = $1 AND invite_token = $2
            "#,
        )
        .bind(project_id)
        .bind(token)
        .execute(&mut *tx)
        .await?;

        if cleared.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("INSERT INTO project_members (project_id, user_id, role) VALUES ($1, $2, $3)")
            .bind(project_id)
            .bind(user_id)
            .bind(role)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(true)
    }

    /// Adds a member
    ///
    /// # Errors
    ///
    /// Returns a unique constraint violation if the user is already a member.
    pub async fn add_member(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
        role: ProjectRole,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO project_members (project_id, user_id, role) VALUES ($1, $2, $3)")
            .bind(project_id)
            .bind(user_id)
            .bind(role)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Removes a member
    ///
    /// # Returns
    ///
    /// True if a membership row was removed
    pub async fn remove_member(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM project_members WHERE project_id = $1 AND user_id = $2")
                .bind(project_id)
                .bind(user_id)
                .execute(pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}
