/// Board column model and database operations
///
/// Columns are ordered buckets on a project's board. A task's `status` holds
/// the `column_key` of the column it sits in.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE board_columns (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     column_key VARCHAR(64) NOT NULL,
///     title VARCHAR(100) NOT NULL,
///     position INTEGER NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (project_id, column_key)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Columns materialized on first use of an empty board: (key, title, order)
pub const DEFAULT_COLUMNS: [(&str, &str, i32); 3] = [
    ("todo", "To Do", 1),
    ("in-progress", "In Progress", 2),
    ("done", "Done", 3),
];

/// A column on a project's board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Column {
    /// Column ID
    pub id: Uuid,

    /// Owning project
    pub project_id: Uuid,

    /// Short slug referenced by task statuses, unique per project
    pub column_key: String,

    /// Display title
    pub title: String,

    /// Left-to-right display order
    #[serde(rename = "order")]
    pub position: i32,

    /// When the column was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewColumn {
    /// Owning project
    pub project_id: Uuid,

    /// Short slug
    pub column_key: String,

    /// Display title
    pub title: String,

    /// Display order
    pub position: i32,
}

impl NewColumn {
    /// The default column set for a project
    pub fn defaults_for(project_id: Uuid) -> Vec<NewColumn> {
        DEFAULT_COLUMNS
            .iter()
            .map(|(key, title, position)| NewColumn {
                project_id,
                column_key: key.to_string(),
                title: title.to_string(),
                position: *position,
            })
            .collect()
    }
}

impl Column {
    /// Inserts a column unless the project already has one with the same key
    ///
    /// # Returns
    ///
    /// True if a row was inserted
    pub async fn insert_if_absent(pool: &PgPool, data: &NewColumn) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO board_columns (project_id, column_key, title, position)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (project_id, column_key) DO NOTHING
            "#,
        )
        .bind(data.project_id)
        .bind(&data.column_key)
        .bind(&data.title)
        .bind(data.position)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts the columns of a project
    pub async fn count_by_project(pool: &PgPool, project_id: Uuid) -> Result<i64, sqlx::Error> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM board_columns WHERE project_id = $1")
            .bind(project_id)
            .fetch_one(pool)
            .await?;

        Ok(count.0)
    }

    /// Lists a project's columns in display order
    pub async fn list_by_project(pool: &PgPool, project_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Column>(
            r#"
            SELECT id, project_id, column_key, title, position, created_at
            FROM board_columns
            WHERE project_id = $1
            ORDER BY position ASC, created_at ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_columns() {
        let project_id = Uuid::new_v4();
        let columns = NewColumn::defaults_for(project_id);

        let keys: Vec<&str> = columns.iter().map(|c| c.column_key.as_str()).collect();
        assert_eq!(keys, vec!["todo", "in-progress", "done"]);

        let orders: Vec<i32> = columns.iter().map(|c| c.position).collect();
        assert_eq!(orders, vec![1, 2, 3]);
        assert!(columns.iter().all(|c| c.project_id == project_id));
    }

    #[test]
    fn test_position_serializes_as_order() {
        let column = Column {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            column_key: "todo".to_string(),
            title: "To Do".to_string(),
            position: 1,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&column).unwrap();
        assert_eq!(json["order"], 1);
        assert!(json.get("position").is_none());
    }
}
