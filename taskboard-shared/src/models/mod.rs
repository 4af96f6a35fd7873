/// Database models for Taskboard
///
/// This module contains the domain records and their PostgreSQL queries.
///
/// # Models
///
/// - `user`: User accounts and display summaries
/// - `project`: Projects and their member lists
/// - `column`: Ordered board columns
/// - `task`: Tasks and their comments
/// - `reference`: Bare-or-resolved references between records
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::user::{User, CreateUser, UserRole};
/// use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let new_user = CreateUser {
///     name: "John Doe".to_string(),
///     email: "user@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     role: UserRole::Member,
/// };
///
/// let user = User::create(&pool, new_user).await?;
/// # Ok(())
/// # }
/// ```

pub mod column;
pub mod project;
pub mod reference;
pub mod task;
pub mod user;
