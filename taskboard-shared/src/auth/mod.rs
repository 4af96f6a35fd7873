/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and strength rules
/// - [`jwt`]: Bearer token issuance and validation
/// - [`invite`]: Project invite token generation
/// - [`middleware`]: Axum middleware and the `AuthContext` extractor
/// - [`authorization`]: Project capability policy
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::password::{hash_password, verify_password};
/// use taskboard_shared::auth::jwt::{create_token, validate_token, Claims};
/// use chrono::Duration;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("launch2024")?;
/// assert!(verify_password("launch2024", &hash)?);
///
/// let secret = "your-secret-key-at-least-32-bytes";
/// let token = create_token(&Claims::new(Uuid::new_v4(), Duration::days(30)), secret)?;
/// assert!(validate_token(&token, secret).is_ok());
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod invite;
pub mod jwt;
pub mod middleware;
pub mod password;
