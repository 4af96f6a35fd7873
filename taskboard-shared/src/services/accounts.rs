/// Registration, login and bearer token resolution
///
/// Passwords are hashed with Argon2id on a blocking thread; bearer tokens are
/// HS256 JWTs whose subject is the user ID. Resolving a token always reloads
/// the user, so a deleted account stops authenticating immediately.

use chrono::Duration;
use tracing::{debug, info};
use uuid::Uuid;
use validator::ValidateEmail;

use super::{required_text, ServiceError, ServiceResult};
use crate::auth::jwt::{self, Claims, DEFAULT_TTL_DAYS};
use crate::auth::middleware::AuthContext;
use crate::auth::password;
use crate::models::user::{normalize_email, CreateUser, User, UserRole};
use crate::store::Stores;

/// Signing secret and lifetime for issued tokens
#[derive(Debug, Clone)]
pub struct TokenSettings {
    /// HS256 secret
    pub secret: String,

    /// Lifetime of an issued token
    pub ttl: Duration,
}

impl TokenSettings {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ttl: Duration::days(DEFAULT_TTL_DAYS),
        }
    }
}

/// Registration input
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// An authenticated user together with a fresh bearer token
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: String,
}

/// Email syntax check shared with the HTTP layer's `#[validate(email)]`
pub fn is_valid_email(email: &str) -> bool {
    email.trim().validate_email()
}

/// Signs a bearer token for a user
pub fn issue_token(settings: &TokenSettings, user_id: Uuid) -> ServiceResult<String> {
    Ok(jwt::create_token(&Claims::new(user_id, settings.ttl), &settings.secret)?)
}

async fn hash_off_thread(password: String) -> ServiceResult<String> {
    tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .map_err(|e| ServiceError::Internal(format!("Hashing task failed: {}", e)))?
        .map_err(ServiceError::from)
}

async fn verify_off_thread(password: String, hash: String) -> ServiceResult<bool> {
    tokio::task::spawn_blocking(move || password::verify_password(&password, &hash))
        .await
        .map_err(|e| ServiceError::Internal(format!("Verification task failed: {}", e)))?
        .map_err(ServiceError::from)
}

/// Creates an account with the `member` system role and signs it in
///
/// # Errors
///
/// - `Validation` for an empty name, a malformed email or a weak password
/// - `Conflict` if the email is already registered
pub async fn register(
    stores: &Stores,
    settings: &TokenSettings,
    input: Registration,
) -> ServiceResult<Session> {
    let name = required_text(&input.name, "Name")?;

    let email = normalize_email(&input.email);
    if !is_valid_email(&email) {
        return Err(ServiceError::Validation("Invalid email format".to_string()));
    }

    password::validate_password_strength(&input.password).map_err(ServiceError::Validation)?;

    if stores.users.find_user_by_email(&email).await?.is_some() {
        return Err(ServiceError::Conflict("Email is already registered".to_string()));
    }

    let password_hash = hash_off_thread(input.password).await?;

    let user = stores
        .users
        .create_user(CreateUser {
            name,
            email,
            password_hash,
            role: UserRole::Member,
        })
        .await?;

    info!(user_id = %user.id, "User registered");

    let token = issue_token(settings, user.id)?;
    Ok(Session { user, token })
}

/// Checks credentials and signs the user in
///
/// # Errors
///
/// `Unauthorized` for an unknown email or a wrong password; the message
/// doesn't reveal which.
pub async fn login(
    stores: &Stores,
    settings: &TokenSettings,
    email: &str,
    password: &str,
) -> ServiceResult<Session> {
    let invalid = || ServiceError::Unauthorized("Invalid email or password".to_string());

    let user = stores
        .users
        .find_user_by_email(email)
        .await?
        .ok_or_else(invalid)?;

    if !verify_off_thread(password.to_string(), user.password_hash.clone()).await? {
        debug!(user_id = %user.id, "Login rejected: wrong password");
        return Err(invalid());
    }

    info!(user_id = %user.id, "User logged in");

    let token = issue_token(settings, user.id)?;
    Ok(Session { user, token })
}

/// Resolves a bearer token to the caller's identity
///
/// # Errors
///
/// `Unauthorized` if the token is invalid or expired, or its user no longer
/// exists.
pub async fn authenticate(stores: &Stores, secret: &str, token: &str) -> ServiceResult<AuthContext> {
    let claims = jwt::validate_token(token, secret)?;

    let user = stores
        .users
        .find_user(claims.sub)
        .await?
        .ok_or_else(|| ServiceError::Unauthorized("User no longer exists".to_string()))?;

    Ok(AuthContext::from_user(&user))
}
