/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/auth/register` - Register a new user
/// - `POST /api/auth/login` - Login and get a bearer token
/// - `GET /api/auth/me` - The authenticated user

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    routes::ApiJson,
};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    auth::{middleware::AuthContext, password},
    models::user::{User, UserRole},
    services::accounts::{self, Registration, Session},
};
use uuid::Uuid;
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (also checked for strength)
    #[validate(length(
        min = 8,
        max = 128,
        message = "Password must be between 8 and 128 characters"
    ))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Response for register and login
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    /// User ID
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Email address
    pub email: String,

    /// System-wide role
    pub role: UserRole,

    /// Bearer token
    pub token: String,
}

impl From<Session> for AuthResponse {
    fn from(session: Session) -> Self {
        let User {
            id,
            name,
            email,
            role,
            ..
        } = session.user;

        Self {
            id,
            name,
            email,
            role,
            token: session.token,
        }
    }
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/register
/// Content-Type: application/json
///
/// {
///   "name": "Ada Lovelace",
///   "email": "ada@example.com",
///   "password": "engine1843"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Weak password or malformed input
/// - `409 Conflict`: Email already registered
/// - `422 Unprocessable Entity`: Field validation failed
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.validate().map_err(|e| ApiError::from_validation(&e))?;

    password::validate_password_strength(&req.password).map_err(|e| {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "password".to_string(),
            message: e,
        }])
    })?;

    let session = accounts::register(
        &state.stores,
        &state.token_settings(),
        Registration {
            name: req.name,
            email: req.email,
            password: req.password,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(session.into())))
}

/// Login with email and password
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/login
/// Content-Type: application/json
///
/// { "email": "ada@example.com", "password": "engine1843" }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid email or password
/// - `422 Unprocessable Entity`: Field validation failed
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate().map_err(|e| ApiError::from_validation(&e))?;

    let session = accounts::login(&state.stores, &state.token_settings(), &req.email, &req.password).await?;

    Ok(Json(session.into()))
}

/// The authenticated user
pub async fn me(auth: AuthContext) -> Json<AuthContext> {
    Json(auth)
}
