/// Bearer authentication for Axum
///
/// [`authenticate_headers`] reads `Authorization: Bearer <token>`, validates
/// the JWT and reloads the user it names. A middleware inserts the resulting
/// [`AuthContext`] into the request extensions; handlers take `AuthContext`
/// as an extractor.
///
/// # Example
///
/// ```no_run
/// use axum::{extract::Request, middleware::{self, Next}, routing::get, Router};
/// use taskboard_shared::auth::middleware::{authenticate_headers, AuthContext, AuthError};
/// use taskboard_shared::store::Stores;
///
/// async fn me(auth: AuthContext) -> String {
///     format!("Hello, {}!", auth.name)
/// }
///
/// let stores = Stores::in_memory();
///
/// let app: Router = Router::new()
///     .route("/me", get(me))
///     .layer(middleware::from_fn(move |mut req: Request, next: Next| {
///         let stores = stores.clone();
///         async move {
///             let secret = "a-secret-of-at-least-thirty-two-chars";
///             let auth = authenticate_headers(&stores, secret, req.headers()).await?;
///             req.extensions_mut().insert(auth);
///             Ok::<_, AuthError>(next.run(req).await)
///         }
///     }));
/// ```

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use uuid::Uuid;

use super::jwt::bearer_token;
use crate::models::user::{User, UserRole};
use crate::services::{accounts, ServiceError};
use crate::store::Stores;

/// The authenticated caller, added to request extensions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,

    /// System-wide role, distinct from any project role
    pub role: UserRole,
}

impl AuthContext {
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Error type for authentication middleware
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No authorization header
    MissingCredentials,

    /// Header present but not a bearer token
    InvalidFormat,

    /// Token rejected
    InvalidToken(String),

    /// Lookup of the token's user failed
    Internal(String),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn message(&self) -> String {
        match self {
            AuthError::MissingCredentials => "Not authorized, no token".to_string(),
            AuthError::InvalidFormat => "Expected a Bearer token".to_string(),
            AuthError::InvalidToken(msg) => msg.clone(),
            AuthError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::Internal(msg) => write!(f, "Authentication failed: {}", msg),
            other => write!(f, "{}", other.message()),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<ServiceError> for AuthError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Internal(msg) => AuthError::Internal(msg),
            ServiceError::Unauthorized(msg) => AuthError::InvalidToken(msg),
            other => AuthError::InvalidToken(other.to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::Internal(msg) = &self {
            error!(error = %msg, "Authentication lookup failed");
        }

        let body = Json(serde_json::json!({
            "error": "unauthorized",
            "message": self.message(),
        }));

        (self.status(), body).into_response()
    }
}

/// Resolves the bearer token in `headers` to the caller's identity
pub async fn authenticate_headers(
    stores: &Stores,
    secret: &str,
    headers: &HeaderMap,
) -> Result<AuthContext, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = bearer_token(value).ok_or(AuthError::InvalidFormat)?;

    let auth = accounts::authenticate(stores, secret, token).await?;
    debug!(user_id = %auth.user_id, "Request authenticated");

    Ok(auth)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AuthError::MissingCredentials)
    }
}
