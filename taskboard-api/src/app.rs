/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use taskboard_api::{app::{build_router, AppState}, config::Config};
/// use taskboard_shared::store::Stores;
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(Stores::postgres(pool), config);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post, put},
    Router,
};
use chrono::Duration;
use std::sync::Arc;
use taskboard_shared::auth::middleware::authenticate_headers;
use taskboard_shared::services::accounts::TokenSettings;
use taskboard_shared::store::Stores;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Store registry
    pub stores: Stores,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(stores: Stores, config: Config) -> Self {
        Self {
            stores,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    /// Signing settings for issued bearer tokens
    pub fn token_settings(&self) -> TokenSettings {
        TokenSettings {
            secret: self.config.jwt.secret.clone(),
            ttl: Duration::days(self.config.jwt.ttl_days),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET /health                                   # public
/// └── /api/
///     ├── /auth/
///     │   ├── POST /register                        # public
///     │   ├── POST /login                           # public
///     │   └── GET  /me
///     ├── /projects/
///     │   ├── GET|POST /
///     │   ├── GET|PUT|DELETE /:id
///     │   ├── PUT  /:id/generate-invite
///     │   ├── POST /join/:token
///     │   └── PUT  /:id/kick/:member_id
///     ├── /boards/:project_id/
///     │   ├── GET  /
///     │   ├── POST /tasks
///     │   ├── PUT|DELETE /tasks/:task_id
///     │   ├── PUT  /tasks/:task_id/move
///     │   ├── POST /tasks/:task_id/comments
///     │   └── DELETE /tasks/:task_id/comments/:comment_id
///     └── /members/
///         ├── GET  /?search=
///         └── POST /add
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Authentication (per-route basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes (register and login are public)
    let auth_routes = Router::new()
        .route(
            "/me",
            get(routes::auth::me).layer(axum::middleware::from_fn_with_state(
                state.clone(),
                jwt_auth_layer,
            )),
        )
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login));

    let project_routes = Router::new()
        .route(
            "/",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/:id",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route("/:id/generate-invite", put(routes::projects::generate_invite))
        .route("/join/:token", post(routes::projects::join_project))
        .route("/:id/kick/:member_id", put(routes::projects::kick_member));

    let board_routes = Router::new()
        .route("/:project_id", get(routes::boards::get_board))
        .route("/:project_id/tasks", post(routes::boards::create_task))
        .route(
            "/:project_id/tasks/:task_id",
            put(routes::boards::update_task).delete(routes::boards::delete_task),
        )
        .route("/:project_id/tasks/:task_id/move", put(routes::boards::move_task))
        .route(
            "/:project_id/tasks/:task_id/comments",
            post(routes::boards::add_comment),
        )
        .route(
            "/:project_id/tasks/:task_id/comments/:comment_id",
            axum::routing::delete(routes::boards::delete_comment),
        );

    let member_routes = Router::new()
        .route("/", get(routes::members::search_users))
        .route("/add", post(routes::members::add_member));

    // Everything below requires a bearer token
    let protected_routes = Router::new()
        .nest("/projects", project_routes)
        .nest("/boards", board_routes)
        .nest("/members", member_routes)
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(protected_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Resolves the bearer token to an `AuthContext` and injects it into request
/// extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let auth = authenticate_headers(&state.stores, state.jwt_secret(), req.headers()).await?;
    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}
