/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskdeck_api::{app::AppState, config::Config};
/// use taskdeck_shared::db::pool::{create_pool, DatabaseConfig};
/// use taskdeck_shared::store::PgStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(DatabaseConfig {
///     url: config.database.url.clone(),
///     ..Default::default()
/// })
/// .await?;
/// let state = AppState::new(Arc::new(PgStore::new(pool)), config);
/// let app = taskdeck_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```
use crate::{
    config::Config,
    error::ApiError,
    oauth::{GoogleClient, OAuthProvider},
};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, patch, post},
    Router,
};
use chrono::Duration;
use mockable::DefaultClock;
use std::sync::Arc;
use taskdeck_shared::{
    auth::{
        identity::IdentityResolver,
        jwt::SessionTokens,
        middleware::{extract_bearer, AuthContext},
    },
    services::{LifecycleManager, ProfileService, SharedClock, TaskFilterEngine},
    store::Store,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Every field is an `Arc` or a service holding `Arc`s.
#[derive(Clone)]
pub struct AppState {
    /// Storage port (PostgreSQL in production, in-memory in tests)
    pub store: Arc<dyn Store>,

    /// Application configuration
    pub config: Arc<Config>,

    pub tokens: SessionTokens,
    pub identity: IdentityResolver,
    pub tasks: TaskFilterEngine,
    pub lifecycle: LifecycleManager,
    pub profile: ProfileService,

    /// `None` when Google sign-in is not configured
    pub oauth: Option<Arc<dyn OAuthProvider>>,
}

impl AppState {
    /// Creates new application state on the system clock
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self::with_clock(store, config, Arc::new(DefaultClock))
    }

    /// Creates application state with an explicit clock
    pub fn with_clock(store: Arc<dyn Store>, config: Config, clock: SharedClock) -> Self {
        let tokens = SessionTokens::new(
            config.jwt.secret.clone(),
            Duration::days(config.jwt.expires_in_days),
        );
        let oauth = config
            .google
            .clone()
            .map(|google| Arc::new(GoogleClient::new(google)) as Arc<dyn OAuthProvider>);

        Self {
            identity: IdentityResolver::new(store.clone()),
            tasks: TaskFilterEngine::new(store.clone(), clock.clone()),
            lifecycle: LifecycleManager::new(store.clone(), clock.clone()),
            profile: ProfileService::new(store.clone(), clock),
            tokens,
            oauth,
            store,
            config: Arc::new(config),
        }
    }

    /// Replaces the identity provider
    pub fn with_oauth_provider(mut self, provider: Arc<dyn OAuthProvider>) -> Self {
        self.oauth = Some(provider);
        self
    }

    /// Provider or 503 when Google sign-in is disabled
    pub fn oauth_provider(&self) -> Result<&Arc<dyn OAuthProvider>, ApiError> {
        self.oauth.as_ref().ok_or_else(|| {
            ApiError::ServiceUnavailable("Google sign-in is not configured".to_string())
        })
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                        # Health check (public)
/// └── /v1/
///     ├── /auth/
///     │   ├── POST /register          # public
///     │   ├── POST /login             # public
///     │   ├── GET  /google            # public, redirect to consent page
///     │   ├── GET  /google/callback   # public
///     │   └── GET  /me                # authenticated
///     ├── /users/me                   # GET, PUT, DELETE (authenticated)
///     ├── /projects/                  # authenticated
///     │   ├── GET, POST /
///     │   └── GET, PUT, DELETE /:id
///     └── /tasks/                     # authenticated
///         ├── GET, POST /
///         ├── GET, PUT, DELETE /:id
///         ├── PATCH  /:id/toggle
///         ├── POST   /:id/restore
///         └── DELETE /:id/permanent
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Authentication (per-route basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let auth_layer = axum::middleware::from_fn_with_state(state.clone(), jwt_auth_layer);

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let public_auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/google", get(routes::auth::google_redirect))
        .route("/google/callback", get(routes::auth::google_callback));

    let session_routes = Router::new()
        .route("/me", get(routes::auth::me))
        .layer(auth_layer.clone());

    let user_routes = Router::new()
        .route(
            "/me",
            get(routes::users::get_me)
                .put(routes::users::update_me)
                .delete(routes::users::delete_me),
        )
        .layer(auth_layer.clone());

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
        .layer(auth_layer.clone());

    let task_routes = Router::new()
        .route(
            "/",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/:id/toggle", patch(routes::tasks::toggle_task))
        .route("/:id/restore", post(routes::tasks::restore_task))
        .route(
            "/:id/permanent",
            axum::routing::delete(routes::tasks::purge_task),
        )
        .layer(auth_layer);

    let v1_routes = Router::new()
        .nest("/auth", public_auth_routes.merge(session_routes))
        .nest("/users", user_routes)
        .nest("/projects", project_routes)
        .nest("/tasks", task_routes);

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .with_state(state)
}

/// Permissive CORS for `*`, otherwise only the listed origins
fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
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
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// JWT authentication middleware layer
///
/// Validates the bearer token, re-fetches the user it names and injects an
/// [`AuthContext`] into the request extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers())?;
    let user = state.tokens.authenticate(state.store.as_ref(), token).await?;

    req.extensions_mut().insert(AuthContext::new(user));

    Ok(next.run(req).await)
}
