/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use teamboard_api::{app::{build_router, AppState}, config::Config};
/// use teamboard_shared::db::pool::{create_pool, DatabaseConfig};
/// use teamboard_shared::store::PgMembershipStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(DatabaseConfig::from_url(&config.database.url)).await?;
/// let state = AppState::new(Arc::new(PgMembershipStore::new(pool)), config);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, build_router(state)).await?;
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::{auth::jwt_auth_layer, security::SecurityHeadersLayer},
    routes,
};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use teamboard_shared::{membership::MembershipService, store::MembershipStore};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned per request by Axum's `State` extractor; every field is cheap to
/// clone.
#[derive(Clone)]
pub struct AppState {
    /// Persistence behind every service call; also read directly by the auth routes
    pub store: Arc<dyn MembershipStore>,

    /// Invitation, member, project and task operations
    pub members: MembershipService,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Builds state with the membership policy taken from `config`
    pub fn new(store: Arc<dyn MembershipStore>, config: Config) -> Self {
        let members = MembershipService::with_policy(store.clone(), config.membership.policy());

        Self {
            store,
            members,
            config: Arc::new(config),
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete router
///
/// ```text
/// /health                                      GET     (public)
/// /v1/auth/register                            POST    (public)
/// /v1/auth/login                               POST    (public)
/// /v1/auth/refresh                             POST    (public)
/// /v1/projects                                 POST
/// /v1/projects/:project_id                     GET PATCH DELETE
/// /v1/projects/:project_id/members             GET
/// /v1/projects/:project_id/invitations         POST
/// /v1/projects/:project_id/users/:user_id      DELETE
/// /v1/projects/:project_id/tasks               GET POST
/// /v1/tasks/:task_id                           GET PATCH DELETE
/// /v1/invitations/:invitation_id               DELETE
/// /v1/invitations/:invitation_id/accept        POST
/// ```
///
/// Everything under `/v1` except `/v1/auth` passes through [`jwt_auth_layer`].
pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    let project_routes = Router::new()
        .route("/", post(routes::projects::create_project))
        .route(
            "/:project_id",
            get(routes::projects::get_project)
                .patch(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route("/:project_id/members", get(routes::members::list_members))
        .route("/:project_id/invitations", post(routes::members::invite))
        .route(
            "/:project_id/users/:user_id",
            delete(routes::members::remove_member),
        )
        .route(
            "/:project_id/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        );

    let task_routes = Router::new().route(
        "/:task_id",
        get(routes::tasks::get_task)
            .patch(routes::tasks::update_task)
            .delete(routes::tasks::delete_task),
    );

    let invitation_routes = Router::new()
        .route("/:invitation_id", delete(routes::members::cancel_invitation))
        .route("/:invitation_id/accept", post(routes::members::accept_invitation));

    let protected_routes = Router::new()
        .nest("/projects", project_routes)
        .nest("/tasks", task_routes)
        .nest("/invitations", invitation_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(protected_routes);

    let cors = cors_layer(&state.config.api.cors_origins);

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}
