/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use coursehub_api::{app::{build_router, AppState}, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config)?;
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    error::ApiError,
    middleware::{
        guard::{admin_guard_layer, moderator_guard_layer},
        security::SecurityHeadersLayer,
    },
};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::{from_fn_with_state, Next},
    response::Response,
    routing::{delete, get, patch, post, put},
    Router,
};
use coursehub_shared::{
    auth::middleware::{authenticate, bearer_token, AuthContext, AuthError},
    identity::{IdentityError, IdentityProvider, LocalIdentityProvider, RemoteIdentityProvider},
    models::profile::Profile,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};

/// Shared application state, cloned into every handler
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,

    /// Where banned users' identities are deleted
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    /// Builds state, choosing the identity provider from configuration
    ///
    /// # Errors
    ///
    /// `NotConfigured` when a remote URL is set without a service token.
    pub fn new(db: PgPool, config: Config) -> Result<Self, IdentityError> {
        let identity: Arc<dyn IdentityProvider> = match &config.identity.delete_url {
            Some(url) => {
                let token = config
                    .identity
                    .service_token
                    .clone()
                    .ok_or(IdentityError::NotConfigured)?;
                Arc::new(RemoteIdentityProvider::new(url.clone(), token)?)
            }
            None => Arc::new(LocalIdentityProvider::new(db.clone())),
        };
        info!(provider = identity.name(), "Identity provider selected");

        Ok(Self::with_identity(db, config, identity))
    }

    pub fn with_identity(db: PgPool, config: Config, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            identity,
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the router with every route and the middleware stack
///
/// # Layout
///
/// ```text
/// /health
/// /v1/auth/...         register, login, refresh, me
/// /v1/profiles/...     public profiles, own profile
/// /v1/courses/...      browse, CRUD, comments, rating, like, save, views, report
/// /v1/forum/...        topics, replies, reports
/// /v1/trails/...       learning trails
/// /v1/users/:id/...    follows
/// /v1/me/...           own courses, saved courses, own trails
/// /v1/moderation/...   moderator guard
/// /v1/admin/...        admin guard
/// ```
///
/// Every `/v1` request passes through [`auth_layer`]: a valid bearer token
/// puts an [`AuthContext`] into the request; handlers that need a caller
/// take `AuthContext` and answer 401 without one.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh))
        .route("/me", get(routes::auth::me));

    let profile_routes = Router::new()
        .route("/me", patch(routes::profiles::update_own_profile))
        .route("/:username", get(routes::profiles::get_profile));

    let course_routes = Router::new()
        .route("/", get(routes::courses::search_courses).post(routes::courses::create_course))
        .route(
            "/:id",
            get(routes::courses::get_course)
                .patch(routes::courses::update_course)
                .delete(routes::courses::delete_course),
        )
        .route(
            "/:id/comments",
            get(routes::interactions::list_comments).post(routes::interactions::add_comment),
        )
        .route("/:id/rating", put(routes::interactions::rate_course))
        .route("/:id/like", post(routes::interactions::toggle_like))
        .route("/:id/save", post(routes::interactions::toggle_save))
        .route("/:id/views", post(routes::interactions::record_view))
        .route("/:id/report", post(routes::interactions::report_course));

    let forum_routes = Router::new()
        .route("/topics", get(routes::forum::list_topics).post(routes::forum::create_topic))
        .route(
            "/topics/:id",
            get(routes::forum::get_topic).delete(routes::forum::delete_topic),
        )
        .route("/topics/:id/replies", post(routes::forum::create_reply))
        .route("/topics/:id/report", post(routes::forum::report_topic))
        .route("/replies/:id", delete(routes::forum::delete_reply))
        .route("/replies/:id/report", post(routes::forum::report_reply));

    let trail_routes = Router::new()
        .route("/", get(routes::trails::list_public_trails).post(routes::trails::create_trail))
        .route(
            "/:id",
            get(routes::trails::get_trail)
                .patch(routes::trails::update_trail)
                .delete(routes::trails::delete_trail),
        )
        .route("/:id/courses", post(routes::trails::add_course))
        .route("/:id/courses/:course_id", delete(routes::trails::remove_course))
        .route("/:id/order", put(routes::trails::reorder_trail));

    let user_routes = Router::new()
        .route(
            "/:id/follow",
            post(routes::follows::follow_user).delete(routes::follows::unfollow_user),
        )
        .route("/:id/followers", get(routes::follows::list_followers))
        .route("/:id/following", get(routes::follows::list_following));

    let me_routes = Router::new()
        .route("/courses", get(routes::courses::list_own_courses))
        .route("/saved", get(routes::courses::list_saved_courses))
        .route("/trails", get(routes::trails::list_own_trails));

    let moderation_routes = Router::new()
        .route("/queue", get(routes::moderation::queue))
        .route("/courses/:id/approve", post(routes::moderation::approve_course))
        .route("/courses/:id/reject", post(routes::moderation::reject_course))
        .route("/edits", get(routes::moderation::list_edits))
        .route("/edits/:id/approve", post(routes::moderation::approve_edit))
        .route("/edits/:id/reject", post(routes::moderation::reject_edit))
        .route("/reports", get(routes::moderation::list_reports))
        .route("/reports/:id", delete(routes::moderation::dismiss_report))
        .route("/forum-reports", get(routes::moderation::list_forum_reports))
        .route(
            "/forum-reports/topics/:id",
            delete(routes::moderation::dismiss_topic_report),
        )
        .route(
            "/forum-reports/replies/:id",
            delete(routes::moderation::dismiss_reply_report),
        )
        .route("/logs", get(routes::moderation::list_logs))
        .layer(from_fn_with_state(state.clone(), moderator_guard_layer));

    let admin_routes = Router::new()
        .route("/users", get(routes::admin::list_users))
        .route("/users/:id/role", put(routes::admin::set_role))
        .route("/users/:id/ban", post(routes::admin::ban_user))
        .route("/courses/:id", delete(routes::admin::delete_course))
        .route("/categories", post(routes::admin::create_category))
        .route("/categories/:id", delete(routes::admin::delete_category))
        .route("/stats", get(routes::admin::stats))
        .layer(from_fn_with_state(state.clone(), admin_guard_layer));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/profiles", profile_routes)
        .route("/categories", get(routes::categories::list_categories))
        .nest("/courses", course_routes)
        .route("/comments/:id", delete(routes::interactions::delete_comment))
        .route("/feed", get(routes::courses::feed))
        .nest("/forum", forum_routes)
        .nest("/trails", trail_routes)
        .nest("/users", user_routes)
        .nest("/me", me_routes)
        .nest("/moderation", moderation_routes)
        .nest("/admin", admin_routes)
        .layer(from_fn_with_state(state.clone(), auth_layer));

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
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
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .route("/health", get(routes::health::health_check))
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

/// Resolves the caller from the bearer token, if any
///
/// Requests without an `Authorization` header pass through anonymously.
/// A malformed or invalid token is rejected, and so is a token whose
/// profile has been banned.
async fn auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if bearer_token(req.headers())?.is_none() {
        return Ok(next.run(req).await);
    }

    let auth = authenticate(req.headers(), state.jwt_secret())?;

    if Profile::is_banned(&state.db, auth.user_id).await? {
        return Err(AuthError::Banned.into());
    }

    req.extensions_mut().insert::<AuthContext>(auth);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use uuid::Uuid;

    struct NoopIdentity;

    #[async_trait]
    impl IdentityProvider for NoopIdentity {
        fn name(&self) -> &str {
            "noop"
        }

        async fn delete_identity(&self, _user_id: Uuid) -> Result<bool, IdentityError> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn test_state_keeps_injected_identity() {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgresql://localhost/unused")
            .unwrap();
        let state = AppState::with_identity(
            pool,
            Config::for_tests("postgresql://localhost/unused"),
            Arc::new(NoopIdentity),
        );

        assert_eq!(state.identity.name(), "noop");
        assert!(state.jwt_secret().len() >= 32);
    }

    #[tokio::test]
    async fn test_local_identity_by_default() {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgresql://localhost/unused")
            .unwrap();
        let state = AppState::new(pool, Config::for_tests("postgresql://localhost/unused")).unwrap();

        assert_eq!(state.identity.name(), "local");
    }
}
