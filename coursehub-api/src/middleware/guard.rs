/// Role guards for the moderation and admin areas
///
/// Each request mounts a fresh [`RouteGuard`], so role rows are read again
/// on every call and a role granted or revoked a moment ago takes effect on
/// the next request. Denials answer 403 with `redirect_to` and the notice.

use crate::{app::AppState, error::ApiError};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use coursehub_shared::auth::{
    guard::{GuardDecision, RouteGuard},
    middleware::AuthContext,
};
use tracing::info;

/// Moderators and admins only
pub async fn moderator_guard_layer(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    guard_request(RouteGuard::moderator(), &state, req, next).await
}

/// Admins only
pub async fn admin_guard_layer(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    guard_request(RouteGuard::admin(), &state, req, next).await
}

async fn guard_request(
    mut guard: RouteGuard,
    state: &AppState,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let caller = req.extensions().get::<AuthContext>().map(|auth| auth.user_id);

    match guard.check(&state.db, caller).await {
        GuardDecision::Render => Ok(next.run(req).await),
        GuardDecision::Redirect { to, notice } => {
            if let Some(notice) = notice {
                info!(
                    path = %req.uri().path(),
                    user_id = ?caller,
                    requirement = ?guard.requirement(),
                    notice,
                    "Route guard denied access"
                );
            }
            Err(ApiError::AccessDenied {
                redirect_to: to,
                notice,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::{body::Body, http::StatusCode, routing::get, Router};
    use tower::ServiceExt;

    fn lazy_state() -> AppState {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgresql://localhost/unused")
            .unwrap();
        AppState::new(pool, Config::for_tests("postgresql://localhost/unused")).unwrap()
    }

    #[tokio::test]
    async fn test_anonymous_caller_is_redirected_home() {
        let state = lazy_state();
        let app = Router::new()
            .route("/queue", get(|| async { "queue" }))
            .layer(axum::middleware::from_fn_with_state(state.clone(), moderator_guard_layer))
            .with_state(state);

        let response = app
            .oneshot(Request::builder().uri("/queue").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["redirect_to"], "/");
        assert_eq!(body["message"], "Access denied");
    }
}
