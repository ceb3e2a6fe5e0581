/// Follow graph endpoints
///
/// - `POST /v1/users/:id/follow`, `DELETE /v1/users/:id/follow`
/// - `GET /v1/users/:id/followers`, `GET /v1/users/:id/following`

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Json,
};
use coursehub_shared::{
    auth::middleware::AuthContext,
    models::{
        follow,
        profile::{Profile, ProfileSummary},
    },
};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct FollowState {
    pub following: bool,
    pub followers: i64,
}

async fn active_profile(state: &AppState, user_id: Uuid) -> ApiResult<Profile> {
    Profile::find_by_id(&state.db, user_id)
        .await?
        .filter(|p| !p.banned)
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

async fn follow_state(state: &AppState, follower: Uuid, target: Uuid) -> ApiResult<FollowState> {
    Ok(FollowState {
        following: follow::is_following(&state.db, follower, target).await?,
        followers: Profile::stats(&state.db, target).await?.followers,
    })
}

/// Idempotent: following twice keeps one edge
pub async fn follow_user(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<FollowState>> {
    if auth.is(user_id) {
        return Err(ApiError::BadRequest("You cannot follow yourself".to_string()));
    }
    let target = active_profile(&state, user_id).await?;

    follow::follow(&state.db, auth.user_id, target.user_id).await?;
    Ok(Json(follow_state(&state, auth.user_id, target.user_id).await?))
}

pub async fn unfollow_user(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<FollowState>> {
    follow::unfollow(&state.db, auth.user_id, user_id).await?;
    Ok(Json(follow_state(&state, auth.user_id, user_id).await?))
}

pub async fn list_followers(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<Vec<ProfileSummary>>> {
    let profile = active_profile(&state, user_id).await?;
    Ok(Json(follow::followers(&state.db, profile.user_id).await?))
}

pub async fn list_following(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<Vec<ProfileSummary>>> {
    let profile = active_profile(&state, user_id).await?;
    Ok(Json(follow::following(&state.db, profile.user_id).await?))
}
