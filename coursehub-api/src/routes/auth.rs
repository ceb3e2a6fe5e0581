/// Authentication endpoints
///
/// - `POST /v1/auth/register`: create identity, profile and `user` role
/// - `POST /v1/auth/login`: exchange email and password for tokens
/// - `POST /v1/auth/refresh`: new access token from a refresh token
/// - `GET /v1/auth/me`: identity, profile and role rows of the caller

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, Json};
use coursehub_shared::{
    auth::{
        jwt::{self, TokenPair},
        middleware::AuthContext,
        password,
    },
    models::{
        profile::{validate_username, CreateProfile, Profile},
        role::{AppRole, UserRole},
        user::{CreateUser, User},
    },
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,

    #[validate(length(min = 3, max = 30, message = "Username must be 3-30 characters"))]
    pub username: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Tokens plus who they belong to
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user_id: Uuid,
    pub username: String,

    #[serde(flatten)]
    pub tokens: TokenPair,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub profile: Profile,
    pub roles: Vec<AppRole>,
    pub role: AppRole,
}

/// Register a new account
///
/// # Errors
///
/// - `422`: invalid email, weak password or malformed username
/// - `409`: email or username taken
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    req.validate()?;
    password::validate_password_strength(&req.password).map_err(|e| ApiError::invalid("password", e))?;
    validate_username(&req.username).map_err(|e| ApiError::invalid("username", e))?;

    if Profile::find_by_username(&state.db, &req.username).await?.is_some() {
        return Err(ApiError::Conflict("Username already taken".to_string()));
    }

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email.trim().to_lowercase(),
            password_hash,
        },
    )
    .await?;

    let profile = match Profile::create(
        &state.db,
        CreateProfile {
            user_id: user.id,
            username: req.username.clone(),
        },
    )
    .await
    {
        Ok(profile) => profile,
        Err(e) => {
            // Username raced with another registration; drop the orphan identity
            if let Err(cleanup) = User::delete(&state.db, user.id).await {
                warn!(user_id = %user.id, error = %cleanup, "Failed to remove identity after profile error");
            }
            return Err(e.into());
        }
    };

    UserRole::grant(&state.db, user.id, AppRole::User).await?;

    let tokens = jwt::issue_token_pair(user.id, state.jwt_secret())?;

    info!(user_id = %user.id, username = %profile.username, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            user_id: user.id,
            username: profile.username,
            tokens,
        }),
    ))
}

/// Log in with email and password
///
/// Unknown email and wrong password give the same 401.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    req.validate()?;

    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = User::find_by_email(&state.db, &req.email.trim().to_lowercase())
        .await?
        .ok_or_else(invalid)?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        return Err(invalid());
    }

    let profile = Profile::find_by_id(&state.db, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;
    if profile.banned {
        return Err(ApiError::Forbidden("Account is banned".to_string()));
    }

    User::update_last_login(&state.db, user.id).await?;
    let tokens = jwt::issue_token_pair(user.id, state.jwt_secret())?;

    info!(user_id = %user.id, "User logged in");

    Ok(Json(SessionResponse {
        user_id: user.id,
        username: profile.username,
        tokens,
    }))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let (access_token, user_id) = jwt::refresh_access_token(&req.refresh_token, state.jwt_secret())?;

    if Profile::is_banned(&state.db, user_id).await? {
        return Err(ApiError::Forbidden("Account is banned".to_string()));
    }

    Ok(Json(RefreshResponse {
        access_token,
        token_type: "Bearer",
        expires_in: jwt::TokenType::Access.lifetime().num_seconds(),
    }))
}

pub async fn me(State(state): State<AppState>, auth: AuthContext) -> ApiResult<Json<MeResponse>> {
    let profile = Profile::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    let email = User::find_by_id(&state.db, auth.user_id).await?.map(|u| u.email);
    let roles = UserRole::roles_for_user(&state.db, auth.user_id).await?;

    Ok(Json(MeResponse {
        user_id: auth.user_id,
        email,
        profile,
        role: AppRole::highest(&roles),
        roles,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let ok = RegisterRequest {
            email: "ada@example.com".to_string(),
            password: "analytical1".to_string(),
            username: "ada".to_string(),
        };
        assert!(ok.validate().is_ok());

        let bad = RegisterRequest {
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            username: "a".to_string(),
        };
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("username"));
    }
}
