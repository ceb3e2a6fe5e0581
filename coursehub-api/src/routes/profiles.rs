/// Profile endpoints
///
/// - `GET /v1/profiles/:username`: profile, counters and whether the caller follows it
/// - `PATCH /v1/profiles/me`: change own username, bio or avatar

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
        course::web_url,
        follow,
        profile::{validate_username, Profile, ProfileStats, UpdateProfile},
    },
};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

#[derive(Debug, Serialize)]
pub struct ProfileView {
    #[serde(flatten)]
    pub profile: Profile,
    pub stats: ProfileStats,

    /// Absent for anonymous callers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_following: Option<bool>,
}

/// Profile changes; an empty `bio` or `avatar_url` clears the field
#[derive(Debug, Deserialize, Validate)]
pub struct ProfilePatch {
    pub username: Option<String>,

    #[validate(length(max = 500, message = "Bio must be at most 500 characters"))]
    pub bio: Option<String>,

    #[validate(length(max = 512, message = "Avatar URL must be at most 512 characters"))]
    pub avatar_url: Option<String>,
}

fn clearable(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| {
        let v = v.trim().to_string();
        (!v.is_empty()).then_some(v)
    })
}

impl ProfilePatch {
    fn into_update(self) -> ApiResult<UpdateProfile> {
        if let Some(username) = &self.username {
            validate_username(username).map_err(|e| ApiError::invalid("username", e))?;
        }

        let avatar_url = clearable(self.avatar_url);
        if let Some(Some(url)) = &avatar_url {
            if let Err(e) = web_url(url) {
                let mut errors = ValidationErrors::new();
                errors.add("avatar_url", e);
                return Err(errors.into());
            }
        }

        Ok(UpdateProfile {
            username: self.username,
            bio: clearable(self.bio),
            avatar_url,
        })
    }
}

pub async fn get_profile(
    State(state): State<AppState>,
    caller: Option<AuthContext>,
    Path(username): Path<String>,
) -> ApiResult<Json<ProfileView>> {
    let profile = Profile::find_by_username(&state.db, &username)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    let stats = Profile::stats(&state.db, profile.user_id).await?;

    let is_following = match caller {
        Some(auth) if !auth.is(profile.user_id) => {
            Some(follow::is_following(&state.db, auth.user_id, profile.user_id).await?)
        }
        _ => None,
    };

    Ok(Json(ProfileView {
        profile,
        stats,
        is_following,
    }))
}

pub async fn update_own_profile(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(patch): Json<ProfilePatch>,
) -> ApiResult<Json<Profile>> {
    patch.validate()?;
    let update = patch.into_update()?;

    if update.is_empty() {
        return Err(ApiError::BadRequest("No changes provided".to_string()));
    }

    let profile = Profile::update(&state.db, auth.user_id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    Ok(Json(profile))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_strings_clear_fields() {
        let update = ProfilePatch {
            username: None,
            bio: Some("  ".to_string()),
            avatar_url: Some(String::new()),
        }
        .into_update()
        .unwrap();

        assert_eq!(update.bio, Some(None));
        assert_eq!(update.avatar_url, Some(None));
        assert!(update.username.is_none());
    }

    #[test]
    fn test_bad_avatar_url_rejected() {
        for url in ["ftp://example.com/a.png", "https://<script>/a.png", "http://:80/a.png"] {
            let result = ProfilePatch {
                username: None,
                bio: None,
                avatar_url: Some(url.to_string()),
            }
            .into_update();

            assert!(matches!(result, Err(ApiError::ValidationError(_))), "{url}");
        }
    }
}
