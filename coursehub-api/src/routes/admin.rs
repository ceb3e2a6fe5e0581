/// Admin endpoints, behind the admin guard
///
/// Users and roles, the ban cascade, staff course deletion, categories and
/// dashboard counts.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{optional_json, Pagination},
};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use coursehub_shared::{
    auth::middleware::AuthContext,
    cascade::{self, ban_user as run_ban, BanOutcome, CascadeReport, CourseDeletion},
    models::{
        category::{Category, CategoryDeletion},
        course::Course,
        course_edit::CourseEdit,
        profile::Profile,
        report::CourseReport,
        role::{AppRole, UserRole},
    },
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize)]
pub struct AdminUser {
    #[serde(flatten)]
    pub profile: Profile,
    pub roles: Vec<AppRole>,
}

#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: AppRole,
}

#[derive(Debug, Serialize)]
pub struct RoleChanged {
    pub user_id: Uuid,
    pub roles: Vec<AppRole>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ReasonRequest {
    #[validate(length(max = 1000, message = "Reason must be at most 1000 characters"))]
    pub reason: Option<String>,
}

impl ReasonRequest {
    fn from_body(body: &[u8]) -> ApiResult<Option<String>> {
        let req: ReasonRequest = optional_json(body)?;
        req.validate()?;
        Ok(req
            .reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty()))
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 2, max = 50, message = "Name must be 2-50 characters"))]
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct CourseCounts {
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
}

#[derive(Debug, Serialize)]
pub struct AdminStats {
    pub users: i64,
    pub banned_users: i64,
    pub courses: CourseCounts,
    pub pending_edits: i64,
    pub open_reports: i64,
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<AdminUser>>> {
    let (limit, offset) = page.bounds();
    let profiles = Profile::list(&state.db, limit, offset).await?;

    let mut users = Vec::with_capacity(profiles.len());
    for profile in profiles {
        let roles = UserRole::roles_for_user(&state.db, profile.user_id).await?;
        users.push(AdminUser { profile, roles });
    }

    Ok(Json(users))
}

/// Sets a user's staff role; `user` removes staff rights
///
/// Admins cannot change their own role, so the last admin cannot lock
/// everyone out.
pub async fn set_role(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(user_id): Path<Uuid>,
    Json(req): Json<SetRoleRequest>,
) -> ApiResult<Json<RoleChanged>> {
    if auth.is(user_id) {
        return Err(ApiError::BadRequest("You cannot change your own role".to_string()));
    }

    let profile = Profile::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    if profile.banned {
        return Err(ApiError::BadRequest("User is banned".to_string()));
    }

    UserRole::set_role(&state.db, user_id, req.role).await?;
    info!(%user_id, role = req.role.as_str(), admin_id = %auth.user_id, "Role changed");

    Ok(Json(RoleChanged {
        user_id,
        roles: UserRole::roles_for_user(&state.db, user_id).await?,
    }))
}

/// Runs the ban cascade; the outcome lists every step, failed ones included
pub async fn ban_user(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(user_id): Path<Uuid>,
    body: Bytes,
) -> ApiResult<Json<BanOutcome>> {
    let reason = ReasonRequest::from_body(&body)?;
    let outcome = run_ban(&state.db, state.identity.as_ref(), user_id, auth.user_id, reason).await?;
    Ok(Json(outcome))
}

pub async fn delete_course(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(course_id): Path<Uuid>,
    body: Bytes,
) -> ApiResult<Json<CascadeReport>> {
    let reason = ReasonRequest::from_body(&body)?;
    let report = cascade::delete_course(
        &state.db,
        course_id,
        CourseDeletion::ByAdmin {
            admin_id: auth.user_id,
            reason,
        },
    )
    .await?;

    Ok(Json(report))
}

pub async fn create_category(
    State(state): State<AppState>,
    Json(req): Json<CreateCategoryRequest>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    req.validate()?;
    let category = Category::create(&state.db, req.name.trim()).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// Deletes a category; its courses stay, uncategorized
pub async fn delete_category(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
) -> ApiResult<Json<CategoryDeletion>> {
    let deletion = Category::delete(&state.db, category_id).await?;
    if !deletion.deleted {
        return Err(ApiError::NotFound("Category not found".to_string()));
    }
    Ok(Json(deletion))
}

pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<AdminStats>> {
    let (users, banned_users) = Profile::count(&state.db).await?;
    let (pending, approved, rejected) = Course::count_by_status(&state.db).await?;

    Ok(Json(AdminStats {
        users,
        banned_users,
        courses: CourseCounts {
            pending,
            approved,
            rejected,
        },
        pending_edits: CourseEdit::count_pending(&state.db).await?,
        open_reports: CourseReport::list_open(&state.db).await?.len() as i64,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_body_means_no_reason() {
        assert_eq!(ReasonRequest::from_body(b"").unwrap(), None);
        assert_eq!(
            ReasonRequest::from_body(br#"{"reason": " Spam "}"#).unwrap().as_deref(),
            Some("Spam")
        );
    }

    #[test]
    fn test_malformed_body_rejected() {
        for body in [&b"{\"reason\": "[..], &b"reason=spam"[..], &br#"{"reason": 7}"#[..]] {
            assert!(matches!(
                ReasonRequest::from_body(body),
                Err(ApiError::BadRequest(_))
            ));
        }
    }

    #[test]
    fn test_overlong_reason_rejected() {
        let body = serde_json::to_vec(&serde_json::json!({ "reason": "x".repeat(1001) })).unwrap();
        assert!(matches!(
            ReasonRequest::from_body(&body),
            Err(ApiError::ValidationError(_))
        ));
    }

    #[test]
    fn test_set_role_body() {
        let req: SetRoleRequest = serde_json::from_str(r#"{"role": "moderator"}"#).unwrap();
        assert_eq!(req.role, AppRole::Moderator);
        assert!(serde_json::from_str::<SetRoleRequest>(r#"{"role": "owner"}"#).is_err());
    }

    #[test]
    fn test_category_name_length() {
        let short = CreateCategoryRequest { name: "x".to_string() };
        assert!(short.validate().is_err());
        let ok = CreateCategoryRequest {
            name: "Databases".to_string(),
        };
        assert!(ok.validate().is_ok());
    }
}
