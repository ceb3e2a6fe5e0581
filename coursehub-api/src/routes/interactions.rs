/// Engagement with a course: comments, ratings, likes, saves, views, reports
///
/// All of these act on courses the caller can see; likes, saves, ratings
/// and reports are also limited to approved courses.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{courses::visible_course, non_blank},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use coursehub_shared::{
    auth::{authorization::require_owner_or_staff, middleware::AuthContext},
    models::{
        comment::{Comment, CommentWithAuthor},
        course::{Course, CourseStatus},
        engagement::{self, Engagement, ToggleOutcome},
        rating::CourseRating,
        report::CourseReport,
    },
};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tracing::info;
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Deserialize, Validate)]
pub struct CommentRequest {
    #[validate(
        length(min = 1, max = 2000, message = "Comment must be 1-2000 characters"),
        custom(function = "non_blank")
    )]
    pub body: String,
}

/// Whole stars
#[derive(Debug, Deserialize, Validate)]
pub struct RatingRequest {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i16,
}

#[derive(Debug, Serialize)]
pub struct RatingResponse {
    pub rating: CourseRating,
    pub rating_avg: f64,
    pub rating_count: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ViewRequest {
    /// Client-generated id, stable for one browsing session
    #[validate(
        length(min = 1, max = 128, message = "Session id must be 1-128 characters"),
        custom(function = "printable_ascii")
    )]
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct ViewResponse {
    /// False when this session had already viewed the course
    pub counted: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReportRequest {
    #[validate(
        length(min = 1, max = 1000, message = "Reason must be 1-1000 characters"),
        custom(function = "non_blank")
    )]
    pub reason: String,
}

fn printable_ascii(value: &str) -> Result<(), ValidationError> {
    if value.chars().all(|c| c.is_ascii_graphic()) {
        return Ok(());
    }
    let mut error = ValidationError::new("printable_ascii");
    error.message = Some(Cow::Borrowed("Session id must be printable ASCII"));
    Err(error)
}

async fn approved_course(state: &AppState, course_id: Uuid, auth: AuthContext) -> ApiResult<Course> {
    let course = visible_course(state, course_id, Some(auth)).await?;
    if course.status != CourseStatus::Approved {
        return Err(ApiError::BadRequest("Course is not published".to_string()));
    }
    Ok(course)
}

pub async fn list_comments(
    State(state): State<AppState>,
    caller: Option<AuthContext>,
    Path(course_id): Path<Uuid>,
) -> ApiResult<Json<Vec<CommentWithAuthor>>> {
    let course = visible_course(&state, course_id, caller).await?;
    Ok(Json(Comment::list_for_course(&state.db, course.id).await?))
}

pub async fn add_comment(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(course_id): Path<Uuid>,
    Json(req): Json<CommentRequest>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    req.validate()?;
    let course = visible_course(&state, course_id, Some(auth)).await?;

    let comment = Comment::create(&state.db, course.id, auth.user_id, &req.body).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// Authors delete their own comments; staff delete anyone's
pub async fn delete_comment(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(comment_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let comment = Comment::find_by_id(&state.db, comment_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;

    let as_staff = require_owner_or_staff(&state.db, auth.user_id, comment.user_id).await?;
    Comment::delete(&state.db, comment.id).await?;

    if as_staff {
        info!(comment_id = %comment.id, moderator_id = %auth.user_id, "Comment removed by staff");
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Creates or replaces the caller's rating
pub async fn rate_course(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(course_id): Path<Uuid>,
    Json(req): Json<RatingRequest>,
) -> ApiResult<Json<RatingResponse>> {
    req.validate()?;
    let course = approved_course(&state, course_id, auth).await?;

    let rating = CourseRating::upsert(&state.db, auth.user_id, course.id, req.rating).await?;
    let course = Course::find_by_id(&state.db, course.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    Ok(Json(RatingResponse {
        rating,
        rating_avg: course.rating_avg,
        rating_count: course.rating_count,
    }))
}

async fn toggle(state: AppState, auth: AuthContext, course_id: Uuid, kind: Engagement) -> ApiResult<Json<ToggleOutcome>> {
    let course = approved_course(&state, course_id, auth).await?;
    Ok(Json(engagement::toggle(&state.db, kind, auth.user_id, course.id).await?))
}

pub async fn toggle_like(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(course_id): Path<Uuid>,
) -> ApiResult<Json<ToggleOutcome>> {
    toggle(state, auth, course_id, Engagement::Like).await
}

pub async fn toggle_save(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(course_id): Path<Uuid>,
) -> ApiResult<Json<ToggleOutcome>> {
    toggle(state, auth, course_id, Engagement::Save).await
}

/// Counts a view once per (course, session); guests may record views
pub async fn record_view(
    State(state): State<AppState>,
    caller: Option<AuthContext>,
    Path(course_id): Path<Uuid>,
    Json(req): Json<ViewRequest>,
) -> ApiResult<Json<ViewResponse>> {
    req.validate()?;
    let course = visible_course(&state, course_id, caller).await?;

    let counted = engagement::record_view(
        &state.db,
        course.id,
        caller.map(|auth| auth.user_id),
        &req.session_id,
    )
    .await?;

    Ok(Json(ViewResponse { counted }))
}

pub async fn report_course(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(course_id): Path<Uuid>,
    Json(req): Json<ReportRequest>,
) -> ApiResult<(StatusCode, Json<CourseReport>)> {
    req.validate()?;
    let course = approved_course(&state, course_id, auth).await?;

    let report = CourseReport::create(&state.db, course.id, auth.user_id, &req.reason).await?;
    info!(course_id = %course.id, report_id = %report.id, "Course reported");

    Ok((StatusCode::CREATED, Json(report)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_range() {
        for stars in 1..=5 {
            assert!(RatingRequest { rating: stars }.validate().is_ok());
        }
        for stars in [0, 6, -3] {
            let errors = RatingRequest { rating: stars }.validate().unwrap_err();
            assert!(errors.field_errors().contains_key("rating"));
        }
    }

    #[test]
    fn test_comment_body_rules() {
        let ok = CommentRequest {
            body: "Great explanation of borrowing".to_string(),
        };
        assert!(ok.validate().is_ok());

        for body in ["".to_string(), "   ".to_string(), "a".repeat(2001)] {
            let errors = CommentRequest { body }.validate().unwrap_err();
            assert!(errors.field_errors().contains_key("body"));
        }
        assert!(CommentRequest { body: "a".repeat(2000) }.validate().is_ok());
    }

    #[test]
    fn test_report_reason_rules() {
        assert!(ReportRequest {
            reason: "Spam link in the description".to_string()
        }
        .validate()
        .is_ok());
        assert!(ReportRequest { reason: "\n\t ".to_string() }.validate().is_err());
        assert!(ReportRequest { reason: "x".repeat(1001) }.validate().is_err());
    }

    #[test]
    fn test_session_id_rules() {
        let view = |id: &str| ViewRequest {
            session_id: id.to_string(),
        };
        assert!(view("tab-7f3c2a").validate().is_ok());
        assert!(view("").validate().is_err());
        assert!(view("has space").validate().is_err());
        assert!(view(&"s".repeat(129)).validate().is_err());
    }

    #[test]
    fn test_validation_errors_become_422() {
        let err = ApiError::from(RatingRequest { rating: 9 }.validate().unwrap_err());
        let ApiError::ValidationError(details) = err else {
            panic!("expected a validation error");
        };
        assert_eq!(details[0].field, "rating");
    }
}
