/// Moderation endpoints, behind the moderator guard
///
/// Approve and reject run the moderation cascade and answer 200 with its
/// step report, including any steps that failed.

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
    cascade::{moderate_course, moderate_edit, CascadeReport, Decision},
    models::{
        course::{Course, CourseStatus},
        course_edit::CourseEdit,
        forum::{self, ForumReports, ForumTarget},
        moderation_log::ModerationLog,
        report::{CourseReport, OpenCourseReport},
    },
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Optional body of approve/reject calls
#[derive(Debug, Default, Deserialize, Validate)]
pub struct DecisionRequest {
    #[validate(length(max = 1000, message = "Reason must be at most 1000 characters"))]
    pub reason: Option<String>,
}

impl DecisionRequest {
    fn into_reason(self) -> ApiResult<Option<String>> {
        self.validate()?;
        Ok(self
            .reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty()))
    }
}

/// An absent body means no reason; a malformed one is a 400
fn reason_of(body: &[u8]) -> ApiResult<Option<String>> {
    optional_json::<DecisionRequest>(body)?.into_reason()
}

/// Pending courses, oldest first
pub async fn queue(State(state): State<AppState>, Query(page): Query<Pagination>) -> ApiResult<Json<Vec<Course>>> {
    let (limit, offset) = page.bounds();
    Ok(Json(
        Course::list_by_status(&state.db, CourseStatus::Pending, limit, offset).await?,
    ))
}

async fn decide_course(
    state: &AppState,
    auth: AuthContext,
    course_id: Uuid,
    decision: Decision,
    body: Bytes,
) -> ApiResult<Json<CascadeReport>> {
    let reason = reason_of(&body)?;
    Ok(Json(
        moderate_course(&state.db, course_id, auth.user_id, decision, reason).await?,
    ))
}

pub async fn approve_course(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(course_id): Path<Uuid>,
    body: Bytes,
) -> ApiResult<Json<CascadeReport>> {
    decide_course(&state, auth, course_id, Decision::Approve, body).await
}

pub async fn reject_course(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(course_id): Path<Uuid>,
    body: Bytes,
) -> ApiResult<Json<CascadeReport>> {
    decide_course(&state, auth, course_id, Decision::Reject, body).await
}

pub async fn list_edits(State(state): State<AppState>) -> ApiResult<Json<Vec<CourseEdit>>> {
    Ok(Json(CourseEdit::list_pending(&state.db).await?))
}

async fn decide_edit(
    state: &AppState,
    auth: AuthContext,
    edit_id: Uuid,
    decision: Decision,
    body: Bytes,
) -> ApiResult<Json<CascadeReport>> {
    let reason = reason_of(&body)?;
    Ok(Json(
        moderate_edit(&state.db, edit_id, auth.user_id, decision, reason).await?,
    ))
}

pub async fn approve_edit(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(edit_id): Path<Uuid>,
    body: Bytes,
) -> ApiResult<Json<CascadeReport>> {
    decide_edit(&state, auth, edit_id, Decision::Approve, body).await
}

pub async fn reject_edit(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(edit_id): Path<Uuid>,
    body: Bytes,
) -> ApiResult<Json<CascadeReport>> {
    decide_edit(&state, auth, edit_id, Decision::Reject, body).await
}

pub async fn list_reports(State(state): State<AppState>) -> ApiResult<Json<Vec<OpenCourseReport>>> {
    Ok(Json(CourseReport::list_open(&state.db).await?))
}

/// Drops a report without acting on the course
pub async fn dismiss_report(State(state): State<AppState>, Path(report_id): Path<Uuid>) -> ApiResult<StatusCode> {
    if !CourseReport::delete(&state.db, report_id).await? {
        return Err(ApiError::NotFound("Report not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_forum_reports(State(state): State<AppState>) -> ApiResult<Json<ForumReports>> {
    Ok(Json(forum::list_reports(&state.db).await?))
}

async fn dismiss_forum_report(state: &AppState, target: ForumTarget, report_id: Uuid) -> ApiResult<StatusCode> {
    if !forum::dismiss_report(&state.db, target, report_id).await? {
        return Err(ApiError::NotFound("Report not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn dismiss_topic_report(State(state): State<AppState>, Path(report_id): Path<Uuid>) -> ApiResult<StatusCode> {
    dismiss_forum_report(&state, ForumTarget::Topic, report_id).await
}

pub async fn dismiss_reply_report(State(state): State<AppState>, Path(report_id): Path<Uuid>) -> ApiResult<StatusCode> {
    dismiss_forum_report(&state, ForumTarget::Reply, report_id).await
}

/// Audit trail, newest first
pub async fn list_logs(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<ModerationLog>>> {
    let (limit, offset) = page.bounds();
    Ok(Json(ModerationLog::list(&state.db, limit, offset).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_reason_becomes_none() {
        assert_eq!(reason_of(br#"{"reason": "   "}"#).unwrap(), None);
        assert_eq!(reason_of(b"").unwrap(), None);
        assert_eq!(reason_of(b"{}").unwrap(), None);
    }

    #[test]
    fn test_reason_is_trimmed() {
        assert_eq!(
            reason_of(br#"{"reason": " Audio is missing "}"#).unwrap().as_deref(),
            Some("Audio is missing")
        );
    }

    #[test]
    fn test_malformed_decision_body_rejected() {
        assert!(matches!(reason_of(b"{\"reason\""), Err(ApiError::BadRequest(_))));
        assert!(matches!(reason_of(b"42"), Err(ApiError::BadRequest(_))));
    }
}
