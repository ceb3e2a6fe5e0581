/// Moderation decisions on courses and pending edits

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::{CascadeError, CascadeReport};
use crate::models::course::{Course, CourseStatus};
use crate::models::course_edit::CourseEdit;
use crate::models::moderation_log::{CreateModerationLog, ModerationAction, ModerationLog};
use crate::models::report::CourseReport;

/// A moderator's verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn status(&self) -> CourseStatus {
        match self {
            Decision::Approve => CourseStatus::Approved,
            Decision::Reject => CourseStatus::Rejected,
        }
    }

    fn course_action(&self) -> ModerationAction {
        match self {
            Decision::Approve => ModerationAction::Approved,
            Decision::Reject => ModerationAction::Rejected,
        }
    }

    fn edit_action(&self) -> ModerationAction {
        match self {
            Decision::Approve => ModerationAction::EditApproved,
            Decision::Reject => ModerationAction::EditRejected,
        }
    }
}

/// Approves or rejects a course
///
/// Steps: transition the status, write one moderation log row, clear every
/// open report on the course.
///
/// # Errors
///
/// `NotFound` if the course does not exist, `NotPending` if it was already
/// decided. In both cases no step runs.
pub async fn moderate_course(
    pool: &PgPool,
    course_id: Uuid,
    moderator_id: Uuid,
    decision: Decision,
    reason: Option<String>,
) -> Result<CascadeReport, CascadeError> {
    let course = Course::find_by_id(pool, course_id)
        .await?
        .ok_or(CascadeError::NotFound("Course"))?;

    if course.status != CourseStatus::Pending {
        return Err(CascadeError::NotPending);
    }

    let mut report = CascadeReport::new();

    report
        .run(
            "course status",
            Course::set_status(
                pool,
                course.id,
                decision.status(),
                moderator_id,
                reason.as_deref(),
            ),
        )
        .await;

    report
        .run("moderation log", async {
            ModerationLog::create(
                pool,
                CreateModerationLog {
                    course_id: Some(course.id),
                    target_user_id: Some(course.author_id),
                    moderator_id,
                    action: decision.course_action(),
                    reason: reason.clone(),
                },
            )
            .await
            .map(|_| 1)
        })
        .await;

    report
        .run(
            "clear course reports",
            CourseReport::delete_for_course(pool, course.id),
        )
        .await;

    info!(
        %course_id,
        %moderator_id,
        ?decision,
        failed_steps = report.failed_steps().len(),
        "Course moderated"
    );

    Ok(report)
}

/// Approves or rejects a pending edit of an approved course
///
/// On approval the edit's fields are copied onto the course before the edit
/// is marked.
///
/// # Errors
///
/// `NotFound` for an unknown edit, `NotPending` for an edit that was
/// already decided.
pub async fn moderate_edit(
    pool: &PgPool,
    edit_id: Uuid,
    moderator_id: Uuid,
    decision: Decision,
    reason: Option<String>,
) -> Result<CascadeReport, CascadeError> {
    let edit = CourseEdit::find_by_id(pool, edit_id)
        .await?
        .ok_or(CascadeError::NotFound("Edit"))?;

    if edit.status != CourseStatus::Pending {
        return Err(CascadeError::NotPending);
    }

    let mut report = CascadeReport::new();

    if decision == Decision::Approve {
        report
            .run("apply edit", CourseEdit::apply_to_course(pool, &edit))
            .await;
    }

    report
        .run(
            "edit status",
            CourseEdit::set_status(pool, edit.id, decision.status(), moderator_id),
        )
        .await;

    report
        .run("moderation log", async {
            ModerationLog::create(
                pool,
                CreateModerationLog {
                    course_id: Some(edit.course_id),
                    target_user_id: Some(edit.author_id),
                    moderator_id,
                    action: decision.edit_action(),
                    reason,
                },
            )
            .await
            .map(|_| 1)
        })
        .await;

    info!(%edit_id, course_id = %edit.course_id, ?decision, "Course edit moderated");

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_mapping() {
        assert_eq!(Decision::Approve.status(), CourseStatus::Approved);
        assert_eq!(Decision::Reject.status(), CourseStatus::Rejected);
        assert_eq!(Decision::Approve.course_action(), ModerationAction::Approved);
        assert_eq!(Decision::Reject.edit_action(), ModerationAction::EditRejected);
    }
}
