/// Course removal
///
/// Deletes a set of courses together with everything that references them.
/// Used when an author deletes their own course, when an admin deletes a
/// course, and by the ban cascade for every course the banned user wrote.

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::{run_plan, CascadeError, CascadeReport, DeleteStep, PlanTarget};
use crate::models::course::Course;
use crate::models::moderation_log::{CreateModerationLog, ModerationAction, ModerationLog};
use crate::models::trail::LearningTrail;

/// Children of `courses`, then the courses themselves
pub const COURSE_DEPENDENTS: &[DeleteStep] = &[
    DeleteStep {
        label: "comments",
        table: "comments",
        filter: "course_id = ANY($1)",
    },
    DeleteStep {
        label: "ratings",
        table: "course_ratings",
        filter: "course_id = ANY($1)",
    },
    DeleteStep {
        label: "saves",
        table: "course_saves",
        filter: "course_id = ANY($1)",
    },
    DeleteStep {
        label: "likes",
        table: "course_likes",
        filter: "course_id = ANY($1)",
    },
    DeleteStep {
        label: "views",
        table: "course_views",
        filter: "course_id = ANY($1)",
    },
    DeleteStep {
        label: "trail memberships",
        table: "trail_courses",
        filter: "course_id = ANY($1)",
    },
    DeleteStep {
        label: "course reports",
        table: "course_reports",
        filter: "course_id = ANY($1)",
    },
    DeleteStep {
        label: "moderation logs",
        table: "moderation_logs",
        filter: "course_id = ANY($1)",
    },
    DeleteStep {
        label: "pending edits",
        table: "course_edits",
        filter: "course_id = ANY($1)",
    },
    DeleteStep {
        label: "courses",
        table: "courses",
        filter: "id = ANY($1)",
    },
];

/// Deletes `course_ids` and their dependent rows into `report`
///
/// Trails that contained any of the courses get their positions
/// re-compacted afterwards.
pub async fn remove_courses(pool: &PgPool, course_ids: &[Uuid], report: &mut CascadeReport) {
    if course_ids.is_empty() {
        return;
    }

    let trails = report
        .collect(
            "find affected trails",
            LearningTrail::ids_containing(pool, course_ids),
        )
        .await;

    run_plan(pool, COURSE_DEPENDENTS, PlanTarget::Ids(course_ids), report).await;

    if !trails.is_empty() {
        report
            .run(
                "compact trail positions",
                LearningTrail::compact_positions(pool, &trails),
            )
            .await;
    }
}

/// Who is deleting a single course
#[derive(Debug, Clone)]
pub enum CourseDeletion {
    /// The author removes their own course; no audit row
    ByAuthor,

    /// Staff removal, logged as `course_deleted`
    ByAdmin {
        admin_id: Uuid,
        reason: Option<String>,
    },
}

/// Deletes one course and its dependents
///
/// # Errors
///
/// `CascadeError::NotFound` when the course does not exist; nothing runs.
pub async fn delete_course(
    pool: &PgPool,
    course_id: Uuid,
    deletion: CourseDeletion,
) -> Result<CascadeReport, CascadeError> {
    let course = Course::find_by_id(pool, course_id)
        .await?
        .ok_or(CascadeError::NotFound("Course"))?;

    let mut report = CascadeReport::new();
    remove_courses(pool, &[course.id], &mut report).await;

    if let CourseDeletion::ByAdmin { admin_id, reason } = deletion {
        // The course row is gone, so the log keeps the title in `reason`
        let reason = match reason {
            Some(r) => format!("{}: {}", course.title, r),
            None => course.title.clone(),
        };

        report
            .run(
                "moderation log",
                async {
                    ModerationLog::create(
                        pool,
                        CreateModerationLog {
                            course_id: None,
                            target_user_id: Some(course.author_id),
                            moderator_id: admin_id,
                            action: ModerationAction::CourseDeleted,
                            reason: Some(reason),
                        },
                    )
                    .await
                    .map(|_| 1)
                },
            )
            .await;
    }

    info!(
        course_id = %course.id,
        author_id = %course.author_id,
        failed_steps = report.failed_steps().len(),
        "Course removed"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::plan_checks::assert_children_first;

    #[test]
    fn test_courses_deleted_last() {
        assert_eq!(COURSE_DEPENDENTS.last().map(|s| s.table), Some("courses"));
        assert_children_first(COURSE_DEPENDENTS);
    }

    #[test]
    fn test_every_course_child_is_covered() {
        for table in [
            "comments",
            "course_ratings",
            "course_saves",
            "course_likes",
            "course_views",
            "trail_courses",
            "course_reports",
            "moderation_logs",
            "course_edits",
        ] {
            assert!(
                COURSE_DEPENDENTS.iter().any(|s| s.table == table),
                "missing {}",
                table
            );
        }
    }

    #[test]
    fn test_filters_bind_course_array() {
        for step in COURSE_DEPENDENTS {
            assert!(step.filter.ends_with("= ANY($1)"), "{}", step.label);
        }
    }
}
