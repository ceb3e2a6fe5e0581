/// Ban cascade
///
/// Banning removes every row a user authored, flags the profile as banned,
/// deletes the login identity and leaves one `user_banned` audit row:
///
/// ```text
/// ban_user(target, admin)
///   ├─> reject self-ban / unknown profile (nothing runs)
///   ├─> remember courses the target liked, saved or rated
///   ├─> remove_courses(courses authored by target)
///   ├─> USER_CONTENT plan (forum, comments, engagement, follows, trails, roles)
///   ├─> recompute counters of the remembered courses
///   ├─> profiles.banned = true
///   ├─> IdentityProvider::delete_identity (failure is a warning)
///   └─> moderation log `user_banned`
/// ```

use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::course_removal::remove_courses;
use super::{run_plan, CascadeError, CascadeReport, DeleteStep, PlanTarget};
use crate::identity::IdentityProvider;
use crate::models::course::Course;
use crate::models::moderation_log::{CreateModerationLog, ModerationAction, ModerationLog};
use crate::models::profile::Profile;

/// Rows owned by or pointing at a user, children before parents
pub const USER_CONTENT: &[DeleteStep] = &[
    DeleteStep {
        label: "forum topic reports filed",
        table: "forum_topic_reports",
        filter: "reporter_id = $1",
    },
    DeleteStep {
        label: "forum reply reports filed",
        table: "forum_reply_reports",
        filter: "reporter_id = $1",
    },
    DeleteStep {
        label: "reports on own forum replies",
        table: "forum_reply_reports",
        filter: "reply_id IN (SELECT id FROM forum_replies WHERE author_id = $1)",
    },
    DeleteStep {
        label: "reports on replies in own topics",
        table: "forum_reply_reports",
        filter: "reply_id IN (SELECT r.id FROM forum_replies r \
                 JOIN forum_topics t ON t.id = r.topic_id WHERE t.author_id = $1)",
    },
    DeleteStep {
        label: "own forum replies",
        table: "forum_replies",
        filter: "author_id = $1",
    },
    DeleteStep {
        label: "replies in own topics",
        table: "forum_replies",
        filter: "topic_id IN (SELECT id FROM forum_topics WHERE author_id = $1)",
    },
    DeleteStep {
        label: "reports on own topics",
        table: "forum_topic_reports",
        filter: "topic_id IN (SELECT id FROM forum_topics WHERE author_id = $1)",
    },
    DeleteStep {
        label: "own forum topics",
        table: "forum_topics",
        filter: "author_id = $1",
    },
    DeleteStep {
        label: "comments",
        table: "comments",
        filter: "user_id = $1",
    },
    DeleteStep {
        label: "ratings",
        table: "course_ratings",
        filter: "user_id = $1",
    },
    DeleteStep {
        label: "saves",
        table: "course_saves",
        filter: "user_id = $1",
    },
    DeleteStep {
        label: "likes",
        table: "course_likes",
        filter: "user_id = $1",
    },
    DeleteStep {
        label: "views",
        table: "course_views",
        filter: "user_id = $1",
    },
    DeleteStep {
        label: "follows",
        table: "user_follows",
        filter: "follower_id = $1 OR following_id = $1",
    },
    DeleteStep {
        label: "own trail memberships",
        table: "trail_courses",
        filter: "trail_id IN (SELECT id FROM learning_trails WHERE user_id = $1)",
    },
    DeleteStep {
        label: "own trails",
        table: "learning_trails",
        filter: "user_id = $1",
    },
    DeleteStep {
        label: "course reports filed",
        table: "course_reports",
        filter: "reporter_id = $1",
    },
    DeleteStep {
        label: "moderation logs authored",
        table: "moderation_logs",
        filter: "moderator_id = $1",
    },
    DeleteStep {
        label: "roles",
        table: "user_roles",
        filter: "user_id = $1",
    },
];

/// Result of a ban
#[derive(Debug, Clone, Serialize)]
pub struct BanOutcome {
    pub user_id: Uuid,

    /// False when the identity provider failed; the ban still stands
    pub identity_deleted: bool,

    pub report: CascadeReport,
}

async fn engaged_course_ids(pool: &PgPool, user_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT course_id FROM course_likes WHERE user_id = $1
        UNION
        SELECT course_id FROM course_saves WHERE user_id = $1
        UNION
        SELECT course_id FROM course_ratings WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Bans `target_id` on behalf of `admin_id`
///
/// # Errors
///
/// `SelfBan` when `target_id == admin_id`, `NotFound` when the target has
/// no profile. Both are checked before anything is deleted. Step failures
/// after that point are recorded in the returned report.
#[instrument(skip(pool, identity, reason), fields(provider = identity.name()))]
pub async fn ban_user(
    pool: &PgPool,
    identity: &dyn IdentityProvider,
    target_id: Uuid,
    admin_id: Uuid,
    reason: Option<String>,
) -> Result<BanOutcome, CascadeError> {
    if target_id == admin_id {
        return Err(CascadeError::SelfBan);
    }

    Profile::find_by_id(pool, target_id)
        .await?
        .ok_or(CascadeError::NotFound("User"))?;

    let mut report = CascadeReport::new();

    let engaged = report
        .collect("find engaged courses", engaged_course_ids(pool, target_id))
        .await;

    let authored = report
        .collect("find authored courses", Course::ids_by_author(pool, target_id))
        .await;

    remove_courses(pool, &authored, &mut report).await;

    run_plan(pool, USER_CONTENT, PlanTarget::Id(target_id), &mut report).await;

    let surviving: Vec<Uuid> = engaged
        .into_iter()
        .filter(|id| !authored.contains(id))
        .collect();
    if !surviving.is_empty() {
        report
            .run("refresh course counters", Course::refresh_counters(pool, &surviving))
            .await;
    }

    report
        .run("mark profile banned", Profile::mark_banned(pool, target_id))
        .await;

    let identity_deleted = report
        .run("delete identity", async {
            identity.delete_identity(target_id).await.map(u64::from)
        })
        .await
        .is_some();
    if !identity_deleted {
        warn!(%target_id, "Identity deletion failed; profile remains banned");
    }

    report
        .run("moderation log", async {
            ModerationLog::create(
                pool,
                CreateModerationLog {
                    course_id: None,
                    target_user_id: Some(target_id),
                    moderator_id: admin_id,
                    action: ModerationAction::UserBanned,
                    reason,
                },
            )
            .await
            .map(|_| 1)
        })
        .await;

    info!(
        %target_id,
        %admin_id,
        courses_removed = authored.len(),
        rows = report.total_rows(),
        failed_steps = report.failed_steps().len(),
        "User banned"
    );

    Ok(BanOutcome {
        user_id: target_id,
        identity_deleted,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::plan_checks::assert_children_first;

    #[test]
    fn test_user_content_is_children_first() {
        assert_children_first(USER_CONTENT);
    }

    #[test]
    fn test_forum_reports_precede_forum_posts() {
        let pos = |label: &str| USER_CONTENT.iter().position(|s| s.label == label).unwrap();

        assert!(pos("reports on own forum replies") < pos("own forum replies"));
        assert!(pos("reports on replies in own topics") < pos("replies in own topics"));
        assert!(pos("replies in own topics") < pos("own forum topics"));
        assert!(pos("reports on own topics") < pos("own forum topics"));
    }

    #[test]
    fn test_roles_removed_last() {
        assert_eq!(USER_CONTENT.last().map(|s| s.table), Some("user_roles"));
    }

    #[test]
    fn test_filters_bind_user_id() {
        for step in USER_CONTENT {
            assert!(step.filter.contains("$1"), "{}", step.label);
            assert!(!step.filter.contains("ANY($1)"), "{}", step.label);
        }
    }
}
