/// Forum thread removal

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::{run_plan, CascadeError, CascadeReport, DeleteStep, PlanTarget};
use crate::models::forum::{ForumReply, ForumTopic};

/// Removal of one topic, `$1` = topic id
pub const TOPIC_REMOVAL: &[DeleteStep] = &[
    DeleteStep {
        label: "reply reports",
        table: "forum_reply_reports",
        filter: "reply_id IN (SELECT id FROM forum_replies WHERE topic_id = $1)",
    },
    DeleteStep {
        label: "replies",
        table: "forum_replies",
        filter: "topic_id = $1",
    },
    DeleteStep {
        label: "topic reports",
        table: "forum_topic_reports",
        filter: "topic_id = $1",
    },
    DeleteStep {
        label: "topic",
        table: "forum_topics",
        filter: "id = $1",
    },
];

/// Removal of one reply, `$1` = reply id
pub const REPLY_REMOVAL: &[DeleteStep] = &[
    DeleteStep {
        label: "reply reports",
        table: "forum_reply_reports",
        filter: "reply_id = $1",
    },
    DeleteStep {
        label: "reply",
        table: "forum_replies",
        filter: "id = $1",
    },
];

pub async fn remove_topic(pool: &PgPool, topic_id: Uuid) -> Result<CascadeReport, CascadeError> {
    ForumTopic::find_by_id(pool, topic_id)
        .await?
        .ok_or(CascadeError::NotFound("Topic"))?;

    let mut report = CascadeReport::new();
    run_plan(pool, TOPIC_REMOVAL, PlanTarget::Id(topic_id), &mut report).await;

    info!(%topic_id, rows = report.total_rows(), "Forum topic removed");
    Ok(report)
}

pub async fn remove_reply(pool: &PgPool, reply_id: Uuid) -> Result<CascadeReport, CascadeError> {
    ForumReply::find_by_id(pool, reply_id)
        .await?
        .ok_or(CascadeError::NotFound("Reply"))?;

    let mut report = CascadeReport::new();
    run_plan(pool, REPLY_REMOVAL, PlanTarget::Id(reply_id), &mut report).await;

    info!(%reply_id, "Forum reply removed");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::plan_checks::assert_children_first;

    #[test]
    fn test_forum_plans_are_children_first() {
        assert_children_first(TOPIC_REMOVAL);
        assert_children_first(REPLY_REMOVAL);
    }
}
