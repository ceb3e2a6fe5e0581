/// Manually sequenced multi-table cleanups
///
/// Foreign keys in the schema carry no `ON DELETE CASCADE`, so removing a
/// course, a forum thread or a whole user means deleting dependent rows
/// children-first from application code. The cascades here run their steps
/// one after another against the pool:
///
/// ```text
/// moderate_course      status -> log row -> clear reports
/// remove_courses       comments .. edits -> courses -> compact trails
/// ban_user             remove_courses(authored) -> own content -> counters
///                      -> banned flag -> identity -> log row
/// remove_topic/reply   reports -> replies -> topic
/// ```
///
/// # Failure model
///
/// There is no enclosing transaction. A failing step is logged with
/// `tracing::warn!`, recorded in the [`CascadeReport`] and skipped; the
/// remaining steps still run. Only preconditions (missing rows, self-ban)
/// abort a cascade, and they are checked before any step executes.

pub mod ban;
pub mod course_removal;
pub mod forum;
pub mod moderation;

use serde::Serialize;
use sqlx::PgPool;
use std::fmt::Display;
use std::future::Future;
use tracing::{debug, warn};
use uuid::Uuid;

pub use ban::{ban_user, BanOutcome};
pub use course_removal::{delete_course, remove_courses, CourseDeletion};
pub use forum::{remove_reply, remove_topic};
pub use moderation::{moderate_course, moderate_edit, Decision};

/// Errors that stop a cascade before it starts
#[derive(Debug, thiserror::Error)]
pub enum CascadeError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Administrators cannot ban themselves")]
    SelfBan,

    #[error("Only pending items can be moderated")]
    NotPending,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Outcome of one cascade step
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub step: &'static str,

    /// Rows touched, `None` when the step failed
    pub rows_affected: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-step record of a cascade run
#[derive(Debug, Clone, Default, Serialize)]
pub struct CascadeReport {
    pub steps: Vec<StepOutcome>,
}

impl CascadeReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Awaits one step and records its outcome
    ///
    /// Failures are logged and swallowed; the caller decides whether a
    /// missing value matters for later steps.
    pub async fn run<F, E>(&mut self, step: &'static str, fut: F) -> Option<u64>
    where
        F: Future<Output = Result<u64, E>>,
        E: Display,
    {
        let result = fut.await;
        self.record(step, result)
    }

    /// Like [`run`](Self::run) for steps that read a list of IDs
    ///
    /// A failed read yields an empty list.
    pub async fn collect<F, E>(&mut self, step: &'static str, fut: F) -> Vec<Uuid>
    where
        F: Future<Output = Result<Vec<Uuid>, E>>,
        E: Display,
    {
        match fut.await {
            Ok(ids) => {
                self.record::<E>(step, Ok(ids.len() as u64));
                ids
            }
            Err(e) => {
                self.record(step, Err(e));
                Vec::new()
            }
        }
    }

    fn record<E: Display>(&mut self, step: &'static str, result: Result<u64, E>) -> Option<u64> {
        match result {
            Ok(rows) => {
                debug!(step, rows, "Cascade step completed");
                self.steps.push(StepOutcome {
                    step,
                    rows_affected: Some(rows),
                    error: None,
                });
                Some(rows)
            }
            Err(e) => {
                warn!(step, error = %e, "Cascade step failed, continuing");
                self.steps.push(StepOutcome {
                    step,
                    rows_affected: None,
                    error: Some(e.to_string()),
                });
                None
            }
        }
    }

    /// Steps that failed
    pub fn failed_steps(&self) -> Vec<&StepOutcome> {
        self.steps.iter().filter(|s| s.error.is_some()).collect()
    }

    /// True when every step succeeded
    pub fn is_clean(&self) -> bool {
        self.steps.iter().all(|s| s.error.is_none())
    }

    /// Sum of rows touched by successful steps
    pub fn total_rows(&self) -> u64 {
        self.steps.iter().filter_map(|s| s.rows_affected).sum()
    }
}

/// One `DELETE` in a removal plan
///
/// `filter` is a WHERE clause over a single bind parameter `$1`.
#[derive(Debug, Clone, Copy)]
pub struct DeleteStep {
    pub label: &'static str,
    pub table: &'static str,
    pub filter: &'static str,
}

impl DeleteStep {
    pub fn sql(&self) -> String {
        format!("DELETE FROM {} WHERE {}", self.table, self.filter)
    }
}

/// What `$1` is bound to when running a plan
#[derive(Debug, Clone, Copy)]
pub enum PlanTarget<'a> {
    /// `$1` is a `UUID[]`, used with `= ANY($1)`
    Ids(&'a [Uuid]),

    /// `$1` is a single `UUID`
    Id(Uuid),
}

/// Runs every step of `plan` in order, recording each into `report`
pub async fn run_plan(pool: &PgPool, plan: &[DeleteStep], target: PlanTarget<'_>, report: &mut CascadeReport) {
    for step in plan {
        let sql = step.sql();
        let query = sqlx::query(&sql);
        let query = match target {
            PlanTarget::Ids(ids) => query.bind(ids),
            PlanTarget::Id(id) => query.bind(id),
        };

        report
            .run(step.label, async { query.execute(pool).await.map(|r| r.rows_affected()) })
            .await;
    }
}

#[cfg(test)]
pub(crate) mod plan_checks {
    use super::DeleteStep;

    /// (child table, parent table) foreign-key pairs of the schema
    pub const FOREIGN_KEYS: &[(&str, &str)] = &[
        ("user_roles", "profiles"),
        ("user_follows", "profiles"),
        ("courses", "profiles"),
        ("courses", "categories"),
        ("course_edits", "courses"),
        ("comments", "courses"),
        ("course_ratings", "courses"),
        ("course_likes", "courses"),
        ("course_saves", "courses"),
        ("course_views", "courses"),
        ("course_reports", "courses"),
        ("moderation_logs", "courses"),
        ("forum_replies", "forum_topics"),
        ("forum_topic_reports", "forum_topics"),
        ("forum_reply_reports", "forum_replies"),
        ("trail_courses", "learning_trails"),
        ("trail_courses", "courses"),
    ];

    /// Asserts that no step deletes a parent before the last step that
    /// deletes one of its children
    pub fn assert_children_first(plan: &[DeleteStep]) {
        for (child, parent) in FOREIGN_KEYS {
            let last_child = plan.iter().rposition(|s| s.table == *child);
            let first_parent = plan.iter().position(|s| s.table == *parent);

            if let (Some(c), Some(p)) = (last_child, first_parent) {
                assert!(
                    c < p,
                    "{} rows must be deleted before {} (step {} vs {})",
                    child,
                    parent,
                    plan[c].label,
                    plan[p].label
                );
            }
        }
    }
}
