//! Diesel row models for task persistence.

use super::schema::{task_dependencies, tasks};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Row model for task records, shared by queries, inserts, and updates.
///
/// `treat_none_as_null` makes an update clear `next_recurrence` when the
/// task no longer recurs instead of silently keeping the stale date.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Task title.
    pub title: String,
    /// Urgency level.
    pub priority: String,
    /// Completion state.
    pub status: String,
    /// Due date.
    pub due_date: DateTime<Utc>,
    /// Recurrence cadence.
    pub recurrence: String,
    /// Next occurrence date, set iff the task recurs.
    pub next_recurrence: Option<DateTime<Utc>>,
    /// Soft-deletion flag.
    pub active: bool,
    /// Owning user.
    pub owner_id: uuid::Uuid,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Row model for dependency edges.
#[derive(Debug, Clone, Copy, Queryable, Selectable, Insertable)]
#[diesel(table_name = task_dependencies)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DependencyRow {
    /// Edge identifier.
    pub id: uuid::Uuid,
    /// Task carrying the prerequisite.
    pub dependent_id: uuid::Uuid,
    /// Task that must complete first.
    pub prerequisite_id: uuid::Uuid,
}
