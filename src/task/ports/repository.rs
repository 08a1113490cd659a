//! Repository port for task persistence, lookup, and dependency management.

use crate::task::domain::{DependencyId, Task, TaskDependency, TaskId, TaskStatus, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Equality filters applied to task lookups and counts.
///
/// Absent fields match any value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Restricts to tasks with the given soft-deletion state.
    pub active: Option<bool>,
    /// Restricts to tasks owned by the given user.
    pub owner: Option<UserId>,
    /// Restricts to tasks with the given completion state.
    pub status: Option<TaskStatus>,
}

impl TaskFilter {
    /// Matches every task.
    #[must_use]
    pub const fn any() -> Self {
        Self {
            active: None,
            owner: None,
            status: None,
        }
    }

    /// Matches every task owned by `owner`, including soft-deleted rows.
    #[must_use]
    pub const fn owned(owner: UserId) -> Self {
        Self {
            active: None,
            owner: Some(owner),
            status: None,
        }
    }

    /// Matches active tasks owned by `owner`.
    #[must_use]
    pub const fn active_owned(owner: UserId) -> Self {
        Self {
            active: Some(true),
            owner: Some(owner),
            status: None,
        }
    }

    /// Matches active, not-done tasks owned by `owner`.
    ///
    /// This is the editability precondition: done and soft-deleted tasks are
    /// immutable through the update and delete paths.
    #[must_use]
    pub const fn editable(owner: UserId) -> Self {
        Self {
            active: Some(true),
            owner: Some(owner),
            status: Some(TaskStatus::NotDone),
        }
    }

    /// Restricts the filter to the given completion state.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Returns `true` when the task satisfies every present field.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        self.active.is_none_or(|active| task.is_active() == active)
            && self.owner.is_none_or(|owner| task.owner_id() == owner)
            && self.status.is_none_or(|status| task.status() == status)
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

/// Task columns available as the single sort key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskSortField {
    /// Title, lexicographic.
    Title,
    /// Priority, low to high.
    Priority,
    /// Completion state, not-done before done.
    Status,
    /// Due date.
    DueDate,
    /// Creation timestamp; the default, matching insertion order.
    #[default]
    CreatedAt,
    /// Latest mutation timestamp.
    UpdatedAt,
}

/// Single-key sort specification.
///
/// No secondary tiebreak is applied; ties retain store order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskSort {
    /// Column to sort by.
    pub field: TaskSortField,
    /// Direction.
    pub order: SortOrder,
}

impl TaskSort {
    /// Creates a sort specification.
    #[must_use]
    pub const fn new(field: TaskSortField, order: SortOrder) -> Self {
        Self { field, order }
    }
}

/// Listing parameters for an owner's task board.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    /// Case-insensitive substring filter on the title.
    pub title: Option<String>,
    /// Sort specification.
    pub sort: TaskSort,
}

impl TaskQuery {
    /// Creates a query with default sort and no title filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the title substring filter.
    #[must_use]
    pub fn with_title_filter(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the sort specification.
    #[must_use]
    pub const fn with_sort(mut self, sort: TaskSort) -> Self {
        self.sort = sort;
        self
    }
}

/// A dependency edge resolved to its full prerequisite snapshot.
///
/// Soft deletion never scrubs row content, so a prerequisite resolves even
/// after it has been deactivated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDependency {
    /// The stored edge.
    pub edge: TaskDependency,
    /// Snapshot of the prerequisite task.
    pub prerequisite: Task,
}

/// A task together with its resolved dependency edge, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskWithPrerequisite {
    /// The task itself.
    pub task: Task,
    /// The task's single dependency edge, resolved.
    pub dependency: Option<ResolvedDependency>,
}

/// Header counts reported alongside an owner's task list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskCounts {
    /// Active tasks for the owner. Computed independently of the title
    /// filter so the header stays stable while the list is searched.
    pub active: u64,
    /// Done tasks for the owner, regardless of the `active` flag; a done
    /// row that was later deactivated still counts.
    pub completed: u64,
}

/// Task persistence contract.
///
/// Implementations must enforce at most one dependency edge per dependent
/// task at the storage layer; [`upsert_dependency`] replaces rather than
/// accumulates.
///
/// [`upsert_dependency`]: TaskRepository::upsert_dependency
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task row.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the task ID
    /// already exists.
    async fn create_task(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Finds a task by identifier, subject to the filter.
    ///
    /// Returns `None` when no row exists or the row fails the filter; the
    /// caller cannot distinguish the two, by design (ownership probing).
    async fn find_task(&self, id: TaskId, filter: &TaskFilter)
    -> TaskRepositoryResult<Option<Task>>;

    /// Persists changes to an existing task row.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::TaskNotFound`] when the row does not
    /// exist.
    async fn update_task(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Lists the owner's active tasks with resolved dependency edges.
    async fn list_tasks(
        &self,
        owner: UserId,
        query: &TaskQuery,
    ) -> TaskRepositoryResult<Vec<TaskWithPrerequisite>>;

    /// Counts tasks matching the filter.
    async fn count_tasks(&self, filter: &TaskFilter) -> TaskRepositoryResult<u64>;

    /// Returns the dependent task's single edge, if present.
    async fn find_dependency(
        &self,
        dependent: TaskId,
    ) -> TaskRepositoryResult<Option<TaskDependency>>;

    /// Inserts a dependency edge for a dependent with no existing edge.
    async fn create_dependency(
        &self,
        dependent: TaskId,
        prerequisite: TaskId,
    ) -> TaskRepositoryResult<TaskDependency>;

    /// Inserts or re-points the dependent's single edge.
    ///
    /// Replacing an existing edge keeps its identifier.
    async fn upsert_dependency(
        &self,
        dependent: TaskId,
        prerequisite: TaskId,
    ) -> TaskRepositoryResult<TaskDependency>;

    /// Removes a dependency edge.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DependencyNotFound`] when the edge
    /// does not exist.
    async fn delete_dependency(&self, id: DependencyId) -> TaskRepositoryResult<()>;

    /// Lists active recurring tasks whose next occurrence falls in the
    /// half-open range `[from, to)`.
    async fn list_due_recurring(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> TaskRepositoryResult<Vec<Task>>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task row was not found.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The dependency edge was not found.
    #[error("dependency not found: {0}")]
    DependencyNotFound(DependencyId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
