//! Service layer for task creation, editing, deletion, listing, and status
//! transitions.
//!
//! The lifecycle service is the single writer of task state: every
//! cross-field invariant (fresh recurrence derivation, prerequisite
//! validation, the dependency guard on completion, soft-delete
//! immutability) is enforced here, on top of the repository port.

use crate::task::{
    domain::{Priority, Recurrence, Task, TaskDomainError, TaskId, TaskStatus, TaskTitle, UserId},
    ports::{
        ResolvedDependency, TaskCounts, TaskFilter, TaskQuery, TaskRepository, TaskRepositoryError,
        TaskWithPrerequisite,
    },
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Input payload shared by task creation and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskForm {
    title: String,
    priority: Priority,
    recurrence: Recurrence,
    due_date: DateTime<Utc>,
    prerequisite: Option<TaskId>,
}

impl TaskForm {
    /// Creates a form with required fields and no prerequisite.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        priority: Priority,
        recurrence: Recurrence,
        due_date: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            priority,
            recurrence,
            due_date,
            prerequisite: None,
        }
    }

    /// Declares the task dependent on the given prerequisite.
    #[must_use]
    pub const fn with_prerequisite(mut self, prerequisite: TaskId) -> Self {
        self.prerequisite = Some(prerequisite);
        self
    }
}

/// An owner's task list with header counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskBoard {
    /// Active tasks with resolved dependency edges, in the requested order.
    pub tasks: Vec<TaskWithPrerequisite>,
    /// Header counts, computed independently of the title filter.
    pub counts: TaskCounts,
}

/// Service-level errors for task lifecycle operations.
///
/// `NotFound` and `PrerequisiteIncomplete` stay distinct, matchable
/// variants so an HTTP layer can map them to 404 and 409 respectively;
/// everything else is a generic failure.
#[derive(Debug, Error)]
pub enum TaskLifecycleError {
    /// The task does not exist, is soft-deleted, is not owned by the
    /// caller, or is immutable for the attempted operation.
    #[error("task {0} not found")]
    NotFound(TaskId),

    /// The referenced prerequisite does not exist for this owner.
    #[error("prerequisite task {0} not found")]
    PrerequisiteNotFound(TaskId),

    /// A task cannot be its own prerequisite.
    #[error("task {0} cannot depend on itself")]
    SelfDependency(TaskId),

    /// Completion is blocked by an incomplete prerequisite.
    #[error("task {task} has an incomplete prerequisite {prerequisite}")]
    PrerequisiteIncomplete {
        /// The task being completed.
        task: TaskId,
        /// The prerequisite still not done.
        prerequisite: TaskId,
    },

    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
}

/// Result type for task lifecycle service operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;

/// Task lifecycle orchestration service.
#[derive(Clone)]
pub struct TaskLifecycleService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> TaskLifecycleService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new task lifecycle service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Creates a new task for `owner`, optionally with a prerequisite.
    ///
    /// The next occurrence date is derived from the form's recurrence and
    /// due date. The prerequisite, when given, must already exist and
    /// belong to the same owner.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError`] when validation fails or the
    /// repository rejects persistence.
    pub async fn create(
        &self,
        form: TaskForm,
        owner: UserId,
    ) -> TaskLifecycleResult<TaskWithPrerequisite> {
        let title = TaskTitle::new(form.title)?;
        let prerequisite = match form.prerequisite {
            Some(id) => Some(self.require_prerequisite(id, owner).await?),
            None => None,
        };

        let task = Task::new(
            title,
            form.priority,
            form.recurrence,
            form.due_date,
            owner,
            &*self.clock,
        )?;
        self.repository.create_task(&task).await?;

        let dependency = match prerequisite {
            Some(prerequisite_task) => {
                let edge = self
                    .repository
                    .create_dependency(task.id(), prerequisite_task.id())
                    .await?;
                Some(ResolvedDependency {
                    edge,
                    prerequisite: prerequisite_task,
                })
            }
            None => None,
        };

        Ok(TaskWithPrerequisite { task, dependency })
    }

    /// Rewrites an existing task and reconciles its dependency edge.
    ///
    /// The task must be active, owned by `owner`, and not done. The next
    /// occurrence date is always freshly derived from the form. A present
    /// prerequisite adds or re-points the single edge; an absent one
    /// removes any existing edge.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] when the precondition
    /// fails, [`TaskLifecycleError::PrerequisiteNotFound`] or
    /// [`TaskLifecycleError::SelfDependency`] for an invalid prerequisite,
    /// and repository/domain errors otherwise.
    pub async fn update(
        &self,
        task_id: TaskId,
        form: TaskForm,
        owner: UserId,
    ) -> TaskLifecycleResult<TaskWithPrerequisite> {
        let mut task = self
            .repository
            .find_task(task_id, &TaskFilter::editable(owner))
            .await?
            .ok_or(TaskLifecycleError::NotFound(task_id))?;

        let title = TaskTitle::new(form.title)?;
        let prerequisite = match form.prerequisite {
            Some(id) => {
                if id == task_id {
                    return Err(TaskLifecycleError::SelfDependency(task_id));
                }
                Some(self.require_prerequisite(id, owner).await?)
            }
            None => None,
        };

        task.apply_edit(
            title,
            form.priority,
            form.recurrence,
            form.due_date,
            &*self.clock,
        )?;
        self.repository.update_task(&task).await?;

        let dependency = match prerequisite {
            Some(prerequisite_task) => {
                let edge = self
                    .repository
                    .upsert_dependency(task_id, prerequisite_task.id())
                    .await?;
                Some(ResolvedDependency {
                    edge,
                    prerequisite: prerequisite_task,
                })
            }
            None => {
                if let Some(edge) = self.repository.find_dependency(task_id).await? {
                    self.repository.delete_dependency(edge.id()).await?;
                }
                None
            }
        };

        Ok(TaskWithPrerequisite { task, dependency })
    }

    /// Soft-deletes a task.
    ///
    /// The precondition matches [`update`](Self::update): done tasks cannot
    /// be deleted, which falls out of the editability filter rather than a
    /// separate conflict path. The row is kept so historical dependency
    /// edges still resolve.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] when the precondition
    /// fails.
    pub async fn delete(&self, task_id: TaskId, owner: UserId) -> TaskLifecycleResult<()> {
        let mut task = self
            .repository
            .find_task(task_id, &TaskFilter::editable(owner))
            .await?
            .ok_or(TaskLifecycleError::NotFound(task_id))?;

        task.deactivate(&*self.clock);
        self.repository.update_task(&task).await?;
        Ok(())
    }

    /// Lists the owner's active tasks with header counts.
    ///
    /// The counts deliberately ignore the title filter, and the completed
    /// count ignores the `active` flag; see [`TaskCounts`].
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when listing or counting
    /// fails.
    pub async fn my_tasks(
        &self,
        owner: UserId,
        query: &TaskQuery,
    ) -> TaskLifecycleResult<TaskBoard> {
        let tasks = self.repository.list_tasks(owner, query).await?;
        let active = self
            .repository
            .count_tasks(&TaskFilter::active_owned(owner))
            .await?;
        let completed = self
            .repository
            .count_tasks(&TaskFilter::owned(owner).with_status(TaskStatus::Done))
            .await?;

        Ok(TaskBoard {
            tasks,
            counts: TaskCounts { active, completed },
        })
    }

    /// Toggles a task's completion state and returns the new status.
    ///
    /// Completing a task (not-done to done) is blocked while its single
    /// prerequisite, if any, is itself not done. Reopening (done to
    /// not-done) has no guard. The prerequisite lookup is unfiltered: a
    /// done prerequisite satisfies the guard even after soft deletion.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] when the task is missing,
    /// inactive, or foreign-owned, and
    /// [`TaskLifecycleError::PrerequisiteIncomplete`] when the guard
    /// blocks completion; the task is left unchanged in both cases.
    pub async fn toggle_status(
        &self,
        task_id: TaskId,
        owner: UserId,
    ) -> TaskLifecycleResult<TaskStatus> {
        let mut task = self
            .repository
            .find_task(task_id, &TaskFilter::active_owned(owner))
            .await?
            .ok_or(TaskLifecycleError::NotFound(task_id))?;

        if task.status() == TaskStatus::NotDone {
            if let Some(edge) = self.repository.find_dependency(task_id).await? {
                let prerequisite = self
                    .repository
                    .find_task(edge.prerequisite_id(), &TaskFilter::any())
                    .await?;
                if prerequisite.is_some_and(|p| p.status() == TaskStatus::NotDone) {
                    return Err(TaskLifecycleError::PrerequisiteIncomplete {
                        task: task_id,
                        prerequisite: edge.prerequisite_id(),
                    });
                }
            }
        }

        let status = task.toggle_status(&*self.clock);
        self.repository.update_task(&task).await?;
        Ok(status)
    }

    /// Looks up a prerequisite that must exist and belong to `owner`.
    ///
    /// The prerequisite's status and `active` flag are deliberately not
    /// constrained: depending on a done or soft-deleted task is allowed.
    async fn require_prerequisite(&self, id: TaskId, owner: UserId) -> TaskLifecycleResult<Task> {
        self.repository
            .find_task(id, &TaskFilter::owned(owner))
            .await?
            .ok_or(TaskLifecycleError::PrerequisiteNotFound(id))
    }
}
