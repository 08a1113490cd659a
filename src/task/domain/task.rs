//! Task aggregate root and related task lifecycle types.

use super::{DependencyId, ParseEnumError, TaskDomainError, TaskId, UserId, next_occurrence};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task urgency level, ordered from least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Can wait.
    Low,
    /// Normal urgency.
    Medium,
    /// Needs attention first.
    High,
}

impl Priority {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl TryFrom<&str> for Priority {
    type Error = ParseEnumError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(ParseEnumError::new("priority", value)),
        }
    }
}

/// Task completion state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Work is outstanding.
    NotDone,
    /// Work is complete.
    Done,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotDone => "not_done",
            Self::Done => "done",
        }
    }

    /// Returns the opposite status.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::NotDone => Self::Done,
            Self::Done => Self::NotDone,
        }
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseEnumError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "not_done" => Ok(Self::NotDone),
            "done" => Ok(Self::Done),
            _ => Err(ParseEnumError::new("status", value)),
        }
    }
}

/// Recurrence cadence for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    /// One-off task.
    None,
    /// Repeats every calendar day.
    Daily,
    /// Repeats every seven calendar days.
    Weekly,
    /// Repeats every calendar month, clamping day-of-month overflow.
    Monthly,
}

impl Recurrence {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    /// Returns `true` for any cadence other than [`Recurrence::None`].
    #[must_use]
    pub const fn is_recurring(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl TryFrom<&str> for Recurrence {
    type Error = ParseEnumError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            _ => Err(ParseEnumError::new("recurrence", value)),
        }
    }
}

/// Validated non-empty task title.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskTitle(String);

impl TaskTitle {
    /// Creates a validated title, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] if the value is empty after
    /// trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyTitle);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the title as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TaskTitle {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for TaskTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Task aggregate root.
///
/// The `next_recurrence` field is present if and only if `recurrence` is not
/// [`Recurrence::None`]; every assignment flows through
/// [`next_occurrence`](super::next_occurrence), so the invariant holds
/// structurally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    title: TaskTitle,
    priority: Priority,
    status: TaskStatus,
    due_date: DateTime<Utc>,
    recurrence: Recurrence,
    next_recurrence: Option<DateTime<Utc>>,
    active: bool,
    owner_id: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted title.
    pub title: TaskTitle,
    /// Persisted priority.
    pub priority: Priority,
    /// Persisted completion state.
    pub status: TaskStatus,
    /// Persisted due date.
    pub due_date: DateTime<Utc>,
    /// Persisted recurrence cadence.
    pub recurrence: Recurrence,
    /// Persisted next occurrence date, if recurring.
    pub next_recurrence: Option<DateTime<Utc>>,
    /// Persisted soft-deletion flag (`false` once deleted).
    pub active: bool,
    /// Persisted owner identifier.
    pub owner_id: UserId,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new active, not-done task owned by `owner_id`.
    ///
    /// The next occurrence date is derived from the recurrence cadence and
    /// the due date.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::DateOutOfRange`] when the next occurrence
    /// cannot be represented.
    pub fn new(
        title: TaskTitle,
        priority: Priority,
        recurrence: Recurrence,
        due_date: DateTime<Utc>,
        owner_id: UserId,
        clock: &impl Clock,
    ) -> Result<Self, TaskDomainError> {
        let next_recurrence = next_occurrence(recurrence, due_date)?;
        let timestamp = clock.utc();
        Ok(Self {
            id: TaskId::new(),
            title,
            priority,
            status: TaskStatus::NotDone,
            due_date,
            recurrence,
            next_recurrence,
            active: true,
            owner_id,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            priority: data.priority,
            status: data.status,
            due_date: data.due_date,
            recurrence: data.recurrence,
            next_recurrence: data.next_recurrence,
            active: data.active,
            owner_id: data.owner_id,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the task title.
    #[must_use]
    pub const fn title(&self) -> &TaskTitle {
        &self.title
    }

    /// Returns the task priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the completion state.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the due date.
    #[must_use]
    pub const fn due_date(&self) -> DateTime<Utc> {
        self.due_date
    }

    /// Returns the recurrence cadence.
    #[must_use]
    pub const fn recurrence(&self) -> Recurrence {
        self.recurrence
    }

    /// Returns the next occurrence date, present iff the task recurs.
    #[must_use]
    pub const fn next_recurrence(&self) -> Option<DateTime<Utc>> {
        self.next_recurrence
    }

    /// Returns `false` once the task has been soft-deleted.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Returns the owning user's identifier.
    #[must_use]
    pub const fn owner_id(&self) -> UserId {
        self.owner_id
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest mutation timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Rewrites the editable fields of the task.
    ///
    /// The next occurrence date is always freshly derived from the new
    /// recurrence cadence and due date, never carried over from the stored
    /// value.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::DateOutOfRange`] when the next occurrence
    /// cannot be represented; the task is left unchanged in that case.
    pub fn apply_edit(
        &mut self,
        title: TaskTitle,
        priority: Priority,
        recurrence: Recurrence,
        due_date: DateTime<Utc>,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        let next_recurrence = next_occurrence(recurrence, due_date)?;
        self.title = title;
        self.priority = priority;
        self.recurrence = recurrence;
        self.due_date = due_date;
        self.next_recurrence = next_recurrence;
        self.touch(clock);
        Ok(())
    }

    /// Flips the completion state and returns the new status.
    ///
    /// The dependency guard on the not-done-to-done transition is enforced
    /// by the lifecycle service, which has access to the prerequisite row.
    pub fn toggle_status(&mut self, clock: &impl Clock) -> TaskStatus {
        self.status = self.status.toggled();
        self.touch(clock);
        self.status
    }

    /// Soft-deletes the task.
    ///
    /// The row's content is kept so that historical dependency edges still
    /// resolve; only the `active` flag changes.
    pub fn deactivate(&mut self, clock: &impl Clock) {
        self.active = false;
        self.touch(clock);
    }

    /// Builds the successor instance of a recurring task.
    ///
    /// The successor shares title, priority, recurrence, and owner; its due
    /// date is this task's next occurrence date, its status is reset to
    /// not-done, and its own next occurrence is derived afresh. This task is
    /// left untouched - recurrence produces independent sibling tasks, not a
    /// chained history.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::MissingNextRecurrence`] if the task has no
    /// next occurrence date, or [`TaskDomainError::DateOutOfRange`] when the
    /// successor's occurrence cannot be represented.
    pub fn next_instance(&self, clock: &impl Clock) -> Result<Self, TaskDomainError> {
        let due_date = self
            .next_recurrence
            .ok_or(TaskDomainError::MissingNextRecurrence(self.id))?;
        Self::new(
            self.title.clone(),
            self.priority,
            self.recurrence,
            due_date,
            self.owner_id,
            clock,
        )
    }

    /// Updates the `updated_at` timestamp to the current clock time.
    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}

/// Single dependency edge: the dependent task cannot be marked done until
/// the prerequisite task is done.
///
/// A dependent carries at most one edge; repositories key edges by the
/// dependent identifier so the single-prerequisite invariant is structural.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDependency {
    id: DependencyId,
    dependent_id: TaskId,
    prerequisite_id: TaskId,
}

/// Parameter object for reconstructing a persisted dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistedDependencyData {
    /// Persisted edge identifier.
    pub id: DependencyId,
    /// Persisted dependent task identifier.
    pub dependent_id: TaskId,
    /// Persisted prerequisite task identifier.
    pub prerequisite_id: TaskId,
}

impl TaskDependency {
    /// Creates a new dependency edge.
    #[must_use]
    pub fn new(dependent_id: TaskId, prerequisite_id: TaskId) -> Self {
        Self {
            id: DependencyId::new(),
            dependent_id,
            prerequisite_id,
        }
    }

    /// Reconstructs an edge from persisted storage.
    #[must_use]
    pub const fn from_persisted(data: PersistedDependencyData) -> Self {
        Self {
            id: data.id,
            dependent_id: data.dependent_id,
            prerequisite_id: data.prerequisite_id,
        }
    }

    /// Returns the edge identifier.
    #[must_use]
    pub const fn id(&self) -> DependencyId {
        self.id
    }

    /// Returns the dependent task's identifier.
    #[must_use]
    pub const fn dependent_id(&self) -> TaskId {
        self.dependent_id
    }

    /// Returns the prerequisite task's identifier.
    #[must_use]
    pub const fn prerequisite_id(&self) -> TaskId {
        self.prerequisite_id
    }

    /// Re-points the edge at a different prerequisite, keeping the edge id.
    pub const fn replace_prerequisite(&mut self, prerequisite_id: TaskId) {
        self.prerequisite_id = prerequisite_id;
    }
}
