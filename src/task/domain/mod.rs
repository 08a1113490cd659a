//! Domain model for the task tracker.
//!
//! The task domain models owned actionable items with priority, due dates,
//! optional recurrence, and an optional single prerequisite, while keeping
//! all infrastructure concerns outside of the domain boundary.

mod error;
mod ids;
mod recurrence;
mod task;

pub use error::{ParseEnumError, TaskDomainError};
pub use ids::{DependencyId, TaskId, UserId};
pub use recurrence::next_occurrence;
pub use task::{
    PersistedDependencyData, PersistedTaskData, Priority, Recurrence, Task, TaskDependency,
    TaskStatus, TaskTitle,
};
