//! Port contracts for the task tracker.
//!
//! Ports define infrastructure-agnostic interfaces used by task services.

pub mod repository;

pub use repository::{
    ResolvedDependency, SortOrder, TaskCounts, TaskFilter, TaskQuery, TaskRepository,
    TaskRepositoryError, TaskRepositoryResult, TaskSort, TaskSortField, TaskWithPrerequisite,
};
