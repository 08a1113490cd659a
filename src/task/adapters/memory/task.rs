//! In-memory repository for task lifecycle tests and local runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::task::{
    domain::{DependencyId, Task, TaskDependency, TaskId, UserId},
    ports::{
        ResolvedDependency, SortOrder, TaskFilter, TaskQuery, TaskRepository, TaskRepositoryError,
        TaskRepositoryResult, TaskSort, TaskSortField, TaskWithPrerequisite,
    },
};

/// Thread-safe in-memory task repository.
///
/// Listing preserves insertion order for ties, matching the stable ordering
/// a sequential primary key gives a relational store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<InMemoryTaskState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: HashMap<TaskId, Task>,
    insertion_order: Vec<TaskId>,
    // Keyed by dependent id: the single-prerequisite invariant is
    // structural here.
    dependencies: HashMap<TaskId, TaskDependency>,
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> TaskRepositoryResult<RwLockReadGuard<'_, InMemoryTaskState>> {
        self.state
            .read()
            .map_err(|err| TaskRepositoryError::persistence(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> TaskRepositoryResult<RwLockWriteGuard<'_, InMemoryTaskState>> {
        self.state
            .write()
            .map_err(|err| TaskRepositoryError::persistence(std::io::Error::other(err.to_string())))
    }
}

fn compare(field: TaskSortField, a: &Task, b: &Task) -> Ordering {
    match field {
        TaskSortField::Title => a.title().as_str().cmp(b.title().as_str()),
        TaskSortField::Priority => a.priority().cmp(&b.priority()),
        TaskSortField::Status => a.status().cmp(&b.status()),
        TaskSortField::DueDate => a.due_date().cmp(&b.due_date()),
        TaskSortField::CreatedAt => a.created_at().cmp(&b.created_at()),
        TaskSortField::UpdatedAt => a.updated_at().cmp(&b.updated_at()),
    }
}

/// Stable single-key sort; descending reverses the key comparison only, so
/// ties keep insertion order either way.
fn sort_tasks(tasks: &mut [Task], sort: TaskSort) {
    match sort.order {
        SortOrder::Asc => tasks.sort_by(|a, b| compare(sort.field, a, b)),
        SortOrder::Desc => tasks.sort_by(|a, b| compare(sort.field, a, b).reverse()),
    }
}

fn resolve_dependency(
    state: &InMemoryTaskState,
    task: Task,
) -> TaskRepositoryResult<TaskWithPrerequisite> {
    let dependency = match state.dependencies.get(&task.id()) {
        Some(edge) => {
            let prerequisite = state
                .tasks
                .get(&edge.prerequisite_id())
                .cloned()
                .ok_or_else(|| {
                    TaskRepositoryError::persistence(std::io::Error::other(format!(
                        "dangling prerequisite {}",
                        edge.prerequisite_id()
                    )))
                })?;
            Some(ResolvedDependency {
                edge: *edge,
                prerequisite,
            })
        }
        None => None,
    };
    Ok(TaskWithPrerequisite { task, dependency })
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn create_task(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        if state.tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id()));
        }
        state.insertion_order.push(task.id());
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn find_task(
        &self,
        id: TaskId,
        filter: &TaskFilter,
    ) -> TaskRepositoryResult<Option<Task>> {
        let state = self.read()?;
        Ok(state
            .tasks
            .get(&id)
            .filter(|task| filter.matches(task))
            .cloned())
    }

    async fn update_task(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        if !state.tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::TaskNotFound(task.id()));
        }
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn list_tasks(
        &self,
        owner: UserId,
        query: &TaskQuery,
    ) -> TaskRepositoryResult<Vec<TaskWithPrerequisite>> {
        let state = self.read()?;
        let needle = query.title.as_ref().map(|title| title.to_lowercase());

        let mut tasks: Vec<Task> = state
            .insertion_order
            .iter()
            .filter_map(|id| state.tasks.get(id))
            .filter(|task| task.is_active() && task.owner_id() == owner)
            .filter(|task| {
                needle
                    .as_ref()
                    .is_none_or(|n| task.title().as_str().to_lowercase().contains(n.as_str()))
            })
            .cloned()
            .collect();
        sort_tasks(&mut tasks, query.sort);

        tasks
            .into_iter()
            .map(|task| resolve_dependency(&state, task))
            .collect()
    }

    async fn count_tasks(&self, filter: &TaskFilter) -> TaskRepositoryResult<u64> {
        let state = self.read()?;
        let count = state
            .tasks
            .values()
            .filter(|task| filter.matches(task))
            .count();
        u64::try_from(count).map_err(TaskRepositoryError::persistence)
    }

    async fn find_dependency(
        &self,
        dependent: TaskId,
    ) -> TaskRepositoryResult<Option<TaskDependency>> {
        let state = self.read()?;
        Ok(state.dependencies.get(&dependent).copied())
    }

    async fn create_dependency(
        &self,
        dependent: TaskId,
        prerequisite: TaskId,
    ) -> TaskRepositoryResult<TaskDependency> {
        let mut state = self.write()?;
        if state.dependencies.contains_key(&dependent) {
            return Err(TaskRepositoryError::persistence(std::io::Error::other(
                format!("dependent {dependent} already has a dependency edge"),
            )));
        }
        let edge = TaskDependency::new(dependent, prerequisite);
        state.dependencies.insert(dependent, edge);
        Ok(edge)
    }

    async fn upsert_dependency(
        &self,
        dependent: TaskId,
        prerequisite: TaskId,
    ) -> TaskRepositoryResult<TaskDependency> {
        let mut state = self.write()?;
        let edge = state
            .dependencies
            .entry(dependent)
            .and_modify(|existing| existing.replace_prerequisite(prerequisite))
            .or_insert_with(|| TaskDependency::new(dependent, prerequisite));
        Ok(*edge)
    }

    async fn delete_dependency(&self, id: DependencyId) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        let dependent = state
            .dependencies
            .values()
            .find(|edge| edge.id() == id)
            .map(TaskDependency::dependent_id)
            .ok_or(TaskRepositoryError::DependencyNotFound(id))?;
        state.dependencies.remove(&dependent);
        Ok(())
    }

    async fn list_due_recurring(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read()?;
        Ok(state
            .insertion_order
            .iter()
            .filter_map(|id| state.tasks.get(id))
            .filter(|task| task.is_active() && task.recurrence().is_recurring())
            .filter(|task| {
                task.next_recurrence()
                    .is_some_and(|next| next >= from && next < to)
            })
            .cloned()
            .collect())
    }
}
