//! `PostgreSQL` repository implementation for task storage.

use super::{
    models::{DependencyRow, TaskRow},
    schema::{task_dependencies, tasks},
};
use crate::task::{
    domain::{
        DependencyId, PersistedDependencyData, PersistedTaskData, Priority, Recurrence, Task,
        TaskDependency, TaskId, TaskStatus, TaskTitle, UserId,
    },
    ports::{
        ResolvedDependency, SortOrder, TaskFilter, TaskQuery, TaskRepository, TaskRepositoryError,
        TaskRepositoryResult, TaskSort, TaskSortField, TaskWithPrerequisite,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::sql;
use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::Integer;
use std::collections::HashMap;
use uuid::Uuid;

/// `PostgreSQL` connection pool type used by task adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

type BoxedTaskQuery<'a> = tasks::BoxedQuery<'a, Pg>;

/// `PostgreSQL`-backed task repository.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: TaskPgPool,
}

impl PostgresTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskRepositoryError::persistence)?
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn create_task(&self, task: &Task) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let row = task_to_row(task);

        self.run_blocking(move |connection| {
            diesel::insert_into(tasks::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        TaskRepositoryError::DuplicateTask(task_id)
                    }
                    _ => TaskRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_task(
        &self,
        id: TaskId,
        filter: &TaskFilter,
    ) -> TaskRepositoryResult<Option<Task>> {
        let lookup_filter = *filter;
        self.run_blocking(move |connection| {
            let row = filtered(&lookup_filter)
                .filter(tasks::id.eq(id.into_inner()))
                .first::<TaskRow>(connection)
                .optional()
                .map_err(TaskRepositoryError::persistence)?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn update_task(&self, task: &Task) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let row = task_to_row(task);

        self.run_blocking(move |connection| {
            let updated = diesel::update(tasks::table.find(task_id.into_inner()))
                .set(&row)
                .execute(connection)
                .map_err(TaskRepositoryError::persistence)?;
            if updated == 0 {
                return Err(TaskRepositoryError::TaskNotFound(task_id));
            }
            Ok(())
        })
        .await
    }

    async fn list_tasks(
        &self,
        owner: UserId,
        query: &TaskQuery,
    ) -> TaskRepositoryResult<Vec<TaskWithPrerequisite>> {
        let owner_uuid = owner.into_inner();
        let list_query = query.clone();

        self.run_blocking(move |connection| {
            let mut statement = tasks::table
                .into_boxed()
                .filter(tasks::active.eq(true))
                .filter(tasks::owner_id.eq(owner_uuid));
            if let Some(title) = &list_query.title {
                statement = statement.filter(tasks::title.ilike(format!("%{}%", escape_like(title))));
            }
            statement = apply_sort(statement, list_query.sort);

            let rows: Vec<TaskRow> = statement
                .load(connection)
                .map_err(TaskRepositoryError::persistence)?;
            resolve_dependencies(connection, rows)
        })
        .await
    }

    async fn count_tasks(&self, filter: &TaskFilter) -> TaskRepositoryResult<u64> {
        let count_filter = *filter;
        self.run_blocking(move |connection| {
            let count: i64 = filtered(&count_filter)
                .count()
                .get_result(connection)
                .map_err(TaskRepositoryError::persistence)?;
            u64::try_from(count).map_err(TaskRepositoryError::persistence)
        })
        .await
    }

    async fn find_dependency(
        &self,
        dependent: TaskId,
    ) -> TaskRepositoryResult<Option<TaskDependency>> {
        self.run_blocking(move |connection| {
            let row = task_dependencies::table
                .filter(task_dependencies::dependent_id.eq(dependent.into_inner()))
                .first::<DependencyRow>(connection)
                .optional()
                .map_err(TaskRepositoryError::persistence)?;
            Ok(row.map(row_to_dependency))
        })
        .await
    }

    async fn create_dependency(
        &self,
        dependent: TaskId,
        prerequisite: TaskId,
    ) -> TaskRepositoryResult<TaskDependency> {
        let edge = TaskDependency::new(dependent, prerequisite);
        let row = dependency_to_row(&edge);

        self.run_blocking(move |connection| {
            diesel::insert_into(task_dependencies::table)
                .values(&row)
                .execute(connection)
                .map_err(TaskRepositoryError::persistence)?;
            Ok(edge)
        })
        .await
    }

    async fn upsert_dependency(
        &self,
        dependent: TaskId,
        prerequisite: TaskId,
    ) -> TaskRepositoryResult<TaskDependency> {
        let row = dependency_to_row(&TaskDependency::new(dependent, prerequisite));

        self.run_blocking(move |connection| {
            // The unique index on dependent_id makes this replace rather
            // than accumulate; an existing edge keeps its id.
            let stored: DependencyRow = diesel::insert_into(task_dependencies::table)
                .values(&row)
                .on_conflict(task_dependencies::dependent_id)
                .do_update()
                .set(task_dependencies::prerequisite_id.eq(row.prerequisite_id))
                .get_result(connection)
                .map_err(TaskRepositoryError::persistence)?;
            Ok(row_to_dependency(stored))
        })
        .await
    }

    async fn delete_dependency(&self, id: DependencyId) -> TaskRepositoryResult<()> {
        self.run_blocking(move |connection| {
            let deleted = diesel::delete(task_dependencies::table.find(id.into_inner()))
                .execute(connection)
                .map_err(TaskRepositoryError::persistence)?;
            if deleted == 0 {
                return Err(TaskRepositoryError::DependencyNotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn list_due_recurring(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> TaskRepositoryResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            let rows: Vec<TaskRow> = tasks::table
                .filter(tasks::active.eq(true))
                .filter(tasks::recurrence.ne(Recurrence::None.as_str()))
                .filter(tasks::next_recurrence.ge(Some(from)))
                .filter(tasks::next_recurrence.lt(Some(to)))
                .order(tasks::created_at.asc())
                .load(connection)
                .map_err(TaskRepositoryError::persistence)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }
}

fn filtered(filter: &TaskFilter) -> BoxedTaskQuery<'static> {
    let mut query = tasks::table.into_boxed();
    if let Some(active) = filter.active {
        query = query.filter(tasks::active.eq(active));
    }
    if let Some(owner) = filter.owner {
        query = query.filter(tasks::owner_id.eq(owner.into_inner()));
    }
    if let Some(status) = filter.status {
        query = query.filter(tasks::status.eq(status.as_str()));
    }
    query
}

/// Rank expression for the `priority` column: stored strings sort
/// lexicographically ("high" < "low" < "medium"), so urgency order needs an
/// explicit ranking to match the domain's `Priority` ordering.
const PRIORITY_RANK_SQL: &str =
    "CASE priority WHEN 'low' THEN 0 WHEN 'medium' THEN 1 ELSE 2 END";

/// Rank expression for the `status` column: "done" sorts before "not_done"
/// lexicographically, the opposite of the domain's `TaskStatus` ordering.
const STATUS_RANK_SQL: &str = "CASE status WHEN 'not_done' THEN 0 ELSE 1 END";

fn apply_sort(query: BoxedTaskQuery<'_>, sort: TaskSort) -> BoxedTaskQuery<'_> {
    match (sort.field, sort.order) {
        (TaskSortField::Title, SortOrder::Asc) => query.order(tasks::title.asc()),
        (TaskSortField::Title, SortOrder::Desc) => query.order(tasks::title.desc()),
        (TaskSortField::Priority, SortOrder::Asc) => {
            query.order(sql::<Integer>(PRIORITY_RANK_SQL).asc())
        }
        (TaskSortField::Priority, SortOrder::Desc) => {
            query.order(sql::<Integer>(PRIORITY_RANK_SQL).desc())
        }
        (TaskSortField::Status, SortOrder::Asc) => {
            query.order(sql::<Integer>(STATUS_RANK_SQL).asc())
        }
        (TaskSortField::Status, SortOrder::Desc) => {
            query.order(sql::<Integer>(STATUS_RANK_SQL).desc())
        }
        (TaskSortField::DueDate, SortOrder::Asc) => query.order(tasks::due_date.asc()),
        (TaskSortField::DueDate, SortOrder::Desc) => query.order(tasks::due_date.desc()),
        (TaskSortField::CreatedAt, SortOrder::Asc) => query.order(tasks::created_at.asc()),
        (TaskSortField::CreatedAt, SortOrder::Desc) => query.order(tasks::created_at.desc()),
        (TaskSortField::UpdatedAt, SortOrder::Asc) => query.order(tasks::updated_at.asc()),
        (TaskSortField::UpdatedAt, SortOrder::Desc) => query.order(tasks::updated_at.desc()),
    }
}

/// Escapes `LIKE` metacharacters so the title filter matches literally.
fn escape_like(pattern: &str) -> String {
    pattern
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn resolve_dependencies(
    connection: &mut PgConnection,
    rows: Vec<TaskRow>,
) -> TaskRepositoryResult<Vec<TaskWithPrerequisite>> {
    let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
    let edges: Vec<DependencyRow> = task_dependencies::table
        .filter(task_dependencies::dependent_id.eq_any(&ids))
        .load(connection)
        .map_err(TaskRepositoryError::persistence)?;

    let prerequisite_ids: Vec<Uuid> = edges.iter().map(|edge| edge.prerequisite_id).collect();
    let prerequisite_rows: Vec<TaskRow> = tasks::table
        .filter(tasks::id.eq_any(&prerequisite_ids))
        .load(connection)
        .map_err(TaskRepositoryError::persistence)?;
    let prerequisites: HashMap<Uuid, Task> = prerequisite_rows
        .into_iter()
        .map(|row| Ok((row.id, row_to_task(row)?)))
        .collect::<TaskRepositoryResult<_>>()?;
    let edge_by_dependent: HashMap<Uuid, DependencyRow> = edges
        .into_iter()
        .map(|edge| (edge.dependent_id, edge))
        .collect();

    rows.into_iter()
        .map(|row| {
            let dependency = edge_by_dependent
                .get(&row.id)
                .map(|edge| {
                    let prerequisite =
                        prerequisites
                            .get(&edge.prerequisite_id)
                            .cloned()
                            .ok_or_else(|| {
                                TaskRepositoryError::persistence(std::io::Error::other(format!(
                                    "dangling prerequisite {}",
                                    edge.prerequisite_id
                                )))
                            })?;
                    Ok::<_, TaskRepositoryError>(ResolvedDependency {
                        edge: row_to_dependency(*edge),
                        prerequisite,
                    })
                })
                .transpose()?;
            Ok(TaskWithPrerequisite {
                task: row_to_task(row)?,
                dependency,
            })
        })
        .collect()
}

fn task_to_row(task: &Task) -> TaskRow {
    TaskRow {
        id: task.id().into_inner(),
        title: task.title().as_str().to_owned(),
        priority: task.priority().as_str().to_owned(),
        status: task.status().as_str().to_owned(),
        due_date: task.due_date(),
        recurrence: task.recurrence().as_str().to_owned(),
        next_recurrence: task.next_recurrence(),
        active: task.is_active(),
        owner_id: task.owner_id().into_inner(),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    }
}

fn row_to_task(row: TaskRow) -> TaskRepositoryResult<Task> {
    let TaskRow {
        id,
        title,
        priority,
        status,
        due_date,
        recurrence,
        next_recurrence,
        active,
        owner_id,
        created_at,
        updated_at,
    } = row;

    let data = PersistedTaskData {
        id: TaskId::from_uuid(id),
        title: TaskTitle::new(title).map_err(TaskRepositoryError::persistence)?,
        priority: Priority::try_from(priority.as_str()).map_err(TaskRepositoryError::persistence)?,
        status: TaskStatus::try_from(status.as_str()).map_err(TaskRepositoryError::persistence)?,
        due_date,
        recurrence: Recurrence::try_from(recurrence.as_str())
            .map_err(TaskRepositoryError::persistence)?,
        next_recurrence,
        active,
        owner_id: UserId::from_uuid(owner_id),
        created_at,
        updated_at,
    };
    Ok(Task::from_persisted(data))
}

const fn dependency_to_row(edge: &TaskDependency) -> DependencyRow {
    DependencyRow {
        id: edge.id().into_inner(),
        dependent_id: edge.dependent_id().into_inner(),
        prerequisite_id: edge.prerequisite_id().into_inner(),
    }
}

const fn row_to_dependency(row: DependencyRow) -> TaskDependency {
    TaskDependency::from_persisted(PersistedDependencyData {
        id: DependencyId::from_uuid(row.id),
        dependent_id: TaskId::from_uuid(row.dependent_id),
        prerequisite_id: TaskId::from_uuid(row.prerequisite_id),
    })
}
