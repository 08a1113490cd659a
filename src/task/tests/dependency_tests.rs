//! Tests for prerequisite edges: creation, reconciliation on update, and
//! the completion guard.

use std::sync::Arc;

use crate::task::{
    adapters::memory::InMemoryTaskRepository,
    domain::{Priority, Recurrence, TaskId, TaskStatus, UserId},
    ports::{TaskFilter, TaskRepository},
    services::{TaskForm, TaskLifecycleError, TaskLifecycleService},
};
use chrono::{DateTime, TimeZone, Utc};
use eyre::{OptionExt, Result};
use mockable::DefaultClock;
use rstest::{fixture, rstest};

struct Harness {
    repository: Arc<InMemoryTaskRepository>,
    service: TaskLifecycleService<InMemoryTaskRepository, DefaultClock>,
}

impl Harness {
    async fn create_task(&self, title: &str, owner: UserId) -> Result<TaskId> {
        let created = self.service.create(form(title), owner).await?;
        Ok(created.task.id())
    }
}

#[fixture]
fn harness() -> Harness {
    let repository = Arc::new(InMemoryTaskRepository::new());
    let service = TaskLifecycleService::new(Arc::clone(&repository), Arc::new(DefaultClock));
    Harness {
        repository,
        service,
    }
}

fn due() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 5, 10, 0, 0)
        .single()
        .expect("valid test date")
}

fn form(title: &str) -> TaskForm {
    TaskForm::new(title, Priority::Medium, Recurrence::None, due())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_with_prerequisite_resolves_the_edge(harness: Harness) -> Result<()> {
    let owner = UserId::new();
    let first = harness.create_task("Lay foundation", owner).await?;

    let dependent = harness
        .service
        .create(form("Raise walls").with_prerequisite(first), owner)
        .await?;

    let dependency = dependent
        .dependency
        .ok_or_eyre("dependency should be resolved")?;
    assert_eq!(dependency.prerequisite.id(), first);
    assert_eq!(dependency.edge.dependent_id(), dependent.task.id());
    assert_eq!(dependency.edge.prerequisite_id(), first);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn completion_is_blocked_while_prerequisite_is_not_done(harness: Harness) -> Result<()> {
    let owner = UserId::new();
    let first = harness.create_task("Lay foundation", owner).await?;
    let second = harness
        .service
        .create(form("Raise walls").with_prerequisite(first), owner)
        .await?
        .task
        .id();

    let blocked = harness.service.toggle_status(second, owner).await;
    assert!(matches!(
        blocked,
        Err(TaskLifecycleError::PrerequisiteIncomplete { task, prerequisite })
            if task == second && prerequisite == first
    ));

    // The blocked task is left unchanged.
    let stored = harness
        .repository
        .find_task(second, &TaskFilter::any())
        .await?
        .ok_or_eyre("dependent task")?;
    assert_eq!(stored.status(), TaskStatus::NotDone);

    harness.service.toggle_status(first, owner).await?;
    let status = harness.service.toggle_status(second, owner).await?;
    assert_eq!(status, TaskStatus::Done);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn update_without_prerequisite_removes_the_edge(harness: Harness) -> Result<()> {
    let owner = UserId::new();
    let first = harness.create_task("Lay foundation", owner).await?;
    let second = harness
        .service
        .create(form("Raise walls").with_prerequisite(first), owner)
        .await?
        .task
        .id();

    let updated = harness
        .service
        .update(second, form("Raise walls"), owner)
        .await?;
    assert!(updated.dependency.is_none());
    assert!(harness.repository.find_dependency(second).await?.is_none());

    // A later edit may introduce a different prerequisite again.
    let third = harness.create_task("Order windows", owner).await?;
    let repointed = harness
        .service
        .update(second, form("Raise walls").with_prerequisite(third), owner)
        .await?;
    let dependency = repointed.dependency.ok_or_eyre("edge should exist")?;
    assert_eq!(dependency.prerequisite.id(), third);

    let edge = harness
        .repository
        .find_dependency(second)
        .await?
        .ok_or_eyre("stored edge")?;
    assert_eq!(edge.prerequisite_id(), third);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn replacing_the_prerequisite_keeps_the_edge_identity(harness: Harness) -> Result<()> {
    let owner = UserId::new();
    let first = harness.create_task("Lay foundation", owner).await?;
    let third = harness.create_task("Order windows", owner).await?;
    let second = harness
        .service
        .create(form("Raise walls").with_prerequisite(first), owner)
        .await?;

    let original_edge = second.dependency.ok_or_eyre("initial edge")?.edge;
    let repointed = harness
        .service
        .update(
            second.task.id(),
            form("Raise walls").with_prerequisite(third),
            owner,
        )
        .await?;

    let edge = repointed.dependency.ok_or_eyre("replaced edge")?.edge;
    assert_eq!(edge.id(), original_edge.id());
    assert_eq!(edge.prerequisite_id(), third);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_prerequisite_is_rejected(harness: Harness) {
    let owner = UserId::new();
    let missing = TaskId::new();

    let result = harness
        .service
        .create(form("Raise walls").with_prerequisite(missing), owner)
        .await;

    assert!(matches!(
        result,
        Err(TaskLifecycleError::PrerequisiteNotFound(id)) if id == missing
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn foreign_prerequisite_is_rejected(harness: Harness) -> Result<()> {
    let owner = UserId::new();
    let stranger = UserId::new();
    let foreign = harness.create_task("Not yours", stranger).await?;

    let result = harness
        .service
        .create(form("Raise walls").with_prerequisite(foreign), owner)
        .await;

    assert!(matches!(
        result,
        Err(TaskLifecycleError::PrerequisiteNotFound(id)) if id == foreign
    ));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn a_task_cannot_depend_on_itself(harness: Harness) -> Result<()> {
    let owner = UserId::new();
    let task = harness.create_task("Bootstrap", owner).await?;

    let result = harness
        .service
        .update(task, form("Bootstrap").with_prerequisite(task), owner)
        .await;

    assert!(matches!(
        result,
        Err(TaskLifecycleError::SelfDependency(id)) if id == task
    ));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reopening_a_done_task_is_never_guarded(harness: Harness) -> Result<()> {
    let owner = UserId::new();
    let first = harness.create_task("Lay foundation", owner).await?;
    let second = harness
        .service
        .create(form("Raise walls").with_prerequisite(first), owner)
        .await?
        .task
        .id();

    harness.service.toggle_status(first, owner).await?;
    harness.service.toggle_status(second, owner).await?;

    // Reopen the prerequisite first, then the dependent: the guard only
    // applies on the way to done.
    harness.service.toggle_status(first, owner).await?;
    let status = harness.service.toggle_status(second, owner).await?;
    assert_eq!(status, TaskStatus::NotDone);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn a_soft_deleted_task_can_still_serve_as_prerequisite(harness: Harness) -> Result<()> {
    let owner = UserId::new();
    let first = harness.create_task("Old groundwork", owner).await?;
    harness.service.toggle_status(first, owner).await?;

    // Completed work can no longer be deleted through the service, so the
    // historical row is detached directly.
    let mut row = harness
        .repository
        .find_task(first, &TaskFilter::any())
        .await?
        .ok_or_eyre("prerequisite row")?;
    row.deactivate(&DefaultClock);
    harness.repository.update_task(&row).await?;

    let dependent = harness
        .service
        .create(form("Raise walls").with_prerequisite(first), owner)
        .await?;
    assert!(dependent.dependency.is_some());

    // The done-but-deleted prerequisite satisfies the completion guard.
    let status = harness
        .service
        .toggle_status(dependent.task.id(), owner)
        .await?;
    assert_eq!(status, TaskStatus::Done);
    Ok(())
}
