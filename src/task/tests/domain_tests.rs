//! Domain-focused tests for the task aggregate and its value types.

use crate::task::domain::{
    Priority, Recurrence, Task, TaskDomainError, TaskStatus, TaskTitle, UserId,
};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use mockable::DefaultClock;
use rstest::{fixture, rstest};

#[fixture]
fn clock() -> DefaultClock {
    DefaultClock
}

fn due() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 5, 10, 0, 0)
        .single()
        .expect("valid test date")
}

fn title(value: &str) -> TaskTitle {
    TaskTitle::new(value).expect("valid title")
}

#[rstest]
fn new_task_defaults_to_active_and_not_done(clock: DefaultClock) {
    let task = Task::new(
        title("Water the plants"),
        Priority::Medium,
        Recurrence::Daily,
        due(),
        UserId::new(),
        &clock,
    )
    .expect("task construction");

    assert_eq!(task.status(), TaskStatus::NotDone);
    assert!(task.is_active());
    assert_eq!(task.created_at(), task.updated_at());
    assert_eq!(task.next_recurrence(), Some(due() + TimeDelta::days(1)));
}

#[rstest]
fn new_task_without_recurrence_has_no_next_occurrence(clock: DefaultClock) {
    let task = Task::new(
        title("One-off errand"),
        Priority::Low,
        Recurrence::None,
        due(),
        UserId::new(),
        &clock,
    )
    .expect("task construction");

    assert_eq!(task.next_recurrence(), None);
}

#[rstest]
fn apply_edit_derives_next_occurrence_freshly(clock: DefaultClock) {
    let mut task = Task::new(
        title("Weekly review"),
        Priority::High,
        Recurrence::Weekly,
        due(),
        UserId::new(),
        &clock,
    )
    .expect("task construction");

    let new_due = due() + TimeDelta::days(3);
    task.apply_edit(
        title("Weekly review"),
        Priority::High,
        Recurrence::Daily,
        new_due,
        &clock,
    )
    .expect("edit");
    assert_eq!(task.next_recurrence(), Some(new_due + TimeDelta::days(1)));

    task.apply_edit(
        title("Weekly review"),
        Priority::High,
        Recurrence::None,
        new_due,
        &clock,
    )
    .expect("edit");
    assert_eq!(task.next_recurrence(), None);
}

#[rstest]
fn toggle_status_flips_both_ways(clock: DefaultClock) {
    let mut task = Task::new(
        title("Toggle me"),
        Priority::Low,
        Recurrence::None,
        due(),
        UserId::new(),
        &clock,
    )
    .expect("task construction");

    assert_eq!(task.toggle_status(&clock), TaskStatus::Done);
    assert_eq!(task.toggle_status(&clock), TaskStatus::NotDone);
}

#[rstest]
fn deactivate_keeps_row_content(clock: DefaultClock) {
    let mut task = Task::new(
        title("Soft delete me"),
        Priority::Medium,
        Recurrence::Weekly,
        due(),
        UserId::new(),
        &clock,
    )
    .expect("task construction");

    task.deactivate(&clock);

    assert!(!task.is_active());
    assert_eq!(task.title().as_str(), "Soft delete me");
    assert_eq!(task.next_recurrence(), Some(due() + TimeDelta::days(7)));
}

#[rstest]
fn next_instance_is_an_independent_sibling(clock: DefaultClock) {
    let owner = UserId::new();
    let task = Task::new(
        title("Daily standup"),
        Priority::High,
        Recurrence::Daily,
        due(),
        owner,
        &clock,
    )
    .expect("task construction");

    let successor = task.next_instance(&clock).expect("successor");

    assert_ne!(successor.id(), task.id());
    assert_eq!(successor.title(), task.title());
    assert_eq!(successor.priority(), task.priority());
    assert_eq!(successor.recurrence(), task.recurrence());
    assert_eq!(successor.owner_id(), owner);
    assert_eq!(successor.status(), TaskStatus::NotDone);
    assert_eq!(Some(successor.due_date()), task.next_recurrence());
    assert_eq!(
        successor.next_recurrence(),
        Some(successor.due_date() + TimeDelta::days(1))
    );
}

#[rstest]
fn next_instance_requires_a_recurring_task(clock: DefaultClock) {
    let task = Task::new(
        title("One-off"),
        Priority::Low,
        Recurrence::None,
        due(),
        UserId::new(),
        &clock,
    )
    .expect("task construction");

    let result = task.next_instance(&clock);
    assert_eq!(
        result,
        Err(TaskDomainError::MissingNextRecurrence(task.id()))
    );
}

#[rstest]
fn title_rejects_whitespace_only_values() {
    assert_eq!(TaskTitle::new("   "), Err(TaskDomainError::EmptyTitle));
    assert_eq!(TaskTitle::new(""), Err(TaskDomainError::EmptyTitle));
}

#[rstest]
fn title_trims_surrounding_whitespace() {
    let trimmed = TaskTitle::new("  Buy milk  ").expect("valid title");
    assert_eq!(trimmed.as_str(), "Buy milk");
}

#[rstest]
#[case(Priority::Low, "low")]
#[case(Priority::Medium, "medium")]
#[case(Priority::High, "high")]
fn priority_round_trips_through_storage_form(#[case] priority: Priority, #[case] raw: &str) {
    assert_eq!(priority.as_str(), raw);
    assert_eq!(Priority::try_from(raw), Ok(priority));
}

#[rstest]
#[case(Recurrence::None, "none")]
#[case(Recurrence::Daily, "daily")]
#[case(Recurrence::Weekly, "weekly")]
#[case(Recurrence::Monthly, "monthly")]
fn recurrence_round_trips_through_storage_form(#[case] recurrence: Recurrence, #[case] raw: &str) {
    assert_eq!(recurrence.as_str(), raw);
    assert_eq!(Recurrence::try_from(raw), Ok(recurrence));
}

#[rstest]
fn unknown_stored_values_fail_to_parse() {
    assert!(Priority::try_from("urgent").is_err());
    assert!(TaskStatus::try_from("paused").is_err());
    assert!(Recurrence::try_from("yearly").is_err());
}
