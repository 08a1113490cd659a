//! Daily recurrence rollover: materialises successor instances for
//! recurring tasks whose next occurrence date has arrived.

use crate::task::{
    domain::{Task, TaskDomainError},
    ports::TaskRepository,
    services::{TaskLifecycleError, TaskLifecycleResult},
};
use chrono::{DateTime, NaiveTime, TimeDelta, Utc};
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Outcome of one rollover run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RolloverReport {
    /// Recurring tasks whose next occurrence fell in today's window.
    pub due: usize,
    /// Successor tasks created.
    pub created: usize,
    /// Due tasks skipped because of an individual failure. A failed task is
    /// not retried: its next occurrence is never advanced, so it leaves the
    /// window on subsequent runs until fixed manually.
    pub failed: usize,
}

/// Periodic job that rolls recurring tasks over into fresh instances.
///
/// Each due task yields an independent sibling task (same title, priority,
/// recurrence, and owner; due date set to the old next occurrence; status
/// reset) while the original row is left untouched. The job runs
/// concurrently with live request traffic and takes no lock on the task
/// table; every successor is a fresh insert.
#[derive(Clone)]
pub struct RecurrenceRolloverJob<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> RecurrenceRolloverJob<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new rollover job.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Performs one rollover pass over today's due tasks.
    ///
    /// Tasks are processed sequentially; a failure for one task is logged
    /// with its id and cause and does not stop the remaining batch.
    ///
    /// # Errors
    ///
    /// Returns an error only when the due-task query itself fails; per-task
    /// failures are reported through [`RolloverReport::failed`].
    pub async fn run(&self) -> TaskLifecycleResult<RolloverReport> {
        let (from, to) = self.todays_window()?;
        info!(window_start = %from, "checking for tasks with due recurrences");

        let due = self.repository.list_due_recurring(from, to).await?;
        let mut report = RolloverReport {
            due: due.len(),
            ..RolloverReport::default()
        };
        info!(due = report.due, "found tasks to recur");

        for original in &due {
            match self.roll_one(original).await {
                Ok(successor) => {
                    info!(
                        original = %original.id(),
                        successor = %successor.id(),
                        "created successor for recurring task"
                    );
                    report.created += 1;
                }
                Err(err) => {
                    error!(task = %original.id(), cause = %err, "failed to roll over recurring task");
                    report.failed += 1;
                }
            }
        }

        info!(
            created = report.created,
            failed = report.failed,
            "recurring task check completed"
        );
        Ok(report)
    }

    /// Runs the job once per day at UTC midnight.
    ///
    /// The loop sleeps until the next midnight before every run, including
    /// the first: a process restarted mid-day must not re-process a window
    /// that already rolled over at midnight, since that would duplicate the
    /// successor tasks. The host process is expected to spawn this on its
    /// runtime; the loop never terminates on its own.
    pub async fn run_daily(self) {
        loop {
            tokio::time::sleep(self.until_next_midnight()).await;
            if let Err(err) = self.run().await {
                error!(cause = %err, "recurrence rollover run failed");
            }
        }
    }

    async fn roll_one(&self, original: &Task) -> TaskLifecycleResult<Task> {
        let successor = original.next_instance(&*self.clock)?;
        self.repository.create_task(&successor).await?;
        Ok(successor)
    }

    /// Returns today's half-open UTC window `[start of day, start of next
    /// day)`.
    fn todays_window(&self) -> Result<(DateTime<Utc>, DateTime<Utc>), TaskLifecycleError> {
        let now = self.clock.utc();
        let from = now.date_naive().and_time(NaiveTime::MIN).and_utc();
        let to = from
            .checked_add_signed(TimeDelta::days(1))
            .ok_or(TaskDomainError::DateOutOfRange(from))?;
        Ok((from, to))
    }

    fn until_next_midnight(&self) -> Duration {
        // An hour's fallback keeps the loop alive if the date arithmetic
        // ever leaves the representable range.
        const FALLBACK: Duration = Duration::from_secs(3600);

        let now = self.clock.utc();
        let Some(tomorrow) = now.date_naive().succ_opt() else {
            return FALLBACK;
        };
        let next_midnight = tomorrow.and_time(NaiveTime::MIN).and_utc();
        next_midnight
            .signed_duration_since(now)
            .to_std()
            .unwrap_or(FALLBACK)
    }
}
