//! Application services for task lifecycle orchestration.

mod lifecycle;
mod rollover;

pub use lifecycle::{
    TaskBoard, TaskForm, TaskLifecycleError, TaskLifecycleResult, TaskLifecycleService,
};
pub use rollover::{RecurrenceRolloverJob, RolloverReport};
