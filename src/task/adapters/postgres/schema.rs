//! Diesel schema for task persistence.
//!
//! `task_dependencies.dependent_id` carries a unique index: at most one
//! dependency edge exists per dependent task, and the upsert path relies on
//! `ON CONFLICT (dependent_id)`.

diesel::table! {
    /// Task records scoped to their owning user.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Task title.
        #[max_length = 255]
        title -> Varchar,
        /// Urgency level.
        #[max_length = 20]
        priority -> Varchar,
        /// Completion state.
        #[max_length = 20]
        status -> Varchar,
        /// Due date.
        due_date -> Timestamptz,
        /// Recurrence cadence.
        #[max_length = 20]
        recurrence -> Varchar,
        /// Next occurrence date, set iff the task recurs.
        next_recurrence -> Nullable<Timestamptz>,
        /// Soft-deletion flag.
        active -> Bool,
        /// Owning user.
        owner_id -> Uuid,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Single-prerequisite dependency edges between tasks.
    task_dependencies (id) {
        /// Edge identifier.
        id -> Uuid,
        /// Task carrying the prerequisite (unique).
        dependent_id -> Uuid,
        /// Task that must complete first.
        prerequisite_id -> Uuid,
    }
}

diesel::allow_tables_to_appear_in_same_query!(tasks, task_dependencies);
