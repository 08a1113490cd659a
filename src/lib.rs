//! Tasktrack: personal task tracker core.
//!
//! This crate implements the task-domain heart of a personal task tracker:
//! recurrence-date computation, dependency-gated status transitions, soft
//! deletion with ownership-scoped queries, and the daily recurrence-rollover
//! job. Authentication, HTTP routing, and UI rendering are external
//! collaborators and live outside this crate.
//!
//! # Architecture
//!
//! Tasktrack follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, in-memory)
//!
//! # Modules
//!
//! - [`task`]: Task lifecycle, dependency, and recurrence management

pub mod task;
