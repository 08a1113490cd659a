//! Task lifecycle management for Tasktrack.
//!
//! This module implements the task tracker core: creating, editing, and
//! soft-deleting owned tasks, toggling completion behind a single-prerequisite
//! dependency guard, listing tasks with resolved dependency snapshots and
//! header counts, and materialising successor instances for recurring tasks
//! once per day. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
