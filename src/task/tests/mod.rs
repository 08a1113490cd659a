//! Unit and behaviour tests for the task module.

mod dependency_tests;
mod domain_tests;
