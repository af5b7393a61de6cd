//! Module for finding slaves and tasks in the cluster state.
//!
//! Slaves and tasks are found by a substring of their id. An empty filter matches everything,
//! which is what the listing subcommands use.
//!
//! A task is returned together with:
//! - the slave it runs (or ran) on, found by the task's `slave_id`.
//! - its sandbox directory on that slave.
//!
//! The entities functionality is called from:
//! - [crate] -> `slaves`, `tasks` (list the matching slaves or tasks)
//! - [crate] -> `slave`, `task` (show the single matching slave or task)
//! - [crate::ssh] (the single matching task to log on to)
//!
mod structs;
mod functions;

pub use structs::*;
pub use functions::*;
