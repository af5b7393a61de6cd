//! The structs
//!
use crate::state::{SlaveRecord, StateCache, TaskRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Slave,
    Task,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlaveView {
    pub record: SlaveRecord,
}

/// A task with the slave it belongs to and its sandbox directory.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskView {
    pub record: TaskRecord,
    pub slave: SlaveRecord,
    pub directory: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Slave(SlaveView),
    Task(TaskView),
}

/// Lookups over the state kept by a [StateCache].
///
/// `work_dir` is the slaves' work directory, the root of the task sandboxes.
pub struct EntityIndex {
    pub cache: StateCache,
    pub work_dir: String,
}
