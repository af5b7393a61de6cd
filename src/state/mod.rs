//! Module for reading `/master/state.json` on the leading master.
//!
//! The `/master/state.json` endpoint contains the full cluster state, including:
//! - slaves (id, pid, hostname, resources, attributes)
//! - frameworks, each with:
//!   - tasks (the tasks that are currently known as active)
//!   - completed_tasks
//! - completed_frameworks (same layout as frameworks)
//!
//! The endpoint is only served in full by the leading master, which is why the address is
//! resolved using [crate::resolver::AddressResolver] before every fetch.
//!
//! The state is kept in a [CachedValue] for a short time, so that looking up a slave and then a task
//! in the same invocation does not read the state twice.
//!
mod structs;
mod functions;

pub use structs::*;
pub use functions::*;
