//! Module for resolving the master configuration to the leading master's `host:port`.
//!
//! The master configuration is one of:
//! - `host:port`: used as is.
//! - `zk://host1:port1,host2:port2/path`: the leader is read from the ZooKeeper election path.
//! - `zk://username:password@host1:port1/path`: same, authenticating with digest credentials.
//! - `file:///path/to/file`: the file contains one of the above.
//!
//! On ZooKeeper, every master that takes part in the election creates a sequential node
//! under the election path (`info_0000000017` or `json.info_0000000017`).
//! The node with the highest sequence number holds the leader descriptor.
//!
//! The resolver is called from:
//! - [crate::state::StateCache] (on the first state fetch)
//! - [crate] -> `resolve` (prints the resolved leader)
//!
mod structs;
mod functions;

pub use structs::*;
pub use functions::*;
