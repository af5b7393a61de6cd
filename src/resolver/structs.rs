//! The structs
//!
use std::time::Duration;
use crate::error::EnsembleError;

/// The leader descriptor as the masters write it into ZooKeeper (`info_` nodes).
///
/// This is the protobuf `mesos.MasterInfo` message, only the fields needed to find the address are declared,
/// the others are skipped when decoding.
#[derive(Clone, PartialEq, prost::Message)]
pub struct MasterInfo {
    #[prost(string, required, tag = "1")]
    pub id: String,
    /// IPv4 address in network byte order.
    #[prost(uint32, required, tag = "2")]
    pub ip: u32,
    #[prost(uint32, required, tag = "3", default = "5050")]
    pub port: u32,
    /// `master@host:port`
    #[prost(string, optional, tag = "4")]
    pub pid: Option<String>,
    #[prost(string, optional, tag = "5")]
    pub hostname: Option<String>,
    #[prost(string, optional, tag = "6")]
    pub version: Option<String>,
}

/// The leader descriptor as newer masters write it into ZooKeeper (`json.info_` nodes).
///
/// ```text
/// {
///   "address": {"hostname": "m1.local", "ip": "10.0.0.11", "port": 5050},
///   "hostname": "m1.local",
///   "id": "b8a8e5b4-4b3c-4a58-9bb2-77a0c1e0a2d1",
///   "ip": 184549386,
///   "pid": "master@10.0.0.11:5050",
///   "port": 5050,
///   "version": "1.11.0"
/// }
/// ```
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct JsonMasterInfo {
    #[serde(default)]
    pub id: String,
    pub pid: Option<String>,
    pub hostname: Option<String>,
    pub port: Option<u32>,
    pub address: Option<JsonMasterAddress>,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct JsonMasterAddress {
    pub hostname: Option<String>,
    pub ip: Option<String>,
    pub port: Option<u32>,
}

/// An election candidate: a child of the election path carrying a sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub name: String,
    pub sequence: u64,
}

/// A connected ZooKeeper session.
///
/// The session is closed when it is dropped.
pub trait EnsembleSession {
    fn list_children(&self, path: &str) -> Result<Vec<String>, EnsembleError>;
    fn read_node(&self, path: &str) -> Result<Vec<u8>, EnsembleError>;
}

/// Opens sessions to an ensemble.
///
/// `credentials` is the `user:password` part of a `zk://user:password@hosts/path` configuration.
pub trait EnsembleConnector {
    fn connect(
        &self,
        hosts: &str,
        credentials: Option<&str>,
        timeout: Duration,
    ) -> Result<Box<dyn EnsembleSession>, EnsembleError>;
}

/// Connects to ZooKeeper using the `zookeeper` crate.
#[derive(Debug, Default)]
pub struct ZooKeeperConnector;

/// Read the file behind a `file:` configuration.
pub trait FileReader {
    fn read_to_string(&self, path: &str) -> std::io::Result<String>;
}

#[derive(Debug, Default)]
pub struct LocalFileReader;

/// Turns a master configuration into the `host:port` of the leading master.
///
/// Nothing is cached here: every call to [AddressResolver::resolve] reads the configuration again.
pub struct AddressResolver {
    pub ensemble: Box<dyn EnsembleConnector>,
    pub files: Box<dyn FileReader>,
    pub ensemble_timeout: Duration,
}
