//! The structs
//!
use std::collections::BTreeMap;
use chrono::{DateTime, Duration, Local};
use serde_json::Value;
use crate::resolver::AddressResolver;

/// The root struct for deserializing `/master/state.json`.
///
/// Only the parts needed to find slaves and tasks are declared, everything else is kept in `other`.
/// ```text
/// {
///   "version": "1.11.0",
///   "leader": "master@10.0.0.11:5050",
///   "slaves": [
///     {
///       "id": "6f7a0c36-94a4-4cbe-9a47-1e4a8a0d7b3c-S0",
///       "pid": "slave(1)@10.0.0.21:5051",
///       "hostname": "agent-1.local",
///       "active": true,
///       ...
///     }
///   ],
///   "frameworks": [
///     {
///       "id": "6f7a0c36-94a4-4cbe-9a47-1e4a8a0d7b3c-0000",
///       "name": "marathon",
///       "tasks": [
///         {
///           "id": "webapp.2b6a1c5e-7f1d-11ee-9d1c-0242ac110002",
///           "name": "webapp",
///           "framework_id": "6f7a0c36-94a4-4cbe-9a47-1e4a8a0d7b3c-0000",
///           "executor_id": "",
///           "slave_id": "6f7a0c36-94a4-4cbe-9a47-1e4a8a0d7b3c-S0",
///           "state": "TASK_RUNNING",
///           ...
///         }
///       ],
///       "completed_tasks": [ ... ]
///     }
///   ],
///   "completed_frameworks": [ ... ]
/// }
/// ```
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
pub struct ClusterSnapshot {
    #[serde(default)]
    pub slaves: Vec<SlaveRecord>,
    #[serde(default)]
    pub frameworks: Vec<FrameworkRecord>,
    #[serde(default)]
    pub completed_frameworks: Vec<FrameworkRecord>,
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct SlaveRecord {
    pub id: String,
    pub hostname: String,
    #[serde(default)]
    pub pid: String,
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct FrameworkRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tasks: Vec<TaskRecord>,
    #[serde(default)]
    pub completed_tasks: Vec<TaskRecord>,
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct TaskRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub framework_id: String,
    /// Empty for command tasks, the executor then carries the task id.
    #[serde(default)]
    pub executor_id: String,
    pub slave_id: String,
    #[serde(default)]
    pub state: String,
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

/// A value together with the time it was fetched.
///
/// A read at or after `fetched_at + ttl` fetches again, a read before that returns the stored value.
#[derive(Debug)]
pub struct CachedValue<T> {
    pub(crate) entry: Option<CachedEntry<T>>,
    pub ttl: Duration,
}

#[derive(Debug)]
pub(crate) struct CachedEntry<T> {
    pub(crate) value: T,
    pub(crate) fetched_at: DateTime<Local>,
}

pub trait Clock {
    fn now(&self) -> DateTime<Local>;
}

#[derive(Debug, Default)]
pub struct SystemClock;

/// Performs a HTTP GET and parses the body as JSON.
pub trait HttpJsonFetch {
    fn get_json(&self, url: &str) -> anyhow::Result<Value>;
}

/// [HttpJsonFetch] using a blocking reqwest client.
pub struct ReqwestFetcher {
    pub(crate) client: reqwest::blocking::Client,
}

/// Fetches the cluster state from the leading master and keeps it for `ttl`.
///
/// The master configuration is resolved again on every fetch, a cached state is returned
/// without any network access. This is not meant to be shared between threads.
pub struct StateCache {
    pub master: String,
    pub(crate) resolver: AddressResolver,
    pub(crate) fetcher: Box<dyn HttpJsonFetch>,
    pub(crate) clock: Box<dyn Clock>,
    pub(crate) state: CachedValue<ClusterSnapshot>,
}
