//! The impls and functions.
//!
use std::{net::Ipv4Addr, time::{Duration, Instant}};
use log::*;
use prost::Message;
use regex::Regex;
use zookeeper::{WatchedEvent, ZkError, ZooKeeper};
use crate::error::{EnsembleError, MesosCliError};
use crate::resolver::{AddressResolver, Candidate, EnsembleConnector, EnsembleSession, FileReader, JsonMasterInfo, LocalFileReader, MasterInfo, ZooKeeperConnector};

/// Connect timeout for ZooKeeper in seconds.
pub const ZOOKEEPER_TIMEOUT: u64 = 1;
/// A `file:` reference may point at `host:port` or `zk://`, but not at another `file:`.
const MAX_FILE_DEPTH: usize = 1;

impl AddressResolver {
    pub fn new() -> Self {
        AddressResolver {
            ensemble: Box::new(ZooKeeperConnector),
            files: Box::new(LocalFileReader),
            ensemble_timeout: Duration::from_secs(ZOOKEEPER_TIMEOUT),
        }
    }
    /// Resolve the master configuration to the leading master's address.
    ///
    /// The scheme is picked by prefix: `zk:`, then `file:`, anything else is returned unchanged.
    pub fn resolve(
        &self,
        config: &str,
    ) -> Result<String, MesosCliError>
    {
        self.resolve_at_depth(config, 0)
    }
    fn resolve_at_depth(
        &self,
        config: &str,
        depth: usize,
    ) -> Result<String, MesosCliError>
    {
        if config.starts_with("zk:") {
            self.resolve_ensemble(config)
        } else if config.starts_with("file:") {
            if depth >= MAX_FILE_DEPTH {
                return Err(MesosCliError::resolution(config, "a file: reference cannot point at another file: reference"));
            }
            self.resolve_file(config, depth)
        } else {
            Ok(config.to_string())
        }
    }
    fn resolve_file(
        &self,
        config: &str,
        depth: usize,
    ) -> Result<String, MesosCliError>
    {
        let path = file_path(config);
        let contents = self.files.read_to_string(path)
            .map_err(|e| MesosCliError::resolution(config, format!("cannot read {}: {}", path, e)))?;
        let contents = contents.trim();
        if contents.is_empty() {
            return Err(MesosCliError::resolution(config, format!("{} is empty", path)));
        }
        debug!("{} contains {}", path, contents);
        self.resolve_at_depth(contents, depth + 1)
    }
    fn resolve_ensemble(
        &self,
        config: &str,
    ) -> Result<String, MesosCliError>
    {
        let (credentials, hosts, path) = parse_ensemble_config(config)?;

        info!("begin zookeeper read: {}{}", hosts, path);
        let timer = Instant::now();

        // the session is dropped, and thereby closed, on every return from this block.
        let (leader, data) = {
            let session = self.ensemble.connect(&hosts, credentials.as_deref(), self.ensemble_timeout)
                .map_err(|e| MesosCliError::resolution(config, format!("cannot connect to zookeeper: {}", e)))?;
            read_leader_node(&*session, config, &path)?
        };

        info!("end zookeeper read: {:?}", timer.elapsed());

        let address = decode_leader(&data)
            .map_err(|e| MesosCliError::resolution(config, format!("cannot decode leader {}: {}", leader.name, e)))?;
        debug!("leader {} is at {}", leader.name, address);
        Ok(address)
    }
}

impl Default for AddressResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn read_leader_node(
    session: &dyn EnsembleSession,
    config: &str,
    path: &str,
) -> Result<(Candidate, Vec<u8>), MesosCliError>
{
    let invalid_path = || MesosCliError::resolution(config, format!("{} is not a valid path, did you forget /mesos?", path));

    let children = session.list_children(path)
        .map_err(|e| match e {
            EnsembleError::NoNode { .. } => invalid_path(),
            EnsembleError::Transport(e) => MesosCliError::resolution(config, e),
        })?;
    let leader = select_leader(&children)
        .ok_or_else(|| MesosCliError::resolution(config, format!("no leader found at {}", path)))?;
    let data = session.read_node(&join_path(path, &leader.name))
        .map_err(|e| match e {
            EnsembleError::NoNode { .. } => invalid_path(),
            EnsembleError::Transport(e) => MesosCliError::resolution(config, e),
        })?;
    Ok((leader, data))
}

/// Split `zk://[user:pass@]hosts/path` into credentials, hosts and the election path.
///
/// The path always gets a leading `/`.
pub fn parse_ensemble_config(
    config: &str,
) -> Result<(Option<String>, String, String), MesosCliError>
{
    let rest = config.strip_prefix("zk://")
        .ok_or_else(|| MesosCliError::resolution(config, "expected zk://host:port[,host:port]/path"))?;
    let (hosts, path) = rest.split_once('/')
        .ok_or_else(|| MesosCliError::resolution(config, "missing the election path after the zookeeper hosts"))?;
    let (credentials, hosts) = match hosts.rsplit_once('@') {
        Some((credentials, hosts)) => (Some(credentials.to_string()), hosts),
        None => (None, hosts),
    };
    if hosts.is_empty() {
        return Err(MesosCliError::resolution(config, "no zookeeper hosts"));
    }
    Ok((credentials, hosts.to_string(), format!("/{}", path)))
}

/// Pick the child with the highest sequence number.
///
/// Children without a `_<digits>` suffix are not candidates. Ties go to the first listed child.
pub fn select_leader(
    children: &[String],
) -> Option<Candidate>
{
    let suffix = Regex::new(r"_(\d+)$").ok()?;
    children.iter()
        .filter_map(|name| {
            suffix.captures(name)
                .and_then(|captures| captures[1].parse::<u64>().ok())
                .map(|sequence| Candidate { name: name.to_string(), sequence })
        })
        .rev()
        .max_by_key(|candidate| candidate.sequence)
}

/// Decode a leader descriptor into `host:port`.
///
/// A payload starting with `{` is JSON, anything else is the protobuf `MasterInfo`.
pub fn decode_leader(
    data: &[u8],
) -> anyhow::Result<String>
{
    if data.first() == Some(&b'{') {
        let info: JsonMasterInfo = serde_json::from_slice(data)?;
        info.address()
    } else {
        let info = MasterInfo::decode(data)?;
        Ok(info.address())
    }
}

/// Take everything after the last `@` of a `name@host:port` process id.
pub fn pid_address(
    pid: &str,
) -> &str
{
    pid.rsplit('@').next().unwrap_or(pid)
}

impl MasterInfo {
    pub fn address(&self) -> String {
        match &self.pid {
            Some(pid) if !pid.is_empty() => pid_address(pid).to_string(),
            _ => {
                let host = self.hostname.clone()
                    .filter(|hostname| !hostname.is_empty())
                    .unwrap_or_else(|| Ipv4Addr::from(self.ip.to_le_bytes()).to_string());
                format!("{}:{}", host, self.port)
            }
        }
    }
}

impl JsonMasterInfo {
    pub fn address(&self) -> anyhow::Result<String> {
        if let Some(pid) = self.pid.as_ref().filter(|pid| !pid.is_empty()) {
            return Ok(pid_address(pid).to_string());
        }
        if let Some(address) = &self.address {
            if let (Some(host), Some(port)) = (address.hostname.as_ref().or(address.ip.as_ref()), address.port) {
                return Ok(format!("{}:{}", host, port));
            }
        }
        match (&self.hostname, self.port) {
            (Some(hostname), Some(port)) => Ok(format!("{}:{}", hostname, port)),
            _ => anyhow::bail!("leader {} has neither a pid nor an address", self.id),
        }
    }
}

fn file_path(
    config: &str,
) -> &str
{
    let rest = &config["file:".len()..];
    rest.strip_prefix("//").unwrap_or(rest)
}

fn join_path(
    path: &str,
    child: &str,
) -> String
{
    format!("{}/{}", path.trim_end_matches('/'), child)
}

impl FileReader for LocalFileReader {
    fn read_to_string(&self, path: &str) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }
}

struct ZooKeeperSession {
    zk: ZooKeeper,
}

impl EnsembleConnector for ZooKeeperConnector {
    fn connect(
        &self,
        hosts: &str,
        credentials: Option<&str>,
        timeout: Duration,
    ) -> Result<Box<dyn EnsembleSession>, EnsembleError>
    {
        let zk = ZooKeeper::connect(hosts, timeout, |event: WatchedEvent| debug!("zookeeper event: {:?}", event))
            .map_err(|e| EnsembleError::Transport(format!("{}: {:?}", hosts, e)))?;
        let session = ZooKeeperSession { zk };
        if let Some(credentials) = credentials {
            session.zk.add_auth("digest", credentials.as_bytes().to_vec())
                .map_err(|e| EnsembleError::Transport(format!("authentication failed: {:?}", e)))?;
        }
        Ok(Box::new(session))
    }
}

impl EnsembleSession for ZooKeeperSession {
    fn list_children(&self, path: &str) -> Result<Vec<String>, EnsembleError> {
        self.zk.get_children(path, false)
            .map_err(|e| zookeeper_error(path, e))
    }
    fn read_node(&self, path: &str) -> Result<Vec<u8>, EnsembleError> {
        self.zk.get_data(path, false)
            .map(|(data, _stat)| data)
            .map_err(|e| zookeeper_error(path, e))
    }
}

impl Drop for ZooKeeperSession {
    fn drop(&mut self) {
        if let Err(e) = self.zk.close() {
            debug!("error closing zookeeper session: {:?}", e);
        }
    }
}

fn zookeeper_error(
    path: &str,
    error: ZkError,
) -> EnsembleError
{
    match error {
        ZkError::NoNode => EnsembleError::NoNode { path: path.to_string() },
        e => EnsembleError::Transport(format!("{}: {:?}", path, e)),
    }
}
