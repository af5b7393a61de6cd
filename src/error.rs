//! Errors that end an invocation.
//!
//! Every variant is fatal: nothing is retried or recovered, the message is shown
//! to the operator via [crate::utility::fail].
use thiserror::Error;

pub const MISSING_MASTER: &str = "Try configuring a master with --master or MESOS_CLI_MASTER in .env, \
for example: localhost:5050, zk://host1:2181,host2:2181/mesos or file:///etc/mesos/master";

#[derive(Debug, Error)]
pub enum MesosCliError {
    /// Malformed configuration, no leader in the ensemble or a vanished ensemble node.
    #[error("{message} (master configuration: {config})")]
    Resolution { config: String, message: String },

    #[error("unable to connect to a master at {host}: {reason}\n\n{}", MISSING_MASTER)]
    Fetch { host: String, reason: String },

    #[error("cannot find a {kind} matching '{filter}'")]
    NotFound { kind: String, filter: String },

    /// Carries every matching identity in snapshot order.
    #[error("there are multiple {kind}s matching '{filter}', please choose one:{}", list_matches(.matches))]
    Ambiguous { kind: String, filter: String, matches: Vec<String> },

    /// The snapshot references something it does not contain.
    #[error("inconsistent cluster state: {0}")]
    Inconsistent(String),
}

impl MesosCliError {
    pub fn resolution(config: &str, message: impl Into<String>) -> Self {
        MesosCliError::Resolution { config: config.to_string(), message: message.into() }
    }
}

fn list_matches(
    matches: &[String],
) -> String
{
    matches.iter().map(|id| format!("\n\t{}", id)).collect()
}

/// Failures reported by an ensemble session.
#[derive(Debug, Error)]
pub enum EnsembleError {
    #[error("no node at {path}")]
    NoNode { path: String },
    #[error("{0}")]
    Transport(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_ambiguous_lists_every_match() {
        let error = MesosCliError::Ambiguous {
            kind: "slave".to_string(),
            filter: "x".to_string(),
            matches: vec!["abc-x".to_string(), "xyz-2".to_string()],
        };
        assert_eq!(error.to_string(), "there are multiple slaves matching 'x', please choose one:\n\tabc-x\n\txyz-2");
    }

    #[test]
    fn unit_fetch_names_host_and_remedy() {
        let error = MesosCliError::Fetch { host: "http://m1:5050".to_string(), reason: "connection refused".to_string() };
        let message = error.to_string();
        assert!(message.starts_with("unable to connect to a master at http://m1:5050"));
        assert!(message.contains("MESOS_CLI_MASTER"));
    }
}
