//! Utilities
use std::{collections::HashMap, env, fs, io::Write, path::Path, process, time::Duration};
use colored::*;
use log::*;
use anyhow::{Context, Result};
use crate::entities::DEFAULT_WORK_DIR;
use crate::state::DEFAULT_STATE_TTL;

pub const DEFAULT_MASTER: &str = "localhost:5050";
/// Timeout of the state fetch in seconds.
pub const DEFAULT_HTTP_TIMEOUT: u64 = 10;

/// Pick a setting from the command line option, the environment (set via dotenv().ok()) or the default.
///
/// Settings taken from the command line or the environment are added to `changed_options`,
/// so they can be written to `.env` by [dotenv_writer].
pub fn set_option(
    option: &Option<String>,
    variable: &'static str,
    default: &str,
    changed_options: &mut HashMap<&'static str, String>,
) -> String
{
    match option {
        Some(value) => {
            info!("{} argument set: using: {}", variable, value);
            changed_options.insert(variable, value.to_string());
            value.to_string()
        }
        None => match env::var(variable) {
            Ok(set_var) => {
                info!("{} not set: set via .env: {}", variable, set_var);
                changed_options.insert(variable, set_var.to_owned());
                set_var
            }
            Err(_e) => {
                info!("{} not set: and not set via .env: using default: {}", variable, default);
                default.to_string()
            }
        },
    }
}

pub fn set_master(
    option: &Option<String>,
    changed_options: &mut HashMap<&'static str, String>,
) -> String
{
    set_option(option, "MESOS_CLI_MASTER", DEFAULT_MASTER, changed_options)
}

pub fn set_work_dir(
    option: &Option<String>,
    changed_options: &mut HashMap<&'static str, String>,
) -> String
{
    set_option(option, "MESOS_CLI_WORK_DIR", DEFAULT_WORK_DIR, changed_options)
}

pub fn set_http_timeout(
    option: &Option<String>,
    changed_options: &mut HashMap<&'static str, String>,
) -> Result<Duration>
{
    let seconds = set_option(option, "MESOS_CLI_HTTP_TIMEOUT", &DEFAULT_HTTP_TIMEOUT.to_string(), changed_options);
    let seconds: u64 = seconds.parse()
        .with_context(|| format!("Invalid http timeout: {}", seconds))?;
    Ok(Duration::from_secs(seconds))
}

pub fn set_state_ttl(
    option: &Option<String>,
    changed_options: &mut HashMap<&'static str, String>,
) -> Result<chrono::Duration>
{
    let seconds = set_option(option, "MESOS_CLI_STATE_TTL", &DEFAULT_STATE_TTL.to_string(), changed_options);
    let seconds: i64 = seconds.parse()
        .with_context(|| format!("Invalid state ttl: {}", seconds))?;
    Ok(chrono::Duration::seconds(seconds))
}

pub fn dotenv_writer(
    write_dotenv: bool,
    changed_options: HashMap<&str, String>,
) -> Result<()>
{
    if !changed_options.is_empty() && write_dotenv {
        info!("Writing .env file");
        write_dotenv_file(Path::new(".env"), changed_options)?;
    }
    Ok(())
}

fn write_dotenv_file(
    path: &Path,
    changed_options: HashMap<&str, String>,
) -> Result<()>
{
    let mut file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .with_context(|| format!("Error writing .env file: {}", path.display()))?;

    let mut options: Vec<_> = changed_options.into_iter().collect();
    options.sort();
    for (key, value) in options {
        file.write_all(format!("{}={}\n", key, value).as_bytes())?;
        info!("{}={}", key, value);
    }
    Ok(())
}

/// Print the message and end the process with a non-zero exit code.
pub fn fail(
    message: &str,
) -> !
{
    eprintln!("{} {}", "error:".red().bold(), message);
    process::exit(1);
}
