//! Log on to the slave of a task, in the sandbox of the task.
use std::process::Command;
use anyhow::{Context, Result};
use log::*;
use crate::entities::TaskView;

/// `ssh -t <hostname> "cd <sandbox> && bash"`
pub fn ssh_arguments(
    task: &TaskView,
) -> Vec<String>
{
    vec![
        "-t".to_string(),
        task.hostname().to_string(),
        format!("cd {} && bash", task.directory),
    ]
}

fn ssh_command(
    task: &TaskView,
) -> Command
{
    let mut command = Command::new("ssh");
    command.args(ssh_arguments(task));
    command
}

/// Replace this process with ssh. Only returns when ssh could not be started.
#[cfg(unix)]
pub fn exec(
    task: &TaskView,
) -> Result<()>
{
    use std::os::unix::process::CommandExt;

    info!("ssh {}", ssh_arguments(task).join(" "));
    let error = ssh_command(task).exec();
    Err(error).with_context(|| format!("Error executing ssh to {}", task.hostname()))
}

#[cfg(not(unix))]
pub fn exec(
    task: &TaskView,
) -> Result<()>
{
    info!("ssh {}", ssh_arguments(task).join(" "));
    let status = ssh_command(task).status()
        .with_context(|| format!("Error executing ssh to {}", task.hostname()))?;
    if !status.success() {
        anyhow::bail!("ssh to {} ended with {}", task.hostname(), status);
    }
    Ok(())
}
