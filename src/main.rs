//! mesos-cli: find the leading Mesos master, and the slaves and tasks it knows about.
//!
//! The master is set with `--master`, `MESOS_CLI_MASTER` in the environment or `.env`, and is one of:
//! - `host:port`
//! - `zk://host1:port1,host2:port2/path` or `zk://username:password@host1:port1/path`
//! - `file:///path/to/file`, where the file contains one of the above.
//!
#[macro_use]
extern crate serde_derive;

mod entities;
mod error;
mod resolver;
mod ssh;
mod state;
mod utility;

use std::collections::HashMap;
use clap::{Parser, Subcommand};
use colored::*;
use dotenv::dotenv;
use itertools::Itertools;
use log::*;
use anyhow::Result;
use crate::entities::{Entity, EntityIndex, EntityKind, SlaveView, TaskView};
use crate::resolver::AddressResolver;
use crate::state::{FrameworkRecord, ReqwestFetcher, StateCache};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Opts {
    /// Master: host:port, zk://[user:pass@]host1:port1,host2:port2/path or file:///path
    #[arg(short, long, global = true)]
    master: Option<String>,
    /// Timeout in seconds for reading the state from the master
    #[arg(long, global = true)]
    http_timeout: Option<String>,
    /// Seconds the cluster state is reused before it is read again
    #[arg(long, global = true)]
    state_ttl: Option<String>,
    /// Work directory of the slaves, the root of the task sandboxes
    #[arg(long, global = true)]
    work_dir: Option<String>,
    /// Write the options set on the command line to .env
    #[arg(long, global = true)]
    write_dotenv: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the address of the leading master
    Resolve,
    /// List the slaves with an id containing FILTER
    Slaves {
        #[arg(default_value = "")]
        filter: String,
    },
    /// Show the one slave with an id containing FILTER
    Slave {
        filter: String,
    },
    /// List the tasks with an id containing FILTER
    Tasks {
        #[arg(default_value = "")]
        filter: String,
        /// Leave out completed tasks and frameworks
        #[arg(short, long)]
        active_only: bool,
    },
    /// Show the one task with an id containing FILTER
    Task {
        filter: String,
        #[arg(short, long)]
        active_only: bool,
    },
    /// List the frameworks
    Frameworks {
        /// Leave out completed frameworks
        #[arg(short, long)]
        active_only: bool,
    },
    /// Show the framework with id ID
    Framework {
        id: String,
    },
    /// Log on to the slave of a task, in the sandbox of the task
    Ssh {
        task: String,
        #[arg(short, long)]
        active_only: bool,
    },
}

fn main() {
    dotenv().ok();
    env_logger::init();
    let options = Opts::parse();

    if let Err(error) = run(options) {
        utility::fail(&format!("{:#}", error));
    }
}

fn run(
    options: Opts,
) -> Result<()>
{
    let mut changed_options = HashMap::new();
    let master = utility::set_master(&options.master, &mut changed_options);
    let http_timeout = utility::set_http_timeout(&options.http_timeout, &mut changed_options)?;
    let state_ttl = utility::set_state_ttl(&options.state_ttl, &mut changed_options)?;
    let work_dir = utility::set_work_dir(&options.work_dir, &mut changed_options);
    utility::dotenv_writer(options.write_dotenv, changed_options)?;

    let cache = StateCache::new(&master, AddressResolver::new(), Box::new(ReqwestFetcher::new(http_timeout)?), state_ttl);
    let mut index = EntityIndex::new(cache, &work_dir);

    match &options.command {
        Commands::Resolve => println!("{}", index.cache.leader()?),
        Commands::Slaves { filter } => print_slaves(&index.slaves(filter)?),
        Commands::Slave { filter } => print_entity(&index.find_one(EntityKind::Slave, filter, false)?),
        Commands::Tasks { filter, active_only } => print_tasks(&index.tasks(filter, *active_only)?),
        Commands::Task { filter, active_only } => print_entity(&index.find_one(EntityKind::Task, filter, *active_only)?),
        Commands::Frameworks { active_only } => print_frameworks(&index.frameworks(*active_only)?),
        Commands::Framework { id } => print_framework(&index.framework(id)?),
        Commands::Ssh { task, active_only } => {
            let task = index.task(task, *active_only)?;
            debug!("task {} runs on {}", task.id(), task.hostname());
            ssh::exec(&task)?;
        }
    }
    Ok(())
}

fn print_entity(
    entity: &Entity,
) {
    debug!("found {} {}", entity.kind(), entity.id());
    match entity {
        Entity::Slave(slave) => print_slave(slave),
        Entity::Task(task) => print_task(task),
    }
}

fn print_slaves(
    slaves: &[SlaveView],
) {
    for slave in slaves {
        println!("{:50} {}", slave.id(), slave.hostname());
    }
}

fn print_slave(
    slave: &SlaveView,
) {
    println!("{:10} {}", "id", slave.id());
    println!("{:10} {}", "hostname", slave.hostname());
    println!("{:10} {}", "pid", slave.record.pid);
}

fn print_tasks(
    tasks: &[TaskView],
) {
    for task in tasks {
        println!("{:60} {:50} {:30} {}", task.id(), task.record.framework_id, task.hostname(), colored_state(&task.record.state));
    }
}

fn print_task(
    task: &TaskView,
) {
    println!("{:10} {}", "id", task.id());
    println!("{:10} {}", "name", task.record.name);
    println!("{:10} {}", "state", colored_state(&task.record.state));
    println!("{:10} {}", "framework", task.record.framework_id);
    println!("{:10} {} {}", "slave", task.slave.id, task.hostname());
    println!("{:10} {}", "sandbox", task.directory);
}

fn print_frameworks(
    frameworks: &[FrameworkRecord],
) {
    for framework in frameworks {
        println!("{:50} {:30} {:>6} {:>6}", framework.id, framework.name, framework.tasks.len(), framework.completed_tasks.len());
    }
}

fn print_framework(
    framework: &FrameworkRecord,
) {
    println!("{:10} {}", "id", framework.id);
    println!("{:10} {}", "name", framework.name);
    println!("{:10} {}", "tasks", framework.tasks.iter().map(|task| task.id.as_str()).join(", "));
    println!("{:10} {}", "completed", framework.completed_tasks.len());
}

fn colored_state(
    state: &str,
) -> ColoredString
{
    match state {
        "TASK_RUNNING" => state.green(),
        "TASK_FINISHED" => state.normal(),
        "TASK_FAILED" | "TASK_KILLED" | "TASK_LOST" | "TASK_ERROR" | "TASK_DROPPED" | "TASK_GONE" => state.red(),
        _ => state.yellow(),
    }
}
