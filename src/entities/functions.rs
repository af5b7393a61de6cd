//! The impls and functions.
//!
use std::fmt;
use log::*;
use crate::error::MesosCliError;
use crate::state::{ClusterSnapshot, FrameworkRecord, SlaveRecord, StateCache, TaskRecord};
use crate::entities::{Entity, EntityIndex, EntityKind, SlaveView, TaskView};

/// Default work directory of the slaves.
pub const DEFAULT_WORK_DIR: &str = "/tmp/mesos";

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EntityKind::Slave => write!(f, "slave"),
            EntityKind::Task => write!(f, "task"),
        }
    }
}

impl SlaveView {
    pub fn id(&self) -> &str {
        &self.record.id
    }
    pub fn hostname(&self) -> &str {
        &self.record.hostname
    }
}

impl TaskView {
    pub fn id(&self) -> &str {
        &self.record.id
    }
    /// The hostname of the slave the task runs on.
    pub fn hostname(&self) -> &str {
        &self.slave.hostname
    }
}

impl Entity {
    pub fn id(&self) -> &str {
        match self {
            Entity::Slave(slave) => slave.id(),
            Entity::Task(task) => task.id(),
        }
    }
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Slave(_) => EntityKind::Slave,
            Entity::Task(_) => EntityKind::Task,
        }
    }
}

impl EntityIndex {
    pub fn new(cache: StateCache, work_dir: &str) -> Self {
        EntityIndex { cache, work_dir: work_dir.to_string() }
    }
    /// All slaves or tasks with an id containing `filter`, in the order of the cluster state.
    ///
    /// `active_only` only applies to tasks.
    pub fn list(
        &mut self,
        kind: EntityKind,
        filter: &str,
        active_only: bool,
    ) -> Result<Vec<Entity>, MesosCliError>
    {
        Ok(match kind {
            EntityKind::Slave => self.slaves(filter)?.into_iter().map(Entity::Slave).collect(),
            EntityKind::Task => self.tasks(filter, active_only)?.into_iter().map(Entity::Task).collect(),
        })
    }
    /// The one slave or task with an id containing `filter`.
    pub fn find_one(
        &mut self,
        kind: EntityKind,
        filter: &str,
        active_only: bool,
    ) -> Result<Entity, MesosCliError>
    {
        let matches = self.list(kind, filter, active_only)?;
        exactly_one(kind, filter, matches, Entity::id)
    }
    pub fn slaves(
        &mut self,
        filter: &str,
    ) -> Result<Vec<SlaveView>, MesosCliError>
    {
        let snapshot = self.cache.snapshot()?;
        Ok(snapshot.slaves.iter()
            .filter(|slave| slave.id.contains(filter))
            .map(|slave| SlaveView { record: slave.clone() })
            .collect())
    }
    pub fn slave(
        &mut self,
        filter: &str,
    ) -> Result<SlaveView, MesosCliError>
    {
        let slaves = self.slaves(filter)?;
        exactly_one(EntityKind::Slave, filter, slaves, SlaveView::id)
    }
    /// Tasks with an id containing `filter`, per framework the active tasks first, then the completed ones.
    ///
    /// With `active_only`, completed frameworks and completed tasks are left out.
    pub fn tasks(
        &mut self,
        filter: &str,
        active_only: bool,
    ) -> Result<Vec<TaskView>, MesosCliError>
    {
        let snapshot = self.cache.snapshot()?;
        let work_dir = &self.work_dir;

        let tasks = framework_records(snapshot, active_only)
            .flat_map(|framework| {
                let completed = if active_only { &[][..] } else { framework.completed_tasks.as_slice() };
                framework.tasks.iter().chain(completed.iter())
            })
            .filter(|task| task.id.contains(filter))
            .map(|task| task_view(snapshot, work_dir, task))
            .collect::<Result<Vec<_>, _>>()?;

        debug!("{} tasks matching '{}', active only: {}", tasks.len(), filter, active_only);
        Ok(tasks)
    }
    pub fn task(
        &mut self,
        filter: &str,
        active_only: bool,
    ) -> Result<TaskView, MesosCliError>
    {
        let tasks = self.tasks(filter, active_only)?;
        exactly_one(EntityKind::Task, filter, tasks, TaskView::id)
    }
    /// The active frameworks, followed by the completed ones unless `active_only`.
    pub fn frameworks(
        &mut self,
        active_only: bool,
    ) -> Result<Vec<FrameworkRecord>, MesosCliError>
    {
        let snapshot = self.cache.snapshot()?;
        Ok(framework_records(snapshot, active_only).cloned().collect())
    }
    pub fn framework(
        &mut self,
        framework_id: &str,
    ) -> Result<FrameworkRecord, MesosCliError>
    {
        let snapshot = self.cache.snapshot()?;
        framework_records(snapshot, false)
            .find(|framework| framework.id == framework_id)
            .cloned()
            .ok_or_else(|| MesosCliError::NotFound { kind: "framework".to_string(), filter: framework_id.to_string() })
    }
}

fn framework_records(
    snapshot: &ClusterSnapshot,
    active_only: bool,
) -> impl Iterator<Item = &FrameworkRecord>
{
    let completed = if active_only { &[][..] } else { snapshot.completed_frameworks.as_slice() };
    snapshot.frameworks.iter().chain(completed.iter())
}

fn task_view(
    snapshot: &ClusterSnapshot,
    work_dir: &str,
    task: &TaskRecord,
) -> Result<TaskView, MesosCliError>
{
    let slave: &SlaveRecord = snapshot.slaves.iter()
        .find(|slave| slave.id == task.slave_id)
        .ok_or_else(|| MesosCliError::Inconsistent(format!("task {} refers to slave {}, which is not in the cluster state", task.id, task.slave_id)))?;
    Ok(TaskView {
        record: task.clone(),
        slave: slave.clone(),
        directory: sandbox_directory(work_dir, task),
    })
}

/// The sandbox of a task: `<work_dir>/slaves/<slave>/frameworks/<framework>/executors/<executor>/runs/latest`.
///
/// Command tasks have no executor id, their executor is named after the task.
pub fn sandbox_directory(
    work_dir: &str,
    task: &TaskRecord,
) -> String
{
    let executor_id = if task.executor_id.is_empty() { &task.id } else { &task.executor_id };
    format!(
        "{}/slaves/{}/frameworks/{}/executors/{}/runs/latest",
        work_dir.trim_end_matches('/'),
        task.slave_id,
        task.framework_id,
        executor_id,
    )
}

/// Reduce the matches to the single one, or fail naming the filter or every match.
fn exactly_one<T>(
    kind: EntityKind,
    filter: &str,
    matches: Vec<T>,
    id: impl Fn(&T) -> &str,
) -> Result<T, MesosCliError>
{
    if matches.len() > 1 {
        return Err(MesosCliError::Ambiguous {
            kind: kind.to_string(),
            filter: filter.to_string(),
            matches: matches.iter().map(|found| id(found).to_string()).collect(),
        });
    }
    matches.into_iter()
        .next()
        .ok_or_else(|| MesosCliError::NotFound { kind: kind.to_string(), filter: filter.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utility_test::*;

    fn ids<T>(found: &[T], id: impl Fn(&T) -> &str) -> Vec<String> {
        found.iter().map(|found| id(found).to_string()).collect()
    }

    #[test]
    fn unit_list_all_slaves_in_order() {
        let mut index = entity_index(STATE_JSON);
        let result = index.list(EntityKind::Slave, "", false).unwrap();
        assert_eq!(ids(&result, Entity::id), ["abc-1", "xyz-2", "xyz-3"]);
    }

    #[test]
    fn unit_find_one_slave() {
        let mut index = entity_index(STATE_JSON);
        let result = index.find_one(EntityKind::Slave, "abc", false).unwrap();
        assert_eq!(result.id(), "abc-1");
        assert_eq!(result.kind(), EntityKind::Slave);

        let slave = index.slave("2").unwrap();
        assert_eq!(slave.hostname(), "agent-2.local");
    }

    #[test]
    fn unit_find_one_slave_ambiguous() {
        let mut index = entity_index(STATE_JSON);
        match index.find_one(EntityKind::Slave, "x", false) {
            Err(MesosCliError::Ambiguous { kind, filter, matches }) => {
                assert_eq!(kind, "slave");
                assert_eq!(filter, "x");
                assert_eq!(matches, ["xyz-2", "xyz-3"]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn unit_find_one_slave_not_found() {
        let mut index = entity_index(STATE_JSON);
        match index.find_one(EntityKind::Slave, "q", false) {
            Err(MesosCliError::NotFound { kind, filter }) => {
                assert_eq!(kind, "slave");
                assert_eq!(filter, "q");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn unit_list_all_tasks_in_order() {
        let mut index = entity_index(STATE_JSON);
        let result = index.tasks("", false).unwrap();
        assert_eq!(ids(&result, TaskView::id), ["job.web-1", "job.db-1", "job.web-0", "cron.backup-7", "batch.report-3"]);
    }

    #[test]
    fn unit_list_active_tasks() {
        let mut index = entity_index(STATE_JSON);
        let result = index.list(EntityKind::Task, "", true).unwrap();
        assert_eq!(ids(&result, Entity::id), ["job.web-1", "job.db-1", "cron.backup-7"]);
    }

    #[test]
    fn unit_find_one_task_active_only_skips_completed() {
        let mut index = entity_index(STATE_JSON);
        let task = index.task("web", true).unwrap();
        assert_eq!(task.id(), "job.web-1");

        match index.task("web", false) {
            Err(MesosCliError::Ambiguous { matches, .. }) => assert_eq!(matches, ["job.web-1", "job.web-0"]),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn unit_find_one_task_ambiguous_active_only() {
        let mut index = entity_index(STATE_JSON);
        match index.find_one(EntityKind::Task, "job", true) {
            Err(MesosCliError::Ambiguous { kind, matches, .. }) => {
                assert_eq!(kind, "task");
                assert_eq!(matches, ["job.web-1", "job.db-1"]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn unit_completed_framework_task() {
        let mut index = entity_index(STATE_JSON);
        let task = index.task("report", false).unwrap();
        assert_eq!(task.record.framework_id, "fw-0002");
        assert!(matches!(index.task("report", true), Err(MesosCliError::NotFound { .. })));
    }

    #[test]
    fn unit_task_hostname_is_its_slaves_hostname() {
        let mut index = entity_index(STATE_JSON);
        let snapshot = index.cache.snapshot().unwrap().clone();
        for task in index.tasks("", false).unwrap() {
            let slave = snapshot.slaves.iter().find(|slave| slave.id == task.record.slave_id).unwrap();
            assert_eq!(task.hostname(), slave.hostname);
        }
    }

    #[test]
    fn unit_task_sandbox_directory() {
        let mut index = entity_index(STATE_JSON);
        let task = index.task("web-1", false).unwrap();
        assert_eq!(task.directory, "/tmp/mesos/slaves/abc-1/frameworks/fw-0000/executors/job.web-1/runs/latest");

        let task = index.task("db", false).unwrap();
        assert_eq!(task.directory, "/tmp/mesos/slaves/xyz-2/frameworks/fw-0000/executors/db-executor/runs/latest");
    }

    #[test]
    fn unit_task_on_missing_slave_is_inconsistent() {
        let state = r#"
        {
          "slaves": [{"id": "abc-1", "hostname": "agent-1.local"}],
          "frameworks": [
            {
              "id": "fw-0000",
              "tasks": [{"id": "orphan-9", "framework_id": "fw-0000", "slave_id": "gone-9", "state": "TASK_LOST"}],
              "completed_tasks": []
            }
          ]
        }"#;
        let mut index = entity_index(state);
        assert!(matches!(index.task("orphan", false), Err(MesosCliError::Inconsistent(_))));
        assert!(index.tasks("no-such-task", false).unwrap().is_empty());
    }

    #[test]
    fn unit_completed_task_on_removed_slave() {
        let state = r#"
        {
          "slaves": [{"id": "abc-1", "hostname": "agent-1.local"}],
          "frameworks": [
            {
              "id": "fw-0000",
              "tasks": [{"id": "job.web-2", "framework_id": "fw-0000", "slave_id": "abc-1", "state": "TASK_RUNNING"}],
              "completed_tasks": [{"id": "job.web-1", "framework_id": "fw-0000", "slave_id": "gone-9", "state": "TASK_FINISHED"}]
            }
          ]
        }"#;
        let mut index = entity_index(state);
        assert!(matches!(index.tasks("", false), Err(MesosCliError::Inconsistent(_))));
        let active = index.tasks("", true).unwrap();
        assert_eq!(ids(&active, TaskView::id), vec!["job.web-2"]);
        assert_eq!(index.task("web-2", false).unwrap().hostname(), "agent-1.local");
    }

    #[test]
    fn unit_lookups_share_one_fetch() {
        let (mut index, count) = counted_entity_index(STATE_JSON);
        index.slaves("").unwrap();
        index.tasks("", false).unwrap();
        index.slave("abc").unwrap();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn unit_frameworks() {
        let mut index = entity_index(STATE_JSON);
        let all: Vec<String> = index.frameworks(false).unwrap().into_iter().map(|framework| framework.id).collect();
        assert_eq!(all, ["fw-0000", "fw-0001", "fw-0002"]);
        assert_eq!(index.frameworks(true).unwrap().len(), 2);

        assert_eq!(index.framework("fw-0002").unwrap().name, "spark");
        assert!(matches!(index.framework("fw-9999"), Err(MesosCliError::NotFound { .. })));
    }
}
