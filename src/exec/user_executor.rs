//! User executor (spec.md §4.8): the single task queue is partitioned
//! round-robin across `concurrency` workers, each draining its shard
//! independently; within a task, the four action bits run in the fixed
//! order Create → Rename → Move → Delete, clearing each bit as it
//! succeeds and abandoning the rest of that task's bits on the first
//! failure (spec.md P5: idempotence — a retried task only re-attempts
//! bits still set).
//!
//! Grounded in `syncdata.go`'s `ProcessFiberUserTaskQueue` (per-task bit
//! loop) and `ProcessUsersTaskQueue` (round-robin fan-out across N
//! goroutines) — replacing goroutines+channels with `tokio::spawn` over
//! `Queue::partition`'s pre-split shards.

use std::sync::Arc;

use futures::future::join_all;

use crate::model::Action;
use crate::plan::user_planner::UserTask;
use crate::queue::Queue;
use crate::target::types::UserPayload;
use crate::target::TargetApi;

#[derive(Debug, Default)]
pub struct UserExecutionReport {
    pub completed: usize,
    /// (code, resolved user id) for every task that ran to completion —
    /// needed so the next cycle's SoT baseline knows the id of a user
    /// created this cycle.
    pub resolved_ids: Vec<(String, String)>,
    /// Tasks that didn't fully complete: (code, remaining action, last error).
    pub failures: Vec<(String, String, String)>,
}

pub async fn execute_user_plan(
    target: Arc<dyn TargetApi>,
    queue: Queue<UserTask>,
    concurrency: usize,
) -> UserExecutionReport {
    let shards = queue.partition(concurrency);

    let handles = shards.into_iter().map(|shard| {
        let target = Arc::clone(&target);
        tokio::spawn(async move { run_shard(target, shard).await })
    });

    let mut report = UserExecutionReport::default();
    for joined in join_all(handles).await {
        match joined {
            Ok(shard_report) => {
                report.completed += shard_report.completed;
                report.resolved_ids.extend(shard_report.resolved_ids);
                report.failures.extend(shard_report.failures);
            }
            Err(e) => {
                tracing::error!(error = %e, "user executor worker panicked");
            }
        }
    }
    report
}

async fn run_shard(target: Arc<dyn TargetApi>, mut shard: Queue<UserTask>) -> UserExecutionReport {
    let mut report = UserExecutionReport::default();
    while let Some(task) = shard.pop() {
        match run_task(target.as_ref(), task).await {
            Ok((code, user_id)) => {
                report.completed += 1;
                report.resolved_ids.push((code, user_id));
            }
            Err((code, remaining, message)) => report.failures.push((code, remaining.to_string(), message)),
        }
    }
    report
}

/// Run one user's remaining bits in fixed order; returns the user's
/// resolved id on success, or `Err` with the still-unset bits and the
/// error that stopped progress.
async fn run_task(target: &dyn TargetApi, task: UserTask) -> Result<(String, String), (String, Action, String)> {
    let mut remaining = task.action;
    let mut user_id = task.user_id.clone();
    let org_id = task.org_id.clone().unwrap_or_default();
    let dep_id = task.dep_id.clone().unwrap_or_default();

    let payload = UserPayload::new(&task.oa_id, &task.name, &task.email, &task.code, &org_id, &dep_id);

    if remaining.contains(Action::CREATE) {
        match target.create_user(&payload).await {
            Ok(id) => {
                user_id = Some(id);
                remaining = remaining.clear(Action::CREATE);
            }
            Err(e) => return Err((task.code, remaining, e.to_string())),
        }
    }

    if remaining.contains(Action::RENAME) {
        let Some(id) = &user_id else {
            return Err((task.code, remaining, "no user id to rename".to_string()));
        };
        match target.update_user(id, &payload).await {
            Ok(()) => remaining = remaining.clear(Action::RENAME),
            Err(e) => return Err((task.code, remaining, e.to_string())),
        }
    }

    if remaining.contains(Action::MOVE) {
        let Some(id) = &user_id else {
            return Err((task.code, remaining, "no user id to move".to_string()));
        };
        match target.move_user(id, &org_id, &dep_id).await {
            Ok(()) => remaining = remaining.clear(Action::MOVE),
            Err(e) => return Err((task.code, remaining, e.to_string())),
        }
    }

    if remaining.contains(Action::DELETE) {
        let Some(id) = &user_id else {
            return Err((task.code, remaining, "no user id to delete".to_string()));
        };
        match target.remove_user(id).await {
            Ok(()) => remaining = remaining.clear(Action::DELETE),
            Err(e) => return Err((task.code, remaining, e.to_string())),
        }
    }

    debug_assert!(remaining.is_none());
    let resolved_id = user_id.ok_or_else(|| (task.code.clone(), remaining, "task completed with no user id".to_string()))?;
    Ok((task.code, resolved_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgentError;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingTarget {
        renamed: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TargetApi for RecordingTarget {
        async fn list_roots(&self) -> Result<Vec<crate::target::types::RootInfo>, AgentError> {
            unimplemented!()
        }
        async fn list_tree(&self, _org_id: &str) -> Result<Vec<crate::target::types::TreeNode>, AgentError> {
            unimplemented!()
        }
        async fn list_users(&self) -> Result<Vec<crate::target::types::TargetUserInfo>, AgentError> {
            unimplemented!()
        }
        async fn create_root(&self, _name: &str, _origin_id: &str) -> Result<String, AgentError> {
            unimplemented!()
        }
        async fn create_department(
            &self,
            _org_id: &str,
            _name: &str,
            _origin_id: &str,
            _parent_id: Option<&str>,
        ) -> Result<String, AgentError> {
            unimplemented!()
        }
        async fn rename_department(&self, _org_id: &str, _dep_id: &str, _name: &str) -> Result<(), AgentError> {
            unimplemented!()
        }
        async fn move_department(&self, _org_id: &str, _dep_id: &str, _new_parent_id: &str) -> Result<(), AgentError> {
            unimplemented!()
        }
        async fn delete_department(&self, _org_id: &str, _dep_id: &str) -> Result<(), AgentError> {
            unimplemented!()
        }
        async fn create_user(&self, _payload: &UserPayload) -> Result<String, AgentError> {
            unimplemented!()
        }
        async fn update_user(&self, user_id: &str, _payload: &UserPayload) -> Result<(), AgentError> {
            self.renamed.lock().unwrap().push(user_id.to_string());
            Ok(())
        }
        async fn move_user(&self, _user_id: &str, _org_id: &str, _dep_id: &str) -> Result<(), AgentError> {
            Ok(())
        }
        async fn remove_user(&self, _user_id: &str) -> Result<(), AgentError> {
            Ok(())
        }
    }

    fn rename_task(n: usize) -> UserTask {
        UserTask {
            code: format!("U{n}"),
            name: format!("User {n}"),
            email: String::new(),
            oa_id: format!("oa{n}"),
            org_id: Some("org-1".to_string()),
            dep_id: Some("dep-1".to_string()),
            action: Action::RENAME,
            user_id: Some(format!("id-{n}")),
        }
    }

    #[tokio::test]
    async fn every_task_across_every_shard_runs_exactly_once() {
        let recording = Arc::new(RecordingTarget::default());
        let mut queue = Queue::new();
        for i in 0..1000 {
            queue.push(rename_task(i));
        }

        let report = execute_user_plan(recording.clone(), queue, 10).await;
        assert_eq!(report.completed, 1000);
        assert!(report.failures.is_empty());

        let calls = recording.renamed.lock().unwrap();
        let unique: HashSet<&String> = calls.iter().collect();
        assert_eq!(calls.len(), 1000, "no call should be dropped or duplicated");
        assert_eq!(unique.len(), 1000, "no user id should be called twice");
    }

    /// Records every sub-action it's called for, in the order they land,
    /// so a test can assert the fixed Create->Rename->Move->Delete order
    /// held for a single task carrying all four bits.
    #[derive(Default)]
    struct FullLifecycleTarget {
        calls: Mutex<Vec<&'static str>>,
    }

    #[async_trait]
    impl TargetApi for FullLifecycleTarget {
        async fn list_roots(&self) -> Result<Vec<crate::target::types::RootInfo>, AgentError> {
            unimplemented!()
        }
        async fn list_tree(&self, _org_id: &str) -> Result<Vec<crate::target::types::TreeNode>, AgentError> {
            unimplemented!()
        }
        async fn list_users(&self) -> Result<Vec<crate::target::types::TargetUserInfo>, AgentError> {
            unimplemented!()
        }
        async fn create_root(&self, _name: &str, _origin_id: &str) -> Result<String, AgentError> {
            unimplemented!()
        }
        async fn create_department(
            &self,
            _org_id: &str,
            _name: &str,
            _origin_id: &str,
            _parent_id: Option<&str>,
        ) -> Result<String, AgentError> {
            unimplemented!()
        }
        async fn rename_department(&self, _org_id: &str, _dep_id: &str, _name: &str) -> Result<(), AgentError> {
            unimplemented!()
        }
        async fn move_department(&self, _org_id: &str, _dep_id: &str, _new_parent_id: &str) -> Result<(), AgentError> {
            unimplemented!()
        }
        async fn delete_department(&self, _org_id: &str, _dep_id: &str) -> Result<(), AgentError> {
            unimplemented!()
        }
        async fn create_user(&self, _payload: &UserPayload) -> Result<String, AgentError> {
            self.calls.lock().unwrap().push("create");
            Ok("id-new".to_string())
        }
        async fn update_user(&self, _user_id: &str, _payload: &UserPayload) -> Result<(), AgentError> {
            self.calls.lock().unwrap().push("rename");
            Ok(())
        }
        async fn move_user(&self, _user_id: &str, _org_id: &str, _dep_id: &str) -> Result<(), AgentError> {
            self.calls.lock().unwrap().push("move");
            Ok(())
        }
        async fn remove_user(&self, _user_id: &str) -> Result<(), AgentError> {
            self.calls.lock().unwrap().push("delete");
            Ok(())
        }
    }

    fn full_lifecycle_task() -> UserTask {
        UserTask {
            code: "U1".to_string(),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            oa_id: "oa1".to_string(),
            org_id: Some("org-1".to_string()),
            dep_id: Some("dep-1".to_string()),
            action: Action::CREATE | Action::RENAME | Action::MOVE | Action::DELETE,
            user_id: None,
        }
    }

    #[tokio::test]
    async fn a_task_carrying_all_four_bits_runs_them_in_fixed_order() {
        let target = FullLifecycleTarget::default();
        let (code, user_id) = run_task(&target, full_lifecycle_task()).await.unwrap();

        assert_eq!(code, "U1");
        assert_eq!(user_id, "id-new");
        assert_eq!(*target.calls.lock().unwrap(), vec!["create", "rename", "move", "delete"]);
    }

    #[tokio::test]
    async fn a_retried_task_only_reruns_the_bits_still_set() {
        // Simulate a task that already completed Create and Rename in an
        // earlier attempt (P5): only Move and Delete remain set, and the
        // resolved user id from that earlier create carries forward.
        let target = FullLifecycleTarget::default();
        let mut task = full_lifecycle_task();
        task.action = Action::MOVE | Action::DELETE;
        task.user_id = Some("id-existing".to_string());

        let (code, user_id) = run_task(&target, task).await.unwrap();

        assert_eq!(code, "U1");
        assert_eq!(user_id, "id-existing");
        assert_eq!(*target.calls.lock().unwrap(), vec!["move", "delete"]);
    }
}
