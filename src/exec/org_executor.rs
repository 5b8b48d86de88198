//! Department executor (spec.md §4.7): serial, in the order the planner
//! already sorted the queues in — creates walk parent-before-child, so a
//! create failure stops the create queue rather than attempting a child
//! whose parent doesn't exist; renames/moves are independent across
//! departments, so one failing doesn't block the rest.
//!
//! Grounded in `syncdata.go`'s `ProcessOrgTaskQueue`/`ProcessDelOrgTaskQueue`:
//! creates and updates run together here (`execute_org_plan`), but the
//! delete queue is a separate step (`execute_org_deletes`) the caller
//! must run strictly after the user executor, per spec.md §4.10 step 5 /
//! §5's ordering guarantee — a department must not be deleted out from
//! under a user move that hasn't run yet this cycle.

use crate::error::AgentError;
use crate::forest::{Forest, ROOT_CODE};
use crate::model::Action;
use crate::plan::org_planner::{OrgPlan, OrgTask};
use crate::queue::Queue;
use crate::target::TargetApi;

#[derive(Debug, Default)]
pub struct OrgExecutionReport {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub failures: Vec<(String, String)>,
}

pub async fn execute_org_plan(
    target: &dyn TargetApi,
    mut plan: OrgPlan,
    forest: &mut Forest,
) -> OrgExecutionReport {
    let mut report = OrgExecutionReport::default();

    while let Some(task) = plan.creates.pop() {
        if task.is_root {
            match target.create_root(&task.name, &task.code).await {
                Ok(org_id) => {
                    if let Some(node) = forest.get_mut(&task.code) {
                        node.org_id = Some(org_id);
                        // The root has no `depId` of its own (spec.md
                        // §4.3/§6: `createRoot` returns only an `orgId`),
                        // so it's left unset rather than aliased to the
                        // org id — `resolve_create_parent` below treats
                        // that as "omit `parentId`" for the root's
                        // direct children, matching scenario 1.
                        node.dep_id = None;
                    }
                    report.created += 1;
                }
                Err(e) => {
                    tracing::error!(code = %task.code, error = %e, "root create failed, halting create queue");
                    report.failures.push((task.code.clone(), e.to_string()));
                    break;
                }
            }
            continue;
        }

        let (parent_org_id, parent_dep_id) = match resolve_create_parent(forest, task.parent_code.as_deref()) {
            Some(resolved) => resolved,
            None => {
                tracing::error!(code = %task.code, "parent department has no resolved id, skipping create");
                report
                    .failures
                    .push((task.code.clone(), "parent not yet created".to_string()));
                continue;
            }
        };

        match target
            .create_department(&parent_org_id, &task.name, &task.code, parent_dep_id.as_deref())
            .await
        {
            Ok(dep_id) => {
                if let Some(node) = forest.get_mut(&task.code) {
                    node.org_id = Some(parent_org_id);
                    node.dep_id = Some(dep_id);
                }
                report.created += 1;
            }
            Err(e) => {
                tracing::error!(code = %task.code, error = %e, "department create failed, halting create queue");
                report.failures.push((task.code.clone(), e.to_string()));
                break;
            }
        }
    }

    while let Some(task) = plan.updates.pop() {
        let (Some(org_id), Some(dep_id)) = (task.org_id.clone(), task.dep_id.clone()) else {
            continue;
        };

        if task.action.contains(Action::RENAME) {
            if let Err(e) = target.rename_department(&org_id, &dep_id, &task.name).await {
                tracing::warn!(code = %task.code, error = %e, "department rename failed");
                report.failures.push((task.code.clone(), e.to_string()));
                continue;
            }
        }

        if task.action.contains(Action::MOVE) {
            match resolve_ids(forest, task.parent_code.as_deref()) {
                Some((_, new_parent_dep_id)) => {
                    if let Err(e) = target.move_department(&org_id, &dep_id, &new_parent_dep_id).await {
                        tracing::warn!(code = %task.code, error = %e, "department move failed");
                        report.failures.push((task.code.clone(), e.to_string()));
                        continue;
                    }
                }
                None => {
                    tracing::error!(code = %task.code, "new parent department has no resolved id, skipping move");
                    report
                        .failures
                        .push((task.code.clone(), "new parent not resolved".to_string()));
                    continue;
                }
            }
        }

        report.updated += 1;
    }

    report
}

/// Drain the department delete queue. Kept separate from
/// `execute_org_plan` so the caller can run it after the user executor
/// (spec.md §4.10 step 5): deletes detach a department's directory
/// entry, and a user not yet moved out of it this cycle would otherwise
/// be orphaned.
pub async fn execute_org_deletes(target: &dyn TargetApi, mut deletes: Queue<OrgTask>) -> OrgExecutionReport {
    let mut report = OrgExecutionReport::default();

    while let Some(task) = deletes.pop() {
        let (Some(org_id), Some(dep_id)) = (task.org_id.clone(), task.dep_id.clone()) else {
            continue;
        };
        match target.delete_department(&org_id, &dep_id).await {
            Ok(()) => report.deleted += 1,
            Err(e) => {
                tracing::warn!(code = %task.code, error = %e, "department delete failed");
                report.failures.push((task.code.clone(), e.to_string()));
            }
        }
    }

    report
}

fn resolve_ids(forest: &Forest, code: Option<&str>) -> Option<(String, String)> {
    let code = code?;
    let node = if code == ROOT_CODE {
        forest.get(ROOT_CODE)
    } else {
        forest.get(code)
    }?;
    Some((node.org_id.clone()?, node.dep_id.clone()?))
}

/// Resolve a create task's intended parent into `(orgId, parentDepId)`.
/// A department created directly under the synthetic root omits
/// `parentId` entirely (spec.md §4.3, scenario 1: `parentId` is `null`
/// for a top-level department) since the root carries no `depId` of its
/// own; any other parent must already have both ids resolved.
fn resolve_create_parent(forest: &Forest, code: Option<&str>) -> Option<(String, Option<String>)> {
    let code = code?;
    if code == ROOT_CODE {
        let org_id = forest.get(ROOT_CODE)?.org_id.clone()?;
        return Some((org_id, None));
    }
    let node = forest.get(code)?;
    Some((node.org_id.clone()?, Some(node.dep_id.clone()?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeStatus, OrgNode};
    use crate::plan::org_planner::OrgTask;
    use crate::queue::Queue;
    use crate::target::types::UserPayload;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeTarget {
        created_departments: Mutex<Vec<(String, String)>>,
        fail_code: Option<String>,
    }

    #[async_trait]
    impl TargetApi for FakeTarget {
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
            Ok("org-1".to_string())
        }
        async fn create_department(
            &self,
            org_id: &str,
            _name: &str,
            origin_id: &str,
            _parent_id: Option<&str>,
        ) -> Result<String, AgentError> {
            if self.fail_code.as_deref() == Some(origin_id) {
                return Err(AgentError::TargetRejected {
                    status: 400,
                    body: "nope".into(),
                });
            }
            let dep_id = format!("dep-{}", origin_id);
            self.created_departments
                .lock()
                .unwrap()
                .push((org_id.to_string(), dep_id.clone()));
            Ok(dep_id)
        }
        async fn rename_department(&self, _org_id: &str, _dep_id: &str, _name: &str) -> Result<(), AgentError> {
            Ok(())
        }
        async fn move_department(&self, _org_id: &str, _dep_id: &str, _new_parent_id: &str) -> Result<(), AgentError> {
            Ok(())
        }
        async fn delete_department(&self, _org_id: &str, _dep_id: &str) -> Result<(), AgentError> {
            Ok(())
        }
        async fn create_user(&self, _payload: &UserPayload) -> Result<String, AgentError> {
            unimplemented!()
        }
        async fn update_user(&self, _user_id: &str, _payload: &UserPayload) -> Result<(), AgentError> {
            unimplemented!()
        }
        async fn move_user(&self, _user_id: &str, _org_id: &str, _dep_id: &str) -> Result<(), AgentError> {
            unimplemented!()
        }
        async fn remove_user(&self, _user_id: &str) -> Result<(), AgentError> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn creates_run_parent_before_child_and_stamp_the_forest() {
        let mut forest = Forest::new();
        forest.insert(ROOT_CODE.to_string(), OrgNode::new_root(ROOT_CODE.to_string(), "Acme".into()));
        let mut eng = OrgNode::new_virtual("ENG".to_string(), "Engineering".to_string());
        eng.status = NodeStatus::Active;
        eng.parent_code = Some(ROOT_CODE.to_string());
        forest.insert("ENG".to_string(), eng);

        let mut creates = Queue::new();
        creates.push(OrgTask {
            code: ROOT_CODE.to_string(),
            name: "Acme".to_string(),
            parent_code: None,
            action: Action::CREATE,
            is_root: true,
            dep_id: None,
            org_id: None,
        });
        creates.push(OrgTask {
            code: "ENG".to_string(),
            name: "Engineering".to_string(),
            parent_code: Some(ROOT_CODE.to_string()),
            action: Action::CREATE,
            is_root: false,
            dep_id: None,
            org_id: None,
        });

        let plan = OrgPlan {
            creates,
            updates: Queue::new(),
            deletes: Queue::new(),
        };
        let target = FakeTarget::default();
        let report = execute_org_plan(&target, plan, &mut forest).await;

        assert_eq!(report.created, 2);
        assert!(report.failures.is_empty());
        assert_eq!(forest["ENG"].dep_id.as_deref(), Some("dep-ENG"));
    }

    #[tokio::test]
    async fn a_failed_create_halts_remaining_creates() {
        let mut forest = Forest::new();
        forest.insert(ROOT_CODE.to_string(), OrgNode::new_root(ROOT_CODE.to_string(), "Acme".into()));
        let root = forest.get_mut(ROOT_CODE).unwrap();
        root.org_id = Some("org-1".to_string());
        root.dep_id = Some("org-1".to_string());

        let mut creates = Queue::new();
        creates.push(OrgTask {
            code: "ENG".to_string(),
            name: "Engineering".to_string(),
            parent_code: Some(ROOT_CODE.to_string()),
            action: Action::CREATE,
            is_root: false,
            dep_id: None,
            org_id: None,
        });
        creates.push(OrgTask {
            code: "SALES".to_string(),
            name: "Sales".to_string(),
            parent_code: Some(ROOT_CODE.to_string()),
            action: Action::CREATE,
            is_root: false,
            dep_id: None,
            org_id: None,
        });

        let plan = OrgPlan {
            creates,
            updates: Queue::new(),
            deletes: Queue::new(),
        };
        let target = FakeTarget {
            fail_code: Some("ENG".to_string()),
            ..Default::default()
        };
        let report = execute_org_plan(&target, plan, &mut forest).await;

        assert_eq!(report.created, 0);
        assert_eq!(report.failures.len(), 1);
    }
}
