//! User plan (spec.md §4.6): diffs eligible SoT employees against a user
//! baseline and emits a single task queue carrying a combined action
//! bitmask per user (spec.md §4.7's executor relies on this to run all
//! four sub-actions for one user in a fixed order without requeuing).
//!
//! Grounded in `syncdata.go`'s employee comparison pass, which folds
//! create/rename/move into one task per `userCode` rather than the
//! separate per-action queues the department planner uses, since
//! departments must be created in parent-before-child order but users
//! have no such ordering constraint.

use crate::forest::Forest;
use crate::model::{Action, UserNode, UserRecord};
use crate::plan::UserBaseline;
use crate::queue::Queue;

#[derive(Debug, Clone)]
pub struct UserTask {
    pub code: String,
    pub name: String,
    pub email: String,
    pub oa_id: String,
    pub org_id: Option<String>,
    pub dep_id: Option<String>,
    pub action: Action,
    /// Set when the baseline already knows this user (absent for a pure create).
    pub user_id: Option<String>,
}

/// Resolve each eligible record's target org/dep ids from the already
/// diffed-and-executed department forest, then diff against the user
/// baseline. Records whose department isn't in the forest (filtered,
/// inactive, or never arrived) are dropped — `is_eligible` narrows by
/// the record's own status, this narrows by its department's.
pub fn plan_users(records: &[UserRecord], forest: &Forest, baseline: &dyn UserBaseline) -> Queue<UserTask> {
    let mut queue = Queue::new();
    let mut seen = std::collections::HashSet::new();

    for record in records {
        if !UserNode::is_eligible(record) {
            continue;
        }
        let Some(dept) = forest.get(&record.org_code) else { continue };
        if !dept.status.is_active() {
            continue;
        }
        let Some(org_id) = &dept.org_id else { continue };
        let Some(dep_id) = &dept.dep_id else { continue };

        seen.insert(record.code.clone());

        match baseline.lookup(&record.code) {
            None => {
                queue.push(UserTask {
                    code: record.code.clone(),
                    name: record.name.clone(),
                    email: record.email.clone(),
                    oa_id: record.oa_id.clone(),
                    org_id: Some(org_id.clone()),
                    dep_id: Some(dep_id.clone()),
                    action: Action::CREATE,
                    user_id: None,
                });
            }
            Some(entry) => {
                let mut action = Action::NONE;
                if entry.display_name != record.name || entry.email != record.email || entry.oa_id != record.oa_id {
                    action.insert(Action::RENAME);
                }
                if entry.org_id != *org_id || entry.dep_id != *dep_id {
                    action.insert(Action::MOVE);
                }
                if !action.is_none() {
                    queue.push(UserTask {
                        code: record.code.clone(),
                        name: record.name.clone(),
                        email: record.email.clone(),
                        oa_id: record.oa_id.clone(),
                        org_id: Some(org_id.clone()),
                        dep_id: Some(dep_id.clone()),
                        action,
                        user_id: Some(entry.user_id.clone()),
                    });
                }
            }
        }
    }

    for known_code in baseline.known_codes() {
        if seen.contains(&known_code) {
            continue;
        }
        if let Some(entry) = baseline.lookup(&known_code) {
            queue.push(UserTask {
                code: known_code,
                name: entry.display_name,
                email: entry.email,
                oa_id: String::new(),
                org_id: Some(entry.org_id),
                dep_id: Some(entry.dep_id),
                action: Action::DELETE,
                user_id: Some(entry.user_id),
            });
        }
    }

    queue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::ROOT_CODE;
    use crate::model::{NodeStatus, OrgNode};
    use crate::plan::BaselineUserEntry;
    use std::collections::HashMap;

    struct FakeBaseline(HashMap<String, BaselineUserEntry>);

    impl UserBaseline for FakeBaseline {
        fn lookup(&self, code: &str) -> Option<BaselineUserEntry> {
            self.0.get(code).cloned()
        }
        fn known_codes(&self) -> Vec<String> {
            self.0.keys().cloned().collect()
        }
    }

    fn forest_with_dept(code: &str, org_id: &str, dep_id: &str) -> Forest {
        let mut dept = OrgNode::new_virtual(code.to_string(), "Engineering".to_string());
        dept.status = NodeStatus::Active;
        dept.org_id = Some(org_id.to_string());
        dept.dep_id = Some(dep_id.to_string());
        let mut forest = Forest::new();
        forest.insert(code.to_string(), dept);
        forest.insert(ROOT_CODE.to_string(), OrgNode::new_root(ROOT_CODE.to_string(), "Acme".into()));
        forest
    }

    fn rec(code: &str, name: &str, oa_id: &str, status: &str, org_code: &str) -> UserRecord {
        UserRecord {
            code: code.to_string(),
            name: name.to_string(),
            email: String::new(),
            status: status.to_string(),
            oa_id: oa_id.to_string(),
            org_code: org_code.to_string(),
        }
    }

    #[test]
    fn ineligible_records_are_skipped() {
        let forest = forest_with_dept("ENG", "org-1", "dep-1");
        let records = vec![rec("U1", "", "oa1", "1", "ENG")];
        let plan = plan_users(&records, &forest, &FakeBaseline(HashMap::new()));
        assert!(plan.is_empty());
    }

    #[test]
    fn new_user_is_a_create_with_resolved_dept_ids() {
        let forest = forest_with_dept("ENG", "org-1", "dep-1");
        let records = vec![rec("U1", "Alice", "oa1", "1", "ENG")];
        let mut plan = plan_users(&records, &forest, &FakeBaseline(HashMap::new()));
        let task = plan.pop().unwrap();
        assert!(task.action.contains(Action::CREATE));
        assert_eq!(task.org_id.as_deref(), Some("org-1"));
        assert_eq!(task.dep_id.as_deref(), Some("dep-1"));
    }

    #[test]
    fn moved_user_gets_move_bit_without_touching_create() {
        let forest = forest_with_dept("ENG", "org-1", "dep-2");
        let records = vec![rec("U1", "Alice", "oa1", "1", "ENG")];
        let mut baseline_map = HashMap::new();
        baseline_map.insert(
            "U1".to_string(),
            BaselineUserEntry {
                user_id: "u-1".into(),
                org_id: "org-1".into(),
                dep_id: "dep-1".into(),
                display_name: "Alice".into(),
                email: String::new(),
                oa_id: "oa1".into(),
            },
        );
        let mut plan = plan_users(&records, &forest, &FakeBaseline(baseline_map));
        let task = plan.pop().unwrap();
        assert!(task.action.contains(Action::MOVE));
        assert!(!task.action.contains(Action::CREATE));
    }
}
