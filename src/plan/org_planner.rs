//! Department plan (spec.md §4.5): level-order walk of the forest,
//! diffed against a baseline, emitting create/update/delete queues.
//!
//! Grounded in `syncdata.go`'s `CompareDataBakAndCreateOrgTask` (target
//! baseline) and `CompareUpsteramAndCreateOrgTask` (SoT baseline) — both
//! walk the tree root-to-leaf so a department's create task is always
//! queued after its parent's, and both queue deletes last so a department
//! is never removed out from under children still being moved into it.

use std::collections::{HashSet, VecDeque};

use crate::forest::{Forest, ROOT_CODE};
use crate::model::{Action, NodeStatus};
use crate::plan::OrgBaseline;
use crate::queue::Queue;

#[derive(Debug, Clone)]
pub struct OrgTask {
    pub code: String,
    pub name: String,
    pub parent_code: Option<String>,
    pub action: Action,
    pub is_root: bool,
    /// Present once the baseline already knows this department (used by
    /// the executor for rename/move/delete; absent for a pure create).
    pub dep_id: Option<String>,
    pub org_id: Option<String>,
}

#[derive(Debug, Default)]
pub struct OrgPlan {
    pub creates: Queue<OrgTask>,
    pub updates: Queue<OrgTask>,
    pub deletes: Queue<OrgTask>,
}

/// The baseline-facing key for a node: the root's synthetic code never
/// appears in baseline data, which keys the root by its configured name.
pub(crate) fn baseline_key<'a>(code: &'a str, name: &'a str) -> &'a str {
    if code == ROOT_CODE {
        name
    } else {
        code
    }
}

pub fn plan_org(forest: &mut Forest, baseline: &dyn OrgBaseline) -> OrgPlan {
    let mut plan = OrgPlan::default();
    let mut seen_codes: HashSet<String> = HashSet::new();

    let mut queue: VecDeque<String> = VecDeque::new();
    queue.push_back(ROOT_CODE.to_string());

    while let Some(code) = queue.pop_front() {
        let (is_active, name, parent_code, is_root, children) = {
            let Some(node) = forest.get(&code) else { continue };
            (
                node.status.is_active(),
                node.name.clone(),
                node.parent_code.clone(),
                node.root,
                node.children.clone(),
            )
        };
        if !is_active {
            // Inactive/filtered nodes are skipped entirely; their
            // children are pruned before planning ever sees them.
            continue;
        }

        for child in &children {
            queue.push_back(child.clone());
        }

        let key = baseline_key(&code, &name).to_string();
        seen_codes.insert(key.clone());

        match baseline.lookup(&key) {
            None => {
                plan.creates.push(OrgTask {
                    code: code.clone(),
                    name: name.clone(),
                    parent_code: parent_code.clone(),
                    action: Action::CREATE,
                    is_root,
                    dep_id: None,
                    org_id: None,
                });
            }
            Some(entry) => {
                // Stamp shadow fields for every matched node, not only
                // ones with a pending task, so the executor can resolve
                // a not-yet-touched department as a parent for a sibling
                // that does need a create/move.
                if let Some(node) = forest.get_mut(&code) {
                    node.org_id = Some(entry.org_id.clone());
                    node.dep_id = Some(entry.dep_id.clone());
                    node.father_id = entry.father_code.clone();
                }

                // The root is never updated in this cycle (spec.md §4.5):
                // its name/parent are fixed configuration, not diffed.
                let mut action = Action::NONE;
                if !is_root {
                    if entry.name != name {
                        action.insert(Action::RENAME);
                    }
                    let father_matches = match (&entry.father_code, &parent_code) {
                        (Some(f), Some(p)) => f == p || (p.as_str() == ROOT_CODE && is_root_alias(f, forest)),
                        (None, None) => true,
                        (None, Some(p)) => p.as_str() == ROOT_CODE,
                        (Some(_), None) => false,
                    };
                    if !father_matches {
                        action.insert(Action::MOVE);
                    }
                }
                if !action.is_none() {
                    plan.updates.push(OrgTask {
                        code: code.clone(),
                        name: name.clone(),
                        parent_code: parent_code.clone(),
                        action,
                        is_root,
                        dep_id: Some(entry.dep_id.clone()),
                        org_id: Some(entry.org_id.clone()),
                    });
                }
            }
        }
    }

    for known_code in baseline.known_codes() {
        if seen_codes.contains(&known_code) {
            continue;
        }
        if let Some(entry) = baseline.lookup(&known_code) {
            plan.deletes.push(OrgTask {
                code: known_code,
                name: entry.name,
                parent_code: entry.father_code,
                action: Action::DELETE,
                is_root: false,
                dep_id: Some(entry.dep_id),
                org_id: Some(entry.org_id),
            });
        }
    }

    plan
}

/// True if `father_code` is the root's own baseline key (its configured
/// name) — used when a department's current parent is the synthetic
/// root but the baseline recorded its father as the root's real name.
fn is_root_alias(father_code: &str, forest: &Forest) -> bool {
    forest.get(ROOT_CODE).map(|r| r.name == father_code).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OrgNode;
    use crate::plan::BaselineOrgEntry;
    use std::collections::HashMap;

    struct FakeBaseline(HashMap<String, BaselineOrgEntry>);

    impl OrgBaseline for FakeBaseline {
        fn lookup(&self, code: &str) -> Option<BaselineOrgEntry> {
            self.0.get(code).cloned()
        }
        fn known_codes(&self) -> Vec<String> {
            self.0.keys().cloned().collect()
        }
    }

    fn forest_with(nodes: Vec<OrgNode>) -> Forest {
        nodes.into_iter().map(|n| (n.code.clone(), n)).collect()
    }

    #[test]
    fn new_department_with_no_baseline_entry_is_a_create() {
        let mut root = OrgNode::new_root(ROOT_CODE.to_string(), "Acme".to_string());
        root.children.push("ENG".to_string());
        let mut eng = OrgNode::new_virtual("ENG".to_string(), "Engineering".to_string());
        eng.status = NodeStatus::Active;
        eng.parent_code = Some(ROOT_CODE.to_string());

        let mut forest = forest_with(vec![root, eng]);
        let baseline = FakeBaseline(HashMap::new());
        let plan = plan_org(&mut forest, &baseline);

        assert_eq!(plan.creates.len(), 2); // root + ENG
        assert!(plan.updates.is_empty());
        assert!(plan.deletes.is_empty());
    }

    #[test]
    fn renamed_department_emits_an_update_with_rename_bit() {
        let mut root = OrgNode::new_root(ROOT_CODE.to_string(), "Acme".to_string());
        root.children.push("ENG".to_string());
        let mut eng = OrgNode::new_virtual("ENG".to_string(), "Engineering Dept".to_string());
        eng.status = NodeStatus::Active;
        eng.parent_code = Some(ROOT_CODE.to_string());

        let mut forest = forest_with(vec![root.clone(), eng]);

        let mut baseline_map = HashMap::new();
        baseline_map.insert(
            "Acme".to_string(),
            BaselineOrgEntry {
                org_id: "org-1".into(),
                dep_id: "org-1".into(),
                name: "Acme".into(),
                father_code: None,
            },
        );
        baseline_map.insert(
            "ENG".to_string(),
            BaselineOrgEntry {
                org_id: "org-1".into(),
                dep_id: "dep-1".into(),
                name: "Engineering".into(),
                father_code: Some("Acme".into()),
            },
        );
        let baseline = FakeBaseline(baseline_map);
        let plan = plan_org(&mut forest, &baseline);

        assert!(plan.creates.is_empty());
        assert_eq!(plan.updates.len(), 1);
        let task = plan.updates.into_vec().remove(0);
        assert!(task.action.contains(Action::RENAME));
        assert!(!task.action.contains(Action::MOVE));
    }

    #[test]
    fn baseline_entry_absent_from_forest_is_deleted() {
        let root = OrgNode::new_root(ROOT_CODE.to_string(), "Acme".to_string());
        let mut forest = forest_with(vec![root]);

        let mut baseline_map = HashMap::new();
        baseline_map.insert(
            "Acme".to_string(),
            BaselineOrgEntry {
                org_id: "org-1".into(),
                dep_id: "org-1".into(),
                name: "Acme".into(),
                father_code: None,
            },
        );
        baseline_map.insert(
            "GONE".to_string(),
            BaselineOrgEntry {
                org_id: "org-1".into(),
                dep_id: "dep-9".into(),
                name: "Removed".into(),
                father_code: Some("Acme".into()),
            },
        );
        let baseline = FakeBaseline(baseline_map);
        let plan = plan_org(&mut forest, &baseline);

        assert_eq!(plan.deletes.len(), 1);
    }
}
