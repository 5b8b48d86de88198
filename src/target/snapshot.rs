//! Target snapshot (spec.md §4.9): the one-shot full scan of the
//! target's current org tree and user roster, used only as the baseline
//! for the very first cycle after process start.
//!
//! Grounded in `syncdata.go`'s `GetOrgDataFromOneAuth`/`GetUserDataFromOneAuth`:
//! walk every root's tree, then every user page, building the two
//! lookup maps spec.md §3 describes. The two-map structure there (by
//! external code, by internal id) is modeled here as one map keyed by
//! external code plus a second id-to-code index used only while
//! resolving `fatherCode`/`fatherName` in the second pass — the finished
//! snapshot only ever needs to be read by external code.

use std::collections::HashMap;

use crate::error::AgentError;
use crate::target::client::TargetApi;

/// A department as the target currently has it, keyed by external code
/// (spec.md's `TargetDeptSnapshot` entry shape, minus `matched`: see
/// DESIGN.md for why that flag isn't carried on the snapshot itself).
#[derive(Debug, Clone)]
pub struct DeptEntry {
    pub org_id: String,
    pub dep_id: String,
    pub name: String,
    pub father_code: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TargetDeptSnapshot {
    by_code: HashMap<String, DeptEntry>,
}

impl TargetDeptSnapshot {
    pub fn get_by_code(&self, code: &str) -> Option<&DeptEntry> {
        self.by_code.get(code)
    }

    pub fn codes(&self) -> impl Iterator<Item = &String> {
        self.by_code.keys()
    }
}

/// A user as the target currently has it, keyed by employee id (the SoT
/// `code`, spec.md's `TargetUserSnapshot` entry shape minus `matched`).
#[derive(Debug, Clone)]
pub struct UserEntry {
    pub user_id: String,
    pub org_id: String,
    pub dep_id: String,
    pub display_name: String,
    pub email: String,
    pub oa_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct TargetUserSnapshot {
    entries: HashMap<String, UserEntry>,
}

impl TargetUserSnapshot {
    pub fn get(&self, code: &str) -> Option<&UserEntry> {
        self.entries.get(code)
    }

    pub fn codes(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }
}

/// Full target scan: every root's org tree, flattened into the
/// code-keyed snapshot, followed by every page of users. Called exactly
/// once, right before the first cycle's planning (`cycle::run_once`).
pub async fn scan(target: &dyn TargetApi) -> Result<(TargetDeptSnapshot, TargetUserSnapshot), AgentError> {
    let roots = target.list_roots().await?;

    // First pass: every known internal id (an org's own id, or a
    // department's `depId`) resolves to the external code it was
    // created with, so the second pass can translate a `parentId` into
    // the `fatherCode`/`fatherName` pair the planner diffs by.
    let mut by_internal_id: HashMap<String, String> = HashMap::new();
    let mut by_code: HashMap<String, DeptEntry> = HashMap::new();

    for root in &roots {
        // The root has no SoT record to key by; it's keyed by its own
        // display name instead, matching `org_planner::baseline_key`'s
        // convention for the synthetic root (spec.md §4.5).
        by_internal_id.insert(root.org_id.clone(), root.name.clone());
        by_code.insert(
            root.name.clone(),
            DeptEntry {
                org_id: root.org_id.clone(),
                dep_id: root.org_id.clone(),
                name: root.name.clone(),
                father_code: None,
            },
        );
    }

    let mut tree_nodes = Vec::new();
    for root in &roots {
        let nodes = target.list_tree(&root.org_id).await?;
        for node in nodes {
            by_internal_id.insert(node.dep_id.clone(), node.origin_id.clone());
            tree_nodes.push((root.org_id.clone(), node));
        }
    }

    // Second pass: every department's `parentId` is now resolvable
    // against `by_internal_id`, whether it points at a sibling
    // department or directly at the org's root.
    for (org_id, node) in tree_nodes {
        let father_code = node.parent_id.as_ref().and_then(|pid| by_internal_id.get(pid).cloned());
        by_code.insert(
            node.origin_id.clone(),
            DeptEntry {
                org_id: org_id.clone(),
                dep_id: node.dep_id.clone(),
                name: node.name.clone(),
                father_code,
            },
        );
    }

    let mut entries = HashMap::new();
    for user in target.list_users().await? {
        let Some((org_id, dep_id)) = user.first_department() else {
            continue;
        };
        entries.insert(
            user.employee_id.clone(),
            UserEntry {
                user_id: user.user_id.clone(),
                org_id,
                dep_id,
                display_name: user.display_name.clone(),
                email: user.email.clone(),
                oa_id: user.account.clone(),
            },
        );
    }

    Ok((TargetDeptSnapshot { by_code }, TargetUserSnapshot { entries }))
}
