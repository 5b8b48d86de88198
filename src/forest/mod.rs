//! Forest reconstruction (spec.md §4.4): turns the SoT's flat, forward-
//! referencing department list into a rooted tree, synthesizes a root and
//! any missing intermediate (virtual) parents, then prunes inactive,
//! filtered, and unreachable branches.
//!
//! Grounded in `syncdata.go`'s `ProcessDataApiOrgRsp`: a single pass over
//! the flat list builds parent/child links on demand (inserting a
//! placeholder node the first time a `upperOrgUnitCode` is referenced
//! before its own record arrives), followed by a synthetic root, a
//! status-cascade pass, a physical delete of every non-active subtree
//! (`FilterOrgMap`/`DeleteOrgNode`), and a final BFS-reachability prune.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::config::AgentConfig;
use crate::model::{normalize_name, NodeStatus, OrgNode, OrgRecord};

/// Code of the synthetic root every reconstructed forest is rooted at.
/// Never collides with a real SoT `orgUnitCode`, which the upstream system
/// always allocates non-empty and without this prefix.
pub const ROOT_CODE: &str = "__orgsync_root__";

/// Code of the synthetic default-tree grouping node, used only when
/// `default_tree` is configured (SPEC_FULL.md §3 supplement).
const DEFAULT_TREE_CODE: &str = "__orgsync_default_tree__";

pub type Forest = HashMap<String, OrgNode>;

/// Build, prune, and (optionally) re-root the department forest from a
/// flat SoT record list.
pub fn build(records: &[OrgRecord], config: &AgentConfig) -> Forest {
    let mut forest = Forest::new();
    forest.insert(
        ROOT_CODE.to_string(),
        OrgNode::new_root(ROOT_CODE.to_string(), config.target.root_name.clone()),
    );

    if let Some(default_tree_name) = &config.default_tree {
        let mut default_node = OrgNode::new_virtual(DEFAULT_TREE_CODE.to_string(), default_tree_name.clone());
        default_node.parent_code = Some(ROOT_CODE.to_string());
        default_node.status = NodeStatus::Active;
        forest.insert(DEFAULT_TREE_CODE.to_string(), default_node);
        attach_child(&mut forest, ROOT_CODE, DEFAULT_TREE_CODE);
    }

    for record in records {
        ingest(&mut forest, record);
    }

    let top_level_parent = if config.default_tree.is_some() {
        DEFAULT_TREE_CODE
    } else {
        ROOT_CODE
    };

    // Second pass: every record's parent link, now that every code (real
    // or virtual placeholder) is guaranteed to exist in the map.
    for record in records {
        let parent_code = effective_parent_code(record);
        let parent_code = if parent_code.is_empty() {
            top_level_parent.to_string()
        } else {
            parent_code
        };
        attach_child(&mut forest, &parent_code, &record.code);
        if let Some(node) = forest.get_mut(&record.code) {
            node.parent_code = Some(parent_code);
        }
    }

    mark_blank_names(&mut forest);
    mark_filtered(&mut forest, config);
    cascade_filter(&mut forest);
    delete_non_active(&mut forest);

    if let Some(selected_code) = &config.sub_tree_selection {
        select_sub_tree(&mut forest, selected_code);
    }

    prune_unreachable(&mut forest)
}

/// Insert `record` as a real node if it isn't already present (a virtual
/// placeholder created by an earlier child is replaced in place, keeping
/// its already-linked children).
fn ingest(forest: &mut Forest, record: &OrgRecord) {
    let status = NodeStatus::from_sot(&record.status);
    match forest.get_mut(&record.code) {
        Some(existing) => {
            existing.name = normalize_name(&record.name);
            existing.parent_name = record.parent_name.clone();
            existing.status = status;
        }
        None => {
            let mut node = OrgNode::new_virtual(record.code.clone(), normalize_name(&record.name));
            node.parent_name = record.parent_name.clone();
            node.status = status;
            forest.insert(record.code.clone(), node);
        }
    }

    let parent_code = effective_parent_code(record);
    if !parent_code.is_empty() && !forest.contains_key(&parent_code) {
        let mut placeholder = OrgNode::new_virtual(parent_code.clone(), record.parent_name.clone());
        placeholder.status = NodeStatus::Inactive;
        forest.insert(parent_code, placeholder);
    }
}

/// A record with no `parentCode` but a populated `parentName` uses the
/// name in its place (`syncdata.go`'s `UpperOrgUnitCode = UpperOrgUnitName`
/// fallback, for SoT feeds that only ever populate the name field).
fn effective_parent_code(record: &OrgRecord) -> String {
    if record.parent_code.is_empty() && !record.parent_name.is_empty() {
        record.parent_name.clone()
    } else {
        record.parent_code.clone()
    }
}

fn attach_child(forest: &mut Forest, parent_code: &str, child_code: &str) {
    if let Some(parent) = forest.get_mut(parent_code) {
        if !parent.children.iter().any(|c| c == child_code) {
            parent.children.push(child_code.to_string());
        }
    }
}

/// A record with a blank name is pruned along with its subtree (spec.md
/// §3/§4.4 step 4), the same way an explicitly filtered node is —
/// `cascade_filter` then carries the demotion down to its descendants.
fn mark_blank_names(forest: &mut Forest) {
    for node in forest.values_mut() {
        if !node.root && node.name.is_empty() {
            node.status = NodeStatus::Filtered;
        }
    }
}

/// Mark nodes matching the configured code/name filter as `Filtered`
/// (spec.md §3). Active status is never restored by this pass — only
/// `cascade_filter` can additionally demote a node.
fn mark_filtered(forest: &mut Forest, config: &AgentConfig) {
    let filters = config.filter_set();
    if filters.is_empty() {
        return;
    }
    for node in forest.values_mut() {
        if node.root {
            continue;
        }
        if filters.contains(&node.code) || filters.contains(&node.name) {
            node.status = NodeStatus::Filtered;
        }
    }
}

/// P2 (filter monotonicity): once a node is filtered or inactive, every
/// descendant is filtered too, regardless of its own SoT status.
fn cascade_filter(forest: &mut Forest) {
    let mut filtered_roots: Vec<String> = forest
        .values()
        .filter(|n| !n.root && !n.status.is_active())
        .map(|n| n.code.clone())
        .collect();

    let mut visited: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<String> = filtered_roots.drain(..).collect();

    while let Some(code) = queue.pop_front() {
        if !visited.insert(code.clone()) {
            continue;
        }
        let children = forest.get(&code).map(|n| n.children.clone()).unwrap_or_default();
        for child_code in children {
            if let Some(child) = forest.get_mut(&child_code) {
                if child.status.is_active() {
                    child.status = NodeStatus::Filtered;
                }
            }
            queue.push_back(child_code);
        }
    }
}

/// Physically drop every non-active, non-root node and its subtree
/// (spec.md §4.4 step 4: "detaching its subtree … pruning removes the
/// entire subtree from the code map as well"). By the time this runs,
/// `cascade_filter` has already demoted every descendant of a filtered
/// or inactive node, so "non-active" here already means "this node or
/// an ancestor was filtered/inactive/blank-named" — one flat sweep
/// removes the whole shadowed subtree. Mirrors `syncdata.go`'s
/// `FilterOrgMap`/`DeleteOrgNode`.
fn delete_non_active(forest: &mut Forest) {
    let to_remove: Vec<String> = forest
        .values()
        .filter(|n| !n.root && !n.status.is_active())
        .map(|n| n.code.clone())
        .collect();

    for code in &to_remove {
        if let Some(parent_code) = forest.get(code).and_then(|n| n.parent_code.clone()) {
            if let Some(parent) = forest.get_mut(&parent_code) {
                parent.children.retain(|c| c != code);
            }
        }
    }

    for code in &to_remove {
        forest.remove(code);
    }
}

/// Detach `selected_code` and reparent it directly under the root,
/// discarding its former siblings (spec.md §3 sub-tree selection).
fn select_sub_tree(forest: &mut Forest, selected_code: &str) {
    let Some(selected_parent) = forest.get(selected_code).and_then(|n| n.parent_code.clone()) else {
        return;
    };

    if let Some(parent) = forest.get_mut(&selected_parent) {
        parent.children.retain(|c| c != selected_code);
    }

    let siblings_to_delete: Vec<String> = forest
        .get(ROOT_CODE)
        .map(|root| root.children.clone())
        .unwrap_or_default();

    if let Some(root) = forest.get_mut(ROOT_CODE) {
        root.children = vec![selected_code.to_string()];
    }
    if let Some(node) = forest.get_mut(selected_code) {
        node.parent_code = Some(ROOT_CODE.to_string());
    }

    let mut to_delete: Vec<String> = Vec::new();
    for sibling in siblings_to_delete {
        if sibling != selected_code {
            collect_subtree(forest, &sibling, &mut to_delete);
        }
    }
    for code in to_delete {
        forest.remove(&code);
    }
}

fn collect_subtree(forest: &Forest, code: &str, out: &mut Vec<String>) {
    out.push(code.to_string());
    if let Some(node) = forest.get(code) {
        for child in &node.children {
            collect_subtree(forest, child, out);
        }
    }
}

/// Drop every node not reachable from the root by BFS — orphaned virtual
/// placeholders whose real record never arrived with a valid parent link,
/// and anything a filtered ancestor shadowed.
fn prune_unreachable(forest: &Forest) -> Forest {
    let mut reachable: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<String> = VecDeque::new();
    queue.push_back(ROOT_CODE.to_string());

    while let Some(code) = queue.pop_front() {
        if !reachable.insert(code.clone()) {
            continue;
        }
        if let Some(node) = forest.get(&code) {
            for child in &node.children {
                queue.push_back(child.clone());
            }
        }
    }

    forest
        .iter()
        .filter(|(code, _)| reachable.contains(*code))
        .map(|(code, node)| (code.clone(), node.clone()))
        .collect()
}
