//! Cycle orchestration (spec.md §2, §9): the single entry point that
//! pulls from the SoT, diffs against the right baseline, executes, and
//! updates `AgentState` for next time.
//!
//! `AgentState` is the crate's answer to spec.md §9's "global mutable
//! state": a single owned struct the caller threads through cycles,
//! rather than process-lifetime globals, so nothing here needs `static
//! mut` or a lazily-initialized lock.

use std::sync::Arc;

use crate::config::AgentConfig;
use crate::error::AgentResult;
use crate::exec::{execute_org_deletes, execute_org_plan, execute_user_plan};
use crate::forest::{self, Forest};
use crate::model::UserNode;
use crate::plan::{
    plan_org, plan_users, SotOrgBaseline, SotUserBaseline, TargetSnapshotOrgBaseline, TargetSnapshotUserBaseline,
};
use crate::sot::SotClient;
use crate::target::{snapshot, TargetApi};

/// Carried between cycles. `None` baselines mean "diff against the
/// target's live snapshot this cycle" (spec.md §4.5/§4.6's first-run
/// behavior); `Some` means a prior cycle already ran and its forest is
/// the baseline instead.
#[derive(Default)]
pub struct AgentState {
    prior_forest: Option<Forest>,
    prior_users: Option<Vec<UserNode>>,
}

impl AgentState {
    pub fn new() -> AgentState {
        AgentState::default()
    }
}

#[derive(Debug, Default)]
pub struct CycleReport {
    pub departments_created: usize,
    pub departments_updated: usize,
    pub departments_deleted: usize,
    pub users_completed: usize,
    pub user_failures: usize,
}

/// Run one full sync cycle: fetch, reconstruct, plan, execute, and fold
/// the result back into `state` for the next cycle.
pub async fn run_once(
    config: &AgentConfig,
    sot: &SotClient,
    target: Arc<dyn TargetApi>,
    state: &mut AgentState,
) -> AgentResult<CycleReport> {
    let org_records = sot.fetch_orgs().await?;
    let mut forest = forest::build(&org_records, config);

    // On a first run there's no prior cycle to diff against, so both
    // planners fall back to the target's own live snapshot; every run
    // after, the prior cycle's forest/user list is the baseline instead
    // and no target scan is needed at all.
    let target_scan = if state.prior_forest.is_none() {
        Some(snapshot::scan(target.as_ref()).await?)
    } else {
        None
    };

    let mut org_plan = match (&state.prior_forest, &target_scan) {
        (Some(prior), _) => {
            let baseline = SotOrgBaseline::from_forest(prior);
            plan_org(&mut forest, &baseline)
        }
        (None, Some((dept_snapshot, _))) => {
            let baseline = TargetSnapshotOrgBaseline::new(dept_snapshot, &config.target.root_name);
            plan_org(&mut forest, &baseline)
        }
        (None, None) => unreachable!("target_scan is always Some when prior_forest is None"),
    };

    // Deletes run last, strictly after user execution below, so a
    // department never disappears out from under a user move/create that
    // hasn't run yet (spec.md §4.10 step 5, §5).
    let org_deletes = std::mem::take(&mut org_plan.deletes);

    let org_report = execute_org_plan(target.as_ref(), org_plan, &mut forest).await;
    for (code, message) in &org_report.failures {
        tracing::warn!(code = %code, error = %message, "department task did not complete");
    }

    let user_records = sot.fetch_users().await?;
    let user_plan = match (&state.prior_users, &target_scan) {
        (Some(prior), _) => {
            let baseline = SotUserBaseline::from_nodes(prior);
            plan_users(&user_records, &forest, &baseline)
        }
        (None, Some((_, user_snapshot))) => {
            let baseline = TargetSnapshotUserBaseline::new(user_snapshot);
            plan_users(&user_records, &forest, &baseline)
        }
        (None, None) => unreachable!("target_scan is always Some when prior_users is None"),
    };

    let user_report = execute_user_plan(Arc::clone(&target), user_plan, config.concurrency).await;
    for (code, remaining, message) in &user_report.failures {
        tracing::warn!(code = %code, remaining = %remaining, error = %message, "user task did not complete");
    }

    // Org deletes only run once every user has been created, renamed, or
    // moved out of harm's way, never before.
    let delete_report = execute_org_deletes(target.as_ref(), org_deletes).await;
    for (code, message) in &delete_report.failures {
        tracing::warn!(code = %code, error = %message, "department delete did not complete");
    }

    let resolved_ids: std::collections::HashMap<&str, &str> = user_report
        .resolved_ids
        .iter()
        .map(|(code, id)| (code.as_str(), id.as_str()))
        .collect();
    let prior_ids: std::collections::HashMap<&str, &str> = state
        .prior_users
        .iter()
        .flatten()
        .filter_map(|u| u.id.as_deref().map(|id| (u.code.as_str(), id)))
        .collect();

    let next_users: Vec<UserNode> = user_records
        .iter()
        .filter(|r| UserNode::is_eligible(r))
        .map(|r| {
            let dept = forest.get(&r.org_code);
            let mut node =
                UserNode::from_record(r, dept.and_then(|d| d.org_id.clone()), dept.and_then(|d| d.dep_id.clone()));
            node.id = resolved_ids
                .get(r.code.as_str())
                .or_else(|| prior_ids.get(r.code.as_str()))
                .map(|id| id.to_string());
            node
        })
        .collect();

    state.prior_forest = Some(forest);
    state.prior_users = Some(next_users);

    Ok(CycleReport {
        departments_created: org_report.created,
        departments_updated: org_report.updated,
        departments_deleted: delete_report.deleted,
        users_completed: user_report.completed,
        user_failures: user_report.failures.len(),
    })
}
