//! Mutation execution (spec.md §4.7/§4.8): the department executor runs
//! serially in plan order, the user executor fans a single task queue out
//! across a worker pool.

pub mod org_executor;
pub mod user_executor;

pub use org_executor::{execute_org_deletes, execute_org_plan, OrgExecutionReport};
pub use user_executor::{execute_user_plan, UserExecutionReport};
