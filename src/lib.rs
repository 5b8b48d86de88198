//! One-way directory sync: pulls organization/employee data from a
//! master-data HTTP API, diffs it against an identity-management target
//! API, and issues the mutations needed to converge the target.

pub mod config;
pub mod cycle;
pub mod error;
pub mod exec;
pub mod forest;
pub mod model;
pub mod plan;
pub mod queue;
pub mod sot;
pub mod target;

pub use config::AgentConfig;
pub use cycle::{run_once, AgentState, CycleReport};
pub use error::{AgentError, AgentResult};
