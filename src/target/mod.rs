//! Target identity-management API (spec.md §4.3, §4.9, §6): the typed
//! HTTP client, its trait seam, and the one-shot full-scan snapshot used
//! as the first cycle's baseline.

pub mod client;
pub mod snapshot;
pub mod types;

pub use client::{TargetApi, TargetClient};
pub use snapshot::{TargetDeptSnapshot, TargetUserSnapshot};
