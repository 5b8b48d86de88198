//! SoT (source-of-truth) HTTP client: request signing and the two fetch
//! operations the forest builder and user planner consume.

pub mod client;
pub mod signing;

pub use client::SotClient;
