pub mod batch;
pub mod cache;
pub mod client;
pub mod search;
pub mod types;

pub use batch::{BatchResult, FailedIssue};
pub use cache::TypeCache;
pub use client::JiraClient;
