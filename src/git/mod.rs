pub mod extract;
pub mod repo;

pub use extract::extract_commits;
pub use repo::{DiffStat, GitRepo};
