pub mod cli;
pub mod fetch;
pub mod remote;

pub use cli::{GhCli, HostingCli};
pub use fetch::{PrFetcher, GH_UNAVAILABLE_WARNING, PR_LIMIT};
pub use remote::{resolve_remote, GitHubRepo};
