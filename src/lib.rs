//! Developer activity across many local repositories.
//!
//! Repositories under a root directory are discovered, each one is scanned
//! exactly once for the user's commits (and, through the `gh` CLI, pull
//! requests) at the widest requested time bound, and every narrower window is
//! derived from that single pass by filtering.

pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod git;
pub mod github;
pub mod model;
pub mod orchestrator;
pub mod report;
pub mod util;
pub mod window;

pub use error::{DevReportError, Result};
