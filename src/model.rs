use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SCHEMA_VERSION: u32 = 1;

/// A discovered repository checkout. Identity is the path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub path: PathBuf,
    pub name: String,
}

impl RepositoryRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub short_hash: String,
    pub message: String,
    pub author_email: String,
    pub authored_at: DateTime<Utc>,
    pub lines_added: u64,
    pub lines_removed: u64,
    pub files_changed: u64,
}

/// Result of one extraction pass over a repository.
///
/// When `error` is set, `commits` is always empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryExtraction {
    pub repo: RepositoryRef,
    pub commits: Vec<CommitRecord>,
    pub error: Option<String>,
}

impl RepositoryExtraction {
    pub fn ok(repo: RepositoryRef, commits: Vec<CommitRecord>) -> Self {
        Self { repo, commits, error: None }
    }

    pub fn failed(repo: RepositoryRef, error: impl ToString) -> Self {
        Self {
            repo,
            commits: Vec::new(),
            error: Some(error.to_string()),
        }
    }

    pub fn total_commits(&self) -> usize {
        self.commits.len()
    }

    pub fn lines_added(&self) -> u64 {
        self.commits.iter().map(|c| c.lines_added).sum()
    }

    pub fn lines_removed(&self) -> u64 {
        self.commits.iter().map(|c| c.lines_removed).sum()
    }

    /// Same file touched by several commits counts once per commit.
    pub fn files_changed(&self) -> u64 {
        self.commits.iter().map(|c| c.files_changed).sum()
    }

    /// Copy of this extraction keeping only commits authored at or after `since`.
    pub fn since(&self, since: DateTime<Utc>) -> Self {
        Self {
            repo: self.repo.clone(),
            commits: self
                .commits
                .iter()
                .filter(|c| c.authored_at >= since)
                .cloned()
                .collect(),
            error: self.error.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRecord {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub created_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
    pub url: String,
}

impl PullRequestRecord {
    pub fn opened_since(&self, since: DateTime<Utc>) -> bool {
        self.created_at >= since
    }

    pub fn merged_since(&self, since: DateTime<Utc>) -> bool {
        self.merged_at.is_some_and(|merged| merged >= since)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryPrs {
    pub repo: RepositoryRef,
    /// Empty when the repository has no supported remote.
    pub owner: String,
    pub opened: Vec<PullRequestRecord>,
    pub merged: Vec<PullRequestRecord>,
    pub error: Option<String>,
}

impl RepositoryPrs {
    pub fn empty(repo: RepositoryRef) -> Self {
        Self {
            repo,
            owner: String::new(),
            opened: Vec::new(),
            merged: Vec::new(),
            error: None,
        }
    }

    pub fn with_error(repo: RepositoryRef, error: impl ToString) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::empty(repo)
        }
    }

    pub fn since(&self, since: DateTime<Utc>) -> Self {
        Self {
            repo: self.repo.clone(),
            owner: self.owner.clone(),
            opened: self
                .opened
                .iter()
                .filter(|pr| pr.opened_since(since))
                .cloned()
                .collect(),
            merged: self
                .merged
                .iter()
                .filter(|pr| pr.merged_since(since))
                .cloned()
                .collect(),
            error: self.error.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub label: String,
    pub since: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(label: impl Into<String>, since: DateTime<Utc>) -> Self {
        Self {
            label: label.into(),
            since,
        }
    }
}

/// Read-only per-window view derived from a single extraction and fetch pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowAggregate {
    pub window: TimeWindow,
    pub extractions: Vec<RepositoryExtraction>,
    pub prs: Vec<RepositoryPrs>,
}

impl WindowAggregate {
    pub fn total_commits(&self) -> usize {
        self.extractions.iter().map(|r| r.total_commits()).sum()
    }

    pub fn repos_with_commits(&self) -> usize {
        self.extractions
            .iter()
            .filter(|r| r.total_commits() > 0)
            .count()
    }

    pub fn lines_added(&self) -> u64 {
        self.extractions.iter().map(|r| r.lines_added()).sum()
    }

    pub fn lines_removed(&self) -> u64 {
        self.extractions.iter().map(|r| r.lines_removed()).sum()
    }

    pub fn files_changed(&self) -> u64 {
        self.extractions.iter().map(|r| r.files_changed()).sum()
    }

    pub fn prs_opened(&self) -> usize {
        self.prs.iter().map(|r| r.opened.len()).sum()
    }

    pub fn prs_merged(&self) -> usize {
        self.prs.iter().map(|r| r.merged.len()).sum()
    }

    pub fn has_activity(&self) -> bool {
        self.total_commits() > 0 || self.prs_opened() > 0 || self.prs_merged() > 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowSummary {
    pub label: String,
    pub since: DateTime<Utc>,
    pub commits: usize,
    pub repos_with_commits: usize,
    pub lines_added: u64,
    pub lines_removed: u64,
    pub files_changed: u64,
    pub prs_opened: usize,
    pub prs_merged: usize,
    pub repositories: Vec<RepositorySummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositorySummary {
    pub name: String,
    pub path: String,
    pub commits: usize,
    pub lines_added: u64,
    pub lines_removed: u64,
    pub files_changed: u64,
    pub prs_opened: usize,
    pub prs_merged: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub root: String,
    pub warnings: Vec<String>,
    pub windows: Vec<WindowSummary>,
}
