use super::cli::HostingCli;
use super::remote::{resolve_remote, GitHubRepo};
use crate::error::{DevReportError, Result};
use crate::git::GitRepo;
use crate::model::{PullRequestRecord, RepositoryPrs, RepositoryRef};
use crate::util::{truncate_chars, MAX_TITLE_CHARS};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use tracing::{debug, info};

pub const GH_UNAVAILABLE_WARNING: &str =
    "gh CLI not available or not authenticated - PR stats will be skipped";
pub const PR_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GhPullRequest {
    number: u64,
    title: String,
    state: String,
    created_at: String,
    merged_at: Option<String>,
    url: String,
}

/// Fetches pull requests for many repositories through one hosting CLI.
///
/// The availability probe runs at most once per fetcher and the
/// "CLI unavailable" warning is handed to the first caller only, no matter
/// how many workers share the fetcher.
pub struct PrFetcher<C: HostingCli> {
    cli: C,
    available: OnceLock<bool>,
    warned: AtomicBool,
}

impl<C: HostingCli> PrFetcher<C> {
    pub fn new(cli: C) -> Self {
        Self {
            cli,
            available: OnceLock::new(),
            warned: AtomicBool::new(false),
        }
    }

    pub fn is_available(&self) -> bool {
        *self.available.get_or_init(|| {
            let available = self.cli.check_available();
            info!("Hosting CLI available: {available}");
            available
        })
    }

    fn take_warning(&self) -> Option<String> {
        if self.warned.swap(true, Ordering::SeqCst) {
            None
        } else {
            Some(GH_UNAVAILABLE_WARNING.to_string())
        }
    }

    pub fn fetch(&self, repo: &RepositoryRef, since: DateTime<Utc>) -> RepositoryPrs {
        if !self.is_available() {
            return RepositoryPrs {
                error: self.take_warning(),
                ..RepositoryPrs::empty(repo.clone())
            };
        }

        match github_remote(repo.path()) {
            Some(remote) => self.fetch_remote(repo, &remote, since),
            None => {
                debug!("{}: no GitHub remote, skipping PRs", repo.name);
                RepositoryPrs::empty(repo.clone())
            }
        }
    }

    pub fn fetch_remote(
        &self,
        repo: &RepositoryRef,
        remote: &GitHubRepo,
        since: DateTime<Utc>,
    ) -> RepositoryPrs {
        let owner = remote.owner.clone();
        let listed = self
            .cli
            .list_pull_requests(remote, PR_LIMIT)
            .and_then(|json| parse_pull_requests(&json));

        match listed {
            Ok(prs) => {
                let (opened, merged) = partition(prs, since);
                debug!(
                    "{}: {} opened, {} merged since {since}",
                    remote.slug(),
                    opened.len(),
                    merged.len()
                );
                RepositoryPrs {
                    repo: repo.clone(),
                    owner,
                    opened,
                    merged,
                    error: None,
                }
            }
            Err(e) => RepositoryPrs {
                owner,
                ..RepositoryPrs::with_error(repo.clone(), e)
            },
        }
    }
}

fn github_remote(path: &Path) -> Option<GitHubRepo> {
    let git = GitRepo::open(path).ok()?;
    resolve_remote(git.remote_urls())
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DevReportError::HostingOutput(format!("invalid timestamp '{value}': {e}")))
}

/// Parse `gh pr list --json` output. Any malformed entry fails the whole list.
pub fn parse_pull_requests(json: &str) -> Result<Vec<PullRequestRecord>> {
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }

    let raw: Vec<GhPullRequest> =
        serde_json::from_str(json).map_err(|e| DevReportError::HostingOutput(e.to_string()))?;

    raw.into_iter()
        .map(|pr| {
            let merged_at = match pr.merged_at.as_deref() {
                Some(value) if !value.is_empty() => Some(parse_timestamp(value)?),
                _ => None,
            };
            Ok(PullRequestRecord {
                number: pr.number,
                title: truncate_chars(&pr.title, MAX_TITLE_CHARS),
                state: pr.state,
                created_at: parse_timestamp(&pr.created_at)?,
                merged_at,
                url: pr.url,
            })
        })
        .collect()
}

/// Split into (opened since, merged since). A PR may land in both.
pub fn partition(
    prs: Vec<PullRequestRecord>,
    since: DateTime<Utc>,
) -> (Vec<PullRequestRecord>, Vec<PullRequestRecord>) {
    let merged = prs
        .iter()
        .filter(|pr| pr.merged_since(since))
        .cloned()
        .collect();
    let opened = prs.into_iter().filter(|pr| pr.opened_since(since)).collect();
    (opened, merged)
}
