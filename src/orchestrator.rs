use crate::config::IdentitySet;
use crate::error::Result;
use crate::git::extract_commits;
use crate::github::{HostingCli, PrFetcher};
use crate::model::{RepositoryExtraction, RepositoryPrs, RepositoryRef, TimeWindow, WindowAggregate};
use crate::window::{earliest_bound, reaggregate};
use chrono::{DateTime, Utc};
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::info;

/// Concurrent local history walks.
pub const EXTRACT_WORKERS: usize = 8;
/// Concurrent hosting API calls; the API is rate limited.
pub const FETCH_WORKERS: usize = 4;

pub fn progress_bar(message: &'static str, len: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{pos}/{len}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb
}

/// Run `task` once per repository on a pool of `workers` threads.
///
/// Every task returns its own result; nothing is shared between workers.
pub fn run_bounded<T, F>(
    repos: &[RepositoryRef],
    workers: usize,
    progress: &ProgressBar,
    task: F,
) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(&RepositoryRef) -> T + Sync + Send,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()?;

    let results: Vec<T> = pool.install(|| {
        repos
            .par_iter()
            .progress_with(progress.clone())
            .map(&task)
            .collect()
    });
    progress.finish_and_clear();
    Ok(results)
}

pub fn extract_all(
    repos: &[RepositoryRef],
    identities: &IdentitySet,
    since: DateTime<Utc>,
    progress: &ProgressBar,
) -> Result<Vec<RepositoryExtraction>> {
    let mut results = run_bounded(repos, EXTRACT_WORKERS, progress, |repo| {
        extract_commits(repo, identities, since)
    })?;
    results.sort_by(|a, b| a.repo.cmp(&b.repo));
    Ok(results)
}

pub fn fetch_all<C: HostingCli>(
    repos: &[RepositoryRef],
    fetcher: &PrFetcher<C>,
    since: DateTime<Utc>,
    progress: &ProgressBar,
) -> Result<Vec<RepositoryPrs>> {
    let mut results = run_bounded(repos, FETCH_WORKERS, progress, |repo| {
        fetcher.fetch(repo, since)
    })?;
    results.sort_by(|a, b| a.repo.cmp(&b.repo));
    Ok(results)
}

/// First PR error seen, if any. Later ones are dropped to keep the report quiet.
pub fn collect_warnings(prs: &[RepositoryPrs]) -> Vec<String> {
    prs.iter()
        .find_map(|p| p.error.clone())
        .into_iter()
        .collect()
}

#[derive(Debug, Clone)]
pub struct Analysis {
    pub aggregates: Vec<WindowAggregate>,
    pub warnings: Vec<String>,
}

/// Scan every repository once at the widest window bound, then derive each
/// window by filtering. Without a fetcher the PR pass is skipped.
pub fn analyze<C: HostingCli>(
    repos: &[RepositoryRef],
    identities: &IdentitySet,
    fetcher: Option<&PrFetcher<C>>,
    windows: &[TimeWindow],
    show_progress: bool,
) -> Result<Analysis> {
    let Some(since) = earliest_bound(windows) else {
        return Ok(Analysis {
            aggregates: Vec::new(),
            warnings: Vec::new(),
        });
    };
    info!("Analyzing {} repositories since {since}", repos.len());

    let pb = progress_bar("Analyzing repos...", repos.len(), show_progress);
    let extractions = extract_all(repos, identities, since, &pb)?;

    let prs = match fetcher {
        Some(fetcher) => {
            let pb = progress_bar("Fetching PRs...", repos.len(), show_progress);
            fetch_all(repos, fetcher, since, &pb)?
        }
        None => repos.iter().cloned().map(RepositoryPrs::empty).collect(),
    };

    Ok(Analysis {
        aggregates: reaggregate(&extractions, &prs, windows),
        warnings: collect_warnings(&prs),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DevReportError;
    use crate::github::{GitHubRepo, GH_UNAVAILABLE_WARNING};
    use crate::window::standard_windows;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Offline;

    impl HostingCli for Offline {
        fn check_available(&self) -> bool {
            false
        }

        fn list_pull_requests(&self, _repo: &GitHubRepo, _limit: usize) -> Result<String> {
            Err(DevReportError::Hosting("offline".to_string()))
        }
    }

    fn repos(n: usize) -> Vec<RepositoryRef> {
        (0..n).map(|i| RepositoryRef::new(format!("/src/repo-{i:02}"))).collect()
    }

    #[test]
    fn pool_never_exceeds_its_cap() {
        let active = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);

        let results = run_bounded(&repos(24), FETCH_WORKERS, &ProgressBar::hidden(), |repo| {
            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(10));
            active.fetch_sub(1, Ordering::SeqCst);
            repo.name.clone()
        })
        .unwrap();

        assert_eq!(results.len(), 24);
        assert!(peak.load(Ordering::SeqCst) <= FETCH_WORKERS);
    }

    #[test]
    fn every_repository_yields_a_result() {
        let input = repos(10);
        let results = extract_all(
            &input,
            &IdentitySet::default(),
            Utc::now(),
            &ProgressBar::hidden(),
        )
        .unwrap();

        assert_eq!(results.len(), input.len());
        assert!(results
            .iter()
            .all(|r| r.error.as_deref() == Some("Not a valid repository")));
        let paths: Vec<_> = results.iter().map(|r| r.repo.path.clone()).collect();
        let expected: Vec<_> = input.iter().map(|r| r.path.clone()).collect();
        assert_eq!(paths, expected);
    }

    #[test]
    fn offline_cli_produces_a_single_warning() {
        let fetcher = PrFetcher::new(Offline);
        let analysis = analyze(
            &repos(12),
            &IdentitySet::default(),
            Some(&fetcher),
            &standard_windows(Utc::now()),
            false,
        )
        .unwrap();

        assert_eq!(analysis.warnings, vec![GH_UNAVAILABLE_WARNING.to_string()]);
        assert_eq!(analysis.aggregates.len(), 3);
        for aggregate in &analysis.aggregates {
            assert_eq!(aggregate.prs.len(), 12);
            assert_eq!(aggregate.prs.iter().filter(|p| p.error.is_some()).count(), 1);
        }
    }

    #[test]
    fn skipping_prs_yields_empty_pr_lists() {
        let analysis = analyze::<Offline>(
            &repos(3),
            &IdentitySet::default(),
            None,
            &standard_windows(Utc::now()),
            false,
        )
        .unwrap();
        assert!(analysis.warnings.is_empty());
        assert!(analysis.aggregates.iter().all(|a| a.prs_opened() == 0));
    }

    #[test]
    fn no_windows_means_no_work() {
        let analysis =
            analyze::<Offline>(&repos(3), &IdentitySet::default(), None, &[], false).unwrap();
        assert!(analysis.aggregates.is_empty());
    }
}
