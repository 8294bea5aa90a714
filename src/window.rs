use crate::error::{DevReportError, Result};
use crate::model::{RepositoryExtraction, RepositoryPrs, TimeWindow, WindowAggregate};
use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
}

impl Period {
    pub const ALL: [Period; 3] = [Period::Daily, Period::Weekly, Period::Monthly];

    pub fn label(self) -> &'static str {
        match self {
            Period::Daily => "Last 24 Hours",
            Period::Weekly => "Last 7 Days",
            Period::Monthly => "Last 30 Days",
        }
    }

    pub fn duration(self) -> Duration {
        match self {
            Period::Daily => Duration::hours(24),
            Period::Weekly => Duration::days(7),
            Period::Monthly => Duration::days(30),
        }
    }

    pub fn window(self, now: DateTime<Utc>) -> TimeWindow {
        TimeWindow::new(self.label(), now - self.duration())
    }
}

pub fn standard_windows(now: DateTime<Utc>) -> Vec<TimeWindow> {
    Period::ALL.iter().map(|p| p.window(now)).collect()
}

/// A window ending at `now` covering `span`, e.g. "Last 14days".
pub fn custom_window(now: DateTime<Utc>, span: std::time::Duration) -> Result<TimeWindow> {
    let chrono_span = Duration::from_std(span)
        .map_err(|e| DevReportError::InvalidDate(format!("window too large: {e}")))?;
    let since = now
        .checked_sub_signed(chrono_span)
        .ok_or_else(|| DevReportError::InvalidDate("window reaches before the epoch".to_string()))?;
    Ok(TimeWindow::new(
        format!("Last {}", humantime::format_duration(span)),
        since,
    ))
}

/// The widest lower bound: the only bound the repositories are scanned at.
pub fn earliest_bound(windows: &[TimeWindow]) -> Option<DateTime<Utc>> {
    windows.iter().map(|w| w.since).min()
}

/// Derive one aggregate per window, in request order, by filtering the single
/// earliest-bound pass. Repository errors and owners carry over unchanged.
pub fn reaggregate(
    extractions: &[RepositoryExtraction],
    prs: &[RepositoryPrs],
    windows: &[TimeWindow],
) -> Vec<WindowAggregate> {
    windows
        .iter()
        .map(|window| WindowAggregate {
            window: window.clone(),
            extractions: extractions.iter().map(|e| e.since(window.since)).collect(),
            prs: prs.iter().map(|p| p.since(window.since)).collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CommitRecord, PullRequestRecord, RepositoryRef};
    use chrono::TimeZone;
    use std::collections::HashSet;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn commit(hash: &str, email: &str, age: Duration) -> CommitRecord {
        CommitRecord {
            short_hash: hash.to_string(),
            message: format!("commit {hash}"),
            author_email: email.to_string(),
            authored_at: now() - age,
            lines_added: 10,
            lines_removed: 3,
            files_changed: 1,
        }
    }

    fn pr(number: u64, created: Duration, merged: Option<Duration>) -> PullRequestRecord {
        PullRequestRecord {
            number,
            title: format!("PR {number}"),
            state: if merged.is_some() { "MERGED" } else { "OPEN" }.to_string(),
            created_at: now() - created,
            merged_at: merged.map(|m| now() - m),
            url: format!("https://github.com/acme/widgets/pull/{number}"),
        }
    }

    fn sample() -> (Vec<RepositoryExtraction>, Vec<RepositoryPrs>) {
        let repo = RepositoryRef::new("/src/widgets");
        let extraction = RepositoryExtraction::ok(
            repo.clone(),
            vec![
                commit("a1", "a@x.com", Duration::hours(2)),
                commit("a2", "a@x.com", Duration::hours(30)),
                commit("a3", "a@x.com", Duration::days(10)),
            ],
        );
        let broken =
            RepositoryExtraction::failed(RepositoryRef::new("/src/bare"), "Bare repository");

        let earliest = now() - Duration::days(30);
        let fetched: Vec<PullRequestRecord> = vec![
            pr(1, Duration::hours(5), None),
            pr(2, Duration::days(3), Some(Duration::hours(1))),
            pr(3, Duration::days(60), Some(Duration::days(2))),
        ];
        let (opened, merged) = crate::github::fetch::partition(fetched, earliest);
        let prs = RepositoryPrs {
            repo,
            owner: "acme".to_string(),
            opened,
            merged,
            error: None,
        };
        (vec![extraction, broken], vec![prs])
    }

    #[test]
    fn standard_windows_are_nested() {
        let windows = standard_windows(now());
        let labels: Vec<&str> = windows.iter().map(|w| w.label.as_str()).collect();
        assert_eq!(labels, ["Last 24 Hours", "Last 7 Days", "Last 30 Days"]);
        assert!(windows.windows(2).all(|w| w[0].since >= w[1].since));
        assert_eq!(earliest_bound(&windows), Some(now() - Duration::days(30)));
        assert_eq!(earliest_bound(&[]), None);
    }

    #[test]
    fn custom_window_label_and_bound() {
        let window = custom_window(now(), std::time::Duration::from_secs(14 * 86_400)).unwrap();
        assert_eq!(window.label, "Last 14days");
        assert_eq!(window.since, now() - Duration::days(14));
    }

    #[test]
    fn one_aggregate_per_window_in_request_order() {
        let (extractions, prs) = sample();
        let windows = vec![Period::Monthly.window(now()), Period::Daily.window(now())];
        let aggregates = reaggregate(&extractions, &prs, &windows);

        assert_eq!(aggregates.len(), 2);
        assert_eq!(aggregates[0].window.label, "Last 30 Days");
        assert_eq!(aggregates[1].window.label, "Last 24 Hours");
        assert_eq!(aggregates[0].total_commits(), 3);
        assert_eq!(aggregates[1].total_commits(), 1);
    }

    #[test]
    fn errors_and_owners_survive_filtering() {
        let (extractions, prs) = sample();
        let aggregates = reaggregate(&extractions, &prs, &standard_windows(now()));
        for aggregate in &aggregates {
            assert_eq!(aggregate.extractions[1].error.as_deref(), Some("Bare repository"));
            assert_eq!(aggregate.prs[0].owner, "acme");
        }
    }

    #[test]
    fn narrower_windows_are_subsets() {
        let (extractions, prs) = sample();
        let aggregates = reaggregate(&extractions, &prs, &standard_windows(now()));

        for pair in aggregates.windows(2) {
            let (narrow, wide) = (&pair[0], &pair[1]);
            for (n, w) in narrow.extractions.iter().zip(&wide.extractions) {
                let wide_hashes: HashSet<&str> =
                    w.commits.iter().map(|c| c.short_hash.as_str()).collect();
                assert!(n.commits.iter().all(|c| wide_hashes.contains(c.short_hash.as_str())));
            }
            for (n, w) in narrow.prs.iter().zip(&wide.prs) {
                assert!(n.opened.iter().all(|p| w.opened.contains(p)));
                assert!(n.merged.iter().all(|p| w.merged.contains(p)));
            }
        }
    }

    #[test]
    fn totals_are_sums_of_surviving_commits() {
        let (extractions, prs) = sample();
        let aggregates = reaggregate(&extractions, &prs, &standard_windows(now()));
        let weekly = &aggregates[1];
        assert_eq!(weekly.total_commits(), 2);
        assert_eq!(weekly.lines_added(), 20);
        assert_eq!(weekly.lines_removed(), 6);
        assert_eq!(weekly.files_changed(), 2);
        assert_eq!(weekly.repos_with_commits(), 1);
    }

    #[test]
    fn pr_windows_follow_their_own_timestamps() {
        let (extractions, prs) = sample();
        let aggregates = reaggregate(&extractions, &prs, &standard_windows(now()));

        let numbers =
            |list: &[PullRequestRecord]| -> Vec<u64> { list.iter().map(|p| p.number).collect() };

        // PR 3 was opened before every window but merged inside the weekly one.
        assert_eq!(numbers(&aggregates[0].prs[0].opened), vec![1]);
        assert_eq!(numbers(&aggregates[0].prs[0].merged), vec![2]);
        assert_eq!(numbers(&aggregates[1].prs[0].opened), vec![1, 2]);
        assert_eq!(numbers(&aggregates[1].prs[0].merged), vec![2, 3]);
        for aggregate in &aggregates {
            assert!(aggregate.prs[0].opened.iter().all(|p| p.number != 3));
        }
    }

    #[test]
    fn empty_windows_report_no_activity() {
        let extractions = vec![RepositoryExtraction::ok(
            RepositoryRef::new("/src/quiet"),
            Vec::new(),
        )];
        let aggregates = reaggregate(&extractions, &[], &standard_windows(now()));
        assert!(aggregates.iter().all(|a| !a.has_activity()));
    }
}
