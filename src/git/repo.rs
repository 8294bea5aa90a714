use crate::config::IdentitySet;
use crate::error::{DevReportError, Result};
use crate::model::CommitRecord;
use crate::util::{first_line, truncate_chars, MAX_TITLE_CHARS};
use chrono::{DateTime, Utc};
use gix::object::tree::diff::ChangeDetached;
use gix::{ObjectId, Repository};
use similar::{ChangeTag, TextDiff};
use std::collections::{BinaryHeap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Insertions, deletions and files touched by one commit against its first parent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffStat {
    pub insertions: u64,
    pub deletions: u64,
    pub files: u64,
}

pub struct GitRepo {
    repo: Repository,
    path: PathBuf,
}

impl GitRepo {
    /// Open the repository rooted at `path`. Bare repositories are rejected.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let repo = gix::open(path).map_err(|e| {
            debug!("Failed to open {}: {e}", path.display());
            DevReportError::NotARepository
        })?;

        if repo.is_bare() {
            return Err(DevReportError::BareRepository);
        }

        let path = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();
        Ok(Self { repo, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Configured remote URLs, in remote-name order.
    pub fn remote_urls(&self) -> Vec<String> {
        let config = self.repo.config_snapshot();
        self.repo
            .remote_names()
            .into_iter()
            .filter_map(|name| {
                let key = format!("remote.{name}.url");
                config.string(key.as_str()).map(|url| url.to_string())
            })
            .collect()
    }

    /// Commits reachable from `HEAD` authored at or after `since` by one of
    /// `identities`, most recent first.
    ///
    /// Committer time only prunes the walk; the author time of every candidate
    /// is re-checked against `since`.
    pub fn collect_commits(
        &self,
        identities: &IdentitySet,
        since: DateTime<Utc>,
    ) -> Result<Vec<CommitRecord>> {
        let mut head = self.repo.head()?;
        if head.is_unborn() {
            return Ok(Vec::new());
        }
        let head_commit = head.peel_to_commit_in_place()?;
        let since_secs = since.timestamp();

        let mut commits = Vec::new();
        let mut seen: HashSet<ObjectId> = HashSet::from([head_commit.id]);
        let mut queue: BinaryHeap<(i64, ObjectId)> =
            BinaryHeap::from([(head_commit.time()?.seconds, head_commit.id)]);

        while let Some((committed, commit_id)) = queue.pop() {
            if committed < since_secs {
                continue;
            }

            let commit = self.repo.find_commit(commit_id)?;
            let parents: Vec<ObjectId> = commit.parent_ids().map(|id| id.into()).collect();

            for pid in &parents {
                if !seen.insert(*pid) {
                    continue;
                }
                // Shallow clones stop at missing parents.
                match self.repo.find_commit(*pid) {
                    Ok(parent) => queue.push((parent.time()?.seconds, *pid)),
                    Err(e) => debug!("Parent {pid} of {commit_id} unavailable: {e}"),
                }
            }

            let author = commit.author()?;
            let email = author.email.to_string();
            if !identities.matches(&email) {
                continue;
            }

            let secs = author
                .time()
                .map_err(|e| DevReportError::InvalidDate(e.to_string()))?
                .seconds;
            let authored_at = DateTime::from_timestamp(secs, 0)
                .ok_or_else(|| DevReportError::InvalidDate(format!("Invalid timestamp: {secs}")))?;
            if authored_at < since {
                continue;
            }

            let stat = self
                .diff_stat(commit_id, parents.first().copied())
                .unwrap_or_else(|e| {
                    debug!("Diffstat failed for {commit_id}: {e}");
                    DiffStat::default()
                });

            let message = commit.message()?;
            commits.push(CommitRecord {
                short_hash: commit_id.to_string().chars().take(8).collect(),
                message: truncate_chars(first_line(&message.title.to_string()), MAX_TITLE_CHARS),
                author_email: email,
                authored_at,
                lines_added: stat.insertions,
                lines_removed: stat.deletions,
                files_changed: stat.files,
            });
        }

        Ok(commits)
    }

    /// Diff against `parent_id`, or against the empty tree for a root commit.
    pub fn diff_stat(&self, commit_id: ObjectId, parent_id: Option<ObjectId>) -> Result<DiffStat> {
        let commit_tree = self.repo.find_commit(commit_id)?.tree()?;
        let changes: Vec<ChangeDetached> = match parent_id {
            Some(parent_id) => {
                let parent_tree = self.repo.find_commit(parent_id)?.tree()?;
                self.repo
                    .diff_tree_to_tree(Some(&parent_tree), Some(&commit_tree), None)?
            }
            None => self.repo.diff_tree_to_tree(None, Some(&commit_tree), None)?,
        };

        let mut stat = DiffStat::default();
        for change in changes {
            self.handle_change(change, &mut stat)?;
        }
        Ok(stat)
    }

    fn handle_change(&self, change: ChangeDetached, stat: &mut DiffStat) -> Result<()> {
        match change {
            ChangeDetached::Addition { id, entry_mode, .. } => {
                if entry_mode.is_tree() || entry_mode.is_commit() {
                    return Ok(());
                }
                let new = self.repo.find_object(id)?;
                stat.insertions += self.count_lines(&new);
                stat.files += 1;
            }
            ChangeDetached::Deletion { id, entry_mode, .. } => {
                if entry_mode.is_tree() || entry_mode.is_commit() {
                    return Ok(());
                }
                let old = self.repo.find_object(id)?;
                stat.deletions += self.count_lines(&old);
                stat.files += 1;
            }
            ChangeDetached::Modification {
                previous_id,
                id,
                entry_mode,
                ..
            } => {
                if entry_mode.is_tree() || entry_mode.is_commit() {
                    return Ok(());
                }
                let old = self.repo.find_object(previous_id)?;
                let new = self.repo.find_object(id)?;
                let (added, deleted) = self.compute_line_diff(&old, &new);
                stat.insertions += added;
                stat.deletions += deleted;
                stat.files += 1;
            }
            ChangeDetached::Rewrite {
                source_id,
                id,
                entry_mode,
                ..
            } => {
                if entry_mode.is_tree() || entry_mode.is_commit() {
                    return Ok(());
                }
                let old = self.repo.find_object(source_id)?;
                let new = self.repo.find_object(id)?;
                let (added, deleted) = self.compute_line_diff(&old, &new);
                stat.insertions += added;
                stat.deletions += deleted;
                stat.files += 1;
            }
        }
        Ok(())
    }

    fn is_binary_object(&self, object: &gix::Object) -> bool {
        object.data.as_slice().iter().take(8192).any(|&b| b == 0)
    }

    fn count_lines(&self, object: &gix::Object) -> u64 {
        if self.is_binary_object(object) {
            return 0;
        }
        String::from_utf8_lossy(object.data.as_slice()).lines().count() as u64
    }

    fn compute_line_diff(&self, old_object: &gix::Object, new_object: &gix::Object) -> (u64, u64) {
        if self.is_binary_object(old_object) || self.is_binary_object(new_object) {
            return (0, 0);
        }
        let old_text = String::from_utf8_lossy(old_object.data.as_slice());
        let new_text = String::from_utf8_lossy(new_object.data.as_slice());

        let diff = TextDiff::from_lines(old_text.as_ref(), new_text.as_ref());
        let mut added = 0u64;
        let mut deleted = 0u64;
        for change in diff.iter_all_changes() {
            match change.tag() {
                ChangeTag::Insert => added += 1,
                ChangeTag::Delete => deleted += 1,
                ChangeTag::Equal => {}
            }
        }
        (added, deleted)
    }
}
