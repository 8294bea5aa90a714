pub mod pattern;

pub use pattern::PathPattern;

use crate::config::Config;
use crate::error::{DevReportError, Result};
use crate::model::RepositoryRef;
use crate::util::absolutize;
use ignore::WalkBuilder;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, trace};

const GIT_DIR: &str = ".git";

/// Include/exclude filter applied to candidate repository roots.
#[derive(Debug, Clone, Default)]
pub struct RepoFilter {
    include: Vec<PathPattern>,
    exclude: Vec<PathPattern>,
}

impl RepoFilter {
    pub fn new(include: &[String], exclude: &[String]) -> Self {
        Self {
            include: include.iter().map(|p| PathPattern::new(p)).collect(),
            exclude: exclude.iter().map(|p| PathPattern::new(p)).collect(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.include, &config.exclude)
    }

    pub fn accepts(&self, path: &Path) -> bool {
        let included = self.include.is_empty() || self.include.iter().any(|p| p.matches(path));
        included && !self.exclude.iter().any(|p| p.matches(path))
    }
}

/// Walk `root` for `.git` directories and return the filtered repository roots,
/// sorted by path. Unreadable directories are skipped.
pub fn find_repositories(root: &Path, config: &Config) -> Result<Vec<RepositoryRef>> {
    if !root.exists() {
        return Err(DevReportError::PathNotFound(root.to_path_buf()));
    }
    let root = absolutize(root);
    let filter = RepoFilter::from_config(config);

    let walker = WalkBuilder::new(&root)
        .standard_filters(false)
        .follow_links(false)
        .filter_entry(|entry| entry.file_name() != GIT_DIR)
        .build();

    let mut found = BTreeSet::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                trace!("Skipping unreadable entry: {e}");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|ft| ft.is_dir()) {
            continue;
        }
        if !entry.path().join(GIT_DIR).is_dir() {
            continue;
        }

        let repo_path = absolutize(entry.path());
        if filter.accepts(&repo_path) {
            found.insert(repo_path);
        } else {
            debug!("Filtered out {}", repo_path.display());
        }
    }

    Ok(found.into_iter().map(RepositoryRef::new).collect())
}
