use super::GitRepo;
use crate::config::IdentitySet;
use crate::model::{RepositoryExtraction, RepositoryRef};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// One extraction pass over `repo`. Failures are returned as data: the
/// extraction then carries the error message and no commits.
pub fn extract_commits(
    repo: &RepositoryRef,
    identities: &IdentitySet,
    since: DateTime<Utc>,
) -> RepositoryExtraction {
    let git = match GitRepo::open(repo.path()) {
        Ok(git) => git,
        Err(e) => return RepositoryExtraction::failed(repo.clone(), e),
    };

    match git.collect_commits(identities, since) {
        Ok(commits) => {
            debug!("{}: {} commits since {since}", repo.name, commits.len());
            RepositoryExtraction::ok(repo.clone(), commits)
        }
        Err(e) => {
            warn!("{}: history walk failed: {e}", repo.name);
            RepositoryExtraction::failed(repo.clone(), e)
        }
    }
}
