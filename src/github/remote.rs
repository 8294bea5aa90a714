use regex::Regex;
use std::sync::OnceLock;

/// Owner/repo coordinates of a GitHub project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubRepo {
    pub owner: String,
    pub name: String,
}

fn url_patterns() -> &'static [Regex; 2] {
    static PATTERNS: OnceLock<[Regex; 2]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(r"^git@github\.com:([^/]+)/([^/]+?)(?:\.git)?$").expect("valid ssh pattern"),
            Regex::new(r"^https://github\.com/([^/]+)/([^/]+?)(?:\.git)?$")
                .expect("valid https pattern"),
        ]
    })
}

impl GitHubRepo {
    /// Parse `git@github.com:owner/repo(.git)` or `https://github.com/owner/repo(.git)`.
    pub fn parse_url(url: &str) -> Option<Self> {
        let url = url.trim();
        url_patterns().iter().find_map(|re| {
            let caps = re.captures(url)?;
            Some(Self {
                owner: caps.get(1)?.as_str().to_string(),
                name: caps.get(2)?.as_str().to_string(),
            })
        })
    }

    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// First remote URL that points at GitHub.
pub fn resolve_remote<I, S>(urls: I) -> Option<GitHubRepo>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    urls.into_iter()
        .find_map(|url| GitHubRepo::parse_url(url.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acme() -> GitHubRepo {
        GitHubRepo {
            owner: "acme".to_string(),
            name: "widgets".to_string(),
        }
    }

    #[test]
    fn ssh_and_https_resolve_identically() {
        assert_eq!(GitHubRepo::parse_url("git@github.com:acme/widgets.git"), Some(acme()));
        assert_eq!(GitHubRepo::parse_url("https://github.com/acme/widgets"), Some(acme()));
        assert_eq!(GitHubRepo::parse_url("https://github.com/acme/widgets.git"), Some(acme()));
        assert_eq!(GitHubRepo::parse_url("git@github.com:acme/widgets"), Some(acme()));
    }

    #[test]
    fn other_hosts_are_ignored() {
        assert_eq!(GitHubRepo::parse_url("git@gitlab.com:acme/widgets.git"), None);
        assert_eq!(GitHubRepo::parse_url("https://example.com/acme/widgets"), None);
        assert_eq!(GitHubRepo::parse_url("https://github.com/acme"), None);
        assert_eq!(GitHubRepo::parse_url("/srv/git/widgets.git"), None);
    }

    #[test]
    fn dotted_repo_names_keep_inner_dots() {
        let repo = GitHubRepo::parse_url("https://github.com/acme/site.github.io.git").unwrap();
        assert_eq!(repo.name, "site.github.io");
        assert_eq!(repo.slug(), "acme/site.github.io");
    }

    #[test]
    fn first_matching_remote_wins() {
        let urls = [
            "git@gitlab.com:mirror/widgets.git",
            "git@github.com:acme/widgets.git",
            "https://github.com/fork/widgets",
        ];
        assert_eq!(resolve_remote(urls), Some(acme()));
        assert_eq!(resolve_remote(Vec::<String>::new()), None);
    }
}
