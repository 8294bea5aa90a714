use crate::error::{DevReportError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Settings read from `~/.config/dev-report/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub author_emails: Vec<String>,
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("dev-report").join("config.toml"))
}

impl Config {
    pub fn parse(contents: &str, path: &Path) -> Result<Self> {
        toml::from_str(contents).map_err(|source| DevReportError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// A missing file yields the default config; a malformed one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config file at {}", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(DevReportError::ConfigRead {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config = Self::parse(&contents, path)?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn load_default() -> Result<Self> {
        match default_config_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }
}

/// The set of author emails considered "mine", lower-cased.
///
/// An empty set disables author filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentitySet {
    emails: Vec<String>,
}

impl IdentitySet {
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut emails: Vec<String> = emails
            .into_iter()
            .map(|e| e.as_ref().trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        emails.sort();
        emails.dedup();
        Self { emails }
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }

    pub fn emails(&self) -> &[String] {
        &self.emails
    }

    pub fn matches(&self, email: &str) -> bool {
        if self.emails.is_empty() {
            return true;
        }
        let email = email.trim().to_lowercase();
        self.emails.iter().any(|e| *e == email)
    }
}

fn git_user_email() -> Option<String> {
    let output = Command::new("git")
        .args(["config", "user.email"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let email = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!email.is_empty()).then_some(email)
}

/// Configured emails win; otherwise fall back to `git config user.email`.
pub fn resolve_identities(config: &Config) -> Result<IdentitySet> {
    let identities = IdentitySet::new(&config.author_emails);
    if !identities.is_empty() {
        return Ok(identities);
    }

    match git_user_email() {
        Some(email) => {
            debug!("Using git user.email {email}");
            Ok(IdentitySet::new([email]))
        }
        None => Err(DevReportError::MissingIdentity),
    }
}
