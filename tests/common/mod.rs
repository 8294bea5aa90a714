#![allow(dead_code)]

use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;
use std::process::Command;

pub fn has_git() -> bool {
    Command::new("git").arg("--version").output().is_ok()
}

fn git_command(dir: &Path) -> Command {
    let mut cmd = Command::new("git");
    cmd.current_dir(dir)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .env("GIT_AUTHOR_NAME", "Test Author")
        .env("GIT_COMMITTER_NAME", "Test Committer")
        .env("GIT_COMMITTER_EMAIL", "committer@example.com");
    cmd
}

pub fn git(dir: &Path, args: &[&str]) {
    assert!(git_command(dir).args(args).status().unwrap().success(), "git {args:?} failed");
}

pub fn init_git_repo(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    git(dir, &["init", "-q"]);
    git(dir, &["config", "core.autocrlf", "false"]);
    git(dir, &["config", "user.email", "you@example.com"]);
    git(dir, &["config", "user.name", "Your Name"]);
}

fn git_date(when: DateTime<Utc>) -> String {
    format!("@{} +0000", when.timestamp())
}

/// Write `content` to `name` and commit it as `email`, authored and committed at `when`.
pub fn commit_as(dir: &Path, name: &str, content: &str, email: &str, when: DateTime<Utc>) {
    commit_with_dates(dir, name, content, email, when, when);
}

pub fn commit_with_dates(
    dir: &Path,
    name: &str,
    content: &str,
    email: &str,
    authored: DateTime<Utc>,
    committed: DateTime<Utc>,
) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    git(dir, &["add", "."]);
    let status = git_command(dir)
        .args(["commit", "-q", "-m", &format!("update {name}\n\nbody text")])
        .env("GIT_AUTHOR_EMAIL", email)
        .env("GIT_AUTHOR_DATE", git_date(authored))
        .env("GIT_COMMITTER_DATE", git_date(committed))
        .status()
        .unwrap();
    assert!(status.success());
}

/// Commit whatever is staged, authored and committed at `when`.
pub fn commit_staged(dir: &Path, message: &str, email: &str, when: DateTime<Utc>) {
    let status = git_command(dir)
        .args(["commit", "-q", "-m", message])
        .env("GIT_AUTHOR_EMAIL", email)
        .env("GIT_AUTHOR_DATE", git_date(when))
        .env("GIT_COMMITTER_DATE", git_date(when))
        .status()
        .unwrap();
    assert!(status.success());
}

/// Run `git` and return its trimmed stdout.
pub fn git_output(dir: &Path, args: &[&str]) -> String {
    let output = git_command(dir).args(args).output().unwrap();
    assert!(output.status.success(), "git {args:?} failed");
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}
