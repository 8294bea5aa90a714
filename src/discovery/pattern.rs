//! Path patterns for repository include/exclude filters.
//!
//! A pattern is split into `/`-separated segments:
//!
//! - a literal segment matches one path component exactly,
//! - a segment containing `*` or `?` matches one component with shell-style
//!   wildcards (`*` never crosses `/`),
//! - `**` matches any number of components, including none.
//!
//! A pattern that matches a directory also matches everything below it, so
//! `~/work/archived` excludes `~/work/archived/old-proj`.

use crate::util::{absolutize, expand_tilde};
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Wildcard(String),
    AnyDepth,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Tilde-expand, make absolute and resolve symlinks of the literal prefix.
    pub fn new(raw: &str) -> Self {
        let expanded = expand_tilde(raw);
        let resolved = resolve_literal_prefix(&expanded);
        Self::from_absolute(raw, &resolved)
    }

    fn from_absolute(raw: &str, path: &Path) -> Self {
        let segments = components(path)
            .into_iter()
            .map(|part| {
                if part == "**" {
                    Segment::AnyDepth
                } else if part.contains(['*', '?']) {
                    Segment::Wildcard(part)
                } else {
                    Segment::Literal(part)
                }
            })
            .collect();
        Self {
            raw: raw.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// `path` is expected to be absolute and already canonical.
    pub fn matches(&self, path: &Path) -> bool {
        let parts = components(path);
        let parts: Vec<&str> = parts.iter().map(String::as_str).collect();
        match_prefix(&self.segments, &parts)
    }
}

fn components(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().to_string()),
            Component::Prefix(p) => Some(p.as_os_str().to_string_lossy().to_string()),
            Component::RootDir | Component::CurDir | Component::ParentDir => None,
        })
        .collect()
}

fn resolve_literal_prefix(path: &Path) -> PathBuf {
    let absolute = absolutize(path);
    let mut prefix = PathBuf::new();
    let mut rest = Vec::new();
    let mut in_literal = true;

    for component in absolute.components() {
        let text = component.as_os_str().to_string_lossy();
        if in_literal && !text.contains(['*', '?']) {
            prefix.push(component.as_os_str());
        } else {
            in_literal = false;
            rest.push(component.as_os_str().to_os_string());
        }
    }

    let mut resolved = canonicalize_existing(&prefix);
    for part in rest {
        resolved.push(part);
    }
    resolved
}

/// Canonicalize the longest existing ancestor and re-append the remainder.
fn canonicalize_existing(path: &Path) -> PathBuf {
    let mut missing = Vec::new();
    let mut current = path;
    loop {
        if let Ok(canonical) = current.canonicalize() {
            let mut resolved = canonical;
            for part in missing.iter().rev() {
                resolved.push(part);
            }
            return resolved;
        }
        match (current.parent(), current.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                current = parent;
            }
            _ => return path.to_path_buf(),
        }
    }
}

/// True when the pattern is fully consumed by some prefix of `parts`.
fn match_prefix(segments: &[Segment], parts: &[&str]) -> bool {
    let Some((first, rest)) = segments.split_first() else {
        return true;
    };

    match first {
        Segment::AnyDepth => (0..=parts.len()).any(|skip| match_prefix(rest, &parts[skip..])),
        Segment::Literal(lit) => match parts.split_first() {
            Some((head, tail)) => head == lit && match_prefix(rest, tail),
            None => false,
        },
        Segment::Wildcard(glob) => match parts.split_first() {
            Some((head, tail)) => wildcard_match(glob, head) && match_prefix(rest, tail),
            None => false,
        },
    }
}

fn wildcard_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ti));
            pi += 1;
        } else if let Some((spi, sti)) = star {
            pi = spi + 1;
            ti = sti + 1;
            star = Some((spi, sti + 1));
        } else {
            return false;
        }
    }

    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}
