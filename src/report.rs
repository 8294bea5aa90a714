use crate::model::{
    RepositorySummary, ReportOutput, WindowAggregate, WindowSummary, SCHEMA_VERSION,
};
use crate::util::format_number;
use chrono::{DateTime, Utc};
use console::style;
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::Path;

const RULE_WIDTH: usize = 60;

fn lines_text(added: u64, removed: u64) -> String {
    format!("+{} / -{}", format_number(added), format_number(removed))
}

fn styled_lines(added: u64, removed: u64, pad_to: usize) -> String {
    let plain_len = lines_text(added, removed).chars().count();
    let padding = " ".repeat(pad_to.saturating_sub(plain_len));
    format!(
        "{padding}{} / {}",
        style(format!("+{}", format_number(added))).green(),
        style(format!("-{}", format_number(removed))).red()
    )
}

fn write_rule<W: Write>(out: &mut W, title: &str) -> io::Result<()> {
    let side = RULE_WIDTH.saturating_sub(title.chars().count() + 2) / 2;
    writeln!(
        out,
        "{} {} {}",
        style("─".repeat(side)).cyan(),
        style(title).cyan().bold(),
        style("─".repeat(side)).cyan()
    )
}

pub fn write_window<W: Write>(out: &mut W, aggregate: &WindowAggregate) -> io::Result<()> {
    writeln!(out)?;
    write_rule(out, &aggregate.window.label)?;
    writeln!(out)?;

    if !aggregate.has_activity() {
        writeln!(out, "{}", style("No activity").dim())?;
        return Ok(());
    }

    let mut summary = format!(
        "{} {}",
        style("Commits:").bold(),
        format_number(aggregate.total_commits() as u64)
    );
    if aggregate.repos_with_commits() > 0 {
        summary.push_str(&format!(" across {} repo(s)", aggregate.repos_with_commits()));
    }
    writeln!(
        out,
        "{summary}  |  {} {}  |  {} {}",
        style("PRs Opened:").bold(),
        format_number(aggregate.prs_opened() as u64),
        style("PRs Merged:").bold(),
        format_number(aggregate.prs_merged() as u64)
    )?;

    if aggregate.lines_added() > 0 || aggregate.lines_removed() > 0 {
        writeln!(
            out,
            "{} {}  |  {} {}",
            style("Lines:").bold(),
            styled_lines(aggregate.lines_added(), aggregate.lines_removed(), 0),
            style("Files:").bold(),
            format_number(aggregate.files_changed())
        )?;
    }

    let mut active: Vec<_> = aggregate
        .extractions
        .iter()
        .filter(|r| r.total_commits() > 0)
        .collect();
    if active.is_empty() {
        return Ok(());
    }
    active.sort_by(|a, b| b.total_commits().cmp(&a.total_commits()));

    let name_width = active.iter().map(|r| r.repo.name.chars().count()).max().unwrap_or(0);
    let commits_width = active
        .iter()
        .map(|r| format!("{} commits", format_number(r.total_commits() as u64)).len())
        .max()
        .unwrap_or(0);
    let lines_width = active
        .iter()
        .map(|r| lines_text(r.lines_added(), r.lines_removed()).chars().count())
        .max()
        .unwrap_or(0);

    writeln!(out)?;
    for repo in active {
        let commits = format!("{} commits", format_number(repo.total_commits() as u64));
        writeln!(
            out,
            "{}  {:>commits_width$}  {}",
            style(format!("{:<name_width$}", repo.repo.name)).cyan(),
            commits,
            styled_lines(repo.lines_added(), repo.lines_removed(), lines_width),
        )?;
    }

    Ok(())
}

pub fn write_report<W: Write>(
    out: &mut W,
    aggregates: &[WindowAggregate],
    warnings: &[String],
    generated_at: DateTime<Utc>,
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "{} - Generated {}",
        style("Dev Report").magenta().bold(),
        style(generated_at.format("%Y-%m-%d %H:%M UTC")).dim()
    )?;

    for warning in warnings {
        writeln!(out, "{} {warning}", style("Warning:").yellow())?;
    }

    for aggregate in aggregates {
        write_window(out, aggregate)?;
    }
    writeln!(out)
}

pub fn render_report(aggregates: &[WindowAggregate], warnings: &[String]) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_report(&mut out, aggregates, warnings, Utc::now())?;
    Ok(())
}

fn summarize(aggregate: &WindowAggregate) -> WindowSummary {
    let mut prs_by_repo: HashMap<&Path, (usize, usize)> = HashMap::new();
    for prs in &aggregate.prs {
        prs_by_repo.insert(prs.repo.path(), (prs.opened.len(), prs.merged.len()));
    }

    let repositories = aggregate
        .extractions
        .iter()
        .map(|r| {
            let (prs_opened, prs_merged) =
                prs_by_repo.get(r.repo.path()).copied().unwrap_or_default();
            RepositorySummary {
                name: r.repo.name.clone(),
                path: r.repo.path.to_string_lossy().to_string(),
                commits: r.total_commits(),
                lines_added: r.lines_added(),
                lines_removed: r.lines_removed(),
                files_changed: r.files_changed(),
                prs_opened,
                prs_merged,
                error: r.error.clone(),
            }
        })
        .collect();

    WindowSummary {
        label: aggregate.window.label.clone(),
        since: aggregate.window.since,
        commits: aggregate.total_commits(),
        repos_with_commits: aggregate.repos_with_commits(),
        lines_added: aggregate.lines_added(),
        lines_removed: aggregate.lines_removed(),
        files_changed: aggregate.files_changed(),
        prs_opened: aggregate.prs_opened(),
        prs_merged: aggregate.prs_merged(),
        repositories,
    }
}

pub fn build_output(
    root: &Path,
    aggregates: &[WindowAggregate],
    warnings: &[String],
) -> ReportOutput {
    ReportOutput {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        root: root.to_string_lossy().to_string(),
        warnings: warnings.to_vec(),
        windows: aggregates.iter().map(summarize).collect(),
    }
}

pub fn output_json(
    root: &Path,
    aggregates: &[WindowAggregate],
    warnings: &[String],
) -> anyhow::Result<()> {
    let output = build_output(root, aggregates, warnings);
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
