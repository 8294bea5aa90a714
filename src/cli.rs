use crate::config::{resolve_identities, Config};
use crate::discovery::find_repositories;
use crate::error::DevReportError;
use crate::github::{GhCli, PrFetcher};
use crate::model::TimeWindow;
use crate::orchestrator::analyze;
use crate::report::{output_json, render_report};
use crate::util::absolutize;
use crate::window::{custom_window, standard_windows, Period};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use console::style;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser)]
#[command(name = "dev-report")]
#[command(about = "Daily, weekly and monthly commit and pull request activity across local repositories")]
#[command(version)]
pub struct Cli {
    #[arg(default_value = ".", help = "Directory to scan for git repositories")]
    pub path: PathBuf,

    #[arg(long, help = "Only show the last 24 hours")]
    pub daily: bool,

    #[arg(long, help = "Only show the last 7 days")]
    pub weekly: bool,

    #[arg(long, help = "Only show the last 30 days")]
    pub monthly: bool,

    #[arg(
        long = "window",
        value_name = "DURATION",
        value_parser = humantime::parse_duration,
        help = "Additional window ending now, e.g. 14d or 2weeks (repeatable)"
    )]
    pub windows: Vec<Duration>,

    #[arg(long, help = "Output as JSON")]
    pub json: bool,

    #[arg(long, help = "Skip fetching pull requests from GitHub")]
    pub no_prs: bool,

    #[arg(long, help = "Path to config file (default: ~/.config/dev-report/config.toml)")]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LogLevel::Warn, help = "Log verbosity on stderr")]
    pub log_level: LogLevel,
}

fn init_logging(level: LogLevel) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Requested windows, standard ones first, then custom ones.
    ///
    /// When several period flags are given the narrowest one wins.
    pub fn time_windows(&self, now: DateTime<Utc>) -> Result<Vec<TimeWindow>> {
        let mut windows = if self.daily {
            vec![Period::Daily.window(now)]
        } else if self.weekly {
            vec![Period::Weekly.window(now)]
        } else if self.monthly {
            vec![Period::Monthly.window(now)]
        } else {
            standard_windows(now)
        };

        for span in &self.windows {
            windows.push(custom_window(now, *span).context("Invalid --window")?);
        }
        Ok(windows)
    }

    pub fn execute(self) -> Result<()> {
        init_logging(self.log_level);

        let config = match &self.config {
            Some(path) => Config::load(path),
            None => Config::load_default(),
        }
        .context("Failed to load configuration")?;

        let root = absolutize(&self.path);
        if !root.exists() {
            return Err(DevReportError::PathNotFound(root).into());
        }

        eprintln!("{}", style(format!("Scanning {}...", root.display())).dim());
        let repos = find_repositories(&root, &config).context("Failed to discover repositories")?;

        if repos.is_empty() {
            eprintln!("{}", style("No git repositories found.").yellow());
            return Ok(());
        }
        eprintln!("{}", style(format!("Found {} repositories", repos.len())).dim());

        let identities = resolve_identities(&config)?;
        let windows = self.time_windows(Utc::now())?;

        let fetcher = (!self.no_prs).then(|| PrFetcher::new(GhCli::default()));
        let analysis = analyze(
            &repos,
            &identities,
            fetcher.as_ref(),
            &windows,
            !self.json,
        )
        .context("Failed to analyze repositories")?;

        if self.json {
            output_json(&root, &analysis.aggregates, &analysis.warnings)?;
        } else {
            render_report(&analysis.aggregates, &analysis.warnings)?;
        }

        Ok(())
    }
}
