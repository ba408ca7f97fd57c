use crate::github::GithubClient;
use crate::ingest::fetch_window;
use crate::insights;
use crate::model::{CommitWindow, WINDOW_DATE_FORMAT};
use crate::store::{RefreshMode, Store};
use anyhow::Context;
use chrono::{Duration, NaiveDateTime, Utc};
use clap::Parser;
use console::style;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "commitmap")]
#[command(about = "GitHub commit history ingestion and contributor insights")]
#[command(version)]
pub struct Cli {
    #[arg(long, default_value = "apache", help = "GitHub organization or user")]
    pub organization: String,

    #[arg(long, default_value = "airflow", help = "Repository name")]
    pub repository: String,

    #[arg(
        long,
        value_parser = parse_window_date,
        help = "Window start, YYYY-MM-DDTHH:MM:SS (default: 24h ago)"
    )]
    pub start_date: Option<NaiveDateTime>,

    #[arg(
        long,
        value_parser = parse_window_date,
        help = "Window end, YYYY-MM-DDTHH:MM:SS (default: 24h ahead, covering today inclusively)"
    )]
    pub end_date: Option<NaiveDateTime>,

    #[arg(long, default_value = "commitmap.db", help = "Path to the SQLite database")]
    pub db: PathBuf,

    #[arg(long, default_value = "output", help = "Directory for the heatmap image")]
    pub output_dir: PathBuf,

    #[arg(
        long,
        value_enum,
        default_value_t = RefreshMode::Full,
        help = "Keep or discard rows from earlier runs"
    )]
    pub refresh: RefreshMode,

    #[arg(long, help = "GitHub API token (falls back to GITHUB_TOKEN)")]
    pub token: Option<String>,

    #[arg(long, help = "Emit the insights as JSON")]
    pub json: bool,
}

fn parse_window_date(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s, WINDOW_DATE_FORMAT)
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn execute(self) -> anyhow::Result<()> {
        let now = Utc::now().naive_utc();
        let since = self.start_date.unwrap_or(now - Duration::hours(24));
        let until = self.end_date.unwrap_or(now + Duration::hours(24));
        // Validated before any network or database activity
        let window = CommitWindow::new(since, until)?;

        let token = self
            .token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok());
        let source = GithubClient::new(&self.organization, &self.repository, token)?;

        let (records, authors) = fetch_window(&source, &window)
            .context("Failed to fetch commits from GitHub")?;

        if records.is_empty() {
            println!(
                "{}",
                style("No commits found in the specified window. Try an earlier start date.")
                    .yellow()
            );
        } else {
            println!(
                "Fetched {} commits from {} authors",
                records.len(),
                authors.len()
            );
        }

        let mut store = Store::open(&self.db, self.refresh).context("Failed to open database")?;
        store.prepare().context("Failed to prepare schema")?;
        // authors first: commits carry a foreign key on email
        store
            .insert_authors(&authors)
            .context("Failed to insert authors")?;
        store
            .insert_commits(&records)
            .context("Failed to insert commits")?;

        insights::exec(
            &store,
            &self.organization,
            &self.repository,
            &window,
            &self.output_dir,
            self.json,
        )
    }
}
