use crate::insights::{aggregate::density_grid, render::render_heatmap};
use crate::model::{CommitWindow, DensityCell, InsightReport};
use crate::store::Store;
use anyhow::Context;
use chrono::Utc;
use console::style;
use std::path::Path;

/// How many entries the ranked insights report.
pub const TOP_LIMIT: u32 = 3;

fn ordinal(rank: usize) -> String {
    match rank {
        1 => "1st".to_string(),
        2 => "2nd".to_string(),
        3 => "3rd".to_string(),
        n => format!("{n}th"),
    }
}

/// Compute the three insights over the persisted window and write the
/// heatmap artifact. Prints a styled report, or a single JSON document
/// when `json` is set.
pub fn exec(
    store: &Store,
    organization: &str,
    repository: &str,
    window: &CommitWindow,
    output_dir: &Path,
    json: bool,
) -> anyhow::Result<()> {
    let top = store
        .top_contributors(TOP_LIMIT)
        .context("Failed to query top contributors")?;
    let spans = store
        .longest_windows(TOP_LIMIT)
        .context("Failed to query contribution windows")?;
    let dates = store.commit_dates().context("Failed to query commit dates")?;

    let grid = density_grid(&dates);
    let heatmap = render_heatmap(&grid, organization, repository, output_dir)
        .context("Failed to render heatmap")?;

    if json {
        let report = InsightReport {
            generated_at: Utc::now(),
            organization: organization.to_string(),
            repository: repository.to_string(),
            since: window.since_param(),
            until: window.until_param(),
            top_contributors: top,
            longest_windows: spans,
            density: grid
                .cells()
                .map(|(day, bucket, commits)| DensityCell {
                    day: day.to_string(),
                    interval: bucket.to_string(),
                    commits,
                })
                .collect(),
            heatmap: heatmap.display().to_string(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", style("Top contributors").bold());
    if top.is_empty() {
        println!("  (no commits in window)");
    }
    for (i, contributor) in top.iter().enumerate() {
        println!(
            "  {}: {} ({}) -> {} commits",
            ordinal(i + 1),
            contributor.name,
            contributor.email,
            contributor.commits
        );
    }

    println!("\n{}", style("Longest contribution window").bold());
    if spans.is_empty() {
        println!("  (no authors in window)");
    }
    for span in &spans {
        println!("  {} -> {:.1} hours", span.email, span.hours);
    }

    println!(
        "\nHeatmap image written to {}",
        style(heatmap.display()).green()
    );

    Ok(())
}
