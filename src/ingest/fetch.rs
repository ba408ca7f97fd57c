use crate::error::Result;
use crate::github::{CommitSource, MAX_PAGES};
use crate::ingest::shape::{shape_commit, AuthorIndex};
use crate::model::{AuthorActivity, CommitRecord, CommitWindow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};

/// Fetch every commit in the window, newest first, shaping each raw item
/// into a normalized record and deriving per-author activity.
///
/// Pages are requested strictly sequentially up to [`MAX_PAGES`]; the first
/// empty page is the sole early-termination signal. A window with no
/// commits at all is not an error: both collections come back empty and
/// downstream insight computation proceeds on empty data.
pub fn fetch_window<S: CommitSource>(
    source: &S,
    window: &CommitWindow,
) -> Result<(Vec<CommitRecord>, Vec<AuthorActivity>)> {
    let mut raw = Vec::new();

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );

    for page in 1..=MAX_PAGES {
        pb.set_message(format!("Fetching commits, page {page}..."));
        let items = source.fetch_page(page, window)?;
        if items.is_empty() {
            // No further pages
            break;
        }
        raw.extend(items);
    }
    pb.finish_and_clear();

    info!(
        "fetched {} commits between {} and {}",
        raw.len(),
        window.since_param(),
        window.until_param()
    );

    if raw.is_empty() {
        warn!("no commits found in the specified window");
        return Ok((Vec::new(), Vec::new()));
    }

    let mut index = AuthorIndex::new();
    let mut records = Vec::with_capacity(raw.len());
    for item in &raw {
        records.push(shape_commit(item, &mut index)?);
    }

    Ok((records, index.into_activities()))
}
