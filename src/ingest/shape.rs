use crate::error::{CommitmapError, Result};
use crate::github::RawCommit;
use crate::model::{AuthorActivity, CommitRecord};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Running per-author activity index, local to one pipeline run.
///
/// First/last timestamps are kept as direct running min/max, updated in
/// O(1) per observed commit. Entries come back out in first-seen order,
/// one per distinct email.
#[derive(Debug, Default)]
pub struct AuthorIndex {
    by_email: HashMap<String, usize>,
    entries: Vec<AuthorActivity>,
}

impl AuthorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn observe(&mut self, email: &str, name: &str, timestamp: DateTime<Utc>) {
        match self.by_email.get(email) {
            Some(&idx) => {
                let entry = &mut self.entries[idx];
                if timestamp < entry.first_commit {
                    entry.first_commit = timestamp;
                }
                if timestamp > entry.last_commit {
                    entry.last_commit = timestamp;
                }
            }
            None => {
                self.by_email.insert(email.to_string(), self.entries.len());
                self.entries.push(AuthorActivity {
                    email: email.to_string(),
                    name: name.to_string(),
                    first_commit: timestamp,
                    last_commit: timestamp,
                });
            }
        }
    }

    pub fn into_activities(self) -> Vec<AuthorActivity> {
        self.entries
    }
}

/// Convert one raw API item into a normalized record and fold its author
/// into the running index. Missing nested fields or an unparseable date
/// are fatal; the pipeline does not skip broken records.
pub fn shape_commit(raw: &RawCommit, index: &mut AuthorIndex) -> Result<CommitRecord> {
    let author = raw
        .commit
        .as_ref()
        .and_then(|c| c.author.as_ref())
        .ok_or_else(|| CommitmapError::MalformedCommit("missing commit.author".into()))?;
    let email = author
        .email
        .as_deref()
        .ok_or_else(|| CommitmapError::MalformedCommit("missing commit.author.email".into()))?;
    let name = author
        .name
        .as_deref()
        .ok_or_else(|| CommitmapError::MalformedCommit("missing commit.author.name".into()))?;
    let date = author
        .date
        .as_deref()
        .ok_or_else(|| CommitmapError::MalformedCommit("missing commit.author.date".into()))?;

    let timestamp = DateTime::parse_from_rfc3339(date)
        .map_err(|e| CommitmapError::MalformedCommit(format!("bad commit date {date:?}: {e}")))?
        .with_timezone(&Utc);

    index.observe(email, name, timestamp);
    Ok(CommitRecord {
        author_email: email.to_string(),
        timestamp,
    })
}
