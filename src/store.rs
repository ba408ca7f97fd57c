use crate::error::Result;
use crate::model::{AuthorActivity, CommitRecord, ContributionSpan, Contributor};
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use rusqlite::{params, Connection};
use std::path::Path;

/// How `prepare` and the insert path treat rows from earlier runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RefreshMode {
    /// Drop and recreate both tables, discarding prior runs.
    Full,
    /// Keep prior rows; merge author activity and skip duplicate commits.
    Append,
}

pub struct Store {
    conn: Connection,
    mode: RefreshMode,
}

impl Store {
    pub fn open<P: AsRef<Path>>(path: P, mode: RefreshMode) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self { conn, mode })
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory(mode: RefreshMode) -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
            mode,
        })
    }

    /// Schema setup. Commits reference authors by email, so authors are
    /// created first and dropped last.
    pub fn prepare(&self) -> Result<()> {
        if self.mode == RefreshMode::Full {
            self.conn
                .execute_batch("DROP TABLE IF EXISTS commits; DROP TABLE IF EXISTS authors;")?;
        }
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS authors (
                email TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                first_commit TEXT NOT NULL,
                last_commit TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS commits (
                email TEXT NOT NULL REFERENCES authors(email),
                date TEXT NOT NULL,
                PRIMARY KEY (email, date)
            );
            ",
        )?;
        Ok(())
    }

    /// Insert author rows. Must run before `insert_commits` because of the
    /// foreign key on `commits.email`.
    pub fn insert_authors(&mut self, authors: &[AuthorActivity]) -> Result<()> {
        let mode = self.mode;
        let tx = self.conn.transaction()?;
        {
            let sql = match mode {
                RefreshMode::Full => {
                    "INSERT INTO authors (email, name, first_commit, last_commit)
                     VALUES (?, ?, ?, ?)"
                }
                RefreshMode::Append => {
                    "INSERT INTO authors (email, name, first_commit, last_commit)
                     VALUES (?, ?, ?, ?)
                     ON CONFLICT(email) DO UPDATE SET
                         name = excluded.name,
                         first_commit = min(first_commit, excluded.first_commit),
                         last_commit = max(last_commit, excluded.last_commit)"
                }
            };
            let mut stmt = tx.prepare(sql)?;
            for author in authors {
                stmt.execute(params![
                    author.email,
                    author.name,
                    author.first_commit,
                    author.last_commit
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn insert_commits(&mut self, records: &[CommitRecord]) -> Result<()> {
        let mode = self.mode;
        let tx = self.conn.transaction()?;
        {
            let sql = match mode {
                RefreshMode::Full => "INSERT INTO commits (email, date) VALUES (?, ?)",
                RefreshMode::Append => "INSERT OR IGNORE INTO commits (email, date) VALUES (?, ?)",
            };
            let mut stmt = tx.prepare(sql)?;
            for record in records {
                stmt.execute(params![record.author_email, record.timestamp])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Authors with the most commits in the stored window. Ties are broken
    /// by ascending email so the ranking is deterministic.
    pub fn top_contributors(&self, limit: u32) -> Result<Vec<Contributor>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.email, a.name, COUNT(*) AS num_commits
             FROM commits c
             LEFT JOIN authors a ON c.email = a.email
             GROUP BY c.email
             ORDER BY num_commits DESC, c.email ASC
             LIMIT ?",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok(Contributor {
                email: row.get(0)?,
                name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                commits: row.get(2)?,
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    /// Authors ordered by the span between their first and last commit,
    /// longest first, same email tie-break.
    pub fn longest_windows(&self, limit: u32) -> Result<Vec<ContributionSpan>> {
        let mut stmt = self.conn.prepare(
            "SELECT email, name,
                    (julianday(last_commit) - julianday(first_commit)) * 24.0 AS window_hours
             FROM authors
             ORDER BY window_hours DESC, email ASC
             LIMIT ?",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok(ContributionSpan {
                email: row.get(0)?,
                name: row.get(1)?,
                hours: row.get(2)?,
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    /// Every stored commit timestamp, feeding the density reshape.
    pub fn commit_dates(&self) -> Result<Vec<DateTime<Utc>>> {
        let mut stmt = self.conn.prepare("SELECT date FROM commits")?;
        let rows = stmt.query_map([], |row| row.get::<_, DateTime<Utc>>(0))?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn ts(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    fn author(email: &str, name: &str, first: DateTime<Utc>, last: DateTime<Utc>) -> AuthorActivity {
        AuthorActivity {
            email: email.to_string(),
            name: name.to_string(),
            first_commit: first,
            last_commit: last,
        }
    }

    fn commit(email: &str, timestamp: DateTime<Utc>) -> CommitRecord {
        CommitRecord {
            author_email: email.to_string(),
            timestamp,
        }
    }

    #[test]
    fn empty_store_yields_empty_insights() {
        let store = Store::open_in_memory(RefreshMode::Full).unwrap();
        store.prepare().unwrap();
        assert!(store.top_contributors(3).unwrap().is_empty());
        assert!(store.longest_windows(3).unwrap().is_empty());
        assert!(store.commit_dates().unwrap().is_empty());
    }

    #[test]
    fn top_contributors_rank_by_count_then_email() {
        let mut store = Store::open_in_memory(RefreshMode::Full).unwrap();
        store.prepare().unwrap();
        store
            .insert_authors(&[
                author("bob@x.com", "Bob", ts(1, 0), ts(2, 0)),
                author("alice@x.com", "Alice", ts(1, 0), ts(2, 0)),
                author("carol@x.com", "Carol", ts(1, 0), ts(3, 0)),
                author("dave@x.com", "Dave", ts(1, 0), ts(1, 0)),
            ])
            .unwrap();
        store
            .insert_commits(&[
                commit("carol@x.com", ts(1, 10)),
                commit("carol@x.com", ts(2, 10)),
                commit("carol@x.com", ts(3, 10)),
                commit("bob@x.com", ts(1, 11)),
                commit("bob@x.com", ts(2, 11)),
                commit("alice@x.com", ts(1, 12)),
                commit("alice@x.com", ts(2, 12)),
                commit("dave@x.com", ts(1, 13)),
            ])
            .unwrap();

        let top = store.top_contributors(3).unwrap();
        let ranked: Vec<(&str, u32)> = top.iter().map(|c| (c.email.as_str(), c.commits)).collect();
        assert_eq!(
            ranked,
            vec![("carol@x.com", 3), ("alice@x.com", 2), ("bob@x.com", 2)]
        );
        assert_eq!(top[0].name, "Carol");
    }

    #[test]
    fn longest_windows_order_and_hours() {
        let mut store = Store::open_in_memory(RefreshMode::Full).unwrap();
        store.prepare().unwrap();
        store
            .insert_authors(&[
                author("short@x.com", "Short", ts(1, 0), ts(1, 6)),
                author("long@x.com", "Long", ts(1, 0), ts(3, 0)),
                author("single@x.com", "Single", ts(2, 5), ts(2, 5)),
            ])
            .unwrap();

        let spans = store.longest_windows(3).unwrap();
        let emails: Vec<&str> = spans.iter().map(|s| s.email.as_str()).collect();
        assert_eq!(emails, vec!["long@x.com", "short@x.com", "single@x.com"]);
        assert!((spans[0].hours - 48.0).abs() < 1e-6);
        assert!((spans[1].hours - 6.0).abs() < 1e-6);
        assert!(spans[2].hours.abs() < 1e-6);
    }

    #[test]
    fn full_refresh_discards_prior_rows() {
        let mut store = Store::open_in_memory(RefreshMode::Full).unwrap();
        store.prepare().unwrap();
        store
            .insert_authors(&[author("a@x.com", "A", ts(1, 0), ts(1, 0))])
            .unwrap();
        store.insert_commits(&[commit("a@x.com", ts(1, 0))]).unwrap();
        assert_eq!(store.commit_dates().unwrap().len(), 1);

        // second run against the same database
        store.prepare().unwrap();
        assert!(store.commit_dates().unwrap().is_empty());
        assert!(store.top_contributors(3).unwrap().is_empty());
    }

    #[test]
    fn append_merges_author_activity_and_skips_duplicates() {
        let mut store = Store::open_in_memory(RefreshMode::Append).unwrap();
        store.prepare().unwrap();
        store
            .insert_authors(&[author("a@x.com", "A", ts(2, 0), ts(3, 0))])
            .unwrap();
        store.insert_commits(&[commit("a@x.com", ts(2, 0))]).unwrap();

        store.prepare().unwrap();
        store
            .insert_authors(&[author("a@x.com", "A", ts(1, 0), ts(2, 12))])
            .unwrap();
        store
            .insert_commits(&[commit("a@x.com", ts(2, 0)), commit("a@x.com", ts(2, 12))])
            .unwrap();

        let spans = store.longest_windows(3).unwrap();
        assert_eq!(spans.len(), 1);
        assert!((spans[0].hours - 48.0).abs() < 1e-6);

        assert_eq!(store.commit_dates().unwrap().len(), 2);
    }

    #[test]
    fn full_mode_propagates_duplicate_key_violations() {
        let mut store = Store::open_in_memory(RefreshMode::Full).unwrap();
        store.prepare().unwrap();
        store
            .insert_authors(&[author("a@x.com", "A", ts(1, 0), ts(1, 0))])
            .unwrap();
        let dup = [commit("a@x.com", ts(1, 0)), commit("a@x.com", ts(1, 0))];
        assert!(store.insert_commits(&dup).is_err());
    }

    #[test]
    fn commit_dates_round_trip() {
        let mut store = Store::open_in_memory(RefreshMode::Full).unwrap();
        store.prepare().unwrap();
        store
            .insert_authors(&[author("a@x.com", "A", ts(6, 14), ts(6, 14))])
            .unwrap();
        store.insert_commits(&[commit("a@x.com", ts(6, 14))]).unwrap();

        let dates = store.commit_dates().unwrap();
        assert_eq!(dates, vec![ts(6, 14)]);
    }
}
