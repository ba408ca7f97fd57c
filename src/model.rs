use crate::error::{CommitmapError, Result};
use chrono::{DateTime, NaiveDateTime, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp format used on the GitHub wire and in query parameters.
pub const WIRE_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Format accepted for `--start-date` / `--end-date`.
pub const WINDOW_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Weekday axis order for the density grid, matching [`WEEKDAYS`].
pub const DAY_ORDER: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// One normalized commit as persisted to the `commits` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub author_email: String,
    pub timestamp: DateTime<Utc>,
}

/// Derived per-author activity row: first and last commit observed in the
/// current fetch window. `first_commit <= last_commit` by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorActivity {
    pub email: String,
    pub name: String,
    pub first_commit: DateTime<Utc>,
    pub last_commit: DateTime<Utc>,
}

/// Inclusive fetch window. Construction validates `since <= until` before
/// any network or database activity happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitWindow {
    pub since: NaiveDateTime,
    pub until: NaiveDateTime,
}

impl CommitWindow {
    pub fn new(since: NaiveDateTime, until: NaiveDateTime) -> Result<Self> {
        if since > until {
            return Err(CommitmapError::InvalidWindow { since, until });
        }
        Ok(Self { since, until })
    }

    pub fn since_param(&self) -> String {
        self.since.format(WIRE_DATE_FORMAT).to_string()
    }

    pub fn until_param(&self) -> String {
        self.until.format(WIRE_DATE_FORMAT).to_string()
    }
}

/// One of the eight fixed 3-hour intervals partitioning a day.
///
/// Intervals are half-open `[start, end)`: a commit at exactly 3:00 belongs
/// to `3am-6am`, not `12am-3am`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum TimeBucket {
    Am12 = 0,
    Am3 = 1,
    Am6 = 2,
    Am9 = 3,
    Pm12 = 4,
    Pm3 = 5,
    Pm6 = 6,
    Pm9 = 7,
}

impl TimeBucket {
    pub const ALL: [TimeBucket; 8] = [
        TimeBucket::Am12,
        TimeBucket::Am3,
        TimeBucket::Am6,
        TimeBucket::Am9,
        TimeBucket::Pm12,
        TimeBucket::Pm3,
        TimeBucket::Pm6,
        TimeBucket::Pm9,
    ];

    pub fn from_hour(hour: u32) -> Self {
        Self::ALL[((hour % 24) / 3) as usize]
    }

    pub fn of(timestamp: &DateTime<Utc>) -> Self {
        Self::from_hour(timestamp.hour())
    }

    pub fn start_hour(self) -> u32 {
        self as u32 * 3
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// 12-hour wall-clock rendering: hour 0 is `12am`, hour 12 is `12pm`,
/// hour 24 wraps back to `12am`.
fn clock12(hour: u32) -> (u32, &'static str) {
    let suffix = if hour % 24 < 12 { "am" } else { "pm" };
    match hour % 12 {
        0 => (12, suffix),
        h => (h, suffix),
    }
}

impl fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start = self.start_hour();
        let (start_hour, start_suffix) = clock12(start);
        let (end_hour, end_suffix) = clock12(start + 3);
        write!(f, "{start_hour}{start_suffix}-{end_hour}{end_suffix}")
    }
}

/// 7 weekdays x 8 time buckets of commit counts, Monday first. Missing
/// cells stay zero. Built fresh for each report, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DensityGrid {
    cells: [[u32; 8]; 7],
}

impl DensityGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, day: Weekday, bucket: TimeBucket) -> u32 {
        self.cells[day.num_days_from_monday() as usize][bucket.index()]
    }

    pub fn set(&mut self, day: Weekday, bucket: TimeBucket, count: u32) {
        self.cells[day.num_days_from_monday() as usize][bucket.index()] = count;
    }

    pub fn total(&self) -> u32 {
        self.cells.iter().flatten().sum()
    }

    pub fn max(&self) -> u32 {
        self.cells.iter().flatten().copied().max().unwrap_or(0)
    }

    /// All 56 cells in row-major order: Monday->Sunday, then bucket order.
    pub fn cells(&self) -> impl Iterator<Item = (&'static str, TimeBucket, u32)> + '_ {
        self.cells.iter().enumerate().flat_map(|(day_idx, row)| {
            row.iter()
                .enumerate()
                .map(move |(bucket_idx, &count)| (WEEKDAYS[day_idx], TimeBucket::ALL[bucket_idx], count))
        })
    }
}

/// Row of the top-contributors insight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contributor {
    pub email: String,
    pub name: String,
    pub commits: u32,
}

/// Row of the longest-contribution-window insight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionSpan {
    pub email: String,
    pub name: String,
    pub hours: f64,
}

/// Long-form density cell for the `--json` report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityCell {
    pub day: String,
    pub interval: String,
    pub commits: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightReport {
    pub generated_at: DateTime<Utc>,
    pub organization: String,
    pub repository: String,
    pub since: String,
    pub until: String,
    pub top_contributors: Vec<Contributor>,
    pub longest_windows: Vec<ContributionSpan>,
    pub density: Vec<DensityCell>,
    pub heatmap: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn at(hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 6, hour, min, sec).unwrap()
    }

    #[test]
    fn bucket_labels_cover_the_day() {
        let labels: Vec<String> = TimeBucket::ALL.iter().map(|b| b.to_string()).collect();
        assert_eq!(
            labels,
            vec![
                "12am-3am", "3am-6am", "6am-9am", "9am-12pm", "12pm-3pm", "3pm-6pm", "6pm-9pm",
                "9pm-12am"
            ]
        );
    }

    #[test]
    fn every_hour_maps_to_exactly_one_bucket() {
        for hour in 0..24 {
            let bucket = TimeBucket::from_hour(hour);
            assert!(TimeBucket::ALL.contains(&bucket));
            assert!(bucket.start_hour() <= hour && hour < bucket.start_hour() + 3);
        }
    }

    #[test]
    fn boundary_hours_belong_to_the_starting_bucket() {
        assert_eq!(TimeBucket::of(&at(2, 59, 59)).to_string(), "12am-3am");
        assert_eq!(TimeBucket::of(&at(3, 0, 0)).to_string(), "3am-6am");
        assert_eq!(TimeBucket::of(&at(23, 59, 59)).to_string(), "9pm-12am");
        assert_eq!(TimeBucket::of(&at(12, 0, 0)).to_string(), "12pm-3pm");
    }

    #[test]
    fn window_rejects_inverted_range() {
        let earlier = at(1, 0, 0).naive_utc();
        let later = at(2, 0, 0).naive_utc();
        assert!(CommitWindow::new(later, earlier).is_err());
        assert!(CommitWindow::new(earlier, later).is_ok());
        assert!(CommitWindow::new(earlier, earlier).is_ok());
    }

    #[test]
    fn window_params_use_wire_format() {
        let window = CommitWindow::new(at(1, 2, 3).naive_utc(), at(4, 5, 6).naive_utc()).unwrap();
        assert_eq!(window.since_param(), "2024-03-06T01:02:03Z");
        assert_eq!(window.until_param(), "2024-03-06T04:05:06Z");
    }

    #[test]
    fn grid_tracks_totals_and_max() {
        let mut grid = DensityGrid::new();
        assert_eq!(grid.total(), 0);
        grid.set(Weekday::Wed, TimeBucket::Pm12, 3);
        grid.set(Weekday::Sun, TimeBucket::Am12, 1);
        assert_eq!(grid.get(Weekday::Wed, TimeBucket::Pm12), 3);
        assert_eq!(grid.total(), 4);
        assert_eq!(grid.max(), 3);
        assert_eq!(grid.cells().count(), 56);
    }
}
