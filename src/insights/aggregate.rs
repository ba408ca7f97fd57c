use crate::model::{DensityGrid, TimeBucket, DAY_ORDER};
use chrono::{DateTime, Datelike, Utc, Weekday};
use std::collections::HashMap;

/// Reshape raw commit timestamps into the complete 7x8 density grid.
///
/// Sparse `(weekday, bucket)` counts are left-joined onto the full cross
/// product so all 56 cells are present, zero where no commit matched.
/// Bucketing is timezone-naive: each timestamp is classified exactly as
/// stored; callers that want a local-time heatmap convert before storing.
pub fn density_grid(timestamps: &[DateTime<Utc>]) -> DensityGrid {
    let mut counts: HashMap<(Weekday, TimeBucket), u32> = HashMap::new();
    for ts in timestamps {
        *counts.entry((ts.weekday(), TimeBucket::of(ts))).or_insert(0) += 1;
    }

    let mut grid = DensityGrid::new();
    for &day in &DAY_ORDER {
        for &bucket in &TimeBucket::ALL {
            let count = counts.get(&(day, bucket)).copied().unwrap_or(0);
            grid.set(day, bucket, count);
        }
    }
    grid
}
