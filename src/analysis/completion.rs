use crate::{
    analysis::select::Selection,
    data::{
        events::Grouper,
        window::{Bucket, Window},
    },
};
use log::debug;
use std::collections::{BTreeMap, BTreeSet};

/// Bars are drawn narrower than the bucket to leave a gap between them.
const BAR_WIDTH_RATIO: f64 = 0.8;

/// A `(group, finished)` column of the completion table.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StatusColumn {
    pub group: String,
    pub finished: bool,
}

/// Pivot of request counts: one row per bucket, one column per
/// `(group, finished)` pair seen in the data.
///
/// Completed columns come before lost ones, and groups are sorted
/// alphabetically within each status.
#[derive(Clone, Debug, PartialEq)]
pub struct CompletionTable {
    pub buckets: Vec<Bucket>,
    pub columns: Vec<StatusColumn>,
    /// `counts[row][col]`, zero where the combination never occurs.
    pub counts: Vec<Vec<u64>>,
}

/// One stacked rectangle of the completed/lost bar chart.
#[derive(Clone, Debug, PartialEq)]
pub struct BarSegment {
    pub bucket: Bucket,
    pub group: String,
    pub finished: bool,
    pub bottom: f64,
    pub top: f64,
}

/// Cross-tabulates requests by bucket, group and completion status.
///
/// Returns `None` when no row is left once rows without a group value are
/// dropped.
pub fn completion_table(
    selection: &Selection<'_>,
    grouper: Grouper,
    window: &Window,
) -> Option<CompletionTable> {
    let mut cells = BTreeMap::<(Bucket, &str, bool), u64>::new();
    for event in selection.iter() {
        let Some(group) = grouper.key(event) else {
            continue;
        };
        *cells
            .entry((window.floor(&event.injected), group, event.finished))
            .or_default() += 1;
    }

    if cells.is_empty() {
        debug!("no requests to cross-tabulate");
        return None;
    }

    let buckets: Vec<Bucket> = cells
        .keys()
        .map(|(bucket, _, _)| *bucket)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut columns: Vec<StatusColumn> = cells
        .keys()
        .map(|(_, group, finished)| (*group, *finished))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|(group, finished)| StatusColumn {
            group: group.to_string(),
            finished,
        })
        .collect();
    columns.sort_by(|a, b| {
        b.finished
            .cmp(&a.finished)
            .then_with(|| a.group.cmp(&b.group))
    });

    let mut counts = vec![vec![0; columns.len()]; buckets.len()];
    for ((bucket, group, finished), count) in &cells {
        let row = buckets.binary_search(bucket);
        let col = columns
            .iter()
            .position(|c| c.group == *group && c.finished == *finished);
        if let (Ok(row), Some(col)) = (row, col) {
            counts[row][col] = *count;
        }
    }

    Some(CompletionTable {
        buckets,
        columns,
        counts,
    })
}

impl CompletionTable {
    /// Sorted, de-duplicated group names.
    pub fn groups(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| c.group.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn count(&self, bucket: Bucket, group: &str, finished: bool) -> u64 {
        let Some(row) = self.buckets.iter().position(|b| *b == bucket) else {
            return 0;
        };
        self.columns
            .iter()
            .position(|c| c.group == group && c.finished == finished)
            .map_or(0, |col| self.counts[row][col])
    }

    /// Number of completed requests in each bucket.
    pub fn completed_totals(&self) -> Vec<u64> {
        self.counts
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&self.columns)
                    .filter(|(_, col)| col.finished)
                    .map(|(count, _)| *count)
                    .sum()
            })
            .collect()
    }

    pub fn row_totals(&self) -> Vec<u64> {
        self.counts.iter().map(|row| row.iter().sum()).collect()
    }

    /// Stacking geometry. Completed segments start at zero, lost segments
    /// start on top of the bucket's completed total. Follows column order.
    pub fn segments(&self) -> Vec<BarSegment> {
        let completed = self.completed_totals();
        let mut bottom_completed = vec![0.0; self.buckets.len()];
        let mut bottom_lost: Vec<f64> = completed.iter().map(|c| *c as f64).collect();

        let mut segments = Vec::new();
        for (col_idx, col) in self.columns.iter().enumerate() {
            let bottoms = if col.finished {
                &mut bottom_completed
            } else {
                &mut bottom_lost
            };
            for (row_idx, bucket) in self.buckets.iter().enumerate() {
                let height = self.counts[row_idx][col_idx] as f64;
                segments.push(BarSegment {
                    bucket: *bucket,
                    group: col.group.clone(),
                    finished: col.finished,
                    bottom: bottoms[row_idx],
                    top: bottoms[row_idx] + height,
                });
                bottoms[row_idx] += height;
            }
        }

        segments
    }
}

/// Width of a bar on a date axis, in days.
pub fn bar_width_days(window: &Window) -> f64 {
    window.as_days() * BAR_WIDTH_RATIO
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::events::{Event, EventTable};
    use chrono::{DateTime, TimeZone, Utc};

    fn at(m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, m, s).unwrap()
    }

    fn event(app: &str, injected: DateTime<Utc>, finished: bool) -> Event {
        Event {
            experiment: "e".to_string(),
            app: app.to_string(),
            container: None,
            injected,
            finished,
            response_time: finished.then_some(1.0),
        }
    }

    fn sample_table() -> EventTable {
        vec![
            event("web", at(0, 1), true),
            event("api", at(0, 2), true),
            event("api", at(0, 3), false),
            event("web", at(0, 4), false),
            event("web", at(1, 0), true),
            event("web", at(1, 5), true),
            event("api", at(1, 9), false),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_column_order() {
        let table = sample_table();
        let pivot = completion_table(&table.filter(None), Grouper::App, &Window::default()).unwrap();

        let columns: Vec<(&str, bool)> = pivot
            .columns
            .iter()
            .map(|c| (c.group.as_str(), c.finished))
            .collect();
        assert_eq!(
            columns,
            vec![("api", true), ("web", true), ("api", false), ("web", false)]
        );
        assert_eq!(pivot.groups(), vec!["api".to_string(), "web".to_string()]);
    }

    #[test]
    fn test_missing_combinations_are_zero() {
        let table = sample_table();
        let pivot = completion_table(&table.filter(None), Grouper::App, &Window::default()).unwrap();

        assert_eq!(pivot.buckets.len(), 2);
        let second = pivot.buckets[1];
        assert_eq!(pivot.count(second, "api", true), 0);
        assert_eq!(pivot.count(second, "web", true), 2);
        assert_eq!(pivot.count(second, "api", false), 1);
        assert_eq!(pivot.count(second, "web", false), 0);
    }

    #[test]
    fn test_row_totals_match_input() {
        let table = sample_table();
        let pivot = completion_table(&table.filter(None), Grouper::App, &Window::default()).unwrap();

        assert_eq!(pivot.row_totals(), vec![4, 3]);
        assert_eq!(pivot.completed_totals(), vec![2, 2]);
    }

    #[test]
    fn test_segments_stack_lost_above_completed() {
        let table = sample_table();
        let pivot = completion_table(&table.filter(None), Grouper::App, &Window::default()).unwrap();
        let first = pivot.buckets[0];

        let segments = pivot.segments();
        let bounds: Vec<(&str, bool, f64, f64)> = segments
            .iter()
            .filter(|s| s.bucket == first)
            .map(|s| (s.group.as_str(), s.finished, s.bottom, s.top))
            .collect();
        assert_eq!(
            bounds,
            vec![
                ("api", true, 0.0, 1.0),
                ("web", true, 1.0, 2.0),
                ("api", false, 2.0, 3.0),
                ("web", false, 3.0, 4.0),
            ]
        );
    }

    #[test]
    fn test_empty_selection() {
        let table = EventTable::default();
        assert!(completion_table(&table.filter(None), Grouper::App, &Window::default()).is_none());
    }

    #[test]
    fn test_bar_width() {
        let window: Window = "60s".parse().unwrap();
        let expected = 60.0 / 86400.0 * 0.8;
        assert!((bar_width_days(&window) - expected).abs() < 1e-12);
    }
}
