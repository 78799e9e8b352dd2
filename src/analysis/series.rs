use crate::{
    analysis::select::Selection,
    data::{
        events::Grouper,
        window::{start_of_day, Bucket, Window},
    },
};
use log::debug;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::BTreeMap;

const BOOTSTRAP_ITERATIONS: usize = 1000;
const BOOTSTRAP_SEED: u64 = 0;
const CONFIDENCE_LEVEL: f64 = 95.0;

#[derive(Clone, Debug, PartialEq)]
pub struct SeriesPoint {
    pub bucket: Bucket,
    pub value: f64,
    /// Lower and upper bound of the confidence interval, when computed.
    pub ci: Option<(f64, f64)>,
}

/// One time series per group, each sorted by bucket.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupedSeries {
    pub window: Window,
    pub lines: BTreeMap<String, Vec<SeriesPoint>>,
}

impl GroupedSeries {
    pub fn x_range(&self) -> Option<(Bucket, Bucket)> {
        let mut buckets = self.lines.values().flatten().map(|p| p.bucket);
        let first = buckets.next()?;
        Some(buckets.fold((first, first), |(lo, hi), b| (lo.min(b), hi.max(b))))
    }

    pub fn y_max(&self) -> f64 {
        self.lines
            .values()
            .flatten()
            .map(|p| p.ci.map_or(p.value, |(_, hi)| hi.max(p.value)))
            .fold(0.0, f64::max)
    }
}

/// Average number of injected requests per second of each application,
/// averaged again over `window`.
///
/// Seconds without requests between an application's first and last request
/// count as zero. Coarse bins are aligned on UTC midnight of the day of each
/// application's first request. Returns `None` if the selection is empty.
pub fn rate_view(selection: &Selection<'_>, window: &Window) -> Option<GroupedSeries> {
    let second = Window::from_secs(1);

    let mut per_second = BTreeMap::<&str, BTreeMap<i64, u64>>::new();
    for event in selection.iter() {
        let bucket = second.floor(&event.injected);
        *per_second
            .entry(event.app.as_str())
            .or_default()
            .entry(bucket.start_millis())
            .or_default() += 1;
    }

    if per_second.is_empty() {
        debug!("no events to compute the request rate");
        return None;
    }

    let mut lines = BTreeMap::new();
    for (app, counts) in per_second {
        let (Some(first), Some(last)) = (counts.keys().next(), counts.keys().next_back()) else {
            continue;
        };

        // Bins start at midnight of the app's first request
        let origin = start_of_day(*first);
        let mut sums = BTreeMap::<Bucket, (u64, u64)>::new();
        for millis in (*first..=*last).step_by(1000) {
            let count = counts.get(&millis).copied().unwrap_or(0);
            let entry = sums.entry(window.floor_millis_from(origin, millis)).or_default();
            entry.0 += count;
            entry.1 += 1;
        }

        let points = sums
            .into_iter()
            .map(|(bucket, (total, seconds))| SeriesPoint {
                bucket,
                value: total as f64 / seconds as f64,
                ci: None,
            })
            .collect();
        lines.insert(app.to_string(), points);
    }

    Some(GroupedSeries {
        window: window.clone(),
        lines,
    })
}

/// Mean response time of finished requests per (window, group) with a 95%
/// bootstrap confidence interval.
///
/// Returns `None` when no finished request with a response time is left
/// after grouping.
pub fn latency_view(
    selection: &Selection<'_>,
    grouper: Grouper,
    window: &Window,
) -> Option<GroupedSeries> {
    let mut samples = BTreeMap::<&str, BTreeMap<Bucket, Vec<f64>>>::new();
    for event in selection.iter().filter(|e| e.finished) {
        let (Some(group), Some(response_time)) = (grouper.key(event), event.response_time) else {
            continue;
        };
        samples
            .entry(group)
            .or_default()
            .entry(window.floor(&event.injected))
            .or_default()
            .push(response_time);
    }

    if samples.is_empty() {
        debug!("no finished requests to compute the response time");
        return None;
    }

    let mut rng = StdRng::seed_from_u64(BOOTSTRAP_SEED);
    let lines = samples
        .into_iter()
        .map(|(group, buckets)| {
            let points = buckets
                .into_iter()
                .map(|(bucket, values)| SeriesPoint {
                    bucket,
                    value: mean(&values),
                    ci: Some(bootstrap_ci(&values, &mut rng)),
                })
                .collect();
            (group.to_string(), points)
        })
        .collect();

    Some(GroupedSeries {
        window: window.clone(),
        lines,
    })
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Percentile with linear interpolation between closest ranks. `sorted`
/// must be sorted and non-empty.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

/// Percentile confidence interval of the mean, from resampling `values`
/// with replacement.
pub fn bootstrap_ci(values: &[f64], rng: &mut StdRng) -> (f64, f64) {
    if values.len() < 2 {
        let m = mean(values);
        return (m, m);
    }

    let mut means: Vec<f64> = (0..BOOTSTRAP_ITERATIONS)
        .map(|_| {
            let total: f64 = (0..values.len())
                .map(|_| values[rng.gen_range(0..values.len())])
                .sum();
            total / values.len() as f64
        })
        .collect();
    means.sort_by(f64::total_cmp);

    let tail = (100.0 - CONFIDENCE_LEVEL) / 2.0;
    (percentile(&means, tail), percentile(&means, 100.0 - tail))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::events::{Event, EventTable};
    use chrono::{DateTime, TimeZone, Utc};

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, h, m, s).unwrap()
    }

    fn event(app: &str, injected: DateTime<Utc>, response_time: Option<f64>) -> Event {
        Event {
            experiment: "poisson_hard_SWRR_q0".to_string(),
            app: app.to_string(),
            container: None,
            injected,
            finished: response_time.is_some(),
            response_time,
        }
    }

    #[test]
    fn test_rate_view_fills_empty_seconds() {
        // app0: 3 requests at second 0, none at 1, 1 at second 2
        let table: EventTable = vec![
            event("app0", at(9, 0, 0), Some(1.0)),
            event("app0", at(9, 0, 0), Some(1.0)),
            event("app0", at(9, 0, 0), None),
            event("app0", at(9, 0, 2), Some(1.0)),
        ]
        .into_iter()
        .collect();

        let window: Window = "60s".parse().unwrap();
        let series = rate_view(&table.filter(None), &window).unwrap();
        let points = &series.lines["app0"];

        assert_eq!(points.len(), 1);
        assert!((points[0].value - 4.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_rate_view_splits_windows() {
        let table: EventTable = vec![
            event("app0", at(9, 0, 59), None),
            event("app0", at(9, 1, 0), None),
            event("app0", at(9, 1, 0), None),
            event("app1", at(9, 1, 30), None),
        ]
        .into_iter()
        .collect();

        let window: Window = "1min".parse().unwrap();
        let series = rate_view(&table.filter(None), &window).unwrap();

        let app0 = &series.lines["app0"];
        assert_eq!(app0.len(), 2);
        assert_eq!(app0[0].value, 1.0);
        assert_eq!(app0[1].value, 2.0);
        assert_eq!(series.lines["app1"].len(), 1);
    }

    #[test]
    fn test_rate_view_bins_start_at_midnight() {
        let table: EventTable = vec![event("app0", at(9, 0, 5), None)].into_iter().collect();

        let window: Window = "7min".parse().unwrap();
        let series = rate_view(&table.filter(None), &window).unwrap();
        let points = &series.lines["app0"];

        // 7min bins counted from 00:00, not from the epoch
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].bucket, Bucket::from_millis(at(8, 59, 0).timestamp_millis()));
    }

    #[test]
    fn test_rate_view_empty_selection() {
        let table = EventTable::default();
        assert!(rate_view(&table.filter(None), &Window::default()).is_none());
    }

    #[test]
    fn test_latency_view_mean_and_ci() {
        let table: EventTable = vec![
            event("app0", at(9, 0, 1), Some(1.0)),
            event("app0", at(9, 0, 2), Some(2.0)),
            event("app0", at(9, 0, 3), Some(3.0)),
            event("app1", at(9, 0, 4), None),
        ]
        .into_iter()
        .collect();

        let series = latency_view(&table.filter(None), Grouper::App, &Window::default()).unwrap();
        assert_eq!(series.lines.len(), 1);

        let point = &series.lines["app0"][0];
        assert!((point.value - 2.0).abs() < 1e-9);
        let (lo, hi) = point.ci.unwrap();
        assert!(lo >= 1.0 && lo <= point.value);
        assert!(hi <= 3.0 && hi >= point.value);
    }

    #[test]
    fn test_latency_view_is_repeatable() {
        let table: EventTable = (0..20)
            .map(|i| event("app0", at(9, 0, i), Some(i as f64 / 10.0)))
            .collect();
        let window = Window::default();

        let first = latency_view(&table.filter(None), Grouper::App, &window);
        let second = latency_view(&table.filter(None), Grouper::App, &window);
        assert_eq!(first, second);
    }

    #[test]
    fn test_latency_view_container_grouper_skips_unassigned() {
        let mut with_container = event("app0", at(9, 0, 0), Some(1.0));
        with_container.container = Some("cc0app0".to_string());
        let table: EventTable = vec![with_container, event("app0", at(9, 0, 1), Some(5.0))]
            .into_iter()
            .collect();

        let series =
            latency_view(&table.filter(None), Grouper::Container, &Window::default()).unwrap();
        assert_eq!(series.lines.keys().collect::<Vec<_>>(), vec!["cc0app0"]);
        assert_eq!(series.lines["cc0app0"][0].value, 1.0);
    }

    #[test]
    fn test_latency_view_only_lost_requests() {
        let table: EventTable = vec![event("app0", at(9, 0, 0), None)].into_iter().collect();
        assert!(latency_view(&table.filter(None), Grouper::App, &Window::default()).is_none());
    }

    #[test]
    fn test_percentile() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&sorted, 0.0), 1.0);
        assert_eq!(percentile(&sorted, 50.0), 2.5);
        assert_eq!(percentile(&sorted, 100.0), 4.0);
    }
}
