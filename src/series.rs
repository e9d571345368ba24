//! Timestamp-indexed series and the transforms applied to them.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDateTime, Timelike};

/// An ordered time series with unique timestamps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    pub name: String,
    points: BTreeMap<NaiveDateTime, f64>,
}

impl Series {
    pub fn new(name: &str) -> Self {
        Series {
            name: name.to_string(),
            points: BTreeMap::new(),
        }
    }

    pub fn from_points<I>(name: &str, points: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDateTime, f64)>,
    {
        let mut series = Series::new(name);
        for (ts, value) in points {
            series.insert(ts, value);
        }

        series
    }

    /// Inserts a sample, keeping the first value seen for a timestamp.
    /// Returns `false` when the timestamp was already present.
    pub fn insert(&mut self, ts: NaiveDateTime, value: f64) -> bool {
        if self.points.contains_key(&ts) {
            return false;
        }
        self.points.insert(ts, value);
        true
    }

    pub fn get(&self, ts: &NaiveDateTime) -> Option<f64> {
        self.points.get(ts).copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDateTime, f64)> + '_ {
        self.points.iter().map(|(ts, v)| (*ts, *v))
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.values().copied().collect()
    }

    pub fn to_points(&self) -> Vec<(NaiveDateTime, f64)> {
        self.iter().collect()
    }

    /// Keeps the samples accepted by `keep`.
    pub fn filter<F>(&self, keep: F) -> Series
    where
        F: Fn(&NaiveDateTime) -> bool,
    {
        Series::from_points(&self.name, self.iter().filter(|(ts, _)| keep(ts)))
    }

    pub fn scaled(&self, factor: f64) -> Series {
        Series::from_points(&self.name, self.iter().map(|(ts, v)| (ts, v * factor)))
    }

    /// Keeps one sample out of every `period`, starting with the first.
    pub fn subsample(&self, period: usize) -> Series {
        let period = period.max(1);
        Series::from_points(
            &self.name,
            self.iter()
                .enumerate()
                .filter(|(idx, _)| idx % period == 0)
                .map(|(_, point)| point),
        )
    }
}

/// Timestamps of the target year.
pub fn in_year(ts: &NaiveDateTime, year: i32) -> bool {
    ts.year() == year
}

/// Timestamps of the target year plus the second half of the previous
/// December and the first half of the next January, used to feed the
/// smoothing window at both ends of the year.
pub fn in_extended_year(ts: &NaiveDateTime, year: i32) -> bool {
    if ts.year() == year {
        return true;
    }
    if ts.year() == year - 1 && ts.month() == 12 && ts.day() >= 15 {
        return true;
    }
    if ts.year() == year + 1 && ts.month() == 1 && ts.day() <= 15 {
        return true;
    }

    false
}

/// Centered moving average over `window` samples.
///
/// Boundary samples average the part of the window that exists, so every
/// input sample accepted by `emit` yields one output sample.
pub fn moving_average<F>(series: &Series, window: usize, emit: F) -> Series
where
    F: Fn(&NaiveDateTime) -> bool,
{
    let half = window / 2;
    let points = series.to_points();
    let n = points.len();

    // prefix sums keep this linear in the series length
    let mut prefix = Vec::with_capacity(n + 1);
    prefix.push(0.0);
    for (_, v) in &points {
        let last = prefix[prefix.len() - 1];
        prefix.push(last + v);
    }

    let mut result = Series::new(&series.name);
    for (pos, (ts, _)) in points.iter().enumerate() {
        if !emit(ts) {
            continue;
        }
        let left = pos.saturating_sub(half);
        let right = (pos + half + 1).min(n);
        let mean = (prefix[right] - prefix[left]) / (right - left) as f64;
        result.insert(*ts, mean);
    }

    result
}

/// Per-timestamp mean of all series containing that timestamp.
pub fn mean_of(name: &str, series: &[Series]) -> Series {
    let mut sums: BTreeMap<NaiveDateTime, (f64, usize)> = BTreeMap::new();
    for s in series {
        for (ts, v) in s.iter() {
            let entry = sums.entry(ts).or_insert((0.0, 0));
            entry.0 += v;
            entry.1 += 1;
        }
    }

    Series::from_points(
        name,
        sums.into_iter()
            .map(|(ts, (sum, count))| (ts, sum / count as f64)),
    )
}

/// Pairs of values at the timestamps present in both series.
pub fn inner_join(left: &Series, right: &Series) -> Vec<(NaiveDateTime, f64, f64)> {
    left.iter()
        .filter_map(|(ts, l)| right.get(&ts).map(|r| (ts, l, r)))
        .collect()
}

/// `|computed - reference|` over the shared timestamps.
pub fn absolute_error(name: &str, computed: &Series, reference: &Series) -> Series {
    Series::from_points(
        name,
        inner_join(computed, reference)
            .into_iter()
            .map(|(ts, c, r)| (ts, (c - r).abs())),
    )
}

/// Truncates a timestamp to the minute.
pub fn floor_to_minute(ts: &NaiveDateTime) -> NaiveDateTime {
    ts.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(*ts)
}

/// `|a - b| / a` on the minute-aligned timestamps shared by both series.
/// Samples where `a` is zero are left out.
pub fn relative_deviation(name: &str, a: &Series, b: &Series) -> Series {
    let floor = |s: &Series| Series::from_points(&s.name, s.iter().map(|(ts, v)| (floor_to_minute(&ts), v)));
    let (a, b) = (floor(a), floor(b));

    Series::from_points(
        name,
        inner_join(&a, &b)
            .into_iter()
            .filter(|(_, a, _)| *a != 0.0)
            .map(|(ts, a, b)| (ts, (a - b).abs() / a)),
    )
}

// -- Tests -------------------------------------------------------------------
