//! The [`Scheduler`] timeline.

use super::types::{Interval, Placement};
use crate::Time;

/// Interval timeline for one machine or one shared resource.
///
/// Holds at most one interval per test index. At every instant, the number
/// of intervals covering it never exceeds `capacity`, provided intervals are
/// only committed after a successful [`can_fit`](Self::can_fit).
///
/// # Examples
///
/// ```
/// use u_testsched::scheduler::Scheduler;
///
/// let mut machine = Scheduler::new("M1", 1);
/// let first = machine.can_fit(3, None).unwrap();
/// machine.add(0, first, None);
///
/// let second = machine.can_fit(2, None).unwrap();
/// assert_eq!(second.start(), 3);
/// ```
#[derive(Debug, PartialEq, Eq)]
pub struct Scheduler {
    name: String,
    capacity: usize,
    /// Sorted by `(start, test)`.
    entries: Vec<(usize, Interval)>,
}

impl Scheduler {
    /// Creates an empty timeline.
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            capacity,
            entries: Vec::new(),
        }
    }

    /// Timeline name (machine or resource name).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Maximum number of concurrent intervals.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of committed intervals.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no interval is committed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Committed `(test, interval)` pairs in ascending start order.
    pub fn intervals(&self) -> impl Iterator<Item = (usize, Interval)> + '_ {
        self.entries.iter().copied()
    }

    /// The interval owned by `test`, if any.
    pub fn interval_of(&self, test: usize) -> Option<Interval> {
        self.entries
            .iter()
            .find(|(t, _)| *t == test)
            .map(|(_, iv)| *iv)
    }

    /// Latest end among committed intervals.
    pub fn last_end(&self) -> Option<Time> {
        self.entries.iter().map(|(_, iv)| iv.end).max()
    }

    /// Number of intervals covering instant `t`.
    pub fn load_at(&self, t: Time) -> usize {
        self.entries
            .iter()
            .take_while(|(_, iv)| iv.start <= t)
            .filter(|(_, iv)| iv.contains(t))
            .count()
    }

    /// Highest number of intervals covering any single instant.
    pub fn peak_load(&self) -> usize {
        peak_within(self.entries.iter().map(|(_, iv)| *iv), None)
    }

    /// Whether `window` can be added without exceeding capacity.
    pub fn fits_at(&self, window: Interval) -> bool {
        if self.capacity == 0 {
            return false;
        }
        let overlapping = self
            .entries
            .iter()
            .take_while(|(_, iv)| iv.start < window.end)
            .map(|(_, iv)| *iv)
            .filter(|iv| iv.overlaps(&window));

        if self.capacity == 1 {
            return overlapping.count() == 0;
        }
        peak_within(overlapping, Some(window)) < self.capacity
    }

    /// Finds the earliest start for a window of `duration`.
    ///
    /// With a `dependent` timeline, the returned start is feasible on both
    /// timelines for the identical window, and the placement carries the
    /// dependent window as well.
    ///
    /// Candidate starts are zero and every interval end on the timelines
    /// involved, tried in ascending order; the earliest feasible start is
    /// always among them. The latest end is always feasible, so the scan
    /// terminates with `Some` unless a timeline has zero capacity.
    ///
    /// This never mutates either timeline.
    pub fn can_fit(&self, duration: Time, dependent: Option<&Scheduler>) -> Option<Placement> {
        if self.capacity == 0 || dependent.is_some_and(|d| d.capacity == 0) {
            return None;
        }

        let mut candidates: Vec<Time> = std::iter::once(0)
            .chain(self.entries.iter().map(|(_, iv)| iv.end))
            .chain(
                dependent
                    .into_iter()
                    .flat_map(|d| d.entries.iter().map(|(_, iv)| iv.end)),
            )
            .collect();
        candidates.sort_unstable();
        candidates.dedup();

        candidates.into_iter().find_map(|t| {
            let window = Interval::new(t, duration);
            let fits = self.fits_at(window) && dependent.is_none_or(|d| d.fits_at(window));
            fits.then_some(Placement {
                interval: window,
                dependent: dependent.map(|_| window),
            })
        })
    }

    /// Commits a placement for `test`.
    ///
    /// When `placement` carries a dependent window, the matching dependent
    /// timeline must be passed and both windows are committed together.
    ///
    /// # Panics
    ///
    /// Panics if the placement and `dependent` disagree on whether a
    /// dependent window exists. In debug builds, also panics if a window does
    /// not fit: callers must obtain placements from [`can_fit`](Self::can_fit)
    /// against the current state.
    pub fn add(&mut self, test: usize, placement: Placement, dependent: Option<&mut Scheduler>) {
        match (dependent, placement.dependent) {
            (Some(dep), Some(window)) => {
                debug_assert!(dep.fits_at(window), "dependent window must fit on `{}`", dep.name);
                dep.insert(test, window);
            }
            (None, None) => {}
            _ => panic!("placement and dependent timeline must be committed together"),
        }
        debug_assert!(
            self.fits_at(placement.interval),
            "window must fit on `{}`",
            self.name
        );
        self.insert(test, placement.interval);
    }

    /// Removes the interval owned by `test`. Returns whether one existed.
    pub fn remove(&mut self, test: usize) -> bool {
        match self.entries.iter().position(|(t, _)| *t == test) {
            Some(pos) => {
                self.entries.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Removes every interval starting at or after `threshold`.
    ///
    /// Returns the test indices that were removed.
    pub fn remove_after(&mut self, threshold: Time) -> Vec<usize> {
        let cut = self.entries.partition_point(|(_, iv)| iv.start < threshold);
        self.entries.drain(cut..).map(|(t, _)| t).collect()
    }

    /// Inserts without a capacity check, keeping start order.
    pub(crate) fn insert(&mut self, test: usize, window: Interval) {
        debug_assert!(
            self.interval_of(test).is_none(),
            "test {test} already placed on `{}`",
            self.name
        );
        let pos = self
            .entries
            .partition_point(|&(t, iv)| (iv.start, t) < (window.start, test));
        self.entries.insert(pos, (test, window));
    }
}

impl Clone for Scheduler {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            capacity: self.capacity,
            entries: self.entries.clone(),
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.name.clone_from(&source.name);
        self.capacity = source.capacity;
        self.entries.clone_from(&source.entries);
    }
}

/// Maximum overlap of `intervals`, optionally clipped to `within`.
fn peak_within(intervals: impl Iterator<Item = Interval>, within: Option<Interval>) -> usize {
    let mut events: Vec<(Time, i32)> = Vec::new();
    for iv in intervals {
        let (start, end) = match within {
            Some(w) => (iv.start.max(w.start), iv.end.min(w.end)),
            None => (iv.start, iv.end),
        };
        if start < end {
            events.push((start, 1));
            events.push((end, -1));
        }
    }
    // Ends sort before starts at the same instant: windows are half-open.
    events.sort_unstable();

    let mut load = 0i32;
    let mut peak = 0i32;
    for (_, delta) in events {
        load += delta;
        peak = peak.max(load);
    }
    peak as usize
}
