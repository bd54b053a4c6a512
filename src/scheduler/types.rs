//! Interval and placement value types.

use crate::Time;

/// A half-open time window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interval {
    /// First instant covered.
    pub start: Time,
    /// First instant no longer covered.
    pub end: Time,
}

impl Interval {
    /// Creates the interval `[start, start + duration)`.
    pub fn new(start: Time, duration: Time) -> Self {
        Self {
            start,
            end: start + duration,
        }
    }

    /// Length of the interval.
    pub fn duration(&self) -> Time {
        self.end - self.start
    }

    /// Whether the two windows share at least one instant.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Whether instant `t` lies inside the window.
    pub fn contains(&self, t: Time) -> bool {
        self.start <= t && t < self.end
    }
}

/// Outcome of a successful [`Scheduler::can_fit`](super::Scheduler::can_fit).
///
/// When the query involved a dependent timeline, `dependent` carries the
/// window reserved there. It is always equal to `interval`: a test that needs
/// a machine and a resource holds both for the same window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Window on the queried timeline.
    pub interval: Interval,
    /// Window on the dependent timeline, if one was queried.
    pub dependent: Option<Interval>,
}

impl Placement {
    /// Start of the placement.
    pub fn start(&self) -> Time {
        self.interval.start
    }
}
