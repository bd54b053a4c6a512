//! Capacity-bounded interval timelines.
//!
//! A [`Scheduler`] holds the intervals committed to one machine (capacity 1)
//! or one shared resource (capacity ≥ 1) and answers earliest-start
//! feasibility queries against them.
//!
//! # Paired timelines
//!
//! A test that needs both a machine and a resource must hold the same window
//! on both. [`Scheduler::can_fit`] accepts the resource timeline as a
//! *dependent* and only reports a start that is feasible on both, and
//! [`Scheduler::add`] commits the two windows as one unit.
//!
//! # Complexity
//!
//! With `n` intervals on the timelines involved, `can_fit` tries at most
//! `n + 1` candidate starts (zero and every interval end), each checked in
//! O(n). `add` and `remove` are O(n).

mod timeline;
mod types;

pub use timeline::Scheduler;
pub use types::{Interval, Placement};
