//! Exported schedule handed to reporting collaborators.

use crate::scheduler::Interval;
use crate::Time;

/// A finished schedule as parallel per-test sequences.
///
/// Row `k` describes test `tests[k]`. Rows produced by
/// [`Genome::to_solution`](crate::Genome::to_solution) are in test index
/// order, so `tests[k] == k`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Solution {
    /// Test indices.
    pub tests: Vec<usize>,
    /// Test names.
    pub names: Vec<String>,
    /// Assigned machine names.
    pub machines: Vec<String>,
    /// Start times.
    pub starts: Vec<Time>,
    /// End times.
    pub ends: Vec<Time>,
}

impl Solution {
    pub(crate) fn with_capacity(n: usize) -> Self {
        Self {
            tests: Vec::with_capacity(n),
            names: Vec::with_capacity(n),
            machines: Vec::with_capacity(n),
            starts: Vec::with_capacity(n),
            ends: Vec::with_capacity(n),
        }
    }

    pub(crate) fn push(&mut self, test: usize, name: &str, machine: &str, interval: Interval) {
        self.tests.push(test);
        self.names.push(name.to_string());
        self.machines.push(machine.to_string());
        self.starts.push(interval.start);
        self.ends.push(interval.end);
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.tests.len()
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Last end minus first start; `None` when empty.
    pub fn makespan(&self) -> Option<Time> {
        let first = self.starts.iter().min()?;
        let last = self.ends.iter().max()?;
        Some(last - first)
    }

    /// `(test, machine, start)` rows.
    pub fn rows(&self) -> impl Iterator<Item = (usize, &str, Time)> + '_ {
        self.tests
            .iter()
            .zip(&self.machines)
            .zip(&self.starts)
            .map(|((&test, machine), &start)| (test, machine.as_str(), start))
    }
}
