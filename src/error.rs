//! Crate-wide error type.

use crate::Time;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ScheduleError>;

/// Errors raised when building instances or genomes, or when querying
/// the fitness of a schedule that cannot have one.
///
/// Feasibility inside the evolutionary loop is maintained by construction,
/// so none of these variants are produced by the mutation operators.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    /// A per-item array does not match the expected length.
    #[error("`{field}` has length {actual}, expected {expected}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Makespan and related queries are undefined without tests.
    #[error("schedule contains no tests")]
    EmptySchedule,

    /// A fitness query hit a test that has no placement.
    #[error("test {test} is not assigned")]
    Unassigned { test: usize },

    /// A machine name is not part of the instance.
    #[error("unknown machine `{0}`")]
    UnknownMachine(String),

    /// A resource name is not part of the instance.
    #[error("unknown resource `{0}`")]
    UnknownResource(String),

    /// Machine and resource names must be unique across the instance.
    #[error("duplicate name `{0}`")]
    DuplicateName(String),

    /// Tests must have a positive duration.
    #[error("test {test} has zero duration")]
    ZeroDuration { test: usize },

    /// Resources must admit at least one test at a time.
    #[error("resource `{0}` has zero capacity")]
    ZeroCapacity(String),

    /// An instance with tests but no machine cannot place anything.
    #[error("instance has tests but no machines")]
    NoMachines,

    /// A supplied interval does not span the test's duration.
    #[error("test {test}: interval [{start}, {end}) does not span duration {duration}")]
    DurationMismatch {
        test: usize,
        start: Time,
        end: Time,
        duration: Time,
    },

    /// A supplied machine is not eligible for the test.
    #[error("test {test} may not run on `{machine}`")]
    Ineligible { test: usize, machine: String },

    /// A supplied interval exceeds the capacity of a timeline.
    #[error("test {test}: interval [{start}, {end}) does not fit on `{timeline}`")]
    Conflict {
        test: usize,
        timeline: String,
        start: Time,
        end: Time,
    },

    /// Optimizer parameters are out of range.
    #[error("invalid optimizer config: {0}")]
    InvalidConfig(String),
}
