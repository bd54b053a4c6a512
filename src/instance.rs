//! Problem definition: tests, machines, and shared resources.
//!
//! An [`Instance`] is built once, validated, and then shared by reference
//! across every genome of a run. Construction resolves machine and resource
//! names into index lists so that the hot scheduling path never compares
//! strings.

use std::collections::HashSet;

use crate::error::{Result, ScheduleError};
use crate::Time;

/// A unit of work to be scheduled.
///
/// # Examples
///
/// ```
/// use u_testsched::Test;
///
/// let t = Test::new("t1", 4)
///     .with_machines(["M1", "M2"])
///     .with_resources(["R1"]);
/// assert!(t.requires_resource());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Test {
    /// Display name, carried through to the [`Solution`](crate::Solution).
    pub name: String,

    /// Processing time. Must be positive.
    pub duration: Time,

    /// Machines the test may run on. Empty means any machine.
    #[cfg_attr(feature = "serde", serde(default))]
    pub machines: Vec<String>,

    /// Resources the test may hold while running. Empty means none;
    /// otherwise exactly one of the listed resources is used.
    #[cfg_attr(feature = "serde", serde(default))]
    pub resources: Vec<String>,
}

impl Test {
    /// Creates a test that may run on any machine and needs no resource.
    pub fn new(name: impl Into<String>, duration: Time) -> Self {
        Self {
            name: name.into(),
            duration,
            machines: Vec::new(),
            resources: Vec::new(),
        }
    }

    /// Restricts the test to the given machines.
    pub fn with_machines<I, S>(mut self, machines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.machines = machines.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the resources the test may hold.
    pub fn with_resources<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resources = resources.into_iter().map(Into::into).collect();
        self
    }

    /// Whether the test must hold a resource for its whole duration.
    pub fn requires_resource(&self) -> bool {
        !self.resources.is_empty()
    }
}

/// An immutable, validated scheduling problem.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "InstanceDef", into = "InstanceDef")
)]
pub struct Instance {
    tests: Vec<Test>,
    machines: Vec<String>,
    resources: Vec<String>,
    capacities: Vec<usize>,
    eligible_machines: Vec<Vec<usize>>,
    eligible_resources: Vec<Vec<usize>>,
}

impl Instance {
    /// Builds and validates an instance.
    ///
    /// `capacities[r]` is the capacity of `resources[r]`.
    ///
    /// # Errors
    ///
    /// - [`ScheduleError::LengthMismatch`] if `capacities` and `resources` differ in length
    /// - [`ScheduleError::DuplicateName`] for a repeated machine or resource name
    /// - [`ScheduleError::ZeroCapacity`] for a resource with capacity 0
    /// - [`ScheduleError::NoMachines`] if there are tests but no machines
    /// - [`ScheduleError::ZeroDuration`] for a test with duration 0
    /// - [`ScheduleError::UnknownMachine`] / [`ScheduleError::UnknownResource`]
    ///   for eligibility entries that name nothing in the instance
    pub fn new(
        tests: Vec<Test>,
        machines: Vec<String>,
        resources: Vec<String>,
        capacities: Vec<usize>,
    ) -> Result<Self> {
        if capacities.len() != resources.len() {
            return Err(ScheduleError::LengthMismatch {
                field: "capacities",
                expected: resources.len(),
                actual: capacities.len(),
            });
        }
        check_unique(&machines)?;
        check_unique(&resources)?;
        if let Some(r) = capacities.iter().position(|&c| c == 0) {
            return Err(ScheduleError::ZeroCapacity(resources[r].clone()));
        }
        if !tests.is_empty() && machines.is_empty() {
            return Err(ScheduleError::NoMachines);
        }

        let mut eligible_machines = Vec::with_capacity(tests.len());
        let mut eligible_resources = Vec::with_capacity(tests.len());

        for (i, test) in tests.iter().enumerate() {
            if test.duration == 0 {
                return Err(ScheduleError::ZeroDuration { test: i });
            }
            if let Some(unknown) = test.machines.iter().find(|m| !machines.contains(m)) {
                return Err(ScheduleError::UnknownMachine(unknown.clone()));
            }
            if let Some(unknown) = test.resources.iter().find(|r| !resources.contains(r)) {
                return Err(ScheduleError::UnknownResource(unknown.clone()));
            }

            // Eligibility follows instance order, not the order in the test.
            eligible_machines.push(
                machines
                    .iter()
                    .enumerate()
                    .filter(|(_, name)| test.machines.is_empty() || test.machines.contains(name))
                    .map(|(m, _)| m)
                    .collect(),
            );
            eligible_resources.push(
                resources
                    .iter()
                    .enumerate()
                    .filter(|(_, name)| test.resources.contains(name))
                    .map(|(r, _)| r)
                    .collect(),
            );
        }

        Ok(Self {
            tests,
            machines,
            resources,
            capacities,
            eligible_machines,
            eligible_resources,
        })
    }

    /// Number of tests.
    pub fn len(&self) -> usize {
        self.tests.len()
    }

    /// Whether the instance has no tests.
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// All tests in index order.
    pub fn tests(&self) -> &[Test] {
        &self.tests
    }

    /// The test at `index`.
    ///
    /// # Panics
    /// Panics if `index` is out of range.
    pub fn test(&self, index: usize) -> &Test {
        &self.tests[index]
    }

    /// Machine names in index order.
    pub fn machines(&self) -> &[String] {
        &self.machines
    }

    /// Resource names in index order.
    pub fn resources(&self) -> &[String] {
        &self.resources
    }

    /// Capacities parallel to [`resources`](Self::resources).
    pub fn capacities(&self) -> &[usize] {
        &self.capacities
    }

    /// Indices of machines test `index` may run on.
    pub fn eligible_machines(&self, index: usize) -> &[usize] {
        &self.eligible_machines[index]
    }

    /// Indices of resources test `index` may hold. Empty if none is required.
    pub fn eligible_resources(&self, index: usize) -> &[usize] {
        &self.eligible_resources[index]
    }

    /// Looks up a machine by name.
    pub fn machine_index(&self, name: &str) -> Option<usize> {
        self.machines.iter().position(|m| m == name)
    }

    /// Sum of all durations; the makespan of a fully serial schedule.
    pub fn total_duration(&self) -> Time {
        self.tests.iter().map(|t| t.duration).sum()
    }
}

fn check_unique(names: &[String]) -> Result<()> {
    let mut seen = HashSet::with_capacity(names.len());
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(ScheduleError::DuplicateName(name.clone()));
        }
    }
    Ok(())
}

/// Wire shape of an [`Instance`]; deserialization goes through validation.
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct InstanceDef {
    tests: Vec<Test>,
    machines: Vec<String>,
    #[serde(default)]
    resources: Vec<String>,
    #[serde(default)]
    capacities: Vec<usize>,
}

#[cfg(feature = "serde")]
impl TryFrom<InstanceDef> for Instance {
    type Error = ScheduleError;

    fn try_from(def: InstanceDef) -> Result<Self> {
        Instance::new(def.tests, def.machines, def.resources, def.capacities)
    }
}

#[cfg(feature = "serde")]
impl From<Instance> for InstanceDef {
    fn from(instance: Instance) -> Self {
        Self {
            tests: instance.tests,
            machines: instance.machines,
            resources: instance.resources,
            capacities: instance.capacities,
        }
    }
}
