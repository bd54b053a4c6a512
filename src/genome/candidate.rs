//! The [`Genome`] type: per-test assignments plus owned timelines.

use rand::seq::SliceRandom;
use rand::Rng;

use super::solution::Solution;
use crate::error::{Result, ScheduleError};
use crate::instance::Instance;
use crate::scheduler::{Interval, Placement, Scheduler};
use crate::Time;

/// Where and when one test runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    /// Machine index into [`Instance::machines`].
    pub machine: usize,
    /// Resource index into [`Instance::resources`], if the test holds one.
    pub resource: Option<usize>,
    /// Occupied window, identical on the machine and the resource.
    pub interval: Interval,
}

impl Assignment {
    /// Start time.
    pub fn start(&self) -> Time {
        self.interval.start
    }

    /// End time.
    pub fn end(&self) -> Time {
        self.interval.end
    }
}

/// One candidate schedule over an [`Instance`].
///
/// Fitness is the makespan (lower is better). Structural changes reset it to
/// [`Genome::UNEVALUATED`] until [`evaluate`](Self::evaluate) runs again.
///
/// Cloning is deep: the clone owns its own timelines. `clone_from` reuses the
/// target's allocations, which makes [`ToOwned::clone_into`] the cheap way to
/// overwrite one genome with another.
#[derive(Debug, PartialEq, Eq)]
pub struct Genome<'a> {
    instance: &'a Instance,
    pub(super) assignments: Vec<Option<Assignment>>,
    pub(super) machines: Vec<Scheduler>,
    pub(super) resources: Vec<Scheduler>,
    pub(crate) fitness: Time,
}

impl<'a> Genome<'a> {
    /// Fitness sentinel for a genome that has not been evaluated.
    pub const UNEVALUATED: Time = Time::MAX;

    /// Creates a genome with no test placed.
    pub fn new(instance: &'a Instance) -> Self {
        let machines = instance
            .machines()
            .iter()
            .map(|name| Scheduler::new(name.as_str(), 1))
            .collect();
        let resources = instance
            .resources()
            .iter()
            .zip(instance.capacities())
            .map(|(name, &cap)| Scheduler::new(name.as_str(), cap))
            .collect();

        Self {
            instance,
            assignments: vec![None; instance.len()],
            machines,
            resources,
            fitness: Self::UNEVALUATED,
        }
    }

    /// Builds a complete, evaluated genome by placing every test in a
    /// uniformly random order.
    pub fn random<R: Rng>(instance: &'a Instance, rng: &mut R) -> Self {
        let mut genome = Self::new(instance);
        let mut order: Vec<usize> = (0..instance.len()).collect();
        order.shuffle(rng);
        for test in order {
            genome.find_schedule(test);
        }
        if let Ok(fitness) = genome.makespan() {
            genome.fitness = fitness;
        }
        genome
    }

    /// Rebuilds a genome from externally supplied per-test arrays.
    ///
    /// Each test is committed to its machine and, when it needs a resource,
    /// to the first eligible resource with room for the same window.
    ///
    /// # Errors
    ///
    /// Nothing is returned unless every test is consistent:
    ///
    /// - [`ScheduleError::LengthMismatch`] if any array length differs from the test count
    /// - [`ScheduleError::UnknownMachine`] / [`ScheduleError::Ineligible`] for a bad machine
    /// - [`ScheduleError::DurationMismatch`] if `end - start` is not the duration
    /// - [`ScheduleError::Conflict`] if a window exceeds a timeline's capacity
    pub fn from_parts(
        instance: &'a Instance,
        starts: &[Time],
        ends: &[Time],
        machines: &[String],
    ) -> Result<Self> {
        let n = instance.len();
        for (field, actual) in [
            ("starts", starts.len()),
            ("ends", ends.len()),
            ("machines", machines.len()),
        ] {
            if actual != n {
                return Err(ScheduleError::LengthMismatch {
                    field,
                    expected: n,
                    actual,
                });
            }
        }

        let mut genome = Self::new(instance);
        for test in 0..n {
            let duration = instance.test(test).duration;
            let (start, end) = (starts[test], ends[test]);
            if end.checked_sub(start) != Some(duration) {
                return Err(ScheduleError::DurationMismatch {
                    test,
                    start,
                    end,
                    duration,
                });
            }
            let window = Interval { start, end };

            let machine = instance
                .machine_index(&machines[test])
                .ok_or_else(|| ScheduleError::UnknownMachine(machines[test].clone()))?;
            if !instance.eligible_machines(test).contains(&machine) {
                return Err(ScheduleError::Ineligible {
                    test,
                    machine: machines[test].clone(),
                });
            }
            if !genome.machines[machine].fits_at(window) {
                return Err(conflict(test, &genome.machines[machine], window));
            }

            let eligible = instance.eligible_resources(test);
            if eligible.is_empty() {
                genome.commit(test, machine, None, window);
                continue;
            }
            match eligible
                .iter()
                .copied()
                .find(|&r| genome.resources[r].fits_at(window))
            {
                Some(r) => genome.commit(test, machine, Some(r), window),
                None => return Err(conflict(test, &genome.resources[eligible[0]], window)),
            }
        }

        if let Ok(fitness) = genome.makespan() {
            genome.fitness = fitness;
        }
        Ok(genome)
    }

    /// The instance this genome schedules.
    pub fn instance(&self) -> &'a Instance {
        self.instance
    }

    /// Number of tests.
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// Whether the instance has no tests.
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Stored fitness, or [`UNEVALUATED`](Self::UNEVALUATED).
    pub fn fitness(&self) -> Time {
        self.fitness
    }

    /// Whether the stored fitness reflects the current assignment.
    pub fn is_evaluated(&self) -> bool {
        self.fitness != Self::UNEVALUATED
    }

    /// Placement of `test`, if it has one.
    pub fn assignment(&self, test: usize) -> Option<Assignment> {
        self.assignments[test]
    }

    /// All placements in test order.
    pub fn assignments(&self) -> &[Option<Assignment>] {
        &self.assignments
    }

    /// Whether every test is placed.
    pub fn is_complete(&self) -> bool {
        self.assignments.iter().all(Option::is_some)
    }

    /// Name of the machine `test` runs on.
    pub fn machine_name(&self, test: usize) -> Option<&str> {
        self.assignments[test].map(|a| self.instance.machines()[a.machine].as_str())
    }

    /// Timeline of machine `index`.
    pub fn machine_scheduler(&self, index: usize) -> &Scheduler {
        &self.machines[index]
    }

    /// Timeline of resource `index`.
    pub fn resource_scheduler(&self, index: usize) -> &Scheduler {
        &self.resources[index]
    }

    /// Earliest start over all tests.
    pub fn first_start(&self) -> Result<Time> {
        self.span().map(|(first, _)| first)
    }

    /// Latest end over all tests.
    pub fn last_end(&self) -> Result<Time> {
        self.span().map(|(_, last)| last)
    }

    /// `last_end - first_start`.
    ///
    /// # Errors
    /// [`ScheduleError::EmptySchedule`] without tests,
    /// [`ScheduleError::Unassigned`] if any test has no placement.
    pub fn makespan(&self) -> Result<Time> {
        self.span().map(|(first, last)| last - first)
    }

    /// Recomputes and stores the fitness.
    pub fn evaluate(&mut self) -> Result<Time> {
        let fitness = self.makespan()?;
        self.fitness = fitness;
        Ok(fitness)
    }

    /// Places `test` at the earliest feasible start over every eligible
    /// machine, paired with every eligible resource when the test needs one.
    ///
    /// Ties keep the first pair in eligibility order. The test must not be
    /// placed already.
    ///
    /// # Panics
    /// Panics if no pair admits the test, which a validated [`Instance`]
    /// rules out.
    pub fn find_schedule(&mut self, test: usize) -> Assignment {
        debug_assert!(self.assignments[test].is_none(), "test {test} already placed");

        let instance = self.instance;
        let duration = instance.test(test).duration;
        let resources = instance.eligible_resources(test);
        let mut best: Option<(Placement, usize, Option<usize>)> = None;

        for &m in instance.eligible_machines(test) {
            let machine = &self.machines[m];
            if resources.is_empty() {
                if let Some(p) = machine.can_fit(duration, None) {
                    keep_earliest(&mut best, p, m, None);
                }
            } else {
                for &r in resources {
                    if let Some(p) = machine.can_fit(duration, Some(&self.resources[r])) {
                        keep_earliest(&mut best, p, m, Some(r));
                    }
                }
            }
        }

        let (placement, machine, resource) =
            best.expect("validated instance admits a placement for every test");
        match resource {
            Some(r) => self.machines[machine].add(test, placement, Some(&mut self.resources[r])),
            None => self.machines[machine].add(test, placement, None),
        }

        let assignment = Assignment {
            machine,
            resource,
            interval: placement.interval,
        };
        self.assignments[test] = Some(assignment);
        self.fitness = Self::UNEVALUATED;
        assignment
    }

    /// Removes `test` from its machine and resource timelines.
    ///
    /// Returns whether the test was placed.
    pub fn vacate(&mut self, test: usize) -> bool {
        let Some(assignment) = self.assignments[test].take() else {
            return false;
        };
        self.machines[assignment.machine].remove(test);
        if let Some(r) = assignment.resource {
            self.resources[r].remove(test);
        }
        self.fitness = Self::UNEVALUATED;
        true
    }

    /// Checks every timeline against its capacity and every assignment
    /// against its timelines and duration.
    pub fn is_feasible(&self) -> bool {
        let timelines_ok = self.machines.iter().all(|m| m.peak_load() <= 1)
            && self.resources.iter().all(|r| r.peak_load() <= r.capacity());

        let assignments_ok = self.assignments.iter().enumerate().all(|(test, a)| match a {
            None => true,
            Some(a) => {
                a.interval.duration() == self.instance.test(test).duration
                    && self.machines[a.machine].interval_of(test) == Some(a.interval)
                    && a.resource.is_none_or(|r| {
                        self.resources[r].interval_of(test) == Some(a.interval)
                    })
                    && a.resource.is_some() == !self.instance.eligible_resources(test).is_empty()
            }
        });

        timelines_ok && assignments_ok
    }

    /// Exports the schedule for reporting.
    ///
    /// # Errors
    /// [`ScheduleError::Unassigned`] if any test has no placement.
    pub fn to_solution(&self) -> Result<Solution> {
        let mut solution = Solution::with_capacity(self.len());
        for (test, assignment) in self.assignments.iter().enumerate() {
            let a = assignment.ok_or(ScheduleError::Unassigned { test })?;
            solution.push(
                test,
                &self.instance.test(test).name,
                &self.instance.machines()[a.machine],
                a.interval,
            );
        }
        Ok(solution)
    }

    fn span(&self) -> Result<(Time, Time)> {
        if self.assignments.is_empty() {
            return Err(ScheduleError::EmptySchedule);
        }
        let mut first = Time::MAX;
        let mut last = 0;
        for (test, assignment) in self.assignments.iter().enumerate() {
            let a = assignment.ok_or(ScheduleError::Unassigned { test })?;
            first = first.min(a.start());
            last = last.max(a.end());
        }
        Ok((first, last))
    }

    /// Commits a window already checked to fit.
    fn commit(&mut self, test: usize, machine: usize, resource: Option<usize>, window: Interval) {
        let placement = Placement {
            interval: window,
            dependent: resource.map(|_| window),
        };
        match resource {
            Some(r) => self.machines[machine].add(test, placement, Some(&mut self.resources[r])),
            None => self.machines[machine].add(test, placement, None),
        }
        self.assignments[test] = Some(Assignment {
            machine,
            resource,
            interval: window,
        });
    }
}

impl Clone for Genome<'_> {
    fn clone(&self) -> Self {
        Self {
            instance: self.instance,
            assignments: self.assignments.clone(),
            machines: self.machines.clone(),
            resources: self.resources.clone(),
            fitness: self.fitness,
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.instance = source.instance;
        self.assignments.clone_from(&source.assignments);
        self.machines.clone_from(&source.machines);
        self.resources.clone_from(&source.resources);
        self.fitness = source.fitness;
    }
}

fn keep_earliest(
    best: &mut Option<(Placement, usize, Option<usize>)>,
    placement: Placement,
    machine: usize,
    resource: Option<usize>,
) {
    if best
        .as_ref()
        .is_none_or(|(current, _, _)| placement.start() < current.start())
    {
        *best = Some((placement, machine, resource));
    }
}

fn conflict(test: usize, timeline: &Scheduler, window: Interval) -> ScheduleError {
    ScheduleError::Conflict {
        test,
        timeline: timeline.name().to_string(),
        start: window.start,
        end: window.end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::Test;
    use crate::random::create_rng;
    use proptest::prelude::*;

    fn names(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    fn single_machine() -> Instance {
        Instance::new(
            vec![Test::new("a", 2), Test::new("b", 3), Test::new("c", 1)],
            names(&["M1"]),
            vec![],
            vec![],
        )
        .unwrap()
    }

    fn shared_resource() -> Instance {
        Instance::new(
            vec![
                Test::new("a", 4).with_machines(["M1", "M2"]).with_resources(["R1"]),
                Test::new("b", 4).with_machines(["M1", "M2"]).with_resources(["R1"]),
            ],
            names(&["M1", "M2"]),
            names(&["R1"]),
            vec![1],
        )
        .unwrap()
    }

    #[test]
    fn test_single_machine_back_to_back() {
        let inst = single_machine();
        for seed in 0..20 {
            let mut rng = create_rng(seed);
            let g = Genome::random(&inst, &mut rng);
            assert!(g.is_feasible());
            assert_eq!(g.fitness(), 6);
            assert_eq!(g.first_start().unwrap(), 0);
            assert_eq!(g.last_end().unwrap(), 6);
        }
    }

    #[test]
    fn test_shared_resource_serializes() {
        let inst = shared_resource();
        let mut g = Genome::new(&inst);
        let a = g.find_schedule(0);
        let b = g.find_schedule(1);

        assert_eq!(a.machine, 0);
        assert_eq!(a.start(), 0);
        // M2 is free at 0, but R1 is not
        assert_eq!(b.start(), 4);
        assert!(!a.interval.overlaps(&b.interval));
        assert_eq!(g.evaluate().unwrap(), 8);
        assert!(g.is_feasible());
    }

    #[test]
    fn test_find_schedule_prefers_first_on_tie() {
        let inst = Instance::new(vec![Test::new("a", 3)], names(&["M1", "M2"]), vec![], vec![])
            .unwrap();
        let mut g = Genome::new(&inst);
        assert_eq!(g.find_schedule(0).machine, 0);
        assert_eq!(g.machine_name(0), Some("M1"));
    }

    #[test]
    fn test_find_schedule_picks_earliest_machine() {
        let inst = Instance::new(
            vec![Test::new("a", 5).with_machines(["M1"]), Test::new("b", 2)],
            names(&["M1", "M2"]),
            vec![],
            vec![],
        )
        .unwrap();
        let mut g = Genome::new(&inst);
        g.find_schedule(0);
        let b = g.find_schedule(1);
        assert_eq!(b.machine, 1);
        assert_eq!(b.start(), 0);
    }

    #[test]
    fn test_vacate() {
        let inst = single_machine();
        let mut g = Genome::random(&inst, &mut create_rng(1));
        assert!(g.is_evaluated());
        assert!(g.vacate(1));
        assert!(!g.vacate(1));
        assert!(!g.is_evaluated());
        assert!(g.machine_scheduler(0).interval_of(1).is_none());
        assert_eq!(g.makespan().unwrap_err(), ScheduleError::Unassigned { test: 1 });
    }

    #[test]
    fn test_empty_instance_fails_explicitly() {
        let inst = Instance::new(vec![], names(&["M1"]), vec![], vec![]).unwrap();
        let mut g = Genome::random(&inst, &mut create_rng(0));
        assert!(g.is_empty());
        assert_eq!(g.fitness(), Genome::UNEVALUATED);
        assert_eq!(g.makespan().unwrap_err(), ScheduleError::EmptySchedule);
        assert_eq!(g.first_start().unwrap_err(), ScheduleError::EmptySchedule);
        assert_eq!(g.last_end().unwrap_err(), ScheduleError::EmptySchedule);
        assert_eq!(g.evaluate().unwrap_err(), ScheduleError::EmptySchedule);
    }

    #[test]
    fn test_clone_into_is_exact() {
        let inst = shared_resource();
        let a = Genome::random(&inst, &mut create_rng(3));
        let mut b = Genome::new(&inst);
        a.clone_into(&mut b);

        assert_eq!(a, b);
        assert_eq!(a.fitness(), b.fitness());
        for test in 0..inst.len() {
            assert_eq!(a.assignment(test), b.assignment(test));
        }

        // deep: mutating the source leaves the copy untouched
        let mut a = a;
        a.vacate(0);
        assert!(b.assignment(0).is_some());
        assert!(b.resource_scheduler(0).interval_of(0).is_some());
    }

    #[test]
    fn test_from_parts_round_trip() {
        let inst = shared_resource();
        let g = Genome::from_parts(&inst, &[0, 4], &[4, 8], &names(&["M1", "M2"])).unwrap();
        assert_eq!(g.fitness(), 8);
        assert!(g.is_feasible());
        assert_eq!(g.assignment(1).unwrap().resource, Some(0));
    }

    #[test]
    fn test_from_parts_rejects_length_mismatch() {
        let inst = shared_resource();
        let err = Genome::from_parts(&inst, &[0], &[4, 8], &names(&["M1", "M2"])).unwrap_err();
        assert_eq!(
            err,
            ScheduleError::LengthMismatch {
                field: "starts",
                expected: 2,
                actual: 1
            }
        );
        let err = Genome::from_parts(&inst, &[0, 4], &[4, 8], &names(&["M1"])).unwrap_err();
        assert!(matches!(err, ScheduleError::LengthMismatch { field: "machines", .. }));
    }

    #[test]
    fn test_from_parts_rejects_inconsistent_rows() {
        let inst = shared_resource();
        let err = Genome::from_parts(&inst, &[0, 4], &[4, 9], &names(&["M1", "M2"])).unwrap_err();
        assert!(matches!(err, ScheduleError::DurationMismatch { test: 1, .. }));

        let err = Genome::from_parts(&inst, &[0, 4], &[4, 8], &names(&["M1", "M9"])).unwrap_err();
        assert_eq!(err, ScheduleError::UnknownMachine("M9".into()));

        // both hold R1 over [0, 4)
        let err = Genome::from_parts(&inst, &[0, 0], &[4, 4], &names(&["M1", "M2"])).unwrap_err();
        assert!(matches!(err, ScheduleError::Conflict { test: 1, ref timeline, .. } if timeline == "R1"));
    }

    #[test]
    fn test_from_parts_rejects_ineligible_machine() {
        let inst = Instance::new(
            vec![Test::new("a", 2).with_machines(["M1"]), Test::new("b", 3)],
            names(&["M1", "M2"]),
            vec![],
            vec![],
        )
        .unwrap();
        let err = Genome::from_parts(&inst, &[0, 0], &[2, 3], &names(&["M2", "M1"])).unwrap_err();
        assert_eq!(
            err,
            ScheduleError::Ineligible {
                test: 0,
                machine: "M2".into()
            }
        );

        let g = Genome::from_parts(&inst, &[0, 0], &[2, 3], &names(&["M1", "M2"])).unwrap();
        assert_eq!(g.machine_name(1), Some("M2"));
        assert!(g.is_feasible());
    }

    #[test]
    fn test_to_solution() {
        let inst = single_machine();
        let mut g = Genome::new(&inst);
        g.find_schedule(0);
        assert_eq!(g.to_solution().unwrap_err(), ScheduleError::Unassigned { test: 1 });
        g.find_schedule(1);
        g.find_schedule(2);

        let s = g.to_solution().unwrap();
        assert_eq!(s.len(), 3);
        assert_eq!(s.tests, vec![0, 1, 2]);
        assert_eq!(s.machines, names(&["M1", "M1", "M1"]));
        assert_eq!(s.starts, vec![0, 2, 5]);
        assert_eq!(s.makespan(), Some(6));
    }

    fn arb_instance() -> impl Strategy<Value = Instance> {
        (
            1usize..4,
            1usize..3,
            prop::collection::vec((1u64..8, any::<u8>(), any::<u8>()), 1..14),
        )
            .prop_map(|(n_machines, capacity, rows)| {
                let machines: Vec<String> = (0..n_machines).map(|m| format!("M{m}")).collect();
                let tests = rows
                    .into_iter()
                    .enumerate()
                    .map(|(i, (d, mask, res))| {
                        let eligible: Vec<String> = machines
                            .iter()
                            .enumerate()
                            .filter(|(m, _)| mask & (1 << m) != 0)
                            .map(|(_, name)| name.clone())
                            .collect();
                        let t = Test::new(format!("t{i}"), d).with_machines(eligible);
                        match res % 3 {
                            0 => t.with_resources(["R0"]),
                            1 => t.with_resources(["R0", "R1"]),
                            _ => t,
                        }
                    })
                    .collect();
                Instance::new(tests, machines, names(&["R0", "R1"]), vec![capacity, 1]).unwrap()
            })
    }

    proptest! {
        #[test]
        fn prop_random_genomes_are_feasible(inst in arb_instance(), seed in any::<u64>()) {
            let g = Genome::random(&inst, &mut create_rng(seed));
            prop_assert!(g.is_complete());
            prop_assert!(g.is_feasible());
            prop_assert_eq!(g.fitness(), g.makespan().unwrap());
            prop_assert!(g.fitness() <= inst.total_duration());
        }
    }
}
