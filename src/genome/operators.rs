//! Feasibility-preserving perturbation operators.
//!
//! Every operator vacates a set of tests and places them again through
//! [`Genome::find_schedule`]; none of them writes an assignment directly.
//! Earliest-fit placement is greedy, so an operator followed by its
//! "inverse" does not in general restore the previous schedule.

use rand::seq::SliceRandom;
use rand::Rng;

use super::candidate::Genome;
use crate::Time;

impl Genome<'_> {
    /// Vacates `test` and places it again.
    ///
    /// Returns whether its machine or start time changed.
    pub fn reinsert(&mut self, test: usize) -> bool {
        let before = self.assignment(test);
        self.vacate(test);
        let after = self.find_schedule(test);
        before.is_none_or(|b| b.machine != after.machine || b.start() != after.start())
    }

    /// Vacates tests `i` and `j`, then places `j` first and `i` second.
    ///
    /// Returns whether `i`'s machine or start time changed. With `i == j`
    /// this is [`reinsert`](Self::reinsert).
    ///
    /// `swap_places(i, j)` followed by `swap_places(j, i)` need not restore
    /// the original assignment.
    pub fn swap_places(&mut self, i: usize, j: usize) -> bool {
        if i == j {
            return self.reinsert(i);
        }
        let before = self.assignment(i);
        self.vacate(i);
        self.vacate(j);

        self.find_schedule(j);
        let after = self.find_schedule(i);
        before.is_none_or(|b| b.machine != after.machine || b.start() != after.start())
    }

    /// Vacates tests `lo..=hi` and places them in a uniformly random order.
    ///
    /// # Panics
    /// Panics if `lo > hi` or `hi` is out of range.
    pub fn scramble_genes<R: Rng>(&mut self, lo: usize, hi: usize, rng: &mut R) {
        assert!(lo <= hi && hi < self.len(), "invalid gene range {lo}..={hi}");
        let mut order: Vec<usize> = (lo..=hi).collect();
        for &test in &order {
            self.vacate(test);
        }
        order.shuffle(rng);
        for test in order {
            self.find_schedule(test);
        }
    }

    /// Drops every test starting at or after a random cut and places the
    /// dropped tests again in ascending index order.
    ///
    /// The cut is drawn uniformly from `[0, makespan)`. Returns the number of
    /// tests that were placed again; an empty or incomplete genome is left
    /// untouched and yields 0.
    pub fn randomize<R: Rng>(&mut self, rng: &mut R) -> usize {
        let span = match self.makespan() {
            Ok(span) if span > 0 => span,
            _ => return 0,
        };
        let cut: Time = rng.random_range(0..span);

        for timeline in self.machines.iter_mut().chain(self.resources.iter_mut()) {
            timeline.remove_after(cut);
        }
        let mut dropped = Vec::new();
        for (test, slot) in self.assignments.iter_mut().enumerate() {
            if slot.is_some_and(|a| a.start() >= cut) {
                *slot = None;
                dropped.push(test);
            }
        }
        self.fitness = Self::UNEVALUATED;

        for &test in &dropped {
            self.find_schedule(test);
        }
        dropped.len()
    }

    /// Replaces tests `lo..=hi` with the ordering they have in `donor`.
    ///
    /// The range is vacated here and placed again in ascending order of the
    /// donor's start times (ties by index). The result stays feasible because
    /// placement runs against this genome's own timelines; only the donor's
    /// relative order is inherited.
    ///
    /// # Panics
    /// Panics if the range is invalid or the genomes differ in size.
    pub fn crossover_from(&mut self, donor: &Genome<'_>, lo: usize, hi: usize) {
        assert_eq!(self.len(), donor.len(), "genomes must schedule the same instance");
        assert!(lo <= hi && hi < self.len(), "invalid gene range {lo}..={hi}");

        let mut order: Vec<usize> = (lo..=hi).collect();
        order.sort_by_key(|&test| {
            let start = donor.assignment(test).map_or(Time::MAX, |a| a.start());
            (start, test)
        });
        for &test in &order {
            self.vacate(test);
        }
        for test in order {
            self.find_schedule(test);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::genome::Genome;
    use crate::instance::{Instance, Test};
    use crate::random::create_rng;
    use proptest::prelude::*;

    fn names(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    fn mixed() -> Instance {
        Instance::new(
            vec![
                Test::new("a", 3).with_resources(["R1"]),
                Test::new("b", 2),
                Test::new("c", 4).with_machines(["M2"]).with_resources(["R1", "R2"]),
                Test::new("d", 1).with_machines(["M1"]),
                Test::new("e", 5).with_resources(["R2"]),
                Test::new("f", 2),
            ],
            names(&["M1", "M2", "M3"]),
            names(&["R1", "R2"]),
            vec![1, 2],
        )
        .unwrap()
    }

    #[test]
    fn test_swap_places_order_matters() {
        let inst = Instance::new(
            vec![Test::new("a", 2), Test::new("b", 3)],
            names(&["M1"]),
            vec![],
            vec![],
        )
        .unwrap();
        let mut g = Genome::new(&inst);
        g.find_schedule(0);
        g.find_schedule(1);
        assert_eq!(g.assignment(0).unwrap().start(), 0);

        // j is placed first, so i moves behind it
        assert!(g.swap_places(0, 1));
        assert_eq!(g.assignment(1).unwrap().start(), 0);
        assert_eq!(g.assignment(0).unwrap().start(), 3);
        assert!(g.is_feasible());
    }

    #[test]
    fn test_swap_back_is_not_guaranteed_to_restore() {
        let inst = Instance::new(
            vec![Test::new("a", 2), Test::new("b", 3)],
            names(&["M1"]),
            vec![],
            vec![],
        )
        .unwrap();
        let mut g = Genome::from_parts(&inst, &[10, 0], &[12, 3], &names(&["M1", "M1"])).unwrap();
        let original = g.assignments().to_vec();

        g.swap_places(0, 1); // b@[0,3), a@[3,5)
        g.swap_places(1, 0); // a@[0,2), b@[2,5)

        assert_ne!(g.assignments(), original.as_slice());
        assert_eq!(g.assignment(0).unwrap().start(), 0);
        assert_eq!(g.assignment(1).unwrap().start(), 2);
        assert!(g.is_feasible());
    }

    #[test]
    fn test_swap_same_index_reinserts() {
        let inst = mixed();
        let mut g = Genome::random(&inst, &mut create_rng(5));
        g.swap_places(2, 2);
        assert!(g.is_complete());
        assert!(g.is_feasible());
    }

    #[test]
    fn test_scramble_keeps_feasibility() {
        let inst = mixed();
        let mut rng = create_rng(11);
        let mut g = Genome::random(&inst, &mut rng);
        for _ in 0..50 {
            g.scramble_genes(1, 4, &mut rng);
            assert!(g.is_complete());
            assert!(g.is_feasible());
        }
    }

    #[test]
    #[should_panic(expected = "invalid gene range")]
    fn test_scramble_rejects_bad_range() {
        let inst = mixed();
        let mut g = Genome::random(&inst, &mut create_rng(0));
        g.scramble_genes(4, 1, &mut create_rng(0));
    }

    #[test]
    fn test_randomize_reinserts_dropped() {
        let inst = mixed();
        let mut rng = create_rng(21);
        let mut g = Genome::random(&inst, &mut rng);
        for _ in 0..50 {
            let placed = g.randomize(&mut rng);
            assert!(placed <= inst.len());
            assert!(g.is_complete());
            assert!(g.is_feasible());
            g.evaluate().unwrap();
        }
    }

    #[test]
    fn test_randomize_on_incomplete_is_noop() {
        let inst = mixed();
        let mut g = Genome::random(&inst, &mut create_rng(2));
        g.vacate(0);
        let before = g.clone();
        assert_eq!(g.randomize(&mut create_rng(2)), 0);
        assert_eq!(g, before);
    }

    #[test]
    fn test_single_machine_fitness_is_order_invariant() {
        let inst = Instance::new(
            vec![Test::new("a", 2), Test::new("b", 3), Test::new("c", 1)],
            names(&["M1"]),
            vec![],
            vec![],
        )
        .unwrap();
        let mut rng = create_rng(8);
        let mut g = Genome::random(&inst, &mut rng);
        for _ in 0..20 {
            g.scramble_genes(0, 2, &mut rng);
            g.randomize(&mut rng);
            assert_eq!(g.evaluate().unwrap(), 6);
        }
    }

    #[test]
    fn test_crossover_inherits_donor_order() {
        let inst = Instance::new(
            vec![Test::new("a", 2), Test::new("b", 2), Test::new("c", 2)],
            names(&["M1"]),
            vec![],
            vec![],
        )
        .unwrap();
        let mut donor = Genome::new(&inst);
        for t in [2, 1, 0] {
            donor.find_schedule(t);
        }
        let mut child = Genome::new(&inst);
        for t in [0, 1, 2] {
            child.find_schedule(t);
        }

        child.crossover_from(&donor, 0, 2);
        assert_eq!(child.assignment(2).unwrap().start(), 0);
        assert_eq!(child.assignment(1).unwrap().start(), 2);
        assert_eq!(child.assignment(0).unwrap().start(), 4);
    }

    proptest! {
        #[test]
        fn prop_operators_preserve_feasibility(
            seed in any::<u64>(),
            ops in prop::collection::vec((0u8..5, 0usize..6, 0usize..6), 1..40),
        ) {
            let inst = mixed();
            let mut rng = create_rng(seed);
            let mut g = Genome::random(&inst, &mut rng);
            let donor = Genome::random(&inst, &mut rng);
            for (op, a, b) in ops {
                let (lo, hi) = (a.min(b), a.max(b));
                match op {
                    0 => { g.reinsert(a); }
                    1 => { g.swap_places(a, b); }
                    2 => g.scramble_genes(lo, hi, &mut rng),
                    3 => { g.randomize(&mut rng); }
                    _ => g.crossover_from(&donor, lo, hi),
                }
                prop_assert!(g.is_complete());
                prop_assert!(g.is_feasible());
                prop_assert!(!g.is_evaluated() || g.fitness() == g.makespan().unwrap());
                g.evaluate().unwrap();
            }
        }
    }
}
