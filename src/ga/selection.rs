//! Three-way tournament selection.
//!
//! A tournament draws three distinct genomes, ranks them by fitness, and
//! names the two parents (best and second) and the slot the child replaces
//! (worst). Lower fitness is better.

use rand::seq::index;
use rand::Rng;

use crate::genome::Genome;

/// Population slots of one ranked tournament.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tournament {
    /// Lowest fitness of the three.
    pub best: usize,
    /// Middle fitness.
    pub second: usize,
    /// Highest fitness; the child overwrites this slot.
    pub worst: usize,
}

impl Tournament {
    /// Draws three distinct slots uniformly and ranks them.
    ///
    /// # Panics
    /// Panics if the population has fewer than three members.
    pub fn draw<R: Rng>(population: &[Genome<'_>], rng: &mut R) -> Self {
        assert!(
            population.len() >= 3,
            "tournament needs at least 3 genomes, got {}",
            population.len()
        );
        let picks = index::sample(rng, population.len(), 3);
        Self::rank(population, [picks.index(0), picks.index(1), picks.index(2)])
    }

    /// Ranks the given slots by fitness; ties keep draw order.
    pub fn rank(population: &[Genome<'_>], mut picks: [usize; 3]) -> Self {
        picks.sort_by_key(|&i| population[i].fitness());
        Self {
            best: picks[0],
            second: picks[1],
            worst: picks[2],
        }
    }
}
