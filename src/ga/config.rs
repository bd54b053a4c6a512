//! Optimizer configuration.
//!
//! [`OptimizerConfig`] holds all parameters that control the evolutionary loop.

use crate::error::{Result, ScheduleError};

/// Per-gene mutation operator.
///
/// Each test of a freshly bred child is mutated independently with
/// probability [`OptimizerConfig::mutation_rate`] using this operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mutation {
    /// Vacate the test and place it again at its earliest feasible slot.
    #[default]
    Reinsert,

    /// Swap places with a uniformly drawn partner test.
    Swap,

    /// Scramble the index window starting at the test.
    Scramble {
        /// Number of consecutive tests scrambled (clipped at the last test).
        window: usize,
    },
}

/// Configuration for the [`Optimizer`](super::Optimizer).
///
/// # Defaults
///
/// ```
/// use u_testsched::ga::OptimizerConfig;
///
/// let config = OptimizerConfig::default();
/// assert_eq!(config.population_size, 100);
/// assert_eq!(config.stagnation_limit, 10_000);
/// assert_eq!(config.time_limit_ms, 0);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_testsched::ga::{Mutation, OptimizerConfig};
///
/// let config = OptimizerConfig::default()
///     .with_population_size(60)
///     .with_mutation(Mutation::Swap)
///     .with_mutation_rate(0.05)
///     .with_time_limit_ms(2_000)
///     .with_seed(7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptimizerConfig {
    /// Number of genomes in the population. Tournaments need at least 3.
    pub population_size: usize,

    /// Consecutive non-improving generations before stopping.
    ///
    /// Set to 0 to disable; a time limit or generation cap is then required.
    pub stagnation_limit: usize,

    /// Probability of mutating each test of a child (0.0–1.0).
    pub mutation_rate: f64,

    /// Per-gene mutation operator.
    pub mutation: Mutation,

    /// Probability of a global [`randomize`](crate::Genome::randomize) on a
    /// child after mutation (0.0–1.0).
    pub perturbation_rate: f64,

    /// Tournaments run per generation.
    ///
    /// With `parallel`, at most `population_size / 3` of them run at once,
    /// each on its own disjoint triple.
    pub tournaments_per_generation: usize,

    /// Hard cap on generations. `None` for no cap.
    pub max_generations: Option<usize>,

    /// Wall-clock budget in milliseconds. 0 disables the deadline.
    ///
    /// The deadline is checked at the start of each generation, so a run may
    /// exceed it by one generation's worth of work.
    pub time_limit_ms: u64,

    /// Run a generation's tournaments in parallel (requires the `parallel`
    /// feature; ignored otherwise).
    pub parallel: bool,

    /// Random seed for reproducibility. `None` uses a random seed.
    pub seed: Option<u64>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            stagnation_limit: 10_000,
            mutation_rate: 0.01,
            mutation: Mutation::default(),
            perturbation_rate: 0.0,
            tournaments_per_generation: 1,
            max_generations: None,
            time_limit_ms: 0,
            parallel: false,
            seed: None,
        }
    }
}

impl OptimizerConfig {
    /// Sets the population size.
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Sets the stagnation limit (0 to disable).
    pub fn with_stagnation_limit(mut self, limit: usize) -> Self {
        self.stagnation_limit = limit;
        self
    }

    /// Sets the per-gene mutation rate.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the per-gene mutation operator.
    pub fn with_mutation(mut self, mutation: Mutation) -> Self {
        self.mutation = mutation;
        self
    }

    /// Sets the global perturbation rate.
    pub fn with_perturbation_rate(mut self, rate: f64) -> Self {
        self.perturbation_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the number of tournaments per generation.
    pub fn with_tournaments_per_generation(mut self, n: usize) -> Self {
        self.tournaments_per_generation = n;
        self
    }

    /// Caps the number of generations.
    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = Some(n);
        self
    }

    /// Sets the wall-clock budget in milliseconds (0 disables it).
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = ms;
        self
    }

    /// Enables or disables parallel tournaments.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Preset for quick answers.
    ///
    /// - Population: 30, Stagnation limit: 500, Time limit: 1s
    pub fn fast() -> Self {
        Self {
            population_size: 30,
            stagnation_limit: 500,
            time_limit_ms: 1_000,
            ..Self::default()
        }
    }

    /// Preset trading quality against time.
    ///
    /// - Population: 100, Stagnation limit: 5 000, Time limit: 10s
    /// - Perturbation rate: 0.02
    pub fn balanced() -> Self {
        Self {
            population_size: 100,
            stagnation_limit: 5_000,
            perturbation_rate: 0.02,
            time_limit_ms: 10_000,
            ..Self::default()
        }
    }

    /// Preset for the best makespan within a minute.
    ///
    /// - Population: 150, Stagnation limit: 20 000, Time limit: 60s
    /// - Perturbation rate: 0.05, Tournaments per generation: 25
    pub fn quality() -> Self {
        Self {
            population_size: 150,
            stagnation_limit: 20_000,
            perturbation_rate: 0.05,
            tournaments_per_generation: 25,
            time_limit_ms: 60_000,
            ..Self::default()
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// [`ScheduleError::InvalidConfig`] describing the first invalid parameter.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(ScheduleError::InvalidConfig(msg.into()));

        if self.population_size < 3 {
            return invalid("population_size must be at least 3");
        }
        if self.tournaments_per_generation == 0 {
            return invalid("tournaments_per_generation must be at least 1");
        }
        if self.max_generations == Some(0) {
            return invalid("max_generations must be positive or None");
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return invalid("mutation_rate must lie in [0, 1]");
        }
        if !(0.0..=1.0).contains(&self.perturbation_rate) {
            return invalid("perturbation_rate must lie in [0, 1]");
        }
        if self.mutation == (Mutation::Scramble { window: 0 }) {
            return invalid("scramble window must be at least 1");
        }
        if self.stagnation_limit == 0 && self.max_generations.is_none() && self.time_limit_ms == 0
        {
            return invalid("no termination condition: set stagnation_limit, max_generations, or time_limit_ms");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OptimizerConfig::default();
        assert_eq!(config.population_size, 100);
        assert_eq!(config.stagnation_limit, 10_000);
        assert!((config.mutation_rate - 0.01).abs() < 1e-12);
        assert_eq!(config.mutation, Mutation::Reinsert);
        assert_eq!(config.perturbation_rate, 0.0);
        assert_eq!(config.tournaments_per_generation, 1);
        assert!(config.max_generations.is_none());
        assert_eq!(config.time_limit_ms, 0);
        assert!(!config.parallel);
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = OptimizerConfig::default()
            .with_population_size(40)
            .with_stagnation_limit(200)
            .with_mutation_rate(0.2)
            .with_mutation(Mutation::Scramble { window: 3 })
            .with_perturbation_rate(0.1)
            .with_tournaments_per_generation(4)
            .with_max_generations(1_000)
            .with_time_limit_ms(500)
            .with_parallel(true)
            .with_seed(42);

        assert_eq!(config.population_size, 40);
        assert_eq!(config.stagnation_limit, 200);
        assert!((config.mutation_rate - 0.2).abs() < 1e-12);
        assert_eq!(config.mutation, Mutation::Scramble { window: 3 });
        assert!((config.perturbation_rate - 0.1).abs() < 1e-12);
        assert_eq!(config.tournaments_per_generation, 4);
        assert_eq!(config.max_generations, Some(1_000));
        assert_eq!(config.time_limit_ms, 500);
        assert!(config.parallel);
        assert_eq!(config.seed, Some(42));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_clamp_rates() {
        let config = OptimizerConfig::default()
            .with_mutation_rate(1.5)
            .with_perturbation_rate(-0.5);
        assert_eq!(config.mutation_rate, 1.0);
        assert_eq!(config.perturbation_rate, 0.0);
    }

    #[test]
    fn test_validate_rejects() {
        let bad = [
            OptimizerConfig::default().with_population_size(2),
            OptimizerConfig::default().with_tournaments_per_generation(0),
            OptimizerConfig::default().with_max_generations(0),
            OptimizerConfig::default().with_mutation(Mutation::Scramble { window: 0 }),
            OptimizerConfig::default().with_stagnation_limit(0),
            OptimizerConfig {
                mutation_rate: 2.0,
                ..OptimizerConfig::default()
            },
        ];
        for config in bad {
            assert!(
                matches!(config.validate(), Err(ScheduleError::InvalidConfig(_))),
                "{config:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_stagnation_disabled_with_other_stop() {
        let config = OptimizerConfig::default()
            .with_stagnation_limit(0)
            .with_time_limit_ms(10);
        assert!(config.validate().is_ok());
        let config = OptimizerConfig::default()
            .with_stagnation_limit(0)
            .with_max_generations(10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        for config in [
            OptimizerConfig::fast(),
            OptimizerConfig::balanced(),
            OptimizerConfig::quality(),
        ] {
            assert!(config.validate().is_ok());
            assert!(config.time_limit_ms > 0);
        }
        assert_eq!(OptimizerConfig::fast().population_size, 30);
        assert_eq!(OptimizerConfig::quality().tournaments_per_generation, 25);
    }

    #[test]
    fn test_preset_chainable() {
        let config = OptimizerConfig::fast().with_population_size(12).with_seed(1);
        assert_eq!(config.population_size, 12);
        assert_eq!(config.time_limit_ms, 1_000);
        assert_eq!(config.seed, Some(1));
    }
}
