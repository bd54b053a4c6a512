//! Evolutionary loop execution.
//!
//! [`Optimizer`] orchestrates the complete run:
//! seeding → (tournament → crossover → mutation → evaluation) → repeat.

use log::{debug, info, trace};
use rand::Rng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::cancel::{CancelToken, Deadline};
use super::config::{Mutation, OptimizerConfig};
use super::selection::Tournament;
use crate::error::{Result, ScheduleError};
use crate::genome::{Genome, Solution};
use crate::instance::Instance;
#[cfg(feature = "parallel")]
use crate::random::create_rng;
use crate::random::rng_from;
use crate::Time;

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `stagnation_limit` consecutive generations without improvement.
    Stagnated,
    /// The time budget elapsed.
    TimeLimit,
    /// A [`CancelToken`] was raised.
    Cancelled,
    /// `max_generations` was reached.
    MaxGenerations,
}

/// Notification emitted after a generation that improved the best genome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Generation in which the improvement happened (0 = initial population).
    pub generation: usize,
    /// New best makespan.
    pub fitness: Time,
}

/// Result of an optimizer run.
#[derive(Debug, Clone)]
pub struct OptimizeResult<'a> {
    /// The best genome found during the entire run.
    pub best: Genome<'a>,

    /// Best fitness value (same as `best.fitness()`).
    pub best_fitness: Time,

    /// Total number of generations executed.
    pub generations: usize,

    /// Why the run ended.
    pub stop_reason: StopReason,

    /// Every improvement of the best fitness, starting with the initial
    /// population's best at generation 0. Strictly decreasing in fitness.
    pub history: Vec<Progress>,
}

impl OptimizeResult<'_> {
    /// Exports the best genome.
    pub fn solution(&self) -> Result<Solution> {
        self.best.to_solution()
    }
}

/// Tournament-based genetic optimizer minimizing makespan.
///
/// # Usage
///
/// ```
/// use u_testsched::{Instance, Test};
/// use u_testsched::ga::{Optimizer, OptimizerConfig, StopReason};
///
/// let instance = Instance::new(
///     vec![Test::new("a", 2), Test::new("b", 3), Test::new("c", 1)],
///     vec!["M1".into()],
///     vec![],
///     vec![],
/// )
/// .unwrap();
/// let config = OptimizerConfig::default()
///     .with_population_size(10)
///     .with_stagnation_limit(20)
///     .with_seed(42);
///
/// let result = Optimizer::new(&instance, config).unwrap().run().unwrap();
/// assert_eq!(result.best_fitness, 6);
/// assert_eq!(result.stop_reason, StopReason::Stagnated);
/// ```
#[derive(Debug, Clone)]
pub struct Optimizer<'a> {
    instance: &'a Instance,
    config: OptimizerConfig,
}

impl<'a> Optimizer<'a> {
    /// Creates an optimizer for `instance`.
    ///
    /// # Errors
    /// [`ScheduleError::InvalidConfig`] for an invalid configuration,
    /// [`ScheduleError::EmptySchedule`] for an instance without tests.
    pub fn new(instance: &'a Instance, config: OptimizerConfig) -> Result<Self> {
        config.validate()?;
        if instance.is_empty() {
            return Err(ScheduleError::EmptySchedule);
        }
        Ok(Self { instance, config })
    }

    /// The configuration in use.
    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Runs to termination on the calling thread.
    pub fn run(&self) -> Result<OptimizeResult<'a>> {
        self.run_with_observer(&CancelToken::new(), |_| {})
    }

    /// Runs with an external cancellation token.
    ///
    /// The token is polled at the start of each generation; once raised,
    /// the run returns the best genome found so far.
    pub fn run_with_cancel(&self, cancel: &CancelToken) -> Result<OptimizeResult<'a>> {
        self.run_with_observer(cancel, |_| {})
    }

    /// Runs on a dedicated worker thread and blocks until it finishes.
    pub fn solve(&self, cancel: &CancelToken) -> Result<OptimizeResult<'a>> {
        std::thread::scope(|scope| {
            let worker = scope.spawn(|| self.run_with_cancel(cancel));
            match worker.join() {
                Ok(result) => result,
                Err(panic) => std::panic::resume_unwind(panic),
            }
        })
    }

    /// Runs with a cancellation token and an improvement callback.
    ///
    /// `observer` is called after every generation that improves the best
    /// fitness. It cannot influence the run.
    pub fn run_with_observer<F>(
        &self,
        cancel: &CancelToken,
        mut observer: F,
    ) -> Result<OptimizeResult<'a>>
    where
        F: FnMut(&Progress),
    {
        let config = &self.config;
        let mut rng = rng_from(config.seed);
        let deadline = Deadline::after_ms(config.time_limit_ms);

        // 1. Seed population
        let mut population: Vec<Genome<'a>> = (0..config.population_size)
            .map(|_| Genome::random(self.instance, &mut rng))
            .collect();

        // 2. Track best
        let mut best = find_best(&population).clone();
        let mut history = vec![Progress {
            generation: 0,
            fitness: best.fitness(),
        }];
        debug!(
            "seeded {} genomes for {} tests, best makespan {}",
            population.len(),
            self.instance.len(),
            best.fitness()
        );

        let mut children: Vec<Genome<'a>> = Vec::new();
        let mut stagnation = 0usize;
        let mut generation = 0usize;

        // 3. Evolutionary loop
        let stop_reason = loop {
            if cancel.is_cancelled() {
                break StopReason::Cancelled;
            }
            if deadline.has_passed() {
                break StopReason::TimeLimit;
            }
            if config.max_generations.is_some_and(|max| generation >= max) {
                break StopReason::MaxGenerations;
            }
            generation += 1;

            if self.evolve(&mut population, &mut children, &mut best, &mut rng)? {
                stagnation = 0;
                let progress = Progress {
                    generation,
                    fitness: best.fitness(),
                };
                info!("generation {generation}: makespan {}", progress.fitness);
                history.push(progress);
                observer(&progress);
            } else {
                stagnation += 1;
                if config.stagnation_limit > 0 && stagnation >= config.stagnation_limit {
                    break StopReason::Stagnated;
                }
            }
        };

        info!(
            "stopped after {generation} generations ({stop_reason:?}), makespan {}",
            best.fitness()
        );
        Ok(OptimizeResult {
            best_fitness: best.fitness(),
            best,
            generations: generation,
            stop_reason,
            history,
        })
    }

    /// Runs one generation. Returns whether `best` improved.
    fn evolve<R: Rng>(
        &self,
        population: &mut [Genome<'a>],
        children: &mut Vec<Genome<'a>>,
        best: &mut Genome<'a>,
        rng: &mut R,
    ) -> Result<bool> {
        #[cfg(feature = "parallel")]
        {
            if self.config.parallel && self.config.tournaments_per_generation > 1 {
                return self.evolve_parallel(population, children, best, rng);
            }
        }

        if children.is_empty() {
            children.push(best.clone());
        }
        let child = &mut children[0];
        let mut improved = false;

        for _ in 0..self.config.tournaments_per_generation {
            let t = Tournament::draw(population, rng);
            let fitness = breed(
                &population[t.best],
                &population[t.second],
                child,
                &self.config,
                rng,
            )?;
            trace!(
                "tournament {t:?}: parents {}/{}, child {fitness} replaces {}",
                population[t.best].fitness(),
                population[t.second].fitness(),
                population[t.worst].fitness()
            );
            std::mem::swap(&mut population[t.worst], child);

            if fitness < best.fitness() {
                population[t.worst].clone_into(best);
                improved = true;
            }
        }
        Ok(improved)
    }

    /// Runs a generation's tournaments concurrently on disjoint triples.
    ///
    /// The population is shuffled and split into chunks of three; each
    /// tournament reads its parents from and writes its child into its own
    /// chunk only.
    #[cfg(feature = "parallel")]
    fn evolve_parallel<R: Rng>(
        &self,
        population: &mut [Genome<'a>],
        children: &mut Vec<Genome<'a>>,
        best: &mut Genome<'a>,
        rng: &mut R,
    ) -> Result<bool> {
        use rand::seq::SliceRandom;

        let k = self
            .config
            .tournaments_per_generation
            .min(population.len() / 3);
        population.shuffle(rng);
        if children.len() < k {
            children.resize_with(k, || best.clone());
        }
        let seeds: Vec<u64> = (0..k).map(|_| rng.random()).collect();
        let config = &self.config;

        population[..3 * k]
            .par_chunks_mut(3)
            .zip(children[..k].par_iter_mut())
            .zip(seeds.into_par_iter())
            .try_for_each(|((triple, child), seed)| -> Result<()> {
                let mut rng = create_rng(seed);
                let t = Tournament::rank(triple, [0, 1, 2]);
                breed(&triple[t.best], &triple[t.second], child, config, &mut rng)?;
                std::mem::swap(&mut triple[t.worst], child);
                Ok(())
            })?;

        let generation_best = find_best(&population[..3 * k]);
        if generation_best.fitness() < best.fitness() {
            generation_best.clone_into(best);
            return Ok(true);
        }
        Ok(false)
    }
}

/// Builds a child from two ranked parents into `child` and returns its
/// fitness.
///
/// The child starts as a copy of `best`, inherits the relative order of a
/// random index segment from `second`, then each test is mutated with
/// probability `mutation_rate`.
fn breed<'a, R: Rng>(
    best: &Genome<'a>,
    second: &Genome<'a>,
    child: &mut Genome<'a>,
    config: &OptimizerConfig,
    rng: &mut R,
) -> Result<Time> {
    best.clone_into(child);
    let n = child.len();

    let (a, b) = (rng.random_range(0..n), rng.random_range(0..n));
    child.crossover_from(second, a.min(b), a.max(b));

    if config.mutation_rate > 0.0 {
        for test in 0..n {
            if rng.random_bool(config.mutation_rate) {
                mutate(child, test, config.mutation, rng);
            }
        }
    }
    if config.perturbation_rate > 0.0 && rng.random_bool(config.perturbation_rate) {
        child.randomize(rng);
    }
    child.evaluate()
}

fn mutate<R: Rng>(genome: &mut Genome<'_>, test: usize, mutation: Mutation, rng: &mut R) {
    match mutation {
        Mutation::Reinsert => {
            genome.reinsert(test);
        }
        Mutation::Swap => {
            let partner = rng.random_range(0..genome.len());
            genome.swap_places(test, partner);
        }
        Mutation::Scramble { window } => {
            let hi = test.saturating_add(window - 1).min(genome.len() - 1);
            genome.scramble_genes(test, hi, rng);
        }
    }
}

/// Find the genome with the best (lowest) fitness.
fn find_best<'p, 'a>(population: &'p [Genome<'a>]) -> &'p Genome<'a> {
    population
        .iter()
        .min_by_key(|g| g.fitness())
        .expect("population must not be empty")
}

// ============================================================================
// Tests
// ============================================================================
