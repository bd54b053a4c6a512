//! Genetic optimizer for test schedules.
//!
//! A steady-state GA over [`Genome`](crate::Genome)s: every tournament draws
//! three genomes, breeds a child from the two fittest and writes it over the
//! least fit. The best genome ever seen is kept apart from the population,
//! so the reported makespan never gets worse.
//!
//! # Key Types
//!
//! - [`OptimizerConfig`]: Algorithm parameters (population size, rates, presets)
//! - [`Optimizer`]: Executes the evolutionary loop
//! - [`OptimizeResult`]: Best genome, generation count and improvement history
//! - [`CancelToken`]: Cooperative cancellation from another thread
//!
//! # Termination
//!
//! Checked at the start of every generation, in this order:
//! cancellation, time limit, generation cap. Stagnation is checked after
//! each generation that failed to improve.
//!
//! # References
//!
//! - Goldberg (1989), *Genetic Algorithms in Search, Optimization, and Machine Learning*
//! - Whitley (1989), *The GENITOR Algorithm and Selection Pressure*

mod cancel;
mod config;
mod runner;
mod selection;

pub use cancel::{CancelToken, Deadline};
pub use config::{Mutation, OptimizerConfig};
pub use runner::{OptimizeResult, Optimizer, Progress, StopReason};
pub use selection::Tournament;
