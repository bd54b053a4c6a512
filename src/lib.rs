//! Test-bench scheduling by genetic optimization.
//!
//! Assigns a set of tests to machines and, optionally, to capacity-limited
//! shared resources so that the overall makespan is as short as possible.
//!
//! - **Instance**: tests with durations and machine/resource eligibility,
//!   validated once up front.
//! - **Scheduler**: an interval timeline per machine or resource that
//!   answers "earliest start where this fits" queries.
//! - **Genome**: one complete schedule, built and perturbed only through
//!   earliest-fit placement, so it is feasible by construction.
//! - **GA**: a tournament-based steady-state optimizer with cancellation,
//!   time limits and optional parallel tournaments.
//!
//! # Example
//!
//! ```
//! use u_testsched::{Instance, Optimizer, OptimizerConfig, Test};
//!
//! let instance = Instance::new(
//!     vec![
//!         Test::new("boot", 4).with_machines(["M1", "M2"]).with_resources(["PSU"]),
//!         Test::new("thermal", 4).with_machines(["M1", "M2"]).with_resources(["PSU"]),
//!     ],
//!     vec!["M1".into(), "M2".into()],
//!     vec!["PSU".into()],
//!     vec![1],
//! )
//! .unwrap();
//!
//! let config = OptimizerConfig::fast().with_seed(3);
//! let result = Optimizer::new(&instance, config).unwrap().run().unwrap();
//! // the single power supply serializes both tests
//! assert_eq!(result.best_fitness, 8);
//!
//! let solution = result.solution().unwrap();
//! assert_eq!(solution.len(), 2);
//! ```
//!
//! # Features
//!
//! - `serde`: (de)serialization of instances, configs and solutions
//! - `parallel`: concurrent tournaments on rayon

pub mod error;
pub mod ga;
pub mod genome;
pub mod instance;
pub mod random;
pub mod scheduler;

/// Time unit shared by durations, starts and ends.
pub type Time = u64;

pub use error::{Result, ScheduleError};
pub use ga::{Optimizer, OptimizerConfig};
pub use genome::{Genome, Solution};
pub use instance::{Instance, Test};
