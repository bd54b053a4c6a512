//! Candidate schedules.
//!
//! A [`Genome`] is one complete, feasible assignment of every test of an
//! [`Instance`](crate::Instance) to a machine, an optional resource, and a
//! start time. It owns one [`Scheduler`](crate::scheduler::Scheduler) per
//! machine and per resource, so feasibility is checked against its own
//! timelines and never shared with another genome.
//!
//! # Placement rule
//!
//! Every placement goes through [`Genome::find_schedule`], which picks the
//! earliest feasible start over all eligible machine (× resource) pairs.
//! The perturbation operators only decide *which* tests are vacated and in
//! *what order* they are placed again, so every operator preserves
//! feasibility by construction.
//!
//! # Operators
//!
//! | Operator | Scope | Effect |
//! |----------|-------|--------|
//! | [`Genome::reinsert`] | one test | vacate, place again |
//! | [`Genome::swap_places`] | two tests | vacate both, place `j` then `i` |
//! | [`Genome::scramble_genes`] | index range | vacate range, place in random order |
//! | [`Genome::crossover_from`] | index range | vacate range, place in a donor's start order |
//! | [`Genome::randomize`] | time suffix | drop everything after a random cut, place ascending |

mod candidate;
mod operators;
mod solution;

pub use candidate::{Assignment, Genome};
pub use solution::Solution;
