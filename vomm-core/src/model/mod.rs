//! Variable-order Markov model over discrete tokens.
//!
//! This module provides:
//! - Fixed-order count and probability tables (`NGramModel`)
//! - Per-context transition statistics (`State`)
//! - The combined model with order backoff (`VariableOrderMarkov`)
//! - Generation parameters (`GenerateInput`) and results (`Generation`)

use std::fmt::Debug;
use std::hash::Hash;

/// The combined model: training, probability computation and generation.
pub mod markov;

/// Normalized next-token distribution of one context, with weighted sampling.
pub mod distribution;

/// Generation parameters: length, primer strategy and starting order.
pub mod generate_input;

/// Generation result, including the early-halt report.
pub mod generation;

/// Fixed-order table (`order >= 1`).
///
/// Handles sequence ingestion, transition counting,
/// probability computation and merging.
mod ngram_model;

/// Internal representation of a single context.
///
/// Tracks outgoing transitions and their occurrence counts.
/// This module is not exposed publicly.
mod state;

pub use distribution::Distribution;
pub use generate_input::{GenerateInput, Primer};
pub use generation::{Generation, Halt};
pub use markov::VariableOrderMarkov;

/// Anything usable as a sequence element.
///
/// Equality and hashing identify contexts; ordering keeps tables and the
/// vocabulary in a stable order so that seeded generation is reproducible.
pub trait Token: Clone + Eq + Hash + Ord + Debug {}

impl<T: Clone + Eq + Hash + Ord + Debug> Token for T {}
