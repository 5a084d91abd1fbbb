use std::collections::HashMap;
use std::hash::Hash;

use super::distribution::Distribution;
use super::state::State;
use crate::error::ModelError;

/// Fixed-order statistics for one context length `order`.
///
/// The `NGramModel` stores a count table mapping each observed context of
/// exactly `order` tokens to its `State`, and the probability table derived
/// from it.
///
/// # Responsibilities
/// - Accumulate transition counts from training sequences
/// - Rebuild the probability table from the counts
/// - Look up a context without ever creating an entry
/// - Merge with another table of the same order
///
/// # Invariants
/// - `order` is always >= 1
/// - Every context in `states` has at least one transition
/// - After `compute_probabilities`, `probabilities` holds an entry for a
///   context if and only if `states` does
#[derive(Clone, Debug)]
pub(crate) struct NGramModel<T> {
	/// The context length of this table.
	order: usize,

	/// Count table: context -> next token occurrences.
	states: HashMap<Vec<T>, State<T>>,

	/// Probability table derived from `states`.
	probabilities: HashMap<Vec<T>, Distribution<T>>,
}

impl<T: Clone + Eq + Hash + Ord> NGramModel<T> {
	pub fn new(order: usize) -> Self {
		Self { order, states: HashMap::new(), probabilities: HashMap::new() }
	}

	/// Number of distinct contexts seen so far.
	pub fn len(&self) -> usize {
		self.states.len()
	}

	/// Adds every `(context, next)` pair of `sequence` to the count table.
	///
	/// Sequences not longer than `order` contain no such pair and are ignored.
	pub fn add_sequence(&mut self, sequence: &[T]) {
		if sequence.len() <= self.order {
			return;
		}

		for i in self.order..sequence.len() {
			let context = &sequence[i - self.order..i];
			let next = &sequence[i];

			match self.states.get_mut(context) {
				Some(state) => state.add_transition(next),
				None => {
					self.states.insert(context.to_vec(), State::with_transition(next.clone()));
				}
			}
		}
	}

	/// Rebuilds the probability table from the current counts.
	pub fn compute_probabilities(&mut self) {
		self.probabilities.clear();
		for (context, state) in &self.states {
			if let Some(distribution) = state.distribution() {
				self.probabilities.insert(context.clone(), distribution);
			}
		}
	}

	/// Probability table entry for `context`, `None` if it was never observed.
	pub fn distribution(&self, context: &[T]) -> Option<&Distribution<T>> {
		self.probabilities.get(context).filter(|distribution| !distribution.is_empty())
	}

	/// Occurrences of `next` after `context`.
	pub fn count(&self, context: &[T], next: &T) -> u64 {
		self.states.get(context).map_or(0, |state| state.count(next))
	}

	/// Iterates over every `(context, next, occurrences)` triple of the count table.
	pub fn counts(&self) -> impl Iterator<Item = (&[T], &T, u64)> {
		self.states.iter().flat_map(|(context, state)| {
			state
				.transitions()
				.map(move |(next, occurrence)| (context.as_slice(), next, occurrence))
		})
	}

	/// Merges another table into this one.
	///
	/// Occurrence counts for matching contexts and transitions are summed.
	/// The probability table is left untouched and must be recomputed.
	///
	/// # Errors
	/// Returns an error if the orders do not match.
	pub fn merge(&mut self, other: &Self) -> Result<(), ModelError> {
		if self.order != other.order {
			return Err(ModelError::OrderMismatch { expected: self.order, found: other.order });
		}
		self.absorb(other);
		Ok(())
	}

	/// Sums `other`'s counts into this table; both must share the same order.
	pub fn absorb(&mut self, other: &Self) {
		debug_assert_eq!(self.order, other.order);
		for (context, state) in &other.states {
			if let Some(existing) = self.states.get_mut(context) {
				existing.merge(state);
			} else {
				self.states.insert(context.clone(), state.clone());
			}
		}
	}
}
