use std::collections::BTreeMap;

use super::distribution::Distribution;

/// Represents the statistics of one context in a fixed-order table.
///
/// A `State` corresponds to a context of `k` tokens and stores every observed
/// transition from this context to a next token.
///
/// Conceptually, this is a node in a Markov chain where outgoing edges
/// are weighted by their number of observations.
///
/// ## Responsibilities:
/// - Accumulate transition occurrences during training
/// - Normalize the occurrences into a `Distribution`
/// - Merge with another state of the same context (parallel training support)
///
/// ## Invariants
/// - A state is only created together with its first transition
/// - Each transition occurrence count is strictly positive
#[derive(Clone, Debug)]
pub(crate) struct State<T> {
	/// Outgoing transitions indexed by the next token.
	/// The value represents how many times this transition was observed.
	/// Example: { "62.0" => 42, "r" => 3 }
	transitions: BTreeMap<T, u64>,
}

impl<T: Clone + Ord> State<T> {
	/// Creates a state holding a single observation of `next`.
	pub fn with_transition(next: T) -> Self {
		let mut transitions = BTreeMap::new();
		transitions.insert(next, 1);
		Self { transitions }
	}

	/// Records an occurrence of a transition toward `next`.
	pub fn add_transition(&mut self, next: &T) {
		match self.transitions.get_mut(next) {
			Some(occurrence) => *occurrence += 1,
			None => {
				self.transitions.insert(next.clone(), 1);
			}
		}
	}

	/// Number of times `next` followed this context, zero when never seen.
	pub fn count(&self, next: &T) -> u64 {
		self.transitions.get(next).copied().unwrap_or(0)
	}

	/// Total number of observations across all next tokens.
	pub fn total(&self) -> u64 {
		self.transitions.values().sum()
	}

	pub fn transitions(&self) -> impl Iterator<Item = (&T, u64)> {
		self.transitions.iter().map(|(next, occurrence)| (next, *occurrence))
	}

	/// Normalizes the occurrences into probabilities.
	///
	/// Returns `None` if the total is zero, which the invariants rule out.
	pub fn distribution(&self) -> Option<Distribution<T>> {
		let total = self.total();
		if total == 0 {
			return None;
		}
		let total = total as f64;
		Some(Distribution::from_entries(
			self.transitions
				.iter()
				.map(|(next, occurrence)| (next.clone(), *occurrence as f64 / total))
				.collect(),
		))
	}

	/// Merges another state of the same context into this one.
	///
	/// Transition occurrence counts are summed.
	pub fn merge(&mut self, other: &Self) {
		for (next, occurrence) in &other.transitions {
			match self.transitions.get_mut(next) {
				Some(existing) => *existing += *occurrence,
				None => {
					self.transitions.insert(next.clone(), *occurrence);
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_add_transition_accumulates() {
		let mut state = State::with_transition("a");
		state.add_transition(&"a");
		state.add_transition(&"b");
		assert_eq!(state.count(&"a"), 2);
		assert_eq!(state.count(&"b"), 1);
		assert_eq!(state.count(&"c"), 0);
		assert_eq!(state.total(), 3);
	}

	#[test]
	fn test_distribution_normalizes() {
		let mut state = State::with_transition(1u8);
		state.add_transition(&2);
		state.add_transition(&2);
		state.add_transition(&2);
		let distribution = state.distribution().unwrap();
		assert_eq!(distribution.probability(&1), Some(0.25));
		assert_eq!(distribution.probability(&2), Some(0.75));
	}

	#[test]
	fn test_merge_sums_occurrences() {
		let mut left = State::with_transition('x');
		let mut right = State::with_transition('x');
		right.add_transition(&'y');
		left.merge(&right);
		assert_eq!(left.count(&'x'), 2);
		assert_eq!(left.count(&'y'), 1);
	}
}
