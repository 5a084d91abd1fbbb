use rand::Rng;
use serde::Serialize;

/// Conditional probability distribution over next tokens for one context.
///
/// Entries are kept in token order so that sampling with a seeded generator
/// is reproducible.
///
/// # Invariants
/// - Never empty
/// - Every probability is in `[0, 1]` and they sum to 1.0 (up to rounding)
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Distribution<T> {
	entries: Vec<(T, f64)>,
}

impl<T> Distribution<T> {
	pub(crate) fn from_entries(entries: Vec<(T, f64)>) -> Self {
		Self { entries }
	}

	/// Number of distinct next tokens.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Iterates over `(next token, probability)` pairs in token order.
	pub fn iter(&self) -> impl Iterator<Item = (&T, f64)> {
		self.entries.iter().map(|(next, probability)| (next, *probability))
	}

	/// Draws a next token, each with a chance equal to its probability.
	///
	/// Performs a cumulative subtraction over the entries. Returns `None`
	/// only for an empty distribution.
	pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&T> {
		let mut r: f64 = rng.random();

		let mut fallback = None;
		for (next, probability) in &self.entries {
			if r < *probability {
				return Some(next);
			}
			r -= probability;
			fallback = Some(next);
		}

		// Rounding can leave `r` a hair above the last bucket.
		fallback
	}
}

impl<T: PartialEq> Distribution<T> {
	/// Probability of `next`, `None` if it was never observed for this context.
	pub fn probability(&self, next: &T) -> Option<f64> {
		self.entries
			.iter()
			.find(|(candidate, _)| candidate == next)
			.map(|(_, probability)| *probability)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	#[test]
	fn test_single_entry_always_sampled() {
		let distribution = Distribution::from_entries(vec![("only", 1.0)]);
		let mut rng = StdRng::seed_from_u64(7);
		for _ in 0..50 {
			assert_eq!(distribution.sample(&mut rng), Some(&"only"));
		}
	}

	#[test]
	fn test_zero_probability_never_sampled() {
		let distribution = Distribution::from_entries(vec![("never", 0.0), ("always", 1.0)]);
		let mut rng = StdRng::seed_from_u64(11);
		for _ in 0..200 {
			assert_eq!(distribution.sample(&mut rng), Some(&"always"));
		}
	}

	#[test]
	fn test_sampling_follows_weights() {
		let distribution = Distribution::from_entries(vec![('a', 0.25), ('b', 0.75)]);
		let mut rng = StdRng::seed_from_u64(42);
		let draws = 10_000;
		let hits = (0..draws)
			.filter(|_| distribution.sample(&mut rng) == Some(&'b'))
			.count();
		let ratio = hits as f64 / draws as f64;
		assert!((ratio - 0.75).abs() < 0.03, "ratio was {ratio}");
	}

	#[test]
	fn test_empty_distribution_samples_nothing() {
		let distribution: Distribution<u8> = Distribution::from_entries(Vec::new());
		let mut rng = StdRng::seed_from_u64(0);
		assert!(distribution.is_empty());
		assert_eq!(distribution.sample(&mut rng), None);
	}

	#[test]
	fn test_probability_lookup() {
		let distribution = Distribution::from_entries(vec![(1, 0.5), (2, 0.5)]);
		assert_eq!(distribution.probability(&2), Some(0.5));
		assert_eq!(distribution.probability(&3), None);
	}
}
