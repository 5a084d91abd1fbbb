use std::collections::BTreeSet;
use std::sync::mpsc;
use std::thread;

use log::{debug, warn};
use rand::Rng;
use rand::SeedableRng;
use rand::prelude::IteratorRandom;
use rand::rngs::StdRng;

use super::Token;
use super::distribution::Distribution;
use super::generate_input::{GenerateInput, Primer};
use super::generation::{Generation, Halt};
use super::ngram_model::NGramModel;
use crate::error::ModelError;

/// Variable-order Markov model over arbitrary tokens.
///
/// Stores one `NGramModel` per context length `1..=max_order`, all fed from
/// the same training sequences, so that generation can fall back to a shorter
/// context whenever a longer one was never observed.
///
/// This struct manages:
/// - `ngrams`: the fixed-order tables, `ngrams[k - 1]` holding order `k`.
/// - `vocabulary`: every token seen in an accepted training sequence.
/// - `fresh`: whether the probability tables match the counts.
///
/// # Lifecycle
/// Train any number of sequences, then generate. Probabilities are computed
/// lazily on the first generation after training; `compute_probabilities`
/// can also be called explicitly.
#[derive(Clone, Debug)]
pub struct VariableOrderMarkov<T> {
	max_order: usize,
	ngrams: Vec<NGramModel<T>>,
	vocabulary: BTreeSet<T>,
	fresh: bool,
}

impl<T: Token> VariableOrderMarkov<T> {
	/// Creates an empty model tracking contexts of length `1..=max_order`.
	///
	/// # Errors
	/// Returns an error if `max_order < 1`.
	pub fn new(max_order: usize) -> Result<Self, ModelError> {
		if max_order < 1 {
			return Err(ModelError::InvalidMaxOrder(max_order));
		}
		Ok(Self::empty(max_order))
	}

	fn empty(max_order: usize) -> Self {
		Self {
			max_order,
			ngrams: (1..=max_order).map(NGramModel::new).collect(),
			vocabulary: BTreeSet::new(),
			fresh: false,
		}
	}

	pub fn max_order(&self) -> usize {
		self.max_order
	}

	/// Every distinct token observed in training, in token order.
	pub fn vocabulary(&self) -> &BTreeSet<T> {
		&self.vocabulary
	}

	/// Whether the probability tables reflect every training call so far.
	pub fn is_fresh(&self) -> bool {
		self.fresh
	}

	/// Adds one sequence to the statistics.
	///
	/// # Behavior
	/// - Sequences with fewer than 2 tokens are ignored entirely.
	/// - Otherwise every token joins the vocabulary and, for every order `k`,
	///   each `k`-token window increments the count of the token following it.
	/// - Counts accumulate: training the same sequence twice doubles them.
	/// - Marks the probability tables stale.
	pub fn train(&mut self, sequence: &[T]) {
		if sequence.len() < 2 {
			return;
		}

		self.vocabulary.extend(sequence.iter().cloned());
		for ngram in &mut self.ngrams {
			ngram.add_sequence(sequence);
		}
		self.fresh = false;
	}

	/// Trains on a whole corpus using every available core.
	///
	/// # Behavior
	/// - Splits the corpus into chunks (based on CPU cores * factor).
	/// - Trains a partial model per chunk on its own thread.
	/// - Merges all partial models into `self` as they arrive.
	///
	/// Since counts are additive the result is identical to calling `train`
	/// on each sequence in turn.
	pub fn train_corpus(&mut self, sequences: &[Vec<T>])
	where
		T: Send + Sync,
	{
		if sequences.is_empty() {
			return;
		}

		let cpus = num_cpus::get();
		let factor = 8;
		let chunks = cpus * factor;
		let chunk_size = sequences.len().div_ceil(chunks).max(1);
		let max_order = self.max_order;

		thread::scope(|scope| {
			let (tx, rx) = mpsc::channel();
			for chunk in sequences.chunks(chunk_size) {
				let tx = tx.clone();
				scope.spawn(move || {
					let mut partial_model = Self::empty(max_order);
					for sequence in chunk {
						partial_model.train(sequence);
					}
					// The receiver outlives every worker inside this scope.
					let _ = tx.send(partial_model);
				});
			}
			drop(tx);

			for partial_model in rx.iter() {
				self.absorb(&partial_model);
			}
		});

		debug!(
			"trained {} sequences in chunks of {}, vocabulary size {}",
			sequences.len(),
			chunk_size,
			self.vocabulary.len()
		);
	}

	/// Merges another model into this one.
	///
	/// Counts for matching contexts are summed and vocabularies are united,
	/// exactly as if `other`'s training sequences had been trained here.
	///
	/// # Errors
	/// Returns an error if the two models have different `max_order`.
	pub fn merge(&mut self, other: &Self) -> Result<(), ModelError> {
		if self.max_order != other.max_order {
			return Err(ModelError::OrderMismatch {
				expected: self.max_order,
				found: other.max_order,
			});
		}
		self.absorb(other);
		Ok(())
	}

	/// Merges without checking orders; callers guarantee they match.
	fn absorb(&mut self, other: &Self) {
		for (mine, theirs) in self.ngrams.iter_mut().zip(&other.ngrams) {
			mine.absorb(theirs);
		}
		self.vocabulary.extend(other.vocabulary.iter().cloned());
		self.fresh = false;
	}

	/// Rebuilds every probability table from the current counts.
	///
	/// Deterministic and safe to call repeatedly.
	pub fn compute_probabilities(&mut self) {
		for ngram in &mut self.ngrams {
			ngram.compute_probabilities();
		}
		self.fresh = true;

		debug!(
			"computed probabilities for {} contexts across {} orders",
			self.ngrams.iter().map(NGramModel::len).sum::<usize>(),
			self.max_order
		);
	}

	/// Number of distinct contexts observed at `order`.
	pub fn context_count(&self, order: usize) -> usize {
		self.ngram(order).map_or(0, NGramModel::len)
	}

	/// Occurrences of `next` right after `context`, the order being
	/// `context.len()`. Zero for unseen pairs and out-of-range orders.
	pub fn count(&self, context: &[T], next: &T) -> u64 {
		self.ngram(context.len()).map_or(0, |ngram| ngram.count(context, next))
	}

	/// Iterates over every `(context, next, occurrences)` entry at every order.
	pub fn counts(&self) -> impl Iterator<Item = (&[T], &T, u64)> {
		self.ngrams.iter().flat_map(|ngram| ngram.counts())
	}

	/// Probability table lookup for `context`, the order being `context.len()`.
	///
	/// Returns `None` for contexts never observed. The table reflects the
	/// counts only while `is_fresh` holds.
	pub fn distribution(&self, context: &[T]) -> Option<&Distribution<T>> {
		self.ngram(context.len())?.distribution(context)
	}

	fn ngram(&self, order: usize) -> Option<&NGramModel<T>> {
		if order == 0 {
			return None;
		}
		self.ngrams.get(order - 1)
	}

	fn resolve_order(&self, order: Option<usize>) -> Result<usize, ModelError> {
		match order {
			None => Ok(self.max_order),
			Some(order) if (1..=self.max_order).contains(&order) => Ok(order),
			Some(order) => Err(ModelError::InvalidOrder { order, max_order: self.max_order }),
		}
	}

	/// Generates a continuation using order backoff.
	///
	/// # Behavior
	/// - Validates `input.order` and the primer before touching anything.
	/// - Computes probabilities first if training happened since the last time.
	/// - At each step the last `min(order, len)` tokens form the context; the
	///   longest suffix of it present in the probability tables is sampled
	///   from, shorter suffixes being tried only when longer ones are unknown.
	/// - When no suffix down to a single token is known, generation stops and
	///   the result carries a `Halt` with the unmatched context.
	///
	/// A random primer on a model with an empty vocabulary is empty itself, so
	/// such a request halts immediately.
	///
	/// # Errors
	/// - `InvalidOrder` if `input.order` is outside `1..=max_order`
	/// - `EmptyPrimer` if a custom primer has no token
	pub fn generate<R: Rng + ?Sized>(
		&mut self,
		input: &GenerateInput<T>,
		rng: &mut R,
	) -> Result<Generation<T>, ModelError> {
		let order = self.resolve_order(input.order)?;
		let primer: Vec<T> = match &input.primer {
			Primer::Custom(tokens) if tokens.is_empty() => return Err(ModelError::EmptyPrimer),
			Primer::Custom(tokens) => tokens.clone(),
			Primer::Random => self.vocabulary.iter().choose(rng).cloned().into_iter().collect(),
		};

		if !self.fresh {
			self.compute_probabilities();
		}

		let mut working = primer.clone();
		let mut tokens = Vec::new();
		let mut halt = None;

		while tokens.len() < input.length {
			let available = order.min(working.len());
			let context = &working[working.len() - available..];

			match self.sample_next(context, rng) {
				Some(next) => {
					working.push(next.clone());
					tokens.push(next);
				}
				None => {
					warn!(
						"no matching occurrence of context {:?}, halting after {} of {} tokens",
						context,
						tokens.len(),
						input.length
					);
					halt = Some(Halt { context: context.to_vec() });
					break;
				}
			}
		}

		Ok(Generation { primer, tokens, requested: input.length, halt })
	}

	/// Same as `generate`, with a `StdRng` seeded from `seed`.
	///
	/// A fixed seed always yields the same result for the same model.
	pub fn generate_seeded(&mut self, input: &GenerateInput<T>, seed: u64) -> Result<Generation<T>, ModelError> {
		let mut rng = StdRng::seed_from_u64(seed);
		self.generate(input, &mut rng)
	}

	/// Samples from the longest suffix of `context` with a known distribution.
	fn sample_next<R: Rng + ?Sized>(&self, context: &[T], rng: &mut R) -> Option<T> {
		(1..=context.len()).rev().find_map(|order| {
			let suffix = &context[context.len() - order..];
			self.ngrams[order - 1]
				.distribution(suffix)
				.and_then(|distribution| distribution.sample(rng))
				.cloned()
		})
	}
}
