use serde::Serialize;

/// Why generation stopped before producing the requested length.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Halt<T> {
	/// The working context, longest order first, for which no suffix
	/// (down to a single token) was ever observed during training.
	pub context: Vec<T>,
}

/// Result of one generation call.
///
/// `tokens` holds the continuation only; the primer is reported separately.
/// A short result is not an error: `halt` is set and `is_complete` returns
/// `false`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Generation<T> {
	/// The primer the continuation was grown from (drawn from the
	/// vocabulary when none was supplied).
	pub primer: Vec<T>,

	/// Newly generated tokens, in generation order.
	pub tokens: Vec<T>,

	/// Number of tokens that were asked for.
	pub requested: usize,

	/// Set when generation stopped early.
	pub halt: Option<Halt<T>>,
}

impl<T> Generation<T> {
	/// Whether all requested tokens were produced.
	pub fn is_complete(&self) -> bool {
		self.halt.is_none()
	}

	/// Consumes the result, keeping only the continuation.
	pub fn into_tokens(self) -> Vec<T> {
		self.tokens
	}
}
