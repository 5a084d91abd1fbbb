/// Strategy used to select the primer when generating a sequence.
///
/// # Variants
/// - `Random`: draw a single token uniformly from the vocabulary.
/// - `Custom(Vec<T>)`: use the provided tokens as the primer. Must not be empty.
#[derive(Clone, Debug, PartialEq)]
pub enum Primer<T> {
	Random,
	Custom(Vec<T>),
}

/// Input parameters for one call to `VariableOrderMarkov::generate`.
///
/// # Fields
/// - `length`: number of tokens to produce after the primer
/// - `primer`: how the working sequence is seeded
/// - `order`: longest context tried first, `None` meaning the model's `max_order`
///
/// Validation happens at the model boundary, where `max_order` is known.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerateInput<T> {
	pub length: usize,
	pub primer: Primer<T>,
	pub order: Option<usize>,
}

impl<T> GenerateInput<T> {
	/// Generates `length` tokens from a random primer at the model's full order.
	pub fn new(length: usize) -> Self {
		Self { length, primer: Primer::Random, order: None }
	}

	/// Seeds generation with `primer`.
	pub fn with_primer(mut self, primer: Vec<T>) -> Self {
		self.primer = Primer::Custom(primer);
		self
	}

	/// Caps the context length tried first.
	pub fn with_order(mut self, order: usize) -> Self {
		self.order = Some(order);
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		let input: GenerateInput<u8> = GenerateInput::new(5);
		assert_eq!(input.length, 5);
		assert_eq!(input.primer, Primer::Random);
		assert_eq!(input.order, None);
	}

	#[test]
	fn test_builders() {
		let input = GenerateInput::new(2).with_primer(vec!["a"]).with_order(1);
		assert_eq!(input.primer, Primer::Custom(vec!["a"]));
		assert_eq!(input.order, Some(1));
	}
}
