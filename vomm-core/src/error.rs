use std::io;

use thiserror::Error;

/// Contract violations reported by the Markov model.
///
/// None of these are raised for degenerate but legal input: short training
/// sequences are ignored and unmatched contexts end generation early
/// (see `Generation::halt`).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
	/// The model was built with `max_order == 0`.
	#[error("max_order must be >= 1, got {0}")]
	InvalidMaxOrder(usize),

	/// A generation order outside `1..=max_order` was requested.
	#[error("order must be between 1 and {max_order}, got {order}")]
	InvalidOrder { order: usize, max_order: usize },

	/// A custom primer without any token.
	#[error("primer must contain at least one token")]
	EmptyPrimer,

	/// Two models with different maximum orders cannot be merged.
	#[error("max_order mismatch: self={expected}, other={found}")]
	OrderMismatch { expected: usize, found: usize },
}

/// Errors raised while reading tabular note events.
#[derive(Debug, Error)]
pub enum EventError {
	#[error(transparent)]
	Io(#[from] io::Error),

	/// A cell could not be parsed as a number.
	#[error("line {line}: invalid number {value:?}")]
	Parse { line: usize, value: String },

	/// A row is too short to carry onset, pitch and duration.
	#[error("line {line}: expected at least {expected} columns, got {found}")]
	MissingColumns { line: usize, expected: usize, found: usize },

	/// The source contains no event row at all.
	#[error("no valid rows found")]
	NoRows,
}

/// Errors raised while rendering token sequences to a note-event file.
#[derive(Debug, Error)]
pub enum RenderError {
	#[error(transparent)]
	Io(#[from] io::Error),

	#[error("pitch and onset sequences differ in length ({pitches} vs {onsets})")]
	LengthMismatch { pitches: usize, onsets: usize },

	/// A pitch token is neither a rest nor a MIDI note number.
	#[error("invalid pitch token {0:?}")]
	InvalidPitch(String),

	#[error("invalid onset token {0:?}")]
	InvalidOnset(String),
}
