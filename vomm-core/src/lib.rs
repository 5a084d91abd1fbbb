//! Variable-order Markov sequence generation library.
//!
//! This crate learns transition statistics from example token sequences at
//! every context length up to a maximum order, and samples new continuations
//! that back off to shorter contexts when a long one was never observed.
//!
//! It also ships the adapters used around the model for symbolic music:
//! - Extraction of pitch/onset token sequences from tabular note events
//! - Rendering of generated token sequences to a MIDI file
//! - Small filesystem helpers

/// The variable-order Markov model and its generation interface.
pub mod model;

/// Error types for the model and the adapters.
pub mod error;

/// Reading tabular note events into pitch and onset token sequences.
pub mod events;

/// Writing pitch and onset token sequences as MIDI (and CSV records).
pub mod render;

/// I/O utilities (file loading, path helpers).
pub mod io;

pub use error::{EventError, ModelError, RenderError};
pub use model::{GenerateInput, Generation, Halt, Primer, VariableOrderMarkov};
