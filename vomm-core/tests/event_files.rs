//! File-backed tests: CSV events in, tokens through the model, MIDI out.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;
use vomm_core::events::{onset_offset, read_sequences};
use vomm_core::render::{RenderOptions, render};
use vomm_core::{EventError, GenerateInput, VariableOrderMarkov};

fn write_csv(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
	let path = dir.path().join(name);
	fs::write(&path, contents).unwrap();
	path
}

#[test]
fn offset_comes_from_first_valid_row() {
	let dir = TempDir::new().unwrap();
	let path = write_csv(&dir, "prime.csv", "\n,,\n12.5,60,60,1,0\n13.5,62,61,1,0\n");
	assert_eq!(onset_offset(&path).unwrap(), 12.5);
}

#[test]
fn offset_of_empty_file_is_an_error() {
	let dir = TempDir::new().unwrap();
	let path = write_csv(&dir, "empty.csv", "\n \n");
	assert!(matches!(onset_offset(&path), Err(EventError::NoRows)));
}

#[test]
fn missing_file_is_an_io_error() {
	let dir = TempDir::new().unwrap();
	let result = read_sequences(dir.path().join("absent.csv"), 0.0);
	assert!(matches!(result, Err(EventError::Io(_))));
}

#[test]
fn prime_and_continuation_share_the_prime_offset() {
	let dir = TempDir::new().unwrap();
	let prime = write_csv(&dir, "prime.csv", "8,60,60,1,0\n9,62,61,0.5,0\n");
	let cont = write_csv(&dir, "cont.csv", "10,64,62,1,0\n");

	let offset = onset_offset(&prime).unwrap();
	let mut sequences = read_sequences(&prime, offset).unwrap();
	sequences.extend(read_sequences(&cont, offset).unwrap());

	assert_eq!(sequences.pitches, vec!["60.0", "62.0", "64.0"]);
	assert_eq!(sequences.onsets, vec!["0.0", "1.0", "2.0"]);
}

#[test]
fn trained_tokens_render_back_to_midi() {
	let dir = TempDir::new().unwrap();
	let piece = write_csv(&dir, "piece.csv", "0,60,60,1,0\n1,62,61,1,0\n2,64,62,1,0\n4,60,60,1,0\n");
	let offset = onset_offset(&piece).unwrap();
	let sequences = read_sequences(&piece, offset).unwrap();
	assert_eq!(sequences.pitches, vec!["60.0", "62.0", "64.0", "r", "60.0"]);

	let mut pitch_model = VariableOrderMarkov::new(2).unwrap();
	let mut onset_model = VariableOrderMarkov::new(2).unwrap();
	pitch_model.train(&sequences.pitches);
	onset_model.train(&sequences.onsets);

	let pitch_input = GenerateInput::new(2).with_primer(sequences.pitches[..2].to_vec());
	let onset_input = GenerateInput::new(2).with_primer(sequences.onsets[..2].to_vec());
	let pitches = pitch_model.generate_seeded(&pitch_input, 5).unwrap();
	let onsets = onset_model.generate_seeded(&onset_input, 5).unwrap();
	assert_eq!(pitches.tokens, vec!["64.0", "r"]);
	assert_eq!(onsets.tokens, vec!["2.0", "3.0"]);

	let rendered = render(&pitches.tokens, &onsets.tokens, offset, &RenderOptions::default()).unwrap();
	assert_eq!(rendered.notes().len(), 1);

	let midi = dir.path().join("generated.mid");
	rendered.write_midi(&midi).unwrap();
	assert!(fs::metadata(&midi).unwrap().len() > 0);
}
